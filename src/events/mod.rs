use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{SalesOrderStatus, SampleStatus, SubmissionStatus};
use crate::lifecycle::EntityKind;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sender paired with its receiving end, for callers that consume events
    /// themselves.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when nobody is listening.
    /// Used once the change the event describes is already committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

// Domain events raised by lifecycle operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ResetCompleted {
        preserved: Vec<EntityKind>,
        deleted: BTreeMap<EntityKind, u64>,
        finished_at: DateTime<Utc>,
    },
    SalesOrderStatusChanged {
        sales_order_id: Uuid,
        old_status: SalesOrderStatus,
        new_status: SalesOrderStatus,
    },
    OpportunityClosed {
        opportunity_id: Uuid,
        won: bool,
    },
    ProcurementProjectCreated {
        project_id: Uuid,
        opportunity_id: Uuid,
        sales_order_id: Uuid,
    },
    SampleStatusChanged {
        sample_id: Uuid,
        old_status: SampleStatus,
        new_status: SampleStatus,
    },
    SampleSubmitted {
        submission_id: Uuid,
        sample_id: Uuid,
        opportunity_id: Uuid,
    },
    SubmissionDecided {
        submission_id: Uuid,
        status: SubmissionStatus,
    },
    SampleStatusRolledBack {
        samples: u64,
        submissions: u64,
    },
    DataSeeded {
        created: u64,
        skipped: u64,
    },
}

/// Drains the channel, logging every event until all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ResetCompleted {
                ref preserved,
                ref deleted,
                finished_at,
            } => {
                let total: u64 = deleted.values().sum();
                info!(
                    rows = total,
                    kinds = deleted.len(),
                    preserved = ?preserved,
                    %finished_at,
                    "Reset completed"
                );
            }
            Event::ProcurementProjectCreated {
                project_id,
                opportunity_id,
                sales_order_id,
            } => {
                info!(
                    %project_id,
                    %opportunity_id,
                    %sales_order_id,
                    "Procurement project auto-created"
                );
            }
            Event::SampleStatusRolledBack {
                samples,
                submissions,
            } => {
                info!(samples, submissions, "Sample statuses rolled back");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (sender, rx) = EventSender::channel(4);
        drop(rx);
        let result = sender
            .send(Event::DataSeeded {
                created: 1,
                skipped: 0,
            })
            .await;
        assert!(result.is_err());
        // Never panics or errors
        sender
            .send_or_log(Event::DataSeeded {
                created: 1,
                skipped: 0,
            })
            .await;
    }

    #[tokio::test]
    async fn processor_drains_until_senders_drop() {
        let (sender, rx) = EventSender::channel(4);
        let handle = tokio::spawn(process_events(rx));
        sender
            .send(Event::OpportunityClosed {
                opportunity_id: Uuid::new_v4(),
                won: true,
            })
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}
