use std::fmt::Display;

use super::entity_kind::EntityKind;
use crate::entities::{OpportunityStatus, SalesOrderStatus, SampleStatus, SubmissionStatus};
use crate::errors::ServiceError;

/// A closed status enum with an explicit transition table.
///
/// Staying in the current state is always accepted as a no-op.
pub trait StateMachine: Copy + Eq + Display + 'static {
    /// Entity whose status column this machine governs.
    const ENTITY: EntityKind;

    fn successors(self) -> &'static [Self];

    fn can_transition_to(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn transition(self, next: Self) -> Result<Self, ServiceError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ServiceError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl StateMachine for SampleStatus {
    const ENTITY: EntityKind = EntityKind::SampleRecord;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Requested => &[Self::Sent],
            Self::Sent => &[Self::Received],
            Self::Received => &[Self::ResultApprovedInternal, Self::ResultRejected],
            Self::ResultApprovedInternal => &[Self::SentToClient],
            Self::SentToClient => &[Self::ClientApproved, Self::ClientRejected],
            Self::ResultRejected | Self::ClientApproved | Self::ClientRejected => &[],
        }
    }
}

impl SampleStatus {
    /// States from which a record may be put in front of a client.
    pub fn is_submittable(self) -> bool {
        matches!(self, Self::ResultApprovedInternal | Self::SentToClient)
    }

    /// States carrying a client-facing outcome that the rollback maintenance
    /// operation reverts.
    pub fn is_client_facing(self) -> bool {
        matches!(
            self,
            Self::SentToClient | Self::ClientApproved | Self::ClientRejected
        )
    }
}

impl StateMachine for SubmissionStatus {
    const ENTITY: EntityKind = EntityKind::SampleSubmission;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::ClientApproved, Self::ClientRejected],
            Self::ClientApproved | Self::ClientRejected => &[],
        }
    }
}

impl SubmissionStatus {
    /// Record status mirroring a client decision.
    pub fn mirrored_sample_status(self) -> SampleStatus {
        match self {
            Self::Pending => SampleStatus::SentToClient,
            Self::ClientApproved => SampleStatus::ClientApproved,
            Self::ClientRejected => SampleStatus::ClientRejected,
        }
    }
}

impl StateMachine for OpportunityStatus {
    const ENTITY: EntityKind = EntityKind::SalesOpportunity;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::ClosedWon, Self::ClosedLost],
            Self::ClosedWon | Self::ClosedLost => &[],
        }
    }
}

impl StateMachine for SalesOrderStatus {
    const ENTITY: EntityKind = EntityKind::SalesOrder;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }
}

impl SalesOrderStatus {
    /// Whether reaching this state commits the business to procurement.
    pub fn implies_procurement(self) -> bool {
        match self {
            Self::InProgress | Self::Shipped | Self::Delivered => true,
            Self::Pending | Self::Cancelled => false,
        }
    }
}
