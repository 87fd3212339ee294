//! Shutdown of the shared maintenance scaffolding.

mod common;

use std::sync::Arc;

use tradeflow::{events, ops};

use common::{event_channel, setup_db};

#[tokio::test]
async fn release_drains_events_and_closes_the_pool() {
    let db = setup_db().await;
    let (sender, rx) = event_channel();
    let event_loop = tokio::spawn(events::process_events(rx));

    assert!(ops::release(db, Arc::new(sender), event_loop).await);
}

#[tokio::test]
async fn release_reports_a_pool_that_is_still_shared() {
    let db = setup_db().await;
    let still_held = db.clone();
    let (sender, rx) = event_channel();
    let event_loop = tokio::spawn(events::process_events(rx));

    assert!(!ops::release(db, Arc::new(sender), event_loop).await);
    drop(still_held);
}

#[tokio::test]
async fn release_reports_an_aborted_event_loop() {
    let db = setup_db().await;
    let (sender, _rx) = event_channel();
    let event_loop = tokio::spawn(std::future::pending::<()>());
    event_loop.abort();

    assert!(!ops::release(db, Arc::new(sender), event_loop).await);
}
