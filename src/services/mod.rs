// Lifecycle engine
pub mod cascade_reset;

// Fulfillment pipeline
pub mod fulfillment;
pub mod samples;

// Maintenance and reporting
pub mod seeding;
pub mod stats;

// Shared helpers
pub(crate) mod activity;
