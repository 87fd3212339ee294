pub mod reset_scope_command;
pub mod rollback_sample_status_command;
pub mod seed_data_command;

// Re-export commands for easier access
pub use reset_scope_command::ResetScopeCommand;
pub use rollback_sample_status_command::RollbackSampleStatusCommand;
pub use seed_data_command::{SeedDataCommand, SeedDataResult};
