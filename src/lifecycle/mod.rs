//! Entity dependency model: which kinds reference which, the order they can
//! be removed in, and the status machines that gate derived entities.

pub mod entity_kind;
pub mod graph;
pub mod status;

pub use entity_kind::{EntityKind, ParentLink};
pub use graph::{ChildLink, DependencyGraph};
pub use status::StateMachine;
