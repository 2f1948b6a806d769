pub mod audit;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod transition;

pub use engine::{ActorRole, WorkflowEngine};
pub use error::WorkflowError;
pub use transition::{evaluate, Command, Grants, Transition};
