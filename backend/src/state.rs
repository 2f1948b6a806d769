use std::sync::Arc;

use crate::{config::Config, workflow::WorkflowEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub config: Config,
}

impl AppState {
    pub fn new(engine: WorkflowEngine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
        }
    }
}
