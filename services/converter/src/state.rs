//! Application state shared across handlers

use std::sync::Arc;

use common::config::ConverterConfig;
use common::process::ProcessRunner;

use crate::workflow::GifWorkflow;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConverterConfig>,
    pub workflow: GifWorkflow,
}

impl AppState {
    pub fn new(config: ConverterConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let config = Arc::new(config);
        let workflow = GifWorkflow::new(config.clone(), runner);
        Self { config, workflow }
    }
}
