use crate::config::AppConfig;

/// Per-invocation context handed to the dispatcher.
///
/// Holds configuration and nothing else: the external tool's installed
/// environments are the source of truth and are never cached across calls.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
}

impl AppContext {
    pub fn new(cfg: AppConfig) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }
}
