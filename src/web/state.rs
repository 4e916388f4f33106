use crate::{Config, model::ModelManager};

/// Shared by every handler; cloned per request.
#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    config: &'static Config,
}

impl AppState {
    pub fn new(mm: ModelManager, config: &'static Config) -> Self {
        Self { mm, config }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }

    /// Secret the session cookie is signed with.
    pub fn jwt_key(&self) -> &'static str {
        self.config.app().jwt()
    }
}
