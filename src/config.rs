use std::path::PathBuf;

use tracing::{debug, info};

use crate::contract::ApplicationFilter;

/// Fully merged runtime configuration: the static YAML settings plus the
/// secrets injected from the environment.
#[derive(Debug)]
pub struct RelayConfig {
    pub ashby_token: String,
    pub drive_token: String,
    pub folder_name: String,
    pub filter: ApplicationFilter,
    pub run_log: RunLogConfig,
}

impl RelayConfig {
    pub fn trace_loaded(&self) {
        let run_log = self
            .run_log
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<disabled>".to_string());
        info!(
            folder_name = %self.folder_name,
            job_id = self.filter.job_id.as_deref().unwrap_or("<any>"),
            run_log = %run_log,
            "Loaded RelayConfig"
        );
        debug!(filter = ?self.filter, "Application filter (full debug)");
    }
}

/// Where the run log goes, if anywhere, and whether lines are timestamped.
#[derive(Debug, Clone, Default)]
pub struct RunLogConfig {
    pub path: Option<PathBuf>,
    pub timestamps: bool,
}
