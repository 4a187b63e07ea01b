use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::{RelayConfig, RunLogConfig};
use crate::contract::{ApplicationFilter, ApplicationStatus};

#[derive(Deserialize)]
struct StaticConfig {
    destination: DestinationSection,
    #[serde(default)]
    applications: ApplicationsSection,
    #[serde(default)]
    run_log: RunLogSection,
}

#[derive(Deserialize)]
struct DestinationSection {
    folder_name: String,
}

#[derive(Deserialize, Default)]
struct ApplicationsSection {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    /// Calendar date, `YYYY-MM-DD`; converted to epoch milliseconds at the
    /// start of that day (UTC).
    #[serde(default)]
    created_after: Option<String>,
}

#[derive(Deserialize, Default)]
struct RunLogSection {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    timestamps: bool,
}

/// Loads a static YAML config file (no secrets) and injects required env
/// vars for secrets. Returns a fully merged RelayConfig or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RelayConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let ashby_token = match std::env::var("ASHBY_API_TOKEN") {
        Ok(token) => {
            info!("ASHBY_API_TOKEN found in env");
            token
        }
        Err(e) => {
            error!(error = ?e, "ASHBY_API_TOKEN environment variable not set");
            return Err(anyhow::anyhow!(
                "ASHBY_API_TOKEN environment variable not set: {e}"
            ));
        }
    };

    let drive_token = match std::env::var("GOOGLE_DRIVE_TOKEN") {
        Ok(token) => {
            info!("GOOGLE_DRIVE_TOKEN found in env");
            token
        }
        Err(e) => {
            error!(error = ?e, "GOOGLE_DRIVE_TOKEN environment variable not set");
            return Err(anyhow::anyhow!(
                "GOOGLE_DRIVE_TOKEN environment variable not set: {e}"
            ));
        }
    };

    let status = match static_conf.applications.status.as_deref() {
        None => None,
        Some("Active") => Some(ApplicationStatus::Active),
        Some("Hired") => Some(ApplicationStatus::Hired),
        Some("Archived") => Some(ApplicationStatus::Archived),
        Some("Lead") => Some(ApplicationStatus::Lead),
        Some(other) => {
            error!(status = %other, "Unsupported applications.status in config");
            anyhow::bail!("Unsupported applications.status: {}", other);
        }
    };

    let created_after = match static_conf.applications.created_after.as_deref() {
        None => None,
        Some(date) => Some(date_to_epoch_millis(date)?),
    };

    let filter = ApplicationFilter {
        job_id: static_conf.applications.job_id,
        limit: static_conf.applications.limit,
        status,
        created_after,
    };

    let run_log = RunLogConfig {
        path: static_conf.run_log.path,
        timestamps: static_conf.run_log.timestamps,
    };

    let config = RelayConfig {
        ashby_token,
        drive_token,
        folder_name: static_conf.destination.folder_name,
        filter,
        run_log,
    };
    config.trace_loaded();

    Ok(config)
}

fn date_to_epoch_millis(date: &str) -> Result<i64> {
    let parsed = match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = ?e, date = %date, "applications.created_after must be YYYY-MM-DD");
            return Err(anyhow::anyhow!(
                "applications.created_after must be a YYYY-MM-DD date: {e}"
            ));
        }
    };
    Ok(parsed
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .timestamp_millis())
}
