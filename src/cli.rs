use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ashby::AshbyClient;
use crate::drive::DriveClient;
use crate::load_config::load_config;
use crate::runlog::RunLog;
use crate::transfer::{relay, RelayOptions};

/// CLI for resume-relay: move candidate resumes from Ashby into Drive.
#[derive(Parser)]
#[clap(
    name = "resume-relay",
    version,
    about = "Relay candidate resumes from an Ashby account into a Google Drive folder"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List jobs with their identifiers, for picking a job_id filter
    Jobs {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Transfer every matching candidate's resume using the given config file
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Jobs { config } => {
            let config = load_config(config)?;
            let source = AshbyClient::new(config.ashby_token)?;
            let (jobs, _raw_pages) = source.list_jobs().await?;
            for job in &jobs {
                println!("{} ({})", job.name, job.id);
            }
            println!("{} job(s)", jobs.len());
            Ok(())
        }
        Commands::Run { config } => {
            let config = load_config(config)?;
            let log = RunLog::from_config(&config.run_log)?;
            let source = AshbyClient::new(config.ashby_token)?;
            let store = DriveClient::new(config.drive_token)?;
            let options = RelayOptions {
                folder_name: config.folder_name,
                filter: config.filter,
            };
            println!("Resume relay starting...");
            match relay(&source, &store, &options, &log).await {
                Ok(report) => {
                    println!("Resume relay complete.\nReport:");
                    println!("{:#?}", report);
                    println!(
                        "{} succeeded, {} failed",
                        report.succeeded(),
                        report.failed()
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Resume relay failed: {}", e);
                    Err(anyhow::Error::msg(e))
                }
            }
        }
    }
}
