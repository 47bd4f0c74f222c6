//! Generate command: render the route table into cron files on disk.

use std::fs;

use crate::config::Config;
use crate::domain::AppError;
use crate::domain::cron::{self, RenderContext};
use crate::domain::transfer;
use crate::services::CronFileStore;

/// Result of a completed generate run.
#[derive(Debug)]
pub struct GenerateSummary {
    /// (file name, folded route count) per generated file, in table order.
    pub files: Vec<(String, usize)>,
    /// Total number of active routes.
    pub transfers: usize,
    /// Previously generated files removed because their route is gone.
    pub removed: Vec<String>,
}

/// Full regenerate: parse, render, and rewrite the output directory so it
/// contains exactly the current render set.
pub fn execute(config: &Config) -> Result<GenerateSummary, AppError> {
    let transfers_path = &config.transfers_file;
    if !transfers_path.exists() {
        return Err(AppError::TransfersFileMissing(transfers_path.display().to_string()));
    }
    let content = fs::read_to_string(transfers_path)
        .map_err(|err| AppError::io(transfers_path.display().to_string(), err))?;
    let records = transfer::parse_transfers(&content)?;

    // The default transfer log lives under log_dir; create it up front so
    // the first scheduled run can append to it.
    fs::create_dir_all(&config.log_dir)
        .map_err(|err| AppError::io(config.log_dir.display().to_string(), err))?;

    let default_log_file = config.default_log_file();
    let ctx =
        RenderContext { schedule: &config.cron_frequency, default_log_file: &default_log_file };
    let rendered = cron::render_files(&records, &ctx)?;

    let store = CronFileStore::new(config.crontab_dir.clone());
    let outcome = store.write_all(&rendered)?;

    let files = rendered.iter().map(|file| (file.name.clone(), file.transfers)).collect();
    Ok(GenerateSummary { files, transfers: records.len(), removed: outcome.removed })
}
