//! Check command: compare deployed cron files and required tools against
//! the current configuration.

use std::fs;

use crate::config::Config;
use crate::domain::AppError;
use crate::domain::cron::{self, RenderContext};
use crate::domain::transfer;
use crate::services::CronFileStore;
use crate::services::tools;

/// Drift report produced by one check run. The categories are disjoint;
/// the deployment is in sync only when all four are empty.
#[derive(Debug, Default)]
pub struct DriftReport {
    /// Expected files absent from the output directory.
    pub missing: Vec<String>,
    /// Files whose content differs from the rendered expectation.
    pub stale: Vec<String>,
    /// Generated files with no matching route in the current table.
    pub orphaned: Vec<String>,
    /// Required executables not resolvable on PATH.
    pub tools_missing: Vec<String>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
            && self.stale.is_empty()
            && self.orphaned.is_empty()
            && self.tools_missing.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.missing.len() + self.stale.len() + self.orphaned.len() + self.tools_missing.len()
    }

    /// Print one line per finding on stderr, a summary line at the end.
    pub fn emit(&self) {
        for name in &self.missing {
            eprintln!("[MISSING] {name}: expected cron file not found");
        }
        for name in &self.stale {
            eprintln!("[STALE] {name}: content differs from the current configuration");
        }
        for name in &self.orphaned {
            eprintln!("[ORPHANED] {name}: no matching route in the transfers file");
        }
        for tool in &self.tools_missing {
            eprintln!("[TOOL] {tool}: not found on PATH");
        }
        if self.is_clean() {
            println!("All checks passed.");
        } else {
            eprintln!("Check failed: {} issue(s) found.", self.issue_count());
        }
    }
}

/// Re-derive the expected output from the current configuration with the
/// same rendering the generator uses, and compare it against the output
/// directory. Strictly read, compare, report; disk state is never touched.
pub fn execute(config: &Config) -> Result<DriftReport, AppError> {
    let transfers_path = &config.transfers_file;
    if !transfers_path.exists() {
        return Err(AppError::TransfersFileMissing(transfers_path.display().to_string()));
    }
    let content = fs::read_to_string(transfers_path)
        .map_err(|err| AppError::io(transfers_path.display().to_string(), err))?;
    let records = transfer::parse_transfers(&content)?;

    let default_log_file = config.default_log_file();
    let ctx =
        RenderContext { schedule: &config.cron_frequency, default_log_file: &default_log_file };
    let expected = cron::render_files(&records, &ctx)?;

    let store = CronFileStore::new(config.crontab_dir.clone());
    let deployed = store.list_generated()?;

    let mut report = DriftReport::default();
    for file in &expected {
        if !deployed.iter().any(|name| name == &file.name) {
            report.missing.push(file.name.clone());
            continue;
        }
        if store.read(&file.name)? != file.content {
            report.stale.push(file.name.clone());
        }
    }
    for name in deployed {
        if !expected.iter().any(|file| file.name == name) {
            report.orphaned.push(name);
        }
    }
    report.tools_missing = tools::missing_tools();

    Ok(report)
}
