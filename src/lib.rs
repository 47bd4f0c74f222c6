//! landingzones: turn a tabular description of rsync transfer routes into
//! scheduled cron jobs, and verify that what is deployed still matches it.

pub mod app;
pub mod config;
pub mod domain;
pub mod services;

use app::commands::{check, generate};
use config::Config;

pub use app::commands::check::DriftReport;
pub use app::commands::generate::GenerateSummary;
pub use config::ConfigOverrides;
pub use domain::AppError;

/// Regenerate the cron file set from the current transfers table.
///
/// The output directory ends up holding exactly the rendered set; files for
/// removed routes are deleted. Regeneration from an unchanged table is
/// byte-identical.
pub fn generate(overrides: &ConfigOverrides) -> Result<GenerateSummary, AppError> {
    let config = Config::load(overrides)?;
    let summary = generate::execute(&config)?;

    for (name, transfers) in &summary.files {
        println!("Generated {name} ({transfers} transfer(s))");
    }
    for name in &summary.removed {
        println!("Removed {name} (route no longer configured)");
    }
    println!(
        "{} transfer(s) across {} cron file(s) in {}",
        summary.transfers,
        summary.files.len(),
        config.crontab_dir.display()
    );
    Ok(summary)
}

/// Compare the deployed cron files and the required external tools against
/// the current transfers table. Prints the drift report; never mutates
/// disk state.
pub fn check(overrides: &ConfigOverrides) -> Result<DriftReport, AppError> {
    let config = Config::load(overrides)?;
    let report = check::execute(&config)?;
    report.emit();
    Ok(report)
}
