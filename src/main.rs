use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use landingzones::{AppError, ConfigOverrides};

#[derive(Parser)]
#[command(name = "landingzones")]
#[command(version)]
#[command(
    about = "Generate and verify cron-scheduled rsync transfer jobs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a YAML config file (default: auto-detect in . and config/)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path to the transfers.tsv route table (default: config/transfers.tsv)
    #[arg(short, long)]
    transfers: Option<PathBuf>,
    /// Output directory for generated cron files (default: output/crontab.d)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Directory for the default transfer log (default: log)
    #[arg(short, long)]
    log_dir: Option<PathBuf>,
}

impl CommonArgs {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config,
            transfers_file: self.transfers,
            output_dir: self.output_dir,
            log_dir: self.log_dir,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate cron files from the transfers table
    #[clap(visible_alias = "g")]
    Generate {
        #[command(flatten)]
        args: CommonArgs,
    },
    /// Check deployed cron files and required tools against the table
    #[clap(visible_alias = "c")]
    Check {
        #[command(flatten)]
        args: CommonArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<i32, AppError> = match cli.command {
        Commands::Generate { args } => landingzones::generate(&args.into_overrides()).map(|_| 0),
        Commands::Check { args } => landingzones::check(&args.into_overrides())
            .map(|report| if report.is_clean() { 0 } else { 1 }),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
