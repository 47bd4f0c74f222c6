//! Process-wide configuration.
//!
//! Priority, highest first: CLI flags, `LZ_*` environment variables, a YAML
//! config file, built-in defaults. Relative paths are resolved against the
//! current working directory so the generated files carry stable absolute
//! paths.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::AppError;
use crate::domain::cron;

/// Config file names searched in `.` and `config/`, in order.
const CONFIG_FILE_NAMES: &[&str] =
    &["config.yaml", "config.yml", "landingzones.yaml", "landingzones.yml"];

pub const DEFAULT_TRANSFERS_FILE: &str = "config/transfers.tsv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_LOG_DIR: &str = "log";
pub const DEFAULT_CRON_FREQUENCY: &str = "*/15 * * * *";

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the transfers.tsv route table.
    pub transfers_file: PathBuf,
    /// Directory the generated cron files land in.
    pub crontab_dir: PathBuf,
    /// Directory holding the default transfer log.
    pub log_dir: PathBuf,
    /// Schedule applied uniformly to every route.
    pub cron_frequency: String,
}

/// CLI-level overrides, all optional.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub transfers_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// On-disk YAML shape. Unknown keys are ignored so legacy configs keep
/// loading.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    transfers_file: Option<String>,
    log_dir: Option<String>,
    output_dir: Option<String>,
    crontab_dir: Option<String>,
    default_cron_frequency: Option<String>,
}

impl Config {
    /// Load configuration relative to the current working directory.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, AppError> {
        let cwd = env::current_dir().map_err(|err| AppError::io(".", err))?;
        Self::load_in(&cwd, overrides)
    }

    /// Load configuration relative to `root`. Split out so tests can pin
    /// the directory without changing the process cwd.
    pub fn load_in(root: &Path, overrides: &ConfigOverrides) -> Result<Self, AppError> {
        let file = load_config_file(root, overrides.config_file.as_deref())?;

        let transfers_file = resolve_path(
            root,
            overrides.transfers_file.as_deref(),
            "LZ_TRANSFERS_FILE",
            file.transfers_file.as_deref(),
            DEFAULT_TRANSFERS_FILE,
        );
        let log_dir = resolve_path(
            root,
            overrides.log_dir.as_deref(),
            "LZ_LOG_DIR",
            file.log_dir.as_deref(),
            DEFAULT_LOG_DIR,
        );
        // crontab_dir defaults to <output_dir>/crontab.d.
        let crontab_default =
            format!("{}/crontab.d", file.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR));
        let crontab_dir = resolve_path(
            root,
            overrides.output_dir.as_deref(),
            "LZ_CRONTAB_DIR",
            file.crontab_dir.as_deref(),
            &crontab_default,
        );

        let cron_frequency = resolve_value(
            "LZ_CRON_FREQUENCY",
            file.default_cron_frequency.as_deref(),
            DEFAULT_CRON_FREQUENCY,
        );
        cron::validate_schedule(&cron_frequency).map_err(AppError::config_error)?;

        Ok(Config { transfers_file, crontab_dir, log_dir, cron_frequency })
    }

    /// Log path for routes without an explicit `log_file`.
    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir.join("transfers.log")
    }
}

fn resolve_value(env_var: &str, file_value: Option<&str>, default: &str) -> String {
    if let Ok(value) = env::var(env_var) {
        if !value.is_empty() {
            return value;
        }
    }
    if let Some(value) = file_value {
        return value.to_owned();
    }
    default.to_owned()
}

fn resolve_path(
    root: &Path,
    override_value: Option<&Path>,
    env_var: &str,
    file_value: Option<&str>,
    default: &str,
) -> PathBuf {
    let raw = match override_value {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(resolve_value(env_var, file_value, default)),
    };
    absolutize(root, expand_tilde(&raw))
}

fn absolutize(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() { path } else { root.join(path) }
}

/// Expand a leading `~` or `$HOME` using the HOME environment variable.
fn expand_tilde(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let rest = if let Some(rest) = text.strip_prefix('~') {
        rest
    } else if let Some(rest) = text.strip_prefix("$HOME") {
        rest
    } else {
        return path.to_path_buf();
    };
    if !(rest.is_empty() || rest.starts_with('/')) {
        return path.to_path_buf();
    }
    match env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(format!("{home}{rest}")),
        _ => path.to_path_buf(),
    }
}

fn load_config_file(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile, AppError> {
    let explicit = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => env::var("LZ_CONFIG_FILE").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
    };

    let path = match explicit {
        Some(path) => {
            let path = absolutize(root, expand_tilde(&path));
            if !path.exists() {
                return Err(AppError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path)
        }
        None => search_config_file(root),
    };

    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let content =
        fs::read_to_string(&path).map_err(|err| AppError::io(path.display().to_string(), err))?;
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&content).map_err(|err| AppError::MalformedConfig {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

fn search_config_file(root: &Path) -> Option<PathBuf> {
    for dir in [".", "config"] {
        for name in CONFIG_FILE_NAMES {
            let candidate = root.join(dir).join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}
