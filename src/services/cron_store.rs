//! Filesystem store for the generated cron file directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::AppError;
use crate::domain::cron::{CronFile, GENERATED_SUFFIX};

/// Owns the output directory the generated cron files land in. Generation
/// rewrites the directory exclusively; nothing else mutates it.
#[derive(Debug, Clone)]
pub struct CronFileStore {
    dir: PathBuf,
}

/// Bookkeeping from a completed write pass.
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// Previously generated files removed because their route is gone.
    pub removed: Vec<String>,
}

impl CronFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of generated cron files currently on disk, sorted. Files
    /// without the generated suffix are not ours and are never touched.
    pub fn list_generated(&self) -> Result<Vec<String>, AppError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&self.dir).map_err(|err| AppError::io(self.dir.display().to_string(), err))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| AppError::io(self.dir.display().to_string(), err))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(GENERATED_SUFFIX) && entry.path().is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn read(&self, name: &str) -> Result<String, AppError> {
        let path = self.dir.join(name);
        fs::read_to_string(&path).map_err(|err| AppError::io(path.display().to_string(), err))
    }

    /// Write the full render set, removing generated files that are no
    /// longer part of it. Failures are collected per file so a single run
    /// reports every problem, and the remaining files are still attempted.
    pub fn write_all(&self, files: &[CronFile]) -> Result<WriteOutcome, AppError> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::io(self.dir.display().to_string(), err))?;

        let mut failures = Vec::new();
        let mut outcome = WriteOutcome::default();

        for name in self.list_generated()? {
            if !files.iter().any(|file| file.name == name) {
                let path = self.dir.join(&name);
                match fs::remove_file(&path) {
                    Ok(()) => outcome.removed.push(name),
                    Err(err) => failures.push(format!("{}: {}", path.display(), err)),
                }
            }
        }

        for file in files {
            let path = self.dir.join(&file.name);
            if let Err(err) = fs::write(&path, &file.content) {
                failures.push(format!("{}: {}", path.display(), err));
            }
        }

        if failures.is_empty() { Ok(outcome) } else { Err(AppError::WriteFailures(failures)) }
    }
}
