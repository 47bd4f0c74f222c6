//! Shared testing utilities for landingzones CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Standard transfers.tsv header used by most tests.
#[allow(dead_code)]
pub const HEADER: &str =
    "system\tusers\tsource\tdestination\tdestination_port\trsync_options\tlog_file\tflock_file";

/// Environment variables that would leak host configuration into tests.
const LZ_VARS: &[&str] = &[
    "LZ_CONFIG_FILE",
    "LZ_TRANSFERS_FILE",
    "LZ_CRONTAB_DIR",
    "LZ_LOG_DIR",
    "LZ_CRON_FREQUENCY",
];

/// Isolated working directory for driving the compiled binary.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        fs::create_dir_all(root.path().join("config")).expect("Failed to create config directory");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Build a command for the compiled binary, isolated from host LZ_* env.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("landingzones").expect("Failed to locate binary");
        cmd.current_dir(self.root.path());
        for var in LZ_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Write `config/transfers.tsv` with the standard column set.
    pub fn write_transfers(&self, rows: &[&str]) {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        self.write_raw_transfers(&content);
    }

    pub fn write_raw_transfers(&self, content: &str) {
        fs::write(self.root.path().join("config/transfers.tsv"), content)
            .expect("Failed to write transfers.tsv");
    }

    /// Default output directory for generated cron files.
    pub fn crontab_dir(&self) -> PathBuf {
        self.root.path().join("output/crontab.d")
    }

    pub fn cron_path(&self, name: &str) -> PathBuf {
        self.crontab_dir().join(name)
    }

    pub fn read_cron(&self, name: &str) -> String {
        fs::read_to_string(self.cron_path(name)).expect("Failed to read generated cron file")
    }

    /// Sorted names of all entries in the output directory.
    pub fn cron_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.crontab_dir())
            .expect("Failed to list crontab directory")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Directory of executable stubs standing in for rsync/ssh/find/flock,
    /// so tool checks don't depend on what the host has installed.
    pub fn stub_tools_dir(&self) -> PathBuf {
        let bin = self.root.path().join("stub-bin");
        fs::create_dir_all(&bin).expect("Failed to create stub tool directory");
        for tool in ["rsync", "ssh", "find", "flock"] {
            let path = bin.join(tool);
            fs::write(&path, "#!/bin/sh\nexit 0\n").expect("Failed to write tool stub");
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms =
                    fs::metadata(&path).expect("Failed to stat tool stub").permissions();
                perms.set_mode(0o755);
                fs::set_permissions(&path, perms).expect("Failed to chmod tool stub");
            }
        }
        bin
    }

    /// An empty PATH directory, for simulating absent tools.
    pub fn empty_path_dir(&self) -> PathBuf {
        let dir = self.root.path().join("empty-bin");
        fs::create_dir_all(&dir).expect("Failed to create empty PATH directory");
        dir
    }
}
