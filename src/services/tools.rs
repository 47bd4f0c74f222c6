//! External tool resolution for the deployment checker.

/// Executables the generated jobs invoke.
pub const REQUIRED_TOOLS: &[&str] = &["rsync", "ssh", "find", "flock"];

/// Names from [`REQUIRED_TOOLS`] that cannot be resolved on PATH.
pub fn missing_tools() -> Vec<String> {
    REQUIRED_TOOLS
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .map(|tool| (*tool).to_owned())
        .collect()
}
