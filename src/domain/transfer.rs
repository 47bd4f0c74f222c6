//! The transfer route table: parsed, validated form of `transfers.tsv`.

use std::collections::HashMap;
use std::fmt;

use crate::domain::AppError;
use crate::domain::cron;

/// Recognized transfers.tsv columns.
const COLUMNS: &[&str] = &[
    "enabled",
    "system",
    "users",
    "source",
    "destination",
    "destination_port",
    "rsync_options",
    "log_file",
    "flock_file",
];

/// Columns that must be present in the header row.
const REQUIRED_COLUMNS: &[&str] = &["system", "users", "source", "destination", "flock_file"];

/// One validated transfer route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    /// Source host identifier; `localhost` means no SSH.
    pub system: String,
    /// Account the transfer runs as.
    pub user: String,
    /// Source path, may end in a glob.
    pub source: String,
    /// Destination path, optionally `user@host:` prefixed.
    pub destination: String,
    /// SSH port override for remote destinations.
    pub destination_port: Option<u16>,
    /// Extra rsync flags, whitespace-separated.
    pub rsync_options: String,
    /// Per-route log path; `None` falls back to the default transfer log.
    pub log_file: Option<String>,
    /// Lock file serializing scheduled executions of this route.
    pub flock_file: String,
}

impl TransferRecord {
    /// Grouping key shared by every route that lands in the same cron file.
    pub fn system_user(&self) -> String {
        format!("{}.{}", self.system, self.user)
    }
}

/// A single row-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIssue {
    pub line: usize,
    pub message: String,
}

impl TransferIssue {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

impl fmt::Display for TransferIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.line, self.message)
    }
}

/// Parse and validate the transfers table.
///
/// Validation does not stop at the first bad row: every problem in the file
/// is collected and returned at once, each naming its row number.
/// Parsing is deterministic and preserves row order.
pub fn parse_transfers(content: &str) -> Result<Vec<TransferRecord>, AppError> {
    let mut lines = content.lines().enumerate();
    let (_, header_line) =
        lines.next().ok_or_else(|| AppError::ConfigFormat("transfers file is empty".into()))?;
    let columns = parse_header(header_line)?;

    let mut records: Vec<(usize, TransferRecord)> = Vec::new();
    let mut issues: Vec<TransferIssue> = Vec::new();
    let mut seen_routes: HashMap<(String, String, String, String), usize> = HashMap::new();

    for (index, raw_line) in lines {
        let line = index + 1;
        if raw_line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = raw_line.split('\t').map(str::trim).collect();
        if fields.len() > columns.len() {
            issues.push(TransferIssue::new(
                line,
                format!("expected at most {} fields, found {}", columns.len(), fields.len()),
            ));
            continue;
        }
        // Rows shorter than the header are padded with empty trailing cells.
        let field = |name: &str| -> &str {
            columns.get(name).and_then(|&idx| fields.get(idx)).copied().unwrap_or("")
        };

        if fields.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        // Commented-out rows.
        if raw_line.trim_start().starts_with('#') || field("system").starts_with('#') {
            continue;
        }
        if columns.contains_key("enabled") && !field("enabled").eq_ignore_ascii_case("true") {
            continue;
        }

        let mut row_ok = true;
        for &name in REQUIRED_COLUMNS {
            if field(name).is_empty() {
                issues.push(TransferIssue::new(line, format!("missing required field '{name}'")));
                row_ok = false;
            }
        }
        // system and user become file name components.
        for name in ["system", "users"] {
            let value = field(name);
            if !value.is_empty() && value.contains(|c: char| c == '/' || c.is_whitespace()) {
                issues.push(TransferIssue::new(
                    line,
                    format!("field '{name}' may not contain '/' or whitespace: '{value}'"),
                ));
                row_ok = false;
            }
        }

        let destination_port = match field("destination_port") {
            "" => None,
            raw => match raw.parse::<u16>() {
                Ok(port) if port > 0 => Some(port),
                _ => {
                    issues.push(TransferIssue::new(
                        line,
                        format!("invalid destination_port '{raw}': must be a positive integer"),
                    ));
                    row_ok = false;
                    None
                }
            },
        };

        if !row_ok {
            continue;
        }

        let record = TransferRecord {
            system: field("system").to_owned(),
            user: field("users").to_owned(),
            source: field("source").to_owned(),
            destination: field("destination").to_owned(),
            destination_port,
            rsync_options: field("rsync_options").to_owned(),
            log_file: match field("log_file") {
                "" => None,
                value => Some(value.to_owned()),
            },
            flock_file: field("flock_file").to_owned(),
        };

        let route_key = (
            record.system.clone(),
            record.user.clone(),
            record.source.clone(),
            record.destination.clone(),
        );
        match seen_routes.get(&route_key) {
            Some(&first_line) => {
                issues.push(TransferIssue::new(
                    line,
                    format!(
                        "duplicate route ({}, {}, {}, {}) already defined at row {first_line}",
                        record.system, record.user, record.source, record.destination
                    ),
                ));
            }
            None => {
                seen_routes.insert(route_key, line);
                records.push((line, record));
            }
        }
    }

    file_name_collisions(&records, &mut issues);

    if issues.is_empty() {
        Ok(records.into_iter().map(|(_, record)| record).collect())
    } else {
        issues.sort_by_key(|issue| issue.line);
        Err(AppError::InvalidTransfers(issues))
    }
}

fn parse_header(line: &str) -> Result<HashMap<String, usize>, AppError> {
    let mut columns: HashMap<String, usize> = HashMap::new();
    let mut problems = Vec::new();

    for (index, name) in line.split('\t').map(str::trim).enumerate() {
        if name.is_empty() {
            problems.push(format!("column {} has an empty name", index + 1));
            continue;
        }
        if !COLUMNS.contains(&name) {
            problems.push(format!("unrecognized column '{name}'"));
            continue;
        }
        if columns.insert(name.to_owned(), index).is_some() {
            problems.push(format!("duplicate column '{name}'"));
        }
    }
    for &required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            problems.push(format!("missing required column '{required}'"));
        }
    }

    if problems.is_empty() { Ok(columns) } else { Err(AppError::ConfigFormat(problems.join("; "))) }
}

/// Distinct (system, user) pairs may still join into the same `system.user`
/// file name (`a.b` + `c` vs `a` + `b.c`); such tables are ambiguous.
fn file_name_collisions(records: &[(usize, TransferRecord)], issues: &mut Vec<TransferIssue>) {
    let mut by_name: HashMap<String, (String, String, usize)> = HashMap::new();
    for (line, record) in records {
        let name = cron::file_name(&record.system_user());
        match by_name.get(&name) {
            Some((system, user, first_line))
                if (system, user) != (&record.system, &record.user) =>
            {
                issues.push(TransferIssue::new(
                    *line,
                    format!(
                        "system '{}' user '{}' collides with system '{system}' user '{user}' \
                         (row {first_line}) on cron file name '{name}'",
                        record.system, record.user
                    ),
                ));
            }
            Some(_) => {}
            None => {
                by_name.insert(name, (record.system.clone(), record.user.clone(), *line));
            }
        }
    }
}
