//! Rendering of transfer routes into cron file text.
//!
//! Rendering is pure: the same records and context always produce
//! byte-identical output. That is what makes regeneration idempotent and
//! lets the checker re-derive its expectation instead of storing state.

use std::path::Path;

use crate::domain::AppError;
use crate::domain::shell::quote;
use crate::domain::transfer::TransferRecord;

/// Suffix shared by every generated cron file.
pub const GENERATED_SUFFIX: &str = ".Landing_Zone.cron";

const FLOCK: &str = "/usr/bin/flock";

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronFile {
    pub name: String,
    pub content: String,
    /// Number of routes folded into this file.
    pub transfers: usize,
}

/// Process-wide inputs that apply to every rendered route.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Cron schedule applied uniformly to all routes.
    pub schedule: &'a str,
    /// Log path for routes without an explicit `log_file`.
    pub default_log_file: &'a Path,
}

/// File name for a `system.user` grouping key.
pub fn file_name(system_user: &str) -> String {
    format!("{system_user}{GENERATED_SUFFIX}")
}

/// Render the full output set: one file per (system, user) pair, pairs in
/// first-appearance order, routes in table order within each file.
pub fn render_files(
    records: &[TransferRecord],
    ctx: &RenderContext,
) -> Result<Vec<CronFile>, AppError> {
    let mut groups: Vec<(String, Vec<&TransferRecord>)> = Vec::new();
    for record in records {
        let key = record.system_user();
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    let mut files = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let content = render_cron_file(&members, ctx)?;
        files.push(CronFile { name: file_name(&key), content, transfers: members.len() });
    }
    Ok(files)
}

fn render_cron_file(records: &[&TransferRecord], ctx: &RenderContext) -> Result<String, AppError> {
    let first = records[0];
    let mut content = header(&first.system, &first.user);
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            content.push('\n');
        }
        content.push_str(&format!("# Transfer: {} -> {}\n", record.source, record.destination));
        content.push_str(&render_job_line(record, ctx)?);
        content.push('\n');
    }
    Ok(content)
}

fn header(system: &str, user: &str) -> String {
    format!(
        "# Generated by landingzones for system {system}, user {user}.\n\
         # Do not edit by hand; regenerate from the transfers table instead.\n\
         # Install by linking into $HOME/crontab.d/ and activating with:\n\
         #   cat $HOME/crontab.d/*.cron | crontab -\n\
         SHELL=/bin/sh\n\
         PATH=/usr/bin:/bin\n\n"
    )
}

/// Render the scheduled line for one route.
///
/// Shape: `<schedule> /usr/bin/flock -n <lock> -c '<rsync && find>'`. The
/// lock is taken non-blocking, so a tick that finds the previous run still
/// holding it is skipped rather than queued.
pub fn render_job_line(record: &TransferRecord, ctx: &RenderContext) -> Result<String, AppError> {
    let log_file = match &record.log_file {
        Some(path) => path.clone(),
        None => ctx.default_log_file.display().to_string(),
    };
    ensure_single_line(record, "source", &record.source)?;
    ensure_single_line(record, "destination", &record.destination)?;
    ensure_single_line(record, "rsync_options", &record.rsync_options)?;
    ensure_single_line(record, "log_file", &log_file)?;
    ensure_single_line(record, "flock_file", &record.flock_file)?;

    let mut rsync = String::from("rsync -av --remove-source-files");
    if let Some(port) = record.destination_port {
        // The port is a validated integer, the only value allowed inside
        // the double-quoted transport string.
        rsync.push_str(&format!(" -e \"ssh -p {port}\""));
    }
    for option in record.rsync_options.split_whitespace() {
        rsync.push(' ');
        rsync.push_str(&quote(option));
    }

    let redirect = format!(" >> {} 2>&1", quote(&log_file));
    let inner = format!(
        "{rsync} {} {}{redirect} && find {} -mindepth 1 -type d -empty -delete{redirect}",
        quote(&record.source),
        quote(&record.destination),
        quote(find_target(&record.source)),
    );
    let line =
        format!("{} {FLOCK} -n {} -c {}", ctx.schedule, quote(&record.flock_file), quote(&inner));

    // crontab treats a bare % as a newline marker.
    Ok(line.replace('%', "\\%"))
}

/// Target for the empty-directory sweep: a trailing glob is stripped so
/// `find` walks the parent instead of receiving a literal `*`.
fn find_target(source: &str) -> &str {
    if let Some(parent) = source.strip_suffix("/*") {
        if !parent.is_empty() {
            return parent;
        }
    } else if source.ends_with('*') {
        let stripped = source.trim_end_matches('*').trim_end_matches('/');
        if !stripped.is_empty() {
            return stripped;
        }
    }
    source
}

/// Validate a cron schedule expression: five fields over `[0-9*,/-]`.
pub fn validate_schedule(expr: &str) -> Result<(), String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(format!(
            "cron schedule '{expr}' must have 5 fields, found {}",
            fields.len()
        ));
    }
    for field in fields {
        if !field.chars().all(|c| c.is_ascii_digit() || matches!(c, '*' | ',' | '/' | '-')) {
            return Err(format!("cron schedule field '{field}' contains unsupported characters"));
        }
    }
    Ok(())
}

fn ensure_single_line(
    record: &TransferRecord,
    field: &'static str,
    value: &str,
) -> Result<(), AppError> {
    if value.contains('\n') || value.contains('\r') {
        return Err(AppError::Unrenderable {
            route: record.system_user(),
            field,
            reason: "value contains a line break".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransferRecord {
        TransferRecord {
            system: "localhost".into(),
            user: "testuser".into(),
            source: "input/*".into(),
            destination: "output/".into(),
            destination_port: None,
            rsync_options: String::new(),
            log_file: None,
            flock_file: "/tmp/landingzones.lock".into(),
        }
    }

    fn ctx() -> RenderContext<'static> {
        RenderContext { schedule: "*/15 * * * *", default_log_file: Path::new("log/transfers.log") }
    }

    #[test]
    fn renders_the_canonical_local_route() {
        let line = render_job_line(&record(), &ctx()).unwrap();
        assert_eq!(
            line,
            "*/15 * * * * /usr/bin/flock -n /tmp/landingzones.lock -c \
             'rsync -av --remove-source-files input/* output/ >> log/transfers.log 2>&1 \
             && find input -mindepth 1 -type d -empty -delete >> log/transfers.log 2>&1'"
        );
    }

    #[test]
    fn destination_port_adds_ssh_transport() {
        let mut record = record();
        record.destination = "backup@archive:/srv/backup/".into();
        record.destination_port = Some(2222);
        let line = render_job_line(&record, &ctx()).unwrap();
        assert!(line.contains("-e \"ssh -p 2222\""));
        assert!(line.contains("backup@archive:/srv/backup/"));
    }

    #[test]
    fn no_port_means_no_ssh_transport() {
        let line = render_job_line(&record(), &ctx()).unwrap();
        assert!(!line.contains("ssh"));
    }

    #[test]
    fn explicit_log_file_wins_over_default() {
        let mut record = record();
        record.log_file = Some("/var/log/route.log".into());
        let line = render_job_line(&record, &ctx()).unwrap();
        assert!(line.contains(">> /var/log/route.log 2>&1"));
        assert!(!line.contains("transfers.log"));
    }

    #[test]
    fn rsync_options_are_quoted_per_token() {
        let mut record = record();
        record.rsync_options = "--chown=:grp --exclude=*.tmp".into();
        let line = render_job_line(&record, &ctx()).unwrap();
        assert!(line.contains("--remove-source-files --chown=:grp --exclude=*.tmp input/*"));
    }

    #[test]
    fn unsafe_values_are_single_quoted() {
        let mut record = record();
        record.source = "/srv/my data/".into();
        record.rsync_options = "--exclude=a b".into();
        let line = render_job_line(&record, &ctx()).unwrap();
        assert!(line.contains("'/srv/my data/'"));
        // Option tokens are split on whitespace, then quoted individually.
        assert!(line.contains("--exclude=a b"));
        assert!(!line.contains("$("));
    }

    #[test]
    fn injection_shaped_fields_stay_inside_quotes() {
        let mut record = record();
        record.source = "/srv/in; rm -rf /".into();
        let line = render_job_line(&record, &ctx()).unwrap();
        assert!(line.contains("'/srv/in; rm -rf /'"));
    }

    #[test]
    fn percent_is_escaped_for_crontab() {
        let mut record = record();
        record.source = "/srv/100%/in/".into();
        let line = render_job_line(&record, &ctx()).unwrap();
        assert!(line.contains("/srv/100\\%/in/"));
        assert!(!line.replace("\\%", "").contains('%'));
    }

    #[test]
    fn line_breaks_are_unrenderable() {
        let mut record = record();
        record.flock_file = "/tmp/a\n.lock".into();
        let err = render_job_line(&record, &ctx()).unwrap_err();
        assert!(matches!(err, AppError::Unrenderable { field: "flock_file", .. }));
    }

    #[test]
    fn find_targets_the_glob_parent() {
        assert_eq!(find_target("input/*"), "input");
        assert_eq!(find_target("/srv/drop*"), "/srv/drop");
        assert_eq!(find_target("/srv/drop/"), "/srv/drop/");
        assert_eq!(find_target("/*"), "/*");
    }

    #[test]
    fn rendering_is_deterministic() {
        let records = vec![record()];
        let first = render_files(&records, &ctx()).unwrap();
        let second = render_files(&records, &ctx()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn routes_sharing_a_pair_fold_into_one_file() {
        let mut second = record();
        second.source = "staging/*".into();
        second.destination = "archive/".into();
        let records = vec![record(), second];

        let files = render_files(&records, &ctx()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "localhost.testuser.Landing_Zone.cron");
        assert_eq!(files[0].transfers, 2);
        assert_eq!(files[0].content.matches("/usr/bin/flock").count(), 2);
        // Table order is preserved within the file.
        let input = files[0].content.find("input/*").unwrap();
        let staging = files[0].content.find("staging/*").unwrap();
        assert!(input < staging);
    }

    #[test]
    fn distinct_pairs_get_distinct_files_in_table_order() {
        let mut second = record();
        second.system = "server9".into();
        second.user = "alice".into();
        let records = vec![record(), second];

        let files = render_files(&records, &ctx()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["localhost.testuser.Landing_Zone.cron", "server9.alice.Landing_Zone.cron"]
        );
    }

    #[test]
    fn files_carry_the_crontab_preamble() {
        let files = render_files(&[record()], &ctx()).unwrap();
        assert!(files[0].content.starts_with("# Generated by landingzones"));
        assert!(files[0].content.contains("SHELL=/bin/sh\nPATH=/usr/bin:/bin\n"));
        assert!(files[0].content.contains("# Transfer: input/* -> output/\n"));
    }

    #[test]
    fn schedule_validation_accepts_cron_fields() {
        assert!(validate_schedule("*/15 * * * *").is_ok());
        assert!(validate_schedule("0 4 * * 1-5").is_ok());
        assert!(validate_schedule("*/15 * * *").is_err());
        assert!(validate_schedule("* * * * * ; rm -rf /").is_err());
        assert!(validate_schedule("a b c d e").is_err());
    }
}
