//! Crontab-to-catalog conversion backing the `jobwarden parse` subcommand.
//!
//! Sanitizes a traditional crontab file (comments, line continuations,
//! blank runs, `\r\n`), splits it into `KEY=value` export lines and cron
//! lines, and groups every cron line sharing the same timing expression
//! into one job — one task per line, `@reboot` promoted to an on-init
//! binding. Mirrors the grouping rules of the crontab importer this
//! project's catalog format descends from.

use jobwarden_model::{EventBindingRaw, HooksRaw, JobConfigRaw, TaskRaw};
use regex::Regex;
use std::collections::HashMap;

/// The built-in cron field matcher: standard 5-7 field crontab syntax,
/// `@annually`/`@yearly`/`@monthly`/`@weekly`/`@daily`/`@hourly`/`@reboot`
/// shorthand, and `@every <duration>`.
pub const DEFAULT_MATCHER: &str = r"(@(annually|yearly|monthly|weekly|daily|hourly|reboot))|(@every (\d+(ns|us|\x{00b5}s|ms|s|m|h))+)|((((\d+,)+\d+|(\d+(/|-)\d+)|\d+|\*|(\*/\d))\s*){5,7})";

#[derive(Debug, thiserror::Error)]
pub enum CrontabError {
    #[error("invalid cron field matcher {pattern:?}: {source}")]
    InvalidMatcher {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("line {line_num}: does not match an environment assignment or a cron schedule: {text:?}")]
    UnparseableLine { line_num: usize, text: String },
}

struct CronSpec {
    timing: String,
    command: String,
    user: Option<String>,
    env: HashMap<String, String>,
}

/// Parses `content` (a whole crontab file) into a catalog. `pattern` is the
/// regex fragment matching the cron-field portion of a line (callers
/// typically pass [`DEFAULT_MATCHER`]); `has_user` expects a user-name
/// field between the cron fields and the command, as system crontabs do.
pub fn parse(content: &str, pattern: &str, has_user: bool) -> Result<JobConfigCatalog, CrontabError> {
    let specs = parse_specs(content, pattern, has_user)?;

    let mut jobs: Vec<JobConfigRaw> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for spec in specs {
        add_spec(&mut jobs, &mut index_by_name, spec);
    }

    Ok(JobConfigCatalog { jobs })
}

/// The jobs produced by [`parse`], ready to drop into a [`jobwarden_model::CatalogRaw`].
pub struct JobConfigCatalog {
    pub jobs: Vec<JobConfigRaw>,
}

fn parse_specs(content: &str, pattern: &str, has_user: bool) -> Result<Vec<CronSpec>, CrontabError> {
    let sanitized = sanitize(content);
    let matcher = build_matcher(pattern, has_user)?;
    let env_line = env_line_matcher();

    let mut env_table: HashMap<String, String> = HashMap::new();
    let mut specs = Vec::new();

    for (line_num, raw_line) in sanitized.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(captures) = env_line.captures(line) {
            let key = captures["key"].to_string();
            let value = captures["value"].to_string();
            if let Some(old) = env_table.insert(key.clone(), value.clone()) {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = %key, old = %old, new = %value, "env var redefined in crontab");
            }
            continue;
        }

        let Some(captures) = matcher.captures(line) else {
            return Err(CrontabError::UnparseableLine {
                line_num: line_num + 1,
                text: line.to_string(),
            });
        };

        specs.push(CronSpec {
            timing: captures["cron"].trim().to_string(),
            command: captures["cmd"].trim().to_string(),
            user: has_user.then(|| captures["user"].to_string()),
            env: env_table.clone(),
        });
    }

    Ok(specs)
}

fn sanitize(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");

    let comment = Regex::new(r"\s*#.*").expect("static pattern");
    let without_comments = comment.replace_all(&normalized, "");

    let continuation = Regex::new(r"\s*\\\s*\n\s*([\n|\n\s])*").expect("static pattern");
    let without_continuations = continuation.replace_all(&without_comments, " ");

    let blank_run = Regex::new(r"\n\s*\n").expect("static pattern");
    blank_run.replace_all(&without_continuations, "\n").into_owned()
}

fn env_line_matcher() -> Regex {
    Regex::new(r"^(?:export\s+)?(?P<key>[A-Za-z_][A-Za-z0-9_]*)=(?P<value>.*)$").expect("static pattern")
}

fn build_matcher(pattern: &str, has_user: bool) -> Result<Regex, CrontabError> {
    let line_tail = if has_user {
        r"(?P<user>\w[\w\d]*)\s+(?P<cmd>.*)"
    } else {
        r"(?P<cmd>.*)"
    };
    let full = format!(r"^(?P<cron>{pattern})\s+{line_tail}$");
    Regex::new(&full).map_err(|source| CrontabError::InvalidMatcher {
        pattern: pattern.to_string(),
        source,
    })
}

/// Appends `spec` to the job sharing its timing expression, creating one
/// if none exists yet. Each additional task bound to the same timing bumps
/// the job's concurrency by one, so every task from the same crontab line
/// group can run in its own slot without waiting on its siblings.
fn add_spec(jobs: &mut Vec<JobConfigRaw>, index_by_name: &mut HashMap<String, usize>, spec: CronSpec) {
    let job_name = format!("FromCron: {}", spec.timing);

    let index = *index_by_name.entry(job_name.clone()).or_insert_with(|| {
        jobs.push(new_job(job_name.clone(), &spec.timing));
        jobs.len() - 1
    });

    let job = &mut jobs[index];
    job.tasks.push(TaskRaw {
        command: Some(spec.command),
        user: spec.user,
        env: spec.env,
        ..Default::default()
    });
    job.concurrency += 1;
}

fn new_job(name: String, timing: &str) -> JobConfigRaw {
    let event = if timing.contains("@reboot") {
        EventBindingRaw {
            on_init: Some(true),
            ..Default::default()
        }
    } else {
        EventBindingRaw {
            cron: Some(timing.to_string()),
            ..Default::default()
        }
    };

    JobConfigRaw {
        name,
        description: Some("Imported from crontab".to_string()),
        disabled: false,
        concurrency: 1,
        debounce_ms: None,
        events: vec![event],
        tasks: Vec::new(),
        hooks: HooksRaw::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_single_cron_line_becomes_one_job_with_one_task() {
        let crontab = "0 5 * * * /usr/bin/backup.sh\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, false).unwrap();

        assert_eq!(catalog.jobs.len(), 1);
        let job = &catalog.jobs[0];
        assert_eq!(job.name, "FromCron: 0 5 * * *");
        assert_eq!(job.concurrency, 2);
        assert_eq!(job.tasks.len(), 1);
        assert_eq!(job.tasks[0].command.as_deref(), Some("/usr/bin/backup.sh"));
    }

    #[test]
    fn repeated_timing_groups_into_one_job_with_multiple_tasks() {
        let crontab = "0 5 * * * /usr/bin/backup.sh\n0 5 * * * /usr/bin/rotate-logs.sh\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, false).unwrap();

        assert_eq!(catalog.jobs.len(), 1);
        let job = &catalog.jobs[0];
        assert_eq!(job.tasks.len(), 2);
        assert_eq!(job.concurrency, 3);
    }

    #[test]
    fn reboot_shorthand_becomes_an_on_init_binding() {
        let crontab = "@reboot /usr/bin/warmup.sh\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, false).unwrap();

        let job = &catalog.jobs[0];
        assert!(job.events[0].on_init.unwrap_or(false));
        assert!(job.events[0].cron.is_none());
    }

    #[test]
    fn env_assignment_lines_are_attached_to_later_tasks() {
        let crontab = "FOO=bar\n0 5 * * * /usr/bin/backup.sh\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, false).unwrap();

        let job = &catalog.jobs[0];
        assert_eq!(job.tasks[0].env.get("FOO"), Some(&"bar".to_string()));
    }

    #[test]
    fn with_user_flag_captures_the_user_field() {
        let crontab = "0 5 * * * root /usr/bin/backup.sh\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, true).unwrap();

        let job = &catalog.jobs[0];
        assert_eq!(job.tasks[0].user.as_deref(), Some("root"));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let crontab = "# a full-line comment\n\n0 5 * * * /usr/bin/backup.sh # trailing comment\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, false).unwrap();

        assert_eq!(catalog.jobs.len(), 1);
        assert_eq!(catalog.jobs[0].tasks[0].command.as_deref(), Some("/usr/bin/backup.sh"));
    }

    #[test]
    fn a_line_continuation_is_joined_before_matching() {
        let crontab = "0 5 * * * /usr/bin/backup.sh \\\n  --verbose\n";
        let catalog = parse(crontab, DEFAULT_MATCHER, false).unwrap();

        assert_eq!(catalog.jobs.len(), 1);
        assert!(catalog.jobs[0].tasks[0]
            .command
            .as_deref()
            .unwrap()
            .contains("--verbose"));
    }

    #[test]
    fn an_unparseable_line_is_rejected() {
        let crontab = "this is not a cron line at all\n";
        assert!(matches!(
            parse(crontab, DEFAULT_MATCHER, false),
            Err(CrontabError::UnparseableLine { .. })
        ));
    }
}
