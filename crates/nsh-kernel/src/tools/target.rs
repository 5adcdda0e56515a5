//! Job targets: `%N` or a raw pid.

use std::fmt;

use thiserror::Error;

use nsh_types::{JobInfo, JobNumber};

use crate::scheduler::JobTable;

/// Errors from resolving a job target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("usage: {0} <%N|pid>")]
    Missing(&'static str),

    #[error("{0}: bad job number")]
    BadJobNumber(String),

    #[error("{0}: arguments must be process or job IDs")]
    BadPid(String),

    #[error("{0}: no such job")]
    NoSuchJob(String),
}

impl TargetError {
    /// Exit code: 2 for malformed arguments, 1 for a well-formed target
    /// that names no live job.
    pub fn exit_code(&self) -> i64 {
        match self {
            TargetError::NoSuchJob(_) => 1,
            _ => 2,
        }
    }
}

/// What the user asked a job-control command to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTarget {
    /// `%N`, already translated to the internal numbering.
    Number(JobNumber),
    /// A literal process id.
    Pid(i32),
}

impl JobTarget {
    /// Parse a target argument.
    pub fn parse(arg: &str) -> Result<Self, TargetError> {
        if let Some(number) = arg.strip_prefix('%') {
            return number
                .parse::<usize>()
                .ok()
                .and_then(JobNumber::from_user)
                .map(JobTarget::Number)
                .ok_or_else(|| TargetError::BadJobNumber(arg.to_string()));
        }
        match arg.parse::<i32>() {
            Ok(pid) if pid > 0 => Ok(JobTarget::Pid(pid)),
            _ => Err(TargetError::BadPid(arg.to_string())),
        }
    }

    /// Find the job this target names.
    pub fn find<'a>(&self, table: &'a JobTable) -> Option<&'a JobInfo> {
        match *self {
            JobTarget::Number(number) => table.find_by_number(number),
            JobTarget::Pid(pid) => table.find_by_pid(pid),
        }
    }
}

impl fmt::Display for JobTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTarget::Number(number) => write!(f, "%{}", number),
            JobTarget::Pid(pid) => write!(f, "{}", pid),
        }
    }
}

/// Resolve the first argument of `cmd` to a live job.
pub fn resolve_target(
    cmd: &'static str,
    args: &[String],
    table: &JobTable,
) -> Result<JobInfo, TargetError> {
    let arg = args.first().ok_or(TargetError::Missing(cmd))?;
    let target = JobTarget::parse(arg)?;
    target
        .find(table)
        .cloned()
        .ok_or_else(|| TargetError::NoSuchJob(arg.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsh_types::JobState;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn parse_job_numbers() {
        assert_eq!(JobTarget::parse("%1"), Ok(JobTarget::Number(JobNumber(0))));
        assert_eq!(JobTarget::parse("%5"), Ok(JobTarget::Number(JobNumber(4))));
        assert_eq!(
            JobTarget::parse("%0"),
            Err(TargetError::BadJobNumber("%0".into()))
        );
        assert_eq!(
            JobTarget::parse("%x"),
            Err(TargetError::BadJobNumber("%x".into()))
        );
        assert_eq!(JobTarget::parse("%"), Err(TargetError::BadJobNumber("%".into())));
    }

    #[test]
    fn parse_pids() {
        assert_eq!(JobTarget::parse("4242"), Ok(JobTarget::Pid(4242)));
        assert_eq!(JobTarget::parse("0"), Err(TargetError::BadPid("0".into())));
        assert_eq!(JobTarget::parse("-3"), Err(TargetError::BadPid("-3".into())));
        assert_eq!(JobTarget::parse("abc"), Err(TargetError::BadPid("abc".into())));
    }

    #[test]
    fn display_is_user_facing() {
        assert_eq!(JobTarget::Number(JobNumber(0)).to_string(), "%1");
        assert_eq!(JobTarget::Pid(77).to_string(), "77");
    }

    #[test]
    fn resolve_against_table() {
        let mut table = JobTable::new();
        table.insert(100, JobState::Running, "a &").unwrap();
        table.insert(200, JobState::Stopped, "b").unwrap();

        let job = resolve_target("fg", &args(&["%2"]), &table).unwrap();
        assert_eq!(job.pid, 200);
        let job = resolve_target("fg", &args(&["100"]), &table).unwrap();
        assert_eq!(job.number, JobNumber(0));

        assert_eq!(
            resolve_target("fg", &args(&["%3"]), &table),
            Err(TargetError::NoSuchJob("%3".into()))
        );
        assert_eq!(
            resolve_target("kill", &[], &table),
            Err(TargetError::Missing("kill"))
        );
        assert_eq!(TargetError::NoSuchJob("%3".into()).to_string(), "%3: no such job");
        assert_eq!(TargetError::Missing("bg").exit_code(), 2);
    }
}
