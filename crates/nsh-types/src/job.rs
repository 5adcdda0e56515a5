//! Job identification and status types.

use std::fmt;

/// Position of a job in the job table, counted from zero.
///
/// Users see and type job numbers counted from one (`%1` is the first job);
/// [`JobNumber::from_user`] and the `Display` impl do that translation, so
/// the internal numbering never leaks into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobNumber(pub usize);

impl JobNumber {
    /// Translate a user-facing number (as in `%N`) into the internal one.
    ///
    /// Returns `None` for zero, which names no job.
    pub fn from_user(n: usize) -> Option<Self> {
        n.checked_sub(1).map(JobNumber)
    }

    /// The internal, zero-based value.
    pub fn index(self) -> usize {
        self.0
    }

    /// The value shown to the user.
    pub fn user_facing(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for JobNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_facing())
    }
}

/// State of a tracked job.
///
/// A job enters the table either as `Foreground` (the shell blocks on it) or
/// `Running` (started with `&`). From there:
///
/// - `Running` ⇄ `Stopped` via stop and continue signals (`bg` continues),
/// - `Running`/`Stopped` → `Foreground` via `fg`,
/// - `Foreground` → `Stopped` on suspend,
/// - any state → removed from the table on exit or `kill`.
///
/// An empty slot is not a state: it is the absence of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Running in the background.
    Running,
    /// Running while the shell waits on it. At most one job is in this state.
    Foreground,
    /// Suspended by a stop signal.
    Stopped,
}

impl JobState {
    /// Whether the job is suspended.
    pub fn is_stopped(self) -> bool {
        matches!(self, JobState::Stopped)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "Running"),
            JobState::Foreground => write!(f, "Foreground"),
            JobState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// A tracked child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    /// Job number; dense among live jobs.
    pub number: JobNumber,
    /// Process id of the job's leader, which is also its process group id.
    pub pid: i32,
    /// Current state.
    pub state: JobState,
    /// The command line as typed, for display only.
    pub command: String,
}

impl JobInfo {
    /// Short `[N] (pid)` tag used in notices.
    pub fn tag(&self) -> String {
        format!("[{}] ({})", self.number, self.pid)
    }
}

/// The `jobs` listing format: `[N] (pid) State command`.
impl fmt::Display for JobInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {} {}",
            self.number, self.pid, self.state, self.command
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_numbers_are_one_based() {
        assert_eq!(JobNumber::from_user(1), Some(JobNumber(0)));
        assert_eq!(JobNumber::from_user(5), Some(JobNumber(4)));
        assert_eq!(JobNumber::from_user(0), None);
        assert_eq!(JobNumber(2).user_facing(), 3);
        assert_eq!(JobNumber(2).to_string(), "3");
    }

    #[test]
    fn display_matches_jobs_listing() {
        let job = JobInfo {
            number: JobNumber(0),
            pid: 4242,
            state: JobState::Running,
            command: "sleep 100 &".to_string(),
        };
        assert_eq!(job.to_string(), "[1] (4242) Running sleep 100 &");
        assert_eq!(job.tag(), "[1] (4242)");
    }

    #[test]
    fn state_names() {
        assert_eq!(JobState::Foreground.to_string(), "Foreground");
        assert_eq!(JobState::Stopped.to_string(), "Stopped");
        assert!(JobState::Stopped.is_stopped());
        assert!(!JobState::Running.is_stopped());
    }
}
