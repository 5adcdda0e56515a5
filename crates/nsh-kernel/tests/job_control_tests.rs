//! End-to-end job control against real child processes.
//!
//! Keystroke actions are delivered through each shell's `SignalRelay`
//! handle, which does exactly what the signal watcher does on a real
//! SIGINT/SIGTSTP but only for that shell. Tests can therefore run in
//! parallel without signaling each other's jobs.

use std::future::Future;
use std::time::Duration;

use nix::sys::signal::Signal;
use nsh_kernel::scheduler::{lock_table, process_exists, signal_job};
use nsh_kernel::{JobState, Shell, ShellConfig};

fn shell() -> Shell {
    Shell::new(ShellConfig::transient()).expect("Failed to create shell")
}

/// Poll `cond` until it holds, failing the test after a few seconds.
async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Kill whatever a test left behind.
fn cleanup(shell: &Shell) {
    for job in shell.jobs() {
        let _ = signal_job(job.pid, Signal::SIGKILL);
    }
}

/// The scheduler state letter from /proc (`R`, `S`, `T`, ...).
fn proc_state(pid: i32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let (_, rest) = stat.rsplit_once(')')?;
    rest.trim_start().chars().next()
}

/// Run `line` in the foreground while `during` acts once the job is
/// registered as the foreground job.
async fn with_foreground<F, Fut>(shell: &mut Shell, line: &str, during: F) -> nsh_kernel::ExecResult
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let table = shell.job_table().clone();
    let actor = tokio::spawn(async move {
        wait_until("a foreground job", || lock_table(&table).has_foreground()).await;
        during().await;
    });
    let result = shell.execute(line).await;
    actor.await.expect("actor task panicked");
    result
}

// ============================================================================
// Launching
// ============================================================================

#[tokio::test]
async fn foreground_command_runs_to_completion() {
    let mut shell = shell();
    let result = shell.execute("true").await;
    assert!(result.ok(), "true should succeed: {:?}", result);
    assert!(shell.jobs().is_empty());

    let result = shell.execute("false").await;
    assert_eq!(result.code, 1, "exit code passes through: {:?}", result);
    assert!(shell.jobs().is_empty());
}

#[tokio::test]
async fn command_not_found_is_not_registered() {
    let mut shell = shell();
    let result = shell.execute("definitely_not_a_real_command_12345 arg").await;
    assert_eq!(result.code, 127);
    assert_eq!(
        result.err,
        "nsh: definitely_not_a_real_command_12345: command not found"
    );
    assert!(shell.jobs().is_empty());
}

#[tokio::test]
async fn background_jobs_are_listed_and_renumbered() {
    let mut shell = shell();

    let first = shell.execute("sleep 100 &").await;
    assert!(first.ok());
    let second = shell.execute("sleep 200 &").await;
    assert!(second.ok());

    let jobs = shell.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(first.err, jobs[0].tag());
    assert_eq!(second.err, jobs[1].tag());

    let listing = shell.execute("jobs").await;
    assert_eq!(
        listing.out,
        format!(
            "[1] ({}) Running sleep 100 &\n[2] ({}) Running sleep 200 &\n",
            jobs[0].pid, jobs[1].pid
        )
    );

    // Simulate job 1 exiting.
    let sleep_200 = jobs[1].pid;
    let _ = signal_job(jobs[0].pid, Signal::SIGKILL);
    shell.job_table().lock().unwrap().delete(jobs[0].pid);

    let jobs = shell.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].number.user_facing(), 1);
    assert_eq!(jobs[0].pid, sleep_200);
    assert_eq!(jobs[0].state, JobState::Running);

    cleanup(&shell);
}

#[tokio::test]
async fn capacity_is_enforced_before_forking() {
    let mut shell = Shell::new(ShellConfig::transient().with_max_jobs(2)).unwrap();
    assert!(shell.execute("sleep 30 &").await.ok());
    assert!(shell.execute("sleep 30 &").await.ok());

    let result = shell.execute("sleep 30 &").await;
    assert_eq!(result.code, 1);
    assert!(result.err.contains("job table full"), "{}", result.err);
    assert_eq!(shell.jobs().len(), 2);

    cleanup(&shell);
}

#[tokio::test]
async fn duplicate_foreground_is_an_internal_error() {
    let mut shell = shell();
    shell
        .job_table()
        .lock()
        .unwrap()
        .insert(i32::MAX - 50, JobState::Foreground, "phantom")
        .unwrap();

    let result = shell.execute("true").await;
    assert_eq!(result.code, 1);
    assert!(result.err.contains("internal error"), "{}", result.err);
    assert_eq!(shell.jobs().len(), 1);
}

#[tokio::test]
async fn syntax_errors_exit_two() {
    let mut shell = shell();
    let result = shell.execute("cat >").await;
    assert_eq!(result.code, 2);
    assert!(result.err.starts_with("nsh: syntax error"));
    assert!(shell.execute("   ").await.ok());
}

// ============================================================================
// Redirection
// ============================================================================

#[tokio::test]
async fn redirects_both_streams() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    std::fs::write(&input, "pear\napple\nfig\n").unwrap();

    let mut shell = shell();
    let line = format!("sort < {} > {}", input.display(), output.display());
    let result = shell.execute(&line).await;
    assert!(result.ok(), "{:?}", result);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "apple\nfig\npear\n");
}

#[tokio::test]
async fn output_redirect_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");
    std::fs::write(&output, "old contents that are long\n").unwrap();

    let mut shell = shell();
    let result = shell.execute(&format!("echo new > {}", output.display())).await;
    assert!(result.ok());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "new\n");
}

#[tokio::test]
async fn missing_input_aborts_before_launch() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");

    let mut shell = shell();
    let result = shell.execute(&format!("cat < {}", missing.display())).await;
    assert_eq!(result.code, 1);
    assert!(result.err.contains("nope.txt"), "{}", result.err);
    assert!(shell.jobs().is_empty());
}

#[tokio::test]
async fn builtin_output_can_be_redirected() {
    let dir = tempfile::tempdir().unwrap();
    let listing = dir.path().join("jobs.txt");

    let mut shell = shell();
    shell.execute("sleep 30 &").await;
    let pid = shell.jobs()[0].pid;

    let result = shell.execute(&format!("jobs > {}", listing.display())).await;
    assert!(result.ok());
    assert!(result.out.is_empty());
    assert_eq!(
        std::fs::read_to_string(&listing).unwrap(),
        format!("[1] ({pid}) Running sleep 30 &\n")
    );

    cleanup(&shell);
}

// ============================================================================
// Suspend, interrupt, fg, bg, kill
// ============================================================================

#[tokio::test]
async fn suspend_then_bg_then_kill() {
    let mut shell = shell();
    let relay = shell.relay().clone();

    let result = with_foreground(&mut shell, "sleep 30", move || async move {
        assert_eq!(relay.suspend().len(), 1);
    })
    .await;

    assert_eq!(result.code, 128 + Signal::SIGSTOP as i64);
    let jobs = shell.jobs();
    assert_eq!(jobs.len(), 1, "a stopped job stays in the table");
    assert_eq!(jobs[0].state, JobState::Stopped);
    assert_eq!(result.err, format!("[1] ({}) Stopped sleep 30", jobs[0].pid));
    let pid = jobs[0].pid;
    assert_eq!(proc_state(pid), Some('T'));

    let result = shell.execute("bg %1").await;
    assert!(result.ok(), "{:?}", result);
    assert_eq!(shell.jobs()[0].state, JobState::Running);
    wait_until("the job to resume", || proc_state(pid) != Some('T')).await;

    let result = shell.execute("kill %1").await;
    assert!(result.ok(), "{:?}", result);
    assert!(shell.jobs().is_empty());
    wait_until("the job to die", || !process_exists(pid)).await;
}

#[tokio::test]
async fn interrupt_removes_the_foreground_job() {
    let mut shell = shell();
    let relay = shell.relay().clone();

    let result = with_foreground(&mut shell, "sleep 30", move || async move {
        assert_eq!(relay.interrupt().len(), 1);
    })
    .await;

    assert_eq!(result.code, 128 + Signal::SIGINT as i64);
    assert!(shell.jobs().is_empty());
}

#[tokio::test]
async fn interrupt_leaves_background_jobs_alone() {
    let mut shell = shell();
    shell.execute("sleep 30 &").await;
    let relay = shell.relay().clone();

    let result = with_foreground(&mut shell, "sleep 30", move || async move {
        relay.interrupt();
    })
    .await;

    assert_eq!(result.code, 130);
    let jobs = shell.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, JobState::Running);

    cleanup(&shell);
}

#[tokio::test]
async fn fg_waits_for_a_resumed_job() {
    let mut shell = shell();
    let relay = shell.relay().clone();

    with_foreground(&mut shell, "sleep 1", move || async move {
        relay.suspend();
    })
    .await;
    let pid = shell.jobs()[0].pid;

    let result = shell.execute(&format!("fg {pid}")).await;
    assert!(result.ok(), "{:?}", result);
    assert!(shell.jobs().is_empty());
}

#[tokio::test]
async fn fg_can_be_suspended_again() {
    let mut shell = shell();
    let relay = shell.relay().clone();
    with_foreground(&mut shell, "sleep 30", move || async move {
        relay.suspend();
    })
    .await;

    let relay = shell.relay().clone();
    let result = with_foreground(&mut shell, "fg %1", move || async move {
        relay.suspend();
    })
    .await;

    assert_eq!(result.code, 128 + Signal::SIGSTOP as i64);
    assert_eq!(shell.jobs()[0].state, JobState::Stopped);

    assert!(shell.execute("kill %1").await.ok());
}

#[tokio::test]
async fn kill_wakes_a_stopped_job_before_interrupting() {
    let mut shell = shell();
    let relay = shell.relay().clone();
    with_foreground(&mut shell, "sleep 30", move || async move {
        relay.suspend();
    })
    .await;
    let pid = shell.jobs()[0].pid;
    assert_eq!(proc_state(pid), Some('T'));

    let result = shell.execute("kill %1").await;
    assert!(result.ok());
    assert!(shell.jobs().is_empty());
    // An interrupt alone would stay pending on a stopped process.
    wait_until("the stopped job to die", || !process_exists(pid)).await;
}

#[tokio::test]
async fn invalid_targets_are_reported() {
    let mut shell = shell();

    let result = shell.execute("fg %3").await;
    assert_eq!((result.code, result.err.as_str()), (1, "fg: %3: no such job"));

    let result = shell.execute("bg abc").await;
    assert_eq!(result.code, 2);

    let result = shell.execute("kill").await;
    assert_eq!(result.err, "kill: usage: kill <%N|pid>");
}

// ============================================================================
// Background exit reconciliation
// ============================================================================

#[tokio::test]
async fn finished_background_jobs_are_reconciled() {
    let mut shell = shell();
    shell.execute("true &").await;
    let pid = shell.jobs()[0].pid;

    let mut notices = Vec::new();
    wait_until("a Done notice", || {
        notices.extend(shell.take_notices());
        !notices.is_empty()
    })
    .await;

    assert_eq!(notices, vec![format!("[1] ({pid}) Done true &")]);
    assert!(shell.jobs().is_empty());
}

#[tokio::test]
async fn reconciliation_can_be_disabled() {
    let mut shell = Shell::new(ShellConfig::transient().with_reap_background(false)).unwrap();
    shell.execute("true &").await;
    let pid = shell.jobs()[0].pid;

    wait_until("the child to be reaped", || !process_exists(pid)).await;
    assert!(shell.take_notices().is_empty());

    let jobs = shell.jobs();
    assert_eq!(jobs.len(), 1, "exited background job stays listed");
    assert_eq!(jobs[0].state, JobState::Running);

    // Killing it still clears the entry.
    shell.execute("kill %1").await;
    assert!(shell.jobs().is_empty());
}
