//! Embeds the commit and build date shown by `nsh --version`.

use std::process::Command;

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn main() {
    let revision = git_revision().unwrap_or_else(|| "unknown".to_owned());
    let date = chrono::Utc::now().date_naive();

    println!("cargo::rustc-env=NSH_GIT_HASH={revision}");
    println!("cargo::rustc-env=NSH_BUILD_DATE={date}");
}
