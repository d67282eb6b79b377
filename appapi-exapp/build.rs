//! Stamps the ExApp binary with where it came from
//!
//! `main.rs` prints `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` in its
//! startup line, which is what an admin sees in the host's deploy log.

use std::process::Command;

/// Short commit hash, or `unknown` outside a git checkout
fn git_revision() -> String {
    let output = match Command::new("git").args(["rev-parse", "--short=8", "HEAD"]).output() {
        Ok(output) if output.status.success() => output,
        _ => return "unknown".to_string(),
    };
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn main() {
    let stamped_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    for (key, value) in [
        ("GIT_HASH", git_revision()),
        ("BUILD_TIMESTAMP", stamped_at),
        ("BUILD_PROFILE", profile),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
