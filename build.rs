//! Build script
//!
//! Embeds build metadata (timestamp and git hash) so the controller can log
//! exactly which build is running at startup.

use std::process::Command;

fn main() {
    let now = chrono::Utc::now();
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", now.timestamp());
    println!("cargo:rustc-env=BUILD_DATETIME={}", now.to_rfc3339());

    // Command-line git keeps the build free of libgit2/OpenSSL
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=BUILD_GIT_HASH={git_hash}");

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
