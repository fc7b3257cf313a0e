use std::env;
use std::process::Command;

fn main() {
    let values = [
        ("SPECLINK_BUILD_TARGET", env::var("TARGET").ok()),
        ("SPECLINK_BUILD_PROFILE", env::var("PROFILE").ok()),
        ("RUSTC_VERSION", rustc_version()),
    ];
    for (key, value) in values {
        if let Some(value) = value {
            println!("cargo:rustc-env={key}={value}");
        }
    }
    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PROFILE");
    println!("cargo:rerun-if-env-changed=RUSTC");
}

/// `rustc --version` without the leading tool name, e.g. `1.85.0 (4d91de4e4 2025-02-17)`.
fn rustc_version() -> Option<String> {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let output = Command::new(rustc).arg("--version").output().ok()?;
    let text = String::from_utf8(output.stdout).ok()?;
    let version = text.trim().trim_start_matches("rustc ").to_string();
    (!version.is_empty()).then_some(version)
}
