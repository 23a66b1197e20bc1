//! Integration tests for CLI argument handling and the interactive prompt
//!
//! Runs the built binary with piped stdin. No command used here touches the
//! network.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Helper to run the CLI with given args and stdin, capturing output
fn run_cli(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pokedex"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute pokedex");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for pokedex")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"], "");
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pokedex"), "Help should mention pokedex");
    assert!(stdout.contains("--cache-ttl"), "Help should mention --cache-ttl");
    assert!(stdout.contains("--save-path"), "Help should mention --save-path");
}

#[test]
fn test_zero_cache_ttl_prints_error_and_exits() {
    let output = run_cli(&["--cache-ttl", "0"], "");
    assert!(!output.status.success(), "Expected zero TTL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("cache TTL"),
        "Should print error message about the cache TTL: {}",
        stderr
    );
}

#[test]
fn test_huge_cache_ttl_prints_error_and_exits() {
    let max = u64::MAX.to_string();
    let output = run_cli(&["--cache-ttl", max.as_str()], "");
    assert!(!output.status.success(), "Expected an unrepresentable TTL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("too long"), "Should reject the TTL: {}", stderr);
    assert!(!stderr.contains("panicked"), "Should not panic: {}", stderr);
}

#[test]
fn test_help_command_then_exit() {
    let temp_dir = TempDir::new().unwrap();
    let save_path = temp_dir.path().join("dex.json");

    let output = run_cli(
        &["--save-path", save_path.to_str().unwrap()],
        "help\nexit\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to the Pokedex!"));
    assert!(stdout.contains("catch: "));
    assert!(stdout.contains("Goodbye"));
}

#[test]
fn test_end_of_input_exits_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let save_path = temp_dir.path().join("dex.json");

    let output = run_cli(&["--save-path", save_path.to_str().unwrap()], "pokedex\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Your Pokedex is empty"));
    assert!(!save_path.exists(), "Nothing caught, nothing saved");
}

#[test]
fn test_saved_pokedex_is_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let save_path = temp_dir.path().join("dex.json");
    std::fs::write(
        &save_path,
        r#"{
            "eevee": {
                "pokemon": {"name": "eevee", "height": 3, "weight": 65, "base_experience": 65},
                "caught_at": "2026-01-01T00:00:00Z"
            }
        }"#,
    )
    .unwrap();

    let output = run_cli(
        &["--save-path", save_path.to_str().unwrap()],
        "pokedex\ninspect eevee\nexit\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Loaded 1 Pokemon"));
    assert!(stdout.contains(" - eevee"));
    assert!(stdout.contains("Weight: 65"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use pokedex::cli::{Cli, CliError, StartupConfig};
    use std::time::Duration;

    #[test]
    fn test_cli_cache_ttl_flag() {
        let cli = Cli::parse_from(["pokedex", "--cache-ttl", "45"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(45));
    }

    #[test]
    fn test_cli_zero_timeout_is_rejected() {
        let cli = Cli::parse_from(["pokedex", "--timeout", "0"]);
        assert_eq!(StartupConfig::from_cli(&cli), Err(CliError::ZeroTimeout));
    }
}
