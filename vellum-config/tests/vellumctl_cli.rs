//! Spawns the real `vellumctl` binary against throwaway config files.

use std::fs;

use assert_cmd::Command;
use tempfile::TempDir;

fn vellumctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vellumctl").expect("binary built");
    cmd.current_dir(dir.path())
        .env_clear()
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = vellumctl(&dir).arg("--help").output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["check", "migrate", "config", "statuses"] {
        assert!(stdout.contains(command), "missing {command} in:\n{stdout}");
    }
}

#[test]
fn config_output_masks_the_password() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("vellum.toml"),
        "[catalog]\nmax_page_size = 50\n",
    )
    .expect("write config");

    let output = vellumctl(&dir)
        .env("DATABASE_URL", "postgresql://app:hunter2@db:5432/vellum")
        .arg("config")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("hunter2"));
    assert!(stdout.contains("app:****@db:5432"));
    assert!(stdout.contains("max_page_size = 50"));
    assert!(stdout.contains("# database url source: DATABASE_URL"));
}

#[test]
fn check_rejects_inverted_page_sizes() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("vellum.toml"),
        "[catalog]\ndefault_page_size = 80\nmax_page_size = 40\n",
    )
    .expect("write config");

    let output = vellumctl(&dir).arg("check").output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exceeds max page size"), "stderr:\n{stderr}");
}

#[test]
fn check_without_database_warns_but_passes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = vellumctl(&dir).arg("check").output().expect("run");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No database URL configured"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("configuration OK"));
}

#[test]
fn migrate_requires_a_database_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = vellumctl(&dir).arg("migrate").output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no database URL configured"));
}

#[test]
fn statuses_prints_the_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = vellumctl(&dir).arg("statuses").output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("uploading -> uploaded"));
    assert!(stdout.contains("transcoding -> ready, failed"));
    assert!(stdout.contains("failed (terminal)"));
}
