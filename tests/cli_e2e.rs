//! End-to-end CLI tests for the album-downloader and dedup-photo-urls binaries.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("album-downloader").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("highest available resolution"))
        .stdout(predicate::str::contains("--cooldown-minutes"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("album-downloader").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("album-downloader"));
}

#[test]
fn test_binary_missing_album_url_returns_error() {
    let mut cmd = Command::cargo_bin("album-downloader").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("<ALBUM_URL>"));
}

#[test]
fn test_binary_rejects_out_of_range_workers() {
    let mut cmd = Command::cargo_bin("album-downloader").unwrap();
    cmd.args([
        "https://www.flickr.com/photos/someone/albums/1",
        "--workers",
        "64",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("64"));
}

#[test]
fn test_binary_rejects_invalid_album_url_before_launching_browser() {
    let config_home = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("album-downloader").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .arg("not a url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid album URL"));
}

#[test]
fn test_binary_reports_bad_config_file() {
    let config_home = TempDir::new().unwrap();
    let app_dir = config_home.path().join("album-downloader");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("config.toml"), "threads = 4\n").unwrap();

    let mut cmd = Command::cargo_bin("album-downloader").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .arg("https://www.flickr.com/photos/someone/albums/1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_dedup_binary_rewrites_log_and_keeps_backup() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("photo_urls.txt");
    std::fs::write(&log, "a.jpg\thttps://x/a\nb.jpg\thttps://x/b\na.jpg\thttps://x/a\n").unwrap();

    let mut cmd = Command::cargo_bin("dedup-photo-urls").unwrap();
    cmd.arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 duplicates removed"))
        .stderr(predicate::str::contains("Processed 1 of 1 log file(s)"));

    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "a.jpg\thttps://x/a\nb.jpg\thttps://x/b\n"
    );
    assert!(dir.path().join("photo_urls.txt.bak").exists());
}

#[test]
fn test_dedup_binary_defaults_to_current_directory() {
    let dir = TempDir::new().unwrap();
    let album = dir.path().join("album");
    std::fs::create_dir_all(&album).unwrap();
    std::fs::write(album.join("photo_urls.txt"), "a\t1\na\t1\n").unwrap();

    let mut cmd = Command::cargo_bin("dedup-photo-urls").unwrap();
    cmd.current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 duplicates removed"));
    assert_eq!(
        std::fs::read_to_string(album.join("photo_urls.txt")).unwrap(),
        "a\t1\n"
    );
}

#[test]
fn test_dedup_binary_reports_when_nothing_matches() {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("failed_downloads.txt");
    std::fs::write(&ledger, "a\t1\na\t1\n").unwrap();

    let mut cmd = Command::cargo_bin("dedup-photo-urls").unwrap();
    cmd.arg(&ledger)
        .assert()
        .success()
        .stderr(predicate::str::contains("No photo_urls.txt files found"));
    assert_eq!(std::fs::read_to_string(&ledger).unwrap(), "a\t1\na\t1\n");
    assert!(!dir.path().join("failed_downloads.txt.bak").exists());
}
