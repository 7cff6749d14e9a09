//! End-to-end tests for local copies through the `ssync cp` CLI.

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;

/// Config with a client section and no known servers; enough for local copies.
fn write_client_config(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        r#"
[client]
default_workers = 4

[client.servers]
"#,
    )
    .unwrap();
    path
}

fn setup_test_env() -> (tempfile::TempDir, tempfile::TempDir, std::path::PathBuf) {
    let src_dir = tempfile::tempdir().unwrap();
    let dst_dir = tempfile::tempdir().unwrap();
    let config = write_client_config(src_dir.path());
    (src_dir, dst_dir, config)
}

fn create_test_file(path: &std::path::Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

fn get_file_content(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_copy_single_file_to_new_name() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let src_file = src_dir.path().join("test.txt");
    let dst_file = dst_dir.path().join("renamed.txt");
    create_test_file(&src_file, "test content");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            src_file.to_str().unwrap(),
            dst_file.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(get_file_content(&dst_file), "test content");
}

#[test]
fn test_copy_multiple_files_into_directory() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let x = src_dir.path().join("x.txt");
    let y = src_dir.path().join("y.txt");
    create_test_file(&x, "xx");
    create_test_file(&y, "yy");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            x.to_str().unwrap(),
            y.to_str().unwrap(),
            dst_dir.path().to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(get_file_content(&dst_dir.path().join("x.txt")), "xx");
    assert_eq!(get_file_content(&dst_dir.path().join("y.txt")), "yy");
}

#[test]
fn test_glob_copies_only_matching_files() {
    let (src_dir, dst_dir, config) = setup_test_env();
    create_test_file(&src_dir.path().join("a.txt"), "a");
    create_test_file(&src_dir.path().join("b.txt"), "b");
    create_test_file(&src_dir.path().join("c.log"), "c");
    let pattern = src_dir.path().join("*.txt");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            pattern.to_str().unwrap(),
            dst_dir.path().to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(dst_dir.path().join("a.txt").is_file());
    assert!(dst_dir.path().join("b.txt").is_file());
    assert!(!dst_dir.path().join("c.log").exists());
}

#[test]
fn test_existing_destination_without_force_fails_and_is_unmodified() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let src_file = src_dir.path().join("test.txt");
    let dst_file = dst_dir.path().join("out.txt");
    create_test_file(&src_file, "new content");
    create_test_file(&dst_file, "old content");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            src_file.to_str().unwrap(),
            dst_file.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("already exists"));
    assert_eq!(get_file_content(&dst_file), "old content");
}

#[test]
fn test_force_overwrites_existing_destination() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let src_file = src_dir.path().join("test.txt");
    let dst_file = dst_dir.path().join("out.txt");
    create_test_file(&src_file, "new content");
    create_test_file(&dst_file, "old content");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            "--force",
            src_file.to_str().unwrap(),
            dst_file.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert_eq!(get_file_content(&dst_file), "new content");
}

#[test]
fn test_multiple_sources_into_a_file_destination_fails_before_writing() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let x = src_dir.path().join("x.txt");
    let y = src_dir.path().join("y.txt");
    let dst_file = dst_dir.path().join("plain.txt");
    create_test_file(&x, "x");
    create_test_file(&y, "y");
    create_test_file(&dst_file, "untouched");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            x.to_str().unwrap(),
            y.to_str().unwrap(),
            dst_file.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("is not a dir"));
    assert_eq!(get_file_content(&dst_file), "untouched");
}

#[test]
fn test_no_match_at_all_fails() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let pattern = src_dir.path().join("*.mp3");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            pattern.to_str().unwrap(),
            dst_dir.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("no file matched the sources"));
}

#[test]
fn test_missing_literal_source_fails() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let missing = src_dir.path().join("missing.txt");
    // the only source fails to expand, so nothing matches
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            missing.to_str().unwrap(),
            dst_dir.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(
            predicates::str::contains("no file matched the sources")
                .or(predicates::str::contains("no file or directory")),
        );
}

#[test]
fn test_unknown_server_in_path_is_a_parse_error() {
    let (src_dir, dst_dir, config) = setup_test_env();
    let src_file = src_dir.path().join("test.txt");
    create_test_file(&src_file, "x");
    Command::cargo_bin("ssync")
        .unwrap()
        .args([
            "cp",
            "-c",
            config.to_str().unwrap(),
            src_file.to_str().unwrap(),
            "nowhere:docs/test.txt",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains("does not exist"));
    let _ = dst_dir;
}
