use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const LOG_NAME: &str = "20240115093000123_1362-00394_NXTIIIc17.DAT";

fn fujiscout(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("fujiscout-cli")?;
    // Keeps log files and local config lookups inside the test directory
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    Ok(cmd)
}

fn create_log_tree(root: &Path) -> Result<()> {
    fs::create_dir_all(root.join("0001"))?;
    fs::create_dir_all(root.join("0002"))?;
    fs::write(root.join("0001").join(LOG_NAME), "1362-00394 OK\nother line\n")?;
    fs::write(
        root.join("0002").join("20240116101500456_1190160_NXTIIIc17.DAT"),
        "1190160 NG\n",
    )?;
    Ok(())
}

#[test]
fn test_scan_writes_annotated_lines() -> Result<()> {
    let dir = tempdir()?;
    create_log_tree(&dir.path().join("root"))?;

    fujiscout(&dir)?
        .args([
            "scan",
            "-d",
            "root",
            "-w",
            "1362-00394,1190160",
            "-p",
            "*NXTIIIc17.DAT",
            "-o",
            "FujiSearch.txt",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Search completed. Total matches found: 2",
        ))
        .stdout(predicate::str::is_match(r"Log: .*fujiscout_log_0\.txt")?);

    let output = fs::read_to_string(dir.path().join("FujiSearch.txt"))?;
    assert_eq!(
        output,
        concat!(
            r#""20240115093000123_1362-00394_NXTIIIc17.DAT","2024-01-15 09:30:00.123","1362-00394","NXTIIIc17",1362-00394 OK"#,
            "\n",
            r#""20240116101500456_1190160_NXTIIIc17.DAT","2024-01-16 10:15:00.456","1190160","NXTIIIc17",1190160 NG"#,
            "\n"
        )
    );
    assert!(!dir.path().join("fujiscout-queue.txt").exists());
    assert!(dir.path().join("fujiscout_log_0.txt").exists());
    Ok(())
}

#[test]
fn test_keep_records_prints_matches() -> Result<()> {
    let dir = tempdir()?;
    create_log_tree(&dir.path().join("root"))?;

    fujiscout(&dir)?
        .args([
            "scan", "-d", "root", "-w", "1190160", "-p", "*.DAT", "-o", "out.txt",
            "--keep-records",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""1190160","NXTIIIc17",1190160 NG"#));
    Ok(())
}

#[test]
fn test_existing_output_requires_choice() -> Result<()> {
    let dir = tempdir()?;
    create_log_tree(&dir.path().join("root"))?;
    fs::write(dir.path().join("out.txt"), "earlier\n")?;

    let args = ["scan", "-d", "root", "-w", "1362-00394", "-p", "*.DAT", "-o", "out.txt"];

    fujiscout(&dir)?
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(dir.path().join("out.txt"))?, "earlier\n");

    fujiscout(&dir)?.args(args).arg("--append").assert().success();
    let appended = fs::read_to_string(dir.path().join("out.txt"))?;
    assert!(appended.starts_with("earlier\n"));
    assert_eq!(appended.lines().count(), 2);

    fujiscout(&dir)?.args(args).arg("--overwrite").assert().success();
    let replaced = fs::read_to_string(dir.path().join("out.txt"))?;
    assert!(!replaced.contains("earlier"));
    assert_eq!(replaced.lines().count(), 1);
    Ok(())
}

#[test]
fn test_missing_words_is_config_error() -> Result<()> {
    let dir = tempdir()?;
    create_log_tree(&dir.path().join("root"))?;

    fujiscout(&dir)?
        .args(["scan", "-d", "root", "-p", "*.DAT", "-o", "out.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("At least one word is required"));
    assert!(!dir.path().join("out.txt").exists());
    Ok(())
}

#[test]
fn test_missing_root_is_config_error() -> Result<()> {
    let dir = tempdir()?;

    fujiscout(&dir)?
        .args(["scan", "-d", "nowhere", "-w", "x", "-p", "*.DAT", "-o", "out.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Root folder does not exist"));
    Ok(())
}

#[test]
fn test_queue_and_clear_queue() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("q.txt"), "/data/0001\n/data/0002\n")?;

    fujiscout(&dir)?
        .args(["queue", "--queue-file", "q.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 folder(s) pending"))
        .stdout(predicate::str::contains("/data/0002"));

    fujiscout(&dir)?
        .args(["clear-queue", "--queue-file", "q.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed work queue"));
    assert!(!dir.path().join("q.txt").exists());

    fujiscout(&dir)?
        .args(["queue", "--queue-file", "q.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No folders pending"));
    Ok(())
}

#[test]
fn test_resume_continues_pending_folders() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("root");
    create_log_tree(&root)?;
    // An earlier run already finished 0001.
    fs::write(
        dir.path().join("fujiscout-queue.txt"),
        format!("{}\n", root.join("0002").display()),
    )?;
    fs::write(dir.path().join("out.txt"), "earlier\n")?;

    fujiscout(&dir)?
        .args([
            "scan", "-d", "root", "-w", "1362-00394,1190160", "-p", "*.DAT", "-o", "out.txt",
            "--resume",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches found: 1"));

    let output = fs::read_to_string(dir.path().join("out.txt"))?;
    assert_eq!(output.lines().count(), 2);
    assert!(output.lines().nth(1).unwrap_or_default().ends_with(",1190160 NG"));
    Ok(())
}

#[test]
fn test_init_config_then_scan_with_it() -> Result<()> {
    let dir = tempdir()?;
    create_log_tree(&dir.path().join("root"))?;

    fujiscout(&dir)?
        .args(["init-config", "custom.yaml"])
        .assert()
        .success();
    let written = fs::read_to_string(dir.path().join("custom.yaml"))?;
    assert!(written.contains("*NXTIIIc17.DAT"));

    fujiscout(&dir)?
        .args(["init-config", "custom.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    // Words and root come from the command line, the rest from the file.
    fujiscout(&dir)?
        .args([
            "--config",
            "custom.yaml",
            "scan",
            "-d",
            "root",
            "-w",
            "1362-00394",
        ])
        .assert()
        .success();
    assert!(dir.path().join("FujiSearch.txt").exists());
    Ok(())
}

#[test]
fn test_flag_equal_to_default_overrides_config_file() -> Result<()> {
    let dir = tempdir()?;
    create_log_tree(&dir.path().join("root"))?;
    fs::write(
        dir.path().join("plain.yaml"),
        "name_format: plain\nencoding_mode: failfast\n",
    )?;

    // With the file's plain layout the timestamped name is malformed.
    fujiscout(&dir)?
        .args([
            "--config", "plain.yaml", "scan", "-d", "root", "-w", "1362-00394", "-p", "*.DAT",
            "-o", "plain.txt",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches found: 0"));

    fujiscout(&dir)?
        .args([
            "--config",
            "plain.yaml",
            "scan",
            "-d",
            "root",
            "-w",
            "1362-00394",
            "-p",
            "*.DAT",
            "-o",
            "timestamped.txt",
            "--name-format",
            "timestamped",
            "--encoding",
            "lossy",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total matches found: 1"));

    let output = fs::read_to_string(dir.path().join("timestamped.txt"))?;
    assert!(output.contains(r#","2024-01-15 09:30:00.123","1362-00394","NXTIIIc17","#));
    Ok(())
}
