#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Binary-level tests: run `dotlink` with an isolated `$HOME`.

mod common;

use std::fs;

use anyhow::Result;
use assert_cmd::Command;
use common::Sandbox;
use predicates::prelude::*;

fn dotlink(sandbox: &Sandbox) -> Result<Command> {
    let mut cmd = Command::cargo_bin("dotlink")?;
    cmd.env("HOME", sandbox.home())
        .env("XDG_CACHE_HOME", sandbox.cache());
    Ok(cmd)
}

#[test]
fn version_prints_name() -> Result<()> {
    let sandbox = Sandbox::new();
    dotlink(&sandbox)?
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dotlink "));
    Ok(())
}

#[test]
fn without_profile_fails() -> Result<()> {
    let sandbox = Sandbox::new();
    dotlink(&sandbox)?
        .assert()
        .failure()
        .stderr(predicate::str::contains("profile file not specified"));
    Ok(())
}

#[test]
fn install_then_remembered_profile() -> Result<()> {
    let sandbox = Sandbox::new();
    let source = sandbox.write(&sandbox.dots(), ".vimrc", "v");
    let profile = sandbox.write_profile(&[(".vimrc", ".vimrc")], &[]);

    dotlink(&sandbox)?
        .arg("--config")
        .arg(&profile)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("set symlink"));
    assert_eq!(fs::read_link(sandbox.home().join(".vimrc"))?, source);
    assert!(sandbox.home().join(".dotlink/config.json").is_file());
    assert!(sandbox.cache().join("dotlink/install.log").is_file());

    // no --config: the remembered profile is used and nothing changes
    dotlink(&sandbox)?
        .assert()
        .success()
        .stdout(predicate::str::contains("0 linked"));
    Ok(())
}

#[test]
fn quiet_install_prints_nothing() -> Result<()> {
    let sandbox = Sandbox::new();
    sandbox.write(&sandbox.dots(), ".vimrc", "v");
    let profile = sandbox.write_profile(&[(".vimrc", ".vimrc")], &[]);

    dotlink(&sandbox)?
        .args(["-q", "-c"])
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn clean_removes_dead_links() -> Result<()> {
    let sandbox = Sandbox::new();
    let profile = sandbox.write_profile(&[], &[]);
    std::os::unix::fs::symlink(sandbox.dots().join("gone"), sandbox.home().join(".dead"))?;

    dotlink(&sandbox)?
        .arg("clean")
        .arg("--config")
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed broken symlink"));
    assert!(sandbox.home().join(".dead").symlink_metadata().is_err());
    Ok(())
}

#[test]
fn add_adopts_file() -> Result<()> {
    let sandbox = Sandbox::new();
    let profile = sandbox.write_profile(&[], &[]);
    let original = sandbox.write(&sandbox.home(), ".zshrc", "zsh");

    dotlink(&sandbox)?
        .arg("--config")
        .arg(&profile)
        .arg("add")
        .arg(&original)
        .assert()
        .success();
    assert_eq!(fs::read_link(&original)?, sandbox.dots().join(".zshrc"));
    Ok(())
}

#[test]
fn add_missing_file_fails() -> Result<()> {
    let sandbox = Sandbox::new();
    let profile = sandbox.write_profile(&[], &[]);

    dotlink(&sandbox)?
        .arg("--config")
        .arg(&profile)
        .arg("add")
        .arg(sandbox.home().join(".nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such file or directory"));
    Ok(())
}
