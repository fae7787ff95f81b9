#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Integration tests for the dead-link sweep.

mod common;

use std::os::unix::fs::symlink;

use common::Sandbox;
use dotlink::commands::clean::sweep;
use dotlink::error::LinkError;
use dotlink::resources::Cleaner;

#[test]
fn removes_exactly_the_dangling_link() {
    let sandbox = Sandbox::new();
    let home = sandbox.home();
    let alive = sandbox.write(&sandbox.dots(), "alive", "x");
    symlink(&alive, home.join("good")).unwrap();
    symlink(sandbox.dots().join("gone"), home.join("dead")).unwrap();
    sandbox.write(&home, "plain", "p");
    std::fs::create_dir(home.join("dir")).unwrap();
    sandbox.write_profile(&[], &[]);

    let removed = sweep(&sandbox.load_profile(), sandbox.fs(), sandbox.log()).unwrap();
    assert_eq!(removed, 1);
    assert!(home.join("dead").symlink_metadata().is_err());
    assert!(home.join("good").symlink_metadata().is_ok());
    assert!(home.join("plain").is_file());
    assert!(home.join("dir").is_dir());
}

#[test]
fn link_to_dangling_link_is_kept() {
    // the target itself exists (as a dangling link), so the entry stays
    let sandbox = Sandbox::new();
    let home = sandbox.home();
    let middle = sandbox.root.path().join("middle");
    symlink(sandbox.root.path().join("gone"), &middle).unwrap();
    symlink(&middle, home.join("chain")).unwrap();

    let cleaner = Cleaner::new(sandbox.fs(), sandbox.log());
    assert_eq!(cleaner.clean_dead_symlinks(&home).unwrap(), 0);
    assert!(home.join("chain").symlink_metadata().is_ok());
}

#[test]
fn relative_link_target_is_resolved_from_link_directory() {
    let sandbox = Sandbox::new();
    let home = sandbox.home();
    sandbox.write(&home, "real", "r");
    symlink("real", home.join("rel-good")).unwrap();
    symlink("missing", home.join("rel-dead")).unwrap();

    let cleaner = Cleaner::new(sandbox.fs(), sandbox.log());
    assert_eq!(cleaner.clean_dead_symlinks(&home).unwrap(), 1);
    assert!(home.join("rel-good").symlink_metadata().is_ok());
}

#[test]
fn sweeping_a_file_is_an_error() {
    let sandbox = Sandbox::new();
    let file = sandbox.write(&sandbox.home(), "plain", "p");

    let cleaner = Cleaner::new(sandbox.fs(), sandbox.log());
    let err = cleaner.clean_dead_symlinks(&file).unwrap_err();
    assert!(matches!(err, LinkError::NotADirectory { .. }));
}
