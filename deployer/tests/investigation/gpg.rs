//! Round trips through a real GnuPG install in symmetric mode.
//!
//! # Prerequisites
//!
//! - `gpg` (GnuPG 2.1 or newer) on `PATH`
//!
//! Each test uses a private `--homedir` so the user's keyring is never touched.

use std::fs;
use std::path::Path;
use std::process::Command;

use deployer::core::gpg::ToolOptions;
use deployer::io::runner::SystemRunner;
use deployer::security::{Passphrase, TransformError, TransformPipeline, TransformRequest};

fn pipeline(home: &Path) -> TransformPipeline<SystemRunner> {
    fs::create_dir_all(home).expect("create gnupg home");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(home, fs::Permissions::from_mode(0o700)).expect("chmod home");
    }
    TransformPipeline::new(SystemRunner::default()).with_tool_options(ToolOptions {
        pinentry_loopback: true,
        homedir: Some(home.to_path_buf()),
    })
}

fn request(dir: &Path, src: &str, dst: &str, passphrase: &str) -> TransformRequest {
    TransformRequest::new(dir.join(src), dir.join(dst)).with_passphrase(Passphrase::new(passphrase))
}

/// Verifies that gpg is available in PATH.
#[test]
#[ignore]
fn gpg_available() {
    let output = Command::new("gpg")
        .arg("--version")
        .output()
        .expect("gpg not in PATH");
    assert!(output.status.success());
}

#[test]
#[ignore]
fn encrypt_then_decrypt_restores_content() {
    let temp = tempfile::tempdir().expect("tempdir");
    let pipeline = pipeline(&temp.path().join("gnupg"));
    fs::write(temp.path().join("notes.txt"), "top secret\n").expect("write");

    pipeline
        .encrypt(&request(temp.path(), "notes.txt", "notes.gpg", "secret123"))
        .expect("encrypt");
    pipeline
        .decrypt(&request(temp.path(), "notes.gpg", "notes_out.txt", "secret123"))
        .expect("decrypt");

    assert_eq!(
        fs::read(temp.path().join("notes_out.txt")).expect("read"),
        b"top secret\n"
    );
}

#[test]
#[ignore]
fn wrong_passphrase_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let pipeline = pipeline(&temp.path().join("gnupg"));
    fs::write(temp.path().join("notes.txt"), "top secret\n").expect("write");

    pipeline
        .encrypt(&request(temp.path(), "notes.txt", "notes.gpg", "right"))
        .expect("encrypt");
    let err = pipeline
        .decrypt(&request(temp.path(), "notes.gpg", "out.txt", "wrong"))
        .expect_err("wrong passphrase");
    assert!(matches!(err, TransformError::Process { .. }), "{err:?}");
}
