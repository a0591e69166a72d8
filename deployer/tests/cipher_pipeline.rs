//! End-to-end encrypt/decrypt through `SystemRunner` and the CLI, using a
//! shell script that mimics the gpg flags the pipeline relies on.
//!
//! The fake tool reads the passphrase from stdin, prefixes ciphertext with it
//! on `--symmetric`, and refuses `--decrypt` when the passphrase differs.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use deployer::exit_codes;
use deployer::io::runner::SystemRunner;
use deployer::security::{Passphrase, TransformError, TransformPipeline, TransformRequest};

const FAKE_GPG: &str = r#"#!/bin/sh
read -r pass
out=""
src=""
mode=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift 2 ;;
    --symmetric) mode=enc; shift ;;
    --decrypt) mode=dec; shift ;;
    --cipher-algo|--digest-algo|--passphrase-fd|--pinentry-mode|--homedir) shift 2 ;;
    --quiet|--yes|--batch) shift ;;
    *) src="$1"; shift ;;
  esac
done
[ -r "$src" ] || { echo "gpg: can't open '$src'" >&2; exit 2; }
if [ "$mode" = enc ]; then
  { printf 'FAKEGPG:%s\n' "$pass"; cat "$src"; } > "$out"
  exit 0
fi
if [ "$(head -n 1 "$src")" != "FAKEGPG:$pass" ]; then
  echo "gpg: decryption failed: Bad session key" >&2
  exit 2
fi
tail -n +2 "$src" > "$out"
"#;

fn install_fake_gpg(dir: &Path) -> PathBuf {
    let path = dir.join("fake-gpg");
    fs::write(&path, FAKE_GPG).expect("write fake gpg");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake gpg");
    path
}

fn pipeline(fake: &Path) -> TransformPipeline<SystemRunner> {
    TransformPipeline::new(SystemRunner::default()).with_program(fake.to_string_lossy())
}

fn request(dir: &Path, src: &str, dst: &str, passphrase: &str) -> TransformRequest {
    TransformRequest::new(dir.join(src), dir.join(dst)).with_passphrase(Passphrase::new(passphrase))
}

#[test]
fn encrypt_then_decrypt_restores_content() {
    let temp = tempfile::tempdir().expect("tempdir");
    let fake = install_fake_gpg(temp.path());
    fs::write(temp.path().join("notes.txt"), "line one\nline two\n").expect("write");

    let pipeline = pipeline(&fake);
    pipeline
        .encrypt(&request(temp.path(), "notes.txt", "notes.gpg", "secret123"))
        .expect("encrypt");
    assert_ne!(
        fs::read(temp.path().join("notes.gpg")).expect("read"),
        fs::read(temp.path().join("notes.txt")).expect("read")
    );
    pipeline
        .decrypt(&request(temp.path(), "notes.gpg", "notes_out.txt", "secret123"))
        .expect("decrypt");
    assert_eq!(
        fs::read(temp.path().join("notes_out.txt")).expect("read"),
        fs::read(temp.path().join("notes.txt")).expect("read")
    );
}

#[test]
fn wrong_passphrase_is_a_process_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let fake = install_fake_gpg(temp.path());
    fs::write(temp.path().join("notes.txt"), "secret notes").expect("write");

    let pipeline = pipeline(&fake);
    pipeline
        .encrypt(&request(temp.path(), "notes.txt", "notes.gpg", "right"))
        .expect("encrypt");
    let err = pipeline
        .decrypt(&request(temp.path(), "notes.gpg", "out.txt", "wrong"))
        .expect_err("wrong passphrase");
    match err {
        TransformError::Process { code, output, .. } => {
            assert_eq!(code, Some(2));
            assert!(output.contains("Bad session key"), "{output}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn second_encrypt_overwrites_destination() {
    let temp = tempfile::tempdir().expect("tempdir");
    let fake = install_fake_gpg(temp.path());
    let pipeline = pipeline(&fake);

    fs::write(temp.path().join("a.txt"), "a much longer first payload").expect("write");
    fs::write(temp.path().join("b.txt"), "short").expect("write");
    pipeline
        .encrypt(&request(temp.path(), "a.txt", "out.gpg", "p"))
        .expect("encrypt a");
    pipeline
        .encrypt(&request(temp.path(), "b.txt", "out.gpg", "p"))
        .expect("encrypt b");
    assert_eq!(
        fs::read_to_string(temp.path().join("out.gpg")).expect("read"),
        "FAKEGPG:p\nshort"
    );
}

#[test]
fn missing_tool_is_a_spawn_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("notes.txt"), "x").expect("write");
    let pipeline = pipeline(&temp.path().join("no-such-gpg"));
    let err = pipeline
        .encrypt(&request(temp.path(), "notes.txt", "notes.gpg", "p"))
        .expect_err("missing tool");
    assert!(matches!(err, TransformError::Spawn { .. }), "{err:?}");
}

fn deployer(dir: &Path, args: &[&str], passphrase: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_deployer"))
        .current_dir(dir)
        .env("DEPLOYER_PASSPHRASE", passphrase)
        .args(args)
        .output()
        .expect("run deployer")
}

#[test]
fn cli_round_trip_and_exit_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let fake = install_fake_gpg(temp.path());
    fs::write(
        temp.path().join("deployer.toml"),
        format!("[gpg]\nprogram = \"{}\"\n", fake.display()),
    )
    .expect("write config");
    fs::write(temp.path().join("notes.txt"), "dotfiles secret\n").expect("write");

    let out = deployer(temp.path(), &["encrypt", "notes.txt", "notes.gpg"], "secret123");
    assert_eq!(out.status.code(), Some(exit_codes::OK), "{out:?}");
    let out = deployer(
        temp.path(),
        &["decrypt", "notes.gpg", "notes_out.txt"],
        "secret123",
    );
    assert_eq!(out.status.code(), Some(exit_codes::OK), "{out:?}");
    assert_eq!(
        fs::read_to_string(temp.path().join("notes_out.txt")).expect("read"),
        "dotfiles secret\n"
    );

    let out = deployer(temp.path(), &["decrypt", "notes.gpg", "bad.txt"], "nope");
    assert_eq!(out.status.code(), Some(exit_codes::TOOL_FAILED));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Bad session key"));

    let out = deployer(temp.path(), &["encrypt", "missing.txt", "x.gpg"], "secret123");
    assert_eq!(out.status.code(), Some(exit_codes::FAILED));
    assert!(!temp.path().join("x.gpg").exists());
}

#[test]
fn cli_encode_decode_round_trip() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("notes.txt"), "hello").expect("write");

    let out = deployer(temp.path(), &["encode", "notes.txt", "notes.b64"], "");
    assert!(out.status.success(), "{out:?}");
    assert_eq!(
        fs::read_to_string(temp.path().join("notes.b64")).expect("read"),
        "aGVsbG8="
    );
    let out = deployer(temp.path(), &["decode", "notes.b64", "notes.out"], "");
    assert!(out.status.success(), "{out:?}");
    assert_eq!(
        fs::read_to_string(temp.path().join("notes.out")).expect("read"),
        "hello"
    );

    fs::write(temp.path().join("bad.b64"), "***").expect("write");
    let out = deployer(temp.path(), &["decode", "bad.b64", "bad.out"], "");
    assert_eq!(out.status.code(), Some(exit_codes::FAILED));
}
