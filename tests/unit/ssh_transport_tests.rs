//! Unit tests for the OpenSSH transport's argument assembly and setup errors.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;

use chat_agent::config::{ConnectionConfig, GlobalConfig};
use chat_agent::transport::ssh::SshConnector;
use chat_agent::transport::Connector;
use chat_agent::AppError;

fn ssh_config(dir: &Path, ssh_program: &str) -> ConnectionConfig {
    let raw = format!(
        r#"
[connection]
host = "chat.example"
port = 8022
user = "example1"
key = '{key}'
known_hosts = '{known}'
ssh_program = '{ssh_program}'
connect_timeout_seconds = 7
"#,
        key = dir.join("ex1").display(),
        known = dir.join("known").display(),
    );
    GlobalConfig::from_toml_str(&raw)
        .expect("valid ssh config")
        .connection
}

fn write_key_material(dir: &Path) {
    fs::write(dir.join("ex1"), "not a real key").expect("write key");
    fs::write(dir.join("known"), "").expect("write known_hosts");
}

fn position(args: &[OsString], needle: &str) -> usize {
    args.iter()
        .position(|arg| arg == needle)
        .unwrap_or_else(|| panic!("{needle} missing from {args:?}"))
}

#[test]
fn args_pin_host_keys_and_identity() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_key_material(dir.path());
    let connector = SshConnector::new(ssh_config(dir.path(), "ssh"));

    let args = connector.build_args().expect("args");

    assert_eq!(args[0], "-T", "no PTY must be requested");
    for opt in [
        "BatchMode=yes",
        "StrictHostKeyChecking=yes",
        "IdentitiesOnly=yes",
        "ConnectTimeout=7",
    ] {
        let idx = position(&args, opt);
        assert_eq!(args[idx - 1], "-o", "{opt} must be passed with -o");
    }

    let mut known_hosts_opt = OsString::from("UserKnownHostsFile=");
    known_hosts_opt.push(dir.path().join("known"));
    assert!(args.contains(&known_hosts_opt), "args: {args:?}");

    let key_idx = position(&args, "-i");
    assert_eq!(args[key_idx + 1], dir.path().join("ex1").into_os_string());

    let port_idx = position(&args, "-p");
    assert_eq!(args[port_idx + 1], "8022");

    let user_idx = position(&args, "-l");
    assert_eq!(args[user_idx + 1], "example1");

    assert_eq!(
        args.last().map(OsString::as_os_str),
        Some(OsStr::new("chat.example"))
    );
}

#[test]
fn missing_key_file_is_connect_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("known"), "").expect("write known_hosts");
    let connector = SshConnector::new(ssh_config(dir.path(), "ssh"));

    match connector.build_args() {
        Err(AppError::Connect(msg)) => assert!(msg.contains("private key not found"), "{msg}"),
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[test]
fn missing_known_hosts_is_connect_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("ex1"), "key").expect("write key");
    let connector = SshConnector::new(ssh_config(dir.path(), "ssh"));

    match connector.build_args() {
        Err(AppError::Connect(msg)) => {
            assert!(msg.contains("known_hosts file not found"), "{msg}");
        }
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[tokio::test]
async fn unspawnable_client_is_connect_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_key_material(dir.path());
    let program = dir.path().join("no-such-ssh");
    let connector = SshConnector::new(ssh_config(
        dir.path(),
        program.to_str().expect("utf8 path"),
    ));

    match connector.connect().await {
        Err(AppError::Connect(msg)) => assert!(msg.contains("failed to spawn"), "{msg}"),
        Err(other) => panic!("expected connect error, got {other:?}"),
        Ok(_) => panic!("spawning a missing binary must fail"),
    }
}
