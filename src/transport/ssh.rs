//! SSH transport backed by the OpenSSH client.
//!
//! Spawns `ssh` with:
//! - `BatchMode=yes` so authentication never prompts; only the configured
//!   private key is offered (`IdentitiesOnly=yes`).
//! - `StrictHostKeyChecking=yes` against the configured `known_hosts` file
//!   only; unknown or mismatched host keys abort the connection.
//! - `-T` (no PTY) and no remote command, so the server's session stream is
//!   wired straight to the child's stdin/stdout.
//! - `env_clear()` plus a small allowlist, and `kill_on_drop(true)`.
//!
//! Authentication and host-key failures happen after the spawn: `ssh` exits,
//! its stdout reaches EOF, and the pipeline treats that like any closed
//! stream. The client's stderr is forwarded to the log.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::transport::{BoxFuture, Connection, ConnectionHandle, Connector};
use crate::{AppError, Result};

/// Environment variables inherited by the ssh client.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LOGNAME",
    "LANG",
    "RUST_LOG",
    // Windows-specific variables.
    "USERPROFILE",
    "SystemRoot",
    "TEMP",
    "TMP",
    "USERNAME",
];

/// Opens the agent stream through an `ssh` subprocess.
#[derive(Debug, Clone)]
pub struct SshConnector {
    config: ConnectionConfig,
}

impl SshConnector {
    /// Create a connector for `config`.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments passed to the ssh client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connect` if the user, key, or `known_hosts` file is
    /// missing.
    pub fn build_args(&self) -> Result<Vec<OsString>> {
        let config = &self.config;
        let user = config
            .user
            .as_deref()
            .ok_or_else(|| AppError::Connect("ssh transport requires a user".into()))?;
        let key = existing_file(config.key.as_deref(), "private key")?;
        let known_hosts = existing_file(config.known_hosts.as_deref(), "known_hosts file")?;

        let mut known_hosts_opt = OsString::from("UserKnownHostsFile=");
        known_hosts_opt.push(known_hosts);

        let mut args: Vec<OsString> = vec!["-T".into()];
        for opt in [
            "BatchMode=yes",
            "StrictHostKeyChecking=yes",
            "IdentitiesOnly=yes",
            "GlobalKnownHostsFile=/dev/null",
        ] {
            args.push("-o".into());
            args.push(opt.into());
        }
        args.push("-o".into());
        args.push(known_hosts_opt);
        args.push("-o".into());
        args.push(format!("ConnectTimeout={}", config.connect_timeout_seconds).into());
        args.push("-i".into());
        args.push(key.into());
        args.push("-p".into());
        args.push(config.port.to_string().into());
        args.push("-l".into());
        args.push(user.into());
        args.push(config.host.clone().into());
        Ok(args)
    }

    async fn spawn(&self) -> Result<Connection> {
        let args = self.build_args()?;

        let mut cmd = Command::new(&self.config.ssh_program);
        cmd.args(&args);

        cmd.env_clear();
        for &key in ALLOWED_ENV_VARS {
            if let Ok(val) = std::env::var(key) {
                cmd.env(key, val);
            }
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|err| {
            AppError::Connect(format!(
                "failed to spawn {}: {err}",
                self.config.ssh_program
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Connect("failed to capture ssh stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Connect("failed to capture ssh stdout".into()))?;
        let stderr_task = child.stderr.take().map(forward_stderr);

        info!(
            host = %self.config.host,
            port = self.config.port,
            pid = child.id(),
            "ssh client started"
        );

        Ok(Connection::new(
            stdout,
            stdin,
            SshHandle {
                child,
                stderr_task,
                grace: self.config.close_grace(),
            },
        ))
    }
}

impl Connector for SshConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Connection>> {
        Box::pin(self.spawn())
    }
}

/// Owns the ssh child process for the lifetime of the connection.
#[derive(Debug)]
struct SshHandle {
    child: Child,
    stderr_task: Option<JoinHandle<()>>,
    grace: Duration,
}

impl ConnectionHandle for SshHandle {
    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            let Self {
                mut child,
                stderr_task,
                grace,
            } = *self;

            match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => info!(%status, "ssh client exited"),
                Ok(Err(err)) => {
                    return Err(AppError::Io(format!("failed to wait for ssh client: {err}")));
                }
                Err(_elapsed) => {
                    warn!(?grace, "ssh client still running, killing it");
                    child
                        .kill()
                        .await
                        .map_err(|err| AppError::Io(format!("failed to kill ssh client: {err}")))?;
                }
            }

            // stderr reaches EOF once the child is gone.
            if let Some(task) = stderr_task {
                if tokio::time::timeout(grace, task).await.is_err() {
                    debug!("ssh stderr forwarder did not finish");
                }
            }

            Ok(())
        })
    }
}

fn existing_file<'a>(path: Option<&'a Path>, what: &str) -> Result<&'a Path> {
    let path = path.ok_or_else(|| AppError::Connect(format!("ssh transport requires a {what}")))?;
    if !path.is_file() {
        return Err(AppError::Connect(format!(
            "{what} not found: {}",
            path.display()
        )));
    }
    Ok(path)
}

fn forward_stderr(stderr: ChildStderr) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => warn!(stderr = %line.trim_end(), "ssh client"),
                Ok(None) => break,
                Err(err) => {
                    debug!(%err, "ssh stderr forwarder stopped");
                    break;
                }
            }
        }
    })
}
