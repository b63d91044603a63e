//! Global configuration parsing, validation, and path resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Transport used to reach the chat server.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// OpenSSH client subprocess with key authentication.
    #[default]
    Ssh,
    /// Plain TCP stream, for local servers and tests.
    Tcp,
}

/// Connection settings for the single agent stream.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionConfig {
    /// Transport selection.
    #[serde(default)]
    pub transport: TransportKind,
    /// Server host name or address.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Remote user name (required for ssh).
    #[serde(default)]
    pub user: Option<String>,
    /// Private key file (required for ssh).
    #[serde(default)]
    pub key: Option<PathBuf>,
    /// Pinned `known_hosts` file (required for ssh).
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    /// OpenSSH client binary.
    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,
    /// Upper bound on establishing the connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Time the ssh client is given to exit on its own during teardown.
    #[serde(default = "default_close_grace")]
    pub close_grace_seconds: u64,
}

impl ConnectionConfig {
    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Teardown grace period as a [`Duration`].
    #[must_use]
    pub fn close_grace(&self) -> Duration {
        Duration::from_secs(self.close_grace_seconds)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.key, &mut self.known_hosts].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::Config("connection.host must not be empty".into()));
        }

        if self.port == 0 {
            return Err(AppError::Config(
                "connection.port must be greater than zero".into(),
            ));
        }

        if self.connect_timeout_seconds == 0 {
            return Err(AppError::Config(
                "connection.connect_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.transport == TransportKind::Ssh {
            let has_user = self
                .user
                .as_deref()
                .is_some_and(|user| !user.trim().is_empty());
            if !has_user {
                return Err(AppError::Config(
                    "connection.user is required for the ssh transport".into(),
                ));
            }
            if self.key.is_none() {
                return Err(AppError::Config(
                    "connection.key is required for the ssh transport".into(),
                ));
            }
            if self.known_hosts.is_none() {
                return Err(AppError::Config(
                    "connection.known_hosts is required for the ssh transport".into(),
                ));
            }
            if self.ssh_program.trim().is_empty() {
                return Err(AppError::Config(
                    "connection.ssh_program must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Tunables for the reader/dispatcher/writer pipeline.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Inbound lines longer than this are discarded.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

fn default_port() -> u16 {
    22
}

fn default_ssh_program() -> String {
    "ssh".into()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_close_grace() -> u64 {
    2
}

fn default_max_line_bytes() -> usize {
    65_536
}

fn default_agent_version() -> String {
    "unknown".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Version string reported by the `hi` command.
    #[serde(default = "default_agent_version")]
    pub agent_version: String,
    /// Stream connection settings.
    pub connection: ConnectionConfig,
    /// Pipeline tunables.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// Relative `key` and `known_hosts` paths are resolved against the
    /// directory containing the config file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        let mut config: Self = toml::from_str(&raw)?;
        if let Some(base) = path.parent() {
            config.connection.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.connection.validate()?;

        if self.pipeline.max_line_bytes == 0 {
            return Err(AppError::Config(
                "pipeline.max_line_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
