#![forbid(unsafe_code)]

//! Remote command agent.
//!
//! Holds one line-oriented stream open to a chat server, turns lines of the
//! form `<sender>: <command> <arguments>` into [`Task`](models::task::Task)s,
//! dispatches them to registered handlers, and writes handler replies back
//! over the same stream.

pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod protocol;
pub mod transport;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
