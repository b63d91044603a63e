//! Line-oriented chat protocol.
//!
//! Inbound lines have the shape `<sender>: <command>[ <arguments>]`;
//! outbound lines are free-form text. Both directions are newline-delimited
//! UTF-8.
//!
//! - `codec`: stream framing with a per-line size limit.
//! - `parser`: turns one inbound line into a [`Task`](crate::models::task::Task).

pub mod codec;
pub mod parser;
