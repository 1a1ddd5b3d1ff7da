//! thira - one-way sync of Jira tickets into Things 3
//!
//! This crate provides the core functionality for the `thira` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Ticket, TaskRequest)
//! - [`source`] - Ticket sources (Jira REST API)
//! - [`sink`] - Task sinks (Things URL scheme)
//! - [`sync`] - Sync ledger, reconciler and status reporting
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod sink;
pub mod source;
pub mod sync;

pub use error::{Error, Result};
