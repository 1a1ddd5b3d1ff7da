//! Command implementations.

pub mod completions;
pub mod init;
pub mod remove;
pub mod reset;
pub mod status;
pub mod sync;
pub mod version;
