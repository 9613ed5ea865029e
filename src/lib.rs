// ABOUTME: Library root for data-deploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod fanout;
pub mod output;
pub mod plugin;
pub mod remote;
pub mod reservation;
pub mod ssh;
pub mod types;
