//! Database backup tool
//!
//! Dumps one configured database connection into a dated, sequence-numbered
//! file, then prunes older dumps: every dump is kept for the current and the
//! previous month, one per ISO week for the month before that, and a single
//! dump per month from then on.

pub mod config;
pub mod connection;
pub mod dump;
pub mod job;
pub mod retention;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{Config, RunConfig};
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
