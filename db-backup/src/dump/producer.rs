//! Snapshot producer.
//!
//! Picks the next free `YYYY-MM-DD_NN.sql` name for today and runs the dump
//! command that writes it.

use crate::retention::backup_file::EXTENSION;
use crate::utils::errors::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{info, warn};
use walkdir::WalkDir;

/// File name for the `sequence`-th dump of `date`.
///
/// Sequences below 10 are zero-padded to two digits; larger ones are
/// written as-is (`_10`, `_100`).
pub fn snapshot_file_name(date: NaiveDate, sequence: usize) -> String {
    format!("{}_{:02}{}", date.format("%Y-%m-%d"), sequence, EXTENSION)
}

/// Path for the next dump of `today` in `dir`.
///
/// The sequence is one more than the number of entries already named after
/// today's date. Only reads the directory.
pub fn next_snapshot_path(dir: &Path, today: NaiveDate) -> Result<PathBuf> {
    let prefix = format!("{}_", today.format("%Y-%m-%d"));

    let mut existing = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            existing += 1;
        }
    }

    Ok(dir.join(snapshot_file_name(today, existing + 1)))
}

/// Run a dump command through `sh -c`, blocking until it exits.
///
/// Failing to spawn the shell is an error; the command's own exit status is
/// only reported.
pub fn run_dump(command: &str) -> Result<ExitStatus> {
    let status = Command::new("sh").arg("-c").arg(command).status()?;

    if status.success() {
        info!("dump command finished");
    } else {
        warn!(%status, "dump command exited unsuccessfully");
    }

    Ok(status)
}
