//! Retention engine.
//!
//! Two tiers run on every invocation, weekly first:
//! - the weekly tier thins the month two months back to one dump per ISO week;
//! - the monthly tier reduces the month three months back to a single dump,
//!   but only once that month has been through the weekly tier.
//!
//! Each tier writes a marker when it finishes so it runs at most once per
//! month. Any I/O failure aborts the pass before the marker is written, which
//! leaves the tier to be retried on the next run.

pub mod backup_file;
pub mod marker;

use crate::utils::errors::Result;
use backup_file::{scan_bucket, BackupFile};
use chrono::NaiveDate;
use marker::{MonthBucket, RetentionMarker, Tier};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// How many months back the weekly tier looks
pub const WEEKLY_MONTHS_BACK: u32 = 2;

/// How many months back the monthly tier looks
pub const MONTHLY_MONTHS_BACK: u32 = 3;

/// Result of one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOutcome {
    /// The tier ran and wrote its marker
    Cleaned { kept: usize, deleted: usize },
    /// The marker was already present
    AlreadyDone,
    /// Monthly tier only: the bucket has not been through the weekly tier
    NothingToClean,
}

/// Outcome of a full cleanup pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub weekly: TierOutcome,
    pub monthly: TierOutcome,
}

/// Run both tiers against `dir` relative to `today`.
pub fn run_cleanup(dir: &Path, today: NaiveDate) -> Result<CleanupReport> {
    let weekly = clean_weekly(dir, MonthBucket::months_before(today, WEEKLY_MONTHS_BACK))?;
    let monthly = clean_monthly(dir, MonthBucket::months_before(today, MONTHLY_MONTHS_BACK))?;

    Ok(CleanupReport { weekly, monthly })
}

/// Keep one dump per ISO week in `bucket`.
///
/// Within a week the dump with the greatest [`BackupFile::numeric_value`]
/// survives. Equal values go to the lexicographically later file name.
pub fn clean_weekly(dir: &Path, bucket: MonthBucket) -> Result<TierOutcome> {
    let marker = RetentionMarker::new(bucket, Tier::Weekly);
    if marker.exists(dir) {
        info!(bucket = %bucket, "weekly cleaning already done");
        return Ok(TierOutcome::AlreadyDone);
    }

    let mut survivors: BTreeMap<u32, BackupFile> = BTreeMap::new();
    let mut deleted = 0;

    for file in scan_bucket(dir, bucket)? {
        match survivors.entry(file.iso_week()) {
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
            Entry::Occupied(mut slot) => {
                let loser = if supersedes(&file, slot.get()) {
                    slot.insert(file)
                } else {
                    file
                };
                delete(&loser, Tier::Weekly)?;
                deleted += 1;
            }
        }
    }

    marker.write(dir)?;

    let kept = survivors.len();
    info!(bucket = %bucket, kept, deleted, "weekly cleaning done");
    Ok(TierOutcome::Cleaned { kept, deleted })
}

/// Keep only the dump with the greatest file name in `bucket`.
///
/// Does nothing until the weekly tier has run for the same bucket.
pub fn clean_monthly(dir: &Path, bucket: MonthBucket) -> Result<TierOutcome> {
    let marker = RetentionMarker::new(bucket, Tier::Monthly);
    if marker.exists(dir) {
        info!(bucket = %bucket, "monthly cleaning already done");
        return Ok(TierOutcome::AlreadyDone);
    }

    if !RetentionMarker::new(bucket, Tier::Weekly).exists(dir) {
        info!(bucket = %bucket, "nothing to clean");
        return Ok(TierOutcome::NothingToClean);
    }

    // Sorted by name, so the survivor is the last entry
    let mut files = scan_bucket(dir, bucket)?;
    let survivor = files.pop();

    for file in &files {
        delete(file, Tier::Monthly)?;
    }

    marker.write(dir)?;

    let kept = usize::from(survivor.is_some());
    let deleted = files.len();
    info!(
        bucket = %bucket,
        survivor = survivor.as_ref().map(|f| f.name.as_str()).unwrap_or("-"),
        deleted,
        "monthly cleaning done"
    );
    Ok(TierOutcome::Cleaned { kept, deleted })
}

/// Whether `challenger` should replace `current` as the week's survivor
fn supersedes(challenger: &BackupFile, current: &BackupFile) -> bool {
    let (a, b) = (challenger.numeric_value(), current.numeric_value());
    a > b || (a == b && challenger.name > current.name)
}

fn delete(file: &BackupFile, tier: Tier) -> Result<()> {
    std::fs::remove_file(&file.path)?;
    debug!(file = %file.name, tier = %tier, "deleted backup");
    Ok(())
}
