//! Month buckets and the marker files that record completed cleanup tiers.
//!
//! A marker is a file named `YYYY-MM.saved.<tier>` in the backup directory.
//! Only its existence matters. Markers are never updated or removed.

use crate::utils::errors::Result;
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};

const MARKER_CONTENT: &str = "saved";

/// Year-month identifier grouping backup files and markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The bucket `months` calendar months before the month containing `today`
    pub fn months_before(today: NaiveDate, months: u32) -> Self {
        // The first of the month always exists, so no day clamping can shift the month.
        let first = today.with_day(1).unwrap_or(today);
        let target = first
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self::of(target)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Retention tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Weekly,
    Monthly,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentinel recording that `tier` already ran for `bucket`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionMarker {
    pub bucket: MonthBucket,
    pub tier: Tier,
}

impl RetentionMarker {
    pub fn new(bucket: MonthBucket, tier: Tier) -> Self {
        Self { bucket, tier }
    }

    pub fn file_name(&self) -> String {
        format!("{}.saved.{}", self.bucket, self.tier)
    }

    pub fn path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn exists(&self, dir: &Path) -> bool {
        self.path(dir).is_file()
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::write(self.path(dir), MARKER_CONTENT)?;
        Ok(())
    }
}
