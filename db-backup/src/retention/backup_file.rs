//! Backup files on disk.
//!
//! Dumps are named `YYYY-MM-DD_NN.sql`. The name is the only source of the
//! creation date; file metadata is never consulted.

use super::marker::MonthBucket;
use crate::utils::errors::Result;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const EXTENSION: &str = ".sql";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One persisted dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    /// Day the dump was taken, from the filename prefix
    pub created_at: NaiveDate,

    /// Per-day ordinal suffix
    pub sequence: u32,

    /// Full path in the backup directory
    pub path: PathBuf,

    /// File name only
    pub name: String,
}

impl BackupFile {
    /// Recognize a backup file by name. Returns None for anything else
    /// (markers, foreign files, malformed dates).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(EXTENSION)?;
        let (date_part, sequence_part) = stem.split_once('_')?;

        if sequence_part.is_empty() || !sequence_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let created_at = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
        // Reject loose forms such as `2024-6-1`
        if created_at.format(DATE_FORMAT).to_string() != date_part {
            return None;
        }

        Some(Self {
            created_at,
            sequence: sequence_part.parse().ok()?,
            path: path.to_path_buf(),
            name: name.to_string(),
        })
    }

    /// ISO 8601 week number of the creation date
    pub fn iso_week(&self) -> u32 {
        self.created_at.iso_week().week()
    }

    pub fn month_bucket(&self) -> MonthBucket {
        MonthBucket::of(self.created_at)
    }

    /// Numeric value of the file name: every non-alphanumeric character is
    /// dropped and the leading run of digits is read as an integer, so
    /// `2024-06-01_02.sql` yields `2024060102`.
    pub fn numeric_value(&self) -> u128 {
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take_while(|c| c.is_ascii_digit())
            .fold(0u128, |acc, c| {
                acc.saturating_mul(10)
                    .saturating_add(u128::from(c as u8 - b'0'))
            })
    }
}

/// List the backup files directly inside `dir`, ordered by file name.
///
/// A missing or unreadable directory is an error.
pub fn scan(dir: &Path) -> Result<Vec<BackupFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(file) = BackupFile::from_path(entry.path()) {
            files.push(file);
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Backup files whose date falls in `bucket`, ordered by file name
pub fn scan_bucket(dir: &Path, bucket: MonthBucket) -> Result<Vec<BackupFile>> {
    Ok(scan(dir)?
        .into_iter()
        .filter(|f| bucket.contains(f.created_at))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file(name: &str) -> BackupFile {
        BackupFile::from_path(&Path::new("/backups").join(name)).unwrap()
    }

    #[test]
    fn test_parse_backup_file_name() {
        let f = file("2024-06-01_03.sql");

        assert_eq!(f.created_at, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(f.sequence, 3);
        assert_eq!(f.name, "2024-06-01_03.sql");
        assert_eq!(f.path, PathBuf::from("/backups/2024-06-01_03.sql"));
        assert_eq!(f.month_bucket().to_string(), "2024-06");
    }

    #[test]
    fn test_rejects_foreign_names() {
        for name in [
            "2024-06.saved.weekly",
            "2024-06-01_01.sql.gz",
            "2024-06-01.sql",
            "2024-06-01_.sql",
            "2024-06-01_ab.sql",
            "2024-6-1_01.sql",
            "2024-02-30_01.sql",
            "notes.txt",
        ] {
            assert!(
                BackupFile::from_path(Path::new(name)).is_none(),
                "{} should not be a backup file",
                name
            );
        }
    }

    #[test]
    fn test_multi_digit_sequence() {
        assert_eq!(file("2024-06-01_10.sql").sequence, 10);
        assert_eq!(file("2024-06-01_123.sql").sequence, 123);
    }

    #[test]
    fn test_iso_week() {
        assert_eq!(file("2024-06-03_01.sql").iso_week(), 23);
        assert_eq!(file("2024-06-09_01.sql").iso_week(), 23);
        assert_eq!(file("2024-06-10_01.sql").iso_week(), 24);
        // Belongs to the last ISO week of 2020
        assert_eq!(file("2021-01-01_01.sql").iso_week(), 53);
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(file("2024-06-01_01.sql").numeric_value(), 2024060101);
        assert_eq!(file("2024-06-01_02.sql").numeric_value(), 2024060102);
        assert!(file("2024-06-01_10.sql").numeric_value() > file("2024-06-01_09.sql").numeric_value());
    }

    #[test]
    fn test_scan_filters_and_sorts() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();

        fs::write(dir.join("2024-06-02_01.sql"), b"b")?;
        fs::write(dir.join("2024-06-01_01.sql"), b"a")?;
        fs::write(dir.join("2024-05-31_01.sql"), b"c")?;
        fs::write(dir.join("2024-06.saved.weekly"), b"saved")?;
        fs::write(dir.join("README"), b"x")?;
        fs::create_dir(dir.join("2024-06-03_01.sql"))?;

        let names: Vec<_> = scan(dir)?.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["2024-05-31_01.sql", "2024-06-01_01.sql", "2024-06-02_01.sql"]);

        let june: Vec<_> = scan_bucket(dir, MonthBucket { year: 2024, month: 6 })?
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(june, vec!["2024-06-01_01.sql", "2024-06-02_01.sql"]);

        Ok(())
    }

    #[test]
    fn test_scan_missing_directory_fails() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(scan(&temp_dir.path().join("missing")).is_err());
        Ok(())
    }
}
