//! One backup run: dump first, then the retention pass.

use crate::config::RunConfig;
use crate::dump::{self, producer};
use crate::retention::{self, CleanupReport};
use crate::utils::errors::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

/// Options for a single run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the dump and only apply retention
    pub skip_dump: bool,
}

/// What a run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Path handed to the dump command, if one ran
    pub snapshot: Option<PathBuf>,
    pub cleanup: CleanupReport,
}

/// Produce today's dump and prune older ones.
///
/// The dump command is built before anything runs, so an unsupported driver
/// or missing connection parameter aborts the run without touching the
/// backup directory.
pub fn run(config: &RunConfig, today: NaiveDate, options: RunOptions) -> Result<RunReport> {
    let snapshot = if options.skip_dump {
        info!("dump skipped");
        None
    } else {
        let path = producer::next_snapshot_path(&config.backup_dir, today)?;
        let command = dump::build_dump_command(
            &config.connection,
            config.executable_prefix.as_deref(),
            &path,
        )?;

        info!(file = %path.display(), driver = %config.connection.driver, "starting backup");
        producer::run_dump(&command)?;
        info!(file = %path.display(), "backup done");

        Some(path)
    };

    let cleanup = retention::run_cleanup(&config.backup_dir, today)?;

    Ok(RunReport { snapshot, cleanup })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionParams;
    use crate::retention::marker::{MonthBucket, RetentionMarker, Tier};
    use crate::retention::TierOutcome;
    use crate::utils::errors::BackupError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Stand in for `mysqldump` with `echo`, so the dump contains the arguments
    #[cfg(unix)]
    fn fake_tool(bin_dir: &Path) -> std::io::Result<()> {
        std::os::unix::fs::symlink("/bin/echo", bin_dir.join("mysqldump"))
    }

    fn run_config(backup_dir: &Path, bin_dir: &Path, driver: &str) -> RunConfig {
        RunConfig {
            backup_dir: backup_dir.to_path_buf(),
            executable_prefix: Some(bin_dir.to_path_buf()),
            connection: ConnectionParams {
                driver: driver.to_string(),
                host: Some("localhost".to_string()),
                port: None,
                user: Some("backup".to_string()),
                password: None,
                dbname: Some("shop".to_string()),
                socket: None,
            },
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_run_dumps_then_cleans() -> Result<()> {
        let backups = TempDir::new()?;
        let bin = TempDir::new()?;
        fake_tool(bin.path())?;

        fs::write(backups.path().join("2024-08-15_01.sql"), b"earlier")?;
        fs::write(backups.path().join("2024-06-03_01.sql"), b"old")?;
        fs::write(backups.path().join("2024-06-04_01.sql"), b"old")?;

        let config = run_config(backups.path(), bin.path(), "mysql");
        let report = run(&config, date(2024, 8, 15), RunOptions::default())?;

        let snapshot = report.snapshot.expect("dump should have run");
        assert_eq!(snapshot, backups.path().join("2024-08-15_02.sql"));
        let dump = fs::read_to_string(&snapshot)?;
        assert!(dump.contains("--host=localhost"));
        assert!(dump.trim_end().ends_with("shop"));

        assert_eq!(report.cleanup.weekly, TierOutcome::Cleaned { kept: 1, deleted: 1 });
        assert_eq!(report.cleanup.monthly, TierOutcome::NothingToClean);
        assert!(!backups.path().join("2024-06-03_01.sql").exists());
        assert!(backups.path().join("2024-06-04_01.sql").exists());
        Ok(())
    }

    #[test]
    fn test_skip_dump_only_cleans() -> Result<()> {
        let backups = TempDir::new()?;
        fs::write(backups.path().join("2024-06-03_01.sql"), b"old")?;

        let config = run_config(backups.path(), Path::new("/nonexistent"), "mysql");
        let report = run(&config, date(2024, 8, 1), RunOptions { skip_dump: true })?;

        assert!(report.snapshot.is_none());
        assert!(RetentionMarker::new(MonthBucket { year: 2024, month: 6 }, Tier::Weekly)
            .exists(backups.path()));
        Ok(())
    }

    #[test]
    fn test_unsupported_driver_aborts_before_anything_runs() -> Result<()> {
        let backups = TempDir::new()?;
        fs::write(backups.path().join("2024-06-03_01.sql"), b"old")?;
        fs::write(backups.path().join("2024-06-04_01.sql"), b"old")?;

        let config = run_config(backups.path(), Path::new("/nonexistent"), "oracle");
        let err = run(&config, date(2024, 8, 1), RunOptions::default()).unwrap_err();

        assert!(matches!(err, BackupError::UnsupportedDriver(_)));
        // No cleanup happened either
        assert!(backups.path().join("2024-06-03_01.sql").exists());
        assert!(!backups.path().join("2024-06.saved.weekly").exists());
        Ok(())
    }
}
