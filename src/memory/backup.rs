//! Point-in-time backups of the persisted store directory.
//!
//! The whole store tree is written to `memory_backup_<YYYYMMDD_HHMMSS>.tar.gz`
//! under the backups directory. There is no coordination with concurrent writes:
//! a backup taken mid-write may capture a partially written WAL.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::memory::types::format_timestamp;

#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub path: String,
    pub filename: String,
    pub size_mb: f64,
    pub timestamp: String,
    pub source_path: String,
}

/// `{status: "success", ...record}` or `{status: "error", message}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackupOutcome {
    Success(BackupRecord),
    Error { message: String },
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    source: PathBuf,
    backups_dir: PathBuf,
}

impl BackupManager {
    pub fn new(source: impl Into<PathBuf>, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            backups_dir: backups_dir.into(),
        }
    }

    /// Archive the store now. Failures are reported in the outcome, never raised.
    pub fn create_backup(&self) -> BackupOutcome {
        match self.archive(Utc::now()) {
            Ok(record) => {
                tracing::info!(path = %record.path, size_mb = record.size_mb, "backup created");
                BackupOutcome::Success(record)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "backup failed");
                BackupOutcome::Error {
                    message: format!("{e:#}"),
                }
            }
        }
    }

    fn archive(&self, now: DateTime<Utc>) -> Result<BackupRecord> {
        anyhow::ensure!(
            self.source.is_dir(),
            "store directory {} does not exist",
            self.source.display()
        );
        anyhow::ensure!(
            !self.backups_dir.starts_with(&self.source),
            "backups directory {} is inside the store directory",
            self.backups_dir.display()
        );
        std::fs::create_dir_all(&self.backups_dir).with_context(|| {
            format!(
                "failed to create backups directory {}",
                self.backups_dir.display()
            )
        })?;

        let filename = backup_filename(now);
        let path = self.backups_dir.join(&filename);
        let root = self
            .source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("store"));

        let file = File::create(&path)
            .with_context(|| format!("failed to create archive {}", path.display()))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder
            .append_dir_all(&root, &self.source)
            .with_context(|| format!("failed to archive {}", self.source.display()))?;
        builder
            .into_inner()
            .context("failed to finish tar stream")?
            .finish()
            .context("failed to finish gzip stream")?;

        let bytes = std::fs::metadata(&path)?.len();
        Ok(BackupRecord {
            path: path.to_string_lossy().into_owned(),
            filename,
            size_mb: round2(bytes as f64 / (1024.0 * 1024.0)),
            timestamp: format_timestamp(now),
            source_path: self.source.to_string_lossy().into_owned(),
        })
    }
}

pub fn backup_filename(at: DateTime<Utc>) -> String {
    format!("memory_backup_{}.tar.gz", at.format("%Y%m%d_%H%M%S"))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flate2::read::GzDecoder;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn filename_format() {
        let at = Utc.with_ymd_and_hms(2025, 6, 8, 9, 5, 7).unwrap();
        assert_eq!(backup_filename(at), "memory_backup_20250608_090507.tar.gz");
    }

    #[test]
    fn archive_contains_store_tree() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("store");
        std::fs::create_dir_all(store.join("nested")).unwrap();
        std::fs::write(store.join("memories.db"), b"not really sqlite").unwrap();
        std::fs::write(store.join("nested").join("extra.bin"), [7u8; 64]).unwrap();

        let manager = BackupManager::new(&store, tmp.path().join("backups"));
        let record = match manager.create_backup() {
            BackupOutcome::Success(r) => r,
            BackupOutcome::Error { message } => panic!("backup failed: {message}"),
        };
        assert!(record.filename.starts_with("memory_backup_"));
        assert!(Path::new(&record.path).exists());

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&record.path).unwrap()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n == "store/memories.db"));
        assert!(names.iter().any(|n| n == "store/nested/extra.bin"));
    }

    #[test]
    fn missing_store_is_an_error_outcome() {
        let tmp = TempDir::new().unwrap();
        let manager = BackupManager::new(tmp.path().join("absent"), tmp.path().join("backups"));
        match manager.create_backup() {
            BackupOutcome::Error { message } => assert!(message.contains("does not exist")),
            BackupOutcome::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn error_outcome_serializes_with_status() {
        let outcome = BackupOutcome::Error {
            message: "nope".into(),
        };
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            serde_json::json!({"status": "error", "message": "nope"})
        );
    }
}
