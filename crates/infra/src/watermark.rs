//! File-backed watermark
//!
//! The file holds a single RFC 3339 timestamp: the completion time of the
//! last reconciliation pass. A missing or unreadable file means "no
//! watermark" and is never an error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use issuesync_core::WatermarkStore;
use issuesync_domain::Result;
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Watermark kept as RFC 3339 text in a single file
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
    async fn read(&self) -> Option<DateTime<Utc>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no watermark file");
                return None;
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read watermark file");
                return None;
            }
        };

        match DateTime::parse_from_rfc3339(contents.trim()) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring malformed watermark");
                None
            }
        }
    }

    async fn write(&self, at: DateTime<Utc>) -> Result<()> {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        tokio::fs::write(&self.path, format!("{stamp}\n")).await.map_err(InfraError::from)?;
        debug!(path = %self.path.display(), watermark = %stamp, "watermark written");
        Ok(())
    }
}
