//! JSON report envelope shared by the CLI and server.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

pub const MODEL_ID: &str = "actuary_pipeline";
pub const MODEL_VERSION: u32 = 1;

/// Versioned wrapper around any serialisable result.
#[derive(Debug, Clone, Serialize)]
pub struct Report<T> {
    pub model_id: String,
    pub model_version: u32,
    /// What `data` holds, e.g. "harmonics" or "consensus".
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    pub data: T,
}

impl<T: Serialize> Report<T> {
    pub fn new(kind: impl Into<String>, data: T) -> Self {
        Self {
            model_id: MODEL_ID.to_string(),
            model_version: MODEL_VERSION,
            kind: kind.into(),
            generated_at: Utc::now(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `report` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, report: &Report<T>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report.to_json()?)?;
    log::info!("{} report written to {}", report.kind, path.display());
    Ok(())
}
