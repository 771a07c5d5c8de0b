// SPDX-License-Identifier: PMPL-1.0-or-later

//! JSON snapshot persistence for the in-memory store

use super::MemoryRepository;
use crate::error::{CatalogError, Result};
use crate::types::MessageRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SNAPSHOT_SCHEMA: &str = "msgledger.store";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema: String,
    version: u32,
    saved_at: String,
    records: Vec<MessageRecord>,
}

impl MemoryRepository {
    /// Load a snapshot; a missing file yields an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.schema != SNAPSHOT_SCHEMA {
            return Err(CatalogError::MalformedCatalog(format!(
                "{} is not a message store snapshot (schema {})",
                path.display(),
                snapshot.schema
            )));
        }
        tracing::debug!(
            path = %path.display(),
            records = snapshot.records.len(),
            "loaded store snapshot"
        );
        Ok(Self::from_records(snapshot.records))
    }

    /// Whole-file rewrite of the snapshot. Not atomic.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }
        let snapshot = Snapshot {
            schema: SNAPSHOT_SCHEMA.to_string(),
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            records: self.records().to_vec(),
        };
        let payload = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, payload).map_err(|e| CatalogError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MessageRepository;
    use tempfile::TempDir;

    #[test]
    fn missing_snapshot_opens_empty() {
        let dir = TempDir::new().expect("temp dir should create");
        let repo = MemoryRepository::open(&dir.path().join("store.json"))
            .expect("missing snapshot is not an error");
        assert!(repo.is_empty());
    }

    #[test]
    fn persisted_records_reload_in_order() {
        let dir = TempDir::new().expect("temp dir should create");
        let path = dir.path().join("state/store.json");

        let mut repo = MemoryRepository::new();
        for key in ["b", "a", "c"] {
            repo.save(MessageRecord {
                key: key.to_string(),
                locale: "lv_LV".to_string(),
                domain: "app".to_string(),
                original: key.to_uppercase(),
                is_in_file: true,
                ..MessageRecord::default()
            });
        }
        repo.persist(&path).expect("snapshot should write");

        let reloaded = MemoryRepository::open(&path).expect("snapshot should load");
        let keys: Vec<&str> = reloaded.records().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(reloaded.get_single("a").original, "A");
    }

    #[test]
    fn foreign_json_is_rejected() {
        let dir = TempDir::new().expect("temp dir should create");
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"schema":"other","version":1,"saved_at":"","records":[]}"#,
        )
        .expect("fixture should write");

        assert!(matches!(
            MemoryRepository::open(&path),
            Err(CatalogError::MalformedCatalog(_))
        ));
    }
}
