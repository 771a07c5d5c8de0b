// SPDX-License-Identifier: PMPL-1.0-or-later

//! Revisioned domain names
//!
//! A revisioned domain is `{domain}-{tag}` where `tag` is a short content
//! hash of the translations compiled into it. Consumers that cache catalogs
//! by domain name see a new name whenever the content changes.
//!
//! The current name per (locale, domain) lives in `{mo}/revisions.json`:
//!
//! ```json
//! { "lv_LV": { "app": "app-3f2a1c" } }
//! ```

use crate::error::{CatalogError, Result};
use crate::types::MessageRecord;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const REVISIONS_FILE: &str = "revisions.json";
const TAG_LEN: usize = 6;

/// locale → domain → revisioned domain
pub type RevisionMap = BTreeMap<String, BTreeMap<String, String>>;

/// Resolves the domain name a runtime should bind for a locale.
pub trait RevisionResolver {
    /// Revisioned name when one is recorded, otherwise `domain` itself.
    fn resolve(&self, locale: &str, domain: &str) -> String;
}

/// Resolver for setups that do not use revisions
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDomains;

impl RevisionResolver for PlainDomains {
    fn resolve(&self, _locale: &str, domain: &str) -> String {
        domain.to_string()
    }
}

#[derive(Serialize)]
struct RevisionTuple<'a> {
    original: &'a str,
    plural: &'a str,
    translation: &'a str,
    plural_translations: &'a [String],
    context: &'a str,
}

/// `{domain}-{6 hex}` over the ordered (original, plural, translation,
/// plural translations, context) tuples.
pub fn generate_revisioned_domain(domain: &str, records: &[MessageRecord]) -> String {
    let tuples: Vec<RevisionTuple<'_>> = records
        .iter()
        .map(|r| RevisionTuple {
            original: &r.original,
            plural: &r.original_plural,
            translation: &r.translation,
            plural_translations: &r.plural_translations,
            context: &r.context,
        })
        .collect();

    // String-only tuples always serialize
    let payload = serde_json::to_vec(&tuples).unwrap_or_default();
    let digest = hex::encode(Sha256::digest(&payload));
    format!("{}-{}", domain, &digest[..TAG_LEN])
}

/// Side-file backed revision map, read once per tracker.
#[derive(Debug)]
pub struct RevisionTracker {
    mo_directory: PathBuf,
    cache: RefCell<Option<RevisionMap>>,
}

impl RevisionTracker {
    pub fn new(mo_directory: impl Into<PathBuf>) -> Self {
        Self {
            mo_directory: mo_directory.into(),
            cache: RefCell::new(None),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.mo_directory.join(REVISIONS_FILE)
    }

    /// Read the side-file; missing or unreadable content yields an empty map.
    fn read_file(path: &Path) -> RevisionMap {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed revisions file");
                RevisionMap::new()
            }),
            Err(_) => RevisionMap::new(),
        }
    }

    /// Strict read used by diagnostics.
    pub fn load_strict(&self) -> Result<RevisionMap> {
        let path = self.path();
        if !path.exists() {
            return Ok(RevisionMap::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| CatalogError::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn revisions(&self) -> RevisionMap {
        let mut cache = self.cache.borrow_mut();
        cache
            .get_or_insert_with(|| Self::read_file(&self.path()))
            .clone()
    }

    pub fn get_revisioned_domain(&self, locale: &str, domain: &str) -> Option<String> {
        self.revisions()
            .get(locale)
            .and_then(|domains| domains.get(domain))
            .cloned()
    }

    /// Record a new revisioned name. Returns whether the file changed.
    ///
    /// The file is re-read first so that a concurrent builder's entries for
    /// other scopes are kept.
    pub fn save_revision(&self, locale: &str, domain: &str, revisioned: &str) -> Result<bool> {
        let path = self.path();
        let mut revisions = Self::read_file(&path);

        let current = revisions.get(locale).and_then(|d| d.get(domain));
        if current.map(String::as_str) == Some(revisioned) {
            *self.cache.borrow_mut() = Some(revisions);
            return Ok(false);
        }

        if !self.mo_directory.is_dir() {
            return Err(CatalogError::InvalidPath(format!(
                "revision directory {} does not exist",
                self.mo_directory.display()
            )));
        }

        revisions
            .entry(locale.to_string())
            .or_default()
            .insert(domain.to_string(), revisioned.to_string());
        let payload = serde_json::to_string_pretty(&revisions)?;
        fs::write(&path, payload).map_err(|e| CatalogError::io(&path, e))?;

        tracing::debug!(locale, domain, revisioned, "revision saved");
        *self.cache.borrow_mut() = Some(revisions);
        Ok(true)
    }
}

impl RevisionResolver for RevisionTracker {
    fn resolve(&self, locale: &str, domain: &str) -> String {
        self.get_revisioned_domain(locale, domain)
            .unwrap_or_else(|| domain.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn record(original: &str, translation: &str) -> MessageRecord {
        MessageRecord {
            key: original.to_string(),
            original: original.to_string(),
            translation: translation.to_string(),
            ..MessageRecord::default()
        }
    }

    #[test]
    fn tag_has_domain_prefix_and_six_hex() {
        let name = generate_revisioned_domain("app", &[record("Hi", "Sveiki")]);
        let (domain, tag) = name.rsplit_once('-').expect("dash separator");
        assert_eq!(domain, "app");
        assert_eq!(tag.len(), 6);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tag_changes_with_plural_forms() {
        let plain = record("apple", "ābols");
        let mut plural = plain.clone();
        plural.original_plural = "apples".to_string();
        assert_ne!(
            generate_revisioned_domain("app", &[plain]),
            generate_revisioned_domain("app", &[plural])
        );
    }

    #[test]
    fn save_revision_writes_only_on_change() {
        let dir = TempDir::new().expect("temp dir should create");
        let tracker = RevisionTracker::new(dir.path());

        assert!(tracker.save_revision("lv_LV", "app", "app-aaaaaa").expect("first save"));
        assert!(!tracker.save_revision("lv_LV", "app", "app-aaaaaa").expect("second save"));
        assert!(tracker.save_revision("lv_LV", "app", "app-bbbbbb").expect("third save"));

        let fresh = RevisionTracker::new(dir.path());
        assert_eq!(
            fresh.get_revisioned_domain("lv_LV", "app").as_deref(),
            Some("app-bbbbbb")
        );
        assert_eq!(fresh.resolve("lv_LV", "other"), "other");
    }

    #[test]
    fn save_revision_requires_directory() {
        let dir = TempDir::new().expect("temp dir should create");
        let tracker = RevisionTracker::new(dir.path().join("missing"));
        assert!(matches!(
            tracker.save_revision("lv_LV", "app", "app-aaaaaa"),
            Err(CatalogError::InvalidPath(_))
        ));
    }

    #[test]
    fn malformed_file_reads_as_empty() {
        let dir = TempDir::new().expect("temp dir should create");
        fs::write(dir.path().join(REVISIONS_FILE), "not json").expect("fixture should write");
        let tracker = RevisionTracker::new(dir.path());
        assert!(tracker.revisions().is_empty());
        assert!(tracker.load_strict().is_err());
    }

    proptest! {
        #[test]
        fn revision_is_idempotent(
            entries in proptest::collection::vec(("[a-z]{1,8}", "[a-z]{0,8}"), 0..12)
        ) {
            let records: Vec<MessageRecord> =
                entries.iter().map(|(o, t)| record(o, t)).collect();
            prop_assert_eq!(
                generate_revisioned_domain("app", &records),
                generate_revisioned_domain("app", &records)
            );
        }

        #[test]
        fn revision_tracks_translation_text(
            original in "[a-z]{1,8}",
            first in "[a-z]{1,8}",
            second in "[A-Z]{1,8}",
        ) {
            prop_assert_ne!(
                generate_revisioned_domain("app", &[record(&original, &first)]),
                generate_revisioned_domain("app", &[record(&original, &second)])
            );
        }
    }
}
