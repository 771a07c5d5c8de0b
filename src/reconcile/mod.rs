// SPDX-License-Identifier: PMPL-1.0-or-later

//! Message reconciliation and lifecycle
//!
//! Merges incoming translation data (file scans, dynamic registrations,
//! translator submissions) into the message store. Each merge is computed
//! as a new record value from the existing record and the incoming one; the
//! store is written only when the result differs.
//!
//! Batch protocols built on top of the single-record merge live in
//! [`importer`].

pub mod importer;

use crate::plural::plural_count;
use crate::store::{MemoryRepository, MessageRepository};
use crate::types::{non_empty_count, union_into, MessageRecord, Provenance, Translation, TranslationSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::AddAssign;

/// Result of merging one incoming record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveOutcome {
    Created,
    Updated,
    Unchanged,
    /// Refused before touching the store (default locale, missing record,
    /// empty submission)
    Skipped,
    /// The store reported a failed write
    Failed,
}

/// Per-outcome counters for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Summary of a translator import; only `updated`, `unchanged` and
/// `skipped` are ever non-zero.
pub type ImportSummary = BatchSummary;

impl BatchSummary {
    pub fn record(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Created => self.created += 1,
            SaveOutcome::Updated => self.updated += 1,
            SaveOutcome::Unchanged => self.unchanged += 1,
            SaveOutcome::Skipped => self.skipped += 1,
            SaveOutcome::Failed => self.failed += 1,
        }
    }

    pub fn written(&self) -> usize {
        self.created + self.updated
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }
}

impl AddAssign for BatchSummary {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Deterministic record key: first 32 hex chars of
/// `sha256("locale|domain|context|original")`.
pub fn fingerprint(locale: &str, domain: &str, context: &str, original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}|{}", locale, domain, context, original).as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(32);
    digest
}

/// Whether a record still needs translator work for `locale`.
///
/// Untranslated records always do. Plural records also do until every plural
/// category the locale requires has a non-empty form.
pub fn compute_requires_translating(locale: &str, record: &MessageRecord) -> bool {
    if record.translation.is_empty() {
        return true;
    }
    if record.has_plural() {
        return non_empty_count(&record.plural_translations) != plural_count(locale);
    }
    false
}

/// Content merge of an incoming record into an existing one.
///
/// A plural original, once set, is kept. Non-empty incoming translation text and plural forms replace the stored
/// ones; empty incoming values never erase. References and comments are
/// unioned. The incoming disabled state is carried over as-is. Provenance
/// flags and derived fields are left to the caller.
pub fn merge_translation_fields(existing: &MessageRecord, incoming: &MessageRecord) -> MessageRecord {
    let mut merged = existing.clone();

    if merged.original_plural.is_empty() && !incoming.original_plural.is_empty() {
        merged.original_plural = incoming.original_plural.clone();
    }
    if !incoming.translation.is_empty() {
        merged.translation = incoming.translation.clone();
    }
    if non_empty_count(&incoming.plural_translations) > 0 {
        merged.plural_translations = incoming.plural_translations.clone();
    }

    union_into(&mut merged.references, &incoming.references);
    union_into(&mut merged.comments, &incoming.comments);
    union_into(&mut merged.extracted_comments, &incoming.extracted_comments);

    merged.is_in_js = incoming.is_in_js;
    merged.is_disabled = incoming.is_disabled;
    merged
}

/// Apply provenance accumulation and recompute derived fields.
fn derive_flags(
    locale: &str,
    existing: &MessageRecord,
    mut merged: MessageRecord,
    kind: Provenance,
) -> MessageRecord {
    merged.is_in_js = kind == Provenance::Js || merged.is_in_js || existing.is_in_js;
    merged.is_dynamic = kind == Provenance::Dynamic || existing.is_dynamic;
    merged.is_in_file = kind == Provenance::File || merged.is_in_js || existing.is_in_file;
    merged.has_original_translation = !merged.translation.is_empty();
    merged.requires_translating = compute_requires_translating(locale, &merged);
    merged.is_disabled = merged.is_disabled || !merged.is_claimed();
    merged
}

/// The reconciliation engine over a message store.
#[derive(Debug, Default)]
pub struct Reconciler<R: MessageRepository = MemoryRepository> {
    repository: R,
    default_locale: Option<String>,
}

impl<R: MessageRepository> Reconciler<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            default_locale: None,
        }
    }

    /// Records for `locale` are never persisted.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    pub fn is_default_locale(&self, locale: &str) -> bool {
        self.default_locale.as_deref() == Some(locale)
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    /// Merge one incoming translation with the given provenance.
    ///
    /// `SubmittedTranslation` goes through [`Self::save_translated_single`]
    /// and never creates a record.
    pub fn create_or_update_single_with_type(
        &mut self,
        locale: &str,
        domain: &str,
        translation: &Translation,
        kind: Provenance,
    ) -> SaveOutcome {
        if kind == Provenance::SubmittedTranslation {
            return self.save_translated_single(locale, domain, translation);
        }
        if self.is_default_locale(locale) {
            tracing::debug!(locale, domain, "default locale is never persisted");
            return SaveOutcome::Skipped;
        }

        let key = fingerprint(locale, domain, &translation.context, &translation.original);
        let existing = self.repository.get_single(&key);
        let incoming = MessageRecord::from_translation(key, locale, domain, translation);

        let merged = if existing.exists() {
            merge_translation_fields(&existing, &incoming)
        } else {
            incoming
        };
        let merged = derive_flags(locale, &existing, merged, kind);

        if existing == merged {
            return SaveOutcome::Unchanged;
        }

        let created = !existing.exists();
        let key = merged.key.clone();
        if !self.repository.save(merged) {
            tracing::warn!(locale, domain, key = %key, "store refused message record");
            return SaveOutcome::Failed;
        }

        let outcome = if created {
            SaveOutcome::Created
        } else {
            SaveOutcome::Updated
        };
        tracing::debug!(locale, domain, key = %key, ?kind, ?outcome, "reconciled message");
        outcome
    }

    /// Merge one scanned translation (provenance `File`).
    pub fn create_or_update_single(
        &mut self,
        locale: &str,
        domain: &str,
        translation: &Translation,
    ) -> SaveOutcome {
        self.create_or_update_single_with_type(locale, domain, translation, Provenance::File)
    }

    /// Merge a scanned set into `(locale, domain)`: messages seen in a
    /// script or template as `Js`, the rest as `File`.
    pub fn create_or_update(&mut self, locale: &str, domain: &str, set: &TranslationSet) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for translation in set.iter() {
            let kind = if translation.is_in_js() {
                Provenance::Js
            } else {
                Provenance::File
            };
            summary.record(self.create_or_update_single_with_type(locale, domain, translation, kind));
        }
        summary
    }

    /// Apply a translator submission to an existing record.
    ///
    /// Never creates records and never touches provenance or the disabled
    /// state. Empty submissions are skipped.
    pub fn save_translated_single(
        &mut self,
        locale: &str,
        domain: &str,
        translation: &Translation,
    ) -> SaveOutcome {
        if self.is_default_locale(locale) || translation.translation.is_empty() {
            return SaveOutcome::Skipped;
        }

        let key = fingerprint(locale, domain, &translation.context, &translation.original);
        let existing = self.repository.get_single(&key);
        if !existing.exists() {
            tracing::debug!(locale, domain, original = %translation.original, "no record to translate");
            return SaveOutcome::Skipped;
        }

        let mut updated = existing.clone();
        updated.translation = translation.translation.clone();
        if existing.has_plural() && non_empty_count(&translation.plural_translations) > 0 {
            updated.plural_translations = translation.plural_translations.clone();
        }
        updated.has_original_translation = true;
        updated.requires_translating = compute_requires_translating(locale, &updated);

        if updated == existing {
            return SaveOutcome::Unchanged;
        }
        if !self.repository.save(updated) {
            tracing::warn!(locale, domain, key = %key, "store refused translated record");
            return SaveOutcome::Failed;
        }
        SaveOutcome::Updated
    }

    /// Apply every translator submission in `set` to its own scope.
    pub fn save_translated(&mut self, set: &TranslationSet) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for translation in set.iter() {
            summary.record(self.save_translated_single(&set.locale, &set.domain, translation));
        }
        summary
    }

    pub fn get_all(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.repository.get_all(locale, domain)
    }

    pub fn get_enabled_translated(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.repository.get_enabled_translated(locale, domain)
    }

    pub fn get_enabled_translated_in_js(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.repository.get_enabled_translated_in_js(locale, domain)
    }

    pub fn get_requires_translating(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.repository.get_requires_translating(locale, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciler() -> Reconciler {
        Reconciler::new(MemoryRepository::new()).with_default_locale("en_US")
    }

    fn stored(r: &Reconciler, locale: &str, domain: &str, original: &str) -> MessageRecord {
        r.repository()
            .get_single(&fingerprint(locale, domain, "", original))
    }

    #[test]
    fn fingerprint_is_stable_and_scoped() {
        let a = fingerprint("lv_LV", "app", "", "Hi");
        assert_eq!(a.len(), 32);
        assert_eq!(a, fingerprint("lv_LV", "app", "", "Hi"));
        assert_ne!(a, fingerprint("lv_LV", "app", "menu", "Hi"));
        assert_ne!(a, fingerprint("de_DE", "app", "", "Hi"));
    }

    #[test]
    fn new_file_record_needs_translation() {
        let mut r = reconciler();
        let outcome = r.create_or_update_single("de_DE", "app", &Translation::new("", "hello"));
        assert_eq!(outcome, SaveOutcome::Created);

        let record = stored(&r, "de_DE", "app", "hello");
        assert!(record.is_in_file);
        assert!(!record.is_dynamic);
        assert!(!record.is_disabled);
        assert!(record.requires_translating);
        assert!(!record.has_original_translation);
    }

    #[test]
    fn identical_merge_is_unchanged() {
        let mut r = reconciler();
        let t = Translation::new("", "hello").with_reference("a.php", Some(3));
        r.create_or_update_single("de_DE", "app", &t);
        assert_eq!(
            r.create_or_update_single("de_DE", "app", &t),
            SaveOutcome::Unchanged
        );
    }

    #[test]
    fn empty_incoming_keeps_translation() {
        let mut r = reconciler();
        r.create_or_update_single("de_DE", "app", &Translation::new("", "Hi").with_translation("Hallo"));
        r.create_or_update_single("de_DE", "app", &Translation::new("", "Hi"));
        assert_eq!(stored(&r, "de_DE", "app", "Hi").translation, "Hallo");
    }

    #[test]
    fn default_locale_is_skipped() {
        let mut r = reconciler();
        assert_eq!(
            r.create_or_update_single("en_US", "app", &Translation::new("", "Hi")),
            SaveOutcome::Skipped
        );
        assert!(r.repository().is_empty());
    }

    #[test]
    fn submitted_type_never_creates_records() {
        let mut r = reconciler();
        let outcome = r.create_or_update_single_with_type(
            "lv_LV",
            "app",
            &Translation::new("", "Hi").with_translation("Sveiki"),
            Provenance::SubmittedTranslation,
        );
        assert_eq!(outcome, SaveOutcome::Skipped);
        assert!(r.repository().is_empty());
    }

    #[test]
    fn submitted_type_keeps_provenance_flags() {
        let mut r = reconciler();
        r.create_or_update_single_with_type("lv_LV", "app", &Translation::new("", "Hi"), Provenance::Dynamic);
        let outcome = r.create_or_update_single_with_type(
            "lv_LV",
            "app",
            &Translation::new("", "Hi").with_translation("Sveiki"),
            Provenance::SubmittedTranslation,
        );
        assert_eq!(outcome, SaveOutcome::Updated);

        let record = stored(&r, "lv_LV", "app", "Hi");
        assert_eq!(record.translation, "Sveiki");
        assert!(record.is_dynamic);
        assert!(!record.is_in_file);
        assert!(!record.is_in_js);
        assert!(!record.requires_translating);
    }

    #[test]
    fn singular_record_ignores_submitted_plural_forms() {
        let mut r = reconciler();
        r.create_or_update_single("lv_LV", "app", &Translation::new("", "apple"));
        let submitted = Translation::new("", "apple")
            .with_translation("ābols")
            .with_plural_translations(["ābols", "āboli", ""]);
        r.save_translated_single("lv_LV", "app", &submitted);

        let record = stored(&r, "lv_LV", "app", "apple");
        assert_eq!(record.translation, "ābols");
        assert!(record.plural_translations.is_empty());
        assert!(record.original_plural.is_empty());
    }

    #[test]
    fn plural_original_is_kept_once_set() {
        let mut r = reconciler();
        r.create_or_update_single("lv_LV", "app", &Translation::new("", "apple").with_plural("apples"));
        r.create_or_update_single("lv_LV", "app", &Translation::new("", "apple").with_plural("many apples"));
        assert_eq!(stored(&r, "lv_LV", "app", "apple").original_plural, "apples");
    }

    #[test]
    fn script_sighting_merges_as_js() {
        let mut r = reconciler();
        let mut set = TranslationSet::new("lv_LV", "app");
        set.insert(Translation::new("", "Click").with_reference("assets/app.js", Some(1)));
        set.insert(Translation::new("", "Save").with_reference("src/page.php", Some(2)));
        assert_eq!(r.create_or_update("lv_LV", "app", &set).created, 2);

        let click = stored(&r, "lv_LV", "app", "Click");
        assert!(click.is_in_js && click.is_in_file);
        let save = stored(&r, "lv_LV", "app", "Save");
        assert!(save.is_in_file && !save.is_in_js);
    }

    #[test]
    fn explicit_disable_wins_over_rediscovery() {
        let mut r = reconciler();
        r.create_or_update_single("de_DE", "app", &Translation::new("", "Hi"));
        r.create_or_update_single("de_DE", "app", &Translation::new("", "Hi").with_disabled(true));
        let record = stored(&r, "de_DE", "app", "Hi");
        assert!(record.is_in_file);
        assert!(record.is_disabled);
    }

    #[test]
    fn script_reference_sets_in_js_and_in_file() {
        let mut r = reconciler();
        r.create_or_update_single("de_DE", "app", &Translation::new("", "Hi").with_reference("app.vue", Some(2)));
        let record = stored(&r, "de_DE", "app", "Hi");
        assert!(record.is_in_js);
        assert!(record.is_in_file);
    }

    #[test]
    fn merge_unions_annotations() {
        let existing = MessageRecord {
            key: "k".into(),
            comments: vec!["one".into()],
            references: vec![crate::types::Reference::new("a.php", Some(1))],
            translation: "T".into(),
            ..MessageRecord::default()
        };
        let incoming = MessageRecord {
            key: "k".into(),
            comments: vec!["one".into(), "two".into()],
            references: vec![crate::types::Reference::new("b.php", Some(2))],
            ..MessageRecord::default()
        };
        let merged = merge_translation_fields(&existing, &incoming);
        assert_eq!(merged.comments, vec!["one", "two"]);
        assert_eq!(merged.references.len(), 2);
        assert_eq!(merged.translation, "T");
        // Inputs are untouched
        assert_eq!(existing.comments.len(), 1);
    }

    #[test]
    fn translated_single_requires_existing_record() {
        let mut r = reconciler();
        let t = Translation::new("", "Hi").with_translation("Sveiki");
        assert_eq!(r.save_translated_single("lv_LV", "app", &t), SaveOutcome::Skipped);
        assert!(r.repository().is_empty());

        r.create_or_update_single("lv_LV", "app", &Translation::new("", "Hi"));
        assert_eq!(r.save_translated_single("lv_LV", "app", &t), SaveOutcome::Updated);
        let record = stored(&r, "lv_LV", "app", "Hi");
        assert_eq!(record.translation, "Sveiki");
        assert!(!record.requires_translating);
        assert!(record.is_in_file);
    }

    #[test]
    fn translated_single_ignores_empty_text() {
        let mut r = reconciler();
        r.create_or_update_single("lv_LV", "app", &Translation::new("", "Hi").with_translation("Sveiki"));
        assert_eq!(
            r.save_translated_single("lv_LV", "app", &Translation::new("", "Hi")),
            SaveOutcome::Skipped
        );
        assert_eq!(stored(&r, "lv_LV", "app", "Hi").translation, "Sveiki");
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut r = reconciler();
        let mut set = TranslationSet::new("lv_LV", "app");
        set.insert(Translation::new("", "a"));
        set.insert(Translation::new("", "b"));
        let first = r.create_or_update("lv_LV", "app", &set);
        assert_eq!(first.created, 2);
        let second = r.create_or_update("lv_LV", "app", &set);
        assert_eq!(second.unchanged, 2);

        let mut total = first;
        total += second;
        assert_eq!(total.total(), 4);
        assert_eq!(total.written(), 2);
    }
}
