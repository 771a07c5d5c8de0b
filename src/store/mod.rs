// SPDX-License-Identifier: PMPL-1.0-or-later

//! Message record store
//!
//! [`MessageRepository`] is the contract the reconciliation engine works
//! against. [`MemoryRepository`] keeps records in insertion order and can be
//! snapshotted to disk (see [`snapshot`]).

pub mod snapshot;

use crate::types::MessageRecord;
use std::collections::HashMap;

/// Storage operations required by the reconciliation engine.
///
/// The filtered views narrow strictly:
/// `get_all ⊇ get_enabled ⊇ get_enabled_translated ⊇ get_enabled_translated_in_js`.
pub trait MessageRepository {
    /// Upsert by key. Returns `false` when the record could not be stored.
    fn save(&mut self, record: MessageRecord) -> bool;

    /// Existing record, or an empty record (`exists() == false`).
    fn get_single(&self, key: &str) -> MessageRecord;

    fn get_all(&self, locale: &str, domain: &str) -> Vec<MessageRecord>;

    fn set_all_as_not_in_file_and_not_in_js(&mut self, locale: &str, domain: &str);

    fn set_all_as_not_dynamic(&mut self, locale: &str, domain: &str);

    /// Disable every record no provenance source claims. Never re-enables.
    fn disable_unused(&mut self);

    fn disable_all(&mut self, locale: &str, domain: &str);

    fn get_enabled(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.get_all(locale, domain)
            .into_iter()
            .filter(|r| !r.is_disabled)
            .collect()
    }

    fn get_enabled_translated(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.get_enabled(locale, domain)
            .into_iter()
            .filter(|r| r.has_original_translation)
            .collect()
    }

    fn get_enabled_translated_in_js(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.get_enabled_translated(locale, domain)
            .into_iter()
            .filter(|r| r.is_in_js)
            .collect()
    }

    fn get_requires_translating(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.get_enabled(locale, domain)
            .into_iter()
            .filter(|r| r.requires_translating)
            .collect()
    }
}

/// Insertion-ordered in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    records: Vec<MessageRecord>,
    index: HashMap<String, usize>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<MessageRecord>) -> Self {
        let mut repository = Self::new();
        for record in records {
            repository.save(record);
        }
        repository
    }

    pub fn records(&self) -> &[MessageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct (locale, domain) scopes in first-seen order
    pub fn scopes(&self) -> Vec<(String, String)> {
        let mut scopes: Vec<(String, String)> = Vec::new();
        for record in &self.records {
            let scope = (record.locale.clone(), record.domain.clone());
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes
    }

    fn scope_mut<'a>(
        &'a mut self,
        locale: &'a str,
        domain: &'a str,
    ) -> impl Iterator<Item = &'a mut MessageRecord> + 'a {
        self.records
            .iter_mut()
            .filter(move |r| r.in_scope(locale, domain))
    }
}

impl MessageRepository for MemoryRepository {
    fn save(&mut self, record: MessageRecord) -> bool {
        if !record.exists() {
            return false;
        }
        match self.index.get(&record.key) {
            Some(&position) => self.records[position] = record,
            None => {
                self.index.insert(record.key.clone(), self.records.len());
                self.records.push(record);
            }
        }
        true
    }

    fn get_single(&self, key: &str) -> MessageRecord {
        self.index
            .get(key)
            .map(|&position| self.records[position].clone())
            .unwrap_or_default()
    }

    fn get_all(&self, locale: &str, domain: &str) -> Vec<MessageRecord> {
        self.records
            .iter()
            .filter(|r| r.in_scope(locale, domain))
            .cloned()
            .collect()
    }

    fn set_all_as_not_in_file_and_not_in_js(&mut self, locale: &str, domain: &str) {
        for record in self.scope_mut(locale, domain) {
            record.is_in_file = false;
            record.is_in_js = false;
        }
    }

    fn set_all_as_not_dynamic(&mut self, locale: &str, domain: &str) {
        for record in self.scope_mut(locale, domain) {
            record.is_dynamic = false;
        }
    }

    fn disable_unused(&mut self) {
        for record in self.records.iter_mut().filter(|r| !r.is_claimed()) {
            record.is_disabled = true;
        }
    }

    fn disable_all(&mut self, locale: &str, domain: &str) {
        for record in self.scope_mut(locale, domain) {
            record.is_disabled = true;
        }
    }
}
