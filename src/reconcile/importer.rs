// SPDX-License-Identifier: PMPL-1.0-or-later

//! Batch import protocols
//!
//! - [`FileImporter`]: scan sources, merge every message as `File` or `Js`, then
//!   disable what no scan claims anymore.
//! - [`DynamicImporter`]: queue runtime-generated messages and flush them
//!   into a domain, releasing the dynamic claim on everything else.
//! - [`TranslatedImporter`]: accept translator submissions for records that
//!   already exist.

use super::{BatchSummary, ImportSummary, Reconciler};
use crate::codec::po;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::extract::Extractor;
use crate::store::MessageRepository;
use crate::types::{Provenance, ScanItem, Translation, TranslationSet};
use std::collections::BTreeMap;

pub struct FileImporter<'a> {
    config: &'a CatalogConfig,
    extractor: &'a Extractor,
}

impl<'a> FileImporter<'a> {
    pub fn new(config: &'a CatalogConfig, extractor: &'a Extractor) -> Self {
        Self { config, extractor }
    }

    /// Scan `items` and merge the results into every translatable locale.
    ///
    /// With `disable_unused` the scanned domains lose their file/JS claims
    /// first and one global disable sweep runs at the end. Without it the
    /// scan is partial: records are added or updated but nothing is
    /// released. `domains` defaults to every configured domain.
    pub fn extract_and_save<R: MessageRepository>(
        &self,
        reconciler: &mut Reconciler<R>,
        items: &[ScanItem],
        disable_unused: bool,
        domains: Option<&[String]>,
    ) -> Result<BatchSummary> {
        let domains = match domains {
            Some(domains) => domains.to_vec(),
            None => self.config.all_domains(),
        };
        let sets = self
            .extractor
            .extract(items, &domains, &self.config.default_domain)?;
        Ok(self.save_extracted(reconciler, &sets, disable_unused))
    }

    /// Merge already extracted sets; each set's `domain` names its scope.
    pub fn save_extracted<R: MessageRepository>(
        &self,
        reconciler: &mut Reconciler<R>,
        sets: &[TranslationSet],
        disable_unused: bool,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for locale in self.config.translatable_locales() {
            for set in sets {
                if disable_unused {
                    reconciler
                        .repository_mut()
                        .set_all_as_not_in_file_and_not_in_js(locale, &set.domain);
                }
                summary += reconciler.create_or_update(locale, &set.domain, set);
            }
        }
        if disable_unused {
            reconciler.repository_mut().disable_unused();
        }

        tracing::info!(
            domains = sets.len(),
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            partial = !disable_unused,
            "file scan merged"
        );
        summary
    }
}

/// Add-then-flush queue of dynamic messages, grouped by context
pub struct DynamicImporter<'a> {
    config: &'a CatalogConfig,
    queue: BTreeMap<String, Vec<String>>,
}

impl<'a> DynamicImporter<'a> {
    pub fn new(config: &'a CatalogConfig) -> Self {
        Self {
            config,
            queue: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, original: impl Into<String>, context: impl Into<String>) -> &mut Self {
        let original = original.into();
        let messages = self.queue.entry(context.into()).or_default();
        if !messages.contains(&original) {
            messages.push(original);
        }
        self
    }

    pub fn queued(&self) -> usize {
        self.queue.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queued() == 0
    }

    /// Flush the queue into `domain` for every translatable locale.
    ///
    /// Messages of the domain that are not queued lose their dynamic claim;
    /// the global disable sweep then retires anything left unclaimed. The
    /// queue is emptied once the flush has run.
    pub fn save_and_disable_previous<R: MessageRepository>(
        &mut self,
        reconciler: &mut Reconciler<R>,
        domain: &str,
    ) -> Result<BatchSummary> {
        if self.is_empty() {
            return Err(CatalogError::MissingMessages);
        }

        let mut summary = BatchSummary::default();
        for locale in self.config.translatable_locales() {
            reconciler
                .repository_mut()
                .set_all_as_not_dynamic(locale, domain);
            for (context, messages) in &self.queue {
                for original in messages {
                    let translation = Translation::new(context.as_str(), original.as_str());
                    summary.record(reconciler.create_or_update_single_with_type(
                        locale,
                        domain,
                        &translation,
                        Provenance::Dynamic,
                    ));
                }
            }
        }
        reconciler.repository_mut().disable_unused();

        tracing::info!(
            domain,
            queued = self.queued(),
            created = summary.created,
            updated = summary.updated,
            "dynamic messages flushed"
        );
        self.queue.clear();
        Ok(summary)
    }
}

pub struct TranslatedImporter<'a> {
    config: &'a CatalogConfig,
}

impl<'a> TranslatedImporter<'a> {
    pub fn new(config: &'a CatalogConfig) -> Self {
        Self { config }
    }

    /// Reject a batch whose scope is missing or not configured.
    pub fn validate(&self, set: &TranslationSet) -> Result<()> {
        if set.locale.is_empty() {
            return Err(CatalogError::InvalidTranslation(
                "missing locale".to_string(),
            ));
        }
        if set.domain.is_empty() {
            return Err(CatalogError::InvalidTranslation(
                "missing domain".to_string(),
            ));
        }
        if !self.config.is_known_locale(&set.locale) {
            return Err(CatalogError::UnsupportedLocale(set.locale.clone()));
        }
        if !self.config.is_known_domain(&set.domain) {
            return Err(CatalogError::UnsupportedDomain(set.domain.clone()));
        }
        Ok(())
    }

    pub fn import_from_translations<R: MessageRepository>(
        &self,
        reconciler: &mut Reconciler<R>,
        set: &TranslationSet,
    ) -> Result<ImportSummary> {
        self.validate(set)?;
        let summary = reconciler.save_translated(set);
        tracing::info!(
            locale = %set.locale,
            domain = %set.domain,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "translations imported"
        );
        Ok(summary)
    }

    /// Import a PO document; scope comes from its `Language` and
    /// `X-Domain` headers.
    pub fn import_from_po<R: MessageRepository>(
        &self,
        reconciler: &mut Reconciler<R>,
        content: &str,
    ) -> Result<ImportSummary> {
        let set = po::decode(content)?;
        self.import_from_translations(reconciler, &set)
    }
}
