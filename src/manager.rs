// SPDX-License-Identifier: PMPL-1.0-or-later

//! Top-level facade tying configuration, store, extraction, builds and
//! runtime loading together. The CLI drives everything through here.

use crate::builder::{BuildOutcome, CatalogBuilder, JsBuilder};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::export;
use crate::extract::{default_functions, short_functions, Extractor, FunctionMap};
use crate::locale::{LocaleLoader, Translator};
use crate::reconcile::importer::{DynamicImporter, FileImporter, TranslatedImporter};
use crate::reconcile::{BatchSummary, ImportSummary, Reconciler};
use crate::revision::{RevisionResolver, RevisionTracker};
use crate::store::MemoryRepository;
use crate::summary::{summarize, CatalogSummary};
use crate::types::ScanItem;
use std::path::Path;

pub struct MessageManager {
    config: CatalogConfig,
    reconciler: Reconciler<MemoryRepository>,
    extractor: Extractor,
    revisions: RevisionTracker,
}

impl MessageManager {
    /// Validate `config` and load the store snapshot when one is configured.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        config.validate()?;
        let repository = match &config.store_path {
            Some(path) => MemoryRepository::open(path)?,
            None => MemoryRepository::new(),
        };
        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: CatalogConfig, repository: MemoryRepository) -> Self {
        let reconciler =
            Reconciler::new(repository).with_default_locale(config.default_locale.clone());
        let revisions = RevisionTracker::new(config.mo_directory.clone());
        Self {
            config,
            reconciler,
            extractor: Extractor::new(),
            revisions,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler<MemoryRepository> {
        &self.reconciler
    }

    pub fn repository(&self) -> &MemoryRepository {
        self.reconciler.repository()
    }

    pub fn revisions(&self) -> &RevisionTracker {
        &self.revisions
    }

    /// Write the store snapshot. Returns false when no store is configured.
    pub fn persist(&self) -> Result<bool> {
        let Some(path) = &self.config.store_path else {
            return Ok(false);
        };
        self.repository().persist(path)?;
        tracing::debug!(path = %path.display(), records = self.repository().len(), "store persisted");
        Ok(true)
    }

    /// Function names scanned for `item`: the defaults, the short helpers
    /// when enabled, then the item's own mapping on top.
    pub fn function_map(&self, item: &ScanItem) -> FunctionMap {
        let mut functions = default_functions();
        if self.config.use_short_functions {
            functions.extend(short_functions());
        }
        if let Some(own) = &item.functions {
            functions.extend(own.iter().map(|(name, kind)| (name.clone(), *kind)));
        }
        functions
    }

    fn prepared_items(&self, items: &[ScanItem]) -> Vec<ScanItem> {
        items
            .iter()
            .map(|item| ScanItem {
                functions: Some(self.function_map(item)),
                ..item.clone()
            })
            .collect()
    }

    fn check_locale(&self, locale: &str) -> Result<()> {
        if self.config.is_known_locale(locale) {
            Ok(())
        } else {
            Err(CatalogError::UnsupportedLocale(locale.to_string()))
        }
    }

    fn check_domains(&self, domains: &[String]) -> Result<()> {
        match domains.iter().find(|d| !self.config.is_known_domain(d)) {
            Some(domain) => Err(CatalogError::UnsupportedDomain(domain.clone())),
            None => Ok(()),
        }
    }

    fn domains_or_all(&self, domains: Option<&[String]>) -> Result<Vec<String>> {
        match domains {
            Some(domains) => {
                self.check_domains(domains)?;
                Ok(domains.to_vec())
            }
            None => Ok(self.config.all_domains()),
        }
    }

    /// Scan `items` (or the configured scan list) and merge the results.
    /// A full scan (`disable_unused`) retires messages no longer found.
    pub fn extract_and_save(
        &mut self,
        items: Option<&[ScanItem]>,
        disable_unused: bool,
    ) -> Result<BatchSummary> {
        let items = self.prepared_items(items.unwrap_or(self.config.scan.as_slice()));
        if items.is_empty() {
            return Err(CatalogError::InvalidConfig(
                "nothing to scan: no scan paths configured".to_string(),
            ));
        }
        let importer = FileImporter::new(&self.config, &self.extractor);
        importer.extract_and_save(&mut self.reconciler, &items, disable_unused, None)
    }

    /// Queue `(context, original)` pairs and flush them into `domain`.
    pub fn save_dynamic<I, C, O>(&mut self, domain: &str, messages: I) -> Result<BatchSummary>
    where
        I: IntoIterator<Item = (C, O)>,
        C: Into<String>,
        O: Into<String>,
    {
        self.check_domains(&[domain.to_string()])?;
        let mut importer = DynamicImporter::new(&self.config);
        for (context, original) in messages {
            importer.add(original, context);
        }
        importer.save_and_disable_previous(&mut self.reconciler, domain)
    }

    pub fn export_untranslated(&self, locale: &str, domain: &str) -> Result<String> {
        self.check_locale(locale)?;
        self.check_domains(&[domain.to_string()])?;
        Ok(export::export_to_string(self.repository(), locale, domain))
    }

    pub fn export_untranslated_zip(
        &self,
        zip_path: &Path,
        locale: &str,
        domains: Option<&[String]>,
    ) -> Result<Vec<String>> {
        self.check_locale(locale)?;
        let domains = self.domains_or_all(domains)?;
        export::export_zip(self.repository(), zip_path, locale, &domains)
    }

    pub fn import_po(&mut self, content: &str) -> Result<ImportSummary> {
        TranslatedImporter::new(&self.config).import_from_po(&mut self.reconciler, content)
    }

    pub fn build(&self, locale: &str, domain: &str) -> Result<Option<BuildOutcome>> {
        self.check_locale(locale)?;
        self.check_domains(&[domain.to_string()])?;
        CatalogBuilder::new(&self.config, &self.revisions).export(self.repository(), locale, domain)
    }

    /// Build every translatable locale × configured domain.
    pub fn build_all(&self) -> Result<Vec<BuildOutcome>> {
        let builder = CatalogBuilder::new(&self.config, &self.revisions);
        let mut outcomes = Vec::new();
        for locale in self.config.translatable_locales() {
            for domain in self.config.all_domains() {
                if let Some(outcome) = builder.export(self.repository(), locale, &domain)? {
                    outcomes.push(outcome);
                }
            }
        }
        Ok(outcomes)
    }

    pub fn export_jsonp(
        &self,
        locale: &str,
        domains: Option<&[String]>,
        callback: Option<&str>,
    ) -> Result<String> {
        self.check_locale(locale)?;
        let domains = self.domains_or_all(domains)?;
        let callback = callback.unwrap_or(&self.config.js_callback);
        Ok(JsBuilder::export_jsonp(self.repository(), locale, &domains, callback))
    }

    pub fn load_locale(&self, locale: &str) -> Result<Translator> {
        LocaleLoader::new(&self.config, &self.revisions).load(locale)
    }

    /// Domain name a runtime should bind for (locale, domain)
    pub fn get_revisioned_domain(&self, locale: &str, domain: &str) -> String {
        if self.config.use_revisions {
            self.revisions.resolve(locale, domain)
        } else {
            domain.to_string()
        }
    }

    pub fn summary(&self) -> CatalogSummary {
        summarize(self.repository(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GettextKind;
    use tempfile::TempDir;

    fn manager(dir: &Path) -> MessageManager {
        let config = CatalogConfig::new(&["en_US", "lv_LV"], "app", &["emails"], dir);
        MessageManager::open(config).expect("manager opens")
    }

    #[test]
    fn item_mapping_overrides_short_helpers() {
        let dir = TempDir::new().expect("temp dir should create");
        let mut config = CatalogConfig::new(&["en_US", "lv_LV"], "app", &[], dir.path())
            .with_short_functions(true);
        config.scan.push(ScanItem::new(dir.path()));
        let manager = MessageManager::open(config).expect("manager opens");

        let item = ScanItem::new(dir.path()).with_function("_c", GettextKind::Gettext);
        let functions = manager.function_map(&item);
        assert_eq!(functions.get("_c"), Some(&GettextKind::Gettext));
        assert_eq!(functions.get("_n"), Some(&GettextKind::Ngettext));
        assert!(functions.contains_key("gettext"));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let dir = TempDir::new().expect("temp dir should create");
        let manager = manager(dir.path());
        assert!(matches!(
            manager.export_untranslated("fr_FR", "app"),
            Err(CatalogError::UnsupportedLocale(_))
        ));
        assert!(matches!(
            manager.export_jsonp("lv_LV", Some(&["nope".to_string()]), None),
            Err(CatalogError::UnsupportedDomain(_))
        ));
    }

    #[test]
    fn empty_scan_list_is_an_error() {
        let dir = TempDir::new().expect("temp dir should create");
        let mut manager = manager(dir.path());
        assert!(matches!(
            manager.extract_and_save(None, true),
            Err(CatalogError::InvalidConfig(_))
        ));
    }

    #[test]
    fn persist_without_store_is_a_no_op() {
        let dir = TempDir::new().expect("temp dir should create");
        assert!(!manager(dir.path()).persist().expect("persist runs"));
    }
}
