// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog builders
//!
//! [`CatalogBuilder`] compiles the enabled, translated records of one
//! (locale, domain) into `{mo}/{locale}/LC_MESSAGES/{domain}.mo`, or into
//! `{domain}-{tag}.mo` when revisions are enabled. [`JsBuilder`] renders the
//! in-JS subset as JSONP for script-tag loading.

use crate::codec::{jed, mo};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::revision::{generate_revisioned_domain, RevisionTracker};
use crate::store::MessageRepository;
use crate::types::TranslationSet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What a single catalog build did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub locale: String,
    pub domain: String,
    /// Domain name the catalog was written under
    pub catalog_domain: String,
    pub path: PathBuf,
    pub messages: usize,
    /// False when an identical revision was already on disk
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_previous: Option<PathBuf>,
}

pub fn mo_pathname(mo_directory: &Path, locale: &str, domain: &str) -> PathBuf {
    mo_directory
        .join(locale)
        .join("LC_MESSAGES")
        .join(format!("{}.mo", domain))
}

pub struct CatalogBuilder<'a> {
    config: &'a CatalogConfig,
    revisions: &'a RevisionTracker,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(config: &'a CatalogConfig, revisions: &'a RevisionTracker) -> Self {
        Self { config, revisions }
    }

    /// The catalog root must exist; locale subdirectories are created.
    fn ensure_directory(&self, locale: &str, domain: &str) -> Result<PathBuf> {
        let base = &self.config.mo_directory;
        if !base.is_dir() {
            return Err(CatalogError::InvalidPath(format!(
                "directory {} does not exist",
                base.display()
            )));
        }
        let pathname = mo_pathname(base, locale, domain);
        if let Some(parent) = pathname.parent() {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }
        Ok(pathname)
    }

    /// Build one catalog. The default locale is never built (`Ok(None)`).
    pub fn export<R: MessageRepository>(
        &self,
        repository: &R,
        locale: &str,
        domain: &str,
    ) -> Result<Option<BuildOutcome>> {
        if self.config.is_default_locale(locale) {
            return Ok(None);
        }

        let records = repository.get_enabled_translated(locale, domain);
        let revisioned = self
            .config
            .use_revisions
            .then(|| generate_revisioned_domain(domain, &records));
        let catalog_domain = revisioned.clone().unwrap_or_else(|| domain.to_string());
        let pathname = self.ensure_directory(locale, &catalog_domain)?;

        let previous = self.revisions.get_revisioned_domain(locale, domain);
        let unchanged = revisioned.is_some() && previous == revisioned && pathname.is_file();

        if !unchanged {
            let bytes = mo::encode(&TranslationSet::from_records(locale, domain, &records));
            fs::write(&pathname, bytes).map_err(|e| CatalogError::io(&pathname, e))?;
        }

        let mut removed_previous = None;
        if let Some(revisioned) = &revisioned {
            let changed = self.revisions.save_revision(locale, domain, revisioned)?;
            if changed {
                removed_previous = self.remove_previous(locale, revisioned, previous.as_deref());
            }
        }

        tracing::info!(
            locale,
            domain,
            catalog = %catalog_domain,
            messages = records.len(),
            written = !unchanged,
            "catalog built"
        );
        Ok(Some(BuildOutcome {
            locale: locale.to_string(),
            domain: domain.to_string(),
            catalog_domain,
            path: pathname,
            messages: records.len(),
            written: !unchanged,
            removed_previous,
        }))
    }

    /// Delete the superseded revision's catalog. Best effort.
    fn remove_previous(&self, locale: &str, current: &str, previous: Option<&str>) -> Option<PathBuf> {
        let previous = previous.filter(|p| *p != current)?;
        let pathname = mo_pathname(&self.config.mo_directory, locale, previous);
        if !pathname.is_file() {
            return None;
        }
        match fs::remove_file(&pathname) {
            Ok(()) => Some(pathname),
            Err(e) => {
                tracing::warn!(path = %pathname.display(), error = %e, "could not remove previous catalog");
                None
            }
        }
    }
}

/// JSONP bundles of the in-JS translations
pub struct JsBuilder;

impl JsBuilder {
    /// One `callback(json);` line per domain with enabled, translated
    /// in-JS messages; other domains are omitted.
    pub fn export_jsonp<R: MessageRepository>(
        repository: &R,
        locale: &str,
        domains: &[String],
        callback: &str,
    ) -> String {
        let mut js = String::new();
        for domain in domains {
            let records = repository.get_enabled_translated_in_js(locale, domain);
            if records.is_empty() {
                continue;
            }
            let value = jed::encode(&TranslationSet::from_records(locale, domain, &records));
            js.push_str(&jed::wrap_jsonp(callback, &value));
        }
        js
    }
}
