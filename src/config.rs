// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog configuration
//!
//! Loaded from YAML or JSON (chosen by extension), then overridden from the
//! environment and validated.

use crate::error::{CatalogError, Result};
use crate::types::ScanItem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const MO_DIRECTORY_ENV: &str = "MSGLEDGER_MO_DIRECTORY";
pub const STORE_ENV: &str = "MSGLEDGER_STORE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Every locale the application ships, default locale included
    pub locales: Vec<String>,
    /// Source-string locale; never persisted or built
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Domain bound for calls without an explicit domain
    pub default_domain: String,
    #[serde(default)]
    pub other_domains: Vec<String>,
    /// Root of `{locale}/LC_MESSAGES/{domain}.mo`; must already exist
    pub mo_directory: PathBuf,
    #[serde(default)]
    pub use_revisions: bool,
    /// Also scan for the short helper names (`_n`, `_c`, `_d`, ...)
    #[serde(default)]
    pub use_short_functions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub scan: Vec<ScanItem>,
    #[serde(default = "default_js_callback")]
    pub js_callback: String,
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_js_callback() -> String {
    "gettextJsonp".to_string()
}

impl CatalogConfig {
    pub fn new(
        locales: &[&str],
        default_domain: &str,
        other_domains: &[&str],
        mo_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            locales: locales.iter().map(|l| l.to_string()).collect(),
            default_locale: default_locale(),
            default_domain: default_domain.to_string(),
            other_domains: other_domains.iter().map(|d| d.to_string()).collect(),
            mo_directory: mo_directory.into(),
            use_revisions: false,
            use_short_functions: false,
            store_path: None,
            scan: Vec::new(),
            js_callback: default_js_callback(),
        }
    }

    pub fn with_default_locale(mut self, locale: &str) -> Self {
        self.default_locale = locale.to_string();
        self
    }

    pub fn with_revisions(mut self, enabled: bool) -> Self {
        self.use_revisions = enabled;
        self
    }

    pub fn with_short_functions(mut self, enabled: bool) -> Self {
        self.use_short_functions = enabled;
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let mut config: CatalogConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        // Relative paths are resolved against the config file's directory
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if self.mo_directory.is_relative() {
            self.mo_directory = base.join(&self.mo_directory);
        }
        if let Some(store) = self.store_path.as_mut().filter(|p| p.is_relative()) {
            *store = base.join(&*store);
        }
        for item in &mut self.scan {
            if item.path.is_relative() {
                item.path = base.join(&item.path);
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = non_empty_env(MO_DIRECTORY_ENV) {
            self.mo_directory = PathBuf::from(value);
        }
        if let Some(value) = non_empty_env(STORE_ENV) {
            self.store_path = Some(PathBuf::from(value));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            return Err(CatalogError::InvalidConfig(
                "at least one locale is required".to_string(),
            ));
        }
        if self.locales.iter().any(|l| l.trim().is_empty()) {
            return Err(CatalogError::InvalidConfig(
                "locale names must not be empty".to_string(),
            ));
        }
        if self.default_domain.trim().is_empty() {
            return Err(CatalogError::InvalidConfig(
                "default_domain must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for domain in self.all_domains() {
            if domain.trim().is_empty() {
                return Err(CatalogError::InvalidConfig(
                    "domain names must not be empty".to_string(),
                ));
            }
            if !seen.insert(domain.clone()) {
                return Err(CatalogError::InvalidConfig(format!(
                    "domain {} is configured twice",
                    domain
                )));
            }
        }
        Ok(())
    }

    /// Other domains followed by the default domain
    pub fn all_domains(&self) -> Vec<String> {
        let mut domains = self.other_domains.clone();
        domains.push(self.default_domain.clone());
        domains
    }

    pub fn is_known_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    pub fn is_known_domain(&self, domain: &str) -> bool {
        domain == self.default_domain || self.other_domains.iter().any(|d| d == domain)
    }

    pub fn is_default_locale(&self, locale: &str) -> bool {
        locale == self.default_locale
    }

    /// Configured locales that get persisted and built
    pub fn translatable_locales(&self) -> impl Iterator<Item = &str> {
        self.locales
            .iter()
            .map(String::as_str)
            .filter(move |l| !self.is_default_locale(l))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
