// SPDX-License-Identifier: PMPL-1.0-or-later

//! Runtime locale loading
//!
//! [`LocaleLoader`] resolves every configured domain to the catalog name it
//! was built under and decodes the compiled catalogs into a [`Translator`].
//! Nothing process-wide is touched; callers keep the translator they get.

use crate::builder::mo_pathname;
use crate::codec::{context_key, mo};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::plural::{plural_rule, PluralRule};
use crate::revision::RevisionResolver;
use crate::types::Translation;
use std::collections::HashMap;
use std::fs;

/// Decoded catalog of one domain
#[derive(Debug, Clone)]
struct Catalog {
    messages: HashMap<String, Translation>,
}

impl Catalog {
    fn lookup(&self, context: &str, original: &str) -> Option<&Translation> {
        self.messages
            .get(&context_key(context, original))
            .filter(|t| !t.translation.is_empty())
    }
}

/// gettext-style lookups for one locale
#[derive(Debug, Clone)]
pub struct Translator {
    locale: String,
    default_domain: String,
    rule: PluralRule,
    catalogs: HashMap<String, Catalog>,
    /// (domain, catalog name) pairs that were loaded
    bound: Vec<(String, String)>,
}

fn source_form<'a>(singular: &'a str, plural: &'a str, n: u64) -> &'a str {
    if n == 1 {
        singular
    } else {
        plural
    }
}

impl Translator {
    /// Translator that always returns the source strings
    pub fn passthrough(locale: &str, default_domain: &str) -> Self {
        Self {
            locale: locale.to_string(),
            default_domain: default_domain.to_string(),
            rule: plural_rule(locale),
            catalogs: HashMap::new(),
            bound: Vec::new(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Domains with a loaded catalog and the name each was loaded under
    pub fn bound_domains(&self) -> &[(String, String)] {
        &self.bound
    }

    fn find(&self, domain: &str, context: &str, original: &str) -> Option<&Translation> {
        self.catalogs.get(domain)?.lookup(context, original)
    }

    pub fn dpgettext(&self, domain: &str, context: &str, message: &str) -> String {
        self.find(domain, context, message)
            .map(|t| t.translation.clone())
            .unwrap_or_else(|| message.to_string())
    }

    pub fn dnpgettext(
        &self,
        domain: &str,
        context: &str,
        singular: &str,
        plural: &str,
        n: u64,
    ) -> String {
        let Some(found) = self.find(domain, context, singular) else {
            return source_form(singular, plural, n).to_string();
        };
        let index = self.rule.index(n);
        found
            .plural_translations
            .get(index)
            .filter(|form| !form.is_empty())
            .cloned()
            .unwrap_or_else(|| {
                if found.has_plural() {
                    source_form(singular, plural, n).to_string()
                } else {
                    found.translation.clone()
                }
            })
    }

    pub fn gettext(&self, message: &str) -> String {
        self.dpgettext(&self.default_domain, "", message)
    }

    pub fn ngettext(&self, singular: &str, plural: &str, n: u64) -> String {
        self.dnpgettext(&self.default_domain, "", singular, plural, n)
    }

    pub fn pgettext(&self, context: &str, message: &str) -> String {
        self.dpgettext(&self.default_domain, context, message)
    }

    pub fn npgettext(&self, context: &str, singular: &str, plural: &str, n: u64) -> String {
        self.dnpgettext(&self.default_domain, context, singular, plural, n)
    }

    pub fn dgettext(&self, domain: &str, message: &str) -> String {
        self.dpgettext(domain, "", message)
    }

    pub fn dngettext(&self, domain: &str, singular: &str, plural: &str, n: u64) -> String {
        self.dnpgettext(domain, "", singular, plural, n)
    }
}

pub struct LocaleLoader<'a, V: RevisionResolver> {
    config: &'a CatalogConfig,
    resolver: &'a V,
}

impl<'a, V: RevisionResolver> LocaleLoader<'a, V> {
    pub fn new(config: &'a CatalogConfig, resolver: &'a V) -> Self {
        Self { config, resolver }
    }

    /// Catalog name a domain is bound under for `locale`
    pub fn actual_domain(&self, locale: &str, domain: &str) -> String {
        if self.config.use_revisions {
            self.resolver.resolve(locale, domain)
        } else {
            domain.to_string()
        }
    }

    pub fn load(&self, locale: &str) -> Result<Translator> {
        if !self.config.is_known_locale(locale) {
            return Err(CatalogError::UnsupportedLocale(locale.to_string()));
        }
        let mut translator = Translator::passthrough(locale, &self.config.default_domain);
        if self.config.is_default_locale(locale) {
            return Ok(translator);
        }

        for domain in self.config.all_domains() {
            let actual = self.actual_domain(locale, &domain);
            let pathname = mo_pathname(&self.config.mo_directory, locale, &actual);
            if !pathname.is_file() {
                tracing::debug!(locale, domain = %domain, path = %pathname.display(), "no catalog to bind");
                continue;
            }
            let bytes = fs::read(&pathname).map_err(|e| CatalogError::io(&pathname, e))?;
            let set = mo::decode(&bytes)?;
            let messages = set
                .iter()
                .map(|t| (context_key(&t.context, &t.original), t.clone()))
                .collect();
            translator.catalogs.insert(domain.clone(), Catalog { messages });
            translator.bound.push((domain, actual));
        }

        tracing::info!(locale, domains = translator.bound.len(), "locale loaded");
        Ok(translator)
    }
}
