// SPDX-License-Identifier: PMPL-1.0-or-later

//! Source message extraction
//!
//! Resolves scan items to files, picks an extractor by file extension and
//! collects gettext-style calls into one [`TranslationSet`] per domain.
//!
//! Domain routing: the default domain receives calls without a domain
//! argument plus domain calls naming it; every other domain receives only
//! the domain calls that name it.

pub mod patterns;

use crate::error::{CatalogError, Result};
use crate::types::{GettextKind, ScanItem, SourceLanguage, Translation, TranslationSet};
use patterns::{comment_above, find_calls};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", "vendor", "target"];

pub type FunctionMap = BTreeMap<String, GettextKind>;

/// The eight standard names plus the common shorthand aliases
pub fn default_functions() -> FunctionMap {
    let mut functions: FunctionMap = [
        GettextKind::Gettext,
        GettextKind::Ngettext,
        GettextKind::Pgettext,
        GettextKind::Dgettext,
        GettextKind::Dngettext,
        GettextKind::Dpgettext,
        GettextKind::Npgettext,
        GettextKind::Dnpgettext,
    ]
    .into_iter()
    .map(|kind| (kind.as_str().to_string(), kind))
    .collect();

    for (name, kind) in [
        ("_", GettextKind::Gettext),
        ("__", GettextKind::Gettext),
        ("n__", GettextKind::Ngettext),
        ("p__", GettextKind::Pgettext),
        ("d__", GettextKind::Dgettext),
    ] {
        functions.insert(name.to_string(), kind);
    }
    functions
}

/// Short helper names installed by the runtime helpers
pub fn short_functions() -> FunctionMap {
    [
        ("_n", GettextKind::Ngettext),
        ("_nc", GettextKind::Npgettext),
        ("_c", GettextKind::Pgettext),
        ("_dc", GettextKind::Dpgettext),
        ("_d", GettextKind::Dgettext),
        ("_dn", GettextKind::Dngettext),
        ("_dnc", GettextKind::Dnpgettext),
    ]
    .into_iter()
    .map(|(name, kind)| (name.to_string(), kind))
    .collect()
}

/// A message found in one file, before domain routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMessage {
    /// Explicit domain argument, if the call had one
    pub domain: Option<String>,
    pub translation: Translation,
}

/// Extension → extractor registry
#[derive(Debug, Clone)]
pub struct Extractor {
    registry: HashMap<String, SourceLanguage>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        let mut extractor = Self {
            registry: HashMap::new(),
        };
        for ext in ["php", "phtml", "js", "mjs", "cjs", "jsx", "ts", "tsx", "vue"] {
            extractor.register(ext, SourceLanguage::from_extension(ext));
        }
        extractor
    }

    pub fn register(&mut self, extension: &str, language: SourceLanguage) {
        self.registry.insert(extension.to_ascii_lowercase(), language);
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.registry.contains_key(&extension.to_ascii_lowercase())
    }

    /// Extractor for a file, or `UnknownExtractor`.
    pub fn language_for(&self, path: &Path) -> Result<SourceLanguage> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        self.registry
            .get(&extension)
            .copied()
            .ok_or_else(|| CatalogError::UnknownExtractor {
                extension,
                path: path.to_path_buf(),
            })
    }

    /// Files matching a scan item, sorted by path.
    pub fn resolve_pathnames(&self, item: &ScanItem) -> Result<Vec<PathBuf>> {
        if item.path.is_file() {
            return Ok(vec![item.path.clone()]);
        }
        if !item.path.is_dir() {
            return Err(CatalogError::InvalidPath(format!(
                "path {} does not exist",
                item.path.display()
            )));
        }

        let max_depth = if item.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&item.path)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| SKIPPED_DIRS.contains(&name))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let extension = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("");
            let wanted = match &item.extensions {
                Some(extensions) => extensions.iter().any(|e| e == extension),
                None => self.supports(extension),
            };
            if wanted {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Messages in one source text, in call order.
    pub fn extract_source(
        &self,
        language: SourceLanguage,
        content: &str,
        reference: &str,
        functions: &FunctionMap,
    ) -> Vec<ExtractedMessage> {
        let mut messages = Vec::new();
        for call in find_calls(content, language, |name| functions.contains_key(name)) {
            let Some(kind) = functions.get(&call.name) else {
                continue;
            };
            let layout = kind.layout();
            let literal = |index: usize| call.args.get(index).cloned().flatten();

            let Some(original) = literal(layout.singular).filter(|o| !o.is_empty()) else {
                continue;
            };
            let domain = match layout.domain {
                Some(index) => match literal(index) {
                    Some(domain) => Some(domain),
                    None => continue,
                },
                None => None,
            };
            let context = match layout.context {
                Some(index) => match literal(index) {
                    Some(context) => context,
                    None => continue,
                },
                None => String::new(),
            };
            let plural = match layout.plural {
                Some(index) => match literal(index) {
                    Some(plural) => plural,
                    None => continue,
                },
                None => String::new(),
            };

            let mut translation = Translation::new(context, original)
                .with_plural(plural)
                .with_reference(reference, Some(call.line));
            if let Some(comment) = comment_above(content, call.line, language) {
                translation = translation.with_extracted_comment(comment);
            }
            messages.push(ExtractedMessage {
                domain,
                translation,
            });
        }
        messages
    }

    /// Read a file as UTF-8, falling back to Windows-1252.
    fn read_source(path: &Path) -> Option<String> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                return None;
            }
        };
        match String::from_utf8(raw) {
            Ok(content) => Some(content),
            Err(e) => {
                let raw = e.into_bytes();
                let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&raw);
                if had_errors {
                    tracing::warn!(path = %path.display(), "skipping non-text file");
                    return None;
                }
                Some(decoded.into_owned())
            }
        }
    }

    /// Scan every item and route the messages into one set per domain, in
    /// the order of `domains`.
    pub fn extract(
        &self,
        items: &[ScanItem],
        domains: &[String],
        default_domain: &str,
    ) -> Result<Vec<TranslationSet>> {
        let mut sets: Vec<TranslationSet> = domains
            .iter()
            .map(|domain| TranslationSet::new("", domain.as_str()))
            .collect();
        let defaults = default_functions();

        for item in items {
            let functions = item.functions.as_ref().unwrap_or(&defaults);
            let pathnames = self.resolve_pathnames(item)?;

            for pathname in &pathnames {
                let language = self.language_for(pathname)?;
                let Some(content) = Self::read_source(pathname) else {
                    continue;
                };
                let reference = pathname.to_string_lossy();

                for message in self.extract_source(language, &content, &reference, functions) {
                    let target = message.domain.as_deref().unwrap_or(default_domain);
                    if let Some(set) = sets.iter_mut().find(|set| set.domain == target) {
                        set.insert(message.translation);
                    }
                }
            }
            tracing::debug!(path = %item.path.display(), files = pathnames.len(), "scan item extracted");
        }

        tracing::info!(
            items = items.len(),
            messages = sets.iter().map(TranslationSet::len).sum::<usize>(),
            "extraction finished"
        );
        Ok(sets)
    }
}
