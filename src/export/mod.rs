// SPDX-License-Identifier: PMPL-1.0-or-later

//! Untranslated message export for translators
//!
//! A PO document per (locale, domain) holding every enabled message that
//! still requires translating, optionally bundled into a zip archive of
//! `{locale}-{domain}.po` entries.

use crate::codec::po;
use crate::error::{CatalogError, Result};
use crate::store::MessageRepository;
use crate::types::TranslationSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn zip_entry_name(locale: &str, domain: &str) -> String {
    format!("{}-{}.po", locale, domain)
}

/// Messages of a scope that still need translating, as a set
pub fn untranslated_set<R: MessageRepository>(repository: &R, locale: &str, domain: &str) -> TranslationSet {
    TranslationSet::from_records(locale, domain, &repository.get_requires_translating(locale, domain))
}

/// PO document of the messages that still need translating
pub fn export_to_string<R: MessageRepository>(repository: &R, locale: &str, domain: &str) -> String {
    po::encode(&untranslated_set(repository, locale, domain))
}

/// Write `{locale}-{domain}.po` entries into a new archive at `zip_path`.
///
/// Domains with nothing to translate are left out. The archive's directory
/// must already exist. Returns the names of the entries written.
pub fn export_zip<R: MessageRepository>(
    repository: &R,
    zip_path: &Path,
    locale: &str,
    domains: &[String],
) -> Result<Vec<String>> {
    let dir = match zip_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(CatalogError::InvalidPath(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }

    let file = File::create(zip_path).map_err(|e| CatalogError::io(zip_path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = Vec::new();
    for domain in domains {
        let set = untranslated_set(repository, locale, domain);
        if set.is_empty() {
            continue;
        }
        let name = zip_entry_name(locale, domain);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(po::encode(&set).as_bytes())
            .map_err(|e| CatalogError::io(zip_path, e))?;
        written.push(name);
    }
    zip.finish()?;

    tracing::info!(path = %zip_path.display(), locale, files = written.len(), "untranslated archive written");
    Ok(written)
}
