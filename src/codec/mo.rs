// SPDX-License-Identifier: PMPL-1.0-or-later

//! Binary runtime catalog (gettext MO layout)
//!
//! ```text
//! offset 0   magic 0x950412de
//!        4   revision 0
//!        8   N strings
//!       12   O offset of original table
//!       16   T offset of translation table
//!       20   S hash table size (0)
//!       24   H hash table offset
//!       28   original table: N x (length, offset)
//!            translation table: N x (length, offset)
//!            NUL-terminated strings
//! ```
//!
//! Originals are sorted bytewise. Contexts are joined with `\x04`, plural
//! originals and forms with `\0`. The empty original holds the header.

use super::{
    apply_forms, catalog_forms, context_key, header_fields, parse_header, render_header,
    split_context_key,
};
use crate::error::{CatalogError, Result};
use crate::plural::plural_count;
use crate::types::{Translation, TranslationSet};

pub const MAGIC: u32 = 0x950412de;
const HEADER_SIZE: usize = 28;

/// Encode the translated, enabled entries of `set`.
pub fn encode(set: &TranslationSet) -> Vec<u8> {
    let nplurals = plural_count(&set.locale);

    let mut entries: Vec<(Vec<u8>, Vec<u8>)> = vec![(
        Vec::new(),
        render_header(&header_fields(&set.locale, &set.domain)).into_bytes(),
    )];
    for translation in set.iter() {
        if translation.disabled || translation.translation.is_empty() {
            continue;
        }
        let mut original = context_key(&translation.context, &translation.original);
        if translation.has_plural() {
            original.push('\0');
            original.push_str(&translation.original_plural);
        }
        let forms = catalog_forms(translation, nplurals).join("\0");
        entries.push((original.into_bytes(), forms.into_bytes()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let count = entries.len();
    let originals_offset = HEADER_SIZE;
    let translations_offset = originals_offset + count * 8;
    let strings_offset = translations_offset + count * 8;

    let mut tables: Vec<u8> = Vec::with_capacity(count * 16);
    let mut pool: Vec<u8> = Vec::new();
    let mut translation_table: Vec<u8> = Vec::with_capacity(count * 8);

    for (original, _) in &entries {
        push_u32(&mut tables, original.len());
        push_u32(&mut tables, strings_offset + pool.len());
        pool.extend_from_slice(original);
        pool.push(0);
    }
    for (_, translated) in &entries {
        push_u32(&mut translation_table, translated.len());
        push_u32(&mut translation_table, strings_offset + pool.len());
        pool.extend_from_slice(translated);
        pool.push(0);
    }
    tables.extend_from_slice(&translation_table);

    let mut out = Vec::with_capacity(strings_offset + pool.len());
    out.extend_from_slice(&MAGIC.to_le_bytes());
    push_u32(&mut out, 0);
    push_u32(&mut out, count);
    push_u32(&mut out, originals_offset);
    push_u32(&mut out, translations_offset);
    push_u32(&mut out, 0);
    push_u32(&mut out, strings_offset);
    out.extend_from_slice(&tables);
    out.extend_from_slice(&pool);
    out
}

fn push_u32(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&(value as u32).to_le_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl Reader<'_> {
    fn u32_at(&self, offset: usize) -> Result<usize> {
        let raw: [u8; 4] = self
            .bytes
            .get(offset..offset + 4)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| malformed(format!("truncated at offset {}", offset)))?;
        let value = if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        };
        Ok(value as usize)
    }

    fn string(&self, table: usize, index: usize) -> Result<String> {
        let length = self.u32_at(table + index * 8)?;
        let offset = self.u32_at(table + index * 8 + 4)?;
        let raw = self
            .bytes
            .get(offset..offset + length)
            .ok_or_else(|| malformed(format!("string {} out of bounds", index)))?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| malformed(format!("string {} is not UTF-8", index)))
    }
}

fn malformed(message: String) -> CatalogError {
    CatalogError::MalformedCatalog(message)
}

/// Decode an MO catalog in either byte order.
///
/// Locale and domain come from the `Language` and `X-Domain` headers.
pub fn decode(bytes: &[u8]) -> Result<TranslationSet> {
    let magic: [u8; 4] = bytes
        .get(0..4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| malformed("file shorter than the MO header".to_string()))?;
    let big_endian = if u32::from_le_bytes(magic) == MAGIC {
        false
    } else if u32::from_be_bytes(magic) == MAGIC {
        true
    } else {
        return Err(malformed("bad MO magic number".to_string()));
    };

    let reader = Reader { bytes, big_endian };
    let count = reader.u32_at(8)?;
    let originals = reader.u32_at(12)?;
    let translations = reader.u32_at(16)?;

    let mut locale = String::new();
    let mut domain = String::new();
    let mut parsed: Vec<Translation> = Vec::with_capacity(count);

    for index in 0..count {
        let original = reader.string(originals, index)?;
        let translated = reader.string(translations, index)?;

        if original.is_empty() {
            let fields = parse_header(&translated);
            locale = fields.get("Language").cloned().unwrap_or_default();
            domain = fields.get("X-Domain").cloned().unwrap_or_default();
            continue;
        }

        let (key, plural) = match original.split_once('\0') {
            Some((singular, plural)) => (singular.to_string(), plural.to_string()),
            None => (original, String::new()),
        };
        let (context, msgid) = split_context_key(&key);
        let mut translation = Translation::new(context, msgid).with_plural(plural);
        apply_forms(
            &mut translation,
            translated.split('\0').map(str::to_string).collect(),
        );
        parsed.push(translation);
    }

    let mut set = TranslationSet::new(locale, domain);
    set.extend(parsed);
    Ok(set)
}
