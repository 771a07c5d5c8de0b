// SPDX-License-Identifier: PMPL-1.0-or-later

//! Exchange format (PO)
//!
//! Header entry carries `Language`, `X-Domain` and `Plural-Forms`. Disabled
//! messages are written as obsolete `#~` entries so translators still see
//! them without them being compiled.

use super::{apply_forms, exchange_forms, header_fields, parse_header, render_header};
use crate::error::{CatalogError, Result};
use crate::plural::{plural_count, MAX_PLURAL_FORMS};
use crate::types::{Reference, Translation, TranslationSet};
use chrono::Utc;

fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Strip the quotes of one string token and resolve escapes in one pass.
fn unquote(token: &str) -> Option<String> {
    let inner = token.trim().strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}

/// Write `keyword "value"`, splitting multi-line values after each `\n`.
fn write_field(out: &mut String, prefix: &str, keyword: &str, value: &str) {
    let body = value.strip_suffix('\n').unwrap_or(value);
    if !body.contains('\n') {
        out.push_str(&format!("{}{} \"{}\"\n", prefix, keyword, escape_po(value)));
        return;
    }
    out.push_str(&format!("{}{} \"\"\n", prefix, keyword));
    for line in value.split_inclusive('\n') {
        out.push_str(&format!("{}\"{}\"\n", prefix, escape_po(line)));
    }
}

fn write_entry(out: &mut String, translation: &Translation, nplurals: usize) {
    for comment in &translation.comments {
        out.push_str(&format!("# {}\n", comment));
    }
    for comment in &translation.extracted_comments {
        out.push_str(&format!("#. {}\n", comment));
    }
    for reference in &translation.references {
        out.push_str(&format!("#: {}\n", reference));
    }

    let prefix = if translation.disabled { "#~ " } else { "" };
    if !translation.context.is_empty() {
        write_field(out, prefix, "msgctxt", &translation.context);
    }
    write_field(out, prefix, "msgid", &translation.original);
    if translation.has_plural() {
        write_field(out, prefix, "msgid_plural", &translation.original_plural);
        let forms = exchange_forms(translation, nplurals);
        for (index, form) in forms.iter().enumerate() {
            write_field(out, prefix, &format!("msgstr[{}]", index), form);
        }
    } else {
        write_field(out, prefix, "msgstr", &translation.translation);
    }
    out.push('\n');
}

/// Encode every entry of `set`, disabled ones as obsolete entries.
pub fn encode(set: &TranslationSet) -> String {
    let mut fields = header_fields(&set.locale, &set.domain);
    fields.insert(
        1,
        (
            "PO-Revision-Date",
            Utc::now().format("%Y-%m-%d %H:%M%z").to_string(),
        ),
    );

    let mut out = String::new();
    write_field(&mut out, "", "msgid", "");
    write_field(&mut out, "", "msgstr", &render_header(&fields));
    out.push('\n');

    let nplurals = plural_count(&set.locale);
    for translation in set.iter() {
        write_entry(&mut out, translation, nplurals);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Debug, Default)]
struct Pending {
    context: Option<String>,
    id: Option<String>,
    id_plural: String,
    forms: Vec<String>,
    comments: Vec<String>,
    extracted: Vec<String>,
    references: Vec<Reference>,
    obsolete: bool,
    seen_str: bool,
}

impl Pending {
    fn is_blank(&self) -> bool {
        self.id.is_none() && self.context.is_none() && self.comments.is_empty()
            && self.extracted.is_empty() && self.references.is_empty()
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Context => self.context.get_or_insert_with(String::new),
            Field::Id => self.id.get_or_insert_with(String::new),
            Field::IdPlural => &mut self.id_plural,
            Field::Str(index) => {
                if self.forms.len() <= index {
                    self.forms.resize(index + 1, String::new());
                }
                &mut self.forms[index]
            }
        }
    }
}

#[derive(Default)]
struct Decoded {
    header: Option<String>,
    entries: Vec<Translation>,
}

impl Decoded {
    fn flush(&mut self, pending: Pending) -> Result<()> {
        let Some(id) = pending.id else {
            return Ok(());
        };
        let context = pending.context.unwrap_or_default();
        if id.is_empty() && context.is_empty() {
            self.header = pending.forms.into_iter().next();
            return Ok(());
        }
        if !pending.seen_str {
            return Err(CatalogError::MalformedCatalog(format!(
                "entry \"{}\" has no msgstr",
                id
            )));
        }

        let mut translation = Translation::new(context, id)
            .with_plural(pending.id_plural)
            .with_disabled(pending.obsolete);
        translation.comments = pending.comments;
        translation.extracted_comments = pending.extracted;
        translation.references = pending.references;
        apply_forms(&mut translation, pending.forms);
        self.entries.push(translation);
        Ok(())
    }
}

fn split_keyword(line: &str) -> Option<(Field, &str)> {
    let (keyword, rest) = line.split_once(|c: char| c.is_whitespace())?;
    let field = match keyword {
        "msgctxt" => Field::Context,
        "msgid" => Field::Id,
        "msgid_plural" => Field::IdPlural,
        "msgstr" => Field::Str(0),
        other => {
            let index: usize = other.strip_prefix("msgstr[")?.strip_suffix(']')?.parse().ok()?;
            if index >= MAX_PLURAL_FORMS {
                return None;
            }
            Field::Str(index)
        }
    };
    Some((field, rest))
}

/// Decode a PO document.
///
/// Locale and domain come from the `Language` and `X-Domain` headers and are
/// left empty when absent.
pub fn decode(content: &str) -> Result<TranslationSet> {
    let mut decoded = Decoded::default();
    let mut pending = Pending::default();
    let mut current: Option<Field> = None;

    for (number, raw) in content.lines().enumerate() {
        let mut line = raw.trim();

        if line.is_empty() {
            decoded.flush(std::mem::take(&mut pending))?;
            current = None;
            continue;
        }

        let mut obsolete = false;
        if let Some(rest) = line.strip_prefix("#~") {
            obsolete = true;
            line = rest.trim_start();
        } else if let Some(rest) = line.strip_prefix('#') {
            // A comment after msgstr starts the next entry
            if pending.seen_str {
                decoded.flush(std::mem::take(&mut pending))?;
                current = None;
            }
            if let Some(reference) = rest.strip_prefix(':') {
                pending
                    .references
                    .extend(reference.split_whitespace().map(Reference::parse));
            } else if let Some(extracted) = rest.strip_prefix('.') {
                pending.extracted.push(extracted.trim().to_string());
            } else if rest.starts_with([',', '|']) {
                // flags and previous-msgid lines are not kept
            } else {
                pending.comments.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            }
            continue;
        }

        if line.starts_with('"') {
            let field = current.ok_or_else(|| {
                CatalogError::MalformedCatalog(format!("line {}: stray string", number + 1))
            })?;
            let value = unquote(line).ok_or_else(|| {
                CatalogError::MalformedCatalog(format!("line {}: bad string", number + 1))
            })?;
            pending.field_mut(field).push_str(&value);
            continue;
        }

        let (field, rest) = split_keyword(line).ok_or_else(|| {
            CatalogError::MalformedCatalog(format!("line {}: unexpected \"{}\"", number + 1, line))
        })?;
        if matches!(field, Field::Context | Field::Id)
            && (pending.seen_str || (field == Field::Context && pending.id.is_some()))
        {
            decoded.flush(std::mem::take(&mut pending))?;
        }
        let value = unquote(rest).ok_or_else(|| {
            CatalogError::MalformedCatalog(format!("line {}: bad string", number + 1))
        })?;
        if matches!(field, Field::Str(_)) {
            pending.seen_str = true;
        }
        pending.obsolete |= obsolete;
        *pending.field_mut(field) = value;
        current = Some(field);
    }
    if !pending.is_blank() {
        decoded.flush(pending)?;
    }

    let fields = decoded
        .header
        .as_deref()
        .map(parse_header)
        .unwrap_or_default();
    let mut set = TranslationSet::new(
        fields.get("Language").cloned().unwrap_or_default(),
        fields.get("X-Domain").cloned().unwrap_or_default(),
    );
    set.extend(decoded.entries);
    Ok(set)
}
