// SPDX-License-Identifier: PMPL-1.0-or-later

//! Catalog encoders and decoders
//!
//! - [`mo`]: binary runtime catalog (gettext MO layout)
//! - [`po`]: human-editable exchange format
//! - [`jed`]: JSON object per domain for script delivery
//!
//! All three work on a [`TranslationSet`]; the set's locale and domain go
//! into the catalog header. Plural messages carry one form per plural
//! category of the locale.

pub mod jed;
pub mod mo;
pub mod po;

use crate::plural::plural_rule;
use crate::types::Translation;
use std::collections::BTreeMap;

pub(crate) const CONTEXT_SEPARATOR: char = '\u{4}';

/// Header fields written into every catalog
pub(crate) fn header_fields(locale: &str, domain: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Project-Id-Version", domain.to_string()),
        ("MIME-Version", "1.0".to_string()),
        ("Content-Type", "text/plain; charset=UTF-8".to_string()),
        ("Content-Transfer-Encoding", "8bit".to_string()),
        ("Language", locale.to_string()),
        ("X-Domain", domain.to_string()),
        ("Plural-Forms", plural_rule(locale).header()),
        ("X-Generator", format!("msgledger {}", env!("CARGO_PKG_VERSION"))),
    ]
}

pub(crate) fn render_header(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("{}: {}\n", name, value))
        .collect()
}

/// `Name: value` lines of a catalog header
pub(crate) fn parse_header(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Forms to emit for a translation: the singular text, or exactly
/// `nplurals` plural forms with gaps filled by the singular text.
pub(crate) fn catalog_forms(translation: &Translation, nplurals: usize) -> Vec<String> {
    if !translation.has_plural() {
        return vec![translation.translation.clone()];
    }
    (0..nplurals.max(1))
        .map(|i| {
            translation
                .plural_translations
                .get(i)
                .filter(|form| !form.is_empty())
                .cloned()
                .unwrap_or_else(|| translation.translation.clone())
        })
        .collect()
}

/// Forms as stored, for the exchange format: exactly `nplurals` slots with
/// missing categories left empty. The first slot falls back to the singular
/// text.
pub(crate) fn exchange_forms(translation: &Translation, nplurals: usize) -> Vec<String> {
    if !translation.has_plural() {
        return vec![translation.translation.clone()];
    }
    (0..nplurals.max(1))
        .map(|i| {
            let form = translation.plural_translations.get(i).cloned().unwrap_or_default();
            if i == 0 && form.is_empty() {
                translation.translation.clone()
            } else {
                form
            }
        })
        .collect()
}

/// Inverse of [`catalog_forms`] and [`exchange_forms`]
pub(crate) fn apply_forms(translation: &mut Translation, forms: Vec<String>) {
    translation.translation = forms.first().cloned().unwrap_or_default();
    if translation.has_plural() {
        translation.plural_translations = forms;
    }
}

/// Lookup key with the context prefix gettext uses
pub(crate) fn context_key(context: &str, original: &str) -> String {
    if context.is_empty() {
        original.to_string()
    } else {
        format!("{}{}{}", context, CONTEXT_SEPARATOR, original)
    }
}

pub(crate) fn split_context_key(key: &str) -> (String, String) {
    match key.split_once(CONTEXT_SEPARATOR) {
        Some((context, original)) => (context.to_string(), original.to_string()),
        None => (String::new(), key.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_forms_fill_missing_categories() {
        let t = Translation::new("", "apple")
            .with_plural("apples")
            .with_translation("ābols")
            .with_plural_translations(["ābols", "", "ābolu"]);
        assert_eq!(catalog_forms(&t, 3), vec!["ābols", "ābols", "ābolu"]);
        assert_eq!(catalog_forms(&t, 2).len(), 2);
    }

    #[test]
    fn exchange_forms_keep_gaps() {
        let t = Translation::new("", "apple")
            .with_plural("apples")
            .with_translation("ābols")
            .with_plural_translations(["ābols", "āboli"]);
        assert_eq!(exchange_forms(&t, 3), vec!["ābols", "āboli", ""]);

        let singular_only = Translation::new("", "apple")
            .with_plural("apples")
            .with_translation("ābols");
        assert_eq!(exchange_forms(&singular_only, 3), vec!["ābols", "", ""]);
    }

    #[test]
    fn singular_emits_one_form() {
        let t = Translation::new("", "Hi").with_translation("Sveiki");
        assert_eq!(catalog_forms(&t, 3), vec!["Sveiki"]);
    }

    #[test]
    fn context_key_round_trip() {
        let key = context_key("menu", "File");
        assert_eq!(split_context_key(&key), ("menu".to_string(), "File".to_string()));
        assert_eq!(context_key("", "File"), "File");
    }

    #[test]
    fn header_lines_parse() {
        let header = render_header(&header_fields("lv_LV", "app"));
        let fields = parse_header(&header);
        assert_eq!(fields.get("Language").map(String::as_str), Some("lv_LV"));
        assert_eq!(fields.get("X-Domain").map(String::as_str), Some("app"));
        assert!(fields["Plural-Forms"].starts_with("nplurals=3"));
    }
}
