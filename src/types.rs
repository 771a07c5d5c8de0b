// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for msgledger
//!
//! The message model ([`MessageRecord`]), incoming translation data
//! ([`Translation`], [`TranslationSet`]), scan configuration
//! ([`ScanItem`]) and the source-language detection used by the
//! extractor registry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Source languages with a registered extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Php,
    JavaScript,
    Vue,
    Unknown,
}

impl SourceLanguage {
    pub fn detect(path: &Path) -> Self {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "php" | "phtml" => SourceLanguage::Php,
            "js" | "mjs" | "cjs" | "jsx" => SourceLanguage::JavaScript,
            "ts" | "tsx" => SourceLanguage::JavaScript,
            "vue" => SourceLanguage::Vue,
            _ => SourceLanguage::Unknown,
        }
    }

    /// Script and template sources whose messages ship to the browser
    pub fn is_script(&self) -> bool {
        matches!(self, SourceLanguage::JavaScript | SourceLanguage::Vue)
    }
}

/// Which kind of scan or submission produced an incoming record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    File,
    Js,
    Dynamic,
    SubmittedTranslation,
}

/// Gettext call shapes recognised by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GettextKind {
    Gettext,
    Ngettext,
    Pgettext,
    Dgettext,
    Dngettext,
    Dpgettext,
    Npgettext,
    Dnpgettext,
}

/// Argument positions of a gettext call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgLayout {
    pub domain: Option<usize>,
    pub context: Option<usize>,
    pub singular: usize,
    pub plural: Option<usize>,
}

impl GettextKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gettext" => Some(GettextKind::Gettext),
            "ngettext" => Some(GettextKind::Ngettext),
            "pgettext" => Some(GettextKind::Pgettext),
            "dgettext" => Some(GettextKind::Dgettext),
            "dngettext" => Some(GettextKind::Dngettext),
            "dpgettext" => Some(GettextKind::Dpgettext),
            "npgettext" => Some(GettextKind::Npgettext),
            "dnpgettext" => Some(GettextKind::Dnpgettext),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GettextKind::Gettext => "gettext",
            GettextKind::Ngettext => "ngettext",
            GettextKind::Pgettext => "pgettext",
            GettextKind::Dgettext => "dgettext",
            GettextKind::Dngettext => "dngettext",
            GettextKind::Dpgettext => "dpgettext",
            GettextKind::Npgettext => "npgettext",
            GettextKind::Dnpgettext => "dnpgettext",
        }
    }

    pub fn layout(&self) -> ArgLayout {
        let (domain, context, plural) = match self {
            GettextKind::Gettext => (false, false, false),
            GettextKind::Ngettext => (false, false, true),
            GettextKind::Pgettext => (false, true, false),
            GettextKind::Dgettext => (true, false, false),
            GettextKind::Dngettext => (true, false, true),
            GettextKind::Dpgettext => (true, true, false),
            GettextKind::Npgettext => (false, true, true),
            GettextKind::Dnpgettext => (true, true, true),
        };

        let mut position = 0;
        let mut next = |present: bool| {
            if present {
                position += 1;
                Some(position - 1)
            } else {
                None
            }
        };
        let domain = next(domain);
        let context = next(context);
        let singular = next(true).unwrap_or(0);
        let plural = next(plural);

        ArgLayout {
            domain,
            context,
            singular,
            plural,
        }
    }

    pub fn has_domain(&self) -> bool {
        self.layout().domain.is_some()
    }
}

/// Where a message was found: `file:line`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Reference {
    pub fn new(file: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Parse the `file:line` form used in exchange-format comments.
    pub fn parse(value: &str) -> Self {
        match value.rsplit_once(':') {
            Some((file, line)) if !file.is_empty() => match line.parse::<usize>() {
                Ok(line) => Reference::new(file, Some(line)),
                Err(_) => Reference::new(value, None),
            },
            _ => Reference::new(value, None),
        }
    }

    pub fn is_script(&self) -> bool {
        SourceLanguage::detect(Path::new(&self.file)).is_script()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// Incoming translation data from a scan, a dynamic registration or a
/// translator submission. Carries no identity beyond (context, original).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub context: String,
    pub original: String,
    pub original_plural: String,
    pub translation: String,
    pub plural_translations: Vec<String>,
    pub references: Vec<Reference>,
    pub comments: Vec<String>,
    pub extracted_comments: Vec<String>,
    pub disabled: bool,
}

impl Translation {
    pub fn new(context: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            original: original.into(),
            ..Self::default()
        }
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.original_plural = plural.into();
        self
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = translation.into();
        self
    }

    pub fn with_plural_translations<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plural_translations = forms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reference(mut self, file: impl Into<String>, line: Option<usize>) -> Self {
        self.references.push(Reference::new(file, line));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    pub fn with_extracted_comment(mut self, comment: impl Into<String>) -> Self {
        self.extracted_comments.push(comment.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn has_plural(&self) -> bool {
        !self.original_plural.is_empty()
    }

    /// Found in at least one script or template source
    pub fn is_in_js(&self) -> bool {
        self.references.iter().any(Reference::is_script)
    }

    /// Fold a second sighting of the same message into this one.
    pub fn absorb(&mut self, other: &Translation) {
        if self.original_plural.is_empty() {
            self.original_plural = other.original_plural.clone();
        }
        if self.translation.is_empty() {
            self.translation = other.translation.clone();
        }
        if non_empty_count(&self.plural_translations) == 0 {
            self.plural_translations = other.plural_translations.clone();
        }
        union_into(&mut self.references, &other.references);
        union_into(&mut self.comments, &other.comments);
        union_into(&mut self.extracted_comments, &other.extracted_comments);
    }
}

/// Ordered collection of translations for one (locale, domain)
#[derive(Debug, Clone, Default)]
pub struct TranslationSet {
    pub locale: String,
    pub domain: String,
    entries: Vec<Translation>,
    index: HashMap<(String, String), usize>,
}

impl TranslationSet {
    pub fn new(locale: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Insert, merging with an existing entry of the same (context, original).
    pub fn insert(&mut self, translation: Translation) {
        let key = (translation.context.clone(), translation.original.clone());
        match self.index.get(&key) {
            Some(&position) => self.entries[position].absorb(&translation),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(translation);
            }
        }
    }

    pub fn from_records(locale: &str, domain: &str, records: &[MessageRecord]) -> Self {
        let mut set = Self::new(locale, domain);
        set.extend(records.iter().map(MessageRecord::to_translation));
        set
    }

    pub fn find(&self, context: &str, original: &str) -> Option<&Translation> {
        self.index
            .get(&(context.to_string(), original.to_string()))
            .map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Translation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Translation] {
        &self.entries
    }
}

impl Extend<Translation> for TranslationSet {
    fn extend<T: IntoIterator<Item = Translation>>(&mut self, iter: T) {
        for translation in iter {
            self.insert(translation);
        }
    }
}

/// One persisted message per unique (locale, domain, context, original)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Fingerprint of (locale, domain, context, original); empty means the
    /// record does not exist yet.
    pub key: String,
    pub locale: String,
    pub domain: String,
    pub context: String,
    pub original: String,
    #[serde(default)]
    pub original_plural: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub plural_translations: Vec<String>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_in_file: bool,
    #[serde(default)]
    pub is_in_js: bool,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub has_original_translation: bool,
    #[serde(default)]
    pub requires_translating: bool,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub extracted_comments: Vec<String>,
}

impl MessageRecord {
    pub fn exists(&self) -> bool {
        !self.key.is_empty()
    }

    pub fn has_plural(&self) -> bool {
        !self.original_plural.is_empty()
    }

    /// Claimed by at least one provenance source
    pub fn is_claimed(&self) -> bool {
        self.is_in_file || self.is_in_js || self.is_dynamic
    }

    pub fn in_scope(&self, locale: &str, domain: &str) -> bool {
        self.locale == locale && self.domain == domain
    }

    /// Fresh record carrying only the incoming data; flags are derived later.
    pub fn from_translation(key: String, locale: &str, domain: &str, t: &Translation) -> Self {
        Self {
            key,
            locale: locale.to_string(),
            domain: domain.to_string(),
            context: t.context.clone(),
            original: t.original.clone(),
            original_plural: t.original_plural.clone(),
            translation: t.translation.clone(),
            plural_translations: t.plural_translations.clone(),
            is_disabled: t.disabled,
            is_in_js: t.is_in_js(),
            references: t.references.clone(),
            comments: t.comments.clone(),
            extracted_comments: t.extracted_comments.clone(),
            ..Self::default()
        }
    }

    pub fn to_translation(&self) -> Translation {
        Translation {
            context: self.context.clone(),
            original: self.original.clone(),
            original_plural: self.original_plural.clone(),
            translation: self.translation.clone(),
            plural_translations: self.plural_translations.clone(),
            references: self.references.clone(),
            comments: self.comments.clone(),
            extracted_comments: self.extracted_comments.clone(),
            disabled: self.is_disabled,
        }
    }
}

/// A path to scan for translatable messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanItem {
    /// File or directory
    pub path: PathBuf,
    /// Extension filter; `None` scans every file with a registered extractor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    /// Extra function names mapped onto gettext call shapes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<BTreeMap<String, GettextKind>>,
}

fn default_recursive() -> bool {
    true
}

impl ScanItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions: None,
            recursive: true,
            functions: None,
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, kind: GettextKind) -> Self {
        self.functions
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), kind);
        self
    }
}

pub(crate) fn non_empty_count(values: &[String]) -> usize {
    values.iter().filter(|v| !v.is_empty()).count()
}

pub(crate) fn union_into<T: Clone + PartialEq>(target: &mut Vec<T>, extra: &[T]) {
    for value in extra {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}
