// SPDX-License-Identifier: PMPL-1.0-or-later

//! Store summary: lifecycle counts per (locale, domain)
//!
//! Rendered as a terminal table or serialized as JSON/YAML for tooling.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::store::MessageRepository;
use clap::ValueEnum;
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Counts for one (locale, domain) scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSummary {
    pub locale: String,
    pub domain: String,
    pub total: usize,
    pub enabled: usize,
    pub translated: usize,
    pub requires_translating: usize,
    pub in_js: usize,
    pub dynamic: usize,
}

impl ScopeSummary {
    pub fn disabled(&self) -> usize {
        self.total - self.enabled
    }

    /// Share of enabled messages that are translated, 0-100
    pub fn coverage(&self) -> f64 {
        if self.enabled == 0 {
            return 100.0;
        }
        self.translated as f64 * 100.0 / self.enabled as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub created_at: String,
    pub default_locale: String,
    pub total_records: usize,
    pub total_requires_translating: usize,
    pub scopes: Vec<ScopeSummary>,
}

/// Summarize every translatable locale × configured domain.
pub fn summarize<R: MessageRepository>(repository: &R, config: &CatalogConfig) -> CatalogSummary {
    let mut scopes = Vec::new();
    for locale in config.translatable_locales() {
        for domain in config.all_domains() {
            let all = repository.get_all(locale, &domain);
            let enabled: Vec<_> = all.iter().filter(|r| !r.is_disabled).collect();
            scopes.push(ScopeSummary {
                locale: locale.to_string(),
                domain,
                total: all.len(),
                enabled: enabled.len(),
                translated: enabled.iter().filter(|r| r.has_original_translation).count(),
                requires_translating: enabled.iter().filter(|r| r.requires_translating).count(),
                in_js: enabled.iter().filter(|r| r.is_in_js).count(),
                dynamic: enabled.iter().filter(|r| r.is_dynamic).count(),
            });
        }
    }

    CatalogSummary {
        created_at: chrono::Utc::now().to_rfc3339(),
        default_locale: config.default_locale.clone(),
        total_records: scopes.iter().map(|s| s.total).sum(),
        total_requires_translating: scopes.iter().map(|s| s.requires_translating).sum(),
        scopes,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
    Yaml,
}

impl SummaryFormat {
    pub fn serialize(&self, summary: &CatalogSummary) -> Result<String> {
        match self {
            SummaryFormat::Text => Ok(render_table(summary)),
            SummaryFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            SummaryFormat::Yaml => Ok(serde_yaml::to_string(summary)?),
        }
    }
}

/// Plain table, no colors
pub fn render_table(summary: &CatalogSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<20} {:>6} {:>8} {:>10} {:>8} {:>6} {:>8}\n",
        "Locale", "Domain", "Total", "Enabled", "Translated", "Pending", "JS", "Dynamic"
    ));
    out.push_str(&format!("{}\n", "-".repeat(82)));
    for scope in &summary.scopes {
        out.push_str(&format!(
            "{:<10} {:<20} {:>6} {:>8} {:>10} {:>8} {:>6} {:>8}\n",
            scope.locale,
            scope.domain,
            scope.total,
            scope.enabled,
            scope.translated,
            scope.requires_translating,
            scope.in_js,
            scope.dynamic,
        ));
    }
    out
}

/// Print the summary table to the terminal
pub fn print_summary(summary: &CatalogSummary) {
    println!("\n{}", "=== CATALOG SUMMARY ===".bold().cyan());
    println!(
        "Records: {}  |  Awaiting translation: {}  |  Source locale: {}",
        summary.total_records, summary.total_requires_translating, summary.default_locale
    );
    println!();

    if summary.scopes.is_empty() {
        println!("  No translatable locales configured.");
        return;
    }

    println!(
        "  {:<10} {:<20} {:>6} {:>8} {:>9} {:>8} {:>6} {:>8}",
        "Locale", "Domain", "Total", "Disabled", "Coverage", "Pending", "JS", "Dynamic"
    );
    println!("  {}", "-".repeat(82));
    for scope in &summary.scopes {
        let coverage = format!("{:>8.1}%", scope.coverage());
        let coverage = if scope.requires_translating == 0 {
            coverage.green()
        } else if scope.coverage() >= 50.0 {
            coverage.yellow()
        } else {
            coverage.red()
        };
        println!(
            "  {:<10} {:<20} {:>6} {:>8} {} {:>8} {:>6} {:>8}",
            scope.locale,
            scope.domain,
            scope.total,
            scope.disabled(),
            coverage,
            scope.requires_translating,
            scope.in_js,
            scope.dynamic,
        );
    }
    println!();
}

pub fn write_summary(summary: &CatalogSummary, format: SummaryFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    let payload = format.serialize(summary)?;
    fs::write(path, payload).map_err(|e| CatalogError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;
    use crate::types::MessageRecord;

    fn record(key: &str, translated: bool, disabled: bool) -> MessageRecord {
        MessageRecord {
            key: key.into(),
            locale: "lv_LV".into(),
            domain: "app".into(),
            original: key.into(),
            translation: if translated { "x".into() } else { String::new() },
            has_original_translation: translated,
            requires_translating: !translated,
            is_in_file: !disabled,
            is_in_js: key == "js",
            is_disabled: disabled,
            ..MessageRecord::default()
        }
    }

    #[test]
    fn counts_follow_lifecycle_flags() {
        let repo = MemoryRepository::from_records(vec![
            record("a", true, false),
            record("js", true, false),
            record("b", false, false),
            record("old", false, true),
        ]);
        let config = CatalogConfig::new(&["en_US", "lv_LV"], "app", &[], "/tmp");
        let summary = summarize(&repo, &config);

        assert_eq!(summary.scopes.len(), 1);
        let scope = &summary.scopes[0];
        assert_eq!(scope.total, 4);
        assert_eq!(scope.enabled, 3);
        assert_eq!(scope.disabled(), 1);
        assert_eq!(scope.translated, 2);
        assert_eq!(scope.requires_translating, 1);
        assert_eq!(scope.in_js, 1);
        assert_eq!(summary.total_requires_translating, 1);
    }

    #[test]
    fn formats_serialize() {
        let config = CatalogConfig::new(&["en_US", "lv_LV"], "app", &["emails"], "/tmp");
        let summary = summarize(&MemoryRepository::new(), &config);
        let json = SummaryFormat::Json.serialize(&summary).expect("json");
        assert!(json.contains("\"domain\": \"emails\""));
        let table = SummaryFormat::Text.serialize(&summary).expect("text");
        assert_eq!(table.lines().count(), 4);
    }
}
