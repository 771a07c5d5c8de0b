// SPDX-License-Identifier: PMPL-1.0-or-later

//! `msgledger doctor`: environment and configuration self-checks

use crate::config::{CatalogConfig, MO_DIRECTORY_ENV, STORE_ENV};
use crate::plural::has_explicit_rule;
use crate::revision::RevisionTracker;
use crate::store::MemoryRepository;
use anyhow::{anyhow, Result};
use colored::*;
use std::env;
use std::path::Path;

pub fn run_self_diagnostics(config_path: &Path, config: Option<&CatalogConfig>) -> Result<()> {
    println!("msgledger self-diagnostics");

    let checks = collect(config_path, config);

    println!();
    for entry in &checks {
        entry.print();
    }

    if checks.iter().any(|entry| entry.level == Level::Error) {
        Err(anyhow!("self-diagnostics reported issues"))
    } else {
        Ok(())
    }
}

/// Every check, in print order. `config` is `None` when loading failed.
pub fn collect(config_path: &Path, config: Option<&CatalogConfig>) -> Vec<Diagnostic> {
    let mut checks = vec![Diagnostic::ok(
        "version",
        format!("msgledger {}", env!("CARGO_PKG_VERSION")),
    )];

    let Some(config) = config else {
        checks.push(Diagnostic::error(
            "config",
            format!("{} could not be loaded", config_path.display()),
        ));
        return checks;
    };
    checks.push(Diagnostic::ok(
        "config",
        format!(
            "{} ({} locales, {} domains)",
            config_path.display(),
            config.locales.len(),
            config.all_domains().len()
        ),
    ));

    checks.push(check_directory("catalog directory", &config.mo_directory));
    checks.push(check_revisions(config));
    checks.push(check_store(config));
    checks.extend(check_plural_rules(config));
    checks.push(check_override("mo directory override", MO_DIRECTORY_ENV));
    checks.push(check_override("store override", STORE_ENV));
    checks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Ok,
    Warn,
    Error,
}

impl Level {
    fn tag(&self) -> ColoredString {
        match self {
            Level::Ok => "OK".green(),
            Level::Warn => "WARN".yellow(),
            Level::Error => "ERR".red(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub label: &'static str,
    pub level: Level,
    pub detail: String,
}

impl Diagnostic {
    fn new(label: &'static str, level: Level, detail: String) -> Self {
        Self {
            label,
            level,
            detail,
        }
    }

    fn ok(label: &'static str, detail: String) -> Self {
        Self::new(label, Level::Ok, detail)
    }

    fn warning(label: &'static str, detail: String) -> Self {
        Self::new(label, Level::Warn, detail)
    }

    fn error(label: &'static str, detail: String) -> Self {
        Self::new(label, Level::Error, detail)
    }

    fn print(&self) {
        println!("  [{}] {:22} {}", self.level.tag(), self.label, self.detail);
    }
}

fn check_directory(label: &'static str, path: &Path) -> Diagnostic {
    if path.is_dir() {
        Diagnostic::ok(label, format!("{} exists", path.display()))
    } else if path.exists() {
        Diagnostic::error(
            label,
            format!("{} exists but is not a directory", path.display()),
        )
    } else {
        Diagnostic::error(
            label,
            format!(
                "{} missing (create with mkdir -p {})",
                path.display(),
                path.display()
            ),
        )
    }
}

fn check_revisions(config: &CatalogConfig) -> Diagnostic {
    let tracker = RevisionTracker::new(config.mo_directory.clone());
    let path = tracker.path();
    if !path.exists() {
        return if config.use_revisions {
            Diagnostic::warning("revisions", format!("{} not written yet (run build)", path.display()))
        } else {
            Diagnostic::ok("revisions", "disabled".to_string())
        };
    }
    match tracker.load_strict() {
        Ok(map) => Diagnostic::ok(
            "revisions",
            format!("{} locales tracked", map.len()),
        ),
        Err(err) => Diagnostic::error("revisions", format!("{}", err)),
    }
}

fn check_store(config: &CatalogConfig) -> Diagnostic {
    let Some(path) = &config.store_path else {
        return Diagnostic::warning(
            "message store",
            "no store_path configured (records are not kept between runs)".to_string(),
        );
    };
    if !path.exists() {
        return Diagnostic::warning(
            "message store",
            format!("{} missing (created by the first scan)", path.display()),
        );
    }
    match MemoryRepository::open(path) {
        Ok(repository) => Diagnostic::ok(
            "message store",
            format!("{} records in {}", repository.len(), path.display()),
        ),
        Err(err) => Diagnostic::error("message store", format!("{}", err)),
    }
}

fn check_plural_rules(config: &CatalogConfig) -> Vec<Diagnostic> {
    config
        .translatable_locales()
        .filter(|locale| !has_explicit_rule(locale))
        .map(|locale| {
            Diagnostic::warning(
                "plural rules",
                format!("{} has no known rule; using nplurals=2", locale),
            )
        })
        .collect()
}

fn check_override(label: &'static str, env_key: &str) -> Diagnostic {
    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => {
            Diagnostic::ok(label, format!("{}={}", env_key, value))
        }
        _ => Diagnostic::ok(label, format!("not set ({})", env_key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_config_is_an_error() {
        let checks = collect(Path::new("nope.yaml"), None);
        assert!(checks.iter().any(|c| c.level == Level::Error));
    }

    #[test]
    fn broken_revisions_file_is_reported() {
        let dir = TempDir::new().expect("temp dir should create");
        fs::write(dir.path().join("revisions.json"), "{ not json").expect("write");
        let config = CatalogConfig::new(&["en_US", "lv_LV"], "app", &[], dir.path())
            .with_revisions(true);
        let checks = collect(Path::new("msgledger.yaml"), Some(&config));
        let revisions = checks
            .iter()
            .find(|c| c.label == "revisions")
            .expect("revisions check runs");
        assert_eq!(revisions.level, Level::Error);
    }

    #[test]
    fn unknown_plural_rule_warns() {
        let dir = TempDir::new().expect("temp dir should create");
        let config = CatalogConfig::new(&["en_US", "xx_YY"], "app", &[], dir.path());
        let checks = collect(Path::new("msgledger.yaml"), Some(&config));
        assert!(checks
            .iter()
            .any(|c| c.label == "plural rules" && c.level == Level::Warn));
        assert!(!checks.iter().any(|c| c.level == Level::Error));
    }
}
