// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end: scan sources, exchange PO with translators, build catalogs
//! and load them back.

use msgledger::codec::po;
use msgledger::config::CatalogConfig;
use msgledger::types::{ScanItem, Translation, TranslationSet};
use msgledger::{CatalogError, MessageManager};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const PAGE: &str = r#"<?php
// Greeting shown on the landing page
echo gettext('Hello');
echo dgettext('emails', 'Welcome');
printf(ngettext('%d apple', '%d apples', $count), $count);
"#;

const SCRIPT: &str = r#"
const label = gettext("Script text");
"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().expect("temp dir should create");
    fs::create_dir_all(dir.path().join("src/assets")).expect("source dirs create");
    fs::create_dir_all(dir.path().join("locale")).expect("catalog dir creates");
    fs::write(dir.path().join("src/page.php"), PAGE).expect("php source writes");
    fs::write(dir.path().join("src/assets/app.js"), SCRIPT).expect("js source writes");
    dir
}

fn config(root: &Path, revisions: bool) -> CatalogConfig {
    let mut config = CatalogConfig::new(&["en_US", "lv_LV"], "app", &["emails"], root.join("locale"))
        .with_revisions(revisions);
    config.store_path = Some(root.join("store.json"));
    config.scan.push(ScanItem::new(root.join("src")));
    config
}

fn translate_app(manager: &mut MessageManager, hello: &str) {
    let mut translated = TranslationSet::new("lv_LV", "app");
    translated.insert(Translation::new("", "Hello").with_translation(hello));
    translated.insert(Translation::new("", "Script text").with_translation("Skripta teksts"));
    translated.insert(
        Translation::new("", "%d apple")
            .with_plural("%d apples")
            .with_translation("%d ābols")
            .with_plural_translations(["%d ābols", "%d āboli", "%d ābolu"]),
    );
    manager
        .import_po(&po::encode(&translated))
        .expect("translations import");
}

#[test]
fn scan_routes_messages_by_domain() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    let summary = manager.extract_and_save(None, true).expect("scan runs");
    assert_eq!(summary.created, 4);

    let app = manager.reconciler().get_all("lv_LV", "app");
    let originals: Vec<&str> = app.iter().map(|r| r.original.as_str()).collect();
    assert!(originals.contains(&"Hello"));
    assert!(originals.contains(&"%d apple"));
    assert!(originals.contains(&"Script text"));

    let hello = app.iter().find(|r| r.original == "Hello").expect("hello record");
    assert_eq!(hello.extracted_comments, vec!["Greeting shown on the landing page"]);
    assert!(!hello.is_in_js);
    let script = app.iter().find(|r| r.original == "Script text").expect("script record");
    assert!(script.is_in_js);

    let emails = manager.reconciler().get_all("lv_LV", "emails");
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].original, "Welcome");
    assert!(manager.reconciler().get_all("en_US", "app").is_empty());
}

#[test]
fn store_snapshot_survives_reopen() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");
    assert!(manager.persist().expect("snapshot writes"));

    let reopened = MessageManager::open(config(dir.path(), false)).expect("manager reopens");
    assert_eq!(reopened.repository().len(), manager.repository().len());
}

#[test]
fn untranslated_zip_has_one_entry_per_domain() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");

    let zip_path = dir.path().join("untranslated.zip");
    let written = manager
        .export_untranslated_zip(&zip_path, "lv_LV", None)
        .expect("archive writes");
    assert_eq!(written, vec!["lv_LV-emails.po", "lv_LV-app.po"]);

    let mut archive =
        zip::ZipArchive::new(File::open(&zip_path).expect("archive opens")).expect("archive reads");
    let mut content = String::new();
    archive
        .by_name("lv_LV-emails.po")
        .expect("emails entry")
        .read_to_string(&mut content)
        .expect("entry reads");
    assert!(content.contains("msgid \"Welcome\""));
}

#[test]
fn translated_catalog_loads_at_runtime() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");

    let exported = manager
        .export_untranslated("lv_LV", "app")
        .expect("untranslated export");
    let untranslated = po::decode(&exported).expect("exported PO decodes");
    assert_eq!((untranslated.locale.as_str(), untranslated.domain.as_str()), ("lv_LV", "app"));
    assert_eq!(untranslated.len(), 3);

    translate_app(&mut manager, "Sveiki");

    let pending = manager.reconciler().get_requires_translating("lv_LV", "app");
    assert!(pending.is_empty(), "{:?}", pending);

    let outcomes = manager.build_all().expect("catalogs build");
    assert_eq!(outcomes.len(), 2);
    assert!(dir.path().join("locale/lv_LV/LC_MESSAGES/app.mo").is_file());

    let translator = manager.load_locale("lv_LV").expect("locale loads");
    assert_eq!(translator.gettext("Hello"), "Sveiki");
    assert_eq!(translator.ngettext("%d apple", "%d apples", 2), "%d āboli");
    assert_eq!(translator.dgettext("emails", "Welcome"), "Welcome");

    let js = manager.export_jsonp("lv_LV", None, None).expect("jsonp renders");
    assert!(js.starts_with("gettextJsonp("));
    assert!(js.contains("Skripta teksts"));
    assert!(!js.contains("Sveiki"));
}

#[test]
fn revisioned_build_replaces_previous_catalog() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), true)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");
    translate_app(&mut manager, "Sveiki");

    let first = manager
        .build("lv_LV", "app")
        .expect("first build")
        .expect("lv_LV is translatable");
    assert!(first.written);
    assert!(first.catalog_domain.starts_with("app-"));
    assert!(first.path.is_file());
    assert_eq!(manager.get_revisioned_domain("lv_LV", "app"), first.catalog_domain);

    let again = manager
        .build("lv_LV", "app")
        .expect("repeat build")
        .expect("lv_LV is translatable");
    assert!(!again.written);
    assert_eq!(again.path, first.path);

    translate_app(&mut manager, "Labdien");
    let second = manager
        .build("lv_LV", "app")
        .expect("second build")
        .expect("lv_LV is translatable");
    assert_ne!(second.catalog_domain, first.catalog_domain);
    assert_eq!(second.removed_previous.as_deref(), Some(first.path.as_path()));
    assert!(!first.path.exists());

    let translator = manager.load_locale("lv_LV").expect("locale loads");
    assert_eq!(translator.gettext("Hello"), "Labdien");
}

#[test]
fn default_locale_is_never_built() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");
    assert!(manager.build("en_US", "app").expect("build call").is_none());
    assert!(!dir.path().join("locale/en_US").exists());
}

#[test]
fn import_rejects_unconfigured_scope() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");

    let mut set = TranslationSet::new("fr_FR", "app");
    set.insert(Translation::new("", "Hello").with_translation("Bonjour"));
    assert!(matches!(
        manager.import_po(&po::encode(&set)),
        Err(CatalogError::UnsupportedLocale(_))
    ));

    let mut set = TranslationSet::new("lv_LV", "billing");
    set.insert(Translation::new("", "Hello").with_translation("Sveiki"));
    assert!(matches!(
        manager.import_po(&po::encode(&set)),
        Err(CatalogError::UnsupportedDomain(_))
    ));
}

#[test]
fn unregistered_extension_in_filter_fails() {
    let dir = workspace();
    fs::write(dir.path().join("src/notes.txt"), "gettext('x')").expect("txt writes");
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    let items = [ScanItem::new(dir.path().join("src")).with_extensions(["php", "txt"])];
    assert!(matches!(
        manager.extract_and_save(Some(&items), true),
        Err(CatalogError::UnknownExtractor { .. })
    ));
}

#[test]
fn dynamic_messages_are_exported_for_translation() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager
        .save_dynamic("emails", [("subject", "Invoice ready"), ("", "Receipt")])
        .expect("dynamic flush");

    let po = manager
        .export_untranslated("lv_LV", "emails")
        .expect("untranslated export");
    assert!(po.contains("msgctxt \"subject\""));
    assert!(po.contains("msgid \"Receipt\""));
    assert!(matches!(
        manager.save_dynamic("emails", Vec::<(String, String)>::new()),
        Err(CatalogError::MissingMessages)
    ));
}

#[test]
fn partial_plural_stays_pending_through_export_and_reimport() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");

    let mut partial = TranslationSet::new("lv_LV", "app");
    partial.insert(
        Translation::new("", "%d apple")
            .with_plural("%d apples")
            .with_translation("%d ābols")
            .with_plural_translations(["%d ābols", "%d āboli", ""]),
    );
    manager.import_po(&po::encode(&partial)).expect("partial import");

    let apple = |manager: &MessageManager| {
        manager
            .reconciler()
            .get_all("lv_LV", "app")
            .into_iter()
            .find(|r| r.original == "%d apple")
            .expect("apple record")
    };
    assert!(apple(&manager).requires_translating);

    let exported = manager
        .export_untranslated("lv_LV", "app")
        .expect("untranslated export");
    assert!(exported.contains("msgstr[2] \"\"\n"));
    manager.import_po(&exported).expect("unchanged export imports");

    let record = apple(&manager);
    assert!(record.requires_translating);
    assert_eq!(record.plural_translations, vec!["%d ābols", "%d āboli", ""]);
}

#[test]
fn import_rejects_out_of_range_plural_index() {
    let dir = workspace();
    let mut manager = MessageManager::open(config(dir.path(), false)).expect("manager opens");
    manager.extract_and_save(None, true).expect("scan runs");

    let document = "msgid \"\"\nmsgstr \"\"\n\"Language: lv_LV\\n\"\n\"X-Domain: app\\n\"\n\n\
                    msgid \"%d apple\"\nmsgid_plural \"%d apples\"\nmsgstr[18446744073709551615] \"x\"\n";
    assert!(matches!(
        manager.import_po(document),
        Err(CatalogError::MalformedCatalog(_))
    ));
    assert_eq!(manager.reconciler().get_requires_translating("lv_LV", "app").len(), 3);
}
