// SPDX-License-Identifier: PMPL-1.0-or-later

//! msgledger: translatable message catalogs with a tracked lifecycle.
//!
//! Messages are extracted from PHP, JavaScript and Vue sources, merged into
//! a per-(locale, domain) store and compiled into runtime catalogs. Every
//! record remembers where it was last seen (source files, scripts, runtime
//! generation) and is disabled once nothing claims it anymore; translations
//! survive the round trip.
//!
//! PIPELINE:
//! 1. **Extract**: scan sources for gettext-family calls ([`extract`]).
//! 2. **Reconcile**: merge into the store and retire unclaimed records
//!    ([`reconcile`], [`store`]).
//! 3. **Exchange**: export untranslated PO for translators and import their
//!    work back ([`export`], [`codec::po`]).
//! 4. **Build**: compile MO catalogs under revisioned names and JSONP
//!    bundles for scripts ([`builder`], [`revision`]).
//! 5. **Load**: resolve the revisioned names at runtime ([`locale`]).

pub mod builder;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod extract;
pub mod locale;
pub mod manager;
pub mod plural;
pub mod reconcile;
pub mod revision;
pub mod store;
pub mod summary;
pub mod types;

pub use error::{CatalogError, Result};
pub use manager::MessageManager;
