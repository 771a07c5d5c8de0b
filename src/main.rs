// SPDX-License-Identifier: PMPL-1.0-or-later

//! msgledger: extract, reconcile, exchange and build translatable message
//! catalogs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use msgledger::config::CatalogConfig;
use msgledger::diagnostics;
use msgledger::reconcile::BatchSummary;
use msgledger::summary::{self, SummaryFormat};
use msgledger::types::ScanItem;
use msgledger::MessageManager;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "msgledger")]
#[command(version)]
#[command(about = "Translatable message catalogs with a tracked lifecycle")]
#[command(long_about = None)]
struct Cli {
    /// Catalog configuration (YAML or JSON)
    #[arg(short, long, global = true, default_value = "msgledger.yaml")]
    config: PathBuf,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan sources and merge messages into the store
    Scan {
        /// Add and update only; do not disable messages that were not found
        #[arg(long)]
        partial: bool,

        /// Scan this path instead of the configured scan list
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Extension filter for --path
        #[arg(long = "ext", value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Do not descend into subdirectories of --path
        #[arg(long)]
        no_recursive: bool,
    },

    /// Compile MO catalogs for every translatable locale and domain
    Build,

    /// Export messages that still need translating as PO
    ExportUntranslated {
        #[arg(short, long)]
        locale: String,

        /// Single domain (default: the default domain, or all with --zip)
        #[arg(short, long)]
        domain: Option<String>,

        /// Write a zip of {locale}-{domain}.po entries
        #[arg(long, value_name = "PATH")]
        zip: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a translated PO document
    Import {
        #[arg(value_name = "PO")]
        file: PathBuf,
    },

    /// Replace a domain's dynamic messages
    Dynamic {
        #[arg(short, long)]
        domain: String,

        #[arg(long, default_value = "")]
        context: String,

        #[arg(value_name = "MESSAGES", required = true)]
        messages: Vec<String>,
    },

    /// Render the in-JS translations as JSONP
    ExportJs {
        #[arg(short, long)]
        locale: String,

        #[arg(long, value_delimiter = ',')]
        domains: Option<Vec<String>>,

        #[arg(long)]
        callback: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lifecycle counts per locale and domain
    Summary {
        #[arg(short, long, value_enum, default_value = "text")]
        format: SummaryFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check configuration, catalog directory and store health
    Doctor,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_manager(path: &Path) -> Result<MessageManager> {
    let config = CatalogConfig::load(path)
        .with_context(|| format!("loading config {}", path.display()))?;
    MessageManager::open(config).context("opening message store")
}

fn write_or_print(output: Option<&Path>, payload: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, payload).with_context(|| format!("writing {}", path.display()))?;
            println!("Saved to: {}", path.display());
        }
        None => print!("{}", payload),
    }
    Ok(())
}

fn print_batch(title: &str, summary: &BatchSummary) {
    println!("\n{}", title.bold().yellow());
    println!("  Created:   {}", summary.created.to_string().green());
    println!("  Updated:   {}", summary.updated);
    println!("  Unchanged: {}", summary.unchanged);
    if summary.skipped > 0 {
        println!("  Skipped:   {}", summary.skipped);
    }
    if summary.failed > 0 {
        println!("  Failed:    {}", summary.failed.to_string().red().bold());
    }
}

fn persist(manager: &MessageManager) -> Result<()> {
    if !manager.persist().context("persisting message store")? {
        tracing::warn!("no store_path configured; changes were not saved");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            partial,
            path,
            extensions,
            no_recursive,
        } => {
            let mut manager = open_manager(&cli.config)?;
            let items = path.map(|path| {
                let mut item = ScanItem::new(path);
                if let Some(extensions) = extensions {
                    item = item.with_extensions(extensions);
                }
                if no_recursive {
                    item = item.non_recursive();
                }
                vec![item]
            });
            let summary = manager
                .extract_and_save(items.as_deref(), !partial)
                .context("scanning sources")?;
            print_batch("SCAN", &summary);
            persist(&manager)?;
        }

        Commands::Build => {
            let manager = open_manager(&cli.config)?;
            let outcomes = manager.build_all().context("building catalogs")?;
            println!("\n{}", "BUILD".bold().yellow());
            for outcome in &outcomes {
                let state = if outcome.written {
                    "written".green()
                } else {
                    "unchanged".normal()
                };
                println!(
                    "  {:<10} {:<20} {:>6} messages  {}  {}",
                    outcome.locale,
                    outcome.domain,
                    outcome.messages,
                    state,
                    outcome.path.display()
                );
                if let Some(removed) = &outcome.removed_previous {
                    println!("    removed {}", removed.display());
                }
            }
        }

        Commands::ExportUntranslated {
            locale,
            domain,
            zip,
            output,
        } => {
            let manager = open_manager(&cli.config)?;
            if let Some(zip_path) = zip {
                let domains = domain.map(|d| vec![d]);
                let written = manager
                    .export_untranslated_zip(&zip_path, &locale, domains.as_deref())
                    .context("writing untranslated archive")?;
                println!(
                    "Saved {} files to: {}",
                    written.len(),
                    zip_path.display()
                );
            } else {
                let domain = domain.unwrap_or_else(|| manager.config().default_domain.clone());
                let po = manager.export_untranslated(&locale, &domain)?;
                write_or_print(output.as_deref(), &po)?;
            }
        }

        Commands::Import { file } => {
            let mut manager = open_manager(&cli.config)?;
            let content = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let summary = manager
                .import_po(&content)
                .with_context(|| format!("importing {}", file.display()))?;
            print_batch("IMPORT", &summary);
            persist(&manager)?;
        }

        Commands::Dynamic {
            domain,
            context,
            messages,
        } => {
            let mut manager = open_manager(&cli.config)?;
            let summary = manager.save_dynamic(
                &domain,
                messages.into_iter().map(|m| (context.clone(), m)),
            )?;
            print_batch("DYNAMIC", &summary);
            persist(&manager)?;
        }

        Commands::ExportJs {
            locale,
            domains,
            callback,
            output,
        } => {
            let manager = open_manager(&cli.config)?;
            let js = manager.export_jsonp(&locale, domains.as_deref(), callback.as_deref())?;
            write_or_print(output.as_deref(), &js)?;
        }

        Commands::Summary { format, output } => {
            let manager = open_manager(&cli.config)?;
            let report = manager.summary();
            match (format, output) {
                (SummaryFormat::Text, None) => summary::print_summary(&report),
                (format, Some(path)) => {
                    summary::write_summary(&report, format, &path)?;
                    println!("Summary saved to: {}", path.display());
                }
                (format, None) => print!("{}", format.serialize(&report)?),
            }
        }

        Commands::Doctor => {
            let config = match CatalogConfig::load(&cli.config) {
                Ok(config) => Some(config),
                Err(err) => {
                    eprintln!("{} {}", "config:".red(), err);
                    None
                }
            };
            diagnostics::run_self_diagnostics(&cli.config, config.as_ref())?;
        }
    }

    Ok(())
}
