//! This module implements the CLI interface for scripture-import: command
//! parsing, writer selection and user-visible output.
//!
//! All decomposition and orchestration logic lives in the [`scripture-import-core`] crate.
//! This module is strictly for CLI glue.
//!
//! ## How To Use
//! - For command-line users: use the installed `scripture-import` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`scripture-import-core`]: ../../scripture-import-core/

use crate::firestore::FirestoreClient;
use crate::jsonl::JsonlStore;
use crate::load_config::{load_config, CliConfig, StoreSection};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scripture_import_core::contract::RecordWriter;
use scripture_import_core::import::{import_all_with_progress, WorkProgress};
use scripture_import_core::memory::MemoryStore;
use scripture_import_core::verses::extract_verses;
use std::path::PathBuf;

/// CLI for scripture-import: load markdown scripture trees into a document store.
#[derive(Parser)]
#[clap(
    name = "scripture-import",
    version,
    about = "Import works, books, chapters and verses from markdown folders into a document store"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import every work listed in the config file
    Import {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Decompose and link everything in memory without writing to the configured store
        #[clap(long)]
        dry_run: bool,
    },
    /// Print the verses found in one chapter file as JSON
    Verses {
        /// Chapter markdown file
        file: PathBuf,
    },
}

async fn build_writer(store: &StoreSection) -> Result<Box<dyn RecordWriter>> {
    let writer: Box<dyn RecordWriter> = match store {
        StoreSection::Firestore(section) => Box::new(
            FirestoreClient::new_from_env(section)
                .map_err(|e| anyhow::anyhow!("Failed to construct Firestore client: {e}"))?,
        ),
        StoreSection::Jsonl { output_dir } => Box::new(
            JsonlStore::new(output_dir)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open JSONL store: {e}"))?,
        ),
    };
    Ok(writer)
}

fn print_progress(progress: WorkProgress<'_>) {
    match progress {
        WorkProgress::Started(work) => println!("Importing {work}…"),
        WorkProgress::Finished(report) => println!("{} imported", report.name),
    }
}

async fn import(config: CliConfig, dry_run: bool) -> Result<()> {
    config.import.trace_loaded();
    println!("Import starting...");

    if dry_run {
        tracing::info!(command = "import", "Dry run: writing to memory only");
        let store = MemoryStore::new();
        let report = import_all_with_progress(
            &store,
            &config.source_root,
            config.works.as_slice(),
            &config.import,
            print_progress,
        )
        .await?;
        let names = &config.import.collections;
        println!("Dry run complete.\nReport:");
        println!("{:#?}", report);
        for collection in [&names.work, &names.book, &names.chapter, &names.verse] {
            println!("{collection}: {} records", store.count(collection));
        }
        return Ok(());
    }

    let writer = build_writer(&config.store).await?;
    let report = import_all_with_progress(
        writer.as_ref(),
        &config.source_root,
        config.works.as_slice(),
        &config.import,
        print_progress,
    )
    .await
        .map_err(|e| {
            tracing::error!(command = "import", error = %e, "Import failed");
            e
        })?;
    tracing::info!(command = "import", verses = report.total_verses(), "Import complete");
    println!("Import complete.\nReport:");
    println!("{:#?}", report);
    Ok(())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Import { config, dry_run } => {
            let config = load_config(config)?;
            import(config, dry_run).await
        }
        Commands::Verses { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read chapter file {}", file.display()))?;
            let verses = extract_verses(&text);
            println!("{}", serde_json::to_string_pretty(&verses)?);
            Ok(())
        }
    }
}
