mod commands;
mod config;
mod study;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use study_core::Item;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::ListOptions;
use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "study", about = "Flashcard study lists", version)]
struct Cli {
    /// Config file (default: <config dir>/study-cards/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Default)]
struct Flags {
    /// Show readings on the card
    #[arg(long)]
    hint_readings: Option<bool>,
    /// Show the example sentence on the card
    #[arg(long)]
    hint_examples: Option<bool>,
    /// Add reversed cards after the first pass
    #[arg(long)]
    reversed: Option<bool>,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty list file
    New {
        file: PathBuf,
        /// List name
        name: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
        #[command(flatten)]
        flags: Flags,
    },

    /// Append an item
    Add {
        file: PathBuf,
        phrase: String,
        meanings: String,
        #[arg(long)]
        readings: Option<String>,
        /// Example sentence in the studied language
        #[arg(long)]
        example: Option<String>,
        /// Translation of the example sentence
        #[arg(long)]
        translation: Option<String>,
    },

    /// Append items from a tab-separated file
    Import { file: PathBuf, tsv: PathBuf },

    /// Print items as tab-separated lines
    Export { file: PathBuf },

    /// Show list settings and items
    Show {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Change list name or flags
    Set {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        flags: Flags,
    },

    /// Remove the item at an index
    Remove { file: PathBuf, index: usize },

    /// Zero all statistics
    Reset { file: PathBuf },

    /// Study interactively
    Run {
        /// List file (default: configured default list)
        file: Option<PathBuf>,
        /// RNG seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many answers
        #[arg(long)]
        limit: Option<u32>,
    },
}

fn init_tracing(config: &CliConfig) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn options(name: Option<String>, flags: Flags) -> ListOptions {
    ListOptions {
        name,
        hint_readings: flags.hint_readings,
        hint_examples: flags.hint_examples,
        reversed: flags.reversed,
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.command {
        Command::New {
            file,
            name,
            force,
            flags,
        } => {
            commands::new_list(&file, &name, &options(None, flags), force)?;
            println!("Created {}", file.display());
        }
        Command::Add {
            file,
            phrase,
            meanings,
            readings,
            example,
            translation,
        } => {
            let mut item = Item::new(phrase, meanings);
            item.readings = readings;
            item.example_source = example;
            item.example_dest = translation;
            let index = commands::add_item(&file, item)?;
            println!("Added item {index}");
        }
        Command::Import { file, tsv } => {
            let count = commands::import_items(&file, &tsv)?;
            println!("Imported {count} items");
        }
        Command::Export { file } => commands::export_items(&file, &mut std::io::stdout())?,
        Command::Show { file, json } => commands::show(&file, json, &mut std::io::stdout())?,
        Command::Set { file, name, flags } => {
            if !commands::set_options(&file, &options(name, flags))? {
                println!("Nothing changed");
            }
        }
        Command::Remove { file, index } => {
            let item = commands::remove_item(&file, index)?;
            println!("Removed {}", item.phrase);
        }
        Command::Reset { file } => commands::reset(&file)?,
        Command::Run { file, seed, limit } => {
            let file = file
                .or_else(|| config.default_list.clone())
                .ok_or_else(|| anyhow!("no list file given and no default list configured"))?;
            commands::run(&file, &config, seed, limit)?;
        }
    }
    Ok(())
}
