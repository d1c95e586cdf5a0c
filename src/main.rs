use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use marginalia::annotations::{extract_from_item, format_markdown, FormatOptions};
use marginalia::capacities::{CapacitiesApi, CapacitiesClient};
use marginalia::config::{default_settings_path, SettingsStore};
use marginalia::library::{Item, ZoteroLibrary};
use marginalia::sync::{BatchOptions, ProcessedStore, SyncProgress, SyncService, Watcher};

#[derive(Parser, Debug)]
#[command(name = "marginalia")]
#[command(about = "Sync Zotero PDF annotations to Capacities", long_about = None)]
struct Cli {
    /// Settings file (default: ~/.marginalia/settings.json)
    #[arg(short = 'c', long = "config")]
    config_path: Option<PathBuf>,

    /// Zotero database (default: ~/Zotero/zotero.sqlite)
    #[arg(long)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync items to Capacities
    Sync {
        /// Item keys to sync; attachment and annotation keys resolve to
        /// their owning item
        keys: Vec<String>,
        /// Sync every top-level item in the library
        #[arg(long)]
        all: bool,
        /// Re-sync items already marked as processed
        #[arg(long)]
        force: bool,
    },
    /// Print the markdown for an item without submitting it
    Preview { key: String },
    /// List the spaces the configured token can access
    Spaces,
    /// Check that the configured credentials work
    Test,
    /// Append markdown to today's daily note
    DailyNote {
        text: Option<String>,
        /// Read the markdown from standard input
        #[arg(long)]
        stdin: bool,
        #[arg(long)]
        no_timestamp: bool,
    },
    /// Show configuration state and processed count
    Status,
    /// Remove one item from the processed set so it can sync again
    Forget { key: String },
    /// Clear the processed set
    Reset,
    /// Poll the library and auto-sync changed items
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marginalia=info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config_path {
        Some(path) => SettingsStore::load(path),
        None => SettingsStore::open_default(),
    };
    settings.apply(|s| {
        s.apply_env();
        if let Some(path) = &cli.library {
            s.library_path = Some(path.clone());
        }
    });

    match cli.command {
        Command::Sync { keys, all, force } => {
            if keys.is_empty() && !all {
                bail!("Provide item keys or --all");
            }

            let library = open_library(&settings).await?;
            let items = resolve_items(&library, &keys, all).await?;
            if items.is_empty() {
                println!("Nothing to sync.");
                return Ok(());
            }

            let client = CapacitiesClient::from_settings(&settings.get())?;
            let service = SyncService::new(&settings, &client);

            let options = BatchOptions {
                force,
                on_progress: Some(Box::new(|p: SyncProgress| {
                    println!(
                        "[{}/{}] {}",
                        p.current,
                        p.total,
                        p.current_item.as_deref().unwrap_or("")
                    );
                })),
                cancel: cancel_on_ctrl_c(),
            };

            let results = service.sync_many(&items, options).await;

            for result in &results {
                match (result.success, &result.error) {
                    (true, _) => println!("  ok    {}  {}", result.item_key, result.item_title),
                    (false, Some(error)) => println!("  fail  {}  {}", result.item_key, error),
                    (false, None) => {}
                }
            }
            let succeeded = results.iter().filter(|r| r.success).count();
            println!("{succeeded} of {} items synced.", results.len());
        }

        Command::Preview { key } => {
            let library = open_library(&settings).await?;
            let Some(item) = library.resolve_item(&key).await? else {
                bail!("Item not found: {key}");
            };
            let Some(data) = extract_from_item(&item) else {
                bail!("No PDF attachments or annotations found.");
            };
            let snapshot = settings.get();
            println!("{}", format_markdown(&data, &FormatOptions::from(&snapshot)));
        }

        Command::Spaces => {
            let client = CapacitiesClient::from_settings(&settings.get())?;
            for space in client.spaces().await? {
                println!("{}  {}", space.id, space.title);
            }
        }

        Command::Test => {
            let client = CapacitiesClient::from_settings(&settings.get())?;
            if client.test_connection().await {
                println!("Connection OK.");
            } else {
                bail!("Connection failed; check the API token.");
            }
        }

        Command::DailyNote {
            text,
            stdin,
            no_timestamp,
        } => {
            let md_text = if stdin {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                text.context("Provide text or --stdin")?
            };

            let client = CapacitiesClient::from_settings(&settings.get())?;
            client
                .save_to_daily_note(&md_text, no_timestamp.then_some(true))
                .await?;
            println!("Saved to daily note.");
        }

        Command::Status => {
            let snapshot = settings.get();
            let processed = ProcessedStore::new(&settings);
            println!(
                "Settings file:   {}",
                cli.config_path
                    .unwrap_or_else(default_settings_path)
                    .display()
            );
            println!("Library:         {}", snapshot.library_path().display());
            println!(
                "Configured:      {}",
                if snapshot.is_configured() {
                    "yes"
                } else {
                    "no (set api_token and space_id)"
                }
            );
            println!(
                "Processed items: {}",
                processed.stats().processed_count
            );
        }

        Command::Forget { key } => {
            ProcessedStore::new(&settings).remove(&key)?;
            println!("Removed {key} from the processed set.");
        }

        Command::Reset => {
            ProcessedStore::new(&settings).clear()?;
            println!("Cleared the processed set.");
        }

        Command::Watch { interval } => {
            let library = open_library(&settings).await?;
            let client = CapacitiesClient::from_settings(&settings.get())?;
            let service = SyncService::new(&settings, &client);
            let watcher = Watcher::new(&library, &service);

            watcher
                .run(Duration::from_secs(interval.max(1)), cancel_on_ctrl_c())
                .await?;
        }
    }

    Ok(())
}

async fn open_library(settings: &SettingsStore) -> Result<ZoteroLibrary> {
    let path = settings.get().library_path();
    ZoteroLibrary::open(&path)
        .await
        .with_context(|| format!("Failed to open Zotero library at {}", path.display()))
}

/// Resolve CLI keys (or the whole library) to loaded top-level items,
/// deduplicated in the given order
async fn resolve_items(
    library: &ZoteroLibrary,
    keys: &[String],
    all: bool,
) -> Result<Vec<Item>> {
    let top_keys = if all {
        library.top_level_item_keys().await?
    } else {
        let mut resolved = Vec::new();
        for key in keys {
            match library.top_level_key(key).await? {
                Some(top) => {
                    if !resolved.contains(&top) {
                        resolved.push(top);
                    }
                }
                None => eprintln!("Skipping unknown item key {key}"),
            }
        }
        resolved
    };

    let mut items = Vec::new();
    for key in &top_keys {
        if let Some(item) = library.item(key).await? {
            items.push(item);
        }
    }
    Ok(items)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    cancel
}
