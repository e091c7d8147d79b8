use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use pantry_sync::reconcile::{SyncOptions, complete_list, sync_inventory_list};
use pantry_sync::store::ProductStore;
use pantry_sync::store::sqlite::SqliteStore;

#[derive(Parser)]
#[command(version, about = "Pantry Sync CLI")]
struct Cli {
    /// Path to a TOML config file. Falls back to PANTRY_DATABASE_URL /
    /// PANTRY_USER_ID when omitted.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Reconcile the inventory list against the product inventory.
    Sync {
        /// Compute and print the diff without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Finish a shopping trip: uncheck items and restock checked products.
    Complete {
        /// List to complete. Defaults to the inventory list.
        #[arg(long, value_name = "LIST_ID")]
        list: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = pantry_sync::config::load(cli.config.as_deref())?;

    pantry_sync::db::migrate::run(&cfg.database_url)?;
    let mut store = SqliteStore::open(&cfg.database_url)?;

    match cli.cmd {
        Cmd::Sync { dry_run } => {
            let products = store.products_by_user(&cfg.user_id, true)?;
            let report = sync_inventory_list(
                &mut store,
                &products,
                &cfg.inventory_list_id,
                SyncOptions { dry_run },
                Utc::now(),
            )?;
            println!("{}", report.diff);
        }
        Cmd::Complete { list } => {
            let list_id = list.as_deref().unwrap_or(&cfg.inventory_list_id);
            let report = complete_list(&mut store, list_id, Utc::now())?;
            println!("{report}");
        }
    }

    Ok(())
}
