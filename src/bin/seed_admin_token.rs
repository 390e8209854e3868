//! Seeds an admin token into the JSON token store.
//!
//! Run it before the first server start, or while the server is stopped: a
//! running server keeps the store in memory and its next token write replaces
//! the snapshot, dropping anything seeded behind its back.
//!
//! Usage:
//! ```bash
//! # Insert the default setup token into ./data/tokens.json
//! cargo run --bin seed-admin-token -- --data-file ./data/tokens.json
//!
//! # Custom token, replacing any existing record with the same value
//! cargo run --bin seed-admin-token -- --token my-admin-token --force
//! ```

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use image_moderation_api::{StoreConfig, TokenRecord, TokenStore, config::DEFAULT_BOOTSTRAP_DESCRIPTION};
use std::{env, path::PathBuf};
use tracing::{info, warn};

const DEFAULT_SEED_TOKEN: &str = "admin-token-12345";

#[derive(Parser)]
#[command(
    name = "seed-admin-token",
    about = "Insert an admin token into the Image Moderation API token store"
)]
struct SeedArgs {
    /// Token store snapshot (defaults to $DATA_FILE)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Token value to insert
    #[arg(long, default_value = DEFAULT_SEED_TOKEN)]
    token: String,

    /// Description stored with the token
    #[arg(long, default_value = DEFAULT_BOOTSTRAP_DESCRIPTION)]
    description: String,

    /// Overwrite an existing record with the same token, reactivating it
    #[arg(long)]
    force: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum SeedOutcome {
    Inserted,
    Replaced,
    AlreadyPresent,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = SeedArgs::parse();
    let token = args.token.clone();
    match run(args, env::var("DATA_FILE").ok())? {
        SeedOutcome::AlreadyPresent => {
            warn!("Token already exists; use --force to overwrite");
        }
        SeedOutcome::Inserted | SeedOutcome::Replaced => {
            println!("Database initialized with admin token: {token}");
        }
    }
    Ok(())
}

fn run(args: SeedArgs, env_data_file: Option<String>) -> Result<SeedOutcome> {
    let data_file = args
        .data_file
        .or_else(|| env_data_file.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .ok_or_else(|| anyhow!("No data file given; pass --data-file or set DATA_FILE"))?;

    let config = StoreConfig {
        data_file: Some(data_file.clone()),
        bootstrap_admin_token: None,
        ..StoreConfig::from_env()
    };
    let store = TokenStore::open(&config)
        .with_context(|| format!("Failed to open token store at {}", data_file.display()))?;
    let record = TokenRecord::new(args.token, true, Some(args.description));
    let hint = record.hint();

    let outcome = if args.force {
        store
            .upsert_token(record)
            .context("Failed to write admin token")?;
        SeedOutcome::Replaced
    } else if store
        .insert_token(record)
        .context("Failed to write admin token")?
    {
        SeedOutcome::Inserted
    } else {
        SeedOutcome::AlreadyPresent
    };

    info!(path = %data_file.display(), token_hint = %hint, outcome = ?outcome, "Admin token seed finished");
    Ok(outcome)
}
