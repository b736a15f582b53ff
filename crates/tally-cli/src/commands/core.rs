//! Core command implementations and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::{AiConfig, Database};

/// Open (creating if needed) the database and run migrations
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Resolve AI backend configuration from defaults, the config file and environment
pub fn load_ai_config(config_path: Option<&Path>) -> Result<AiConfig> {
    AiConfig::load(config_path).context("Failed to load AI backend configuration")
}

/// Local calendar date, used when --today/--date are omitted
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record an expense: tally expenses add \"Lunch\" --amount 1500 --category Food");
    println!("  2. Get insights: GEMINI_API_KEY=... tally insights");
    println!("  3. Start web UI: tally serve");

    Ok(())
}
