//! CLI argument definitions using clap
//!
//! The command implementations live in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Tally - Track expenses and get spending insights
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Self-hosted expense tracker with AI spending insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Identity that owns the expenses touched by local commands
    #[arg(long, default_value = "local-dev", global = true)]
    pub user: String,

    /// AI backend config file (defaults to the data directory's config/ai.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access authentication headers
        /// or an API key from TALLY_API_KEYS.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Manage expenses (list, add, edit, delete)
    Expenses {
        #[command(subcommand)]
        action: Option<ExpensesAction>,
    },

    /// Show this month's spending against last month
    Summary {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Generate three AI spending insights
    Insights {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ExpensesAction {
    /// List recent expenses, newest first
    List {
        /// Maximum number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Record a new expense
    Add {
        /// What the money was spent on
        title: String,

        /// Amount (up to 2 decimal places)
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Decimal,

        /// Category (omit for Uncategorized)
        #[arg(short, long)]
        category: Option<String>,

        /// Date spent (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Change fields of an existing expense
    Edit {
        /// Expense ID
        id: i64,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New amount
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Option<Decimal>,

        /// New category (empty string clears it)
        #[arg(short, long)]
        category: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: i64,
    },
}
