//! Tally CLI - Expense tracker with AI spending insights
//!
//! Usage:
//!   tally init                        Initialize database
//!   tally expenses add Lunch -a 1500  Record an expense
//!   tally summary                     Month-over-month totals
//!   tally insights                    Three spending insights
//!   tally serve --port 3000           Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                static_dir.as_deref(),
                cli.config.as_deref(),
            )
            .await
        }
        Commands::Expenses { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_expenses_list(&db, &cli.user, 20),
                Some(ExpensesAction::List { limit }) => {
                    commands::cmd_expenses_list(&db, &cli.user, limit)
                }
                Some(ExpensesAction::Add {
                    title,
                    amount,
                    category,
                    date,
                }) => commands::cmd_expenses_add(
                    &db,
                    &cli.user,
                    &title,
                    amount,
                    category,
                    date.unwrap_or_else(commands::today),
                )
                .map(|_| ()),
                Some(ExpensesAction::Edit {
                    id,
                    title,
                    amount,
                    category,
                    date,
                }) => commands::cmd_expenses_edit(
                    &db,
                    &cli.user,
                    id,
                    commands::ExpenseEdit {
                        title,
                        amount,
                        category,
                        date,
                    },
                ),
                Some(ExpensesAction::Delete { id }) => {
                    commands::cmd_expenses_delete(&db, &cli.user, id)
                }
            }
        }
        Commands::Summary { today } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_summary(&db, &cli.user, today.unwrap_or_else(commands::today))
        }
        Commands::Insights { today, json } => {
            let db = commands::open_db(&cli.db)?;
            let ai = commands::load_ai_config(cli.config.as_deref())?;
            commands::cmd_insights(
                &db,
                &cli.user,
                today.unwrap_or_else(commands::today),
                &ai,
                json,
            )
            .await
        }
    }
}
