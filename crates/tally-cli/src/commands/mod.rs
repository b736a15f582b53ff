//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db, config loading) and `init`
//! - `expenses` - Expense commands (list, add, edit, delete)
//! - `insights` - Summary and insight commands
//! - `serve` - Web server command

pub mod core;
pub mod expenses;
pub mod insights;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use expenses::*;
pub use insights::*;
pub use serve::*;

use rust_decimal::Decimal;
use tally_core::insights::CURRENCY_SYMBOL;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount in Naira with two decimal places
pub fn money(amount: Decimal) -> String {
    format!("{}{:.2}", CURRENCY_SYMBOL, amount)
}
