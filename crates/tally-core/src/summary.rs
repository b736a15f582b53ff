//! Monthly spending aggregation
//!
//! Turns a user's expense records into an [`ExpenseSummary`]: current and
//! previous month totals, the month-over-month change, and the largest
//! categories this month. Reads only; absence of data yields zeros and
//! `None`, never an error.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::db::Database;
use crate::error::Result;
use crate::models::{CategoryTotal, ExpenseSummary, UNCATEGORIZED};

/// Maximum number of categories reported in a summary
pub const TOP_CATEGORY_LIMIT: usize = 5;

/// Decimal places for reported percentages
pub const PERCENT_SCALE: u32 = 2;

/// Calendar boundaries for "this month" and "last month" relative to a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// First day of the current month
    pub current_start: NaiveDate,
    /// First day of the previous month
    pub previous_start: NaiveDate,
    /// Last day of the previous month
    pub previous_end: NaiveDate,
}

impl MonthWindow {
    /// Compute the window for the month containing `today`
    pub fn containing(today: NaiveDate) -> Self {
        let current_start = today.with_day(1).unwrap_or(today);
        let previous_end = current_start - Duration::days(1);
        let previous_start = previous_end.with_day(1).unwrap_or(previous_end);

        Self {
            current_start,
            previous_start,
            previous_end,
        }
    }
}

/// Summarize an owner's spending as of `today`
pub fn summarize(db: &Database, owner: &str, today: NaiveDate) -> Result<ExpenseSummary> {
    let window = MonthWindow::containing(today);

    // Current month is open-ended: future-dated entries count towards it
    let this_month = db.sum_expense_amounts(owner, window.current_start, None)?;
    let last_month =
        db.sum_expense_amounts(owner, window.previous_start, Some(window.previous_end))?;
    let categories = db.category_totals(owner, window.current_start, None)?;

    let summary = build_summary(this_month, last_month, categories);

    tracing::debug!(
        owner,
        this_month = %summary.total_this_month,
        last_month = %summary.total_last_month,
        categories = summary.top_categories.len(),
        "Expense summary computed"
    );

    Ok(summary)
}

/// Pure arithmetic behind [`summarize`]
///
/// `categories` must already be sorted largest first, as returned by
/// [`Database::category_totals`].
pub fn build_summary(
    total_this_month: Decimal,
    total_last_month: Decimal,
    categories: Vec<(Option<String>, Decimal)>,
) -> ExpenseSummary {
    let top_categories = categories
        .into_iter()
        .take(TOP_CATEGORY_LIMIT)
        .map(|(name, total)| CategoryTotal {
            category: name.unwrap_or_else(|| UNCATEGORIZED.to_string()),
            percentage: share_of(total, total_this_month),
            total,
        })
        .collect();

    ExpenseSummary {
        total_this_month,
        total_last_month,
        percentage_change: percentage_change(total_this_month, total_last_month),
        top_categories,
    }
}

/// Month-over-month change in percent, or None when there is no baseline
pub fn percentage_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    let change = (current - previous) / previous * Decimal::ONE_HUNDRED;
    Some(change.round_dp(PERCENT_SCALE))
}

fn share_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(PERCENT_SCALE)
}
