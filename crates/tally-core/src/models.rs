//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Display name for expenses recorded without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Number of decimal places stored for amounts
pub const AMOUNT_SCALE: u32 = 2;

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    /// Authenticated identity the expense belongs to
    pub owner: String,
    pub title: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Category name for display, substituting "Uncategorized" when absent
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// New expense for insertion
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    pub date: NaiveDate,
}

impl NewExpense {
    /// Validate user input and normalise an empty category to `None`
    pub fn validated(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidData("Title is required".into()));
        }
        check_amount(self.amount)?;

        Ok(Self {
            title,
            amount: self.amount,
            category: normalize_category(self.category),
            date: self.date,
        })
    }
}

/// Replacement values for an existing expense
pub type ExpenseUpdate = NewExpense;

/// Empty or whitespace-only categories are stored as NULL
pub fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(Error::InvalidData(format!(
            "Amount {} has more than {} decimal places",
            amount, AMOUNT_SCALE
        )));
    }
    amount_to_cents(amount).map(|_| ())
}

/// Convert an amount into integer minor units for storage
pub fn amount_to_cents(amount: Decimal) -> Result<i64> {
    amount
        .round_dp(AMOUNT_SCALE)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| Error::InvalidData(format!("Amount {} is out of range", amount)))
}

/// Convert stored minor units back into a two-place decimal
pub fn cents_to_amount(cents: i64) -> Decimal {
    Decimal::new(cents, AMOUNT_SCALE)
}

/// Spending in one category for the current month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    /// Share of this month's total, rounded to 2 decimal places
    pub percentage: Decimal,
}

/// Month-over-month spending summary, computed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total_this_month: Decimal,
    pub total_last_month: Decimal,
    /// None when last month's total is zero
    pub percentage_change: Option<Decimal>,
    /// At most five categories, largest first
    pub top_categories: Vec<CategoryTotal>,
}

impl ExpenseSummary {
    /// Summary for a user with no recorded spending
    pub fn empty() -> Self {
        Self {
            total_this_month: Decimal::ZERO,
            total_last_month: Decimal::ZERO,
            percentage_change: None,
            top_categories: vec![],
        }
    }
}
