//! Expense command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{Database, ExpenseUpdate, NewExpense};

use super::{money, truncate};

/// Fields to change on an existing expense; `None` keeps the current value
#[derive(Debug, Default)]
pub struct ExpenseEdit {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    /// An empty string clears the category
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
}

pub fn cmd_expenses_list(db: &Database, owner: &str, limit: i64) -> Result<()> {
    let expenses = db.list_expenses(owner, limit.max(1), 0)?;

    if expenses.is_empty() {
        println!("No expenses recorded. Add one with:");
        println!("  tally expenses add \"Lunch\" --amount 1500 --category Food");
        return Ok(());
    }

    let total = db.count_expenses(owner)?;

    println!();
    println!("🧾 Recent Expenses ({} of {})", expenses.len(), total);
    println!("   ─────────────────────────────────────────────────────────────");

    for expense in expenses {
        println!(
            "   [{}] {} │ {:>14} │ {:<16} │ {}",
            expense.id,
            expense.date,
            money(expense.amount),
            truncate(expense.category_name(), 16),
            truncate(&expense.title, 30)
        );
    }

    Ok(())
}

/// Record an expense, returning its ID
pub fn cmd_expenses_add(
    db: &Database,
    owner: &str,
    title: &str,
    amount: Decimal,
    category: Option<String>,
    date: NaiveDate,
) -> Result<i64> {
    let expense = NewExpense {
        title: title.to_string(),
        amount,
        category,
        date,
    };

    let id = db
        .insert_expense(owner, &expense)
        .context("Failed to record expense")?;

    println!("✅ Recorded expense {}:", id);
    println!("   {} │ {} │ {}", date, money(amount), title.trim());

    Ok(id)
}

pub fn cmd_expenses_edit(db: &Database, owner: &str, id: i64, edit: ExpenseEdit) -> Result<()> {
    let current = db
        .get_expense(owner, id)?
        .ok_or_else(|| anyhow::anyhow!("Expense {} not found", id))?;

    let update = ExpenseUpdate {
        title: edit.title.unwrap_or(current.title),
        amount: edit.amount.unwrap_or(current.amount),
        category: match edit.category {
            Some(category) => Some(category),
            None => current.category,
        },
        date: edit.date.unwrap_or(current.date),
    };

    if !db
        .update_expense(owner, id, &update)
        .context("Failed to update expense")?
    {
        anyhow::bail!("Expense {} not found", id);
    }

    println!("✅ Updated expense {}:", id);
    println!(
        "   {} │ {} │ {}",
        update.date,
        money(update.amount),
        update.title.trim()
    );

    Ok(())
}

pub fn cmd_expenses_delete(db: &Database, owner: &str, id: i64) -> Result<()> {
    let expense = db
        .get_expense(owner, id)?
        .ok_or_else(|| anyhow::anyhow!("Expense {} not found", id))?;

    db.delete_expense(owner, id)?;

    println!("🗑️  Deleted expense {}:", id);
    println!(
        "   {} │ {} │ {}",
        expense.date,
        money(expense.amount),
        truncate(&expense.title, 40)
    );

    Ok(())
}
