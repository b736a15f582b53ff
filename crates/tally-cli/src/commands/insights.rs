//! Summary and insight commands

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{generate_insights, summarize, AiConfig, Database, Insights, MonthWindow};

use super::money;

pub fn cmd_summary(db: &Database, owner: &str, today: NaiveDate) -> Result<()> {
    let summary = summarize(db, owner, today)?;
    let window = MonthWindow::containing(today);

    println!();
    println!("📊 Spending Summary ({})", window.current_start.format("%B %Y"));
    println!("   ─────────────────────────────");
    println!("   This month: {}", money(summary.total_this_month));
    println!("   Last month: {}", money(summary.total_last_month));
    match summary.percentage_change {
        Some(change) if change > Decimal::ZERO => {
            println!("   Change:     📈 +{}%", change)
        }
        Some(change) => println!("   Change:     📉 {}%", change),
        None => println!("   Change:     n/a (nothing spent last month)"),
    }

    if !summary.top_categories.is_empty() {
        println!();
        println!("   Top categories:");
        for (i, category) in summary.top_categories.iter().enumerate() {
            println!(
                "   {}. {:<20} {:>14}  ({}%)",
                i + 1,
                category.category,
                money(category.total),
                category.percentage
            );
        }
    }

    Ok(())
}

pub async fn cmd_insights(
    db: &Database,
    owner: &str,
    today: NaiveDate,
    ai: &AiConfig,
    json: bool,
) -> Result<()> {
    let insights = generate_insights(db, owner, today, ai).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    print_insights(&insights);
    Ok(())
}

fn print_insights(insights: &Insights) {
    println!();
    println!("💡 Spending Insights");
    println!("   ─────────────────────────────");
    for insight in insights.iter() {
        println!("   • {}", insight);
    }
    if !insights.source.is_generated() {
        println!();
        println!("   (source: {})", insights.source);
    }
}
