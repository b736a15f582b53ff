//! Prompt construction from an expense summary
//!
//! Both builders are pure: the same summary always yields the same prompt.

use std::fmt::Write;

use rust_decimal::Decimal;

use crate::models::ExpenseSummary;

/// Currency symbol used in prompts
pub const CURRENCY_SYMBOL: &str = "₦";

/// Number of categories listed in the full prompt
pub const PROMPT_CATEGORY_LIMIT: usize = 3;

const OPENING: &str =
    "I am a personal finance assistant. Please analyze this spending data in Nigerian Naira:";

const CLOSING: &str =
    "Provide 3 brief financial insights as bullet points using Nigerian Naira context.";

/// Build the full analysis prompt
pub fn build_prompt(summary: &ExpenseSummary) -> String {
    let mut prompt = format!(
        "{OPENING}\n\nThis month total: {CURRENCY_SYMBOL}{}\nLast month total: {CURRENCY_SYMBOL}{}\n\n",
        fixed(summary.total_this_month, 2),
        fixed(summary.total_last_month, 2),
    );

    if let Some(change) = summary.percentage_change {
        // Zero change reads as "decreased by 0.0%"
        let direction = if change > Decimal::ZERO {
            "increased"
        } else {
            "decreased"
        };
        let _ = writeln!(
            prompt,
            "Spending {} by {}%",
            direction,
            fixed(change.abs(), 1)
        );
    }

    if !summary.top_categories.is_empty() {
        prompt.push_str("\nTop categories:\n");
        for (i, category) in summary
            .top_categories
            .iter()
            .take(PROMPT_CATEGORY_LIMIT)
            .enumerate()
        {
            let _ = writeln!(
                prompt,
                "{}. {}: {CURRENCY_SYMBOL}{}",
                i + 1,
                category.category,
                fixed(category.total, 2)
            );
        }
    }

    prompt.push('\n');
    prompt.push_str(CLOSING);
    prompt
}

/// Build the minimal prompt used when the full prompt fails
///
/// Mentions only the current month's total, rounded to a whole amount.
pub fn build_fallback_prompt(summary: &ExpenseSummary) -> String {
    format!(
        "Give 3 tips for managing money when spending {CURRENCY_SYMBOL}{} per month in Nigeria.",
        fixed(summary.total_this_month, 0)
    )
}

/// Format with exactly `dp` decimal places, rounding half to even
fn fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp(dp);
    rounded.rescale(dp);
    rounded.to_string()
}
