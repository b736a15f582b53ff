//! AI spending insights
//!
//! Entry points never fail: whatever goes wrong (store errors, missing
//! configuration, every backend call failing) the caller gets exactly three
//! non-empty strings, tagged with where they came from.

mod parsing;
mod pipeline;
mod prompt;

pub use parsing::{bullet_lines, parse_insights, FILLER_INSIGHTS, INSIGHT_COUNT};
pub use pipeline::{InsightPipeline, Tier, TierOutcome};
pub use prompt::{build_fallback_prompt, build_prompt, CURRENCY_SYMBOL};

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::ai::{GenerationClient, TextGenerator};
use crate::config::AiConfig;
use crate::db::Database;
use crate::error::Result;
use crate::summary::summarize;

/// Returned when nothing was spent this month
pub const ENCOURAGEMENT_INSIGHTS: [&str; INSIGHT_COUNT] = [
    "No expenses recorded this month - great job saving money!",
    "Consider setting up a budget to track your financial goals in Naira.",
    "Start tracking expenses to get personalized insights for Nigerian spending patterns.",
];

/// Returned when both generation calls fail
pub const HARD_CODED_TIPS: [&str; INSIGHT_COUNT] = [
    "Track your expenses daily in Naira",
    "Set a monthly budget in Nigerian Naira",
    "Review spending weekly for better financial planning",
];

/// Returned when insight generation fails outside the tiers
pub const UNAVAILABLE_INSIGHTS: [&str; INSIGHT_COUNT] = [
    "Unable to generate AI insights at the moment.",
    "Please review your spending categories manually.",
    "Consider setting a monthly budget to track your progress.",
];

/// Where a set of insights came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightSource {
    NoSpend,
    Primary,
    Secondary,
    HardCoded,
    Unavailable,
}

impl InsightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightSource::NoSpend => "no-spend",
            InsightSource::Primary => "primary",
            InsightSource::Secondary => "secondary",
            InsightSource::HardCoded => "hard-coded",
            InsightSource::Unavailable => "unavailable",
        }
    }

    /// Whether the text came from a model rather than canned strings
    pub fn is_generated(&self) -> bool {
        matches!(self, InsightSource::Primary | InsightSource::Secondary)
    }
}

impl fmt::Display for InsightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly three insight strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insights {
    #[serde(rename = "insights")]
    pub items: [String; INSIGHT_COUNT],
    pub source: InsightSource,
}

impl Insights {
    /// Parse generated text into insights
    pub fn from_text(text: &str, source: InsightSource) -> Self {
        Self {
            items: parse_insights(text),
            source,
        }
    }

    pub fn no_spend() -> Self {
        Self::canned(ENCOURAGEMENT_INSIGHTS, InsightSource::NoSpend)
    }

    pub fn hard_coded() -> Self {
        Self::canned(HARD_CODED_TIPS, InsightSource::HardCoded)
    }

    pub fn unavailable() -> Self {
        Self::canned(UNAVAILABLE_INSIGHTS, InsightSource::Unavailable)
    }

    fn canned(items: [&str; INSIGHT_COUNT], source: InsightSource) -> Self {
        Self {
            items: items.map(String::from),
            source,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

/// Generate insights for `owner` using the configured backend
///
/// The backend is only constructed once there is spending to analyse, so a
/// missing API key never matters for an empty month.
pub async fn generate_insights(
    db: &Database,
    owner: &str,
    today: NaiveDate,
    config: &AiConfig,
) -> Insights {
    let result = try_generate_insights(db, owner, today, config).await;
    safety_net(owner, result)
}

async fn try_generate_insights(
    db: &Database,
    owner: &str,
    today: NaiveDate,
    config: &AiConfig,
) -> Result<Insights> {
    let summary = summarize(db, owner, today)?;
    if summary.total_this_month.is_zero() {
        return Ok(Insights::no_spend());
    }
    let client = GenerationClient::from_config(config)?;
    Ok(InsightPipeline::new(&client).run(&summary).await)
}

/// Generate insights for `owner` with an existing generator
pub async fn generate_insights_with<G: TextGenerator + ?Sized>(
    db: &Database,
    owner: &str,
    today: NaiveDate,
    generator: &G,
) -> Insights {
    let result = match summarize(db, owner, today) {
        Ok(summary) => Ok(InsightPipeline::new(generator).run(&summary).await),
        Err(e) => Err(e),
    };

    safety_net(owner, result)
}

fn safety_net(owner: &str, result: Result<Insights>) -> Insights {
    match result {
        Ok(insights) => insights,
        Err(e) => {
            warn!(owner, error = %e, "Insight generation failed, using unavailable message");
            Insights::unavailable()
        }
    }
}
