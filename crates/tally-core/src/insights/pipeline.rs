//! Tiered insight generation
//!
//! The pipeline is a small state machine. Each tier either produces text or
//! reports itself exhausted, and an exhausted tier hands over to the next:
//!
//! ```text
//! Primary ──exhausted──▶ Secondary ──exhausted──▶ HardCoded
//!    │                      │
//!    └──text──▶ parse ◀─────┘
//! ```
//!
//! A call is exhausted when it errors (transport, status, timeout, blocked)
//! or returns text that is blank after trimming. Each tier makes at most one
//! call, so a request costs at most two calls.

use std::fmt;

use tracing::{debug, warn};

use crate::ai::{ServiceError, TextGenerator};
use crate::models::ExpenseSummary;

use super::prompt::{build_fallback_prompt, build_prompt};
use super::{InsightSource, Insights};

/// One step in the fallback sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Full prompt built from the summary
    Primary,
    /// Minimal prompt with only the monthly total
    Secondary,
    /// Canned tips; no call
    HardCoded,
}

impl Tier {
    /// The tier tried after this one is exhausted
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Primary => Some(Tier::Secondary),
            Tier::Secondary => Some(Tier::HardCoded),
            Tier::HardCoded => None,
        }
    }

    /// Source label for insights produced by this tier
    pub fn source(self) -> InsightSource {
        match self {
            Tier::Primary => InsightSource::Primary,
            Tier::Secondary => InsightSource::Secondary,
            Tier::HardCoded => InsightSource::HardCoded,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::HardCoded => "hard-coded",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running a single tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    /// The call succeeded with non-blank text
    Text(String),
    /// The call failed or produced nothing usable
    Exhausted,
}

/// Drives a summary through the tiers against one text generator
pub struct InsightPipeline<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
}

impl<'a, G: TextGenerator + ?Sized> InsightPipeline<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// Produce exactly three insights for `summary`
    ///
    /// A summary with no spending this month short-circuits to the
    /// encouragement messages without calling the generator.
    pub async fn run(&self, summary: &ExpenseSummary) -> Insights {
        if summary.total_this_month.is_zero() {
            debug!("No spending this month, skipping generation");
            return Insights::no_spend();
        }

        match self.resolve(summary).await {
            (tier, TierOutcome::Text(text)) => Insights::from_text(&text, tier.source()),
            (_, TierOutcome::Exhausted) => Insights::hard_coded(),
        }
    }

    /// Run the calling tiers and return the first usable text
    ///
    /// `Exhausted` means both calls failed and the caller should fall back
    /// to the hard-coded tips.
    pub async fn attempt(&self, summary: &ExpenseSummary) -> TierOutcome {
        self.resolve(summary).await.1
    }

    /// Call once with the full prompt
    pub async fn primary_tier(&self, summary: &ExpenseSummary) -> TierOutcome {
        self.call(Tier::Primary, &build_prompt(summary)).await
    }

    /// Call once with the minimal prompt
    pub async fn secondary_tier(&self, summary: &ExpenseSummary) -> TierOutcome {
        self.call(Tier::Secondary, &build_fallback_prompt(summary)).await
    }

    async fn resolve(&self, summary: &ExpenseSummary) -> (Tier, TierOutcome) {
        let mut tier = Tier::Primary;
        loop {
            let outcome = match tier {
                Tier::Primary => self.primary_tier(summary).await,
                Tier::Secondary => self.secondary_tier(summary).await,
                Tier::HardCoded => return (tier, TierOutcome::Exhausted),
            };

            match (outcome, tier.next()) {
                (TierOutcome::Text(text), _) => return (tier, TierOutcome::Text(text)),
                (TierOutcome::Exhausted, Some(next)) => {
                    debug!(from = %tier, to = %next, "Tier exhausted, falling back");
                    tier = next;
                }
                (TierOutcome::Exhausted, None) => return (tier, TierOutcome::Exhausted),
            }
        }
    }

    async fn call(&self, tier: Tier, prompt: &str) -> TierOutcome {
        let result = self
            .generator
            .generate(prompt)
            .await
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(ServiceError::EmptyResponse)
                } else {
                    Ok(text)
                }
            });

        match result {
            Ok(text) => {
                debug!(
                    tier = %tier,
                    model = %self.generator.model(),
                    chars = text.len(),
                    "Generation succeeded"
                );
                TierOutcome::Text(text)
            }
            Err(e) => {
                warn!(
                    tier = %tier,
                    model = %self.generator.model(),
                    error = %e,
                    "Generation failed"
                );
                TierOutcome::Exhausted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, MockReply};
    use crate::insights::{ENCOURAGEMENT_INSIGHTS, FILLER_INSIGHTS, HARD_CODED_TIPS};
    use crate::models::CategoryTotal;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn summary() -> ExpenseSummary {
        ExpenseSummary {
            total_this_month: dec("150"),
            total_last_month: dec("200"),
            percentage_change: Some(dec("-25.00")),
            top_categories: vec![CategoryTotal {
                category: "Food".into(),
                total: dec("150"),
                percentage: dec("100.00"),
            }],
        }
    }

    fn assert_three_non_empty(insights: &Insights) {
        assert_eq!(insights.items.len(), 3);
        assert!(insights.items.iter().all(|s| !s.trim().is_empty()));
    }

    #[test]
    fn test_tier_sequence() {
        assert_eq!(Tier::Primary.next(), Some(Tier::Secondary));
        assert_eq!(Tier::Secondary.next(), Some(Tier::HardCoded));
        assert_eq!(Tier::HardCoded.next(), None);
    }

    #[tokio::test]
    async fn test_primary_success() {
        let mock = MockBackend::with_replies(vec![MockReply::text("• A\n- B\n* C\n• D")]);
        let insights = InsightPipeline::new(&mock).run(&summary()).await;

        assert_eq!(insights.source, InsightSource::Primary);
        assert_eq!(insights.items, ["A", "B", "C"].map(String::from));
        assert_eq!(mock.call_count(), 1);
        assert!(mock.prompts()[0].contains("This month total: ₦150.00"));
    }

    #[tokio::test]
    async fn test_primary_failure_uses_secondary_prompt() {
        let mock = MockBackend::with_replies(vec![
            MockReply::fail("503"),
            MockReply::text("• Only one"),
        ]);
        let insights = InsightPipeline::new(&mock).run(&summary()).await;

        assert_eq!(insights.source, InsightSource::Secondary);
        assert_eq!(insights.items[0], "Only one");
        assert_eq!(insights.items[1], FILLER_INSIGHTS[0]);
        assert_eq!(insights.items[2], FILLER_INSIGHTS[1]);

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(
            prompts[1],
            "Give 3 tips for managing money when spending ₦150 per month in Nigeria."
        );
    }

    #[tokio::test]
    async fn test_blank_primary_text_counts_as_failure() {
        let mock = MockBackend::with_replies(vec![
            MockReply::text("   \n "),
            MockReply::text("• fallback"),
        ]);
        let insights = InsightPipeline::new(&mock).run(&summary()).await;
        assert_eq!(insights.source, InsightSource::Secondary);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_both_calls_fail_gives_hard_coded_tips() {
        let mock = MockBackend::with_replies(vec![MockReply::Timeout, MockReply::fail("down")]);
        let insights = InsightPipeline::new(&mock).run(&summary()).await;

        assert_eq!(insights.source, InsightSource::HardCoded);
        assert_eq!(insights.items, HARD_CODED_TIPS.map(String::from));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_secondary_gives_hard_coded_tips() {
        let mock = MockBackend::with_replies(vec![MockReply::Empty, MockReply::Empty]);
        let insights = InsightPipeline::new(&mock).run(&summary()).await;
        assert_eq!(insights.source, InsightSource::HardCoded);
    }

    #[tokio::test]
    async fn test_few_bullets_do_not_trigger_secondary() {
        let mock = MockBackend::with_replies(vec![MockReply::text("No bullets here.")]);
        let insights = InsightPipeline::new(&mock).run(&summary()).await;

        assert_eq!(insights.source, InsightSource::Primary);
        assert_eq!(insights.items, FILLER_INSIGHTS.map(String::from));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_spend_makes_no_calls() {
        let mock = MockBackend::new();
        let insights = InsightPipeline::new(&mock).run(&ExpenseSummary::empty()).await;

        assert_eq!(insights.source, InsightSource::NoSpend);
        assert_eq!(insights.items, ENCOURAGEMENT_INSIGHTS.map(String::from));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_attempt_and_individual_tiers() {
        let mock = MockBackend::with_replies(vec![
            MockReply::fail("x"),
            MockReply::text("• second"),
            MockReply::text("• direct"),
            MockReply::fail("y"),
        ]);
        let pipeline = InsightPipeline::new(&mock);

        assert_eq!(
            pipeline.attempt(&summary()).await,
            TierOutcome::Text("• second".into())
        );
        assert_eq!(
            pipeline.primary_tier(&summary()).await,
            TierOutcome::Text("• direct".into())
        );
        assert_eq!(
            pipeline.secondary_tier(&summary()).await,
            TierOutcome::Exhausted
        );
    }

    #[tokio::test]
    async fn test_every_outcome_has_three_insights() {
        let scripts = vec![
            vec![MockReply::text(DEFAULT_REPLY)],
            vec![MockReply::text("garbage without bullets")],
            vec![MockReply::fail("a"), MockReply::text("-")],
            vec![MockReply::fail("a"), MockReply::fail("b")],
        ];
        for script in scripts {
            let mock = MockBackend::with_replies(script);
            let insights = InsightPipeline::new(&mock).run(&summary()).await;
            assert_three_non_empty(&insights);
            assert!(mock.call_count() <= 2);
        }
    }

    const DEFAULT_REPLY: &str = crate::ai::DEFAULT_MOCK_RESPONSE;
}
