//! Tally Core Library
//!
//! Shared functionality for the Tally expense tracker:
//! - Database access and migrations (expenses, audit log)
//! - Monthly spending aggregation
//! - Pluggable text-generation backends (Gemini, OpenAI-compatible, mock)
//! - Insight pipeline with layered fallbacks
//! - AI backend configuration

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod models;
pub mod summary;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    GeminiBackend, GenerationClient, MockBackend, MockReply, OpenAICompatibleBackend,
    ServiceError, TextGenerator,
};
pub use config::{AiConfig, BackendKind};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use insights::{
    generate_insights, generate_insights_with, InsightPipeline, InsightSource, Insights, Tier,
    TierOutcome,
};
pub use models::{CategoryTotal, Expense, ExpenseSummary, ExpenseUpdate, NewExpense};
pub use summary::{summarize, MonthWindow};
