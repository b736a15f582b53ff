//! Insight handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{get_user_email, AppState};
use tally_core::insights::{generate_insights, Insights};

/// Query parameters for insights
///
/// `today` is kept as raw text so a malformed date cannot turn into a 400.
#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    pub today: Option<String>,
}

impl InsightsQuery {
    /// Parsed reference day, or the server's local date when absent or malformed
    pub fn resolve(&self) -> NaiveDate {
        self.today
            .as_deref()
            .and_then(|raw| match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(day) => Some(day),
                Err(e) => {
                    debug!(today = raw, error = %e, "Ignoring malformed insights date");
                    None
                }
            })
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// GET /api/insights - Three AI-generated spending insights
///
/// Always 200: generation failures degrade to canned text inside the
/// pipeline, a malformed `today` falls back to the local date, and an
/// audit write failure is only logged.
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InsightsQuery>,
    request: Request,
) -> Json<Insights> {
    let owner = get_user_email(request.headers());
    let today = params.resolve();

    let insights = generate_insights(&state.db, &owner, today, &state.ai).await;

    if let Err(e) = state.db.log_audit(
        &owner,
        "get",
        Some("insights"),
        None,
        Some(&format!("today={}, source={}", today, insights.source)),
    ) {
        warn!(error = %e, "Failed to audit insights request");
    }

    Json(insights)
}
