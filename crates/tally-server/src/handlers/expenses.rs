//! Expense handlers
//!
//! All operations are scoped to the requesting identity: another user's
//! expense is indistinguishable from a missing one (404).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{get_user_email, AppError, AppState, SuccessResponse, MAX_BODY_SIZE, MAX_PAGE_LIMIT};
use tally_core::models::{Expense, ExpenseSummary, ExpenseUpdate, NewExpense};
use tally_core::summary::summarize;

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

/// Paginated expense list
#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query parameters for date-relative endpoints
#[derive(Debug, Deserialize)]
pub struct TodayQuery {
    /// Reference day (YYYY-MM-DD); defaults to the server's local date
    pub today: Option<NaiveDate>,
}

impl TodayQuery {
    pub fn resolve(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Map store validation failures to 400, everything else to 500
fn store_error(err: tally_core::Error) -> AppError {
    match err {
        tally_core::Error::InvalidData(msg) => AppError::bad_request(&msg),
        other => other.into(),
    }
}

/// Read and parse a JSON body from a request we also took headers from
async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// GET /api/expenses - List the user's expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
    request: Request,
) -> Result<Json<ExpenseListResponse>, AppError> {
    let owner = get_user_email(request.headers());
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let expenses = state.db.list_expenses(&owner, limit, offset)?;
    let total = state.db.count_expenses(&owner)?;

    state.db.log_audit(
        &owner,
        "list",
        Some("expense"),
        None,
        Some(&format!("limit={}, offset={}, count={}", limit, offset, expenses.len())),
    )?;

    Ok(Json(ExpenseListResponse {
        expenses,
        total,
        limit,
        offset,
    }))
}

/// POST /api/expenses - Record a new expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let owner = get_user_email(request.headers());
    let new_expense: NewExpense = read_json(request).await?;

    let id = state
        .db
        .insert_expense(&owner, &new_expense)
        .map_err(store_error)?;

    state.db.log_audit(
        &owner,
        "create",
        Some("expense"),
        Some(id),
        Some(&format!("amount={}", new_expense.amount)),
    )?;

    let expense = state
        .db
        .get_expense(&owner, id)?
        .ok_or_else(|| AppError::not_found(&format!("Expense {} not found", id)))?;

    Ok(Json(expense))
}

/// GET /api/expenses/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let owner = get_user_email(request.headers());

    let expense = state
        .db
        .get_expense(&owner, id)?
        .ok_or_else(|| AppError::not_found(&format!("Expense {} not found", id)))?;

    state
        .db
        .log_audit(&owner, "get", Some("expense"), Some(id), None)?;

    Ok(Json(expense))
}

/// PUT /api/expenses/:id - Replace an expense's fields
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let owner = get_user_email(request.headers());
    let update: ExpenseUpdate = read_json(request).await?;

    let updated = state
        .db
        .update_expense(&owner, id, &update)
        .map_err(store_error)?;
    if !updated {
        return Err(AppError::not_found(&format!("Expense {} not found", id)));
    }

    state
        .db
        .log_audit(&owner, "update", Some("expense"), Some(id), None)?;

    let expense = state
        .db
        .get_expense(&owner, id)?
        .ok_or_else(|| AppError::not_found(&format!("Expense {} not found", id)))?;

    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = get_user_email(request.headers());

    if !state.db.delete_expense(&owner, id)? {
        return Err(AppError::not_found(&format!("Expense {} not found", id)));
    }

    state
        .db
        .log_audit(&owner, "delete", Some("expense"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/expenses/summary - Month-over-month spending summary
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TodayQuery>,
    request: Request,
) -> Result<Json<ExpenseSummary>, AppError> {
    let owner = get_user_email(request.headers());
    let today = params.resolve();

    let summary = summarize(&state.db, &owner, today)?;

    state.db.log_audit(
        &owner,
        "get",
        Some("summary"),
        None,
        Some(&format!("today={}", today)),
    )?;

    Ok(Json(summary))
}
