//! Authentication-related handlers

use std::sync::Arc;

use axum::extract::Request;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::{get_user_email, AppState, API_KEY_USER, LOCAL_DEV_USER};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user's email or identifier
    pub user: String,
    /// How the user was authenticated
    pub auth_method: String,
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(State(state): State<Arc<AppState>>, request: Request) -> Json<MeResponse> {
    let user = get_user_email(request.headers());

    let auth_method = if user == API_KEY_USER {
        "api_key"
    } else if user == LOCAL_DEV_USER {
        "none"
    } else if state.config.require_auth {
        "cloudflare_header"
    } else {
        // Auth disabled but a CF header was sent anyway
        "unverified_header"
    };

    Json(MeResponse {
        user,
        auth_method: auth_method.to_string(),
    })
}
