//! Current-user profile endpoint

use crate::domain::profile::Profile;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.gate.resolve_profile(&headers).await?))
}
