//! Purchase (restock) endpoints

use super::{PageParams, PaginatedResponse};
use crate::domain::profile::Role;
use crate::domain::purchase::{NewPurchase, NewPurchaseItem, Purchase};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::Page;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseRequest {
    pub supplier: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "purchase must contain at least one item"))]
    pub items: Vec<PurchaseItemRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PurchaseItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: i64,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    req.validate()?;
    let purchase = state
        .purchases
        .record(NewPurchase {
            supplier: req.supplier,
            notes: req.notes,
            items: req
                .items
                .into_iter()
                .map(|i| NewPurchaseItem { product_id: i.product_id, quantity: i.quantity, unit_cost: i.unit_cost })
                .collect(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<Purchase>>, AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    let page = Page::clamped(params.offset, params.limit);
    let (data, total) = state.purchases.list(page).await?;
    Ok(Json(PaginatedResponse { data, total, offset: page.offset, limit: page.limit }))
}
