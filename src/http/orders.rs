//! Order endpoints

use super::{PageParams, PaginatedResponse};
use crate::domain::order::{NewOrder, NewOrderItem, Order};
use crate::domain::profile::Role;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::Page;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
    pub payment_method: String,
    pub shipping_address: Option<String>,
    pub shipping_method: Option<String>,
    #[validate(length(min = 1, message = "buyer name is required"))]
    pub nombre: String,
    #[validate(email(message = "invalid buyer email"))]
    pub email: String,
    pub telefono: Option<String>,
    pub observaciones: Option<String>,
    pub total: i64,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

impl CreateOrderRequest {
    fn into_draft(self) -> NewOrder {
        NewOrder {
            user_id: self.user_id,
            payment_method: self.payment_method,
            shipping_address: self.shipping_address,
            shipping_method: self.shipping_method,
            customer_name: self.nombre,
            customer_email: self.email,
            customer_phone: self.telefono,
            notes: self.observaciones,
            total: self.total,
            items: self
                .items
                .into_iter()
                .map(|i| NewOrderItem { product_id: i.product_id, quantity: i.quantity, unit_price: i.price })
                .collect(),
        }
    }
}

/// Guest checkout is allowed: no role gate on creation.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    req.validate()?;
    let order = state.orders.place(req.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedResponse<Order>>, AppError> {
    state.gate.require_role(&headers, &[Role::Admin, Role::Reseller]).await?;
    let page = Page::clamped(params.offset, params.limit);
    let (data, total) = state.orders.list(page).await?;
    Ok(Json(PaginatedResponse { data, total, offset: page.offset, limit: page.limit }))
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    state.gate.require_role(&headers, &[Role::Admin, Role::Reseller]).await?;
    Ok(Json(state.orders.get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn set_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    Ok(Json(state.orders.set_status(id, &req.status).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    state.orders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
