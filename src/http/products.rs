//! Product endpoints
//!
//! Listing serves three projections: the public catalog, the cost-price list
//! for the back office and resellers, and the derived price list for a
//! requested margin.

use super::PaginatedResponse;
use crate::domain::pricing;
use crate::domain::product::{CatalogView, CostView, NewProduct, Product, ProductPatch, Sku};
use crate::domain::profile::Role;
use crate::error::AppError;
use crate::services::UploadedImage;
use crate::state::AppState;
use crate::store::Page;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

const MAX_IMAGES_ON_CREATE: usize = 1;
const MAX_IMAGES_ON_UPDATE: usize = 5;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub modo: Option<String>,
    pub margen: Option<u32>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct PriceListEntry {
    id: Uuid,
    sku: Option<String>,
    name: String,
    price: i64,
}

async fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    matches!(state.gate.authenticate(headers).await, Ok(user) if user.role == Role::Admin)
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let page = Page::clamped(params.offset, params.limit);
    let (products, total) = state.products.list(page).await?;

    match params.modo.as_deref() {
        None => {
            if is_admin(&state, &headers).await {
                return Ok(Json(PaginatedResponse { data: products, total, offset: page.offset, limit: page.limit })
                    .into_response());
            }
            let data: Vec<CatalogView> = products.iter().map(CatalogView::from).collect();
            Ok(Json(PaginatedResponse { data, total, offset: page.offset, limit: page.limit }).into_response())
        }
        Some("costosPrivados") => {
            state.gate.require_role(&headers, &[Role::Admin, Role::Reseller]).await?;
            let data: Vec<CostView> = products.iter().map(CostView::from).collect();
            Ok(Json(PaginatedResponse { data, total, offset: page.offset, limit: page.limit }).into_response())
        }
        Some("lista") => {
            // derived from cost prices, so gated like the cost projection
            state.gate.require_role(&headers, &[Role::Admin, Role::Reseller]).await?;
            let margin = params.margen.unwrap_or(0);
            let data: Vec<PriceListEntry> = products
                .iter()
                .map(|p| PriceListEntry {
                    id: p.id,
                    sku: p.sku.clone(),
                    name: p.name.clone(),
                    price: pricing::list_price(p, margin),
                })
                .collect();
            Ok(Json(PaginatedResponse { data, total, offset: page.offset, limit: page.limit }).into_response())
        }
        Some(other) => Err(AppError::Validation(format!("unknown modo: {other}"))),
    }
}

fn shaped(product: Product, admin: bool) -> Response {
    if admin {
        Json(product).into_response()
    } else {
        Json(CatalogView::from(&product)).into_response()
    }
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let product = state.products.get(id).await?;
    Ok(shaped(product, is_admin(&state, &headers).await))
}

pub async fn by_sku(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(sku): Path<String>,
) -> Result<Response, AppError> {
    let product = state.products.by_sku(&sku).await?;
    Ok(shaped(product, is_admin(&state, &headers).await))
}

/// Multipart form collected into text fields plus attached images.
struct ProductForm {
    fields: HashMap<String, String>,
    images: Vec<UploadedImage>,
}

async fn collect_form(mut multipart: Multipart, max_images: usize) -> Result<ProductForm, AppError> {
    let mut fields = HashMap::new();
    let mut images = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name().map(ToString::to_string) {
            if images.len() >= max_images {
                return Err(AppError::Validation(format!("at most {max_images} image(s) allowed")));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("unreadable image field: {e}")))?;
            images.push(UploadedImage { filename, bytes: bytes.to_vec() });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("unreadable field {name}: {e}")))?;
            fields.insert(name, value);
        }
    }
    Ok(ProductForm { fields, images })
}

fn parse_field<T: FromStr>(fields: &HashMap<String, String>, key: &str) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    match fields.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Validation(format!("invalid {key}: {e}"))),
    }
}

fn sku_field(fields: &HashMap<String, String>) -> Result<Option<Sku>, AppError> {
    match fields.get("sku").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => Sku::new(raw).map(Some).map_err(|e| AppError::Validation(e.to_string())),
    }
}

fn text_field(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    fields.get(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    let form = collect_form(multipart, MAX_IMAGES_ON_CREATE).await?;

    let new = NewProduct {
        sku: sku_field(&form.fields)?,
        name: text_field(&form.fields, "name")
            .ok_or_else(|| AppError::Validation("product name is required".into()))?,
        description: text_field(&form.fields, "description"),
        price: parse_field(&form.fields, "price")?
            .ok_or_else(|| AppError::Validation("price is required".into()))?,
        cost_price: parse_field(&form.fields, "cost_price")?,
        override_price: parse_field(&form.fields, "override_price")?,
        stock: parse_field(&form.fields, "stock")?.unwrap_or(0),
        category: text_field(&form.fields, "category"),
        image_urls: Vec::new(),
    };

    let product = state.products.create(new, form.images).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Product>, AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    let form = collect_form(multipart, MAX_IMAGES_ON_UPDATE).await?;

    let patch = ProductPatch {
        sku: sku_field(&form.fields)?,
        name: text_field(&form.fields, "name"),
        description: text_field(&form.fields, "description"),
        price: parse_field(&form.fields, "price")?,
        cost_price: parse_field(&form.fields, "cost_price")?,
        override_price: parse_field(&form.fields, "override_price")?,
        stock: parse_field(&form.fields, "stock")?,
        category: text_field(&form.fields, "category"),
        add_image_urls: Vec::new(),
    };

    let product = state.products.update(id, patch, form.images).await?;
    Ok(Json(product))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.gate.require_role(&headers, &[Role::Admin]).await?;
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
