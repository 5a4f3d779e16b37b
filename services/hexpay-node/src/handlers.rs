use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use hexpay_core::{
    GeofenceStore, Merchant, MerchantStatus, MerchantUpdate, NewMerchant, StoreError,
    ValidationResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Merchant as returned by the API
#[derive(Debug, Serialize)]
pub struct MerchantResponse {
    pub id: i64,
    pub merchant_id: String,
    pub merchant_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<String>,
    pub status: MerchantStatus,
    pub notes: Option<String>,
    pub h3_indices: Vec<String>,
    pub h3_resolution: u8,
    pub created_at: u64,
    pub updated_at: Option<u64>,
}

impl From<Merchant> for MerchantResponse {
    fn from(merchant: Merchant) -> Self {
        MerchantResponse {
            h3_indices: merchant.geofence.cell_strings(),
            h3_resolution: merchant.geofence.resolution().value(),
            id: merchant.id,
            merchant_id: merchant.merchant_id,
            merchant_name: merchant.merchant_name,
            phone: merchant.phone,
            email: merchant.email,
            address: merchant.address,
            business_type: merchant.business_type,
            status: merchant.status,
            notes: merchant.notes,
            created_at: merchant.created_at,
            updated_at: merchant.updated_at,
        }
    }
}

/// Geofence payload consumed by the customer page
#[derive(Debug, Serialize)]
pub struct H3DataResponse {
    pub h3_indices: Vec<String>,
    pub h3_resolution: u8,
    pub merchant_id: String,
    pub merchant_name: String,
}

impl From<Merchant> for H3DataResponse {
    fn from(merchant: Merchant) -> Self {
        H3DataResponse {
            h3_indices: merchant.geofence.cell_strings(),
            h3_resolution: merchant.geofence.resolution().value(),
            merchant_id: merchant.merchant_id,
            merchant_name: merchant.merchant_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub merchant_id: String,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "hexpay-node",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn create_merchant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewMerchant>,
) -> Result<(StatusCode, Json<MerchantResponse>), ApiError> {
    let merchant = state.store()?.create_merchant(payload)?;
    info!(merchant_id = %merchant.merchant_id, "Merchant registered");
    Ok((StatusCode::CREATED, Json(merchant.into())))
}

pub async fn list_merchants(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MerchantResponse>>, ApiError> {
    let merchants = state.store()?.list_merchants(page.skip, page.limit)?;
    Ok(Json(merchants.into_iter().map(Into::into).collect()))
}

pub async fn get_merchant(
    State(state): State<Arc<AppState>>,
    Path(merchant_id): Path<String>,
) -> Result<Json<MerchantResponse>, ApiError> {
    let merchant = state.store()?.get_merchant(&merchant_id)?;
    Ok(Json(merchant.into()))
}

pub async fn update_merchant(
    State(state): State<Arc<AppState>>,
    Path(merchant_id): Path<String>,
    Json(update): Json<MerchantUpdate>,
) -> Result<Json<MerchantResponse>, ApiError> {
    let merchant = state.store()?.update_merchant(&merchant_id, update)?;
    Ok(Json(merchant.into()))
}

pub async fn delete_merchant(
    State(state): State<Arc<AppState>>,
    Path(merchant_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store()?.delete_merchant(&merchant_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn merchant_h3_data(
    State(state): State<Arc<AppState>>,
    Path(merchant_id): Path<String>,
) -> Result<Json<H3DataResponse>, ApiError> {
    let merchant = state.store()?.get_merchant(&merchant_id)?;
    Ok(Json(merchant.into()))
}

pub async fn latest_h3_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<H3DataResponse>, ApiError> {
    let merchant = state
        .store()?
        .latest_merchant()?
        .ok_or_else(|| ApiError::NotFound("No merchants registered".to_string()))?;
    Ok(Json(merchant.into()))
}

pub async fn validate_location(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<ValidationResult>, ApiError> {
    let geofence = state.store()?.load(&request.merchant_id)?.ok_or_else(|| {
        StoreError::MerchantNotFound {
            merchant_id: request.merchant_id.clone(),
        }
    })?;

    let result = state
        .validator
        .validate(&geofence, request.latitude, request.longitude)?;

    info!(
        merchant_id = %request.merchant_id,
        candidate = %result.candidate_cell,
        is_valid = result.is_valid,
        "Location checked"
    );
    Ok(Json(result))
}
