use axum::{ extract::{ Path, State }, http::StatusCode, Json };
use sea_orm::prelude::Decimal;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::error::Result;
use crate::scraper::ProductRef;
use crate::services::{ SubscriberResponse, TrackedProductResponse };

use super::AppState;

#[derive(Deserialize)]
pub struct StartTrackingRequest {
    pub user_tid: i64,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub product_sku: Option<String>,
    #[serde(default)]
    pub threshold: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct UpdateTrackingRequest {
    pub user_tid: i64,
    pub product_id: Uuid,
    pub threshold: Decimal,
}

#[derive(Deserialize)]
pub struct StopTrackingRequest {
    pub user_tid: i64,
    pub product_id: Uuid,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<(i64, String)>,
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>
) -> Result<Json<SubscriberResponse>> {
    let response = state.tracking_service.subscriber_overview(chat_id).await?;
    Ok(Json(response))
}

pub async fn start_tracking(
    State(state): State<AppState>,
    Json(request): Json<StartTrackingRequest>
) -> Result<(StatusCode, Json<TrackedProductResponse>)> {
    let target = ProductRef::from_parts(request.product_url, request.product_sku)?;

    let response = state.tracking_service.start_tracking(
        request.user_tid,
        target,
        request.threshold
    ).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_tracking(
    State(state): State<AppState>,
    Json(request): Json<UpdateTrackingRequest>
) -> Result<Json<TrackedProductResponse>> {
    let response = state.tracking_service.update_threshold(
        request.user_tid,
        request.product_id,
        request.threshold
    ).await?;

    Ok(Json(response))
}

pub async fn stop_tracking(
    State(state): State<AppState>,
    Json(request): Json<StopTrackingRequest>
) -> Result<StatusCode> {
    state.tracking_service.stop_tracking(request.user_tid, request.product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn product_history(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>
) -> Result<Json<HistoryResponse>> {
    let history = state.tracking_service.price_history(product_id).await?;
    Ok(Json(HistoryResponse { history }))
}
