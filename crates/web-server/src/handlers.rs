use crate::{error::AppError, AppState};
use analytics::{AnalyticsBreakdown, AnalyticsResult};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use core_types::{parse_bound, BoundKind, LedgerItem, NewItem};
use serde::Deserialize;
use std::sync::Arc;

/// The `from`/`to` query parameters. Both accept RFC 3339 timestamps or
/// `YYYY-MM-DD` dates; a bare `to` date covers that whole day.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeParams {
    fn bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
        let parse = |field: &str, value: &Option<String>, kind| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_bound(field, v, kind))
                .transpose()
        };
        let from = parse("from", &self.from, BoundKind::Start)?;
        let to = parse("to", &self.to, BoundKind::End)?;
        Ok((from, to))
    }

    fn required_bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        match self.bounds()? {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(AppError::BadRequest(
                "Both 'from' and 'to' parameters are required".to_string(),
            )),
        }
    }
}

fn item_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest("Invalid ID".to_string()))
}

fn payload(body: Result<Json<NewItem>, JsonRejection>) -> Result<NewItem, AppError> {
    let Json(item) = body.map_err(|rejection| {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    Ok(item.validate()?)
}

/// # POST /api/items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<LedgerItem>), AppError> {
    let item = payload(body)?;
    let created = state.repo.create(&item).await?;
    tracing::info!(id = created.id, kind = %created.kind, "Item created.");
    Ok((StatusCode::CREATED, Json(created)))
}

/// # GET /api/items?from=&to=
/// Lists items, newest first. Either bound may be omitted.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<LedgerItem>>, AppError> {
    let (from, to) = params.bounds()?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
    }
    let items = state.repo.list(from, to).await?;
    Ok(Json(items))
}

/// # GET /api/items/:id
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<LedgerItem>, AppError> {
    let id = item_id(path)?;
    let item = state.repo.get(id).await?;
    Ok(Json(item))
}

/// # PUT /api/items/:id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<NewItem>, JsonRejection>,
) -> Result<Json<LedgerItem>, AppError> {
    let id = item_id(path)?;
    let item = payload(body)?;
    let updated = state.repo.update(id, &item).await?;
    tracing::info!(id, "Item updated.");
    Ok(Json(updated))
}

/// # DELETE /api/items/:id
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = item_id(path)?;
    state.repo.delete(id).await?;
    tracing::info!(id, "Item deleted.");
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/analytics?from=&to=
/// Count, sum, average, median and 90th percentile of amounts in the range.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<AnalyticsResult>, AppError> {
    let (from, to) = params.required_bounds()?;
    let items = state.repo.items_in_range(from, to).await?;
    let result = state.aggregator.compute(&items, from, to)?;
    Ok(Json(result))
}

/// # GET /api/analytics/breakdown?from=&to=
/// The same statistics overall and per item kind, plus the net balance.
pub async fn get_analytics_breakdown(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<AnalyticsBreakdown>, AppError> {
    let (from, to) = params.required_bounds()?;
    let items = state.repo.items_in_range(from, to).await?;
    let breakdown = state.aggregator.compute_by_kind(&items, from, to)?;
    Ok(Json(breakdown))
}
