//! Weekly availability query endpoint.
//!
//! GET /api/availability?slug={slug}&week_start=YYYY-MM-DD

use crate::error::AppError;
use crate::server::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use booking_core::types::ItemSlug;
use booking_core::WeekAvailability;
use chrono::NaiveDate;
use serde::Deserialize;

/// Query parameters. Both are required; validation happens here so a
/// missing parameter is a 400, not a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    /// Item slug.
    pub slug: Option<String>,
    /// First day of the requested week, ISO `YYYY-MM-DD`.
    pub week_start: Option<String>,
}

/// Computes the 7-day availability window for one item.
pub async fn get_week_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<WeekAvailability>, AppError> {
    let slug = params
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("missing slug"))?;

    let week_start = params
        .week_start
        .as_deref()
        .ok_or_else(|| AppError::bad_request("missing week_start"))
        .and_then(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::bad_request("week_start must be YYYY-MM-DD"))
        })?;

    let week = state
        .availability
        .week(&ItemSlug::from(slug), week_start)
        .await?;

    Ok(Json(week))
}
