// rest_api/src/handlers/dashboard.rs
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use simrs_core::DashboardFilter;
use simrs_models::dashboard::{DashboardKind, DashboardView};
use simrs_models::WardId;

use crate::extract::{ApiPath, ApiQuery, CurrentActor};
use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub ward: Option<WardId>,
    /// Reference instant for time windows; defaults to now.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult<Json<DashboardView>> {
    let kind: DashboardKind = kind.parse()?;
    let at = query.at.unwrap_or_else(Utc::now);
    let filter = DashboardFilter { ward: query.ward };
    Ok(Json(state.engine.dashboard(&actor, kind, at, &filter).await?))
}
