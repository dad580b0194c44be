// rest_api/src/handlers/emergency.rs
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;

use simrs_models::{Bed, BedId, EmergencyCase, Listing, NewEmergencyCase, TriageReservation};

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::listing::{listing, PageParams};
use crate::{ApiResult, AppState};

pub async fn list_cases(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<EmergencyCase>>> {
    let cases = state.engine.list_cases(&actor).await?;
    Ok(listing(cases, page, state.engine.settings().default_page_size, &uri))
}

pub async fn register_case(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(new_case): ApiJson<NewEmergencyCase>,
) -> ApiResult<(StatusCode, Json<EmergencyCase>)> {
    Ok((StatusCode::CREATED, Json(state.engine.register_case(&actor, new_case).await?)))
}

pub async fn reserve_bed(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BedId>,
    ApiJson(reservation): ApiJson<TriageReservation>,
) -> ApiResult<Json<Bed>> {
    Ok(Json(state.engine.reserve_bed(&actor, id, reservation).await?))
}

pub async fn release_reservation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BedId>,
) -> ApiResult<Json<Bed>> {
    Ok(Json(state.engine.release_reservation(&actor, id).await?))
}
