// rest_api/src/handlers/allocations.rs
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;

use simrs_core::AllocationFilter;
use simrs_models::{AllocationId, AllocationPatch, BedAllocation, Listing, NewAllocation};

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::listing::{listing, PageParams};
use crate::{ApiResult, AppState};

pub async fn list_allocations(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(filter): ApiQuery<AllocationFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<BedAllocation>>> {
    let allocations = state.engine.list_allocations(&actor, &filter).await?;
    Ok(listing(allocations, page, state.engine.settings().default_page_size, &uri))
}

pub async fn allocate(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<NewAllocation>,
) -> ApiResult<(StatusCode, Json<BedAllocation>)> {
    Ok((StatusCode::CREATED, Json(state.engine.allocate(&actor, request).await?)))
}

pub async fn get_allocation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AllocationId>,
) -> ApiResult<Json<BedAllocation>> {
    Ok(Json(state.engine.get_allocation(&actor, id).await?))
}

/// A body carrying `discharged_at` discharges the patient.
pub async fn update_allocation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AllocationId>,
    ApiJson(patch): ApiJson<AllocationPatch>,
) -> ApiResult<Json<BedAllocation>> {
    Ok(Json(state.engine.update_allocation(&actor, id, patch).await?))
}
