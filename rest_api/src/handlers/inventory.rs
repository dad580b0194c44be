// rest_api/src/handlers/inventory.rs
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use simrs_core::{AvailabilityFilter, BedFilter};
use simrs_models::{
    Bed, BedAvailability, BedCreated, BedId, Listing, NewBed, NewRoom, NewWard, Room, RoomView, Ward, WardId,
    WardUpdate,
};

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::listing::{listing, PageParams};
use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct RoomQuery {
    #[serde(default)]
    pub ward: Option<WardId>,
}

pub async fn list_wards(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<Ward>>> {
    let wards = state.engine.list_wards(&actor).await?;
    Ok(listing(wards, page, state.engine.settings().default_page_size, &uri))
}

pub async fn create_ward(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(new_ward): ApiJson<NewWard>,
) -> ApiResult<(StatusCode, Json<Ward>)> {
    Ok((StatusCode::CREATED, Json(state.engine.create_ward(&actor, new_ward).await?)))
}

pub async fn get_ward(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<WardId>,
) -> ApiResult<Json<Ward>> {
    Ok(Json(state.engine.get_ward(&actor, id).await?))
}

pub async fn update_ward(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<WardId>,
    ApiJson(update): ApiJson<WardUpdate>,
) -> ApiResult<Json<Ward>> {
    Ok(Json(state.engine.update_ward(&actor, id, update).await?))
}

pub async fn delete_ward(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<WardId>,
) -> ApiResult<StatusCode> {
    state.engine.delete_ward(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_rooms(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(query): ApiQuery<RoomQuery>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<RoomView>>> {
    let rooms = state.engine.list_rooms(&actor, query.ward).await?;
    Ok(listing(rooms, page, state.engine.settings().default_page_size, &uri))
}

pub async fn create_room(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(new_room): ApiJson<NewRoom>,
) -> ApiResult<(StatusCode, Json<Room>)> {
    Ok((StatusCode::CREATED, Json(state.engine.create_room(&actor, new_room).await?)))
}

pub async fn list_beds(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(filter): ApiQuery<BedFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<Bed>>> {
    let beds = state.engine.list_beds(&actor, &filter).await?;
    Ok(listing(beds, page, state.engine.settings().default_page_size, &uri))
}

/// Carries `capacity_warning` when the room's advisory capacity is exceeded.
pub async fn create_bed(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(new_bed): ApiJson<NewBed>,
) -> ApiResult<(StatusCode, Json<BedCreated>)> {
    Ok((StatusCode::CREATED, Json(state.engine.create_bed(&actor, new_bed).await?)))
}

pub async fn list_available_beds(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(filter): ApiQuery<AvailabilityFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<BedAvailability>>> {
    let beds = state.engine.list_available_beds(&actor, &filter).await?;
    Ok(listing(beds, page, state.engine.settings().default_page_size, &uri))
}

pub async fn get_bed(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BedId>,
) -> ApiResult<Json<Bed>> {
    Ok(Json(state.engine.get_bed(&actor, id).await?))
}

pub async fn start_maintenance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BedId>,
) -> ApiResult<Json<Bed>> {
    Ok(Json(state.engine.start_maintenance(&actor, id).await?))
}

pub async fn release_maintenance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BedId>,
) -> ApiResult<Json<Bed>> {
    Ok(Json(state.engine.release_maintenance(&actor, id).await?))
}

pub async fn reclaim_bed(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BedId>,
) -> ApiResult<Json<Bed>> {
    Ok(Json(state.engine.reclaim_bed(&actor, id).await?))
}
