// rest_api/src/handlers/appointments.rs
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;

use simrs_core::AppointmentFilter;
use simrs_models::{Appointment, AppointmentId, AppointmentRequest, DoctorAssignment, Listing};

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::listing::{listing, PageParams};
use crate::{ApiResult, AppState};

pub async fn list_appointments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(filter): ApiQuery<AppointmentFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<Appointment>>> {
    let appointments = state.engine.list_appointments(&actor, &filter).await?;
    Ok(listing(appointments, page, state.engine.settings().default_page_size, &uri))
}

pub async fn request_appointment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<AppointmentRequest>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    Ok((StatusCode::CREATED, Json(state.engine.request_appointment(&actor, request).await?)))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AppointmentId>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.engine.get_appointment(&actor, id).await?))
}

pub async fn assign_doctor(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AppointmentId>,
    ApiJson(assignment): ApiJson<DoctorAssignment>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.engine.assign_doctor(&actor, id, assignment).await?))
}

pub async fn check_in(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AppointmentId>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.engine.check_in(&actor, id).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AppointmentId>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.engine.complete(&actor, id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AppointmentId>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.engine.cancel(&actor, id).await?))
}
