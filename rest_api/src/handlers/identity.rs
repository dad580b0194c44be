// rest_api/src/handlers/identity.rs
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;
use log::info;
use serde::Deserialize;

use simrs_models::{CreatedUser, Listing, Login, NewUser, Role, UserId, UserProfile, UserUpdate};
use simrs_security::{TokenKind, TokenPair};

use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::listing::{listing, PageParams};
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub role: Option<Role>,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let profile = state.engine.register(new_user).await?;
    info!("Registered patient account {}", profile.username);
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(State(state): State<AppState>, ApiJson(login): ApiJson<Login>) -> ApiResult<Json<TokenPair>> {
    let profile = state.engine.authenticate(login).await?;
    Ok(Json(state.tokens.issue_pair(profile.id, profile.role)?))
}

/// Mints a new pair from a refresh token, carrying the account's current role.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let claims = state.tokens.validate(&request.refresh, TokenKind::Refresh)?;
    let actor = state.engine.resolve_actor(claims.user_id()?).await?;
    Ok(Json(state.tokens.issue_pair(actor.user_id, actor.role)?))
}

pub async fn me(State(state): State<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.engine.me(&actor).await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(query): ApiQuery<UserQuery>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<UserProfile>>> {
    let users = state.engine.list_users(&actor, query.role).await?;
    Ok(listing(users, page, state.engine.settings().default_page_size, &uri))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<CreatedUser>)> {
    let created = state.engine.create_user(&actor, new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.engine.update_user(&actor, id, update).await?))
}
