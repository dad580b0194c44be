// rest_api/src/extract.rs
//! Request extractors whose rejections render as `RestApiError`.

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use log::debug;
use serde::de::DeserializeOwned;

use simrs_security::{Actor, AuthError, TokenKind};

use crate::{AppState, RestApiError};

/// JSON body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| RestApiError::InvalidInput(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Query string.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| RestApiError::InvalidInput(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Path parameters.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| RestApiError::InvalidInput(rejection.body_text()))?;
        Ok(ApiPath(value))
    }
}

/// The authenticated caller. The bearer access token names the account; the
/// role is re-read from the directory so deactivation and role changes take
/// effect before the token expires.
pub struct CurrentActor(pub Actor);

pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingCredential)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.validate(token, TokenKind::Access).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            e
        })?;
        let actor = state.engine.resolve_actor(claims.user_id()?).await?;
        Ok(CurrentActor(actor))
    }
}
