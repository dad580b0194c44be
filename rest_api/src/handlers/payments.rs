// rest_api/src/handlers/payments.rs
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use log::warn;

use simrs_core::PaymentFilter;
use simrs_models::{GatewayNotification, HospitalError, Listing, NewPayment, PaymentTransaction};

use crate::extract::{ApiJson, ApiQuery, CurrentActor};
use crate::listing::{listing, PageParams};
use crate::{ApiResult, AppState, RestApiError};

pub const GATEWAY_KEY_HEADER: &str = "x-gateway-key";

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(filter): ApiQuery<PaymentFilter>,
    ApiQuery(page): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<Listing<PaymentTransaction>>> {
    let payments = state.engine.list_payments(&actor, &filter).await?;
    Ok(listing(payments, page, state.engine.settings().default_page_size, &uri))
}

pub async fn create_payment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<NewPayment>,
) -> ApiResult<(StatusCode, Json<PaymentTransaction>)> {
    Ok((StatusCode::CREATED, Json(state.engine.create_payment(&actor, request).await?)))
}

fn check_gateway_key(expected: Option<&str>, headers: &HeaderMap) -> Result<(), RestApiError> {
    let Some(expected) = expected else {
        return Err(HospitalError::Forbidden("gateway callbacks are disabled".into()).into());
    };
    let presented = headers.get(GATEWAY_KEY_HEADER).and_then(|value| value.to_str().ok());
    match presented {
        Some(key) if key == expected => Ok(()),
        Some(_) => {
            warn!("Rejected gateway notification with a mismatched key");
            Err(HospitalError::Unauthorized("gateway key mismatch".into()).into())
        }
        None => Err(HospitalError::Unauthorized("missing gateway key".into()).into()),
    }
}

/// Settlement callback from the payment gateway. Authenticated by the shared
/// gateway key rather than a bearer token.
pub async fn gateway_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(notification): ApiJson<GatewayNotification>,
) -> ApiResult<Json<PaymentTransaction>> {
    check_gateway_key(state.config.security.gateway_key.as_deref(), &headers)?;
    Ok(Json(state.engine.apply_gateway_notification(notification).await?))
}
