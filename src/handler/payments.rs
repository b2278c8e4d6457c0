// handler/payments.rs
use std::sync::Arc;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::{
    dtos::{paymentdtos::*, ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub async fn fund_wallet(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<FundWalletDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let entry = app_state
        .ledger_service
        .fund(auth.user.id, body.amount, body.gateway_ref)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Wallet funded successfully", entry)),
    ))
}

pub async fn withdraw_funds(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<WithdrawalRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let entry = app_state
        .ledger_service
        .withdraw(auth.user.id, body.amount, body.gateway_ref)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Withdrawal initiated successfully", entry)),
    ))
}

pub async fn payment_history(
    Query(params): Query<HistoryQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let entries = app_state
        .ledger_service
        .history(auth.user.id, params.limit)
        .await?;

    Ok(Json(ApiResponse::success(
        "Payment history retrieved successfully",
        entries,
    )))
}

pub async fn wallet_balance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let balance = app_state.ledger_service.balance(auth.user.id).await?;

    Ok(Json(ApiResponse::success(
        "Balance retrieved successfully",
        BalanceResponseDto {
            user_id: auth.user.id,
            balance,
        },
    )))
}

// Gateway callbacks arrive unauthenticated; trust is the HMAC signature
// over the raw body, verified before the payload is even parsed.
pub async fn payment_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get("x-gateway-signature")
        .and_then(|h| h.to_str().ok());

    let settled = app_state
        .reconciliation_service
        .handle_callback(signature, &body)
        .await?;

    match settled {
        Some(entry) => Ok(Json(serde_json::json!({
            "status": "success",
            "reference": entry.gateway_ref,
        }))),
        None => Ok(Json(serde_json::json!({"status": "ignored"}))),
    }
}
