// handler/engagement.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        engagementdtos::*,
        ApiResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .engagement_service
        .create_job(&auth.user, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", job)),
    ))
}

pub async fn list_jobs(
    Query(params): Query<JobListQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let jobs = app_state
        .engagement_service
        .list_jobs(
            params.search,
            params.limit.unwrap_or(20),
            params.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(ApiResponse::success("Jobs retrieved successfully", jobs)))
}

pub async fn get_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.engagement_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job retrieved successfully", job)))
}

pub async fn update_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .engagement_service
        .update_job(job_id, &auth.user, body)
        .await?;

    Ok(Json(ApiResponse::success("Job updated successfully", job)))
}

pub async fn delete_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .engagement_service
        .delete_job(job_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success("Job deleted successfully", ())))
}

pub async fn submit_proposal(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitProposalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let proposal = app_state
        .engagement_service
        .submit_proposal(job_id, &auth.user, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Proposal submitted successfully", proposal)),
    ))
}

pub async fn get_job_proposals(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state
        .engagement_service
        .get_job_proposals(job_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposals retrieved successfully",
        proposals,
    )))
}

pub async fn get_my_proposals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state
        .engagement_service
        .get_my_proposals(auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposals retrieved successfully",
        proposals,
    )))
}

pub async fn get_proposal(
    Path(proposal_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let proposal = app_state
        .engagement_service
        .get_proposal(proposal_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposal retrieved successfully",
        proposal,
    )))
}

pub async fn approve_proposal(
    Path(proposal_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .engagement_service
        .accept_proposal(proposal_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposal approved and contract created",
        result,
    )))
}

pub async fn reject_proposal(
    Path(proposal_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<RejectProposalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let proposal = app_state
        .engagement_service
        .reject_proposal(proposal_id, &auth.user, body.review_notes)
        .await?;

    Ok(Json(ApiResponse::success(
        "Proposal rejected",
        proposal,
    )))
}

pub async fn list_contracts(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let contracts = app_state
        .engagement_service
        .list_contracts(auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Contracts retrieved successfully",
        contracts,
    )))
}

pub async fn get_contract(
    Path(contract_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let contract = app_state
        .engagement_service
        .get_contract(contract_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success(
        "Contract retrieved successfully",
        contract,
    )))
}
