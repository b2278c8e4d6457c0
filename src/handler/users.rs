// handler/users.rs
use axum::{response::IntoResponse, Extension, Json};

use crate::{dtos::ApiResponse, error::HttpError, middleware::JWTAuthMiddeware};

pub async fn get_me(
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(ApiResponse::success(
        "User retrieved successfully",
        auth.user,
    )))
}
