// handler/notifications.rs
use std::sync::Arc;

use axum::{extract::Path, response::IntoResponse, Extension, Json};
use uuid::Uuid;

use crate::{dtos::ApiResponse, error::HttpError, middleware::JWTAuthMiddeware, AppState};

pub async fn get_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .notification_service
        .get_user_notifications(auth.user.id, 50)
        .await?;

    Ok(Json(ApiResponse::success(
        "Notifications retrieved successfully",
        notifications,
    )))
}

pub async fn mark_notification_read(
    Path(notification_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .notification_service
        .mark_notification_read(notification_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Notification marked as read",
        (),
    )))
}
