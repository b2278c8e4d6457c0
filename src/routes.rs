// routes.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{engagement, notifications, payments, users},
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let job_routes = Router::new()
        .route("/", post(engagement::create_job).get(engagement::list_jobs))
        .route(
            "/:job_id",
            get(engagement::get_job)
                .put(engagement::update_job)
                .delete(engagement::delete_job),
        )
        .route(
            "/:job_id/proposals",
            post(engagement::submit_proposal).get(engagement::get_job_proposals),
        )
        .layer(middleware::from_fn(auth));

    let proposal_routes = Router::new()
        .route("/me", get(engagement::get_my_proposals))
        .route("/:proposal_id", get(engagement::get_proposal))
        .route("/:proposal_id/approve", put(engagement::approve_proposal))
        .route("/:proposal_id/reject", put(engagement::reject_proposal))
        .layer(middleware::from_fn(auth));

    let contract_routes = Router::new()
        .route("/", get(engagement::list_contracts))
        .route("/:contract_id", get(engagement::get_contract))
        .layer(middleware::from_fn(auth));

    // Protected payment routes (require auth)
    let protected_payment_routes = Router::new()
        .route("/fund-wallet", post(payments::fund_wallet))
        .route("/withdraw", post(payments::withdraw_funds))
        .route("/history", get(payments::payment_history))
        .route("/balance", get(payments::wallet_balance))
        .layer(middleware::from_fn(auth));

    // The gateway callback is unauthenticated; its signature check lives
    // in the handler.
    let public_payment_routes = Router::new()
        .route("/webhook", post(payments::payment_webhook));

    let payment_routes = Router::new()
        .merge(protected_payment_routes)
        .merge(public_payment_routes);

    let notification_routes = Router::new()
        .route("/", get(notifications::get_notifications))
        .route("/:notification_id/read", put(notifications::mark_notification_read))
        .layer(middleware::from_fn(auth));

    let user_routes = Router::new()
        .route("/me", get(users::get_me))
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/jobs", job_routes)
        .nest("/proposals", proposal_routes)
        .nest("/contracts", contract_routes)
        .nest("/payments", payment_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
