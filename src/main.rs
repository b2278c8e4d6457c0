mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use service::{
    engagement_service::EngagementService,
    ledger_service::LedgerService,
    notification_service::NotificationService,
    reconciliation_service::ReconciliationService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    // Services
    pub engagement_service: Arc<EngagementService>,
    pub ledger_service: Arc<LedgerService>,
    pub reconciliation_service: Arc<ReconciliationService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let notification_service = Arc::new(NotificationService::new(
            db_client_arc.clone(),
            config.clone(),
        ));

        let engagement_service = Arc::new(EngagementService::new(
            db_client_arc.clone(),
            notification_service.clone(),
        ));

        let ledger_service = Arc::new(LedgerService::new(
            db_client_arc.clone(),
            notification_service.clone(),
        ));

        let reconciliation_service = Arc::new(ReconciliationService::new(
            ledger_service.clone(),
            config.gateway_webhook_secret.clone(),
        ));

        Self {
            env: config,
            db_client: db_client_arc,
            engagement_service,
            ledger_service,
            reconciliation_service,
            notification_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = DBClient::new(pool);

    let allowed_origins = vec![
        config.app_url.parse::<HeaderValue>().unwrap(),
        "http://localhost:5173".parse::<HeaderValue>().unwrap(),
        "http://localhost:8000".parse::<HeaderValue>().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    tracing::info!("Server is running on http://localhost:{}", config.port);

    // Periodic ledger-vs-balance consistency audit
    let app_state_clone = app_state.clone();
    tokio::spawn(async move {
        service::background_jobs::start_ledger_audit_job(app_state_clone).await;
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
