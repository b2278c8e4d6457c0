// service/background_jobs.rs
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;

const AUDIT_INTERVAL_SECS: u64 = 300;
const AUDIT_WINDOW_HOURS: i32 = 24;

/// Periodic consistency check: for every user with recent ledger activity,
/// the cached wallet balance must equal the balance derived from completed
/// and pending entries. Drift means a bug somewhere upstream; it is logged
/// loudly and left for operators, never "fixed" silently.
pub async fn start_ledger_audit_job(app_state: Arc<AppState>) {
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(AUDIT_INTERVAL_SECS));

    loop {
        interval.tick().await;

        let user_ids = match recently_active_users(&app_state).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Ledger audit could not list active users: {}", e);
                continue;
            }
        };

        let mut drifted = 0usize;
        for user_id in &user_ids {
            match app_state.ledger_service.check_balance_invariant(*user_id).await {
                Ok(audit) if !audit.consistent => drifted += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Ledger audit failed for user {}: {}", user_id, e);
                }
            }
        }

        if drifted > 0 {
            tracing::error!(
                "Ledger audit found {} drifted wallet(s) out of {} checked",
                drifted,
                user_ids.len()
            );
        } else {
            tracing::debug!("Ledger audit clean for {} wallet(s)", user_ids.len());
        }
    }
}

async fn recently_active_users(app_state: &Arc<AppState>) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT user_id
        FROM ledger_entries
        WHERE created_at > NOW() - make_interval(hours => $1)
           OR settled_at > NOW() - make_interval(hours => $1)
        "#,
    )
    .bind(AUDIT_WINDOW_HOURS)
    .fetch_all(&app_state.db_client.pool)
    .await?;

    Ok(rows.iter().map(|row| row.get::<Uuid, _>("user_id")).collect())
}
