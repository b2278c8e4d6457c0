// service/notification_service.rs
//
// The notification sink is strictly best-effort: the engagement and ledger
// services call it only after their own transaction has committed, and
// nothing here may abort or roll back the caller.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::Config,
    db::{db::DBClient, userdb::UserExt},
    mail::mails::send_notification_email,
    models::{
        engagementmodel::{Contract, Job, Proposal},
        ledgermodel::LedgerEntry,
    },
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
    config: Config,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>, config: Config) -> Self {
        Self { db_client, config }
    }

    pub async fn notify_proposal_received(
        &self,
        client_id: Uuid,
        job: &Job,
        proposal: &Proposal,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "Proposal received notification: job {} got proposal {}",
            job.id,
            proposal.id
        );

        self.dispatch(
            client_id,
            "proposal_received",
            serde_json::json!({
                "job_id": job.id,
                "job_title": job.title,
                "proposal_id": proposal.id,
                "freelancer_id": proposal.user_id,
            }),
            format!("New proposal received for your job: {}", job.title),
            "New proposal received",
        )
        .await
    }

    pub async fn notify_proposal_accepted(
        &self,
        freelancer_id: Uuid,
        job: &Job,
        contract: &Contract,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "Proposal accepted notification: freelancer {} won job {}",
            freelancer_id,
            job.id
        );

        self.dispatch(
            freelancer_id,
            "proposal_accepted",
            serde_json::json!({
                "job_id": job.id,
                "job_title": job.title,
                "contract_id": contract.id,
                "amount": contract.amount,
            }),
            format!("Your proposal for '{}' was accepted", job.title),
            "Proposal accepted",
        )
        .await
    }

    pub async fn notify_proposal_rejected(
        &self,
        freelancer_id: Uuid,
        job: &Job,
        proposal: &Proposal,
    ) -> Result<(), ServiceError> {
        self.dispatch(
            freelancer_id,
            "proposal_rejected",
            serde_json::json!({
                "job_id": job.id,
                "job_title": job.title,
                "proposal_id": proposal.id,
                "review_notes": proposal.review_notes,
            }),
            format!("Your proposal for '{}' was not selected", job.title),
            "Proposal update",
        )
        .await
    }

    pub async fn notify_deposit_completed(
        &self,
        user_id: Uuid,
        entry: &LedgerEntry,
    ) -> Result<(), ServiceError> {
        self.dispatch(
            user_id,
            "deposit_completed",
            serde_json::json!({
                "entry_id": entry.id,
                "amount": entry.amount,
                "reference": entry.reference,
            }),
            format!("Your wallet was funded with {} (minor units)", entry.amount),
            "Wallet funded",
        )
        .await
    }

    pub async fn notify_withdrawal_settled(
        &self,
        user_id: Uuid,
        entry: &LedgerEntry,
    ) -> Result<(), ServiceError> {
        self.dispatch(
            user_id,
            "withdrawal_completed",
            serde_json::json!({
                "entry_id": entry.id,
                "amount": entry.amount,
                "reference": entry.reference,
            }),
            format!("Your withdrawal of {} (minor units) was paid out", entry.amount),
            "Withdrawal completed",
        )
        .await
    }

    pub async fn notify_withdrawal_refunded(
        &self,
        user_id: Uuid,
        entry: &LedgerEntry,
    ) -> Result<(), ServiceError> {
        tracing::warn!(
            "Withdrawal {} failed at the gateway, amount {} restored for user {}",
            entry.reference,
            entry.amount,
            user_id
        );

        self.dispatch(
            user_id,
            "withdrawal_failed",
            serde_json::json!({
                "entry_id": entry.id,
                "amount": entry.amount,
                "reference": entry.reference,
            }),
            format!(
                "Your withdrawal of {} (minor units) failed and was returned to your wallet",
                entry.amount
            ),
            "Withdrawal failed",
        )
        .await
    }

    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UserNotification>, ServiceError> {
        let notifications = sqlx::query_as::<_, UserNotification>(
            r#"
            SELECT id, user_id, type, payload, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db_client.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.db_client.pool)
        .await?;

        Ok(())
    }

    async fn dispatch(
        &self,
        user_id: Uuid,
        notification_type: &str,
        payload: serde_json::Value,
        message: String,
        email_subject: &str,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, type, payload, message)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(notification_type)
        .bind(&payload)
        .bind(&message)
        .execute(&self.db_client.pool)
        .await?;

        // Email delivery is even more best-effort than the row above; a
        // refused SMTP connection only leaves a log line.
        match self.db_client.get_user(Some(user_id), None, None).await {
            Ok(Some(user)) => {
                if let Err(e) =
                    send_notification_email(&self.config, &user.email, email_subject, &message)
                        .await
                {
                    tracing::warn!("Failed to email {} to user {}: {}", notification_type, user_id, e);
                }
            }
            Ok(None) => {
                tracing::warn!("Notification target user {} no longer exists", user_id);
            }
            Err(e) => {
                tracing::warn!("Could not resolve email for user {}: {}", user_id, e);
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub r#type: String,
    pub payload: Option<serde_json::Value>,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}
