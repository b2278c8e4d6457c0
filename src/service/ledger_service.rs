// service/ledger_service.rs
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, ledgerdb::LedgerExt},
    models::ledgermodel::*,
    service::{error::ServiceError, notification_service::NotificationService},
    utils::reference::generate_transaction_reference,
};

const MAX_TX_ATTEMPTS: u32 = 3;
const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 100;

/// Settlement outcome reported by the payment gateway for a previously
/// recorded entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct BalanceAudit {
    pub user_id: Uuid,
    pub cached_balance: i64,
    pub derived_balance: i64,
    pub consistent: bool,
}

#[derive(Debug, Clone)]
pub struct LedgerService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl LedgerService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    /// Synchronous top-up: appends a completed deposit and credits the
    /// balance. Replaying the same gateway reference returns the original
    /// entry instead of double-crediting.
    pub async fn fund(
        &self,
        user_id: Uuid,
        amount: i64,
        gateway_ref: String,
    ) -> Result<LedgerEntry, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidAmount);
        }
        if gateway_ref.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Gateway reference is required".to_string(),
            ));
        }

        if let Some(prior) = self.prior_entry(&gateway_ref, user_id, amount, LedgerEntryKind::Deposit).await? {
            tracing::info!("Replayed fund request for reference {}", gateway_ref);
            return Ok(prior);
        }

        let reference = generate_transaction_reference();

        let mut attempts = 0;
        let entry = loop {
            attempts += 1;
            match self
                .db_client
                .record_deposit(user_id, amount, reference.clone(), gateway_ref.clone())
                .await
            {
                Ok(entry) => break entry,
                Err(e) if ServiceError::is_retryable(&e) && attempts < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Deposit transaction conflict, attempt {}: {}", attempts, e);
                    continue;
                }
                Err(e) if ServiceError::is_retryable(&e) => return Err(ServiceError::Unavailable),
                Err(e) => {
                    // Lost the insert race on the gateway reference: defer
                    // to whoever won.
                    let mapped = ServiceError::from_unique_violation(
                        e,
                        "ledger_entries_gateway_ref_key",
                        ServiceError::DuplicateReference(gateway_ref.clone()),
                    );
                    if matches!(mapped, ServiceError::DuplicateReference(_)) {
                        if let Some(prior) = self
                            .prior_entry(&gateway_ref, user_id, amount, LedgerEntryKind::Deposit)
                            .await?
                        {
                            return Ok(prior);
                        }
                    }
                    return Err(mapped);
                }
            }
        };

        if let Err(e) = self
            .notification_service
            .notify_deposit_completed(user_id, &entry)
            .await
        {
            tracing::warn!("Deposit notification failed: {}", e);
        }

        Ok(entry)
    }

    /// Reserves the amount immediately and records a pending withdrawal;
    /// settlement arrives later through reconciliation.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        amount: i64,
        gateway_ref: String,
    ) -> Result<LedgerEntry, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidAmount);
        }
        if gateway_ref.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Gateway reference is required".to_string(),
            ));
        }

        if let Some(prior) = self
            .prior_entry(&gateway_ref, user_id, amount, LedgerEntryKind::Withdrawal)
            .await?
        {
            tracing::info!("Replayed withdraw request for reference {}", gateway_ref);
            return Ok(prior);
        }

        let reference = generate_transaction_reference();

        let mut attempts = 0;
        let entry = loop {
            attempts += 1;
            match self
                .db_client
                .record_withdrawal(user_id, amount, reference.clone(), gateway_ref.clone())
                .await
            {
                Ok(Some(entry)) => break entry,
                Ok(None) => {
                    let available = self.balance(user_id).await?;
                    return Err(ServiceError::InsufficientBalance {
                        required: amount,
                        available,
                    });
                }
                Err(e) if ServiceError::is_retryable(&e) && attempts < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Withdrawal transaction conflict, attempt {}: {}", attempts, e);
                    continue;
                }
                Err(e) if ServiceError::is_retryable(&e) => return Err(ServiceError::Unavailable),
                Err(e) => {
                    return Err(ServiceError::from_unique_violation(
                        e,
                        "ledger_entries_gateway_ref_key",
                        ServiceError::DuplicateReference(gateway_ref.clone()),
                    ));
                }
            }
        };

        Ok(entry)
    }

    /// Applies a settlement outcome; repeated deliveries for the same
    /// reference change ledger state at most once.
    pub async fn reconcile(
        &self,
        gateway_ref: &str,
        outcome: ReconcileOutcome,
    ) -> Result<LedgerEntry, ServiceError> {
        let succeeded = outcome == ReconcileOutcome::Succeeded;

        let mut attempts = 0;
        let (entry, applied) = loop {
            attempts += 1;
            match self.db_client.reconcile_entry(gateway_ref, succeeded).await {
                Ok(Some(result)) => break result,
                Ok(None) => return Err(ServiceError::EntryNotFound(gateway_ref.to_string())),
                Err(e) if ServiceError::is_retryable(&e) && attempts < MAX_TX_ATTEMPTS => {
                    tracing::warn!("Reconcile transaction conflict, attempt {}: {}", attempts, e);
                    continue;
                }
                Err(e) if ServiceError::is_retryable(&e) => return Err(ServiceError::Unavailable),
                Err(e) => return Err(ServiceError::Database(e)),
            }
        };

        if !applied {
            tracing::info!(
                "Gateway reference {} already settled as {:?}, ignoring replay",
                gateway_ref,
                entry.status
            );
            return Ok(entry);
        }

        let notified = match (entry.kind, succeeded) {
            (LedgerEntryKind::Withdrawal, true) => {
                self.notification_service
                    .notify_withdrawal_settled(entry.user_id, &entry)
                    .await
            }
            (LedgerEntryKind::Withdrawal, false) => {
                self.notification_service
                    .notify_withdrawal_refunded(entry.user_id, &entry)
                    .await
            }
            (LedgerEntryKind::Deposit, true) => {
                self.notification_service
                    .notify_deposit_completed(entry.user_id, &entry)
                    .await
            }
            (LedgerEntryKind::Deposit, false) => Ok(()),
        };
        if let Err(e) = notified {
            tracing::warn!("Settlement notification failed: {}", e);
        }

        Ok(entry)
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<LedgerEntry>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        Ok(self.db_client.get_ledger_entries(user_id, limit).await?)
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let wallet = self.db_client.get_wallet_account(user_id).await?;
        Ok(wallet.map(|w| w.balance).unwrap_or(0))
    }

    /// The cached balance must always equal the balance derived from the
    /// entries alone. Run after suspicious operations and periodically by
    /// the background audit.
    pub async fn check_balance_invariant(&self, user_id: Uuid) -> Result<BalanceAudit, ServiceError> {
        let cached_balance = self.balance(user_id).await?;
        let derived_balance = self.db_client.derived_balance(user_id).await?;

        let consistent = cached_balance == derived_balance;
        if !consistent {
            tracing::error!(
                "Ledger drift for user {}: cached {} != derived {}",
                user_id,
                cached_balance,
                derived_balance
            );
        }

        Ok(BalanceAudit {
            user_id,
            cached_balance,
            derived_balance,
            consistent,
        })
    }

    async fn prior_entry(
        &self,
        gateway_ref: &str,
        user_id: Uuid,
        amount: i64,
        kind: LedgerEntryKind,
    ) -> Result<Option<LedgerEntry>, ServiceError> {
        match self.db_client.get_entry_by_gateway_ref(gateway_ref).await? {
            Some(entry)
                if entry.user_id == user_id && entry.amount == amount && entry.kind == kind =>
            {
                Ok(Some(entry))
            }
            Some(_) => Err(ServiceError::DuplicateReference(gateway_ref.to_string())),
            None => Ok(None),
        }
    }
}
