// db/ledgerdb.rs
use async_trait::async_trait;
use sqlx::{Error, Row};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ledgermodel::*;

#[async_trait]
pub trait LedgerExt {
    async fn get_wallet_account(&self, user_id: Uuid) -> Result<Option<WalletAccount>, Error>;

    async fn get_entry_by_gateway_ref(
        &self,
        gateway_ref: &str,
    ) -> Result<Option<LedgerEntry>, Error>;

    /// Appends a completed deposit and credits the balance in one
    /// transaction. The wallet row is created on first use. A duplicate
    /// gateway_ref surfaces as the unique-constraint database error.
    async fn record_deposit(
        &self,
        user_id: Uuid,
        amount: i64,
        reference: String,
        gateway_ref: String,
    ) -> Result<LedgerEntry, Error>;

    /// Reserves the amount (balance debit) and appends a pending
    /// withdrawal in one transaction. Returns None when the balance is
    /// short; the check and the debit happen under the same row lock.
    async fn record_withdrawal(
        &self,
        user_id: Uuid,
        amount: i64,
        reference: String,
        gateway_ref: String,
    ) -> Result<Option<LedgerEntry>, Error>;

    /// Applies a gateway settlement outcome to the entry identified by
    /// gateway_ref. Returns None if no such entry exists; otherwise the
    /// entry plus whether this call changed anything (false for the
    /// replayed-webhook no-op on an already settled entry).
    async fn reconcile_entry(
        &self,
        gateway_ref: &str,
        succeeded: bool,
    ) -> Result<Option<(LedgerEntry, bool)>, Error>;

    async fn get_ledger_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, Error>;

    /// Recomputes the balance from the entries alone: completed deposits
    /// minus completed withdrawals minus pending withdrawals (which still
    /// hold their reservation).
    async fn derived_balance(&self, user_id: Uuid) -> Result<i64, Error>;
}

const ENTRY_COLUMNS: &str = r#"
    id, user_id, contract_id, amount, kind, status,
    reference, gateway_ref, created_at, settled_at
"#;

#[async_trait]
impl LedgerExt for DBClient {
    async fn get_wallet_account(&self, user_id: Uuid) -> Result<Option<WalletAccount>, Error> {
        sqlx::query_as::<_, WalletAccount>(
            r#"
            SELECT user_id, balance, created_at, updated_at
            FROM wallet_accounts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_entry_by_gateway_ref(
        &self,
        gateway_ref: &str,
    ) -> Result<Option<LedgerEntry>, Error> {
        sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE gateway_ref = $1
            "#
        ))
        .bind(gateway_ref)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_deposit(
        &self,
        user_id: Uuid,
        amount: i64,
        reference: String,
        gateway_ref: String,
    ) -> Result<LedgerEntry, Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_accounts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            SELECT balance FROM wallet_accounts WHERE user_id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        // The unique index on gateway_ref aborts the transaction here on a
        // replayed reference, before any balance change commits.
        let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            INSERT INTO ledger_entries
            (user_id, amount, kind, status, reference, gateway_ref, settled_at)
            VALUES ($1, $2, 'deposit'::ledger_entry_kind, 'completed'::ledger_entry_status, $3, $4, NOW())
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(amount)
        .bind(reference)
        .bind(gateway_ref)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE wallet_accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn record_withdrawal(
        &self,
        user_id: Uuid,
        amount: i64,
        reference: String,
        gateway_ref: String,
    ) -> Result<Option<LedgerEntry>, Error> {
        let mut tx = self.pool.begin().await?;

        let wallet = sqlx::query(
            r#"
            SELECT balance FROM wallet_accounts WHERE user_id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let balance = match wallet {
            Some(row) => row.get::<i64, _>("balance"),
            None => 0,
        };

        if balance < amount {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE wallet_accounts
            SET balance = balance - $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

        let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            INSERT INTO ledger_entries
            (user_id, amount, kind, status, reference, gateway_ref)
            VALUES ($1, $2, 'withdrawal'::ledger_entry_kind, 'pending'::ledger_entry_status, $3, $4)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(amount)
        .bind(reference)
        .bind(gateway_ref)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn reconcile_entry(
        &self,
        gateway_ref: &str,
        succeeded: bool,
    ) -> Result<Option<(LedgerEntry, bool)>, Error> {
        let mut tx = self.pool.begin().await?;

        let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE gateway_ref = $1
            FOR UPDATE
            "#
        ))
        .bind(gateway_ref)
        .fetch_optional(&mut *tx)
        .await?;

        let entry = match entry {
            Some(entry) => entry,
            None => return Ok(None),
        };

        // Settled entries never change again; replayed and out-of-order
        // webhook deliveries land here.
        if entry.status.is_terminal() {
            tx.commit().await?;
            return Ok(Some((entry, false)));
        }

        let new_status = if succeeded {
            LedgerEntryStatus::Completed
        } else {
            LedgerEntryStatus::Failed
        };

        let updated = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            UPDATE ledger_entries
            SET status = $2, settled_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.id)
        .bind(new_status)
        .fetch_one(&mut *tx)
        .await?;

        // Each entry touches the balance exactly once. A withdrawal was
        // debited when it was recorded, so success leaves the balance
        // alone and failure restores the reservation. A deposit that was
        // still pending gets credited only on success.
        match (entry.kind, succeeded) {
            (LedgerEntryKind::Withdrawal, false) | (LedgerEntryKind::Deposit, true) => {
                sqlx::query(
                    r#"
                    INSERT INTO wallet_accounts (user_id) VALUES ($1)
                    ON CONFLICT (user_id) DO NOTHING
                    "#,
                )
                .bind(entry.user_id)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE wallet_accounts
                    SET balance = balance + $2, updated_at = NOW()
                    WHERE user_id = $1
                    "#,
                )
                .bind(entry.user_id)
                .bind(entry.amount)
                .execute(&mut *tx)
                .await?;
            }
            _ => {}
        }

        tx.commit().await?;
        Ok(Some((updated, true)))
    }

    async fn get_ledger_entries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, Error> {
        sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn derived_balance(&self, user_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(
                CASE
                    WHEN kind = 'deposit'::ledger_entry_kind
                         AND status = 'completed'::ledger_entry_status THEN amount
                    WHEN kind = 'withdrawal'::ledger_entry_kind
                         AND status IN ('completed'::ledger_entry_status,
                                        'pending'::ledger_entry_status) THEN -amount
                    ELSE 0
                END
            ), 0)::bigint AS balance
            FROM ledger_entries
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("balance"))
    }
}
