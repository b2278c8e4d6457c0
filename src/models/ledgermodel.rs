// models/ledgermodel.rs
//
// All monetary values are i64 minor currency units (cents). Balance
// arithmetic never goes through floating point.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "ledger_entry_kind", rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Deposit,
    Withdrawal,
}

impl LedgerEntryKind {
    pub fn to_str(&self) -> &str {
        match self {
            LedgerEntryKind::Deposit => "deposit",
            LedgerEntryKind::Withdrawal => "withdrawal",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "ledger_entry_status", rename_all = "snake_case")]
pub enum LedgerEntryStatus {
    Pending,
    Completed,
    Failed,
}

impl LedgerEntryStatus {
    /// Completed and failed entries are settled and may never change again;
    /// a repeated gateway event for them is a no-op.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LedgerEntryStatus::Completed | LedgerEntryStatus::Failed)
    }
}

/// Cached projection of the ledger: balance always equals the sum of the
/// user's completed deposits minus completed and still-pending withdrawals
/// (pending withdrawals hold their reservation).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WalletAccount {
    pub user_id: Uuid,
    pub balance: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One immutable record of a monetary movement. Append-only audit trail;
/// only `status` and `settled_at` change after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub amount: i64,
    pub kind: LedgerEntryKind,
    pub status: LedgerEntryStatus,
    pub reference: String,
    pub gateway_ref: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_settleable_status() {
        assert!(!LedgerEntryStatus::Pending.is_terminal());
        assert!(LedgerEntryStatus::Completed.is_terminal());
        assert!(LedgerEntryStatus::Failed.is_terminal());
    }
}
