use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// A job accepts proposals, edits and deletion only while open.
    pub fn is_open(&self) -> bool {
        matches!(self, JobStatus::Open)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }

    /// Accepted and rejected are terminal; a proposal is never reopened.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Accepted | ProposalStatus::Rejected)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "contract_status", rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget_min: i64,
    pub budget_max: i64,
    pub status: JobStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub cover_letter: String,
    pub expected_amount: Option<i64>,
    pub status: ProposalStatus,
    pub review_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Created atomically with proposal acceptance; one per job. Immutable
/// after creation except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contract {
    pub id: Uuid,
    pub job_id: Uuid,
    pub proposal_id: Uuid,
    pub client_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: i64,
    pub status: ContractStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Amount written on the contract when a proposal is accepted: the
/// freelancer's expected amount if they stated one, else the job's
/// maximum budget. No range validation against the budget, matching
/// the marketplace's observed behaviour.
pub fn resolve_contract_amount(proposal: &Proposal, job: &Job) -> i64 {
    proposal.expected_amount.unwrap_or(job.budget_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(budget_max: i64) -> Job {
        Job {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            title: "Build landing page".to_string(),
            description: "Single page site".to_string(),
            budget_min: 500,
            budget_max,
            status: JobStatus::Open,
            deadline: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn proposal(job_id: Uuid, expected_amount: Option<i64>) -> Proposal {
        Proposal {
            id: Uuid::new_v4(),
            job_id,
            user_id: Uuid::new_v4(),
            cover_letter: "I can do this".to_string(),
            expected_amount,
            status: ProposalStatus::Pending,
            review_notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn contract_amount_prefers_expected_amount() {
        let j = job(3000);
        let p = proposal(j.id, Some(2000));
        assert_eq!(resolve_contract_amount(&p, &j), 2000);
    }

    #[test]
    fn contract_amount_falls_back_to_budget_max() {
        let j = job(3000);
        let p = proposal(j.id, None);
        assert_eq!(resolve_contract_amount(&p, &j), 3000);
    }

    #[test]
    fn proposal_terminal_states() {
        assert!(!ProposalStatus::Pending.is_terminal());
        assert!(ProposalStatus::Accepted.is_terminal());
        assert!(ProposalStatus::Rejected.is_terminal());
    }

    #[test]
    fn only_open_jobs_accept_mutations() {
        assert!(JobStatus::Open.is_open());
        assert!(!JobStatus::Assigned.is_open());
        assert!(!JobStatus::Completed.is_open());
        assert!(!JobStatus::Cancelled.is_open());
    }
}
