// db/engagementdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::engagementmodel::*;

#[async_trait]
pub trait EngagementExt {
    // Jobs
    async fn create_job(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget_min: i64,
        budget_max: i64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error>;

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn list_jobs(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, Error>;

    async fn update_job(
        &self,
        job_id: Uuid,
        title: String,
        description: String,
        budget_min: i64,
        budget_max: i64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error>;

    async fn delete_job(&self, job_id: Uuid) -> Result<u64, Error>;

    // Proposals
    async fn create_proposal(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        cover_letter: String,
        expected_amount: Option<i64>,
    ) -> Result<Proposal, Error>;

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error>;

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, Error>;

    async fn get_user_proposals(&self, user_id: Uuid) -> Result<Vec<Proposal>, Error>;

    async fn find_active_proposal(
        &self,
        job_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Proposal>, Error>;

    /// The three-entity accept commit: job open -> assigned (compare-and-swap),
    /// proposal pending -> accepted, contract insert. One transaction; any
    /// precondition that no longer holds aborts the whole unit.
    async fn accept_proposal(
        &self,
        proposal_id: Uuid,
        job_id: Uuid,
        amount: i64,
    ) -> Result<(Job, Proposal, Contract), Error>;

    async fn reject_proposal(
        &self,
        proposal_id: Uuid,
        review_notes: Option<String>,
    ) -> Result<Proposal, Error>;

    // Contracts
    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, Error>;

    async fn get_contract_by_job(&self, job_id: Uuid) -> Result<Option<Contract>, Error>;

    async fn get_user_contracts(&self, user_id: Uuid) -> Result<Vec<Contract>, Error>;
}

const JOB_COLUMNS: &str = r#"
    id, client_id, title, description, budget_min, budget_max,
    status, deadline, created_at, updated_at
"#;

const PROPOSAL_COLUMNS: &str = r#"
    id, job_id, user_id, cover_letter, expected_amount,
    status, review_notes, created_at, updated_at
"#;

const CONTRACT_COLUMNS: &str = r#"
    id, job_id, proposal_id, client_id, freelancer_id, amount,
    status, start_date, end_date, created_at
"#;

#[async_trait]
impl EngagementExt for DBClient {
    async fn create_job(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget_min: i64,
        budget_max: i64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (client_id, title, description, budget_min, budget_max, deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(client_id)
        .bind(title)
        .bind(description)
        .bind(budget_min)
        .bind(budget_max)
        .bind(deadline)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE id = $1
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_jobs(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, Error> {
        match search {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query_as::<_, Job>(&format!(
                    r#"
                    SELECT {JOB_COLUMNS}
                    FROM jobs
                    WHERE title ILIKE $1 OR description ILIKE $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#
                ))
                .bind(pattern)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Job>(&format!(
                    r#"
                    SELECT {JOB_COLUMNS}
                    FROM jobs
                    ORDER BY created_at DESC
                    LIMIT $1 OFFSET $2
                    "#
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    async fn update_job(
        &self,
        job_id: Uuid,
        title: String,
        description: String,
        budget_min: i64,
        budget_max: i64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Job, Error> {
        // Content edits only while the job is still open.
        sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET title = $2,
                description = $3,
                budget_min = $4,
                budget_max = $5,
                deadline = $6,
                updated_at = NOW()
            WHERE id = $1 AND status = 'open'::job_status
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(title)
        .bind(description)
        .bind(budget_min)
        .bind(budget_max)
        .bind(deadline)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE id = $1 AND status = 'open'::job_status
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn create_proposal(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        cover_letter: String,
        expected_amount: Option<i64>,
    ) -> Result<Proposal, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            INSERT INTO proposals (job_id, user_id, cover_letter, expected_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(user_id)
        .bind(cover_letter)
        .bind(expected_amount)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_proposal_by_id(&self, proposal_id: Uuid) -> Result<Option<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS}
            FROM proposals
            WHERE id = $1
            "#
        ))
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_job_proposals(&self, job_id: Uuid) -> Result<Vec<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS}
            FROM proposals
            WHERE job_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_proposals(&self, user_id: Uuid) -> Result<Vec<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS}
            FROM proposals
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_active_proposal(
        &self,
        job_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            SELECT {PROPOSAL_COLUMNS}
            FROM proposals
            WHERE job_id = $1 AND user_id = $2 AND status <> 'rejected'::proposal_status
            "#
        ))
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn accept_proposal(
        &self,
        proposal_id: Uuid,
        job_id: Uuid,
        amount: i64,
    ) -> Result<(Job, Proposal, Contract), Error> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-swap as the first statement: the job leaves 'open'
        // exactly once, so a concurrent accept on the same job gets zero
        // rows here and the whole unit aborts.
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'assigned'::job_status, updated_at = NOW()
            WHERE id = $1 AND status = 'open'::job_status
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::RowNotFound)?;

        let proposal = sqlx::query_as::<_, Proposal>(&format!(
            r#"
            UPDATE proposals
            SET status = 'accepted'::proposal_status, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'::proposal_status
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(proposal_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::RowNotFound)?;

        // UNIQUE(job_id) on contracts backstops the swap above.
        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            INSERT INTO contracts
            (job_id, proposal_id, client_id, freelancer_id, amount, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, NOW(), $6)
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(job.id)
        .bind(proposal.id)
        .bind(job.client_id)
        .bind(proposal.user_id)
        .bind(amount)
        .bind(job.deadline)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((job, proposal, contract))
    }

    async fn reject_proposal(
        &self,
        proposal_id: Uuid,
        review_notes: Option<String>,
    ) -> Result<Proposal, Error> {
        sqlx::query_as::<_, Proposal>(&format!(
            r#"
            UPDATE proposals
            SET status = 'rejected'::proposal_status,
                review_notes = $2,
                updated_at = NOW()
            WHERE id = $1 AND status <> 'accepted'::proposal_status
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(proposal_id)
        .bind(review_notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_contract_by_id(&self, contract_id: Uuid) -> Result<Option<Contract>, Error> {
        sqlx::query_as::<_, Contract>(&format!(
            r#"
            SELECT {CONTRACT_COLUMNS}
            FROM contracts
            WHERE id = $1
            "#
        ))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_contract_by_job(&self, job_id: Uuid) -> Result<Option<Contract>, Error> {
        sqlx::query_as::<_, Contract>(&format!(
            r#"
            SELECT {CONTRACT_COLUMNS}
            FROM contracts
            WHERE job_id = $1
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_contracts(&self, user_id: Uuid) -> Result<Vec<Contract>, Error> {
        sqlx::query_as::<_, Contract>(&format!(
            r#"
            SELECT {CONTRACT_COLUMNS}
            FROM contracts
            WHERE client_id = $1 OR freelancer_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
