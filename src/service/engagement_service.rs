// service/engagement_service.rs
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, engagementdb::EngagementExt},
    dtos::engagementdtos::{CreateJobDto, SubmitProposalDto, UpdateJobDto},
    models::{
        engagementmodel::*,
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

#[derive(Debug, Clone)]
pub struct EngagementService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

#[derive(Debug, Serialize)]
pub struct ProposalAcceptanceResult {
    pub job: Job,
    pub proposal: Proposal,
    pub contract: Contract,
}

impl EngagementService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn create_job(&self, client: &User, job_data: CreateJobDto) -> Result<Job, ServiceError> {
        if client.role == UserRole::Freelancer {
            return Err(ServiceError::Validation(
                "Only clients can post jobs".to_string(),
            ));
        }
        if job_data.budget_min <= 0 || job_data.budget_max < job_data.budget_min {
            return Err(ServiceError::Validation(
                "Budget range must be positive and min <= max".to_string(),
            ));
        }

        let job = self
            .db_client
            .create_job(
                client.id,
                job_data.title,
                job_data.description,
                job_data.budget_min,
                job_data.budget_max,
                job_data.deadline,
            )
            .await?;

        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn list_jobs(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, ServiceError> {
        Ok(self.db_client.list_jobs(search, limit, offset).await?)
    }

    pub async fn update_job(
        &self,
        job_id: Uuid,
        acting_user: &User,
        job_data: UpdateJobDto,
    ) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;
        self.require_job_owner(acting_user, &job)?;

        if !job.status.is_open() {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }
        if job_data.budget_min <= 0 || job_data.budget_max < job_data.budget_min {
            return Err(ServiceError::Validation(
                "Budget range must be positive and min <= max".to_string(),
            ));
        }

        // The WHERE status = 'open' in the update catches a concurrent
        // assignment between our read and the write.
        self.db_client
            .update_job(
                job_id,
                job_data.title,
                job_data.description,
                job_data.budget_min,
                job_data.budget_max,
                job_data.deadline,
            )
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    ServiceError::InvalidJobStatus(job_id, JobStatus::Assigned)
                }
                other => ServiceError::Database(other),
            })
    }

    pub async fn delete_job(&self, job_id: Uuid, acting_user: &User) -> Result<(), ServiceError> {
        let job = self.get_job(job_id).await?;
        self.require_job_owner(acting_user, &job)?;

        if !job.status.is_open() {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        // Only unawarded jobs can be deleted.
        if self.db_client.get_contract_by_job(job_id).await?.is_some() {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let deleted = self.db_client.delete_job(job_id).await?;
        if deleted == 0 {
            return Err(ServiceError::InvalidJobStatus(job_id, JobStatus::Assigned));
        }

        Ok(())
    }

    pub async fn submit_proposal(
        &self,
        job_id: Uuid,
        freelancer: &User,
        proposal_data: SubmitProposalDto,
    ) -> Result<Proposal, ServiceError> {
        let job = self.get_job(job_id).await?;

        if !job.status.is_open() {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }
        if let Some(amount) = proposal_data.expected_amount {
            if amount <= 0 {
                return Err(ServiceError::InvalidAmount);
            }
        }

        if self
            .db_client
            .find_active_proposal(job_id, freelancer.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateSubmission(job_id));
        }

        let proposal = self
            .db_client
            .create_proposal(
                job_id,
                freelancer.id,
                proposal_data.cover_letter,
                proposal_data.expected_amount,
            )
            .await
            .map_err(|e| {
                // Two concurrent submissions race past the read above; the
                // partial unique index decides.
                ServiceError::from_unique_violation(
                    e,
                    "proposals_one_active_per_job_user",
                    ServiceError::DuplicateSubmission(job_id),
                )
            })?;

        if let Err(e) = self
            .notification_service
            .notify_proposal_received(job.client_id, &job, &proposal)
            .await
        {
            tracing::warn!("Proposal-received notification failed: {}", e);
        }

        Ok(proposal)
    }

    pub async fn accept_proposal(
        &self,
        proposal_id: Uuid,
        acting_user: &User,
    ) -> Result<ProposalAcceptanceResult, ServiceError> {
        let proposal = self
            .db_client
            .get_proposal_by_id(proposal_id)
            .await?
            .ok_or(ServiceError::ProposalNotFound(proposal_id))?;

        let job = self.get_job(proposal.job_id).await?;
        self.require_job_owner(acting_user, &job)?;

        if proposal.status.is_terminal() {
            return Err(ServiceError::InvalidProposalStatus(
                proposal_id,
                proposal.status,
            ));
        }
        if !job.status.is_open() {
            return Err(ServiceError::InvalidJobStatus(job.id, job.status));
        }

        let amount = resolve_contract_amount(&proposal, &job);

        let (job, proposal, contract) = self
            .db_client
            .accept_proposal(proposal_id, job.id, amount)
            .await
            .map_err(|e| match e {
                // The compare-and-swap found the job already assigned (or
                // the proposal already settled): a concurrent accept won.
                sqlx::Error::RowNotFound => {
                    ServiceError::InvalidJobStatus(job.id, JobStatus::Assigned)
                }
                other => ServiceError::from_unique_violation(
                    other,
                    "contracts_job_id_key",
                    ServiceError::InvalidJobStatus(job.id, JobStatus::Assigned),
                ),
            })?;

        if let Err(e) = self
            .notification_service
            .notify_proposal_accepted(proposal.user_id, &job, &contract)
            .await
        {
            tracing::warn!("Proposal-accepted notification failed: {}", e);
        }

        Ok(ProposalAcceptanceResult {
            job,
            proposal,
            contract,
        })
    }

    pub async fn reject_proposal(
        &self,
        proposal_id: Uuid,
        acting_user: &User,
        review_notes: Option<String>,
    ) -> Result<Proposal, ServiceError> {
        let proposal = self
            .db_client
            .get_proposal_by_id(proposal_id)
            .await?
            .ok_or(ServiceError::ProposalNotFound(proposal_id))?;

        let job = self.get_job(proposal.job_id).await?;
        self.require_job_owner(acting_user, &job)?;

        if proposal.status == ProposalStatus::Accepted {
            return Err(ServiceError::InvalidProposalStatus(
                proposal_id,
                proposal.status,
            ));
        }

        let proposal = self
            .db_client
            .reject_proposal(proposal_id, review_notes)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => ServiceError::InvalidProposalStatus(
                    proposal_id,
                    ProposalStatus::Accepted,
                ),
                other => ServiceError::Database(other),
            })?;

        if let Err(e) = self
            .notification_service
            .notify_proposal_rejected(proposal.user_id, &job, &proposal)
            .await
        {
            tracing::warn!("Proposal-rejected notification failed: {}", e);
        }

        Ok(proposal)
    }

    pub async fn get_proposal(
        &self,
        proposal_id: Uuid,
        caller: &User,
    ) -> Result<Proposal, ServiceError> {
        let proposal = self
            .db_client
            .get_proposal_by_id(proposal_id)
            .await?
            .ok_or(ServiceError::ProposalNotFound(proposal_id))?;

        let job = self.get_job(proposal.job_id).await?;

        // The proposal's author, the job's owner, or an admin.
        if proposal.user_id != caller.id
            && job.client_id != caller.id
            && caller.role != UserRole::Admin
        {
            return Err(ServiceError::UnauthorizedProposalAccess(
                caller.id,
                proposal_id,
            ));
        }

        Ok(proposal)
    }

    pub async fn get_job_proposals(
        &self,
        job_id: Uuid,
        caller: &User,
    ) -> Result<Vec<Proposal>, ServiceError> {
        let job = self.get_job(job_id).await?;
        self.require_job_owner(caller, &job)?;

        Ok(self.db_client.get_job_proposals(job_id).await?)
    }

    pub async fn get_my_proposals(&self, user_id: Uuid) -> Result<Vec<Proposal>, ServiceError> {
        Ok(self.db_client.get_user_proposals(user_id).await?)
    }

    pub async fn get_contract(
        &self,
        contract_id: Uuid,
        caller: &User,
    ) -> Result<Contract, ServiceError> {
        let contract = self
            .db_client
            .get_contract_by_id(contract_id)
            .await?
            .ok_or(ServiceError::ContractNotFound(contract_id))?;

        if contract.client_id != caller.id
            && contract.freelancer_id != caller.id
            && caller.role != UserRole::Admin
        {
            return Err(ServiceError::UnauthorizedContractAccess(
                caller.id,
                contract_id,
            ));
        }

        Ok(contract)
    }

    pub async fn list_contracts(&self, user_id: Uuid) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.db_client.get_user_contracts(user_id).await?)
    }

    fn require_job_owner(&self, acting_user: &User, job: &Job) -> Result<(), ServiceError> {
        if job.client_id != acting_user.id && acting_user.role != UserRole::Admin {
            return Err(ServiceError::UnauthorizedJobAccess(acting_user.id, job.id));
        }
        Ok(())
    }
}
