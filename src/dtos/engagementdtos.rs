// dtos/engagementdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub budget_min: i64,
    pub budget_max: i64,

    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub budget_min: i64,
    pub budget_max: i64,

    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitProposalDto {
    #[validate(length(min = 1, max = 5000, message = "Cover letter must be between 1 and 5000 characters"))]
    pub cover_letter: String,

    // Minor currency units; when absent the job's maximum budget is used
    // at acceptance time.
    pub expected_amount: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RejectProposalDto {
    #[validate(length(max = 2000, message = "Review notes are limited to 2000 characters"))]
    pub review_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct JobListQueryDto {
    pub search: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,

    #[validate(range(min = 0, message = "Offset must be non-negative"))]
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_job_requires_title_and_description() {
        let dto = CreateJobDto {
            title: "".to_string(),
            description: "".to_string(),
            budget_min: 100,
            budget_max: 200,
            deadline: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateJobDto {
            title: "Build API".to_string(),
            description: "REST backend".to_string(),
            budget_min: 100,
            budget_max: 200,
            deadline: None,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn job_list_query_rejects_oversized_limit() {
        let query = JobListQueryDto {
            search: None,
            limit: Some(500),
            offset: None,
        };
        assert!(query.validate().is_err());
    }
}
