pub mod background_jobs;
pub mod engagement_service;
pub mod error;
pub mod ledger_service;
pub mod notification_service;
pub mod reconciliation_service;
