mod cleanup_service;
mod compensation;
mod report_service;
mod submission_service;
mod submission_validator;

pub use cleanup_service::CleanupService;
pub use report_service::{ReportService, ReportStore};
pub use submission_service::SubmissionService;
pub use submission_validator::{validate, PhotoUpload, RawSubmission, ValidatedSubmission};
