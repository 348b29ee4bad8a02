pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use handlers::{Backend, ReportsState};
pub use routes::routes;
pub use services::{CleanupService, ReportService, SubmissionService};
pub use workers::CleanupWorker;
