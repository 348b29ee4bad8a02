mod report;
mod report_photo;

pub use report::{CreateReport, Report, ReportCategory, ReportStatus, Severity};
pub use report_photo::ReportPhoto;
