pub mod report_dto;

pub use report_dto::{
    CleanupResponse, PhotoDto, ReportDto, ReportQueryParams, ReportsListResponse,
    SubmitReportForm, SubmitReportResponse,
};
