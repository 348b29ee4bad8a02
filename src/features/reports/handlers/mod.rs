pub mod report_handler;

pub use report_handler::{
    __path_list_reports, __path_run_cleanup, __path_submit_report, list_reports, run_cleanup,
    submit_report, Backend, ReportsState,
};
