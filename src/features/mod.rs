pub mod rate_limits;
pub mod reports;
