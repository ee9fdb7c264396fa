pub mod crawler;
pub mod csv_out;
pub mod rate_limiter;
