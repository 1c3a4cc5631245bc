pub mod local_day;
pub mod logger;
pub mod units;
