pub mod analytics;
pub mod core;
pub mod rankings;
pub mod reports;
