pub mod dashboard;
pub mod review;
pub mod templates;
