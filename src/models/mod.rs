pub mod report;
pub mod sheets;
