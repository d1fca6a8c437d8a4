pub mod feedback_address;
pub mod mode;
pub mod policy;
pub mod record;
pub mod report_failure;
