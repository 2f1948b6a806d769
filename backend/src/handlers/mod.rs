pub mod approvals;
pub mod requests;
