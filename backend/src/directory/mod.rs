//! Read-only employee directory consumed at submission time.
//!
//! The workflow asks two questions of the directory: "is X active" and "who
//! is X's manager". Answers are copied into the request and never asked
//! again for that request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use crate::types::UserId;

pub mod memory;
pub mod postgres;

pub use memory::StaticDirectory;
pub use postgres::PgEmployeeDirectory;

/// Directory view of one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EmployeeRecord {
    pub id: UserId,
    pub active: bool,
    pub manager_id: Option<UserId>,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("employee {0} not found in directory")]
    NotFound(UserId),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn resolve_employee(&self, employee_id: UserId) -> Result<EmployeeRecord, DirectoryError>;
}
