use async_trait::async_trait;
use sqlx::PgPool;

use super::{DirectoryError, EmployeeDirectory, EmployeeRecord};
use crate::types::UserId;

/// Directory backed by the `employees` table.
#[derive(Debug, Clone)]
pub struct PgEmployeeDirectory {
    pool: PgPool,
}

impl PgEmployeeDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for PgEmployeeDirectory {
    async fn resolve_employee(&self, employee_id: UserId) -> Result<EmployeeRecord, DirectoryError> {
        sqlx::query_as::<_, EmployeeRecord>(
            "SELECT id, is_active AS active, manager_id FROM employees WHERE id = $1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, employee_id = %employee_id, "employee lookup failed");
            DirectoryError::Unavailable(err.to_string())
        })?
        .ok_or(DirectoryError::NotFound(employee_id))
    }
}
