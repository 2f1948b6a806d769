//! In-memory directory used by tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DirectoryError, EmployeeDirectory, EmployeeRecord};
use crate::types::UserId;

#[derive(Debug, Default)]
pub struct StaticDirectory {
    employees: RwLock<HashMap<UserId, EmployeeRecord>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active employee reporting to `manager_id` and returns its id.
    pub async fn add_employee(&self, manager_id: Option<UserId>) -> UserId {
        let id = UserId::new();
        self.upsert(EmployeeRecord {
            id,
            active: true,
            manager_id,
        })
        .await;
        id
    }

    pub async fn upsert(&self, record: EmployeeRecord) {
        self.employees.write().await.insert(record.id, record);
    }

    pub async fn set_manager(&self, employee_id: UserId, manager_id: Option<UserId>) {
        if let Some(record) = self.employees.write().await.get_mut(&employee_id) {
            record.manager_id = manager_id;
        }
    }

    pub async fn set_active(&self, employee_id: UserId, active: bool) {
        if let Some(record) = self.employees.write().await.get_mut(&employee_id) {
            record.active = active;
        }
    }
}

#[async_trait]
impl EmployeeDirectory for StaticDirectory {
    async fn resolve_employee(&self, employee_id: UserId) -> Result<EmployeeRecord, DirectoryError> {
        self.employees
            .read()
            .await
            .get(&employee_id)
            .cloned()
            .ok_or(DirectoryError::NotFound(employee_id))
    }
}
