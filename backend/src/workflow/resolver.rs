//! Approval path resolution at submission time.

use std::time::Duration;

use crate::directory::{DirectoryError, EmployeeDirectory, EmployeeRecord};
use crate::models::approval::ApprovalPath;
use crate::types::UserId;
use crate::workflow::error::WorkflowError;

/// Default bound on a single directory lookup.
pub const DEFAULT_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(2);

/// Computes the approval path for a new request by `employee_id`.
///
/// The employee must resolve and be active. The manager stage is included
/// only if the employee's manager resolves and is active; a missing or
/// inactive manager yields an admin-only path.
pub async fn resolve_approval_path(
    directory: &dyn EmployeeDirectory,
    employee_id: UserId,
    timeout: Duration,
) -> Result<ApprovalPath, WorkflowError> {
    let employee = lookup(directory, employee_id, timeout).await?;
    if !employee.active {
        return Err(WorkflowError::validation(format!(
            "employee {} is inactive",
            employee_id
        )));
    }

    let manager = match employee.manager_id {
        None => None,
        Some(manager_id) if manager_id == employee_id => None,
        Some(manager_id) => match lookup(directory, manager_id, timeout).await {
            Ok(record) if record.active => Some(record.id),
            Ok(_) => {
                tracing::debug!(
                    employee_id = %employee_id,
                    manager_id = %manager_id,
                    "manager inactive, routing to admin only"
                );
                None
            }
            Err(DirectoryError::NotFound(_)) => {
                tracing::warn!(
                    employee_id = %employee_id,
                    manager_id = %manager_id,
                    "manager missing from directory, routing to admin only"
                );
                None
            }
            Err(err) => return Err(err.into()),
        },
    };

    Ok(ApprovalPath::from_frozen_manager(manager))
}

async fn lookup(
    directory: &dyn EmployeeDirectory,
    employee_id: UserId,
    timeout: Duration,
) -> Result<EmployeeRecord, DirectoryError> {
    match tokio::time::timeout(timeout, directory.resolve_employee(employee_id)).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::Unavailable(format!(
            "lookup of {} timed out after {}ms",
            employee_id,
            timeout.as_millis()
        ))),
    }
}
