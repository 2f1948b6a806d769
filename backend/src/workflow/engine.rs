//! Workflow engine: submission, approval, rejection and cancellation of
//! self-service requests.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

use crate::authz::AuthorityPolicy;
use crate::directory::EmployeeDirectory;
use crate::models::audit_log::TransitionRecord;
use crate::models::request::{NewRequest, RequestStatus, SelfServiceRequest};
use crate::repositories::{CommitOutcome, RequestListFilters, RequestScope, RequestStore};
use crate::types::{RequestId, UserId};
use crate::utils::time::{Clock, SystemClock};
use crate::validation::rules::validate_rejection_reason;
use crate::workflow::audit;
use crate::workflow::error::WorkflowError;
use crate::workflow::resolver::{resolve_approval_path, DEFAULT_DIRECTORY_TIMEOUT};
use crate::workflow::transition::{evaluate, Command, Grants};

/// Perspective a caller lists requests from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Employee,
    Manager,
    Admin,
}

pub struct WorkflowEngine {
    store: Arc<dyn RequestStore>,
    directory: Arc<dyn EmployeeDirectory>,
    authority: Arc<dyn AuthorityPolicy>,
    clock: Arc<dyn Clock>,
    directory_timeout: Duration,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn RequestStore>,
        directory: Arc<dyn EmployeeDirectory>,
        authority: Arc<dyn AuthorityPolicy>,
    ) -> Self {
        Self {
            store,
            directory,
            authority,
            clock: Arc::new(SystemClock::default()),
            directory_timeout: DEFAULT_DIRECTORY_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = timeout;
        self
    }

    /// Validates the payload, freezes the approval path and stores the new
    /// request together with its submission audit entry.
    pub async fn submit(
        &self,
        employee_id: UserId,
        payload: NewRequest,
    ) -> Result<SelfServiceRequest, WorkflowError> {
        payload.validate()?;
        let path =
            resolve_approval_path(self.directory.as_ref(), employee_id, self.directory_timeout)
                .await?;

        let request = SelfServiceRequest::new(employee_id, payload, &path, self.clock.now_utc());
        let submitted = audit::reconstruct(&request).remove(0);
        self.store.insert(&request, &submitted).await.map_err(|err| {
            tracing::error!(error = %err, employee_id = %employee_id, "failed to store request");
            WorkflowError::Storage(err)
        })?;

        tracing::info!(
            request_id = %request.id,
            employee_id = %employee_id,
            request_type = %request.request_type,
            status = %request.status,
            manager_id = ?request.manager_id,
            "request submitted"
        );
        Ok(request)
    }

    pub async fn approve(
        &self,
        request_id: RequestId,
        actor_id: UserId,
    ) -> Result<SelfServiceRequest, WorkflowError> {
        self.decide(request_id, actor_id, Command::Approve).await
    }

    /// Rejects with a non-empty reason. The reason is checked before the
    /// request is loaded, so an empty reason is always `ValidationFailed`.
    pub async fn reject(
        &self,
        request_id: RequestId,
        actor_id: UserId,
        reason: &str,
    ) -> Result<SelfServiceRequest, WorkflowError> {
        let reason = validate_rejection_reason(reason)
            .map_err(|err| WorkflowError::validation(format!("reason: {}", err.code)))?;
        self.decide(request_id, actor_id, Command::Reject { reason })
            .await
    }

    pub async fn cancel(
        &self,
        request_id: RequestId,
        actor_id: UserId,
    ) -> Result<SelfServiceRequest, WorkflowError> {
        self.decide(request_id, actor_id, Command::Cancel).await
    }

    pub async fn get(&self, request_id: RequestId) -> Result<SelfServiceRequest, WorkflowError> {
        self.load(request_id).await
    }

    pub async fn list_for_actor(
        &self,
        actor_id: UserId,
        role: ActorRole,
        filters: &RequestListFilters,
    ) -> Result<Vec<SelfServiceRequest>, WorkflowError> {
        let scope = match role {
            ActorRole::Employee => RequestScope::Employee(actor_id),
            ActorRole::Manager => {
                RequestScope::Managers(self.authority.represented_managers(actor_id).await?)
            }
            ActorRole::Admin => {
                if !self.authority.is_admin(actor_id).await? {
                    return Err(WorkflowError::Unauthorized(
                        "admin authority required to list all requests".into(),
                    ));
                }
                RequestScope::All
            }
        };
        Ok(self.store.list(scope, filters).await?)
    }

    pub async fn audit_trail(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<TransitionRecord>, WorkflowError> {
        self.load(request_id).await?;
        Ok(self.store.audit_trail(request_id).await?)
    }

    /// Whether `actor_id` may read the request: owner, frozen manager (or a
    /// delegate of theirs), or an admin.
    pub async fn can_view(
        &self,
        request: &SelfServiceRequest,
        actor_id: UserId,
    ) -> Result<bool, WorkflowError> {
        if request.employee_id == actor_id {
            return Ok(true);
        }
        if let Some(manager_id) = request.manager_id {
            if self.authority.may_act_for_manager(actor_id, manager_id).await? {
                return Ok(true);
            }
        }
        Ok(self.authority.is_admin(actor_id).await?)
    }

    async fn load(&self, request_id: RequestId) -> Result<SelfServiceRequest, WorkflowError> {
        self.store
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("request {}", request_id)))
    }

    /// Only asks the authority policy what the current stage needs.
    async fn grants_for(
        &self,
        request: &SelfServiceRequest,
        actor_id: UserId,
    ) -> Result<Grants, WorkflowError> {
        let mut grants = Grants::default();
        match request.status {
            RequestStatus::PendingManager => {
                if let Some(manager_id) = request.manager_id {
                    grants.manager = self
                        .authority
                        .may_act_for_manager(actor_id, manager_id)
                        .await?;
                }
            }
            RequestStatus::PendingAdmin => {
                grants.admin = self.authority.is_admin(actor_id).await?;
            }
            _ => {}
        }
        Ok(grants)
    }

    async fn decide(
        &self,
        request_id: RequestId,
        actor_id: UserId,
        command: Command,
    ) -> Result<SelfServiceRequest, WorkflowError> {
        let action = command.action();
        let request = self.load(request_id).await?;

        let grants = match &command {
            Command::Cancel => Grants::default(),
            _ if request.status.is_terminal() => Grants::default(),
            _ => self.grants_for(&request, actor_id).await?,
        };

        let transition = match evaluate(&request, &command, actor_id, grants, self.clock.now_utc())
        {
            Ok(transition) => transition,
            Err(err) => {
                tracing::warn!(
                    request_id = %request_id,
                    actor_id = %actor_id,
                    action = %action,
                    status = %request.status,
                    error = %err,
                    "command refused"
                );
                return Err(err);
            }
        };

        let outcome = self.store.commit_transition(&transition).await.map_err(|err| {
            tracing::error!(error = %err, request_id = %request_id, "failed to commit transition");
            WorkflowError::Storage(err)
        })?;

        match outcome {
            CommitOutcome::Applied(updated) => {
                tracing::info!(
                    request_id = %request_id,
                    actor_id = %actor_id,
                    action = %action,
                    from = %transition.from,
                    to = %transition.to,
                    "transition committed"
                );
                Ok(updated)
            }
            CommitOutcome::Stale(current) => {
                tracing::warn!(
                    request_id = %request_id,
                    actor_id = %actor_id,
                    action = %action,
                    expected = %transition.from,
                    found = %current.status,
                    "lost race on request status"
                );
                Err(WorkflowError::InvalidTransition {
                    from: current.status,
                    action,
                })
            }
            CommitOutcome::Missing => {
                Err(WorkflowError::NotFound(format!("request {}", request_id)))
            }
        }
    }
}
