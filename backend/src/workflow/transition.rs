//! Pure state-machine rules.
//!
//! [`evaluate`] is a function of (current request, command, actor, grants,
//! time). It decides whether a command is legal and what it would change,
//! without touching storage.

use chrono::{DateTime, Utc};

use crate::models::audit_log::TransitionRecord;
use crate::models::request::{RequestAction, RequestStatus, SelfServiceRequest};
use crate::types::{RequestId, UserId};
use crate::workflow::error::WorkflowError;

/// A command issued against an existing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Approve,
    /// Reason is expected to be validated already.
    Reject { reason: String },
    Cancel,
}

impl Command {
    pub fn action(&self) -> RequestAction {
        match self {
            Command::Approve => RequestAction::Approve,
            Command::Reject { .. } => RequestAction::Reject,
            Command::Cancel => RequestAction::Cancel,
        }
    }
}

/// Capabilities the authority policy granted the actor for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grants {
    /// Actor may decide on behalf of the request's frozen manager.
    pub manager: bool,
    /// Actor holds admin authority.
    pub admin: bool,
}

/// An accepted, not yet committed, transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub request_id: RequestId,
    pub action: RequestAction,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub actor_id: UserId,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}

impl Transition {
    /// Stamps the request. Callers must have checked `request.status == self.from`.
    pub fn apply_to(&self, request: &mut SelfServiceRequest) {
        match (self.action, self.from) {
            (RequestAction::Approve, RequestStatus::PendingManager) => {
                request.manager_approved_at = Some(self.at);
                request.manager_approved_by = Some(self.actor_id);
            }
            (RequestAction::Approve, _) => {
                request.admin_approved_at = Some(self.at);
                request.admin_approved_by = Some(self.actor_id);
            }
            (RequestAction::Reject, _) => {
                request.rejected_at = Some(self.at);
                request.rejected_by = Some(self.actor_id);
                request.rejection_reason = self.reason.clone();
            }
            (RequestAction::Cancel, _) => {
                request.cancelled_at = Some(self.at);
            }
            (RequestAction::Submit, _) => {}
        }
        request.status = self.to;
        request.updated_at = self.at;
    }

    pub fn record(&self) -> TransitionRecord {
        TransitionRecord {
            request_id: self.request_id,
            action: self.action,
            from_status: Some(self.from),
            to_status: self.to,
            actor_id: self.actor_id,
            occurred_at: self.at,
            reason: self.reason.clone(),
        }
    }
}

/// Decides whether `actor_id` may apply `command` to `request`.
///
/// Checks run in a fixed order: terminal state, then actor authority.
pub fn evaluate(
    request: &SelfServiceRequest,
    command: &Command,
    actor_id: UserId,
    grants: Grants,
    at: DateTime<Utc>,
) -> Result<Transition, WorkflowError> {
    let action = command.action();
    let from = request.status;
    let invalid = || WorkflowError::InvalidTransition { from, action };

    if from.is_terminal() {
        return Err(invalid());
    }

    let (to, reason) = match (command, from) {
        (Command::Cancel, _) => {
            if actor_id != request.employee_id {
                return Err(WorkflowError::Unauthorized(
                    "only the requesting employee may cancel".into(),
                ));
            }
            (RequestStatus::Cancelled, None)
        }
        (Command::Approve, RequestStatus::PendingManager) => {
            require_manager(request, grants)?;
            (RequestStatus::PendingAdmin, None)
        }
        (Command::Reject { reason }, RequestStatus::PendingManager) => {
            require_manager(request, grants)?;
            (RequestStatus::Rejected, Some(reason.clone()))
        }
        (Command::Approve, RequestStatus::PendingAdmin) => {
            require_admin(request, actor_id, grants)?;
            (RequestStatus::Approved, None)
        }
        (Command::Reject { reason }, RequestStatus::PendingAdmin) => {
            require_admin(request, actor_id, grants)?;
            (RequestStatus::Rejected, Some(reason.clone()))
        }
        _ => return Err(invalid()),
    };

    Ok(Transition {
        request_id: request.id,
        action,
        from,
        to,
        actor_id,
        at,
        reason,
    })
}

fn require_manager(request: &SelfServiceRequest, grants: Grants) -> Result<(), WorkflowError> {
    if request.manager_id.is_some() && grants.manager {
        Ok(())
    } else {
        Err(WorkflowError::Unauthorized(
            "only the request's manager may decide this stage".into(),
        ))
    }
}

/// The admin stage must be decided by someone other than the requester and
/// the manager-stage approver.
fn require_admin(
    request: &SelfServiceRequest,
    actor_id: UserId,
    grants: Grants,
) -> Result<(), WorkflowError> {
    if !grants.admin {
        return Err(WorkflowError::Unauthorized(
            "admin authority required for this stage".into(),
        ));
    }
    if actor_id == request.employee_id {
        return Err(WorkflowError::Unauthorized(
            "admins may not decide their own requests".into(),
        ));
    }
    if request.manager_approved_by == Some(actor_id) {
        return Err(WorkflowError::Unauthorized(
            "the manager-stage approver may not also decide the admin stage".into(),
        ));
    }
    Ok(())
}
