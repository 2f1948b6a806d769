//! Audit trail reconstruction from a request's stamped fields.
//!
//! The store also keeps an append-only log of every committed transition.
//! For the single-pass workflow both views must agree; once requests can be
//! resubmitted the stamped columns stop being enough and only the log counts.

use crate::models::audit_log::TransitionRecord;
use crate::models::request::{RequestAction, RequestStatus, SelfServiceRequest};

/// Rebuilds the ordered trail implied by the request's stamps.
pub fn reconstruct(request: &SelfServiceRequest) -> Vec<TransitionRecord> {
    let initial = request.approval_path().initial_status();
    let mut trail = vec![TransitionRecord {
        request_id: request.id,
        action: RequestAction::Submit,
        from_status: None,
        to_status: initial,
        actor_id: request.employee_id,
        occurred_at: request.created_at,
        reason: None,
    }];
    let mut current = initial;

    if let (Some(at), Some(by)) = (request.manager_approved_at, request.manager_approved_by) {
        trail.push(TransitionRecord {
            request_id: request.id,
            action: RequestAction::Approve,
            from_status: Some(current),
            to_status: RequestStatus::PendingAdmin,
            actor_id: by,
            occurred_at: at,
            reason: None,
        });
        current = RequestStatus::PendingAdmin;
    }

    if let (Some(at), Some(by)) = (request.admin_approved_at, request.admin_approved_by) {
        trail.push(TransitionRecord {
            request_id: request.id,
            action: RequestAction::Approve,
            from_status: Some(current),
            to_status: RequestStatus::Approved,
            actor_id: by,
            occurred_at: at,
            reason: None,
        });
    } else if let (Some(at), Some(by)) = (request.rejected_at, request.rejected_by) {
        trail.push(TransitionRecord {
            request_id: request.id,
            action: RequestAction::Reject,
            from_status: Some(current),
            to_status: RequestStatus::Rejected,
            actor_id: by,
            occurred_at: at,
            reason: request.rejection_reason.clone(),
        });
    } else if let Some(at) = request.cancelled_at {
        trail.push(TransitionRecord {
            request_id: request.id,
            action: RequestAction::Cancel,
            from_status: Some(current),
            to_status: RequestStatus::Cancelled,
            actor_id: request.employee_id,
            occurred_at: at,
            reason: None,
        });
    }

    trail
}
