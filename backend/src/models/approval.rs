//! Approval path: the ordered stages a request must clear.
//!
//! Storage keeps one stamped column group per stage because the path is at
//! most two stages long. The path itself is derived from the frozen
//! `manager_id`, and [`StageRecord`]s are projected from the stamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::request::{RequestStatus, SelfServiceRequest};
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStage {
    Manager,
    Admin,
}

impl ApprovalStage {
    /// Status a request carries while this stage is the one awaiting a decision.
    pub fn pending_status(self) -> RequestStatus {
        match self {
            ApprovalStage::Manager => RequestStatus::PendingManager,
            ApprovalStage::Admin => RequestStatus::PendingAdmin,
        }
    }

    /// Stage awaiting a decision for the given status, if any.
    pub fn awaiting(status: RequestStatus) -> Option<Self> {
        match status {
            RequestStatus::PendingManager => Some(ApprovalStage::Manager),
            RequestStatus::PendingAdmin => Some(ApprovalStage::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPath {
    stages: Vec<ApprovalStage>,
    manager_id: Option<UserId>,
}

impl ApprovalPath {
    /// Manager first, then admin.
    pub fn with_manager(manager_id: UserId) -> Self {
        Self {
            stages: vec![ApprovalStage::Manager, ApprovalStage::Admin],
            manager_id: Some(manager_id),
        }
    }

    pub fn admin_only() -> Self {
        Self {
            stages: vec![ApprovalStage::Admin],
            manager_id: None,
        }
    }

    pub fn from_frozen_manager(manager_id: Option<UserId>) -> Self {
        match manager_id {
            Some(id) => Self::with_manager(id),
            None => Self::admin_only(),
        }
    }

    pub fn stages(&self) -> &[ApprovalStage] {
        &self.stages
    }

    pub fn manager_id(&self) -> Option<UserId> {
        self.manager_id
    }

    pub fn initial_status(&self) -> RequestStatus {
        self.stages
            .first()
            .copied()
            .unwrap_or(ApprovalStage::Admin)
            .pending_status()
    }

    /// Projects each stage's outcome from the request's stamps.
    pub fn stage_records(&self, request: &SelfServiceRequest) -> Vec<StageRecord> {
        let current = ApprovalStage::awaiting(request.status);
        self.stages
            .iter()
            .map(|&stage| {
                let (approved_by, approved_at) = match stage {
                    ApprovalStage::Manager => {
                        (request.manager_approved_by, request.manager_approved_at)
                    }
                    ApprovalStage::Admin => (request.admin_approved_by, request.admin_approved_at),
                };
                let outcome = if approved_at.is_some() {
                    StageOutcome::Approved
                } else if current == Some(stage) {
                    StageOutcome::Pending
                } else {
                    let stopped_here = self.first_unapproved_stage(request) == stage;
                    match request.status {
                        RequestStatus::Rejected if stopped_here => StageOutcome::Rejected,
                        RequestStatus::Cancelled if stopped_here => StageOutcome::Withdrawn,
                        _ => StageOutcome::NotReached,
                    }
                };
                StageRecord {
                    stage,
                    assignee: match stage {
                        ApprovalStage::Manager => self.manager_id,
                        ApprovalStage::Admin => None,
                    },
                    required: true,
                    outcome,
                    approved_by,
                    approved_at,
                }
            })
            .collect()
    }

    // The stage a decided request stopped at is the first one without an
    // approval stamp.
    fn first_unapproved_stage(&self, request: &SelfServiceRequest) -> ApprovalStage {
        if self.manager_id.is_some() && request.manager_approved_at.is_none() {
            ApprovalStage::Manager
        } else {
            ApprovalStage::Admin
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
    NotReached,
}

/// One stage of a request's approval path as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: ApprovalStage,
    /// Frozen authorization target; `None` for the admin pool.
    pub assignee: Option<UserId>,
    pub required: bool,
    pub outcome: StageOutcome,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
}
