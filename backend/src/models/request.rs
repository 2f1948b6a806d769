//! The self-service request entity and its enums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use std::fmt;
use validator::Validate;

use crate::models::approval::{ApprovalPath, StageRecord};
use crate::types::{RequestId, UserId};
use crate::validation::rules;

/// Kind of self-service request. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Leave,
    Wfh,
    Permission,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Leave => "leave",
            RequestType::Wfh => "wfh",
            RequestType::Permission => "permission",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingManager,
    PendingAdmin,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::PendingManager => "pending_manager",
            RequestStatus::PendingAdmin => "pending_admin",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses are absorbing: no command is accepted from them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }

    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Submit,
    Approve,
    Reject,
    Cancel,
}

impl RequestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestAction::Submit => "submit",
            RequestAction::Approve => "approve",
            RequestAction::Reject => "reject",
            RequestAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One employee-initiated request and every stamp its approval path produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SelfServiceRequest {
    pub id: RequestId,
    pub employee_id: UserId,
    pub request_type: RequestType,
    /// Only meaningful for `leave` requests.
    pub leave_policy_id: Option<String>,
    pub status: RequestStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub request_data: Json<Value>,
    pub notes: Option<String>,
    /// Manager captured at submission. Never re-derived from the directory.
    pub manager_id: Option<UserId>,
    pub manager_approved_at: Option<DateTime<Utc>>,
    pub manager_approved_by: Option<UserId>,
    pub admin_approved_at: Option<DateTime<Utc>>,
    pub admin_approved_by: Option<UserId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "rules::validate_new_request"))]
pub struct NewRequest {
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    /// Defaults to `start_date` for single-day requests.
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub request_data: Option<Value>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub leave_policy_id: Option<String>,
}

impl NewRequest {
    pub fn effective_end_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

impl SelfServiceRequest {
    /// Builds a freshly submitted request whose status and manager come from
    /// the resolved approval path.
    pub fn new(
        employee_id: UserId,
        payload: NewRequest,
        path: &ApprovalPath,
        now: DateTime<Utc>,
    ) -> Self {
        let end_date = payload.effective_end_date();
        Self {
            id: RequestId::new(),
            employee_id,
            request_type: payload.request_type,
            leave_policy_id: payload.leave_policy_id,
            status: path.initial_status(),
            start_date: payload.start_date,
            end_date,
            request_data: Json(payload.request_data.unwrap_or(Value::Null)),
            notes: payload.notes,
            manager_id: path.manager_id(),
            manager_approved_at: None,
            manager_approved_by: None,
            admin_approved_at: None,
            admin_approved_by: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn approval_path(&self) -> ApprovalPath {
        ApprovalPath::from_frozen_manager(self.manager_id)
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Checks that the stamped fields agree with `status`.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.end_date < self.start_date {
            return Err("end_date precedes start_date".into());
        }
        if self.manager_approved_at.is_some() != self.manager_approved_by.is_some() {
            return Err("manager approval stamp is incomplete".into());
        }
        if self.admin_approved_at.is_some() != self.admin_approved_by.is_some() {
            return Err("admin approval stamp is incomplete".into());
        }
        if self.rejected_at.is_some() != self.rejected_by.is_some() {
            return Err("rejection stamp is incomplete".into());
        }
        if self.rejected_at.is_some()
            && self
                .rejection_reason
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
        {
            return Err("rejection without a reason".into());
        }
        if self.manager_id.is_none() && self.manager_approved_at.is_some() {
            return Err("manager approval on a request without a manager".into());
        }

        let manager_passed = self.manager_approved_at.is_some();
        let manager_stage_cleared = self.manager_id.is_none() || manager_passed;
        let admin = self.admin_approved_at.is_some();
        let rejected = self.rejected_at.is_some();
        let cancelled = self.cancelled_at.is_some();

        let ok = match self.status {
            RequestStatus::PendingManager => {
                self.manager_id.is_some() && !manager_passed && !admin && !rejected && !cancelled
            }
            RequestStatus::PendingAdmin => manager_stage_cleared && !admin && !rejected && !cancelled,
            RequestStatus::Approved => manager_stage_cleared && admin && !rejected && !cancelled,
            RequestStatus::Rejected => rejected && !admin && !cancelled,
            RequestStatus::Cancelled => cancelled && !admin && !rejected,
        };
        if ok {
            Ok(())
        } else {
            Err(format!("stamps inconsistent with status {}", self.status))
        }
    }
}

/// API projection of a request, including its derived approval path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestResponse {
    pub id: RequestId,
    pub employee_id: UserId,
    pub request_type: RequestType,
    pub leave_policy_id: Option<String>,
    pub status: RequestStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub request_data: Value,
    pub notes: Option<String>,
    pub manager_id: Option<UserId>,
    pub manager_approved_at: Option<DateTime<Utc>>,
    pub manager_approved_by: Option<UserId>,
    pub admin_approved_at: Option<DateTime<Utc>>,
    pub admin_approved_by: Option<UserId>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub approval_path: Vec<StageRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SelfServiceRequest> for RequestResponse {
    fn from(request: SelfServiceRequest) -> Self {
        let approval_path = request.approval_path().stage_records(&request);
        RequestResponse {
            id: request.id,
            employee_id: request.employee_id,
            request_type: request.request_type,
            leave_policy_id: request.leave_policy_id,
            status: request.status,
            start_date: request.start_date,
            end_date: request.end_date,
            request_data: request.request_data.0,
            notes: request.notes,
            manager_id: request.manager_id,
            manager_approved_at: request.manager_approved_at,
            manager_approved_by: request.manager_approved_by,
            admin_approved_at: request.admin_approved_at,
            admin_approved_by: request.admin_approved_by,
            rejected_at: request.rejected_at,
            rejected_by: request.rejected_by,
            rejection_reason: request.rejection_reason,
            cancelled_at: request.cancelled_at,
            approval_path,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave_payload() -> NewRequest {
        NewRequest {
            request_type: RequestType::Leave,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()),
            request_data: None,
            notes: Some("family trip".into()),
            leave_policy_id: Some("annual".into()),
        }
    }

    #[test]
    fn request_enums_serde_snake_case() {
        let rt: RequestType = serde_json::from_str("\"wfh\"").unwrap();
        assert_eq!(rt, RequestType::Wfh);

        let rs: RequestStatus = serde_json::from_str("\"pending_manager\"").unwrap();
        assert_eq!(rs, RequestStatus::PendingManager);
        let v = serde_json::to_value(RequestStatus::PendingAdmin).unwrap();
        assert_eq!(v, serde_json::json!("pending_admin"));

        assert_eq!(RequestAction::Cancel.to_string(), "cancel");
        assert_eq!(RequestType::Permission.to_string(), "permission");
        assert_eq!(RequestStatus::PendingManager.to_string(), "pending_manager");
    }

    #[test]
    fn only_decided_statuses_are_terminal() {
        assert!(!RequestStatus::PendingManager.is_terminal());
        assert!(!RequestStatus::PendingAdmin.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn new_request_takes_status_and_manager_from_path() {
        let employee = UserId::new();
        let manager = UserId::new();
        let now = Utc::now();

        let with_manager =
            SelfServiceRequest::new(employee, leave_payload(), &ApprovalPath::with_manager(manager), now);
        assert_eq!(with_manager.status, RequestStatus::PendingManager);
        assert_eq!(with_manager.manager_id, Some(manager));
        assert!(with_manager.check_consistency().is_ok());

        let admin_only =
            SelfServiceRequest::new(employee, leave_payload(), &ApprovalPath::admin_only(), now);
        assert_eq!(admin_only.status, RequestStatus::PendingAdmin);
        assert_eq!(admin_only.manager_id, None);
        assert!(admin_only.check_consistency().is_ok());
    }

    #[test]
    fn single_day_request_defaults_end_date() {
        let mut payload = leave_payload();
        payload.end_date = None;
        let request = SelfServiceRequest::new(
            UserId::new(),
            payload,
            &ApprovalPath::admin_only(),
            Utc::now(),
        );
        assert_eq!(request.start_date, request.end_date);
    }

    #[test]
    fn consistency_check_flags_mixed_stamps() {
        let now = Utc::now();
        let mut request = SelfServiceRequest::new(
            UserId::new(),
            leave_payload(),
            &ApprovalPath::admin_only(),
            now,
        );
        request.status = RequestStatus::Rejected;
        request.rejected_at = Some(now);
        request.rejected_by = Some(UserId::new());
        request.rejection_reason = Some("no cover".into());
        assert!(request.check_consistency().is_ok());

        request.admin_approved_at = Some(now);
        request.admin_approved_by = Some(UserId::new());
        assert!(request.check_consistency().is_err());
    }

    #[test]
    fn consistency_check_requires_rejection_reason() {
        let now = Utc::now();
        let mut request = SelfServiceRequest::new(
            UserId::new(),
            leave_payload(),
            &ApprovalPath::admin_only(),
            now,
        );
        request.status = RequestStatus::Rejected;
        request.rejected_at = Some(now);
        request.rejected_by = Some(UserId::new());
        request.rejection_reason = Some("   ".into());
        assert!(request.check_consistency().is_err());
    }

    #[test]
    fn response_includes_derived_path() {
        let request = SelfServiceRequest::new(
            UserId::new(),
            leave_payload(),
            &ApprovalPath::with_manager(UserId::new()),
            Utc::now(),
        );
        let response = RequestResponse::from(request);
        assert_eq!(response.approval_path.len(), 2);
        assert_eq!(response.request_data, Value::Null);
    }
}
