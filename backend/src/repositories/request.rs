use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::audit_log::TransitionRecord;
use crate::models::request::{RequestStatus, RequestType, SelfServiceRequest};
use crate::models::PaginationQuery;
use crate::types::{RequestId, UserId};
use crate::workflow::transition::Transition;

/// Which requests a listing may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestScope {
    /// Requests owned by the employee.
    Employee(UserId),
    /// Requests whose frozen manager is one of these users.
    Managers(Vec<UserId>),
    All,
}

impl RequestScope {
    pub fn contains(&self, request: &SelfServiceRequest) -> bool {
        match self {
            RequestScope::Employee(id) => request.employee_id == *id,
            RequestScope::Managers(ids) => request
                .manager_id
                .is_some_and(|manager_id| ids.contains(&manager_id)),
            RequestScope::All => true,
        }
    }
}

/// Filters for querying request lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListFilters {
    pub status: Option<RequestStatus>,
    #[serde(rename = "type")]
    pub request_type: Option<RequestType>,
    /// Requests ending on or after this date.
    pub from: Option<NaiveDate>,
    /// Requests starting on or before this date.
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RequestListFilters {
    pub fn pagination(&self) -> PaginationQuery {
        let defaults = PaginationQuery::default();
        PaginationQuery {
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
        }
    }

    pub fn matches(&self, request: &SelfServiceRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.request_type.map_or(true, |t| request.request_type == t)
            && self.from.map_or(true, |from| request.end_date >= from)
            && self.to.map_or(true, |to| request.start_date <= to)
    }
}

/// Result of a compare-and-swap commit on a request's status.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Status matched the transition's `from`; stamps and audit entry written.
    Applied(SelfServiceRequest),
    /// Status had already moved on; nothing was written.
    Stale(SelfServiceRequest),
    Missing,
}

/// Durable home of requests and their audit log.
///
/// Implementations must make `commit_transition` atomic and linearizable per
/// request: the status check, the stamp update and the audit append happen
/// together or not at all.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persists a new request together with its submission audit entry.
    async fn insert(
        &self,
        request: &SelfServiceRequest,
        submitted: &TransitionRecord,
    ) -> anyhow::Result<()>;

    async fn find_by_id(&self, id: RequestId) -> anyhow::Result<Option<SelfServiceRequest>>;

    async fn commit_transition(&self, transition: &Transition) -> anyhow::Result<CommitOutcome>;

    /// Newest first.
    async fn list(
        &self,
        scope: RequestScope,
        filters: &RequestListFilters,
    ) -> anyhow::Result<Vec<SelfServiceRequest>>;

    /// Audit entries in commit order.
    async fn audit_trail(&self, id: RequestId) -> anyhow::Result<Vec<TransitionRecord>>;
}
