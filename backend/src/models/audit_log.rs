use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::request::{RequestAction, RequestStatus};
use crate::types::{RequestId, UserId};

/// One accepted transition of a request, including its submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TransitionRecord {
    pub request_id: RequestId,
    pub action: RequestAction,
    /// `None` for the submission entry.
    pub from_status: Option<RequestStatus>,
    pub to_status: RequestStatus,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
    pub reason: Option<String>,
}
