//! Validation rules for self-service request payloads.

use serde_json::Value;
use validator::ValidationError;

use crate::models::request::{NewRequest, RequestType};

/// Maximum accepted length of a rejection reason.
pub const MAX_REJECTION_REASON_LENGTH: usize = 500;

/// Cross-field checks for a submission.
///
/// Requirements:
/// - `end_date`, when given, is not before `start_date`
/// - `permission` requests cover a single day
/// - `leave_policy_id` is only given for `leave` requests
/// - `request_data`, when given, is a JSON object
pub fn validate_new_request(payload: &NewRequest) -> Result<(), ValidationError> {
    if payload.effective_end_date() < payload.start_date {
        return Err(ValidationError::new("end_date_before_start_date"));
    }
    if payload.request_type == RequestType::Permission
        && payload.effective_end_date() != payload.start_date
    {
        return Err(ValidationError::new("permission_must_be_single_day"));
    }
    if payload.request_type != RequestType::Leave && payload.leave_policy_id.is_some() {
        return Err(ValidationError::new("leave_policy_only_for_leave"));
    }
    if let Some(data) = &payload.request_data {
        if !matches!(data, Value::Object(_) | Value::Null) {
            return Err(ValidationError::new("request_data_must_be_object"));
        }
    }
    Ok(())
}

/// Validates a rejection reason and returns it trimmed.
pub fn validate_rejection_reason(reason: &str) -> Result<String, ValidationError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("rejection_reason_required"));
    }
    if trimmed.chars().count() > MAX_REJECTION_REASON_LENGTH {
        return Err(ValidationError::new("rejection_reason_too_long"));
    }
    Ok(trimmed.to_string())
}
