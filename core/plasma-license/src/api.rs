//! JSON bodies exchanged with the admin HTTP API.
//!
//! Durations cross this boundary as whole seconds (truncated), never as
//! structured values. Request fields are optional so the server can answer
//! a missing field with its own `400 {"error": "Missing <field>"}`.

use crate::key::{KeyString, KeySummary};
use crate::store::{Access, Validation, ValidationReason};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Converts an optional remaining time to whole seconds.
#[must_use]
pub fn to_seconds(remaining: Option<TimeDelta>) -> Option<i64> {
    remaining.map(|d| d.num_seconds())
}

/// Converts whole seconds back to a remaining time.
#[must_use]
pub fn from_seconds(seconds: Option<i64>) -> Option<TimeDelta> {
    seconds.and_then(TimeDelta::try_seconds)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default)]
    pub user_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub is_valid: bool,
    pub reason: String,
    pub time_remaining_seconds: Option<i64>,
}

impl From<&Validation> for ValidateResponse {
    fn from(v: &Validation) -> Self {
        Self {
            is_valid: v.is_valid(),
            reason: v.reason.message().to_string(),
            time_remaining_seconds: to_seconds(v.time_remaining),
        }
    }
}

impl From<ValidateResponse> for Validation {
    fn from(r: ValidateResponse) -> Self {
        let reason = ValidationReason::from_message(r.is_valid, &r.reason);
        if r.is_valid {
            Validation::accepted(from_seconds(r.time_remaining_seconds))
        } else {
            Validation::rejected(reason)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckAccessRequest {
    #[serde(default)]
    pub user_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAccessResponse {
    pub has_access: bool,
    pub key_type: Option<String>,
    pub time_remaining_seconds: Option<i64>,
}

impl From<&Access> for CheckAccessResponse {
    fn from(a: &Access) -> Self {
        Self {
            has_access: a.has_access,
            key_type: a.key_type.clone(),
            time_remaining_seconds: to_seconds(a.time_remaining),
        }
    }
}

impl From<CheckAccessResponse> for Access {
    fn from(r: CheckAccessResponse) -> Self {
        match (r.has_access, r.key_type) {
            (true, Some(key_type)) => Access::granted(key_type, from_seconds(r.time_remaining_seconds)),
            _ => Access::denied(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub custom_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub license_key: KeyString,
    pub key_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListKeysResponse {
    pub keys: Vec<KeySummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub license_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A reply that is either an `{"error": ...}` body or the expected payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiReply<T> {
    Failure(ErrorResponse),
    Success(T),
}
