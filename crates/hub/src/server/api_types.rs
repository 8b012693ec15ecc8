use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::TrackerKind;

/// Free-form tracker metadata, stored as a JSON blob.
pub(super) type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize)]
pub(super) struct ErrorResponse {
    pub(super) code: String,
    pub(super) message: String,
}

/// Lightweight reference to a related entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub(super) struct Ref {
    #[serde(default)]
    pub(super) id: i64,
    #[serde(default)]
    pub(super) name: String,
}

/// Wire shape of a tracker. Server-managed fields default when absent from a request body.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(super) struct TrackerResource {
    #[serde(default)]
    pub(super) id: i64,
    #[serde(default)]
    pub(super) create_user: String,
    #[serde(default)]
    pub(super) update_user: String,
    #[serde(default)]
    pub(super) create_time: Option<DateTime<Utc>>,
    pub(super) name: String,
    pub(super) url: String,
    pub(super) kind: TrackerKind,
    #[serde(default)]
    pub(super) message: String,
    #[serde(default)]
    pub(super) connected: bool,
    #[serde(default)]
    pub(super) last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(super) metadata: Metadata,
    pub(super) identity: Ref,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TrackerListQuery {
    pub(super) kind: Option<String>,
    pub(super) connected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IdentityCreateRequest {
    pub(super) name: String,
    pub(super) kind: String,
    #[serde(default)]
    pub(super) user: String,
    #[serde(default)]
    pub(super) password: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IdentityResource {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) kind: String,
    pub(super) user: String,
    pub(super) create_user: String,
    pub(super) create_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SetupRequest {
    pub(super) username: String,
    pub(super) password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub(super) username: String,
    pub(super) password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AuthStatusResponse {
    pub(super) users_count: i64,
    pub(super) authenticated: bool,
    pub(super) username: Option<String>,
}
