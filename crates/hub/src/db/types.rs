use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported external issue trackers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerKind {
    JiraCloud,
    JiraServer,
    JiraDatacenter,
}

impl TrackerKind {
    pub const ALL: [Self; 3] = [Self::JiraCloud, Self::JiraServer, Self::JiraDatacenter];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JiraCloud => "jira-cloud",
            Self::JiraServer => "jira-server",
            Self::JiraDatacenter => "jira-datacenter",
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tracker kind: {0}")]
pub struct UnknownTrackerKind(pub String);

impl FromStr for TrackerKind {
    type Err = UnknownTrackerKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownTrackerKind(value.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct NewTracker {
    pub name: String,
    pub url: String,
    pub kind: TrackerKind,
    pub identity_id: i64,
    pub create_user: String,
}

/// Caller-settable columns of a tracker. Metadata and audit columns are left untouched.
#[derive(Debug, Clone)]
pub struct TrackerUpdate {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub kind: TrackerKind,
    pub identity_id: i64,
    pub update_user: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub kind: TrackerKind,
    pub message: String,
    pub connected: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub metadata: String,
    pub identity_id: i64,
    pub identity_name: Option<String>,
    pub create_user: String,
    pub update_user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackerFilter {
    pub kind: Option<String>,
    pub connected: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub kind: String,
    pub user: String,
    pub password: String,
    pub create_user: String,
}

#[derive(Debug, Clone)]
pub struct IdentityRecord {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub user: String,
    pub create_user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub scopes: String,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub scopes: String,
}
