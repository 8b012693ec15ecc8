use crate::db::{NewTracker, TrackerRecord, TrackerUpdate};

use super::api_types::{Metadata, Ref, TrackerResource};

pub(super) fn map_tracker_record(tracker: TrackerRecord) -> TrackerResource {
    TrackerResource {
        id: tracker.id,
        create_user: tracker.create_user,
        update_user: tracker.update_user,
        create_time: Some(tracker.created_at),
        name: tracker.name,
        url: tracker.url,
        kind: tracker.kind,
        message: tracker.message,
        connected: tracker.connected,
        last_updated: tracker.last_updated,
        metadata: parse_metadata(&tracker.metadata),
        identity: Ref {
            id: tracker.identity_id,
            name: tracker.identity_name.unwrap_or_default(),
        },
    }
}

/// Only caller-settable fields are copied; status, metadata and audit fields stay server-owned.
pub(super) fn map_new_tracker(resource: TrackerResource, create_user: String) -> NewTracker {
    NewTracker {
        name: resource.name,
        url: resource.url,
        kind: resource.kind,
        identity_id: resource.identity.id,
        create_user,
    }
}

pub(super) fn map_tracker_update(
    tracker_id: i64,
    resource: TrackerResource,
    update_user: String,
) -> TrackerUpdate {
    TrackerUpdate {
        id: tracker_id,
        name: resource.name,
        url: resource.url,
        kind: resource.kind,
        identity_id: resource.identity.id,
        update_user,
    }
}

fn parse_metadata(raw: &str) -> Metadata {
    serde_json::from_str::<Metadata>(raw).unwrap_or_default()
}
