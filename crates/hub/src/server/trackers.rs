use axum::extract::rejection::JsonRejection;
use axum::extract::Path as AxumPath;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::Json;
use tower_sessions::Session;

use crate::db::TrackerFilter;

use super::api_types::{TrackerListQuery, TrackerResource};
use super::auth::require_scope;
use super::error::{
    api_bad_query, api_internal_message, api_not_found, api_store_error, api_validation_error,
    ApiError,
};
use super::tracker_mapping::{map_new_tracker, map_tracker_record, map_tracker_update};
use super::HubState;

const TRACKERS_SCOPE: &str = "trackers";

pub(super) async fn list_trackers(
    State(state): State<HubState>,
    session: Session,
    Query(query): Query<TrackerListQuery>,
) -> Result<Json<Vec<TrackerResource>>, ApiError> {
    require_scope(&session, TRACKERS_SCOPE, &Method::GET).await?;

    let connected = query
        .connected
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(|raw| parse_bool(raw).ok_or_else(api_bad_query))
        .transpose()?;
    let filter = TrackerFilter {
        kind: query.kind.filter(|value| !value.is_empty()),
        connected,
    };

    let trackers = state
        .db
        .list_trackers(&filter)
        .await
        .map_err(|err| api_store_error("tracker", err))?;

    Ok(Json(trackers.into_iter().map(map_tracker_record).collect()))
}

pub(super) async fn get_tracker(
    State(state): State<HubState>,
    session: Session,
    AxumPath(tracker_id): AxumPath<i64>,
) -> Result<Json<TrackerResource>, ApiError> {
    require_scope(&session, TRACKERS_SCOPE, &Method::GET).await?;

    let tracker = state
        .db
        .get_tracker_by_id(tracker_id)
        .await
        .map_err(|err| api_store_error("tracker", err))?
        .ok_or_else(|| api_not_found("tracker not found"))?;

    Ok(Json(map_tracker_record(tracker)))
}

pub(super) async fn create_tracker(
    State(state): State<HubState>,
    session: Session,
    payload: Result<Json<TrackerResource>, JsonRejection>,
) -> Result<(StatusCode, Json<TrackerResource>), ApiError> {
    let user = require_scope(&session, TRACKERS_SCOPE, &Method::POST).await?;
    let Json(resource) = payload?;
    validate_tracker(&resource)?;

    let tracker_id = state
        .db
        .insert_tracker(&map_new_tracker(resource, user.username))
        .await
        .map_err(|err| api_store_error("tracker", err))?;

    let tracker = state
        .db
        .get_tracker_by_id(tracker_id)
        .await
        .map_err(|err| api_store_error("tracker", err))?
        .ok_or_else(|| api_internal_message("created tracker could not be reloaded"))?;

    tracing::info!(tracker_id, name = %tracker.name, kind = %tracker.kind, "tracker created");
    Ok((StatusCode::CREATED, Json(map_tracker_record(tracker))))
}

pub(super) async fn update_tracker(
    State(state): State<HubState>,
    session: Session,
    AxumPath(tracker_id): AxumPath<i64>,
    payload: Result<Json<TrackerResource>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let user = require_scope(&session, TRACKERS_SCOPE, &Method::PUT).await?;
    let Json(resource) = payload?;
    validate_tracker(&resource)?;

    state
        .db
        .update_tracker(&map_tracker_update(tracker_id, resource, user.username))
        .await
        .map_err(|err| api_store_error("tracker", err))?;

    tracing::info!(tracker_id, "tracker updated");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn delete_tracker(
    State(state): State<HubState>,
    session: Session,
    AxumPath(tracker_id): AxumPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_scope(&session, TRACKERS_SCOPE, &Method::DELETE).await?;

    state
        .db
        .get_tracker_by_id(tracker_id)
        .await
        .map_err(|err| api_store_error("tracker", err))?
        .ok_or_else(|| api_not_found("tracker not found"))?;

    state
        .db
        .delete_tracker_by_id(tracker_id)
        .await
        .map_err(|err| api_store_error("tracker", err))?;

    tracing::info!(tracker_id, "tracker deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_tracker(resource: &TrackerResource) -> Result<(), ApiError> {
    if resource.name.trim().is_empty() {
        return Err(api_validation_error("name is required"));
    }
    if resource.url.trim().is_empty() {
        return Err(api_validation_error("url is required"));
    }
    if resource.identity.id <= 0 {
        return Err(api_validation_error("identity.id is required"));
    }

    Ok(())
}

/// Accepts the same spellings as the `connected` filter has always accepted.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
