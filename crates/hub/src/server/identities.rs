use axum::extract::rejection::JsonRejection;
use axum::extract::Path as AxumPath;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::Json;
use tower_sessions::Session;

use crate::db::{IdentityRecord, NewIdentity};

use super::api_types::{IdentityCreateRequest, IdentityResource};
use super::auth::require_scope;
use super::error::{
    api_internal_message, api_not_found, api_store_error, api_validation_error, ApiError,
};
use super::HubState;

const IDENTITIES_SCOPE: &str = "identities";

pub(super) async fn list_identities(
    State(state): State<HubState>,
    session: Session,
) -> Result<Json<Vec<IdentityResource>>, ApiError> {
    require_scope(&session, IDENTITIES_SCOPE, &Method::GET).await?;

    let identities = state
        .db
        .list_identities()
        .await
        .map_err(|err| api_store_error("identity", err))?;

    Ok(Json(identities.into_iter().map(map_identity_record).collect()))
}

pub(super) async fn get_identity(
    State(state): State<HubState>,
    session: Session,
    AxumPath(identity_id): AxumPath<i64>,
) -> Result<Json<IdentityResource>, ApiError> {
    require_scope(&session, IDENTITIES_SCOPE, &Method::GET).await?;

    let identity = state
        .db
        .get_identity_by_id(identity_id)
        .await
        .map_err(|err| api_store_error("identity", err))?
        .ok_or_else(|| api_not_found("identity not found"))?;

    Ok(Json(map_identity_record(identity)))
}

pub(super) async fn create_identity(
    State(state): State<HubState>,
    session: Session,
    payload: Result<Json<IdentityCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IdentityResource>), ApiError> {
    let user = require_scope(&session, IDENTITIES_SCOPE, &Method::POST).await?;
    let Json(payload) = payload?;

    if payload.name.trim().is_empty() || payload.kind.trim().is_empty() {
        return Err(api_validation_error("name and kind are required"));
    }

    let identity_id = state
        .db
        .insert_identity(&NewIdentity {
            name: payload.name,
            kind: payload.kind,
            user: payload.user,
            password: payload.password,
            create_user: user.username,
        })
        .await
        .map_err(|err| api_store_error("identity", err))?;

    let identity = state
        .db
        .get_identity_by_id(identity_id)
        .await
        .map_err(|err| api_store_error("identity", err))?
        .ok_or_else(|| api_internal_message("created identity could not be reloaded"))?;

    tracing::info!(identity_id, name = %identity.name, "identity created");
    Ok((StatusCode::CREATED, Json(map_identity_record(identity))))
}

pub(super) async fn delete_identity(
    State(state): State<HubState>,
    session: Session,
    AxumPath(identity_id): AxumPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_scope(&session, IDENTITIES_SCOPE, &Method::DELETE).await?;

    state
        .db
        .delete_identity_by_id(identity_id)
        .await
        .map_err(|err| api_store_error("identity", err))?;

    Ok(StatusCode::NO_CONTENT)
}

fn map_identity_record(identity: IdentityRecord) -> IdentityResource {
    IdentityResource {
        id: identity.id,
        name: identity.name,
        kind: identity.kind,
        user: identity.user,
        create_user: identity.create_user,
        create_time: identity.created_at,
    }
}
