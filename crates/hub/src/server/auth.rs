use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::db::NewUser;

use super::api_types::{AuthStatusResponse, LoginRequest, SetupRequest};
use super::error::{
    api_conflict, api_forbidden, api_internal_message, api_unauthorized, api_validation_error,
    ApiError,
};
use super::HubState;

const SESSION_USER_KEY: &str = "user";
const ALL_SCOPES: &str = "*";
const MIN_PASSWORD_LEN: usize = 8;

/// Caller identity kept in the session after login.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(super) struct SessionUser {
    pub(super) id: String,
    pub(super) username: String,
    pub(super) scopes: Vec<String>,
}

pub(super) async fn auth_setup(
    State(state): State<HubState>,
    session: Session,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    if payload.username.trim().is_empty() || payload.password.len() < MIN_PASSWORD_LEN {
        return Err(api_validation_error(
            "username is required and password must be at least 8 characters",
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| api_internal_message("failed to hash password"))?
        .to_string();

    let new_user = NewUser {
        id: Uuid::new_v4().to_string(),
        username: payload.username.trim().to_string(),
        password_hash,
        scopes: ALL_SCOPES.to_string(),
    };

    let inserted = state.db.insert_first_user(&new_user).await.map_err(|error| {
        tracing::error!(error = ?error, "failed to insert user");
        api_internal_message("failed to create user")
    })?;
    if !inserted {
        return Err(api_conflict("setup has already been completed"));
    }

    tracing::info!(username = %new_user.username, "initial user created");
    store_session_user(
        &session,
        SessionUser {
            id: new_user.id,
            username: new_user.username,
            scopes: parse_scopes(&new_user.scopes),
        },
    )
    .await?;

    Ok(StatusCode::CREATED)
}

pub(super) async fn auth_login(
    State(state): State<HubState>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    let user = state
        .db
        .find_user_by_username(payload.username.trim())
        .await
        .map_err(|error| {
            tracing::error!(error = ?error, "failed to look up user");
            api_internal_message("failed to look up user")
        })?
        .ok_or_else(|| api_unauthorized("invalid username or password"))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| api_unauthorized("invalid username or password"))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| api_unauthorized("invalid username or password"))?;

    // Drop any previous session id before binding the new user.
    session
        .cycle_id()
        .await
        .map_err(|_| api_internal_message("failed to rotate session"))?;

    store_session_user(
        &session,
        SessionUser {
            id: user.id,
            scopes: parse_scopes(&user.scopes),
            username: user.username,
        },
    )
    .await?;

    Ok(StatusCode::OK)
}

pub(super) async fn auth_logout(session: Session) -> Result<StatusCode, ApiError> {
    session
        .flush()
        .await
        .map_err(|_| api_internal_message("failed to end session"))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn auth_status(
    State(state): State<HubState>,
    session: Session,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    let users_count = state.db.users_count().await.map_err(|error| {
        tracing::error!(error = ?error, "failed to count users");
        api_internal_message("failed to count users")
    })?;

    let user = load_session_user(&session).await?;

    Ok(Json(AuthStatusResponse {
        users_count,
        authenticated: user.is_some(),
        username: user.map(|user| user.username),
    }))
}

/// Resolves the session user and checks it holds `resource` for `method`.
pub(super) async fn require_scope(
    session: &Session,
    resource: &str,
    method: &Method,
) -> Result<SessionUser, ApiError> {
    let user = load_session_user(session)
        .await?
        .ok_or_else(|| api_unauthorized("authentication required"))?;

    if !scope_allows(&user.scopes, resource, method) {
        let verb = method.as_str().to_ascii_lowercase();
        tracing::warn!(username = %user.username, resource, verb, "scope denied");
        return Err(api_forbidden(&format!("missing scope {resource}:{verb}")));
    }

    Ok(user)
}

fn scope_allows(scopes: &[String], resource: &str, method: &Method) -> bool {
    let verb = method.as_str().to_ascii_lowercase();
    scopes.iter().map(String::as_str).map(str::trim).any(|scope| {
        scope == ALL_SCOPES
            || scope == resource
            || scope
                .split_once(':')
                .is_some_and(|(scope_resource, scope_verb)| {
                    scope_resource == resource && (scope_verb == "*" || scope_verb == verb)
                })
    })
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(ToString::to_string).collect()
}

async fn load_session_user(session: &Session) -> Result<Option<SessionUser>, ApiError> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(|_| api_internal_message("failed to read session"))
}

async fn store_session_user(session: &Session, user: SessionUser) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|_| api_internal_message("failed to write session"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(raw: &str) -> Vec<String> {
        parse_scopes(raw)
    }

    #[test]
    fn wildcard_and_bare_resource_allow_every_method() {
        assert!(scope_allows(&scopes("*"), "trackers", &Method::DELETE));
        assert!(scope_allows(&scopes("identities trackers"), "trackers", &Method::PUT));
        assert!(scope_allows(&scopes("trackers:*"), "trackers", &Method::POST));
    }

    #[test]
    fn verb_scopes_allow_only_their_method() {
        let granted = scopes("trackers:get identities:post");
        assert!(scope_allows(&granted, "trackers", &Method::GET));
        assert!(!scope_allows(&granted, "trackers", &Method::POST));
        assert!(!scope_allows(&granted, "identities", &Method::GET));
    }

    #[test]
    fn empty_or_unrelated_scopes_deny() {
        assert!(!scope_allows(&[], "trackers", &Method::GET));
        assert!(!scope_allows(&scopes("tracker trackersx:get"), "trackers", &Method::GET));
    }
}
