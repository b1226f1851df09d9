use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use flyjar_shared::api::{self, TOKEN_HEADER, messages};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{error, info, warn};

use super::{AppError, AppState};
use crate::storage::StorageError;

/// Random bytes per session token; hex encoding doubles the length.
const TOKEN_BYTES: usize = 16;

/// Identity resolved from the `token` header, available to protected handlers
/// as an `Extension`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub pokemon: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Resolves the raw `token` header to a user row. Every failure, including a
/// store error during lookup, is reported as an invalid session.
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = match req.headers().get(TOKEN_HEADER).map(|v| v.to_str()) {
        Some(Ok(t)) if !t.is_empty() => t.to_string(),
        Some(_) => {
            warn!("auth: unreadable or empty token header");
            return Err(AppError::InvalidSession);
        }
        None => {
            warn!("auth: token header missing");
            return Err(AppError::InvalidSession);
        }
    };

    let user = match state.store.find_user_by_token(&token).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("auth: token does not match any user");
            return Err(AppError::InvalidSession);
        }
        Err(e) => {
            error!(error=%e, "auth: find_user_by_token failed");
            return Err(AppError::InvalidSession);
        }
    };

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        pokemon: user.pokemon,
    });
    Ok(next.run(req).await)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<api::AuthReq>, JsonRejection>,
) -> Result<(StatusCode, Json<api::MessageResp>), AppError> {
    let Json(body) = payload.map_err(AppError::rejected(messages::MISSING_FIELDS))?;
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(AppError::validation(messages::MISSING_FIELDS));
    };

    let hash = hash_password(password, state.config.bcrypt_cost)
        .await
        .map_err(|e| {
            error!(username=%username, error=%e, "register: hashing failed");
            AppError::Validation {
                message: messages::REGISTER_FAILED,
                detail: e.to_string(),
            }
        })?;

    match state.store.create_user(&username, &hash).await {
        Ok(id) => {
            info!(username=%username, user_id = id, "register: user created");
            Ok((
                StatusCode::CREATED,
                Json(api::MessageResp::new(messages::USER_REGISTERED)),
            ))
        }
        Err(StorageError::Conflict(detail)) => {
            warn!(username=%username, %detail, "register: username taken");
            Err(AppError::DuplicateUsername)
        }
        Err(e) => Err(AppError::store(messages::REGISTER_FAILED)(e)),
    }
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<api::AuthReq>, JsonRejection>,
) -> Result<Json<api::LoginResp>, AppError> {
    let Json(body) = payload.map_err(AppError::rejected(messages::MISSING_FIELDS))?;
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(AppError::validation(messages::MISSING_FIELDS));
    };

    let user = state
        .store
        .find_user_by_username(&username)
        .await
        .map_err(|e| {
            error!(username=%username, error=%e, "login: lookup failed");
            AppError::UserNotFound
        })?
        .ok_or_else(|| {
            warn!(username=%username, "login: unknown username");
            AppError::UserNotFound
        })?;

    let valid = verify_password(password, user.password).await.map_err(|e| {
        error!(username=%username, error=%e, "login: bcrypt verify failed");
        AppError::InvalidCredentials
    })?;
    if !valid {
        warn!(username=%username, "login: invalid password");
        return Err(AppError::InvalidCredentials);
    }

    // Persist before answering so the returned token always resolves.
    let token = generate_token();
    state
        .store
        .set_user_token(user.id, &token)
        .await
        .map_err(AppError::store(messages::LOGIN_FAILED))?;
    info!(username=%username, user_id = user.id, "login: session issued");

    Ok(Json(api::LoginResp {
        message: messages::LOGIN_OK.to_string(),
        token,
    }))
}

/// 128 bits from the OS RNG, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}
