//! Profile, jar and fly handlers. All of them sit behind `auth::require_token`.
//!
//! Jar queries carry the caller's id in their predicate. Fly queries only
//! filter by jar id, so any session may read or modify flies in any jar.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use flyjar_shared::api::{self, FlyDto, JarDto, messages};

use super::auth::AuthUser;
use super::{AppError, AppState};

type Created = (StatusCode, Json<api::MessageResp>);

fn created(message: &str) -> Created {
    (StatusCode::CREATED, Json(api::MessageResp::new(message)))
}

fn ok(message: &str) -> Json<api::MessageResp> {
    Json(api::MessageResp::new(message))
}

// Profile

pub async fn get_profile(Extension(user): Extension<AuthUser>) -> Json<api::ProfileResp> {
    Json(api::ProfileResp {
        message: messages::SESSION_ACTIVE.to_string(),
        username: user.username,
        pokemon: user.pokemon,
    })
}

/// An empty body counts as `{}` and clears the pokemon.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Bytes, BytesRejection>,
) -> Result<Json<api::MessageResp>, AppError> {
    let raw = payload.map_err(AppError::rejected(messages::POKEMON_FAILED))?;
    let body = if raw.iter().all(u8::is_ascii_whitespace) {
        api::ProfileUpdateReq::default()
    } else {
        let Json(body) = Json::<api::ProfileUpdateReq>::from_bytes(&raw)
            .map_err(AppError::rejected(messages::POKEMON_FAILED))?;
        body
    };
    state
        .store
        .set_user_pokemon(user.id, body.pokemon.as_deref())
        .await
        .map_err(AppError::store(messages::POKEMON_FAILED))?;
    Ok(ok(messages::POKEMON_ASSIGNED))
}

// Jars

pub async fn create_jar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<api::JarReq>, JsonRejection>,
) -> Result<Created, AppError> {
    let Json(body) = payload.map_err(AppError::rejected(messages::JAR_CREATE_FAILED))?;
    let name = body
        .name
        .ok_or_else(|| AppError::validation(messages::JAR_CREATE_FAILED))?;
    let jar = state
        .store
        .create_jar(user.id, &name)
        .await
        .map_err(AppError::store(messages::JAR_CREATE_FAILED))?;
    tracing::debug!(jar_id = jar.id, "create_jar");
    Ok(created(messages::JAR_CREATED))
}

pub async fn list_jars(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<JarDto>>, AppError> {
    let rows = state
        .store
        .list_jars(user.id)
        .await
        .map_err(AppError::store(messages::JAR_LIST_FAILED))?;
    Ok(Json(rows.into_iter().map(JarDto::from).collect()))
}

/// A miss (unknown id or someone else's jar) answers 200 with `null`.
pub async fn get_jar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Option<JarDto>>, AppError> {
    let Path(id) = id.map_err(AppError::rejected(messages::JAR_GET_FAILED))?;
    let jar = state
        .store
        .get_jar(user.id, id)
        .await
        .map_err(AppError::store(messages::JAR_GET_FAILED))?;
    Ok(Json(jar.map(JarDto::from)))
}

pub async fn rename_jar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<api::JarReq>, JsonRejection>,
) -> Result<Json<api::MessageResp>, AppError> {
    let Path(id) = id.map_err(AppError::rejected(messages::JAR_UPDATE_FAILED))?;
    let Json(body) = payload.map_err(AppError::rejected(messages::JAR_UPDATE_FAILED))?;
    let name = body
        .name
        .ok_or_else(|| AppError::validation(messages::JAR_UPDATE_FAILED))?;
    // Zero matched rows still counts as success
    state
        .store
        .rename_jar(user.id, id, &name)
        .await
        .map_err(AppError::store(messages::JAR_UPDATE_FAILED))?;
    Ok(ok(messages::JAR_UPDATED))
}

pub async fn delete_jar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<api::MessageResp>, AppError> {
    let Path(id) = id.map_err(AppError::rejected(messages::JAR_DELETE_FAILED))?;
    state
        .store
        .delete_jar(user.id, id)
        .await
        .map_err(AppError::store(messages::JAR_DELETE_FAILED))?;
    Ok(ok(messages::JAR_DELETED))
}

// Flies

pub async fn create_fly(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    payload: Result<Json<api::FlyReq>, JsonRejection>,
) -> Result<Created, AppError> {
    let Json(body) = payload.map_err(AppError::rejected(messages::FLY_CREATE_FAILED))?;
    let (Some(jar_id), Some(body_color)) = (body.jar_id, body.body_color) else {
        return Err(AppError::validation(messages::FLY_CREATE_FAILED));
    };
    let fly = state
        .store
        .create_fly(jar_id, &body_color)
        .await
        .map_err(AppError::store(messages::FLY_CREATE_FAILED))?;
    tracing::debug!(fly_id = fly.id, jar_id, "create_fly");
    Ok(created(messages::FLY_CREATED))
}

pub async fn list_flies(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    jar_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<FlyDto>>, AppError> {
    let Path(jar_id) = jar_id.map_err(AppError::rejected(messages::FLY_LIST_FAILED))?;
    let rows = state
        .store
        .list_flies(jar_id)
        .await
        .map_err(AppError::store(messages::FLY_LIST_FAILED))?;
    Ok(Json(rows.into_iter().map(FlyDto::from).collect()))
}

pub async fn delete_fly(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    ids: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<api::MessageResp>, AppError> {
    let Path((jar_id, id)) = ids.map_err(AppError::rejected(messages::FLY_DELETE_FAILED))?;
    state
        .store
        .delete_fly(jar_id, id)
        .await
        .map_err(AppError::store(messages::FLY_DELETE_FAILED))?;
    Ok(ok(messages::FLY_DELETED))
}
