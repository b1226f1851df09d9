pub mod auth;
pub mod config;
mod error;
mod handlers;

use crate::server::auth::AuthUser;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Router,
    http::{Method, header},
    routing::{delete, get, post},
};
pub use config::{AppConfig, ConfigError};
pub use error::AppError;
use flyjar_shared::api::{TOKEN_HEADER, messages};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: crate::storage::Store,
}

impl AppState {
    pub fn new(config: AppConfig, store: crate::storage::Store) -> Self {
        Self { config, store }
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let private = Router::new()
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/jars", get(handlers::list_jars).post(handlers::create_jar))
        .route(
            "/jars/{id}",
            get(handlers::get_jar)
                .put(handlers::rename_jar)
                .delete(handlers::delete_jar),
        )
        .route("/flies", post(handlers::create_fly))
        .route("/flies/{jar_id}", get(handlers::list_flies))
        .route("/flies/{jar_id}/{id}", delete(handlers::delete_fly))
        .with_state(state.clone())
        .route_layer(middleware::from_fn(set_auth_span_fields))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            user_id = tracing::field::Empty,
            username = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(private)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    match state.config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => app.layer(cors_layer(origin)),
        Some(Err(e)) => {
            tracing::warn!(error=%e, "invalid cors_origin; CORS disabled");
            app
        }
        None => app,
    }
}

fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(TOKEN_HEADER),
        ])
        .allow_credentials(true)
}

async fn root() -> &'static str {
    messages::ROOT_OK
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    // Every response carries per-user state
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    );

    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(user) = req.extensions().get::<AuthUser>() {
        let span = Span::current();
        span.record("user_id", user.id);
        span.record("username", tracing::field::display(&user.username));
    }
    Ok(next.run(req).await)
}
