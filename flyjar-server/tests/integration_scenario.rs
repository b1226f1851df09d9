use axum::http::StatusCode;
use flyjar_server::{server, storage};
use flyjar_shared::api::{endpoints as ep, messages};
use reqwest::Client;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;

const ALLOWED_ORIGIN: &str = "https://app.example.test";

struct TestServer {
    base: String,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
    _tempdir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Option<Self> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let (addr, handle) = match start_server(&db_path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to start server: {e}"),
        };
        Some(Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            handle,
            _tempdir: dir,
        })
    }

    fn url(&self, f: impl FnOnce(&str) -> String) -> String {
        f(&self.base)
    }

    async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            &self.url(ep::register),
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await
    }

    async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            &self.url(ep::login),
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await
    }

    /// Registers and logs in, returning the session token.
    async fn session(&self, username: &str, password: &str) -> String {
        let (status, body) = self.register(username, password).await;
        assert_eq!(status, StatusCode::CREATED, "register: {body:?}");
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login: {body:?}");
        body.get("token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .expect("token missing from login response")
    }

    async fn request(
        &self,
        method: &str,
        url: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = match method {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "DELETE" => self.client.delete(url),
            other => panic!("unsupported method {other}"),
        };
        if let Some(t) = token {
            req = req.header("token", t);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let text = resp.text().await.unwrap();
        let val = if text.is_empty() {
            json!(null)
        } else {
            serde_json::from_str(&text).unwrap_or(json!({"raw": text}))
        };
        (status, val)
    }

    async fn request_expect(
        &self,
        method: &str,
        url: &str,
        token: Option<&str>,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let (status, value) = self.request(method, url, token, body).await;
        assert_eq!(
            status, expected,
            "{method} {url} returned {status:?} with body {value:?}",
        );
        value
    }

    async fn create_jar(&self, token: &str, name: &str) -> i32 {
        self.request_expect(
            "POST",
            &self.url(ep::jars),
            Some(token),
            Some(json!({"name": name})),
            StatusCode::CREATED,
        )
        .await;
        let jars = self.list_jars(token).await;
        jars.iter()
            .rev()
            .find(|j| j["name"] == name)
            .and_then(|j| j["id"].as_i64())
            .expect("created jar not listed") as i32
    }

    async fn list_jars(&self, token: &str) -> Vec<Value> {
        self.request_expect("GET", &self.url(ep::jars), Some(token), None, StatusCode::OK)
            .await
            .as_array()
            .cloned()
            .expect("jar list is an array")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(
    tmp_db: &Path,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let config = server::AppConfig {
        cors_origin: Some(ALLOWED_ORIGIN.into()),
        listen_port: None,
        db_path: None,
        bcrypt_cost: 4,
    };

    let store = storage::Store::connect_sqlite(tmp_db.to_str().unwrap())
        .await
        .expect("db");

    let state = server::AppState::new(config, store);
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((addr, handle))
}

#[tokio::test]
async fn root_answers_plain_text() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let resp = server.client.get(server.url(ep::root)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("x-request-id").is_some());
    assert_eq!(resp.text().await.unwrap(), messages::ROOT_OK);
}

#[tokio::test]
async fn registering_twice_is_a_duplicate() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let (status, body) = server.register("alice", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], messages::USER_REGISTERED);

    let (status, body) = server.register("alice", "other").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], messages::USER_EXISTS);
}

#[tokio::test]
async fn login_failures_distinguish_unknown_user_and_wrong_password() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    server.register("alice", "pw1").await;

    let (status, body) = server.login("alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], messages::WRONG_PASSWORD);

    let (status, body) = server.login("nobody", "pw1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], messages::USER_NOT_FOUND);
}

#[tokio::test]
async fn login_returns_a_hex_token_that_resolves_to_the_user() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    server.register("alice", "pw1").await;
    let (status, body) = server.login("alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], messages::LOGIN_OK);
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let profile = server
        .request_expect(
            "GET",
            &server.url(ep::profile),
            Some(token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["message"], messages::SESSION_ACTIVE);
}

#[tokio::test]
async fn new_login_invalidates_previous_token() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let first = server.session("alice", "pw1").await;
    let (_, body) = server.login("alice", "pw1").await;
    let second = body["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let body = server
        .request_expect(
            "GET",
            &server.url(ep::profile),
            Some(&first),
            None,
            StatusCode::UNAUTHORIZED,
        )
        .await;
    assert_eq!(body["error"], messages::INVALID_SESSION);
    server
        .request_expect(
            "GET",
            &server.url(ep::profile),
            Some(&second),
            None,
            StatusCode::OK,
        )
        .await;
}

#[tokio::test]
async fn protected_routes_reject_missing_or_unknown_tokens() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let cases: Vec<(&str, String, Option<Value>)> = vec![
        ("GET", server.url(ep::profile), None),
        ("PUT", server.url(ep::profile), Some(json!({"pokemon": "Mew"}))),
        ("POST", server.url(ep::jars), Some(json!({"name": "x"}))),
        ("GET", server.url(ep::jars), None),
        ("GET", server.url(|b| ep::jar(b, 1)), None),
        ("PUT", server.url(|b| ep::jar(b, 1)), Some(json!({"name": "y"}))),
        ("DELETE", server.url(|b| ep::jar(b, 1)), None),
        (
            "POST",
            server.url(ep::flies),
            Some(json!({"jarId": 1, "bodyColor": "verde"})),
        ),
        ("GET", server.url(|b| ep::jar_flies(b, 1)), None),
        ("DELETE", server.url(|b| ep::fly(b, 1, 1)), None),
    ];

    for (method, url, body) in cases.iter() {
        for token in [None, Some(""), Some("deadbeef")] {
            let value = server
                .request_expect(method, url, token, body.clone(), StatusCode::UNAUTHORIZED)
                .await;
            assert_eq!(value["error"], messages::INVALID_SESSION);
        }
    }
}

#[tokio::test]
async fn profile_end_to_end() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.session("alice", "pw1").await;

    let profile = server
        .request_expect(
            "GET",
            &server.url(ep::profile),
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["pokemon"], Value::Null);

    let body = server
        .request_expect(
            "PUT",
            &server.url(ep::profile),
            Some(&token),
            Some(json!({"pokemon": "Pikachu"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], messages::POKEMON_ASSIGNED);

    let profile = server
        .request_expect(
            "GET",
            &server.url(ep::profile),
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(profile["pokemon"], "Pikachu");

    // No body at all clears the pokemon
    let body = server
        .request_expect(
            "PUT",
            &server.url(ep::profile),
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], messages::POKEMON_ASSIGNED);
    let profile = server
        .request_expect(
            "GET",
            &server.url(ep::profile),
            Some(&token),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(profile["pokemon"], Value::Null);

    // A body that is not JSON is still rejected
    let resp = server
        .client
        .put(server.url(ep::profile))
        .header("token", &token)
        .header("content-type", "application/json")
        .body("{pokemon")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn jars_are_listed_only_for_their_owner() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let alice = server.session("alice", "pw1").await;
    let bob = server.session("bob", "pw2").await;

    let id = server.create_jar(&alice, "Cocina").await;

    let mine = server.list_jars(&alice).await;
    assert_eq!(mine.iter().filter(|j| j["id"] == id).count(), 1);
    assert_eq!(mine[0]["name"], "Cocina");
    assert!(mine[0]["userId"].is_i64());
    assert!(server.list_jars(&bob).await.is_empty());

    let jar = server
        .request_expect(
            "GET",
            &server.url(|b| ep::jar(b, id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(jar["id"], id);
    assert_eq!(jar["name"], "Cocina");

    // Someone else's jar reads as an empty 200
    let jar = server
        .request_expect(
            "GET",
            &server.url(|b| ep::jar(b, id)),
            Some(&bob),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(jar, Value::Null);
}

#[tokio::test]
async fn foreign_jar_mutations_succeed_without_effect() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let alice = server.session("alice", "pw1").await;
    let bob = server.session("bob", "pw2").await;
    let id = server.create_jar(&alice, "Cocina").await;

    let body = server
        .request_expect(
            "DELETE",
            &server.url(|b| ep::jar(b, id)),
            Some(&bob),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], messages::JAR_DELETED);
    server
        .request_expect(
            "PUT",
            &server.url(|b| ep::jar(b, id)),
            Some(&bob),
            Some(json!({"name": "Robado"})),
            StatusCode::OK,
        )
        .await;

    let jars = server.list_jars(&alice).await;
    assert_eq!(jars.len(), 1);
    assert_eq!(jars[0]["name"], "Cocina");
}

#[tokio::test]
async fn owner_can_rename_and_delete_jar() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let alice = server.session("alice", "pw1").await;
    let id = server.create_jar(&alice, "Cocina").await;

    let body = server
        .request_expect(
            "PUT",
            &server.url(|b| ep::jar(b, id)),
            Some(&alice),
            Some(json!({"name": "Salón"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], messages::JAR_UPDATED);
    assert_eq!(server.list_jars(&alice).await[0]["name"], "Salón");

    server
        .request_expect(
            "DELETE",
            &server.url(|b| ep::jar(b, id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(server.list_jars(&alice).await.is_empty());
}

#[tokio::test]
async fn flies_crud_ignores_jar_ownership() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let alice = server.session("alice", "pw1").await;
    let bob = server.session("bob", "pw2").await;
    let jar_id = server.create_jar(&alice, "Cocina").await;

    // bob attaches a fly to alice's jar
    let body = server
        .request_expect(
            "POST",
            &server.url(ep::flies),
            Some(&bob),
            Some(json!({"jarId": jar_id, "bodyColor": "verde"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(body["message"], messages::FLY_CREATED);

    let flies = server
        .request_expect(
            "GET",
            &server.url(|b| ep::jar_flies(b, jar_id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;
    let flies = flies.as_array().unwrap();
    assert_eq!(flies.len(), 1);
    assert_eq!(flies[0]["jarId"], jar_id);
    assert_eq!(flies[0]["bodyColor"], "verde");
    let fly_id = flies[0]["id"].as_i64().unwrap() as i32;

    // Form clients send the jar id as a string
    server
        .request_expect(
            "POST",
            &server.url(ep::flies),
            Some(&alice),
            Some(json!({"jarId": jar_id.to_string(), "bodyColor": "azul"})),
            StatusCode::CREATED,
        )
        .await;
    let flies = server
        .request_expect(
            "GET",
            &server.url(|b| ep::jar_flies(b, jar_id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;
    let flies = flies.as_array().unwrap();
    assert_eq!(flies.len(), 2);
    assert_eq!(flies[1]["jarId"], jar_id);
    assert_eq!(flies[1]["bodyColor"], "azul");
    let second_id = flies[1]["id"].as_i64().unwrap() as i32;
    server
        .request_expect(
            "DELETE",
            &server.url(|b| ep::fly(b, jar_id, second_id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;

    // wrong jar id: 200, nothing removed
    server
        .request_expect(
            "DELETE",
            &server.url(|b| ep::fly(b, jar_id + 1, fly_id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;
    let body = server
        .request_expect(
            "DELETE",
            &server.url(|b| ep::fly(b, jar_id, fly_id)),
            Some(&bob),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], messages::FLY_DELETED);

    let flies = server
        .request_expect(
            "GET",
            &server.url(|b| ep::jar_flies(b, jar_id)),
            Some(&alice),
            None,
            StatusCode::OK,
        )
        .await;
    assert!(flies.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_fields_and_bad_ids_are_bad_requests() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let (status, body) = server
        .request(
            "POST",
            &server.url(ep::register),
            None,
            Some(json!({"username": "alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], messages::MISSING_FIELDS);

    let token = server.session("alice", "pw1").await;
    let cases: Vec<(&str, String, Option<Value>, &str)> = vec![
        (
            "POST",
            server.url(ep::jars),
            Some(json!({})),
            messages::JAR_CREATE_FAILED,
        ),
        (
            "POST",
            server.url(ep::jars),
            None,
            messages::JAR_CREATE_FAILED,
        ),
        (
            "PUT",
            server.url(|b| ep::jar(b, 1)),
            Some(json!({"title": "x"})),
            messages::JAR_UPDATE_FAILED,
        ),
        (
            "GET",
            format!("{}/jars/abc", server.base),
            None,
            messages::JAR_GET_FAILED,
        ),
        (
            "POST",
            server.url(ep::flies),
            Some(json!({"bodyColor": "verde"})),
            messages::FLY_CREATE_FAILED,
        ),
        (
            "POST",
            server.url(ep::flies),
            Some(json!({"jarId": "uno", "bodyColor": "verde"})),
            messages::FLY_CREATE_FAILED,
        ),
        (
            "GET",
            format!("{}/flies/abc", server.base),
            None,
            messages::FLY_LIST_FAILED,
        ),
        (
            "DELETE",
            format!("{}/flies/1/abc", server.base),
            None,
            messages::FLY_DELETE_FAILED,
        ),
    ];
    for (method, url, body, message) in cases {
        let value = server
            .request_expect(method, &url, Some(&token), body, StatusCode::BAD_REQUEST)
            .await;
        assert_eq!(value["error"], message, "{method} {url}");
    }
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_and_token_header() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let resp = server
        .client
        .request(reqwest::Method::OPTIONS, server.url(ep::jars))
        .header("origin", ALLOWED_ORIGIN)
        .header("access-control-request-method", "DELETE")
        .header("access-control-request-headers", "token")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        ALLOWED_ORIGIN
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
    let allowed = headers
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("token"));
}
