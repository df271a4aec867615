use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::Response,
};
use folio_api::{config::Config, router, session::SESSION_COOKIE, state::AppState};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "correct horse";

struct TestApp {
    router: Router,
    dir: TempDir,
    content_file: PathBuf,
}

impl TestApp {
    fn new() -> Self {
        Self::with_ttl(Duration::from_secs(12 * 60 * 60))
    }

    fn with_ttl(session_ttl: Duration) -> Self {
        Self::build(session_ttl, "data/content.json")
    }

    /// `content_file` is relative to the app's temporary directory.
    fn build(session_ttl: Duration, content_file: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let content_file = dir.path().join(content_file);
        let config = Config {
            port: 0,
            content_file: content_file.clone(),
            admin_user: "admin".to_string(),
            admin_pass_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
            session_secret: SecretString::from("test-session-secret".to_string()),
            session_ttl,
        };

        Self {
            router: router(AppState::new(config)),
            dir,
            content_file,
        }
    }

    fn content_path(&self) -> PathBuf {
        self.content_file.clone()
    }

    fn seed(&self, document: &Value) {
        write_json(&self.content_path(), document);
    }

    fn stored(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(self.content_path()).unwrap()).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self, username: &str, password: &str) -> Response {
        self.send(json_request(
            "POST",
            "/api/admin/login",
            None,
            &json!({ "username": username, "password": password }),
        ))
        .await
    }

    /// Logs in and returns the `name=value` pair to send back as a cookie.
    async fn session(&self) -> String {
        let response = self.login("admin", PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response)
    }

    async fn is_authenticated(&self, cookie: Option<&str>) -> bool {
        let response = self.send(get("/api/admin/me", cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["authenticated"].as_bool().unwrap()
    }
}

fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn valid_document() -> Value {
    json!({
        "settings": {"site_title": "Portfolio"},
        "hero": {"name_line1": "Ada", "typing_phrases": ["Engineer"]},
        "about": {"paragraphs": ["Hello"], "facts": []},
        "timeline": {"items": [{"year": "2020", "title": "Start"}]},
        "skills": {"items": [{"emoji": "🦀", "name": "Rust"}]},
        "projects": {"items": [{"title": "Folio", "tags": ["rust"], "links": []}]},
        "contact": {"email": "ada@example.com", "socials": []},
    })
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap())
        .find(|value| value.starts_with(SESSION_COOKIE))
        .and_then(|value| value.split(';').next())
        .unwrap()
        .to_string()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn public_content_is_served_without_a_session() {
    let app = TestApp::new();
    app.seed(&valid_document());

    let response = app.send(get("/api/content", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, valid_document());
}

#[tokio::test]
async fn public_content_fails_when_store_is_missing() {
    let app = TestApp::new();

    let response = app.send(get("/api/content", None)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Failed to load content"}));
}

#[tokio::test]
async fn replace_then_public_read_round_trips() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let mut updated = valid_document();
    updated["hero"]["name_line1"] = json!("Grace");
    updated["github"] = json!({"username": "grace", "show_stats": true});

    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&cookie), &updated))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));

    let response = app.send(get("/api/content", None)).await;
    assert_eq!(body_json(response).await, updated);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = TestApp::new();

    let response = app.login("admin", "wrong").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body_json(response).await, json!({"error": "Invalid credentials"}));
}

#[tokio::test]
async fn login_with_wrong_username_is_rejected() {
    let app = TestApp::new();

    let response = app.login("root", PASSWORD).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Invalid credentials"}));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = TestApp::new();

    for body in [
        json!({}),
        json!({"username": "admin"}),
        json!({"password": PASSWORD}),
        json!({"username": "", "password": PASSWORD}),
    ] {
        let response = app
            .send(json_request("POST", "/api/admin/login", None, &body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Username and password are required"})
        );
    }
}

#[tokio::test]
async fn login_without_a_json_body_asks_for_credentials() {
    let app = TestApp::new();

    let requests = [
        Request::builder()
            .method("POST")
            .uri("/api/admin/login")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/api/admin/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/api/admin/login")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("username=admin"))
            .unwrap(),
    ];

    for request in requests {
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Username and password are required"})
        );
    }
}

#[tokio::test]
async fn login_with_broken_json_is_malformed() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Malformed payload"}));
}

#[tokio::test]
async fn login_sets_an_http_only_session_cookie() {
    let app = TestApp::new();

    let response = app.login("admin", PASSWORD).await;

    assert_eq!(response.status(), StatusCode::OK);
    let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(header.starts_with(SESSION_COOKIE));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Max-Age=43200"));
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let app = TestApp::new();
    app.seed(&valid_document());

    for uri in ["/api/admin/content", "/api/admin/content/hero", "/api/admin/export"] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    }
}

#[tokio::test]
async fn unauthenticated_replace_is_rejected_without_side_effects() {
    let app = TestApp::new();
    app.seed(&valid_document());

    let mut candidate = valid_document();
    candidate["hero"] = json!({"name_line1": "Mallory"});

    let response = app
        .send(json_request("PUT", "/api/admin/content", None, &candidate))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    assert_eq!(app.stored(), valid_document());
}

#[tokio::test]
async fn replace_missing_a_required_section_is_rejected() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let candidate = json!({
        "hero": {}, "about": {}, "timeline": {}, "skills": {}, "projects": {},
    });
    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&cookie), &candidate))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Invalid content format"}));
    assert_eq!(app.stored(), valid_document());
}

#[tokio::test]
async fn replace_with_a_falsy_section_is_rejected() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    for falsy in [json!(null), json!(""), json!(0), json!(false)] {
        let mut candidate = valid_document();
        candidate["skills"] = falsy;
        let response = app
            .send(json_request("PUT", "/api/admin/content", Some(&cookie), &candidate))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&cookie), &json!([1, 2])))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/admin/content")
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, &cookie)
        .body(Body::from("{\"hero\": "))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Malformed payload"}));
}

#[tokio::test]
async fn unauthenticated_malformed_replace_is_unauthorized() {
    let app = TestApp::new();
    app.seed(&valid_document());

    let request = Request::builder()
        .method("PUT")
        .uri("/api/admin/content")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"hero\": "))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    assert_eq!(app.stored(), valid_document());
}

#[tokio::test]
async fn oversized_replace_is_rejected() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let mut candidate = valid_document();
    candidate["about"]["paragraphs"] = json!(["x".repeat(3 * 1024 * 1024)]);
    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&cookie), &candidate))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.stored(), valid_document());
}

#[tokio::test]
async fn replace_reports_a_failed_store_write() {
    let app = TestApp::build(Duration::from_secs(60), "blocker/content.json");
    // A regular file where the store's directory should be.
    std::fs::write(app.dir.path().join("blocker"), "not a directory").unwrap();
    let cookie = app.session().await;

    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&cookie), &valid_document()))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Failed to save content"}));
}

#[tokio::test]
async fn admin_content_fails_when_store_is_missing() {
    let app = TestApp::new();
    let cookie = app.session().await;

    let response = app.send(get("/api/admin/content", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Failed to load content"}));
}

#[tokio::test]
async fn admin_content_matches_public_content() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let admin = body_json(app.send(get("/api/admin/content", Some(&cookie))).await).await;
    let public = body_json(app.send(get("/api/content", None)).await).await;

    assert_eq!(admin, public);
}

#[tokio::test]
async fn admin_section_returns_one_section() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let response = app.send(get("/api/admin/content/skills", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, valid_document()["skills"]);

    let response = app.send(get("/api/admin/content/nowplaying", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Section not found"}));
}

#[tokio::test]
async fn export_is_an_attachment() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let cookie = app.session().await;

    let response = app.send(get("/api/admin/export", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=portfolio-backup.json"
    );
    assert_eq!(body_json(response).await, valid_document());
}

#[tokio::test]
async fn me_tracks_login_and_logout() {
    let app = TestApp::new();
    assert!(!app.is_authenticated(None).await);

    let cookie = app.session().await;
    assert!(app.is_authenticated(Some(&cookie)).await);

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/logout")
        .header(COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_some());
    assert_eq!(body_json(response).await, json!({"ok": true}));

    // The old cookie no longer maps to a live session.
    assert!(!app.is_authenticated(Some(&cookie)).await);
    let response = app.send(get("/api/admin/content", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_a_session_still_succeeds() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn failed_login_leaves_the_session_anonymous() {
    let app = TestApp::new();

    let response = app.login("admin", "nope").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(!app.is_authenticated(None).await);
}

#[tokio::test]
async fn sessions_expire_without_logout() {
    let app = TestApp::with_ttl(Duration::from_millis(200));
    app.seed(&valid_document());
    let cookie = app.session().await;
    assert!(app.is_authenticated(Some(&cookie)).await);

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(!app.is_authenticated(Some(&cookie)).await);
    let response = app.send(get("/api/admin/content", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_cookies_are_ignored() {
    let app = TestApp::new();
    let cookie = app.session().await;

    let (name, value) = cookie.split_once('=').unwrap();
    let mut tampered: Vec<char> = value.chars().collect();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == '0' { '1' } else { '0' };
    let tampered = format!("{name}={}", tampered.into_iter().collect::<String>());

    assert!(!app.is_authenticated(Some(&tampered)).await);
    let forged = format!("{SESSION_COOKIE}=00000000-0000-0000-0000-000000000000");
    assert!(!app.is_authenticated(Some(&forged)).await);
}

#[tokio::test]
async fn second_full_document_save_discards_the_first_writers_change() {
    let app = TestApp::new();
    app.seed(&valid_document());
    let first = app.session().await;
    let second = app.session().await;

    let mut first_copy = body_json(app.send(get("/api/admin/content", Some(&first))).await).await;
    let mut second_copy = body_json(app.send(get("/api/admin/content", Some(&second))).await).await;

    first_copy["hero"]["name_line1"] = json!("First writer");
    second_copy["contact"]["email"] = json!("second@example.com");

    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&first), &first_copy))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .send(json_request("PUT", "/api/admin/content", Some(&second), &second_copy))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = app.stored();
    assert_eq!(stored, second_copy);
    assert_eq!(stored["hero"]["name_line1"], json!("Ada"));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::new();

    let response = app.send(get("/api/admin/me", None)).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
    assert_eq!(
        headers.get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );
}
