//! Integration coverage for the reqwest adapter against a local stub of the
//! Hack-or-Snooze API.
//!
//! Each test spawns an actix-web server on an ephemeral port, points the
//! adapter at it, and inspects both the decoded result and the request the
//! stub recorded.

use std::net::TcpListener;
use std::sync::Mutex;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::web::{self, Bytes, ServiceConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{Value, json};
use snooze_client::HackOrSnoozeHttpApi;
use snooze_client::domain::ports::{AccountApi, RemoteApiError, StoryApi};
use snooze_client::domain::{
    ErrorCode, LoginCredentials, LoginToken, NewStory, SignupDetails, StoryId, User, Username,
};
use url::Url;

const GOOD_TOKEN: &str = "good-token";
const USER_AGENT: &str = "snooze-tests/1";

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: String,
    user_agent: Option<String>,
    accept: Option<String>,
    body: Value,
}

#[derive(Default)]
struct Recorder(Mutex<Vec<Recorded>>);

impl Recorder {
    fn record(&self, req: &HttpRequest, body: &[u8]) -> Value {
        let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        self.0.lock().expect("recorder lock").push(Recorded {
            method: req.method().to_string(),
            path: req.path().to_owned(),
            query: req.query_string().to_owned(),
            user_agent: header("user-agent"),
            accept: header("accept"),
            body: body.clone(),
        });
        body
    }

    fn last(&self) -> Recorded {
        self.0
            .lock()
            .expect("recorder lock")
            .last()
            .cloned()
            .expect("a request was recorded")
    }
}

struct Stub {
    api: HackOrSnoozeHttpApi,
    recorder: web::Data<Recorder>,
    handle: ServerHandle,
}

impl Stub {
    async fn stop(self) {
        self.handle.stop(true).await;
    }
}

fn spawn_stub(configure: fn(&mut ServiceConfig), timeout: Duration) -> Stub {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let recorder = web::Data::new(Recorder::default());
    let app_recorder = recorder.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_recorder.clone())
            .configure(configure)
    })
    .disable_signals()
    .shutdown_timeout(1)
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let base_url = Url::parse(&format!("http://{addr}/")).expect("stub url");
    let api = HackOrSnoozeHttpApi::new(base_url, timeout)
        .expect("reqwest client")
        .with_user_agent(USER_AGENT);
    Stub {
        api,
        recorder,
        handle,
    }
}

fn story_json(id: &str, username: &str) -> Value {
    json!({
        "storyId": id,
        "title": format!("Story {id}"),
        "author": "Alistair",
        "url": format!("https://{id}.example.com/read"),
        "username": username,
        "createdAt": "2024-05-01T09:00:00.000Z",
        "updatedAt": "2024-05-01T09:00:00.000Z",
    })
}

fn user_json(username: &str) -> Value {
    json!({
        "username": username,
        "name": "Ada Lovelace",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "favorites": [story_json("s2", "grace")],
        "stories": [story_json("s1", username)],
    })
}

fn api_error(status: u16, message: &str) -> HttpResponse {
    let status = StatusCode::from_u16(status).expect("status");
    HttpResponse::build(status).json(json!({
        "error": { "status": status.as_u16(), "title": status.canonical_reason(), "message": message }
    }))
}

fn body_token(body: &Value) -> Option<&str> {
    body.get("token").and_then(Value::as_str)
}

async fn list_stories(req: HttpRequest, body: Bytes, rec: web::Data<Recorder>) -> HttpResponse {
    rec.record(&req, &body);
    HttpResponse::Ok().json(json!({ "stories": [story_json("s1", "ada"), story_json("s2", "grace")] }))
}

async fn fetch_story(
    req: HttpRequest,
    body: Bytes,
    rec: web::Data<Recorder>,
    path: web::Path<String>,
) -> HttpResponse {
    rec.record(&req, &body);
    let id = path.into_inner();
    if id == "s1" {
        HttpResponse::Ok().json(json!({ "story": story_json(&id, "ada") }))
    } else {
        api_error(404, &format!("No story with ID '{id}'"))
    }
}

async fn create_story(req: HttpRequest, body: Bytes, rec: web::Data<Recorder>) -> HttpResponse {
    let body = rec.record(&req, &body);
    if body_token(&body) != Some(GOOD_TOKEN) {
        return api_error(401, "A valid token is required");
    }
    let story = &body["story"];
    HttpResponse::Created().json(json!({
        "story": {
            "storyId": "new-1",
            "title": story["title"],
            "author": story["author"],
            "url": story["url"],
            "username": "ada",
            "createdAt": "2024-05-02T10:00:00.000Z",
        }
    }))
}

async fn delete_story(req: HttpRequest, body: Bytes, rec: web::Data<Recorder>) -> HttpResponse {
    let body = rec.record(&req, &body);
    if body_token(&body) == Some(GOOD_TOKEN) {
        HttpResponse::Ok().json(json!({ "message": "Deleted story" }))
    } else {
        api_error(401, "A valid token is required")
    }
}

async fn signup(req: HttpRequest, body: Bytes, rec: web::Data<Recorder>) -> HttpResponse {
    let body = rec.record(&req, &body);
    let username = body["user"]["username"].as_str().unwrap_or_default().to_owned();
    if username == "taken" {
        return api_error(409, &format!("There is already a user with username '{username}'."));
    }
    HttpResponse::Created().json(json!({ "user": user_json(&username), "token": GOOD_TOKEN }))
}

async fn login(req: HttpRequest, body: Bytes, rec: web::Data<Recorder>) -> HttpResponse {
    let body = rec.record(&req, &body);
    let username = body["user"]["username"].as_str().unwrap_or_default().to_owned();
    match (username.as_str(), body["user"]["password"].as_str()) {
        ("ghost", _) => api_error(404, "No user 'ghost'"),
        (_, Some("hunter2")) => {
            HttpResponse::Ok().json(json!({ "user": user_json(&username), "token": GOOD_TOKEN }))
        }
        _ => api_error(401, "Invalid password"),
    }
}

async fn fetch_profile(
    req: HttpRequest,
    body: Bytes,
    rec: web::Data<Recorder>,
    path: web::Path<String>,
) -> HttpResponse {
    rec.record(&req, &body);
    if req.query_string() == format!("token={GOOD_TOKEN}") {
        HttpResponse::Ok().json(json!({ "user": user_json(&path.into_inner()) }))
    } else {
        api_error(401, "Invalid token")
    }
}

async fn favorite(req: HttpRequest, body: Bytes, rec: web::Data<Recorder>) -> HttpResponse {
    let body = rec.record(&req, &body);
    if body_token(&body) == Some(GOOD_TOKEN) {
        HttpResponse::Ok().json(json!({ "message": "Favorite updated", "user": user_json("ada") }))
    } else {
        api_error(401, "Invalid token")
    }
}

fn hack_or_snooze_routes(cfg: &mut ServiceConfig) {
    cfg.route("/stories", web::get().to(list_stories))
        .route("/stories", web::post().to(create_story))
        .route("/stories/{id}", web::get().to(fetch_story))
        .route("/stories/{id}", web::delete().to(delete_story))
        .route("/signup", web::post().to(signup))
        .route("/login", web::post().to(login))
        .route("/users/{username}", web::get().to(fetch_profile))
        .route("/users/{username}/favorites/{story_id}", web::post().to(favorite))
        .route("/users/{username}/favorites/{story_id}", web::delete().to(favorite));
}

fn misbehaving_routes(cfg: &mut ServiceConfig) {
    cfg.route(
        "/stories",
        web::get().to(|| async {
            actix_web::rt::time::sleep(Duration::from_secs(2)).await;
            HttpResponse::Ok().json(json!({ "stories": [] }))
        }),
    )
    .route(
        "/stories/{id}",
        web::get().to(|path: web::Path<String>| async move {
            match path.into_inner().as_str() {
                "incomplete" => HttpResponse::Ok().json(json!({ "story": { "storyId": "incomplete" } })),
                "html" => HttpResponse::BadGateway()
                    .content_type("text/html")
                    .body("<html>\n  <body>upstream   unavailable</body>\n</html>"),
                _ => HttpResponse::build(StatusCode::IM_A_TEAPOT).finish(),
            }
        }),
    );
}

fn token() -> LoginToken {
    LoginToken::new(GOOD_TOKEN).expect("token")
}

fn ada() -> Username {
    Username::new("ada").expect("username")
}

fn id(raw: &str) -> StoryId {
    StoryId::new(raw).expect("story id")
}

#[actix_web::test]
async fn list_stories_decodes_records_and_sends_identity_headers() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));

    let stories = stub.api.list_stories().await.expect("list succeeds");

    let ids: Vec<&str> = stories.iter().map(|story| story.id().as_ref()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);
    let request = stub.recorder.last();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/stories");
    assert_eq!(request.user_agent.as_deref(), Some(USER_AGENT));
    assert_eq!(request.accept.as_deref(), Some("application/json"));
    stub.stop().await;
}

#[actix_web::test]
async fn fetch_story_maps_404_and_surfaces_envelope_message() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));

    let found = stub.api.fetch_story(&id("s1")).await.expect("known story");
    let error = stub.api.fetch_story(&id("zzz")).await.expect_err("unknown story");

    assert_eq!(found.host_name(), "s1.example.com");
    assert!(matches!(error, RemoteApiError::NotFound { .. }));
    assert_eq!(error.message(), "status 404: No story with ID 'zzz'");
    stub.stop().await;
}

#[actix_web::test]
async fn create_story_posts_token_and_story_fields() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));
    let submission = NewStory {
        title: "Ports and adapters".to_owned(),
        author: "Alistair".to_owned(),
        url: "https://alistair.cockburn.us/hexagonal-architecture/".to_owned(),
    };

    let created = stub
        .api
        .create_story(&token(), &submission)
        .await
        .expect("create succeeds");

    assert_eq!(created.id().as_ref(), "new-1");
    assert!(created.matches_submission(&submission));
    let request = stub.recorder.last();
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.body,
        json!({
            "token": GOOD_TOKEN,
            "story": {
                "title": "Ports and adapters",
                "author": "Alistair",
                "url": "https://alistair.cockburn.us/hexagonal-architecture/",
            }
        })
    );
    stub.stop().await;
}

#[actix_web::test]
async fn create_story_with_rejected_token_is_unauthorized() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));
    let submission = NewStory {
        title: "t".to_owned(),
        author: "a".to_owned(),
        url: "https://example.com".to_owned(),
    };

    let error = stub
        .api
        .create_story(&LoginToken::new("stale").expect("token"), &submission)
        .await
        .expect_err("token rejected");

    assert!(matches!(error, RemoteApiError::Unauthorized { .. }));
    stub.stop().await;
}

#[actix_web::test]
async fn delete_story_sends_token_in_body() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));

    stub.api
        .delete_story(&token(), &id("s1"))
        .await
        .expect("delete succeeds");

    let request = stub.recorder.last();
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path, "/stories/s1");
    assert_eq!(request.body, json!({ "token": GOOD_TOKEN }));
    stub.stop().await;
}

#[actix_web::test]
async fn signup_duplicate_is_conflict_and_unauthorized_in_the_domain() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));
    let details = SignupDetails::try_from_parts("taken", "pw", "Someone").expect("details");

    let port_error = stub.api.signup(&details).await.expect_err("duplicate");
    let domain_error = User::signup(&stub.api, &details)
        .await
        .expect_err("duplicate");

    assert!(matches!(port_error, RemoteApiError::Conflict { .. }));
    assert_eq!(domain_error.code(), ErrorCode::Unauthorized);
    stub.stop().await;
}

#[actix_web::test]
async fn signup_sends_name_and_returns_logged_in_user() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));
    let details = SignupDetails::try_from_parts("ada", "hunter2", "Ada Lovelace").expect("details");

    let user = User::signup(&stub.api, &details).await.expect("signup succeeds");

    assert_eq!(user.login_token().as_str(), GOOD_TOKEN);
    assert_eq!(user.favorites().len(), 1);
    assert_eq!(
        stub.recorder.last().body,
        json!({ "user": { "username": "ada", "password": "hunter2", "name": "Ada Lovelace" } })
    );
    stub.stop().await;
}

#[actix_web::test]
async fn login_failures_are_unauthorized_in_the_domain() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));
    let unknown = LoginCredentials::try_from_parts("ghost", "pw").expect("credentials");
    let wrong = LoginCredentials::try_from_parts("ada", "nope").expect("credentials");

    let unknown_error = User::login(&stub.api, &unknown).await.expect_err("unknown user");
    let wrong_error = User::login(&stub.api, &wrong).await.expect_err("bad password");

    assert_eq!(unknown_error.code(), ErrorCode::Unauthorized);
    assert_eq!(wrong_error.code(), ErrorCode::Unauthorized);
    stub.stop().await;
}

#[actix_web::test]
async fn fetch_profile_passes_token_as_query_parameter() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));

    let profile = stub
        .api
        .fetch_profile(&token(), &ada())
        .await
        .expect("profile succeeds");

    assert_eq!(profile.username, ada());
    assert_eq!(profile.stories.len(), 1);
    let request = stub.recorder.last();
    assert_eq!(request.path, "/users/ada");
    assert_eq!(request.query, format!("token={GOOD_TOKEN}"));
    stub.stop().await;
}

#[actix_web::test]
async fn stored_credentials_with_invalid_token_restore_nothing() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));
    let stored = snooze_client::domain::StoredCredentials {
        token: LoginToken::new("expired").expect("token"),
        username: ada(),
    };

    assert!(User::login_via_stored_credentials(&stub.api, &stored).await.is_none());
    stub.stop().await;
}

#[actix_web::test]
async fn favorites_are_added_and_removed_by_path() {
    let stub = spawn_stub(hack_or_snooze_routes, Duration::from_secs(5));

    AccountApi::add_favorite(&stub.api, &token(), &ada(), &id("s1"))
        .await
        .expect("add succeeds");
    let added = stub.recorder.last();
    AccountApi::remove_favorite(&stub.api, &token(), &ada(), &id("s1"))
        .await
        .expect("remove succeeds");
    let removed = stub.recorder.last();

    assert_eq!((added.method.as_str(), added.path.as_str()), ("POST", "/users/ada/favorites/s1"));
    assert_eq!((removed.method.as_str(), removed.path.as_str()), ("DELETE", "/users/ada/favorites/s1"));
    assert_eq!(removed.body, json!({ "token": GOOD_TOKEN }));
    stub.stop().await;
}

#[actix_web::test]
async fn slow_responses_time_out() {
    let stub = spawn_stub(misbehaving_routes, Duration::from_millis(200));

    let error = stub.api.list_stories().await.expect_err("times out");

    assert!(matches!(error, RemoteApiError::Timeout { .. }), "got {error:?}");
    stub.stop().await;
}

#[actix_web::test]
async fn incomplete_records_fail_to_decode() {
    let stub = spawn_stub(misbehaving_routes, Duration::from_secs(5));

    let error = stub.api.fetch_story(&id("incomplete")).await.expect_err("missing fields");

    assert!(matches!(error, RemoteApiError::Decode { .. }), "got {error:?}");
    assert_eq!(
        snooze_client::domain::Error::from(error).code(),
        ErrorCode::Validation
    );
    stub.stop().await;
}

#[actix_web::test]
async fn upstream_html_errors_are_transport_failures_with_preview() {
    let stub = spawn_stub(misbehaving_routes, Duration::from_secs(5));

    let bad_gateway = stub.api.fetch_story(&id("html")).await.expect_err("502");
    let teapot = stub.api.fetch_story(&id("teapot")).await.expect_err("418");

    assert!(matches!(bad_gateway, RemoteApiError::Transport { .. }));
    assert_eq!(
        bad_gateway.message(),
        "status 502: <html> <body>upstream unavailable</body> </html>"
    );
    assert!(matches!(teapot, RemoteApiError::Rejected { .. }));
    stub.stop().await;
}

#[actix_web::test]
async fn refused_connections_are_transport_failures() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    };
    let base_url = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("url");
    let api = HackOrSnoozeHttpApi::new(base_url, Duration::from_secs(2)).expect("client");

    let error = api.list_stories().await.expect_err("nothing listening");

    assert!(matches!(error, RemoteApiError::Transport { .. }), "got {error:?}");
}
