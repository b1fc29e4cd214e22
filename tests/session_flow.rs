//! Session and login flow tests: the durable store, the token rules as
//! the panel state machine applies them, and wire-level checks of the
//! HTTP client against a local one-shot responder.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use crossterm::event::KeyCode;
use tempfile::tempdir;
use tokio::runtime::Runtime;

use xpboard::api::graphql::{GroupRef, ProfileData, TransactionRecord, UserRecord, XpRecord};
use xpboard::api::{Api, AuthError, HttpApi, ProfileError};
use xpboard::session::{Session, SessionStore};
use xpboard::state::Config;
use xpboard::ui::App;
use xpboard::view::Panel;

fn sample_profile() -> ProfileData {
    ProfileData {
        user: UserRecord {
            id: 42,
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            audit_ratio: 1.5,
            xps: vec![XpRecord {
                amount: 1000.0,
                path: "/adam/piscine-go/quest-01".to_string(),
            }],
            groups: vec![GroupRef { id: 1 }],
        },
        transactions: vec![TransactionRecord {
            kind: "skill_go".to_string(),
            amount: 40.0,
            created_at: String::new(),
        }],
    }
}

// ---------------------------------------------------------------------------
// Durable store
// ---------------------------------------------------------------------------

#[test]
fn store_round_trip_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let path_buf = dir.path().join("xpboard.sqlite");
    let path = path_buf.to_str().expect("utf8 path");
    {
        let mut store = SessionStore::open(path).expect("open");
        store
            .save(&Session {
                token: "a.b.c".to_string(),
                username: "alice".to_string(),
            })
            .expect("save");
    }
    let store = SessionStore::open(path).expect("reopen");
    let session = store.current().expect("read").expect("session persisted");
    assert_eq!(session.token, "a.b.c");
    assert_eq!(session.username, "alice");
}

#[test]
fn cleared_store_stays_empty_after_reopen() {
    let dir = tempdir().expect("tempdir");
    let path_buf = dir.path().join("xpboard.sqlite");
    let path = path_buf.to_str().expect("utf8 path");
    {
        let mut store = SessionStore::open(path).expect("open");
        store
            .save(&Session {
                token: "a.b.c".to_string(),
                username: "alice".to_string(),
            })
            .expect("save");
        store.clear().expect("clear");
    }
    let store = SessionStore::open(path).expect("reopen");
    assert!(store.current().expect("read").is_none());
}

// ---------------------------------------------------------------------------
// Login flow against a fake API
// ---------------------------------------------------------------------------

enum SignInBehavior {
    Token(String),
    Reject,
}

struct FakeApi {
    sign_in: SignInBehavior,
    profile: Option<ProfileData>,
    fail_reloads: bool,
    sign_in_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Api for FakeApi {
    async fn sign_in(&self, _username: &str, _password: &str) -> Result<String, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        match &self.sign_in {
            SignInBehavior::Token(token) => Ok(token.clone()),
            SignInBehavior::Reject => Err(AuthError::Rejected(
                "401 Unauthorized - bad credentials".to_string(),
            )),
        }
    }

    async fn fetch_profile(&self, _token: &str) -> Result<ProfileData, ProfileError> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reloads && call > 0 {
            return Err(ProfileError::Rejected(
                "500 Internal Server Error - boom".to_string(),
            ));
        }
        match &self.profile {
            Some(profile) => Ok(profile.clone()),
            None => Err(ProfileError::NoUserData),
        }
    }
}

fn flow_app(
    store: SessionStore,
    sign_in: SignInBehavior,
    profile: Option<ProfileData>,
) -> (Runtime, App, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let runtime = Runtime::new().expect("runtime");
    let sign_in_calls = Arc::new(AtomicUsize::new(0));
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let api = FakeApi {
        sign_in,
        profile,
        fail_reloads: false,
        sign_in_calls: Arc::clone(&sign_in_calls),
        fetch_calls: Arc::clone(&fetch_calls),
    };
    let app = App::new(store, Box::new(api), runtime.handle().clone());
    (runtime, app, sign_in_calls, fetch_calls)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.on_key(KeyCode::Char(c));
    }
}

fn perform_login(app: &mut App, username: &str, password: &str) {
    type_text(app, username);
    app.on_key(KeyCode::Tab);
    type_text(app, password);
    app.on_key(KeyCode::Enter);
}

#[test]
fn valid_sign_in_persists_session_and_loads_once() {
    let store = SessionStore::open_in_memory().expect("store");
    let (_runtime, mut app, sign_in_calls, fetch_calls) = flow_app(
        store,
        SignInBehavior::Token("aaa.bbb.ccc".to_string()),
        Some(sample_profile()),
    );

    assert_eq!(app.panel(), Panel::Login);
    perform_login(&mut app, "alice", "secret");

    assert_eq!(app.panel(), Panel::Profile, "panel switches after sign-in");
    let session = app.current_session().expect("session persisted");
    assert_eq!(session.token, "aaa.bbb.ccc");
    assert_eq!(session.username, "alice");
    assert_eq!(sign_in_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        fetch_calls.load(Ordering::SeqCst),
        1,
        "profile loads exactly once per sign-in"
    );
    assert_eq!(app.profile_view().welcome, "Welcome, Ada!");
    assert!(app.login_view().error.is_none());
}

#[test]
fn rejected_sign_in_keeps_login_panel_and_empty_store() {
    let store = SessionStore::open_in_memory().expect("store");
    let (_runtime, mut app, _, fetch_calls) =
        flow_app(store, SignInBehavior::Reject, Some(sample_profile()));

    perform_login(&mut app, "alice", "wrong");

    assert_eq!(app.panel(), Panel::Login, "stays on login after rejection");
    assert!(app.current_session().is_none(), "session store untouched");
    assert_eq!(app.login_view().error.as_deref(), Some("Login failed"));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0, "no profile fetch");
}

#[test]
fn malformed_tokens_are_rejected_client_side() {
    for bad in ["", "a.b", "a.b.c.d", "not-a-jwt"] {
        let store = SessionStore::open_in_memory().expect("store");
        let (_runtime, mut app, _, fetch_calls) = flow_app(
            store,
            SignInBehavior::Token(bad.to_string()),
            Some(sample_profile()),
        );
        perform_login(&mut app, "alice", "secret");

        assert_eq!(app.panel(), Panel::Login, "{:?} must not pass", bad);
        assert!(app.current_session().is_none(), "{:?} must not be saved", bad);
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(app.login_view().error.as_deref(), Some("Login failed"));
    }
}

#[test]
fn three_segment_tokens_are_accepted() {
    // Shape only; empty segments are fine.
    for good in ["a.b.c", "a..c"] {
        let store = SessionStore::open_in_memory().expect("store");
        let (_runtime, mut app, _, _) = flow_app(
            store,
            SignInBehavior::Token(good.to_string()),
            Some(sample_profile()),
        );
        perform_login(&mut app, "alice", "secret");

        assert_eq!(app.panel(), Panel::Profile, "{:?} should pass", good);
        let session = app.current_session().expect("session persisted");
        assert_eq!(session.token, good);
    }
}

#[test]
fn logout_clears_session_and_returns_to_login() {
    let store = SessionStore::open_in_memory().expect("store");
    let (_runtime, mut app, _, fetch_calls) = flow_app(
        store,
        SignInBehavior::Token("aaa.bbb.ccc".to_string()),
        Some(sample_profile()),
    );
    perform_login(&mut app, "alice", "secret");
    assert!(app.current_session().is_some());

    app.on_key(KeyCode::Char('l'));

    assert_eq!(app.panel(), Panel::Login);
    assert!(app.current_session().is_none(), "logout clears both keys");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1, "no fetch on logout");
    let view = app.login_view();
    assert!(view.username.is_empty(), "credential inputs reset on logout");
    assert!(view.masked_password.is_empty());
}

#[test]
fn stored_session_resumes_without_sign_in() {
    let mut store = SessionStore::open_in_memory().expect("store");
    store
        .save(&Session {
            token: "aaa.bbb.ccc".to_string(),
            username: "alice".to_string(),
        })
        .expect("seed");
    let (_runtime, mut app, sign_in_calls, fetch_calls) =
        flow_app(store, SignInBehavior::Reject, Some(sample_profile()));

    app.startup_resume();

    assert_eq!(app.panel(), Panel::Profile);
    assert_eq!(sign_in_calls.load(Ordering::SeqCst), 0, "no sign-in needed");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.profile_view().welcome, "Welcome, Ada!");
}

#[test]
fn empty_store_does_not_resume() {
    let store = SessionStore::open_in_memory().expect("store");
    let (_runtime, mut app, _, fetch_calls) = flow_app(store, SignInBehavior::Reject, None);

    app.startup_resume();

    assert_eq!(app.panel(), Panel::Login);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_load_surfaces_error_and_keeps_session() {
    let mut store = SessionStore::open_in_memory().expect("store");
    store
        .save(&Session {
            token: "aaa.bbb.ccc".to_string(),
            username: "alice".to_string(),
        })
        .expect("seed");
    let (_runtime, mut app, _, _) = flow_app(store, SignInBehavior::Reject, None);

    app.startup_resume();

    assert_eq!(app.panel(), Panel::Profile, "panel switches before the fetch");
    let view = app.profile_view();
    assert_eq!(view.last_load_error.as_deref(), Some("user data not available"));
    assert!(view.info_lines.is_empty());
    assert_eq!(view.welcome, "Welcome, alice!", "stored username fallback");
    assert!(
        app.current_session().is_some(),
        "load failure does not clear the session"
    );
}

#[test]
fn failed_reload_keeps_previous_profile_on_screen() {
    let store = SessionStore::open_in_memory().expect("store");
    let runtime = Runtime::new().expect("runtime");
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let api = FakeApi {
        sign_in: SignInBehavior::Token("aaa.bbb.ccc".to_string()),
        profile: Some(sample_profile()),
        fail_reloads: true,
        sign_in_calls: Arc::new(AtomicUsize::new(0)),
        fetch_calls: Arc::clone(&fetch_calls),
    };
    let mut app = App::new(store, Box::new(api), runtime.handle().clone());

    perform_login(&mut app, "alice", "secret");
    assert_eq!(app.profile_view().welcome, "Welcome, Ada!");

    app.on_key(KeyCode::Char('r'));

    assert_eq!(fetch_calls.load(Ordering::SeqCst), 2);
    let view = app.profile_view();
    assert!(
        !view.info_lines.is_empty(),
        "stale profile content stays after a failed reload"
    );
    assert_eq!(view.welcome, "Welcome, Ada!");
    assert!(
        view.last_load_error.as_deref().unwrap_or("").contains("500"),
        "the failure is surfaced alongside the stale content"
    );
}

#[test]
fn reload_key_fetches_again() {
    let store = SessionStore::open_in_memory().expect("store");
    let (_runtime, mut app, _, fetch_calls) = flow_app(
        store,
        SignInBehavior::Token("aaa.bbb.ccc".to_string()),
        Some(sample_profile()),
    );
    perform_login(&mut app, "alice", "secret");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);

    app.on_key(KeyCode::Char('r'));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Wire-level checks against a local one-shot responder
// ---------------------------------------------------------------------------

fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        // Read headers, then drain the body per Content-Length so the
        // close below never races the client's request write.
        loop {
            let header_end = request
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .map(|i| i + 4);
            if let Some(header_end) = header_end {
                let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= header_end + body_len {
                    break;
                }
            }
            if request.len() > 65536 {
                break;
            }
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
                Err(_) => break,
            }
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).expect("write response");
        String::from_utf8_lossy(&request).to_string()
    });
    (format!("http://{}", addr), handle)
}

fn wire_config(base: &str) -> Config {
    Config {
        signin_url: format!("{}/api/auth/signin", base),
        graphql_url: format!("{}/api/graphql-engine/v1/graphql", base),
        sqlite_path: ":memory:".to_string(),
        http_timeout_secs: 5,
        tick_ms: 250,
        report_path: "out/report/index.html".to_string(),
    }
}

#[tokio::test]
async fn sign_in_sends_basic_header_and_returns_token() {
    let (base, server) = one_shot_server("200 OK", "aaa.bbb.ccc");
    let api = HttpApi::new(&wire_config(&base));

    let token = api.sign_in("Aladdin", "open sesame").await.expect("sign-in");
    assert_eq!(token, "aaa.bbb.ccc");

    let request = server.join().expect("server thread");
    assert!(
        request.starts_with("POST /api/auth/signin"),
        "request was: {}",
        request
    );
    assert!(
        request.contains("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="),
        "request was: {}",
        request
    );
    assert!(
        request.to_lowercase().contains("content-length: 0"),
        "sign-in body must be empty, request was: {}",
        request
    );
}

#[tokio::test]
async fn sign_in_unwraps_json_string_body() {
    let (base, server) = one_shot_server("200 OK", "\"aaa.bbb.ccc\"");
    let api = HttpApi::new(&wire_config(&base));

    let token = api.sign_in("alice", "secret").await.expect("sign-in");
    assert_eq!(token, "aaa.bbb.ccc");
    let _ = server.join();
}

#[tokio::test]
async fn rejected_sign_in_is_an_error() {
    let (base, server) = one_shot_server("401 Unauthorized", "bad credentials");
    let api = HttpApi::new(&wire_config(&base));

    let err = api.sign_in("alice", "wrong").await.expect_err("401 must fail");
    assert!(err.to_string().contains("401"), "got: {}", err);
    let _ = server.join();
}

const WIRE_PROFILE_BODY: &str = r#"{"data":{"user":[{"id":5,"firstName":"Grace","lastName":"Hopper","auditRatio":0.9,"xps":[{"amount":1500,"path":"/adam/piscine-go/q"}],"groups":[{"id":4}]}],"transaction":[{"type":"skill_go","amount":12,"createdAt":"2024-01-01T00:00:00Z"}]}}"#;

#[tokio::test]
async fn fetch_profile_sends_bearer_and_parses_response() {
    let (base, server) = one_shot_server("200 OK", WIRE_PROFILE_BODY);
    let api = HttpApi::new(&wire_config(&base));

    let profile = api.fetch_profile("tok.en.x").await.expect("fetch");
    assert_eq!(profile.user.first_name.as_deref(), Some("Grace"));
    assert_eq!(profile.user.xps.len(), 1);
    assert_eq!(profile.transactions[0].kind, "skill_go");

    let request = server.join().expect("server thread");
    assert!(
        request.starts_with("POST /api/graphql-engine/v1/graphql"),
        "request was: {}",
        request
    );
    assert!(request.contains("Bearer tok.en.x"), "request was: {}", request);
}

#[tokio::test]
async fn profile_server_error_is_rejected() {
    let (base, server) = one_shot_server("500 Internal Server Error", "boom");
    let api = HttpApi::new(&wire_config(&base));

    let err = api
        .fetch_profile("tok.en.x")
        .await
        .expect_err("500 must fail");
    assert!(err.to_string().contains("500"), "got: {}", err);
    let _ = server.join();
}
