//! Router-level tests for appapi-exapp
//!
//! Drives the full router with `oneshot`, fake host services and a fixed
//! clock. Covers:
//! - Public heartbeat
//! - 401 with empty body for every rejection kind
//! - Lifecycle callback registering / unregistering the menu action
//! - File action callback spawning the conversion job
//! - Body size limit

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::util::ServiceExt;

use appapi_common::api::headers::{AE_SIGN_TIME, EX_APP_VERSION};
use appapi_common::api::{AuthScheme, SharedSecret, SignedHeaders, Signer, Verifier};
use appapi_common::config::{AuthConfig, Identity};
use appapi_common::time::FixedClock;
use appapi_exapp::client::ClientError;
use appapi_exapp::media::{MediaConverter, MediaError};
use appapi_exapp::services::{ActionMenu, FileActionMenu, FileStore, HostLogger, LogLevel, Notifier};
use appapi_exapp::{build_router, AppState};

const SECRET: &str = "exapp-test-secret";
const NOW: i64 = 1_730_000_000;

// =============================================================================
// Fakes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum HostCall {
    Log(LogLevel, String),
    Notify { user: String, subject: String },
    Read { user: String, path: String },
    Write { user: String, path: String, bytes: Vec<u8> },
    Register(String),
    Unregister(String),
}

#[derive(Default)]
struct FakeHost {
    calls: Mutex<Vec<HostCall>>,
    fail_menu: bool,
}

impl FakeHost {
    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

fn host_error() -> ClientError {
    ClientError::Status {
        status: 500,
        body: "host unavailable".to_string(),
    }
}

#[async_trait]
impl HostLogger for FakeHost {
    async fn log(&self, level: LogLevel, message: &str) -> Result<(), ClientError> {
        self.record(HostCall::Log(level, message.to_string()));
        Ok(())
    }
}

#[async_trait]
impl Notifier for FakeHost {
    async fn notify(&self, user_id: &str, subject: &str, _message: &str) -> Result<(), ClientError> {
        self.record(HostCall::Notify {
            user: user_id.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl FileStore for FakeHost {
    async fn read_file(&self, user_id: &str, path: &str) -> Result<Vec<u8>, ClientError> {
        self.record(HostCall::Read {
            user: user_id.to_string(),
            path: path.to_string(),
        });
        Ok(b"video".to_vec())
    }

    async fn write_file(&self, user_id: &str, path: &str, content: Vec<u8>) -> Result<(), ClientError> {
        self.record(HostCall::Write {
            user: user_id.to_string(),
            path: path.to_string(),
            bytes: content,
        });
        Ok(())
    }
}

#[async_trait]
impl ActionMenu for FakeHost {
    async fn register(&self, action: &FileActionMenu) -> Result<(), ClientError> {
        if self.fail_menu {
            return Err(host_error());
        }
        self.record(HostCall::Register(action.name.clone()));
        Ok(())
    }

    async fn unregister(&self, name: &str) -> Result<(), ClientError> {
        if self.fail_menu {
            return Err(host_error());
        }
        self.record(HostCall::Unregister(name.to_string()));
        Ok(())
    }
}

struct FakeConverter {
    fail: bool,
}

#[async_trait]
impl MediaConverter for FakeConverter {
    async fn convert(&self, input: Vec<u8>) -> Result<Vec<u8>, MediaError> {
        if self.fail {
            return Err(MediaError::EmptyOutput);
        }
        let mut gif = b"GIF89a:".to_vec();
        gif.extend_from_slice(&input);
        Ok(gif)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn auth_config(scheme: AuthScheme) -> AuthConfig {
    AuthConfig::new(Identity::new("to_gif", "1.0.0"), SharedSecret::new(SECRET)).with_scheme(scheme)
}

fn signer(scheme: AuthScheme) -> Signer {
    Signer::with_clock(auth_config(scheme), Arc::new(FixedClock::new(NOW)))
}

struct TestApp {
    router: Router,
    host: Arc<FakeHost>,
}

fn setup(scheme: AuthScheme, host: FakeHost, converter: FakeConverter) -> TestApp {
    let host = Arc::new(host);
    let verifier = Verifier::with_clock(auth_config(scheme), Arc::new(FixedClock::new(NOW)));
    let state = AppState::new(verifier, host.clone(), Arc::new(converter));
    TestApp {
        router: build_router(state),
        host,
    }
}

fn default_app() -> TestApp {
    setup(AuthScheme::HmacV1, FakeHost::default(), FakeConverter { fail: false })
}

/// Build a request carrying `headers`
fn request(method: &str, uri: &str, headers: &SignedHeaders, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    if !body.is_empty() {
        builder = builder.header("Content-Type", "application/json");
    }
    builder.body(Body::from(body)).unwrap()
}

/// Sign with `signer`, splitting `uri` into path and query the same way the
/// server will
fn signed_request(
    signer: &Signer,
    method: &str,
    uri: &str,
    body: Vec<u8>,
    user: Option<&str>,
) -> Request<Body> {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    };
    let headers = signer.sign(method, path, query, &body, user);
    request(method, uri, &headers, body)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn action_body(user: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "actionName": "to_gif",
        "actionHandler": "/video_to_gif",
        "actionFile": {
            "fileId": 42,
            "name": "clip.mp4",
            "directory": "/Videos",
            "etag": "abc",
            "mime": "video/mp4",
            "fileType": "file",
            "size": 5,
            "favorite": "false",
            "permissions": 27,
            "mtime": 1_700_000_000,
            "userId": user,
            "shareOwner": null,
            "shareOwnerId": null,
            "instanceId": null
        }
    }))
    .unwrap()
}

/// Wait for the background job to produce `count` host calls
async fn wait_for_calls(host: &FakeHost, count: usize) -> Vec<HostCall> {
    for _ in 0..200 {
        let calls = host.calls();
        if calls.len() >= count {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Expected {} host calls, got {:?}", count, host.calls());
}

// =============================================================================
// Heartbeat
// =============================================================================

#[tokio::test]
async fn test_heartbeat_needs_no_auth() {
    let app = default_app();
    let response = app
        .router
        .oneshot(Request::get("/heartbeat").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_unsigned_request_is_rejected_with_empty_body() {
    let app = default_app();
    let response = app
        .router
        .oneshot(request("PUT", "/enabled?enabled=1", &SignedHeaders::new(), Vec::new()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_bytes(response).await.is_empty());
    assert!(app.host.calls().is_empty());
}

#[tokio::test]
async fn test_every_failure_kind_maps_to_401() {
    let good = signer(AuthScheme::HmacV1).sign("PUT", "/enabled", Some("enabled=1"), b"", None);

    let mut stale = good.clone();
    stale.set(AE_SIGN_TIME, (NOW - 301).to_string());

    let mut wrong_version = good.clone();
    wrong_version.set(EX_APP_VERSION, "0.9.0");

    let wrong_secret = Signer::with_clock(
        AuthConfig::new(Identity::new("to_gif", "1.0.0"), SharedSecret::new("other")),
        Arc::new(FixedClock::new(NOW)),
    )
    .sign("PUT", "/enabled", Some("enabled=1"), b"", None);

    let cases = [
        ("stale", stale, "/enabled?enabled=1"),
        ("version", wrong_version, "/enabled?enabled=1"),
        ("secret", wrong_secret, "/enabled?enabled=1"),
        ("query", good.clone(), "/enabled?enabled=0"),
    ];

    for (label, headers, uri) in cases {
        let app = default_app();
        let response = app
            .router
            .oneshot(request("PUT", uri, &headers, Vec::new()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", label);
        assert!(body_bytes(response).await.is_empty(), "{}", label);
        assert!(app.host.calls().is_empty(), "{}", label);
    }
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let app = default_app();
    let body = action_body("alice");
    let headers = signer(AuthScheme::HmacV1).sign("POST", "/video_to_gif", None, &body, Some("alice"));

    let mut tampered = body.clone();
    let index = tampered.len() / 2;
    tampered[index] ^= 0x01;

    let response = app
        .router
        .oneshot(request("POST", "/video_to_gif", &headers, tampered))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let app = default_app();
    let body = vec![b'x'; 10 * 1024 * 1024 + 1024];
    let headers = signer(AuthScheme::HmacV1).sign("POST", "/video_to_gif", None, &body, None);

    let response = app
        .router
        .oneshot(request("POST", "/video_to_gif", &headers, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_enable_registers_menu_action() {
    let app = default_app();
    let response = app
        .router
        .oneshot(signed_request(&signer(AuthScheme::HmacV1), "PUT", "/enabled?enabled=1", Vec::new(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"error": ""}));
    assert_eq!(app.host.calls(), vec![HostCall::Register("to_gif".to_string())]);
}

#[tokio::test]
async fn test_disable_unregisters_menu_action() {
    let app = default_app();
    let response = app
        .router
        .oneshot(signed_request(&signer(AuthScheme::HmacV1), "PUT", "/enabled?enabled=false", Vec::new(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.host.calls(), vec![HostCall::Unregister("to_gif".to_string())]);
}

#[tokio::test]
async fn test_menu_failure_is_reported_in_body() {
    let host = FakeHost {
        fail_menu: true,
        ..Default::default()
    };
    let app = setup(AuthScheme::HmacV1, host, FakeConverter { fail: false });
    let response = app
        .router
        .oneshot(signed_request(&signer(AuthScheme::HmacV1), "PUT", "/enabled?enabled=1", Vec::new(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_credential_scheme_router() {
    let app = setup(AuthScheme::CredentialV2, FakeHost::default(), FakeConverter { fail: false });
    let response = app
        .router
        .oneshot(signed_request(&signer(AuthScheme::CredentialV2), "PUT", "/enabled?enabled=1", Vec::new(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // HMAC-signed calls are not accepted by a credential-configured ExApp
    let app = setup(AuthScheme::CredentialV2, FakeHost::default(), FakeConverter { fail: false });
    let response = app
        .router
        .oneshot(signed_request(&signer(AuthScheme::HmacV1), "PUT", "/enabled?enabled=1", Vec::new(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// File Action
// =============================================================================

#[tokio::test]
async fn test_video_to_gif_runs_conversion_job() {
    let app = default_app();
    let response = app
        .router
        .oneshot(signed_request(
            &signer(AuthScheme::HmacV1),
            "POST",
            "/video_to_gif",
            action_body("alice"),
            Some("alice"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = wait_for_calls(&app.host, 7).await;
    assert_eq!(
        calls[0],
        HostCall::Log(
            LogLevel::Warning,
            "Processing: /Videos/clip.mp4 -> /Videos/clip.gif".to_string()
        )
    );
    assert!(calls.contains(&HostCall::Read {
        user: "alice".to_string(),
        path: "/Videos/clip.mp4".to_string(),
    }));
    assert!(calls.contains(&HostCall::Write {
        user: "alice".to_string(),
        path: "/Videos/clip.gif".to_string(),
        bytes: b"GIF89a:video".to_vec(),
    }));
    assert_eq!(
        calls.last(),
        Some(&HostCall::Notify {
            user: "alice".to_string(),
            subject: "clip.mp4 finished!".to_string(),
        })
    );
}

#[tokio::test]
async fn test_signed_user_wins_over_body_user() {
    let app = default_app();
    let response = app
        .router
        .oneshot(signed_request(
            &signer(AuthScheme::HmacV1),
            "POST",
            "/video_to_gif",
            action_body("mallory"),
            Some("alice"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = wait_for_calls(&app.host, 2).await;
    assert_eq!(
        calls[1],
        HostCall::Read {
            user: "alice".to_string(),
            path: "/Videos/clip.mp4".to_string(),
        }
    );
}

#[tokio::test]
async fn test_conversion_failure_is_logged_and_notified() {
    let app = setup(AuthScheme::HmacV1, FakeHost::default(), FakeConverter { fail: true });
    let response = app
        .router
        .oneshot(signed_request(
            &signer(AuthScheme::HmacV1),
            "POST",
            "/video_to_gif",
            action_body("alice"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Processing, Read, "File downloaded", error log, notification
    let calls = wait_for_calls(&app.host, 5).await;
    assert!(calls
        .iter()
        .any(|call| matches!(call, HostCall::Log(LogLevel::Error, message) if message.contains("Failed to convert video"))));
    assert_eq!(
        calls.last(),
        Some(&HostCall::Notify {
            user: "alice".to_string(),
            subject: "Error occurred".to_string(),
        })
    );
    assert!(!calls.iter().any(|call| matches!(call, HostCall::Write { .. })));
}

#[tokio::test]
async fn test_malformed_action_body_after_auth() {
    let app = default_app();
    let response = app
        .router
        .oneshot(signed_request(
            &signer(AuthScheme::HmacV1),
            "POST",
            "/video_to_gif",
            br#"{"actionName":"to_gif"}"#.to_vec(),
            None,
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}
