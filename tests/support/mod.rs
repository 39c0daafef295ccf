//! Test doubles: a fake gallery server and a scripted credential platform.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use gallery_passkey::error::PlatformError;
use gallery_passkey::platform::{
    CredentialPlatform, GetCredentialRequest, Mediation, PlatformEnvironment,
};
use gallery_passkey::webauthn::codec::encode;
use gallery_passkey::webauthn::types::*;
use gallery_passkey::{ClientConfig, PasskeyService};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

// Fake gallery server

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    RegisterBegin,
    RegisterFinish,
    LoginBegin,
    LoginFinish,
    ListPasskeys,
    DeletePasskey,
    Availability,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub route: Route,
    pub body: Value,
    pub cookie: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self::json_status(StatusCode::OK, body)
    }

    pub fn json_status(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

/// A request parked inside the fake gallery until released
#[derive(Clone, Default)]
pub struct Hold {
    arrived: Arc<Notify>,
    release: Arc<Notify>,
}

impl Hold {
    pub async fn arrived(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.arrived.notified())
            .await
            .expect("held request never arrived");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Clone, Default)]
pub struct FakeGallery {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    replies: Arc<Mutex<HashMap<Route, Reply>>>,
    holds: Arc<Mutex<HashMap<Route, Hold>>>,
}

pub const REGISTER_SESSION: &str = "reg-session-1";
pub const LOGIN_SESSION: &str = "login-session-1";

pub fn creation_options() -> Value {
    json!({
        "challenge": encode(b"registration-challenge"),
        "rp": { "id": "127.0.0.1", "name": "Gallery" },
        "user": { "id": encode(b"user-alice"), "name": "alice", "displayName": "Alice" },
        "pubKeyCredParams": [
            { "type": "public-key", "alg": -7 },
            { "type": "public-key", "alg": -257 }
        ],
        "timeout": 60000,
        "authenticatorSelection": { "residentKey": "required", "userVerification": "preferred" },
        "attestation": "none"
    })
}

pub fn request_options() -> Value {
    json!({
        "challenge": encode(b"login-challenge"),
        "timeout": 60000,
        "rpId": "127.0.0.1",
        "userVerification": "preferred"
    })
}

fn default_reply(route: Route) -> Reply {
    match route {
        Route::RegisterBegin => Reply::json(json!({
            "sessionId": REGISTER_SESSION,
            "options": creation_options()
        })),
        Route::RegisterFinish => Reply::json(json!({
            "success": true,
            "credentialId": "cred-id-123"
        })),
        Route::LoginBegin => Reply::json(json!({
            "sessionId": LOGIN_SESSION,
            "options": request_options()
        })),
        Route::LoginFinish => Reply::json(json!({ "success": true, "username": "alice" })),
        Route::ListPasskeys => Reply::json(json!({
            "passkeys": [
                {
                    "id": "pk-1",
                    "name": "My Phone",
                    "createdAt": "2024-01-15T10:30:00Z",
                    "lastUsedAt": "2024-02-01T08:00:00Z"
                },
                { "id": "pk-2", "name": "YubiKey", "createdAt": "2024-03-10T12:00:00Z" }
            ]
        })),
        Route::DeletePasskey => Reply::json(json!({ "success": true, "deleted": "pk-1" })),
        Route::Availability => Reply::json(json!({ "available": true })),
    }
}

impl FakeGallery {
    /// Start serving on an ephemeral loopback port
    pub async fn spawn() -> (Self, Url) {
        let gallery = FakeGallery::default();

        let app = Router::new()
            .route("/api/auth/webauthn/register/begin", post(register_begin))
            .route("/api/auth/webauthn/register/finish", post(register_finish))
            .route("/api/auth/webauthn/login/begin", post(login_begin))
            .route("/api/auth/webauthn/login/finish", post(login_finish))
            .route(
                "/api/auth/webauthn/passkeys",
                get(list_passkeys).delete(delete_passkey),
            )
            .route("/api/auth/webauthn/available", get(availability))
            .with_state(gallery.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = Url::parse(&format!("http://{addr}")).unwrap();
        (gallery, url)
    }

    pub fn reply(&self, route: Route, reply: Reply) {
        self.replies.lock().insert(route, reply);
    }

    /// Park the next request to `route` until the returned hold is released
    pub fn hold(&self, route: Route) -> Hold {
        let hold = Hold::default();
        self.holds.lock().insert(route, hold.clone());
        hold
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.calls.lock().iter().map(|call| call.route).collect()
    }

    pub fn last_body(&self, route: Route) -> Value {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|call| call.route == route)
            .map(|call| call.body.clone())
            .expect("route was never called")
    }

    async fn respond(&self, route: Route, headers: &HeaderMap, body: &[u8]) -> Response {
        let body = serde_json::from_slice(body).unwrap_or(Value::Null);
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.calls.lock().push(RecordedCall {
            route,
            body,
            cookie,
        });

        let hold = self.holds.lock().remove(&route);
        if let Some(hold) = hold {
            hold.arrived.notify_one();
            hold.release.notified().await;
        }

        let reply = self
            .replies
            .lock()
            .get(&route)
            .cloned()
            .unwrap_or_else(|| default_reply(route));
        (
            reply.status,
            [(header::CONTENT_TYPE, reply.content_type)],
            reply.body,
        )
            .into_response()
    }
}

async fn register_begin(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::RegisterBegin, &headers, &body).await
}

async fn register_finish(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::RegisterFinish, &headers, &body).await
}

async fn login_begin(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::LoginBegin, &headers, &body).await
}

async fn login_finish(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::LoginFinish, &headers, &body).await
}

async fn list_passkeys(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::ListPasskeys, &headers, &body).await
}

async fn delete_passkey(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::DeletePasskey, &headers, &body).await
}

async fn availability(
    State(gallery): State<FakeGallery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    gallery.respond(Route::Availability, &headers, &body).await
}

// Fake platform

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Create {
        challenge: Vec<u8>,
        user_id: Vec<u8>,
        excluded: Option<Vec<Vec<u8>>>,
    },
    Get {
        mediation: Mediation,
        challenge: Vec<u8>,
        /// Every signal handed out before this call was already cancelled
        earlier_signals_cancelled: bool,
    },
    ConditionalProbe {
        earlier_signals_cancelled: bool,
    },
    AuthenticatorProbe,
}

pub struct FakePlatform {
    environment: PlatformEnvironment,
    conditional_available: AtomicBool,
    create_result: Mutex<Option<Result<CreationCredential, PlatformError>>>,
    get_result: Mutex<Option<Result<AssertionCredential, PlatformError>>>,
    conditional_result: Mutex<Option<Result<AssertionCredential, PlatformError>>>,
    after_cancel: Mutex<Option<Result<AssertionCredential, PlatformError>>>,
    authenticator_probe: Mutex<Result<bool, PlatformError>>,
    events: Mutex<Vec<PlatformEvent>>,
    signals: Mutex<Vec<CancellationToken>>,
    conditional_started: Notify,
}

impl FakePlatform {
    pub fn with_environment(environment: PlatformEnvironment) -> Self {
        Self {
            environment,
            conditional_available: AtomicBool::new(true),
            create_result: Mutex::new(None),
            get_result: Mutex::new(None),
            conditional_result: Mutex::new(None),
            after_cancel: Mutex::new(None),
            authenticator_probe: Mutex::new(Ok(true)),
            events: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            conditional_started: Notify::new(),
        }
    }

    /// A browser with passkeys and autofill
    pub fn browser() -> Self {
        Self::with_environment(PlatformEnvironment {
            credential_api: true,
            conditional_mediation_probe: true,
        })
    }

    pub fn without_conditional_probe() -> Self {
        Self::with_environment(PlatformEnvironment {
            credential_api: true,
            conditional_mediation_probe: false,
        })
    }

    pub fn without_credential_api() -> Self {
        Self::with_environment(PlatformEnvironment::default())
    }

    pub fn set_conditional_available(&self, available: bool) {
        self.conditional_available.store(available, Ordering::SeqCst);
    }

    pub fn fail_create(&self, error: PlatformError) {
        *self.create_result.lock() = Some(Err(error));
    }

    pub fn fail_get(&self, error: PlatformError) {
        *self.get_result.lock() = Some(Err(error));
    }

    /// Settle the next conditional get immediately instead of waiting for abort
    pub fn settle_conditional(&self, result: Result<AssertionCredential, PlatformError>) {
        *self.conditional_result.lock() = Some(result);
    }

    /// Have the next parked conditional get answer with `result` once its
    /// signal fires, instead of `AbortError`
    pub fn answer_after_cancel(&self, result: Result<AssertionCredential, PlatformError>) {
        *self.after_cancel.lock() = Some(result);
    }

    pub fn set_authenticator_probe(&self, result: Result<bool, PlatformError>) {
        *self.authenticator_probe.lock() = result;
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events.lock().clone()
    }

    pub fn signals(&self) -> Vec<CancellationToken> {
        self.signals.lock().clone()
    }

    /// Wait until a conditional get call is parked on the platform
    pub async fn conditional_get_started(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.conditional_started.notified())
            .await
            .expect("conditional get never reached the platform");
    }

    fn earlier_signals_cancelled(&self) -> bool {
        self.signals.lock().iter().all(CancellationToken::is_cancelled)
    }
}

pub fn creation_credential() -> CreationCredential {
    CreationCredential {
        id: "cred-id-123".to_string(),
        raw_id: b"cred-id-123".to_vec(),
        credential_type: "public-key".to_string(),
        authenticator_attachment: Some("platform".to_string()),
        response: AttestationResponse {
            client_data_json: br#"{"type":"webauthn.create"}"#.to_vec(),
            attestation_object: vec![0xa3, 0x63, 0x66, 0x6d, 0x74],
            transports: Some(vec!["internal".to_string(), "hybrid".to_string()]),
        },
    }
}

pub fn assertion_credential() -> AssertionCredential {
    AssertionCredential {
        id: "cred-id-123".to_string(),
        raw_id: b"cred-id-123".to_vec(),
        credential_type: "public-key".to_string(),
        response: AssertionResponse {
            client_data_json: br#"{"type":"webauthn.get"}"#.to_vec(),
            authenticator_data: vec![0x49; 37],
            signature: vec![0x30, 0x45, 0x02, 0x20],
            user_handle: Some(b"user-alice".to_vec()),
        },
    }
}

#[async_trait]
impl CredentialPlatform for FakePlatform {
    fn environment(&self) -> PlatformEnvironment {
        self.environment
    }

    async fn create_credential(
        &self,
        options: CreationOptions,
    ) -> Result<CreationCredential, PlatformError> {
        self.events.lock().push(PlatformEvent::Create {
            challenge: options.challenge,
            user_id: options.user.id,
            excluded: options
                .exclude_credentials
                .map(|list| list.into_iter().map(|entry| entry.id).collect()),
        });
        self.create_result
            .lock()
            .take()
            .unwrap_or_else(|| Ok(creation_credential()))
    }

    async fn get_credential(
        &self,
        request: GetCredentialRequest,
    ) -> Result<AssertionCredential, PlatformError> {
        let earlier_signals_cancelled = self.earlier_signals_cancelled();
        self.events.lock().push(PlatformEvent::Get {
            mediation: request.mediation,
            challenge: request.public_key.challenge.clone(),
            earlier_signals_cancelled,
        });

        if request.mediation != Mediation::Conditional {
            return self
                .get_result
                .lock()
                .take()
                .unwrap_or_else(|| Ok(assertion_credential()));
        }

        let signal = request.signal.expect("conditional get without a signal");
        self.signals.lock().push(signal.clone());
        self.conditional_started.notify_one();

        let scripted = self.conditional_result.lock().take();
        match scripted {
            Some(result) => result,
            None => {
                signal.cancelled().await;
                self.after_cancel
                    .lock()
                    .take()
                    .unwrap_or(Err(PlatformError::Aborted))
            }
        }
    }

    async fn is_conditional_mediation_available(&self) -> Result<bool, PlatformError> {
        let earlier_signals_cancelled = self.earlier_signals_cancelled();
        self.events
            .lock()
            .push(PlatformEvent::ConditionalProbe { earlier_signals_cancelled });
        Ok(self.conditional_available.load(Ordering::SeqCst))
    }

    async fn is_platform_authenticator_available(&self) -> Result<bool, PlatformError> {
        self.events.lock().push(PlatformEvent::AuthenticatorProbe);
        self.authenticator_probe.lock().clone()
    }
}

// Wiring

pub struct Harness {
    pub service: Arc<PasskeyService>,
    pub gallery: FakeGallery,
    pub platform: Arc<FakePlatform>,
}

pub async fn harness(platform: FakePlatform) -> Harness {
    let (gallery, url) = FakeGallery::spawn().await;
    let platform = Arc::new(platform);
    let mut config = ClientConfig::new(url);
    config.session_cookie = Some("gallery_session=abc123".to_string());

    let service = PasskeyService::new(config, platform.clone()).unwrap();
    Harness {
        service: Arc::new(service),
        gallery,
        platform,
    }
}
