//! # Configuration Management
//!
//! Where the gallery lives and which paths its passkey endpoints use.
//!
//! ## Environment Variables
//! - `GALLERY_URL`: Base URL of the gallery server, optionally with a path
//!   prefix such as `https://host/gallery` (default: http://localhost:8080)
//! - `GALLERY_SESSION_COOKIE`: Cookie header sent on management calls (optional)
//! - `GALLERY_AVAILABILITY_PATH`: Passkey availability endpoint
//!   (default: /api/auth/webauthn/available)

use crate::error::PasskeyResult;
use std::env;
use url::{Host, Url};

/// Paths of the passkey endpoints, relative to the gallery base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub register_begin: String,
    pub register_finish: String,
    pub login_begin: String,
    pub login_finish: String,
    /// GET lists, DELETE removes
    pub passkeys: String,
    pub availability: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            register_begin: "/api/auth/webauthn/register/begin".to_string(),
            register_finish: "/api/auth/webauthn/register/finish".to_string(),
            login_begin: "/api/auth/webauthn/login/begin".to_string(),
            login_finish: "/api/auth/webauthn/login/finish".to_string(),
            passkeys: "/api/auth/webauthn/passkeys".to_string(),
            availability: "/api/auth/webauthn/available".to_string(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gallery origin, e.g. "https://photos.example.com"
    pub base_url: Url,

    /// Raw `Cookie` header value carrying an existing session.
    /// Listing and deleting passkeys require one.
    pub session_cookie: Option<String>,

    pub endpoints: Endpoints,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            session_cookie: None,
            endpoints: Endpoints::default(),
        }
    }

    /// Load configuration from the environment (and a `.env` file if present)
    pub fn from_env() -> PasskeyResult<Self> {
        dotenvy::dotenv().ok();

        let base_url = Url::parse(
            &env::var("GALLERY_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
        )?;

        let mut config = Self::new(base_url);
        config.session_cookie = env::var("GALLERY_SESSION_COOKIE")
            .ok()
            .filter(|cookie| !cookie.trim().is_empty());
        if let Ok(path) = env::var("GALLERY_AVAILABILITY_PATH") {
            config.endpoints.availability = path;
        }

        Ok(config)
    }

    /// Resolve an endpoint path under the gallery base URL, keeping any
    /// path prefix the base carries
    pub fn endpoint(&self, path: &str) -> PasskeyResult<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefix = format!("{}/", base.path());
            base.set_path(&prefix);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// Whether the origin counts as a secure context: `https`, or a loopback host
    pub fn is_secure_context(&self) -> bool {
        if self.base_url.scheme() == "https" {
            return true;
        }
        match self.base_url.host() {
            Some(Host::Domain(domain)) => {
                domain == "localhost" || domain.ends_with(".localhost")
            }
            Some(Host::Ipv4(addr)) => addr.is_loopback(),
            Some(Host::Ipv6(addr)) => addr.is_loopback(),
            None => false,
        }
    }
}
