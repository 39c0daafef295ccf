//! # Passkey Service
//!
//! The one object the login and settings pages talk to. Build it once at
//! startup and share it (by reference or inside an `Arc`); it owns the HTTP
//! client, the platform handle, the cached capability flags and the
//! conditional-UI slot.
//!
//! ## Operations
//! - `register_passkey`: create a passkey for the signed-in account
//! - `login`: modal passkey login, cancelling any autofill attempt first
//! - `start_conditional_ui` / `abort_conditional_ui`: autofill login
//! - `list_passkeys` / `delete_passkey`: passkey management
//! - `is_platform_authenticator_available`: best-effort capability probe

use crate::api::GalleryApi;
use crate::config::ClientConfig;
use crate::error::{PasskeyError, PasskeyResult};
use crate::platform::CredentialPlatform;
use crate::webauthn::conditional::{ConditionalPhase, ConditionalUi};
use crate::webauthn::types::{DeleteOutcome, LoginOutcome, Passkey, RegistrationOutcome};
use crate::webauthn::{authentication, registration};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment capabilities, computed once when the service is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Secure origin and a platform credential API
    pub supported: bool,
    /// `supported`, plus the platform can probe for conditional mediation
    pub conditional_ui_supported: bool,
}

pub struct PasskeyService {
    api: GalleryApi,
    platform: Arc<dyn CredentialPlatform>,
    capabilities: Capabilities,
    conditional: ConditionalUi,
}

impl PasskeyService {
    pub fn new(config: ClientConfig, platform: Arc<dyn CredentialPlatform>) -> PasskeyResult<Self> {
        let environment = platform.environment();
        let supported = config.is_secure_context() && environment.credential_api;
        let capabilities = Capabilities {
            supported,
            conditional_ui_supported: supported && environment.conditional_mediation_probe,
        };
        info!(
            origin = %config.base_url,
            supported = capabilities.supported,
            conditional_ui = capabilities.conditional_ui_supported,
            "passkey service ready"
        );

        Ok(Self {
            api: GalleryApi::new(config)?,
            platform,
            capabilities,
            conditional: ConditionalUi::new(capabilities.conditional_ui_supported),
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn api(&self) -> &GalleryApi {
        &self.api
    }

    fn ensure_supported(&self) -> PasskeyResult<()> {
        if self.capabilities.supported {
            Ok(())
        } else {
            Err(PasskeyError::UnsupportedEnvironment)
        }
    }

    pub async fn register_passkey(&self, label: &str) -> PasskeyResult<RegistrationOutcome> {
        self.ensure_supported()?;
        registration::run(&self.api, self.platform.as_ref(), label).await
    }

    /// Modal login. A live autofill attempt is cancelled before anything else
    /// so the two never compete for the authenticator.
    pub async fn login(&self) -> PasskeyResult<LoginOutcome> {
        self.ensure_supported()?;
        self.conditional.abort();
        authentication::run_modal(&self.api, self.platform.as_ref()).await
    }

    /// Autofill login; `Ok(None)` whenever it could not or did not complete
    pub async fn start_conditional_ui(&self) -> PasskeyResult<Option<LoginOutcome>> {
        self.conditional.start(&self.api, self.platform.as_ref()).await
    }

    pub fn abort_conditional_ui(&self) {
        self.conditional.abort();
    }

    pub fn conditional_phase(&self) -> ConditionalPhase {
        self.conditional.phase()
    }

    pub async fn list_passkeys(&self) -> PasskeyResult<Vec<Passkey>> {
        self.api.list_passkeys().await
    }

    pub async fn delete_passkey(&self, id: &str) -> PasskeyResult<DeleteOutcome> {
        let outcome = self.api.delete_passkey(id).await?;
        info!(id, "passkey deleted");
        Ok(outcome)
    }

    /// Whether a built-in authenticator (Touch ID, Windows Hello, ...) exists.
    /// Never fails: probe errors read as `false`.
    pub async fn is_platform_authenticator_available(&self) -> bool {
        if !self.capabilities.supported {
            return false;
        }
        match self.platform.is_platform_authenticator_available().await {
            Ok(available) => available,
            Err(error) => {
                debug!(%error, "platform authenticator probe failed");
                false
            }
        }
    }

    /// Whether the gallery has passkey login enabled
    pub async fn server_availability(&self) -> PasskeyResult<bool> {
        Ok(self.api.availability().await?.available)
    }
}
