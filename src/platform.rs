//! # Platform Credential API
//!
//! The narrow interface the ceremonies drive: create a credential, get an
//! assertion, and two capability probes. A browser binding, a native
//! authenticator stack or a test double can all sit behind it.

use crate::error::PlatformError;
use crate::webauthn::types::{
    AssertionCredential, AssertionOptions, CreationCredential, CreationOptions,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// What the environment offers, probed synchronously once per service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformEnvironment {
    /// A public-key credential API is present
    pub credential_api: bool,
    /// The conditional-mediation probe exists (autofill may be usable)
    pub conditional_mediation_probe: bool,
}

/// How the platform should present a get request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mediation {
    Silent,
    #[default]
    Optional,
    Conditional,
    Required,
}

/// A get call: the options plus how to mediate and an optional abort signal
#[derive(Debug, Clone)]
pub struct GetCredentialRequest {
    pub public_key: AssertionOptions,
    pub mediation: Mediation,
    /// Once cancelled, the platform must settle with [`PlatformError::Aborted`]
    pub signal: Option<CancellationToken>,
}

impl GetCredentialRequest {
    pub fn modal(public_key: AssertionOptions) -> Self {
        Self {
            public_key,
            mediation: Mediation::Optional,
            signal: None,
        }
    }

    pub fn conditional(public_key: AssertionOptions, signal: CancellationToken) -> Self {
        Self {
            public_key,
            mediation: Mediation::Conditional,
            signal: Some(signal),
        }
    }
}

#[async_trait]
pub trait CredentialPlatform: Send + Sync {
    fn environment(&self) -> PlatformEnvironment;

    async fn create_credential(
        &self,
        options: CreationOptions,
    ) -> Result<CreationCredential, PlatformError>;

    async fn get_credential(
        &self,
        request: GetCredentialRequest,
    ) -> Result<AssertionCredential, PlatformError>;

    async fn is_conditional_mediation_available(&self) -> Result<bool, PlatformError>;

    async fn is_platform_authenticator_available(&self) -> Result<bool, PlatformError>;
}

/// Platform of a headless process: no credential API at all.
///
/// Management calls (list/delete) work; ceremonies report an unsupported
/// environment before touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

#[async_trait]
impl CredentialPlatform for Headless {
    fn environment(&self) -> PlatformEnvironment {
        PlatformEnvironment::default()
    }

    async fn create_credential(
        &self,
        _options: CreationOptions,
    ) -> Result<CreationCredential, PlatformError> {
        Err(PlatformError::NotSupported("no credential API in a headless process".into()))
    }

    async fn get_credential(
        &self,
        _request: GetCredentialRequest,
    ) -> Result<AssertionCredential, PlatformError> {
        Err(PlatformError::NotSupported("no credential API in a headless process".into()))
    }

    async fn is_conditional_mediation_available(&self) -> Result<bool, PlatformError> {
        Ok(false)
    }

    async fn is_platform_authenticator_available(&self) -> Result<bool, PlatformError> {
        Ok(false)
    }
}
