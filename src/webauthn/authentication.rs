//! # Passkey Authentication Ceremony
//!
//! Same shape as registration: begin, one platform get call, finish. The
//! pieces are public so the conditional (autofill) flow can run the platform
//! call its own way and share the rest.

use crate::api::GalleryApi;
use crate::error::{Ceremony, PasskeyError, PasskeyResult};
use crate::platform::{CredentialPlatform, GetCredentialRequest};
use crate::webauthn::codec;
use crate::webauthn::types::*;
use tracing::{debug, info, instrument};

/// A begun authentication waiting for its assertion
#[derive(Debug)]
pub struct PendingAuthentication {
    session_id: SessionId,
    options: RequestOptionsJson,
}

impl PendingAuthentication {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn options(&self) -> &RequestOptionsJson {
        &self.options
    }

    /// Options decoded for the platform
    pub fn assertion_options(&self) -> PasskeyResult<AssertionOptions> {
        codec::prepare_assertion_options(&self.options)
    }
}

/// Fails with [`PasskeyError::NoPasskeysRegistered`] when the gallery has none
pub async fn begin(api: &GalleryApi) -> PasskeyResult<PendingAuthentication> {
    let BeginResponse {
        session_id,
        options,
    } = api.login_begin().await?;

    debug!(
        session_id = session_id.as_str(),
        allowed = options.allow_credentials.as_ref().map(Vec::len),
        "authentication begun"
    );

    Ok(PendingAuthentication {
        session_id,
        options,
    })
}

pub async fn finish(
    api: &GalleryApi,
    pending: PendingAuthentication,
    credential: &AssertionCredential,
) -> PasskeyResult<LoginOutcome> {
    let serialized = codec::serialize_assertion_credential(credential);

    api.login_finish(&LoginFinishRequest {
        session_id: &pending.session_id,
        credential: &serialized,
    })
    .await
}

/// Full modal authentication ceremony
#[instrument(skip_all)]
pub async fn run_modal(
    api: &GalleryApi,
    platform: &dyn CredentialPlatform,
) -> PasskeyResult<LoginOutcome> {
    let pending = begin(api).await?;

    let request = GetCredentialRequest::modal(pending.assertion_options()?);
    let credential = platform
        .get_credential(request)
        .await
        .map_err(|error| PasskeyError::from_platform(Ceremony::Authentication, error))?;

    let outcome = finish(api, pending, &credential).await?;
    info!(username = %outcome.username, "passkey login");
    Ok(outcome)
}
