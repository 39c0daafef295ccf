//! # Passkey Registration Ceremony
//!
//! Registration is a two-step exchange with the gallery wrapped around one
//! platform call.
//!
//! ## Registration Flow
//! 1. **Begin**: POST the label → receive `{sessionId, options}`
//! 2. **Create**: decode the options, ask the platform for a new credential
//! 3. **Finish**: encode the credential, POST `{sessionId, credential, label}`
//!
//! [`finish`] consumes the [`PendingRegistration`] returned by [`begin`], so a
//! finish without its begin cannot be expressed.

use crate::api::GalleryApi;
use crate::error::{Ceremony, PasskeyError, PasskeyResult};
use crate::platform::CredentialPlatform;
use crate::webauthn::codec;
use crate::webauthn::types::*;
use tracing::{debug, info, instrument};

/// A begun registration waiting for its credential
#[derive(Debug)]
pub struct PendingRegistration {
    session_id: SessionId,
    options: CreationOptionsJson,
    label: String,
}

impl PendingRegistration {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn options(&self) -> &CreationOptionsJson {
        &self.options
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Step 1: ask the gallery for creation options.
///
/// An empty label is left out of the begin body so the server picks a default.
pub async fn begin(api: &GalleryApi, label: &str) -> PasskeyResult<PendingRegistration> {
    let requested = Some(label).filter(|label| !label.is_empty());
    let BeginResponse {
        session_id,
        options,
    } = api.register_begin(requested).await?;

    debug!(
        session_id = session_id.as_str(),
        excluded = options.exclude_credentials.as_ref().map(Vec::len),
        "registration begun"
    );

    Ok(PendingRegistration {
        session_id,
        options,
        label: label.to_string(),
    })
}

/// Step 2: have the platform create the credential
pub async fn create(
    platform: &dyn CredentialPlatform,
    pending: &PendingRegistration,
) -> PasskeyResult<CreationCredential> {
    let options = codec::prepare_creation_options(&pending.options)?;

    platform
        .create_credential(options)
        .await
        .map_err(|error| PasskeyError::from_platform(Ceremony::Registration, error))
}

/// Step 3: hand the credential to the gallery for verification
pub async fn finish(
    api: &GalleryApi,
    pending: PendingRegistration,
    credential: &CreationCredential,
) -> PasskeyResult<RegistrationOutcome> {
    let serialized = codec::serialize_creation_credential(credential);

    api.register_finish(&RegisterFinishRequest {
        session_id: &pending.session_id,
        credential: &serialized,
        label: &pending.label,
    })
    .await
}

/// Full registration ceremony
#[instrument(skip_all, fields(label = %label))]
pub async fn run(
    api: &GalleryApi,
    platform: &dyn CredentialPlatform,
    label: &str,
) -> PasskeyResult<RegistrationOutcome> {
    let pending = begin(api, label).await?;
    let credential = create(platform, &pending).await?;
    let outcome = finish(api, pending, &credential).await?;

    info!(credential_id = %outcome.credential_id, "passkey registered");
    Ok(outcome)
}
