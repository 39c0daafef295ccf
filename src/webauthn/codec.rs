//! # Binary Codec
//!
//! base64url (URL-safe alphabet, no padding) conversion for everything binary
//! that crosses the wire, and the option/credential conversions built on it.
//!
//! Conversions never mutate their input: prepared options are a fresh value,
//! so a begin response can still be inspected after it was used.

use crate::error::PasskeyResult;
use crate::webauthn::types::*;
use base64::prelude::*;

/// Encode bytes as unpadded base64url. Never emits `+`, `/` or `=`.
pub fn encode(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url text, with or without trailing padding
pub fn decode(text: &str) -> PasskeyResult<Vec<u8>> {
    Ok(BASE64_URL_SAFE_NO_PAD.decode(text.trim_end_matches('='))?)
}

fn prepare_descriptors(
    list: Option<&Vec<CredentialDescriptorJson>>,
) -> PasskeyResult<Option<Vec<CredentialDescriptor>>> {
    list.map(|entries| {
        entries
            .iter()
            .map(|entry| -> PasskeyResult<CredentialDescriptor> {
                Ok(CredentialDescriptor {
                    id: decode(&entry.id)?,
                    credential_type: entry.credential_type.clone(),
                    transports: entry.transports.clone(),
                })
            })
            .collect::<PasskeyResult<Vec<_>>>()
    })
    .transpose()
}

/// Convert register/begin options into platform form.
///
/// Decodes the challenge, the user id and every exclusion entry. A missing
/// exclusion list stays missing.
pub fn prepare_creation_options(options: &CreationOptionsJson) -> PasskeyResult<CreationOptions> {
    Ok(CreationOptions {
        challenge: decode(&options.challenge)?,
        rp: options.rp.clone(),
        user: UserEntity {
            id: decode(&options.user.id)?,
            name: options.user.name.clone(),
            display_name: options.user.display_name.clone(),
        },
        pub_key_cred_params: options.pub_key_cred_params.clone(),
        timeout: options.timeout,
        exclude_credentials: prepare_descriptors(options.exclude_credentials.as_ref())?,
        authenticator_selection: options.authenticator_selection.clone(),
        attestation: options.attestation.clone(),
        extensions: options.extensions.clone(),
    })
}

/// Convert login/begin options into platform form
pub fn prepare_assertion_options(options: &RequestOptionsJson) -> PasskeyResult<AssertionOptions> {
    Ok(AssertionOptions {
        challenge: decode(&options.challenge)?,
        timeout: options.timeout,
        rp_id: options.rp_id.clone(),
        allow_credentials: prepare_descriptors(options.allow_credentials.as_ref())?,
        user_verification: options.user_verification.clone(),
        extensions: options.extensions.clone(),
    })
}

pub fn serialize_creation_credential(
    credential: &CreationCredential,
) -> SerializedCreationCredential {
    SerializedCreationCredential {
        id: credential.id.clone(),
        raw_id: encode(&credential.raw_id),
        credential_type: credential.credential_type.clone(),
        response: SerializedAttestationResponse {
            client_data_json: encode(&credential.response.client_data_json),
            attestation_object: encode(&credential.response.attestation_object),
            transports: credential.response.transports.clone(),
        },
        authenticator_attachment: credential.authenticator_attachment.clone(),
    }
}

pub fn serialize_assertion_credential(
    credential: &AssertionCredential,
) -> SerializedAssertionCredential {
    SerializedAssertionCredential {
        id: credential.id.clone(),
        raw_id: encode(&credential.raw_id),
        credential_type: credential.credential_type.clone(),
        response: SerializedAssertionResponse {
            client_data_json: encode(&credential.response.client_data_json),
            authenticator_data: encode(&credential.response.authenticator_data),
            signature: encode(&credential.response.signature),
            user_handle: credential.response.user_handle.as_deref().map(encode),
        },
    }
}
