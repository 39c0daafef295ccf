//! # WebAuthn Wire Types
//!
//! Request/response bodies exchanged with the gallery's passkey endpoints, and
//! the binary mirrors handed to the platform credential API.
//!
//! ## Two shapes per structure
//! The server speaks JSON, so every binary value (challenge, user id, credential
//! ids, authenticator output) travels as base64url text. The platform works on
//! raw bytes. Each `...Json` type below has a binary twin, and
//! [`codec`](super::codec) converts between them.
//!
//! Optional lists stay `Option<Vec<_>>` all the way through: an absent
//! `excludeCredentials` means "no restriction", which is not the same thing as
//! an explicit empty list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server-issued correlation token for one ceremony attempt.
///
/// Opaque: it is only ever echoed back on the matching finish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body of a begin response: `{ "sessionId": ..., "options": ... }`
///
/// `options` may be the bare options object or wrapped as
/// `{ "publicKey": { ... } }`; both are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct BeginResponse<T> {
    pub session_id: SessionId,
    #[serde(deserialize_with = "unwrap_public_key")]
    pub options: T,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionsEnvelope<T> {
    Wrapped {
        #[serde(rename = "publicKey")]
        public_key: T,
    },
    Bare(T),
}

fn unwrap_public_key<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OptionsEnvelope::deserialize(deserializer)? {
        OptionsEnvelope::Wrapped { public_key } => public_key,
        OptionsEnvelope::Bare(options) => options,
    })
}

// Option building blocks

/// Relying party descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// User descriptor as sent by the server; `id` is base64url text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntityJson {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

/// User descriptor handed to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

/// One acceptable credential algorithm, e.g. `{ "type": "public-key", "alg": -7 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub alg: i64,
}

/// Entry of an exclusion or allow list, id as base64url text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDescriptorJson {
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// Entry of an exclusion or allow list, id as raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescriptor {
    pub id: Vec<u8>,
    pub credential_type: String,
    pub transports: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_resident_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_verification: Option<String>,
}

// Registration options

/// Credential creation options as received from register/begin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptionsJson {
    pub challenge: String,
    pub rp: RelyingParty,
    pub user: UserEntityJson,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_credentials: Option<Vec<CredentialDescriptorJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Credential creation options in platform form.
///
/// `timeout` is advisory and enforced by the platform, never by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationOptions {
    pub challenge: Vec<u8>,
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    pub timeout: Option<u64>,
    pub exclude_credentials: Option<Vec<CredentialDescriptor>>,
    pub authenticator_selection: Option<AuthenticatorSelection>,
    pub attestation: Option<String>,
    pub extensions: Option<Value>,
}

// Authentication options

/// Credential request options as received from login/begin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptionsJson {
    pub challenge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<Vec<CredentialDescriptorJson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_verification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Credential request options in platform form
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionOptions {
    pub challenge: Vec<u8>,
    pub timeout: Option<u64>,
    pub rp_id: Option<String>,
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,
    pub user_verification: Option<String>,
    pub extensions: Option<Value>,
}

// Platform credentials

/// Credential produced by the platform's create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub credential_type: String,
    pub authenticator_attachment: Option<String>,
    pub response: AttestationResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResponse {
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
    /// `None` when the platform offers no way to query transports
    pub transports: Option<Vec<String>>,
}

/// Credential produced by the platform's get call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub credential_type: String,
    pub response: AssertionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResponse {
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

// Serialized credentials (wire form of the above)

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedCreationCredential {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: SerializedAttestationResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAssertionCredential {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub response: SerializedAssertionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

// Request bodies

#[derive(Debug, Serialize)]
pub struct RegisterBeginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFinishRequest<'a> {
    pub session_id: &'a SessionId,
    pub credential: &'a SerializedCreationCredential,
    pub label: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFinishRequest<'a> {
    pub session_id: &'a SessionId,
    pub credential: &'a SerializedAssertionCredential,
}

#[derive(Debug, Serialize)]
pub struct DeletePasskeyRequest<'a> {
    pub id: &'a str,
}

// Outcomes

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub success: bool,
    pub credential_id: String,
}

/// Result of a successful login, modal or conditional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub success: bool,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    /// Echo of what the server removed; its shape is server-defined
    #[serde(default)]
    pub deleted: Value,
}

/// Does this deployment have passkey login enabled at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default)]
    pub available: bool,
}

/// A registered passkey, as listed by the server.
///
/// Timestamps stay as the server sent them (RFC 3339 text); the `_utc`
/// accessors parse them on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passkey {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default, alias = "last_used_at")]
    pub last_used_at: Option<String>,
}

impl Passkey {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref())
    }

    pub fn last_used_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.last_used_at.as_deref())
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Body of the passkey listing; a missing or null `passkeys` key means none
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasskeyList {
    #[serde(default)]
    pub passkeys: Option<Vec<Passkey>>,
}

impl PasskeyList {
    pub fn into_passkeys(self) -> Vec<Passkey> {
        self.passkeys.unwrap_or_default()
    }
}
