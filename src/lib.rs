//! # Gallery Passkey Client
//!
//! Drives passkey (WebAuthn) registration and login against the self-hosted
//! media gallery: fetches ceremony options, runs them through the platform
//! credential API, and posts the results back for verification.
//!
//! ## Key Concepts
//! - **Ceremony**: begin → platform interaction → finish, for registration or login
//! - **Conditional UI**: passkey autofill that runs quietly in the background
//! - **Platform**: whatever provides `create`/`get` for public-key credentials,
//!   reached through [`platform::CredentialPlatform`]

pub mod api;
pub mod config;
pub mod error;
pub mod platform;
pub mod service;
pub mod webauthn;

pub use config::ClientConfig;
pub use error::{Ceremony, PasskeyError, PasskeyResult, PlatformError};
pub use platform::{CredentialPlatform, GetCredentialRequest, Mediation, PlatformEnvironment};
pub use service::{Capabilities, PasskeyService};
pub use webauthn::conditional::ConditionalPhase;
