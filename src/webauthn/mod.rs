//! # WebAuthn Module
//!
//! Client side of the gallery's passkey ceremonies.
//!
//! ## Submodules
//! - `types`: wire and platform shapes
//! - `codec`: base64url conversions between the two
//! - `registration`: creating a new passkey
//! - `authentication`: modal passkey login
//! - `conditional`: background autofill login
//!
//! ### Registration (Creating a Passkey)
//! 1. Client requests registration → `registration::begin()`
//! 2. Platform creates the credential with an authenticator → `registration::create()`
//! 3. Client sends the credential back → `registration::finish()`
//!
//! ### Authentication (Logging In)
//! 1. Client requests a challenge → `authentication::begin()`
//! 2. Platform signs it (modal prompt, or autofill via `conditional`)
//! 3. Client sends the assertion back → `authentication::finish()`

pub mod authentication;
pub mod codec;
pub mod conditional;
pub mod registration;
pub mod types;
