//! # Conditional UI (Passkey Autofill)
//!
//! A background authentication ceremony that lets the platform offer passkeys
//! inside the username field until the user picks one. It is best-effort:
//! unsupported, unavailable and cancelled all resolve to `Ok(None)`.
//!
//! ## Phases
//! `Idle → CheckingAvailability → AwaitingSelection → Verifying → Resolved`,
//! with `Aborted` reachable from any live phase and `Idle` again whenever an
//! attempt ends without a login.
//!
//! ## One live attempt
//! The controller owns a single slot. Starting a new attempt cancels the token
//! of the one in the slot before anything else happens. An attempt that lost
//! the slot never reaches the platform or the finish endpoint, and cannot
//! clear its successor. Dropping a running `start` future cancels its attempt.

use crate::api::GalleryApi;
use crate::error::{classify, Ceremony, PasskeyError, PasskeyResult, PlatformFailure};
use crate::platform::{CredentialPlatform, GetCredentialRequest};
use crate::webauthn::authentication;
use crate::webauthn::types::LoginOutcome;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionalPhase {
    #[default]
    Idle,
    CheckingAvailability,
    AwaitingSelection,
    Verifying,
    Resolved,
    Aborted,
}

#[derive(Debug)]
struct LiveAttempt {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct Slot {
    next_id: u64,
    live: Option<LiveAttempt>,
    phase: ConditionalPhase,
}

/// Handle held by a running attempt
#[derive(Debug, Clone)]
struct Attempt {
    id: u64,
    token: CancellationToken,
}

/// An attempt's hold on the slot. Dropping it unsettled (the `start` future
/// was dropped mid-flight) cancels the attempt and frees the slot.
struct Claim<'a> {
    controller: &'a ConditionalUi,
    attempt: Attempt,
    settled: bool,
}

impl Claim<'_> {
    fn settle(mut self, phase: ConditionalPhase) {
        self.settled = true;
        self.controller.settle(&self.attempt, phase);
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.attempt.token.cancel();
            self.controller.settle(&self.attempt, ConditionalPhase::Aborted);
            debug!(attempt = self.attempt.id, "conditional ceremony dropped");
        }
    }
}

#[derive(Debug, Default)]
pub struct ConditionalUi {
    supported: bool,
    slot: Mutex<Slot>,
}

impl ConditionalUi {
    /// `supported` is the cached environment check; when false every start
    /// resolves to `None` without side effects.
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn phase(&self) -> ConditionalPhase {
        self.slot.lock().phase
    }

    pub fn is_live(&self) -> bool {
        self.slot.lock().live.is_some()
    }

    /// Cancel the live attempt, if any. Idempotent.
    pub fn abort(&self) {
        let mut slot = self.slot.lock();
        if let Some(live) = slot.live.take() {
            live.token.cancel();
            slot.phase = ConditionalPhase::Aborted;
            debug!(attempt = live.id, "conditional ceremony aborted");
        }
    }

    /// Cancel whatever is live and claim the slot for a new attempt
    fn replace(&self) -> Claim<'_> {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.live.take() {
            previous.token.cancel();
            debug!(attempt = previous.id, "conditional ceremony superseded");
        }

        slot.next_id += 1;
        let attempt = Attempt {
            id: slot.next_id,
            token: CancellationToken::new(),
        };
        slot.live = Some(LiveAttempt {
            id: attempt.id,
            token: attempt.token.clone(),
        });
        slot.phase = ConditionalPhase::CheckingAvailability;
        Claim {
            controller: self,
            attempt,
            settled: false,
        }
    }

    /// Move a still-live attempt to `phase`; false if it lost the slot
    fn advance(&self, attempt: &Attempt, phase: ConditionalPhase) -> bool {
        let mut slot = self.slot.lock();
        let owned = matches!(&slot.live, Some(live) if live.id == attempt.id);
        if owned {
            slot.phase = phase;
        }
        owned
    }

    fn settle(&self, attempt: &Attempt, phase: ConditionalPhase) {
        let mut slot = self.slot.lock();
        if matches!(&slot.live, Some(live) if live.id == attempt.id) {
            slot.live = None;
            slot.phase = phase;
        }
    }

    /// Run one conditional attempt to completion.
    ///
    /// Returns the login outcome if the user picked a passkey, `None` for
    /// every best-effort exit, and an error only for server failures after
    /// begin and for unknown platform exceptions.
    #[instrument(skip_all)]
    pub async fn start(
        &self,
        api: &GalleryApi,
        platform: &dyn CredentialPlatform,
    ) -> PasskeyResult<Option<LoginOutcome>> {
        if !self.supported {
            debug!("conditional mediation unsupported");
            return Ok(None);
        }

        let claim = self.replace();
        let result = self.run(&claim.attempt, api, platform).await;

        let phase = match &result {
            Ok(Some(_)) => ConditionalPhase::Resolved,
            Ok(None) if claim.attempt.token.is_cancelled() => ConditionalPhase::Aborted,
            _ => ConditionalPhase::Idle,
        };
        claim.settle(phase);

        result
    }

    async fn run(
        &self,
        attempt: &Attempt,
        api: &GalleryApi,
        platform: &dyn CredentialPlatform,
    ) -> PasskeyResult<Option<LoginOutcome>> {
        match platform.is_conditional_mediation_available().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("platform reports conditional mediation unavailable");
                return Ok(None);
            }
            Err(error) => {
                debug!(%error, "conditional mediation probe failed");
                return Ok(None);
            }
        }

        match api.availability().await {
            Ok(availability) if availability.available => {}
            Ok(_) => {
                debug!("passkey login disabled on this gallery");
                return Ok(None);
            }
            Err(error) => {
                warn!(%error, "passkey availability check failed");
                return Ok(None);
            }
        }

        let pending = match authentication::begin(api).await {
            Ok(pending) => pending,
            Err(PasskeyError::NoPasskeysRegistered) => return Ok(None),
            Err(error) => return Err(error),
        };

        if !self.advance(attempt, ConditionalPhase::AwaitingSelection) {
            debug!(attempt = attempt.id, "attempt lost its slot before the platform call");
            return Ok(None);
        }

        let request = GetCredentialRequest::conditional(
            pending.assertion_options()?,
            attempt.token.clone(),
        );
        let credential = match platform.get_credential(request).await {
            Ok(credential) => credential,
            Err(error) => {
                return match classify(Ceremony::Authentication, error) {
                    PlatformFailure::Aborted | PlatformFailure::Cancelled => {
                        debug!(
                            attempt = attempt.id,
                            "conditional ceremony ended without a selection"
                        );
                        Ok(None)
                    }
                    failure => Err(failure.into_error(Ceremony::Authentication)),
                };
            }
        };

        // A credential that arrives after the signal fired belongs to a dead attempt
        if attempt.token.is_cancelled() || !self.advance(attempt, ConditionalPhase::Verifying) {
            debug!(attempt = attempt.id, "credential returned after the attempt was cancelled");
            return Ok(None);
        }
        let outcome = authentication::finish(api, pending, &credential).await?;

        info!(username = %outcome.username, "passkey autofill login");
        Ok(Some(outcome))
    }
}
