use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{Filter, ResourceClient};
use crate::clock::{Clock, SharedClock};
use crate::config::AppConfig;
use crate::domain::{Stall, StallRegistration, StallStatus};
use crate::stall_actor::{AccessCountdown, StallAction, StallError};

/// Window lengths applied by activation and top-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessPolicy {
    pub base_window: Duration,
    pub topup_window: Duration,
}

impl From<&AppConfig> for AccessPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_window: config.base_window,
            topup_window: config.topup_window,
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Client for the stall access ledger.
///
/// Status is always computed against the ledger's clock, never a caller's.
#[derive(Clone)]
pub struct StallClient {
    inner: ResourceClient<Stall>,
    clock: SharedClock,
    policy: AccessPolicy,
}

impl_client_methods!(StallClient, Stall, StallError, stall);

impl StallClient {
    pub fn new(inner: ResourceClient<Stall>, clock: SharedClock, policy: AccessPolicy) -> Self {
        Self { inner, clock, policy }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[instrument(skip(self, registration), fields(stall_id = %registration.id))]
    pub async fn register_stall(&self, registration: StallRegistration) -> Result<Stall, StallError> {
        debug!("Sending request");
        let stall = self.inner.create(registration).await?;
        info!(status = %self.status(&stall), "Stall registered");
        Ok(stall)
    }

    #[instrument(skip(self))]
    pub async fn list_stalls(&self) -> Result<Vec<Stall>, StallError> {
        debug!("Sending request");
        let mut stalls = self.inner.list(Filter::All).await?;
        stalls.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(stalls)
    }

    /// Status of `stall` right now.
    pub fn status(&self, stall: &Stall) -> StallStatus {
        stall.status_at(self.now())
    }

    pub fn countdown(&self, stall: &Stall) -> AccessCountdown {
        AccessCountdown::of(stall, self.now(), self.policy.base_window)
    }

    #[instrument(skip(self))]
    pub async fn status_of(&self, id: String) -> Result<StallStatus, StallError> {
        let stall = self.require_stall(id).await?;
        Ok(self.status(&stall))
    }

    /// Starts a fresh base window from now. Any previous window is discarded.
    #[instrument(skip(self, proof_ref))]
    pub async fn activate(&self, id: String, proof_ref: String) -> Result<Stall, StallError> {
        let proof_ref = require_proof(proof_ref)?;
        let action = StallAction::Activate {
            proof_ref,
            window: self.policy.base_window,
        };
        let stall = self.inner.perform_action(id, action).await?;
        info!(expires_at = ?stall.expiry_time(), "Stall activated");
        Ok(stall)
    }

    /// Extends access by one top-up window without losing remaining time.
    #[instrument(skip(self, proof_ref))]
    pub async fn top_up(&self, id: String, proof_ref: String) -> Result<Stall, StallError> {
        let proof_ref = require_proof(proof_ref)?;
        let action = StallAction::TopUp {
            proof_ref,
            window: self.policy.topup_window,
        };
        let stall = self.inner.perform_action(id, action).await?;
        info!(expires_at = ?stall.expiry_time(), "Stall topped up");
        Ok(stall)
    }
}

/// Rejects a blank reference. Anything else is recorded exactly as supplied.
fn require_proof(proof_ref: String) -> Result<String, StallError> {
    if proof_ref.trim().is_empty() {
        warn!("Missing payment reference");
        return Err(StallError::ValidationError("Payment reference required".to_string()));
    }
    Ok(proof_ref)
}
