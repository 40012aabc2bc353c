use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::actions::StallAction;
use super::error::StallError;
use crate::actor_framework::Entity;
use crate::domain::{AccessEntry, AccessKind, AccessWindow, Stall, StallRegistration};

impl Entity for Stall {
    type Id = String;
    type Scope = String;
    type CreateParams = StallRegistration;
    type Patch = ();
    type Action = StallAction;
    type ActionResult = Stall;
    type Error = StallError;

    const KIND: &'static str = "stall";

    fn id(&self) -> &String {
        &self.id
    }

    /// Each stall is its own scope.
    fn scope(&self) -> &String {
        &self.id
    }

    /// Onboards a stall. The menu is taken as supplied by the catalog.
    ///
    /// # Errors
    /// Blank id or name, negative or duplicated menu entries, or a carried-over
    /// window that ends before it starts.
    fn from_create_params(id: String, params: StallRegistration, _now: DateTime<Utc>) -> Result<Self, StallError> {
        if id.trim().is_empty() {
            return Err(StallError::ValidationError("Stall id required".to_string()));
        }
        if params.name.trim().is_empty() {
            return Err(StallError::ValidationError("Stall name required".to_string()));
        }

        let mut seen = HashSet::new();
        for item in &params.menu {
            if item.price < Decimal::ZERO {
                return Err(StallError::ValidationError(format!(
                    "Negative price for menu item {}",
                    item.id
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(StallError::ValidationError(format!("Duplicate menu item {}", item.id)));
            }
        }

        if let Some(window) = params.access {
            if window.expires_at < window.activated_at {
                return Err(StallError::ValidationError(
                    "Access window expires before activation".to_string(),
                ));
            }
        }

        Ok(Self {
            id,
            name: params.name,
            image: params.image,
            payment_handle: params.payment_handle,
            menu: params.menu,
            access: params.access,
            access_log: Vec::new(),
        })
    }

    fn on_update(&mut self, _patch: (), _now: DateTime<Utc>) -> Result<(), StallError> {
        Err(StallError::ValidationError(
            "Stall records change only through activation and top-up".to_string(),
        ))
    }

    /// Stalls are never deleted.
    fn on_delete(&self) -> Result<(), StallError> {
        Err(StallError::ValidationError("Stalls cannot be deleted".to_string()))
    }

    /// Handles access actions.
    ///
    /// - `Activate`: window becomes `[now, now + window]`; the old window is dropped.
    /// - `TopUp`: expiry becomes `max(now, expiry) + window`, so remaining time is
    ///   kept but lapsed time is not refunded. A stall that was never activated
    ///   gets a window starting now.
    ///
    /// An expiry past what `DateTime<Utc>` can hold is a `ValidationError`.
    fn handle_action(&mut self, action: StallAction, now: DateTime<Utc>) -> Result<Stall, StallError> {
        let (kind, proof_ref) = match action {
            StallAction::Activate { proof_ref, window } => {
                self.access = Some(AccessWindow {
                    activated_at: now,
                    expires_at: extend(now, window)?,
                });
                (AccessKind::Activation, proof_ref)
            }
            StallAction::TopUp { proof_ref, window } => {
                self.access = Some(match self.access {
                    Some(current) => AccessWindow {
                        activated_at: current.activated_at,
                        expires_at: extend(current.expires_at.max(now), window)?,
                    },
                    None => AccessWindow {
                        activated_at: now,
                        expires_at: extend(now, window)?,
                    },
                });
                (AccessKind::TopUp, proof_ref)
            }
        };

        self.access_log.push(AccessEntry { kind, proof_ref, at: now });
        Ok(self.clone())
    }
}

fn extend(from: DateTime<Utc>, window: Duration) -> Result<DateTime<Utc>, StallError> {
    if window <= Duration::zero() {
        return Err(StallError::ValidationError(format!("Access window must be positive, got {}", window)));
    }
    from.checked_add_signed(window)
        .ok_or_else(|| StallError::ValidationError(format!("Access window {} runs past the end of time", window)))
}
