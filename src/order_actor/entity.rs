use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use super::error::OrderError;
use super::gate::AdmittedDraft;
use crate::actor_framework::Entity;
use crate::domain::{lines_total, Order, OrderStatus, StallStatus, UpdatedBy};

/// Status change requested by the vendor dashboard.
#[derive(Debug, Clone)]
pub struct StatusPatch {
    pub status: OrderStatus,
    pub updated_by: UpdatedBy,
    /// Reject moves the status machine does not allow.
    pub enforce_transitions: bool,
}

impl Entity for Order {
    type Id = String;
    type Scope = String;
    type CreateParams = AdmittedDraft;
    type Patch = StatusPatch;
    type Action = ();
    type ActionResult = ();
    type Error = OrderError;

    const KIND: &'static str = "order";

    fn id(&self) -> &String {
        &self.id
    }

    /// Orders are partitioned by stall.
    fn scope(&self) -> &String {
        &self.stall_id
    }

    /// Creates a new Order from an admitted checkout draft.
    ///
    /// # Notes
    /// Payment is treated as confirmed at checkout, so orders start VERIFIED.
    /// `created_at` is the store's commit time, and a commit after the stall's
    /// window closed is refused. A missing customer reference is replaced by
    /// a random 12-digit one; a supplied one is kept as is.
    fn from_create_params(id: String, admitted: AdmittedDraft, now: DateTime<Utc>) -> Result<Self, OrderError> {
        let AdmittedDraft { draft, open_until } = admitted;
        if now > open_until {
            return Err(OrderError::StallUnavailable {
                stall_id: draft.stall_id,
                status: StallStatus::Suspended,
            });
        }
        if draft.stall_id.trim().is_empty() {
            return Err(OrderError::ValidationError("Stall id required".to_string()));
        }
        if draft.items.is_empty() {
            return Err(OrderError::ValidationError("Order has no items".to_string()));
        }
        for line in &draft.items {
            if line.quantity == 0 {
                return Err(OrderError::ValidationError(format!(
                    "Quantity must be at least 1 for {}",
                    line.menu_item_id
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(OrderError::ValidationError(format!(
                    "Negative price for {}",
                    line.menu_item_id
                )));
            }
        }

        let expected = lines_total(&draft.items);
        if draft.subtotal != expected {
            return Err(OrderError::ValidationError(format!(
                "Subtotal {} does not match items total {}",
                draft.subtotal, expected
            )));
        }

        let customer_reference = match draft.customer_reference {
            Some(reference) => reference,
            None => generate_reference(),
        };

        Ok(Self {
            id,
            stall_id: draft.stall_id,
            items: draft.items,
            subtotal: draft.subtotal,
            total_amount: draft.subtotal,
            status: OrderStatus::Verified,
            created_at: now,
            updated_at: now,
            updated_by: UpdatedBy::Customer,
            customer_reference,
        })
    }

    /// Applies a status change. Without `enforce_transitions` any status may
    /// be set, matching what the vendor dashboard is allowed to do.
    fn on_update(&mut self, patch: StatusPatch, now: DateTime<Utc>) -> Result<(), OrderError> {
        if patch.enforce_transitions && !self.status.can_transition_to(patch.status) {
            return Err(OrderError::IllegalTransition {
                from: self.status,
                to: patch.status,
            });
        }
        self.status = patch.status;
        self.updated_at = now;
        self.updated_by = patch.updated_by;
        Ok(())
    }

    fn on_delete(&self) -> Result<(), OrderError> {
        Err(OrderError::ValidationError("Orders are never deleted".to_string()))
    }

    fn handle_action(&mut self, _action: (), _now: DateTime<Utc>) -> Result<(), OrderError> {
        Err(OrderError::ValidationError("Orders have no custom actions".to_string()))
    }
}

fn generate_reference() -> String {
    rand::thread_rng()
        .gen_range(100_000_000_000u64..1_000_000_000_000u64)
        .to_string()
}
