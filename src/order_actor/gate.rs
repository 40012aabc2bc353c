use chrono::{DateTime, Utc};

use super::error::OrderError;
use crate::domain::{OrderDraft, Stall, StallStatus};

/// Checkout admission rules, checked before anything is persisted.
pub struct AccessGate;

/// A draft that passed the gate. The order store refuses it if its commit
/// time is past `open_until`, so a window that lapses after the gate check
/// still blocks the insert.
#[derive(Debug, Clone)]
pub struct AdmittedDraft {
    pub draft: OrderDraft,
    pub open_until: DateTime<Utc>,
}

impl AccessGate {
    /// Admits `draft` if `stall` is ACTIVE at `now` and every line matches the
    /// menu, stamping it with the stall's current expiry.
    ///
    /// # Errors
    /// `StallUnavailable` when the stall is INACTIVE or SUSPENDED (checked first,
    /// so customers learn it before paying); `ValidationError` for lines that
    /// are not on the menu or are priced differently.
    pub fn admit(stall: &Stall, draft: OrderDraft, now: DateTime<Utc>) -> Result<AdmittedDraft, OrderError> {
        let status = stall.status_at(now);
        let open_until = match stall.expiry_time() {
            Some(expires_at) if status == StallStatus::Active => expires_at,
            _ => {
                return Err(OrderError::StallUnavailable {
                    stall_id: stall.id.clone(),
                    status,
                })
            }
        };

        for line in &draft.items {
            let Some(item) = stall.menu_item(&line.menu_item_id) else {
                return Err(OrderError::ValidationError(format!(
                    "{} is not on the menu of {}",
                    line.menu_item_id, stall.id
                )));
            };
            if item.price != line.unit_price {
                return Err(OrderError::ValidationError(format!(
                    "Price of {} changed: menu says {}, cart says {}",
                    item.id, item.price, line.unit_price
                )));
            }
        }
        Ok(AdmittedDraft { draft, open_until })
    }
}
