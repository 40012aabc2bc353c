use crate::domain::OrderStatus;

impl OrderStatus {
    /// Whether the status machine allows moving to `next`.
    ///
    /// PENDING -> VERIFIED -> COMPLETED, and CANCELLED from PENDING or VERIFIED.
    /// Re-applying the current status is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Verified) | (Verified, Completed) | (Pending, Cancelled) | (Verified, Cancelled)
        )
    }

    /// No further transitions leave this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}
