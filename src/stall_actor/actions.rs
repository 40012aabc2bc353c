use chrono::Duration;

/// Custom actions for Stall entities.
///
/// Both carry the proof-of-payment reference, which is recorded but not verified.
#[derive(Debug, Clone)]
pub enum StallAction {
    /// Opens a fresh window of `window` starting now, discarding any previous one.
    Activate { proof_ref: String, window: Duration },
    /// Adds `window` to the later of now and the current expiry.
    TopUp { proof_ref: String, window: Duration },
}
