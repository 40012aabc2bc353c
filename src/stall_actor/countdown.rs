use chrono::{DateTime, Duration, Utc};

use crate::domain::Stall;

/// Remaining access time as shown on the vendor dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessCountdown {
    /// `None` when the stall was never activated; zero once lapsed
    pub remaining: Option<Duration>,
    /// Remaining time relative to one base window, clamped to 0..=100
    pub percent: f64,
}

impl AccessCountdown {
    pub fn of(stall: &Stall, now: DateTime<Utc>, base_window: Duration) -> Self {
        let Some(expires_at) = stall.expiry_time() else {
            return Self {
                remaining: None,
                percent: 0.0,
            };
        };

        let remaining = (expires_at - now).max(Duration::zero());
        let percent = if base_window <= Duration::zero() {
            0.0
        } else {
            let ratio = remaining.num_milliseconds() as f64 / base_window.num_milliseconds() as f64;
            (ratio * 100.0).clamp(0.0, 100.0)
        };

        Self {
            remaining: Some(remaining),
            percent,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining, Some(r) if r <= Duration::zero())
    }

    /// `"2h 15m"`, `"Expired"`, or `"--:--"` when never activated.
    pub fn label(&self) -> String {
        match self.remaining {
            None => "--:--".to_string(),
            Some(_) if self.is_expired() => "Expired".to_string(),
            Some(r) => format!("{}h {}m", r.num_hours(), r.num_minutes() % 60),
        }
    }
}
