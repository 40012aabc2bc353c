use chrono::Duration;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::clients::StallClient;
use crate::domain::{AccessWindow, MenuItem, StallRegistration};
use crate::stall_actor::StallError;

/// Demo stalls: one open with an hour left, one never activated.
pub fn demo_stalls(now: chrono::DateTime<chrono::Utc>) -> Vec<StallRegistration> {
    vec![
        StallRegistration::new(
            "chaat-101",
            "Royal Chaat",
            vec![
                MenuItem::new("m1", "Pani Puri", Decimal::from(40), true),
                MenuItem::new("m2", "Aloo Tikki", Decimal::from(60), true),
                MenuItem::new("m3", "Masala Chai", Decimal::from(20), true),
            ],
        )
        .with_image("/images/stalls/royal-chaat.jpg")
        .with_payment_handle("royalchaat@upi")
        .with_access(AccessWindow {
            activated_at: now - Duration::hours(2),
            expires_at: now + Duration::hours(1),
        }),
        StallRegistration::new(
            "burger-202",
            "Burger & Bytes",
            vec![
                MenuItem::new("b1", "Veggie Supreme", Decimal::from(90), true),
                MenuItem::new("b2", "Chicken Crispy", Decimal::from(120), false),
            ],
        )
        .with_image("/images/stalls/burger-bytes.jpg")
        .with_payment_handle("burgerbytes@upi"),
    ]
}

#[instrument(skip(stalls))]
pub async fn seed_demo_stalls(stalls: &StallClient) -> Result<usize, StallError> {
    let registrations = demo_stalls(stalls.now());
    let count = registrations.len();
    for registration in registrations {
        stalls.register_stall(registration).await?;
    }
    info!(count, "Demo stalls registered");
    Ok(count)
}
