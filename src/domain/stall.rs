use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An item on a stall's menu, supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub is_veg: bool,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, is_veg: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            is_veg,
        }
    }
}

/// Derived access state of a stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StallStatus {
    /// Never activated
    Inactive,
    /// Inside the paid window
    Active,
    /// Window lapsed, needs a top-up
    Suspended,
}

impl std::fmt::Display for StallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StallStatus::Inactive => "INACTIVE",
            StallStatus::Active => "ACTIVE",
            StallStatus::Suspended => "SUSPENDED",
        };
        f.write_str(s)
    }
}

/// Paid access window. Activation and expiry only exist together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessWindow {
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Activation,
    TopUp,
}

/// Record of a payment proof submitted for access. Stored verbatim, never verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub kind: AccessKind,
    pub proof_ref: String,
    pub at: DateTime<Utc>,
}

/// A vendor's storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stall {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Where customers send payment (e.g. a UPI handle)
    pub payment_handle: String,
    pub menu: Vec<MenuItem>,
    pub access: Option<AccessWindow>,
    pub access_log: Vec<AccessEntry>,
}

impl Stall {
    pub fn activation_time(&self) -> Option<DateTime<Utc>> {
        self.access.map(|w| w.activated_at)
    }

    pub fn expiry_time(&self) -> Option<DateTime<Utc>> {
        self.access.map(|w| w.expires_at)
    }

    /// Access state at `now`. Pure: depends only on `now` and the stored window.
    pub fn status_at(&self, now: DateTime<Utc>) -> StallStatus {
        match self.access {
            None => StallStatus::Inactive,
            Some(window) if now > window.expires_at => StallStatus::Suspended,
            Some(_) => StallStatus::Active,
        }
    }

    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu.iter().find(|item| item.id == id)
    }
}

/// Payload for onboarding a stall.
#[derive(Debug, Clone)]
pub struct StallRegistration {
    pub id: String,
    pub name: String,
    pub image: String,
    pub payment_handle: String,
    pub menu: Vec<MenuItem>,
    /// Window carried over from an existing record; `None` registers the stall INACTIVE.
    pub access: Option<AccessWindow>,
}

impl StallRegistration {
    pub fn new(id: impl Into<String>, name: impl Into<String>, menu: Vec<MenuItem>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            payment_handle: String::new(),
            menu,
            access: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_payment_handle(mut self, handle: impl Into<String>) -> Self {
        self.payment_handle = handle.into();
        self
    }

    pub fn with_access(mut self, window: AccessWindow) -> Self {
        self.access = Some(window);
        self
    }
}
