//! Pantry inventory domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use mealmind_core::{PantryItemId, UserId};

/// An item in the user's pantry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PantryItem {
    pub id: PantryItemId,
    pub user_id: UserId,
    pub name: String,
    pub quantity: i32,
    pub unit: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Input for adding a pantry item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPantryItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl NewPantryItem {
    /// Default quantity when none (or a non-positive one) is given.
    pub const DEFAULT_QUANTITY: i32 = 1;

    /// Trim fields and apply defaults.
    ///
    /// Returns `None` when the name is blank.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_owned(),
            quantity: Some(
                self.quantity
                    .filter(|q| *q >= 1)
                    .unwrap_or(Self::DEFAULT_QUANTITY),
            ),
            unit: self
                .unit
                .map(|u| u.trim().to_owned())
                .filter(|u| !u.is_empty()),
            expiry_date: self.expiry_date,
        })
    }

    /// Quantity after normalization.
    #[must_use]
    pub fn quantity_or_default(&self) -> i32 {
        self.quantity.unwrap_or(Self::DEFAULT_QUANTITY)
    }
}
