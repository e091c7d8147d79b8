//! Domain types for products, lists, and list items.
//!
//! These are the in-memory shapes the reconciliation core works with. Store
//! implementations map them to and from their own row formats; see
//! [`crate::store::sqlite`] for the Diesel mapping.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceSchedule;

/// Reserved id of the auto-managed inventory list.
///
/// The inventory list is a well-known singleton: it is never a row in the
/// list store and cannot be created or deleted by a user. Its membership is
/// maintained exclusively by [`crate::reconcile::sync_inventory_list`].
pub const INVENTORY_LIST_ID: &str = "inventory";

/// Purchase status of a product, stored as an integer code.
///
/// This persisted field is the single source of truth for reconciliation.
/// The quantity-derived classifier in [`crate::status`] is display-only and
/// must never feed back into sync decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PurchaseStatus {
    /// Out of stock; the product belongs on the inventory list.
    NeedShopping = 1,
    /// Running low; flagged for review, not on the inventory list.
    AlmostEmpty = 2,
    /// Stocked; nothing to buy.
    InStock = 3,
}

/// A purchase status code that does not map to any [`PurchaseStatus`] variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown purchase status code: {0}")]
pub struct UnknownStatusCode(pub i32);

impl TryFrom<i32> for PurchaseStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PurchaseStatus::NeedShopping),
            2 => Ok(PurchaseStatus::AlmostEmpty),
            3 => Ok(PurchaseStatus::InStock),
            other => Err(UnknownStatusCode(other)),
        }
    }
}

impl From<PurchaseStatus> for i32 {
    fn from(s: PurchaseStatus) -> i32 {
        s as i32
    }
}

/// An inventory entry owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Opaque store-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Quantity currently on hand (>= 0).
    pub current_quantity: f64,
    /// Quantity considered "enough" (>= 0).
    pub needed_quantity: f64,
    /// Persisted purchase status; canonical input to reconciliation.
    pub status: PurchaseStatus,
    /// Category id reference. May be orphaned, in which case the raw value
    /// doubles as the display fallback.
    pub category: Option<String>,
    /// Optional repurchase schedule. Independent of `status`.
    pub recurrence: Option<RecurrenceSchedule>,
    /// Free-form note.
    pub observation: Option<String>,
    /// Measurement unit (e.g., "kg", "un").
    pub unit: Option<String>,
    /// Soft-delete flag. Removed products are excluded from default listings
    /// and retire their inventory-list membership on the next sync.
    pub is_removed: bool,
    /// Owning user id.
    pub user_id: String,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// Insertable form of [`Product`]; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Quantity currently on hand (>= 0).
    pub current_quantity: f64,
    /// Quantity considered "enough" (>= 0).
    pub needed_quantity: f64,
    /// Initial purchase status.
    pub status: PurchaseStatus,
    /// Category id reference.
    pub category: Option<String>,
    /// Optional repurchase schedule.
    pub recurrence: Option<RecurrenceSchedule>,
    /// Free-form note.
    pub observation: Option<String>,
    /// Measurement unit.
    pub unit: Option<String>,
    /// Owning user id.
    pub user_id: String,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// A named shopping list owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    /// Opaque store-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning user id.
    pub user_id: String,
    /// Opaque token enabling unauthenticated read/check-off access.
    pub share_token: Option<String>,
    /// When the list was last reset by a completed shopping trip.
    pub reset_at: Option<DateTime<Utc>>,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// Insertable form of [`List`]; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewList {
    /// Display name.
    pub name: String,
    /// Owning user id.
    pub user_id: String,
    /// Opaque share token, if the list is shared.
    pub share_token: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// How a list item came to exist. Controls whether reconciliation may mutate
/// or retire the item automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOrigin {
    /// Derived from a product by the inventory sync; carries a product
    /// back-reference and is managed by reconciliation.
    Inventory,
    /// Created ad hoc by the user; reconciliation never touches it.
    Manual,
}

impl ItemOrigin {
    /// Stable string form used by stores ("inventory" / "manual").
    pub fn as_str(self) -> &'static str {
        match self {
            ItemOrigin::Inventory => "inventory",
            ItemOrigin::Manual => "manual",
        }
    }
}

/// An origin tag that is neither "inventory" nor "manual".
#[derive(Debug, thiserror::Error)]
#[error("unknown item origin: {0}")]
pub struct UnknownOrigin(pub String);

impl FromStr for ItemOrigin {
    type Err = UnknownOrigin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(ItemOrigin::Inventory),
            "manual" => Ok(ItemOrigin::Manual),
            other => Err(UnknownOrigin(other.to_string())),
        }
    }
}

impl fmt::Display for ItemOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row inside a shopping list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    /// Opaque store-assigned identifier.
    pub id: String,
    /// Owning list id.
    pub list_id: String,
    /// Back-reference to a product. `Some` iff `origin` is
    /// [`ItemOrigin::Inventory`].
    pub product_id: Option<String>,
    /// Whether the item is inventory-derived or user-created.
    pub origin: ItemOrigin,
    /// Display name, refreshed from the product on revival.
    pub name: String,
    /// Quantity to buy.
    pub needed_quantity: f64,
    /// Quantity bought so far during the current trip.
    pub bought_quantity: f64,
    /// Measurement unit.
    pub unit: Option<String>,
    /// Category id reference (display fallback when orphaned).
    pub category: Option<String>,
    /// Free-form note.
    pub observation: Option<String>,
    /// Checked off by the user during the current trip.
    pub checked: bool,
    /// Soft-delete flag. For inventory-origin items this is the membership
    /// flag, not a deletion; items are only hard-deleted when their owning
    /// list is purged.
    pub is_removed: bool,
    /// Owning user id.
    pub user_id: String,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// Insertable form of [`ListItem`]; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListItem {
    /// Owning list id.
    pub list_id: String,
    /// Back-reference to a product, for inventory-origin items.
    pub product_id: Option<String>,
    /// Whether the item is inventory-derived or user-created.
    pub origin: ItemOrigin,
    /// Display name.
    pub name: String,
    /// Quantity to buy.
    pub needed_quantity: f64,
    /// Quantity bought so far.
    pub bought_quantity: f64,
    /// Measurement unit.
    pub unit: Option<String>,
    /// Category id reference.
    pub category: Option<String>,
    /// Free-form note.
    pub observation: Option<String>,
    /// Checked off by the user.
    pub checked: bool,
    /// Soft-delete flag.
    pub is_removed: bool,
    /// Owning user id.
    pub user_id: String,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (UTC).
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a [`ListItem`]. `None` fields are left untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItemPatch {
    /// New display name.
    pub name: Option<String>,
    /// New category (outer `Some(None)` clears it).
    pub category: Option<Option<String>>,
    /// New unit (outer `Some(None)` clears it).
    pub unit: Option<Option<String>>,
    /// New needed quantity.
    pub needed_quantity: Option<f64>,
    /// New checked state.
    pub checked: Option<bool>,
    /// New soft-delete state.
    pub is_removed: Option<bool>,
    /// New update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListItemPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == ListItemPatch::default()
    }
}
