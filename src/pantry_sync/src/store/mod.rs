//! Store adapter contracts.
//!
//! The reconciliation core never reaches into a global state container; it
//! is handed something implementing these traits and works through them.
//! Portable surface here, implementations in [`memory`] (tests/demos) and
//! [`sqlite`] (Diesel).
//!
//! Batch methods (`create_items`, `update_items`) are one grouped write
//! each. They are *not* atomic across the batch at the application level;
//! callers must not assume rollback-on-partial-failure.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::models::{
    List, ListItem, ListItemPatch, NewList, NewListItem, NewProduct, Product, PurchaseStatus,
};

/// Errors surfaced by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The targeted row does not exist. Propagated as-is to callers.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity, e.g. "product" or "list item".
        entity: &'static str,
        /// The id that failed to resolve.
        id: String,
    },
    /// Any other failure from the underlying driver.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result alias used across the store surface.
pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over persisted list items.
pub trait ListItemStore {
    /// All items of a list, ordered by id. `include_removed` controls
    /// whether soft-removed rows are returned.
    fn items_by_list(&mut self, list_id: &str, include_removed: bool)
    -> StoreResult<Vec<ListItem>>;

    /// All items back-referencing a product, across lists.
    fn items_by_product(
        &mut self,
        product_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<ListItem>>;

    /// Creates one item; the store assigns the id.
    fn create_item(&mut self, item: NewListItem) -> StoreResult<ListItem>;

    /// Applies a partial update to one item.
    fn update_item(&mut self, id: &str, patch: ListItemPatch) -> StoreResult<()>;

    /// Creates many items in one grouped write.
    fn create_items(&mut self, items: Vec<NewListItem>) -> StoreResult<()>;

    /// Applies many partial updates in one grouped write.
    fn update_items(&mut self, updates: Vec<(String, ListItemPatch)>) -> StoreResult<()>;

    /// Hard-deletes every item of a list, returning the count. This is the
    /// list-deletion path; membership churn uses soft-removal instead.
    fn purge_list_items(&mut self, list_id: &str) -> StoreResult<usize>;
}

/// CRUD over persisted products.
pub trait ProductStore {
    /// All products owned by a user. `include_removed` controls whether
    /// soft-removed rows are returned.
    fn products_by_user(&mut self, user_id: &str, include_removed: bool)
    -> StoreResult<Vec<Product>>;

    /// Creates one product; the store assigns the id.
    fn create_product(&mut self, product: NewProduct) -> StoreResult<Product>;

    /// Updates a product's persisted purchase status.
    fn set_purchase_status(&mut self, product_id: &str, status: PurchaseStatus) -> StoreResult<()>;

    /// Soft-deletes a product. The next forward sync retires its
    /// inventory-list membership.
    fn retire_product(&mut self, product_id: &str) -> StoreResult<()>;
}

/// CRUD over persisted lists.
///
/// The reserved inventory list is never a row here; lookups against its id
/// return [`StoreError::NotFound`].
pub trait ListStore {
    /// Fetches one list.
    fn get_list(&mut self, list_id: &str) -> StoreResult<List>;

    /// Creates one list; the store assigns the id.
    fn create_list(&mut self, list: NewList) -> StoreResult<List>;

    /// Stamps `reset_at` after a completed shopping trip.
    fn touch_reset(&mut self, list_id: &str, at: DateTime<Utc>) -> StoreResult<()>;

    /// Deletes a list and hard-deletes all of its items.
    fn delete_list(&mut self, list_id: &str) -> StoreResult<()>;
}
