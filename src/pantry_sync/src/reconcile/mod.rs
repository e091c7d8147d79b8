//! Inventory <-> shopping-list reconciliation.
//!
//! ## Forward sync (inventory -> inventory list)
//! [`sync_inventory_list`] diffs the caller's product set against the
//! persisted inventory-list membership and converges the list: products
//! needing shopping get exactly one live inventory-origin item; everything
//! else gets its item soft-removed. Writes go out as one batched update and
//! one batched create (two round-trips). Idempotent: re-running against
//! unchanged data is a no-op, so it is safe to call after every single
//! product write.
//!
//! ## Reverse merge (list completion -> inventory)
//! [`complete_list`] clears every item's checked state in one batch, then
//! flips the status of each product whose item was checked to `AlmostEmpty`
//! (a single purchase rarely fully restocks, so the product is re-flagged
//! for review rather than marked stocked). Product updates are attempted
//! independently; failures are collected in the report, never short-circuit.
//!
//! ## Consistency
//! No transaction spans the item store and the product store. The batches
//! themselves are single grouped requests but not application-level atomic;
//! two concurrent callers can race. Acceptable for a single household, and
//! deliberately not hardened against.

mod apply;
/// Membership diff computation and its pretty-printed form.
pub mod diff;
mod read;
mod want;

use std::fmt;

use chrono::{DateTime, Utc};

pub use diff::{ListDiff, MembershipUpdate};

use crate::models::{ListItem, ListItemPatch, Product, PurchaseStatus};
use crate::store::{ListItemStore, ListStore, ProductStore, StoreError, StoreResult};

/// Options for the forward sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and return the diff without writing anything.
    pub dry_run: bool,
}

/// Outcome of a forward sync.
#[derive(Debug)]
pub struct SyncReport {
    /// What changed (or, under `dry_run`, what would have).
    pub diff: ListDiff,
    /// The live (non-removed) items of the list after the sync.
    pub items: Vec<ListItem>,
}

/// Converges the inventory list to the given product set.
///
/// `products` is the caller's view of the user's products; it may be the
/// full set or a partial one (items whose product is absent are left
/// untouched). The diff is computed against persisted state, never against
/// an in-memory snapshot, and applying it twice in a row is a no-op.
pub fn sync_inventory_list(
    store: &mut impl ListItemStore,
    products: &[Product],
    list_id: &str,
    opt: SyncOptions,
    now: DateTime<Utc>,
) -> StoreResult<SyncReport> {
    let wanted = want::wanted_from_products(products);
    let current = read::read_current(store, list_id)?;
    let diff = diff::make_diff(&wanted, &current, list_id, now);

    tracing::debug!(
        %list_id,
        creates = diff.creates.len(),
        revives = diff.revives.len(),
        retires = diff.retires.len(),
        dry_run = opt.dry_run,
        "inventory list diff"
    );

    if !opt.dry_run && !diff.is_noop() {
        apply::apply_diff(store, &diff)?;
        tracing::info!(%list_id, "inventory list converged");
    }

    let items = store.items_by_list(list_id, false)?;
    Ok(SyncReport { diff, items })
}

/// One product status update that failed during completion.
#[derive(Debug)]
pub struct CompletionFailure {
    /// The product whose status update failed.
    pub product_id: String,
    /// What went wrong.
    pub error: StoreError,
}

/// Outcome of completing a shopping trip.
#[derive(Debug, Default)]
pub struct CompletionReport {
    /// How many items had their checked state cleared.
    pub unchecked: usize,
    /// Products flipped to `AlmostEmpty` because their item was checked.
    pub restocked: Vec<String>,
    /// Product updates that failed; the rest of the completion still ran.
    pub failures: Vec<CompletionFailure>,
}

impl fmt::Display for CompletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unchecked {} item(s), re-flagged {} product(s)",
            self.unchecked,
            self.restocked.len()
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} product update(s) failed:", self.failures.len())?;
            for failure in &self.failures {
                write!(f, " {}", failure.product_id)?;
            }
        }
        Ok(())
    }
}

/// Finishes a shopping trip for `list_id`.
///
/// Clears the `checked` flag of every checked item in a single batched
/// write (already-unchecked rows are skipped, keeping the batch minimal and
/// the call idempotent), then sets each previously-checked item's product to
/// [`PurchaseStatus::AlmostEmpty`],
/// attempting every product independently and collecting failures instead
/// of aborting. Finally stamps the list's `reset_at`; the reserved inventory
/// list has no row, so a not-found there is expected and ignored.
pub fn complete_list<S>(
    store: &mut S,
    list_id: &str,
    now: DateTime<Utc>,
) -> StoreResult<CompletionReport>
where
    S: ListItemStore + ProductStore + ListStore,
{
    let items = store.items_by_list(list_id, false)?;
    // Only rows whose checked flag actually changes go into the reset batch;
    // every live item still ends the trip unchecked, and re-running the
    // completion produces an empty batch.
    let checked: Vec<ListItem> = items.into_iter().filter(|i| i.checked).collect();

    let mut report = CompletionReport::default();

    let resets: Vec<(String, ListItemPatch)> = checked
        .iter()
        .map(|item| {
            (
                item.id.clone(),
                ListItemPatch {
                    checked: Some(false),
                    updated_at: Some(now),
                    ..Default::default()
                },
            )
        })
        .collect();
    if !resets.is_empty() {
        store.update_items(resets)?;
    }
    report.unchecked = checked.len();

    for item in &checked {
        let Some(product_id) = item.product_id.as_deref() else {
            continue; // manual items have no product to re-flag
        };
        match store.set_purchase_status(product_id, PurchaseStatus::AlmostEmpty) {
            Ok(()) => report.restocked.push(product_id.to_string()),
            Err(error) => {
                tracing::warn!(%product_id, %error, "product status update failed");
                report.failures.push(CompletionFailure {
                    product_id: product_id.to_string(),
                    error,
                });
            }
        }
    }

    match store.touch_reset(list_id, now) {
        Ok(()) => {}
        Err(StoreError::NotFound { .. }) => {
            tracing::debug!(%list_id, "no list row to stamp (reserved list)");
        }
        Err(e) => return Err(e),
    }

    tracing::info!(
        %list_id,
        unchecked = report.unchecked,
        restocked = report.restocked.len(),
        failed = report.failures.len(),
        "shopping trip completed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemOrigin, NewListItem, NewProduct, INVENTORY_LIST_ID};
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    fn seed_product(store: &mut MemoryStore, name: &str, status: PurchaseStatus) -> Product {
        store
            .create_product(NewProduct {
                name: name.to_string(),
                current_quantity: 0.0,
                needed_quantity: 2.0,
                status,
                category: None,
                recurrence: None,
                observation: None,
                unit: None,
                user_id: "u1".to_string(),
                created_at: ts(),
                updated_at: ts(),
            })
            .unwrap()
    }

    #[test]
    fn manual_items_survive_forward_sync() {
        let mut store = MemoryStore::new();
        store
            .create_item(NewListItem {
                list_id: INVENTORY_LIST_ID.to_string(),
                product_id: None,
                origin: ItemOrigin::Manual,
                name: "candles".to_string(),
                needed_quantity: 1.0,
                bought_quantity: 0.0,
                unit: None,
                category: None,
                observation: None,
                checked: false,
                is_removed: false,
                user_id: "u1".to_string(),
                created_at: ts(),
                updated_at: ts(),
            })
            .unwrap();

        let report = sync_inventory_list(
            &mut store,
            &[],
            INVENTORY_LIST_ID,
            SyncOptions::default(),
            ts(),
        )
        .unwrap();
        assert!(report.diff.is_noop());
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].name, "candles");
    }

    #[test]
    fn completion_tolerates_partial_product_failure() {
        let mut store = MemoryStore::new();
        let p1 = seed_product(&mut store, "rice", PurchaseStatus::NeedShopping);
        let p2 = seed_product(&mut store, "beans", PurchaseStatus::NeedShopping);

        let products = store.products_by_user("u1", false).unwrap();
        let report = sync_inventory_list(
            &mut store,
            &products,
            INVENTORY_LIST_ID,
            SyncOptions::default(),
            ts(),
        )
        .unwrap();
        assert_eq!(report.items.len(), 2);

        // Check both off, then poison one product update.
        let checks: Vec<_> = report
            .items
            .iter()
            .map(|i| {
                (
                    i.id.clone(),
                    ListItemPatch {
                        checked: Some(true),
                        ..Default::default()
                    },
                )
            })
            .collect();
        store.update_items(checks).unwrap();
        store.fail_status_update_for(&p1.id);

        let done = complete_list(&mut store, INVENTORY_LIST_ID, ts()).unwrap();
        assert_eq!(done.unchecked, 2);
        assert_eq!(done.restocked, vec![p2.id.clone()]);
        assert_eq!(done.failures.len(), 1);
        assert_eq!(done.failures[0].product_id, p1.id);

        // The reset still happened for every item, poisoned product or not.
        for item in store.items_by_list(INVENTORY_LIST_ID, false).unwrap() {
            assert!(!item.checked);
        }
        // The healthy product was re-flagged.
        let products = store.products_by_user("u1", false).unwrap();
        let beans = products.iter().find(|p| p.id == p2.id).unwrap();
        assert_eq!(beans.status, PurchaseStatus::AlmostEmpty);
    }
}
