use indexmap::IndexMap;

use crate::models::{ItemOrigin, ListItem};
use crate::store::{ListItemStore, StoreResult};

/// Current inventory-origin membership of a list, keyed by product id.
///
/// Removed items are included: a removed row is how a membership stays
/// revivable without duplicating.
#[derive(Debug, Default)]
pub(crate) struct Current {
    pub(crate) by_product: IndexMap<String, ListItem>,
}

pub(crate) fn read_current(
    store: &mut impl ListItemStore,
    list_id: &str,
) -> StoreResult<Current> {
    let mut by_product: IndexMap<String, ListItem> = IndexMap::new();

    for item in store.items_by_list(list_id, true)? {
        if item.origin != ItemOrigin::Inventory {
            continue; // manual items are never reconciled
        }
        let Some(product_id) = item.product_id.clone() else {
            tracing::warn!(item_id = %item.id, "inventory item without product back-reference");
            continue;
        };
        match by_product.get(&product_id) {
            // Duplicates violate the membership invariant; prefer the live
            // row so the diff keeps operating on the one that matters.
            Some(existing) if existing.is_removed && !item.is_removed => {
                tracing::warn!(%product_id, "duplicate inventory items for product");
                by_product.insert(product_id, item);
            }
            Some(_) => {}
            None => {
                by_product.insert(product_id, item);
            }
        }
    }

    Ok(Current { by_product })
}
