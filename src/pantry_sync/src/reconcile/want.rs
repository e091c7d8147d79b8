use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::models::{Product, PurchaseStatus};

/// One desired inventory-list membership, snapshotted from its product.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WantedItem {
    pub(crate) name: String,
    pub(crate) category: Option<String>,
    pub(crate) unit: Option<String>,
    pub(crate) needed_quantity: f64,
    pub(crate) user_id: String,
}

/// Desired membership derived from the caller's product slice.
///
/// `needed` preserves product order so create batches are deterministic.
/// `known` holds every product id present in the slice; items whose product
/// is absent from it are left untouched (the caller may legitimately pass a
/// partial set, e.g. just the one product that changed).
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Wanted {
    pub(crate) needed: IndexMap<String, WantedItem>,
    pub(crate) known: BTreeSet<String>,
}

pub(crate) fn wanted_from_products(products: &[Product]) -> Wanted {
    let mut needed = IndexMap::new();
    let mut known = BTreeSet::new();

    for p in products {
        known.insert(p.id.clone());
        // Soft-deleted products are known-but-never-needed: their membership
        // gets retired like any product that stopped needing shopping.
        if p.is_removed || p.status != PurchaseStatus::NeedShopping {
            continue;
        }
        needed.insert(
            p.id.clone(),
            WantedItem {
                name: p.name.clone(),
                category: p.category.clone(),
                unit: p.unit.clone(),
                needed_quantity: p.needed_quantity,
                user_id: p.user_id.clone(),
            },
        );
    }

    Wanted { needed, known }
}
