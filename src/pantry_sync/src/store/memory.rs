//! In-memory store for tests and demos.
//!
//! Rows live in `BTreeMap`s keyed by a numeric id counter, so listings come
//! back in creation order. [`MemoryStore::fail_status_update_for`] injects a
//! failure into a specific product status update, which the completion tests
//! use to exercise partial-failure collection.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use crate::models::{
    List, ListItem, ListItemPatch, NewList, NewListItem, NewProduct, Product, PurchaseStatus,
};
use crate::store::{ListItemStore, ListStore, ProductStore, StoreError, StoreResult};

/// Trait-complete store backed by plain maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: BTreeMap<u64, Product>,
    lists: BTreeMap<u64, List>,
    items: BTreeMap<u64, ListItem>,
    next_id: u64,
    failing_products: BTreeSet<String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next status updates for `product_id` fail with a backend
    /// error. Test support for partial-completion semantics.
    pub fn fail_status_update_for(&mut self, product_id: &str) {
        self.failing_products.insert(product_id.to_string());
    }

    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn parse_id(entity: &'static str, id: &str) -> StoreResult<u64> {
    id.parse::<u64>().map_err(|_| StoreError::NotFound {
        entity,
        id: id.to_string(),
    })
}

fn apply_patch(item: &mut ListItem, patch: &ListItemPatch) {
    if let Some(name) = &patch.name {
        item.name = name.clone();
    }
    if let Some(category) = &patch.category {
        item.category = category.clone();
    }
    if let Some(unit) = &patch.unit {
        item.unit = unit.clone();
    }
    if let Some(needed) = patch.needed_quantity {
        item.needed_quantity = needed;
    }
    if let Some(checked) = patch.checked {
        item.checked = checked;
    }
    if let Some(removed) = patch.is_removed {
        item.is_removed = removed;
    }
    if let Some(at) = patch.updated_at {
        item.updated_at = at;
    }
}

impl ListItemStore for MemoryStore {
    fn items_by_list(
        &mut self,
        list_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<ListItem>> {
        Ok(self
            .items
            .values()
            .filter(|i| i.list_id == list_id && (include_removed || !i.is_removed))
            .cloned()
            .collect())
    }

    fn items_by_product(
        &mut self,
        product_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<ListItem>> {
        Ok(self
            .items
            .values()
            .filter(|i| {
                i.product_id.as_deref() == Some(product_id) && (include_removed || !i.is_removed)
            })
            .cloned()
            .collect())
    }

    fn create_item(&mut self, item: NewListItem) -> StoreResult<ListItem> {
        let id = self.assign_id();
        let row = ListItem {
            id: id.to_string(),
            list_id: item.list_id,
            product_id: item.product_id,
            origin: item.origin,
            name: item.name,
            needed_quantity: item.needed_quantity,
            bought_quantity: item.bought_quantity,
            unit: item.unit,
            category: item.category,
            observation: item.observation,
            checked: item.checked,
            is_removed: item.is_removed,
            user_id: item.user_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        };
        self.items.insert(id, row.clone());
        Ok(row)
    }

    fn update_item(&mut self, id: &str, patch: ListItemPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let key = parse_id("list item", id)?;
        let item = self.items.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            entity: "list item",
            id: id.to_string(),
        })?;
        apply_patch(item, &patch);
        Ok(())
    }

    fn create_items(&mut self, items: Vec<NewListItem>) -> StoreResult<()> {
        for item in items {
            self.create_item(item)?;
        }
        Ok(())
    }

    fn update_items(&mut self, updates: Vec<(String, ListItemPatch)>) -> StoreResult<()> {
        for (id, patch) in updates {
            self.update_item(&id, patch)?;
        }
        Ok(())
    }

    fn purge_list_items(&mut self, list_id: &str) -> StoreResult<usize> {
        let doomed: Vec<u64> = self
            .items
            .iter()
            .filter(|(_, i)| i.list_id == list_id)
            .map(|(k, _)| *k)
            .collect();
        for k in &doomed {
            self.items.remove(k);
        }
        Ok(doomed.len())
    }
}

impl ProductStore for MemoryStore {
    fn products_by_user(
        &mut self,
        user_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<Product>> {
        Ok(self
            .products
            .values()
            .filter(|p| p.user_id == user_id && (include_removed || !p.is_removed))
            .cloned()
            .collect())
    }

    fn create_product(&mut self, product: NewProduct) -> StoreResult<Product> {
        let id = self.assign_id();
        let row = Product {
            id: id.to_string(),
            name: product.name,
            current_quantity: product.current_quantity,
            needed_quantity: product.needed_quantity,
            status: product.status,
            category: product.category,
            recurrence: product.recurrence,
            observation: product.observation,
            unit: product.unit,
            is_removed: false,
            user_id: product.user_id,
            created_at: product.created_at,
            updated_at: product.updated_at,
        };
        self.products.insert(id, row.clone());
        Ok(row)
    }

    fn set_purchase_status(&mut self, product_id: &str, status: PurchaseStatus) -> StoreResult<()> {
        if self.failing_products.contains(product_id) {
            return Err(StoreError::Backend(anyhow!(
                "injected failure for product {product_id}"
            )));
        }
        let key = parse_id("product", product_id)?;
        let product = self
            .products
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;
        product.status = status;
        product.updated_at = Utc::now();
        Ok(())
    }

    fn retire_product(&mut self, product_id: &str) -> StoreResult<()> {
        let key = parse_id("product", product_id)?;
        let product = self
            .products
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;
        product.is_removed = true;
        product.updated_at = Utc::now();
        Ok(())
    }
}

impl ListStore for MemoryStore {
    fn get_list(&mut self, list_id: &str) -> StoreResult<List> {
        let key = parse_id("list", list_id)?;
        self.lists
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "list",
                id: list_id.to_string(),
            })
    }

    fn create_list(&mut self, list: NewList) -> StoreResult<List> {
        let id = self.assign_id();
        let row = List {
            id: id.to_string(),
            name: list.name,
            user_id: list.user_id,
            share_token: list.share_token,
            reset_at: None,
            created_at: list.created_at,
            updated_at: list.updated_at,
        };
        self.lists.insert(id, row.clone());
        Ok(row)
    }

    fn touch_reset(&mut self, list_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let key = parse_id("list", list_id)?;
        let list = self.lists.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            entity: "list",
            id: list_id.to_string(),
        })?;
        list.reset_at = Some(at);
        list.updated_at = at;
        Ok(())
    }

    fn delete_list(&mut self, list_id: &str) -> StoreResult<()> {
        let key = parse_id("list", list_id)?;
        if self.lists.remove(&key).is_none() {
            return Err(StoreError::NotFound {
                entity: "list",
                id: list_id.to_string(),
            });
        }
        self.purge_list_items(list_id)?;
        Ok(())
    }
}
