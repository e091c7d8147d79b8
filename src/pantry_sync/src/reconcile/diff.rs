use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::{ItemOrigin, ListItemPatch, NewListItem};
use crate::reconcile::{read::Current, want::Wanted};

/// A pending update to one existing membership row.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipUpdate {
    /// Id of the list item to update.
    pub item_id: String,
    /// The product the item mirrors.
    pub product_id: String,
    /// Display name, for diff output.
    pub name: String,
    /// The partial update to apply.
    pub patch: ListItemPatch,
}

/// What has to change to make the inventory list match product state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDiff {
    /// Memberships to create (product needs shopping, no row exists).
    pub creates: Vec<NewListItem>,
    /// Removed rows to bring back (product needs shopping again).
    pub revives: Vec<MembershipUpdate>,
    /// Live rows to soft-remove (product no longer needs shopping).
    pub retires: Vec<MembershipUpdate>,
}

impl ListDiff {
    /// True if there is nothing to create, revive, or retire.
    pub fn is_noop(&self) -> bool {
        self.creates.is_empty() && self.revives.is_empty() && self.retires.is_empty()
    }
}

impl fmt::Display for ListDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        let mut section = |title: &str,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            for _ in 0..title.len() {
                write!(f, "-")?;
            }
            writeln!(f)?;
            body(f)?;
            wrote_any = true;
            Ok(())
        };

        if !self.creates.is_empty() {
            section("Items (CREATE)", &mut |f| {
                for item in &self.creates {
                    let product = item.product_id.as_deref().unwrap_or("?");
                    writeln!(f, "+ {}  (product {product})", item.name)?;
                }
                Ok(())
            })?;
        }
        if !self.revives.is_empty() {
            section("Items (REVIVE)", &mut |f| {
                for u in &self.revives {
                    writeln!(f, "~ {}  (product {})", u.name, u.product_id)?;
                }
                Ok(())
            })?;
        }
        if !self.retires.is_empty() {
            section("Items (RETIRE)", &mut |f| {
                for u in &self.retires {
                    writeln!(f, "- {}  (product {})", u.name, u.product_id)?;
                }
                Ok(())
            })?;
        }

        if !wrote_any {
            write!(f, "No changes")
        } else {
            Ok(())
        }
    }
}

/// Applies the membership decision table to one list.
///
/// For each wanted product: a live row is a no-op, a removed row is revived
/// (unchecked, with name/category/unit refreshed), no row means a create. For each current
/// row whose product is known and not wanted: a live row is retired, a
/// removed row is a no-op. Rows whose product is absent from the caller's
/// slice are left untouched.
pub(crate) fn make_diff(
    wanted: &Wanted,
    current: &Current,
    list_id: &str,
    now: DateTime<Utc>,
) -> ListDiff {
    let mut diff = ListDiff::default();

    for (product_id, want) in &wanted.needed {
        match current.by_product.get(product_id) {
            Some(item) if item.is_removed => diff.revives.push(MembershipUpdate {
                item_id: item.id.clone(),
                product_id: product_id.clone(),
                name: want.name.clone(),
                patch: ListItemPatch {
                    is_removed: Some(false),
                    // A revived membership starts a fresh trip; a checked
                    // flag left over from before the retire must not leak
                    // through (completion never saw the removed row).
                    checked: Some(false),
                    name: Some(want.name.clone()),
                    category: Some(want.category.clone()),
                    unit: Some(want.unit.clone()),
                    updated_at: Some(now),
                    ..Default::default()
                },
            }),
            Some(_) => {} // already a live member
            None => diff.creates.push(NewListItem {
                list_id: list_id.to_string(),
                product_id: Some(product_id.clone()),
                origin: ItemOrigin::Inventory,
                name: want.name.clone(),
                needed_quantity: want.needed_quantity,
                bought_quantity: 0.0,
                unit: want.unit.clone(),
                category: want.category.clone(),
                observation: None,
                checked: false,
                is_removed: false,
                user_id: want.user_id.clone(),
                created_at: now,
                updated_at: now,
            }),
        }
    }

    for (product_id, item) in &current.by_product {
        if wanted.needed.contains_key(product_id)
            || !wanted.known.contains(product_id)
            || item.is_removed
        {
            continue;
        }
        diff.retires.push(MembershipUpdate {
            item_id: item.id.clone(),
            product_id: product_id.clone(),
            name: item.name.clone(),
            patch: ListItemPatch {
                is_removed: Some(true),
                updated_at: Some(now),
                ..Default::default()
            },
        });
    }

    diff
}
