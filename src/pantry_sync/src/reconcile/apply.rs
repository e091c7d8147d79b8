use crate::reconcile::diff::ListDiff;
use crate::store::{ListItemStore, StoreResult};

/// Applies the diff: one batched update write (revives then retires), then
/// one batched create write. Two round-trips, never interleaved per item.
pub(crate) fn apply_diff(store: &mut impl ListItemStore, diff: &ListDiff) -> StoreResult<()> {
    let updates: Vec<_> = diff
        .revives
        .iter()
        .chain(diff.retires.iter())
        .map(|u| (u.item_id.clone(), u.patch.clone()))
        .collect();
    if !updates.is_empty() {
        store.update_items(updates)?;
    }
    if !diff.creates.is_empty() {
        store.create_items(diff.creates.clone())?;
    }
    Ok(())
}
