//! Quantity-derived status classification (display only).
//!
//! Two classification policies exist historically: the persisted
//! [`PurchaseStatus`](crate::models::PurchaseStatus) field, which users set
//! directly and which drives reconciliation, and this quantity-derived one.
//! The derived form is kept strictly as an informational helper for read
//! paths; nothing in [`crate::reconcile`] consumes it.

use crate::models::PurchaseStatus;

/// Classifies a product's stock level from its quantity fields.
///
/// - zero on hand -> `NeedShopping`
/// - below the needed amount -> `AlmostEmpty`
/// - otherwise -> `InStock`
///
/// Display-only; the persisted status remains the source of truth for sync.
pub fn classify_quantities(current_quantity: f64, needed_quantity: f64) -> PurchaseStatus {
    if current_quantity <= 0.0 {
        PurchaseStatus::NeedShopping
    } else if current_quantity < needed_quantity {
        PurchaseStatus::AlmostEmpty
    } else {
        PurchaseStatus::InStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_on_hand_needs_shopping() {
        assert_eq!(classify_quantities(0.0, 5.0), PurchaseStatus::NeedShopping);
    }

    #[test]
    fn below_needed_is_almost_empty() {
        assert_eq!(classify_quantities(2.0, 5.0), PurchaseStatus::AlmostEmpty);
    }

    #[test]
    fn at_or_above_needed_is_in_stock() {
        assert_eq!(classify_quantities(5.0, 5.0), PurchaseStatus::InStock);
        assert_eq!(classify_quantities(9.0, 5.0), PurchaseStatus::InStock);
        // No needed amount configured: anything on hand counts as stocked.
        assert_eq!(classify_quantities(1.0, 0.0), PurchaseStatus::InStock);
    }
}
