//! Household inventory and shopping-list reconciliation.
//!
//! The core loop keeps one reserved shopping list (the "inventory list")
//! consistent with a user's product inventory: products whose stock dropped
//! below their threshold gain a list item, restocked products lose theirs,
//! and user-created items are never touched. See [`reconcile`] for the
//! forward sync and shopping-trip completion, [`recurrence`] for repurchase
//! schedules, and [`store`] for the persistence seams.

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod models;
pub mod reconcile;
pub mod recurrence;
pub mod schema;
pub mod status;
pub mod store;
pub mod time;
