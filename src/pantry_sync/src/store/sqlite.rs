//! Diesel/SQLite implementation of the store traits.
//!
//! Rows keep timestamps as RFC-3339 UTC strings and the recurrence schedule
//! as a JSON column; ids are SQLite rowids rendered as opaque strings on the
//! domain side. Batched writes run inside one `BEGIN IMMEDIATE` transaction
//! to reduce `SQLITE_BUSY` surprises, but callers must not read atomicity
//! guarantees into that — see [`crate::store`].

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::connection::connect_sqlite;
use crate::models::{
    ItemOrigin, List, ListItem, ListItemPatch, NewList, NewListItem, NewProduct, Product,
    PurchaseStatus,
};
use crate::schema::{list_items, lists, products};
use crate::store::{ListItemStore, ListStore, ProductStore, StoreError, StoreResult};
use crate::time::{parse_ts_to_utc, to_rfc3339_millis};

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> StoreError {
        StoreError::Backend(e.into())
    }
}

/// Store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: SqliteConnection,
}

impl SqliteStore {
    /// Wraps an already-opened connection.
    pub fn new(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// Opens the database at `database_url` with the standard PRAGMAs.
    /// Migrations are the caller's job; see [`crate::db::migrate::run`].
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::new(connect_sqlite(database_url)?))
    }

    /// Escape hatch for tests and maintenance queries.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

// ---- row types ----

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = products, check_for_backend(diesel::sqlite::Sqlite))]
struct ProductRow {
    id: i32,
    name: String,
    current_quantity: f64,
    needed_quantity: f64,
    status: i32,
    category: Option<String>,
    recurrence: Option<String>,
    observation: Option<String>,
    unit: Option<String>,
    is_removed: bool,
    user_id: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
struct NewProductRow<'a> {
    name: &'a str,
    current_quantity: f64,
    needed_quantity: f64,
    status: i32,
    category: Option<&'a str>,
    recurrence: Option<String>,
    observation: Option<&'a str>,
    unit: Option<&'a str>,
    is_removed: bool,
    user_id: &'a str,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = lists, check_for_backend(diesel::sqlite::Sqlite))]
struct ListRow {
    id: i32,
    name: String,
    user_id: String,
    share_token: Option<String>,
    reset_at: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = lists)]
struct NewListRow<'a> {
    name: &'a str,
    user_id: &'a str,
    share_token: Option<&'a str>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = list_items, check_for_backend(diesel::sqlite::Sqlite))]
struct ListItemRow {
    id: i32,
    list_id: String,
    product_id: Option<String>,
    origin: String,
    name: String,
    needed_quantity: f64,
    bought_quantity: f64,
    unit: Option<String>,
    category: Option<String>,
    observation: Option<String>,
    checked: bool,
    is_removed: bool,
    user_id: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = list_items)]
struct NewListItemRow<'a> {
    list_id: &'a str,
    product_id: Option<&'a str>,
    origin: &'static str,
    name: &'a str,
    needed_quantity: f64,
    bought_quantity: f64,
    unit: Option<&'a str>,
    category: Option<&'a str>,
    observation: Option<&'a str>,
    checked: bool,
    is_removed: bool,
    user_id: &'a str,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = list_items)]
struct ListItemChanges {
    name: Option<String>,
    category: Option<Option<String>>,
    unit: Option<Option<String>>,
    needed_quantity: Option<f64>,
    checked: Option<bool>,
    is_removed: Option<bool>,
    updated_at: Option<String>,
}

impl From<ListItemPatch> for ListItemChanges {
    fn from(p: ListItemPatch) -> Self {
        ListItemChanges {
            name: p.name,
            category: p.category,
            unit: p.unit,
            needed_quantity: p.needed_quantity,
            checked: p.checked,
            is_removed: p.is_removed,
            updated_at: p.updated_at.map(to_rfc3339_millis),
        }
    }
}

// ---- conversions ----

fn parse_row_id(entity: &'static str, id: &str) -> StoreResult<i32> {
    id.parse::<i32>().map_err(|_| StoreError::NotFound {
        entity,
        id: id.to_string(),
    })
}

fn product_from_row(row: ProductRow) -> anyhow::Result<Product> {
    Ok(Product {
        id: row.id.to_string(),
        name: row.name,
        current_quantity: row.current_quantity,
        needed_quantity: row.needed_quantity,
        status: PurchaseStatus::try_from(row.status)?,
        category: row.category,
        recurrence: row
            .recurrence
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        observation: row.observation,
        unit: row.unit,
        is_removed: row.is_removed,
        user_id: row.user_id,
        created_at: parse_ts_to_utc(&row.created_at)?,
        updated_at: parse_ts_to_utc(&row.updated_at)?,
    })
}

fn list_from_row(row: ListRow) -> anyhow::Result<List> {
    Ok(List {
        id: row.id.to_string(),
        name: row.name,
        user_id: row.user_id,
        share_token: row.share_token,
        reset_at: row.reset_at.as_deref().map(parse_ts_to_utc).transpose()?,
        created_at: parse_ts_to_utc(&row.created_at)?,
        updated_at: parse_ts_to_utc(&row.updated_at)?,
    })
}

fn item_from_row(row: ListItemRow) -> anyhow::Result<ListItem> {
    Ok(ListItem {
        id: row.id.to_string(),
        list_id: row.list_id,
        product_id: row.product_id,
        origin: row.origin.parse::<ItemOrigin>()?,
        name: row.name,
        needed_quantity: row.needed_quantity,
        bought_quantity: row.bought_quantity,
        unit: row.unit,
        category: row.category,
        observation: row.observation,
        checked: row.checked,
        is_removed: row.is_removed,
        user_id: row.user_id,
        created_at: parse_ts_to_utc(&row.created_at)?,
        updated_at: parse_ts_to_utc(&row.updated_at)?,
    })
}

fn item_row_values(item: &NewListItem) -> NewListItemRow<'_> {
    NewListItemRow {
        list_id: &item.list_id,
        product_id: item.product_id.as_deref(),
        origin: item.origin.as_str(),
        name: &item.name,
        needed_quantity: item.needed_quantity,
        bought_quantity: item.bought_quantity,
        unit: item.unit.as_deref(),
        category: item.category.as_deref(),
        observation: item.observation.as_deref(),
        checked: item.checked,
        is_removed: item.is_removed,
        user_id: &item.user_id,
        created_at: to_rfc3339_millis(item.created_at),
        updated_at: to_rfc3339_millis(item.updated_at),
    }
}

fn update_one_item(
    conn: &mut SqliteConnection,
    id: &str,
    patch: ListItemPatch,
) -> StoreResult<()> {
    if patch.is_empty() {
        return Ok(());
    }
    let row_id = parse_row_id("list item", id)?;
    let changes = ListItemChanges::from(patch);
    let affected = diesel::update(list_items::table.find(row_id))
        .set(&changes)
        .execute(conn)?;
    if affected == 0 {
        return Err(StoreError::NotFound {
            entity: "list item",
            id: id.to_string(),
        });
    }
    Ok(())
}

// ---- trait impls ----

impl ListItemStore for SqliteStore {
    fn items_by_list(
        &mut self,
        list_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<ListItem>> {
        let mut query = list_items::table
            .filter(list_items::list_id.eq(list_id))
            .order(list_items::id.asc())
            .into_boxed();
        if !include_removed {
            query = query.filter(list_items::is_removed.eq(false));
        }
        let rows: Vec<ListItemRow> = query.select(ListItemRow::as_select()).load(&mut self.conn)?;
        rows.into_iter()
            .map(|r| item_from_row(r).map_err(StoreError::Backend))
            .collect()
    }

    fn items_by_product(
        &mut self,
        product_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<ListItem>> {
        let mut query = list_items::table
            .filter(list_items::product_id.eq(product_id))
            .order(list_items::id.asc())
            .into_boxed();
        if !include_removed {
            query = query.filter(list_items::is_removed.eq(false));
        }
        let rows: Vec<ListItemRow> = query.select(ListItemRow::as_select()).load(&mut self.conn)?;
        rows.into_iter()
            .map(|r| item_from_row(r).map_err(StoreError::Backend))
            .collect()
    }

    fn create_item(&mut self, item: NewListItem) -> StoreResult<ListItem> {
        let values = item_row_values(&item);
        let row: ListItemRow = diesel::insert_into(list_items::table)
            .values(&values)
            .returning(ListItemRow::as_returning())
            .get_result(&mut self.conn)?;
        item_from_row(row).map_err(StoreError::Backend)
    }

    fn update_item(&mut self, id: &str, patch: ListItemPatch) -> StoreResult<()> {
        update_one_item(&mut self.conn, id, patch)
    }

    fn create_items(&mut self, items: Vec<NewListItem>) -> StoreResult<()> {
        let values: Vec<NewListItemRow<'_>> = items.iter().map(item_row_values).collect();
        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            diesel::insert_into(list_items::table)
                .values(&values)
                .execute(conn)?;
            Ok(())
        })
    }

    fn update_items(&mut self, updates: Vec<(String, ListItemPatch)>) -> StoreResult<()> {
        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            for (id, patch) in updates {
                update_one_item(conn, &id, patch)?;
            }
            Ok(())
        })
    }

    fn purge_list_items(&mut self, list_id: &str) -> StoreResult<usize> {
        let n = diesel::delete(list_items::table.filter(list_items::list_id.eq(list_id)))
            .execute(&mut self.conn)?;
        Ok(n)
    }
}

impl ProductStore for SqliteStore {
    fn products_by_user(
        &mut self,
        user_id: &str,
        include_removed: bool,
    ) -> StoreResult<Vec<Product>> {
        let mut query = products::table
            .filter(products::user_id.eq(user_id))
            .order(products::id.asc())
            .into_boxed();
        if !include_removed {
            query = query.filter(products::is_removed.eq(false));
        }
        let rows: Vec<ProductRow> = query.select(ProductRow::as_select()).load(&mut self.conn)?;
        rows.into_iter()
            .map(|r| product_from_row(r).map_err(StoreError::Backend))
            .collect()
    }

    fn create_product(&mut self, product: NewProduct) -> StoreResult<Product> {
        let recurrence = product
            .recurrence
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Backend(e.into()))?;
        let values = NewProductRow {
            name: &product.name,
            current_quantity: product.current_quantity,
            needed_quantity: product.needed_quantity,
            status: product.status.into(),
            category: product.category.as_deref(),
            recurrence,
            observation: product.observation.as_deref(),
            unit: product.unit.as_deref(),
            is_removed: false,
            user_id: &product.user_id,
            created_at: to_rfc3339_millis(product.created_at),
            updated_at: to_rfc3339_millis(product.updated_at),
        };
        let row: ProductRow = diesel::insert_into(products::table)
            .values(&values)
            .returning(ProductRow::as_returning())
            .get_result(&mut self.conn)?;
        product_from_row(row).map_err(StoreError::Backend)
    }

    fn set_purchase_status(&mut self, product_id: &str, status: PurchaseStatus) -> StoreResult<()> {
        let row_id = parse_row_id("product", product_id)?;
        let affected = diesel::update(products::table.find(row_id))
            .set((
                products::status.eq(i32::from(status)),
                products::updated_at.eq(to_rfc3339_millis(Utc::now())),
            ))
            .execute(&mut self.conn)?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            });
        }
        Ok(())
    }

    fn retire_product(&mut self, product_id: &str) -> StoreResult<()> {
        let row_id = parse_row_id("product", product_id)?;
        let affected = diesel::update(products::table.find(row_id))
            .set((
                products::is_removed.eq(true),
                products::updated_at.eq(to_rfc3339_millis(Utc::now())),
            ))
            .execute(&mut self.conn)?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            });
        }
        Ok(())
    }
}

impl ListStore for SqliteStore {
    fn get_list(&mut self, list_id: &str) -> StoreResult<List> {
        let row_id = parse_row_id("list", list_id)?;
        let row: ListRow = lists::table
            .find(row_id)
            .select(ListRow::as_select())
            .first(&mut self.conn)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                entity: "list",
                id: list_id.to_string(),
            })?;
        list_from_row(row).map_err(StoreError::Backend)
    }

    fn create_list(&mut self, list: NewList) -> StoreResult<List> {
        let values = NewListRow {
            name: &list.name,
            user_id: &list.user_id,
            share_token: list.share_token.as_deref(),
            created_at: to_rfc3339_millis(list.created_at),
            updated_at: to_rfc3339_millis(list.updated_at),
        };
        let row: ListRow = diesel::insert_into(lists::table)
            .values(&values)
            .returning(ListRow::as_returning())
            .get_result(&mut self.conn)?;
        list_from_row(row).map_err(StoreError::Backend)
    }

    fn touch_reset(&mut self, list_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let row_id = parse_row_id("list", list_id)?;
        let ts = to_rfc3339_millis(at);
        let affected = diesel::update(lists::table.find(row_id))
            .set((
                lists::reset_at.eq(Some(ts.clone())),
                lists::updated_at.eq(ts),
            ))
            .execute(&mut self.conn)?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "list",
                id: list_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_list(&mut self, list_id: &str) -> StoreResult<()> {
        let row_id = parse_row_id("list", list_id)?;
        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let affected =
                diesel::delete(lists::table.find(row_id)).execute(conn)?;
            if affected == 0 {
                return Err(StoreError::NotFound {
                    entity: "list",
                    id: list_id.to_string(),
                });
            }
            // Items are hard-deleted with their list; soft-removal is only
            // for membership churn.
            diesel::delete(list_items::table.filter(list_items::list_id.eq(list_id)))
                .execute(conn)?;
            Ok(())
        })
    }
}
