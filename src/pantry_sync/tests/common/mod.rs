#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use tempfile::TempDir;

use pantry_sync::db::migrate;
use pantry_sync::models::{NewProduct, Product, PurchaseStatus};
use pantry_sync::store::sqlite::SqliteStore;

pub struct TestDb {
    _dir: TempDir, // keep alive for the life of the test
    pub path: String,
}

pub fn setup_store() -> (TestDb, SqliteStore) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run(&path).expect("migrations");
    let store = SqliteStore::open(&path).expect("open");
    (TestDb { _dir: dir, path }, store)
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

pub fn count(store: &mut SqliteStore, table: &str) -> i64 {
    let row: CountRow = diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
        .get_result(store.connection())
        .unwrap();
    row.n
}

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

pub fn new_product(name: &str, current: f64, needed: f64, status: PurchaseStatus) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        current_quantity: current,
        needed_quantity: needed,
        status,
        category: None,
        recurrence: None,
        observation: None,
        unit: None,
        user_id: "u-1".to_string(),
        created_at: t0(),
        updated_at: t0(),
    }
}

pub fn seed_product(
    store: &mut SqliteStore,
    name: &str,
    current: f64,
    needed: f64,
    status: PurchaseStatus,
) -> Product {
    use pantry_sync::store::ProductStore;
    store
        .create_product(new_product(name, current, needed, status))
        .expect("create product")
}
