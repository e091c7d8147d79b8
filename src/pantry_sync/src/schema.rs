//! Diesel table definitions mirroring the embedded migrations.

// The table! expansions carry no doc comments of their own.
#![allow(missing_docs)]

diesel::table! {
    products (id) {
        id -> Integer,
        name -> Text,
        current_quantity -> Double,
        needed_quantity -> Double,
        status -> Integer,
        category -> Nullable<Text>,
        recurrence -> Nullable<Text>,
        observation -> Nullable<Text>,
        unit -> Nullable<Text>,
        is_removed -> Bool,
        user_id -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    lists (id) {
        id -> Integer,
        name -> Text,
        user_id -> Text,
        share_token -> Nullable<Text>,
        reset_at -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    list_items (id) {
        id -> Integer,
        list_id -> Text,
        product_id -> Nullable<Text>,
        origin -> Text,
        name -> Text,
        needed_quantity -> Double,
        bought_quantity -> Double,
        unit -> Nullable<Text>,
        category -> Nullable<Text>,
        observation -> Nullable<Text>,
        checked -> Bool,
        is_removed -> Bool,
        user_id -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(products, lists, list_items);
