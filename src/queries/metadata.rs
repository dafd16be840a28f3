//! Key-value statements for the `metadata` table
//!
//! Values are whole JSON documents, so every statement is rendered with
//! `?` placeholders and the caller binds key and value in column order.

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use crate::schema::Metadata;

/// SELECT value FROM metadata WHERE key = ?
pub fn select_by_key() -> String {
    Query::select()
        .column(Metadata::Value)
        .from(Metadata::Table)
        .and_where(Expr::col(Metadata::Key).eq(""))
        .build(SqliteQueryBuilder)
        .0
}

/// INSERT INTO metadata (key, value) VALUES (?, ?)
pub fn insert() -> String {
    Query::insert()
        .into_table(Metadata::Table)
        .columns([Metadata::Key, Metadata::Value])
        .values_panic(["".into(), "".into()])
        .build(SqliteQueryBuilder)
        .0
}

/// INSERT INTO metadata (key, value) VALUES (?, ?)
/// ON CONFLICT (key) DO UPDATE SET value = excluded.value
pub fn upsert() -> String {
    Query::insert()
        .into_table(Metadata::Table)
        .columns([Metadata::Key, Metadata::Value])
        .values_panic(["".into(), "".into()])
        .on_conflict(
            OnConflict::column(Metadata::Key)
                .update_column(Metadata::Value)
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
        .0
}

/// DELETE FROM metadata WHERE key = ?
pub fn delete_by_key() -> String {
    Query::delete()
        .from_table(Metadata::Table)
        .and_where(Expr::col(Metadata::Key).eq(""))
        .build(SqliteQueryBuilder)
        .0
}
