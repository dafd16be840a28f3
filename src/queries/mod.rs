//! SQL builders for the archive database
//!
//! Queries are rendered to strings with sea-query and executed through sqlx,
//! so the statements stay readable in one place.

pub mod ddl;
pub mod metadata;
