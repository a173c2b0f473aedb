//! Imports W3C Extended Log Format files (the format written by IIS and
//! similar web servers) into a SQLite table.
//!
//! No schema is declared up front: each file's `#Fields:` directive names
//! the columns, and configured URL query parameters become extra columns
//! extracted from the `cs-uri-query` field of every row.

pub mod config;
pub mod importer;
pub mod schema;
pub mod store;
