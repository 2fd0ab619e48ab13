//! Repository layer for database persistence.
//!
//! All database access uses Diesel over SQLite; schema changes are applied
//! by the cetane migration runner before any repository is used.

pub mod context;
pub mod items;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod util;

pub use context::DbContext;
pub use items::ItemRepository;
pub use pool::{DbError, SqlitePool};
