//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite connection pool and migrations
//! - Users, stories and comments

mod database;
mod models;

pub use database::Database;
pub use models::*;
