//! SQLite persistence module
//!
//! Repository pattern cho SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_memory_pool, create_pool, init_schema, AccountRepo, PointsRepo, TransactionRepo,
};
pub use schema::{NewTransaction, TokenAccountRow, TransactionRow, SCHEMA};
