//! SQLite storage layer for formstore.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Audit events for history
//!
//! # Submodules
//!
//! - [`events`] - Audit event storage
//! - [`form_result`] - Form result row mapping and queries
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main SQLite storage implementation

pub mod events;
pub mod form_result;
pub mod schema;
pub mod sqlite;

pub use sqlite::{MutationContext, SqliteStorage};
