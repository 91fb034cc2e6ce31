//! Persisted entity store
//!
//! Components:
//! - `pragma`: connection tuning
//! - `schema`: idempotent table layout
//! - `rows`: [`Persist`] implementations per entity
//! - `sqlite`: [`SqliteStore`], batch and relation writes

pub mod pragma;
pub mod rows;
pub mod schema;
pub mod sqlite;

pub use rows::{Persist, RowWrite};
pub use sqlite::{add_edge, insert_rows, set_relation, BatchOutcome, SqliteStore, StoreError};
