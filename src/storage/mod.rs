//! Storage backends for hotelcheck
//!
//! Backends implement the `HotelStore` trait. `SqliteStore` keeps everything
//! in a local database file; `RestStore` talks to the hosted store.

mod rest;
mod sqlite;
mod traits;

pub use rest::RestStore;
pub use sqlite::{RowCounts, SqliteStore};
pub use traits::{HotelStore, OpenStore, StorageError, StorageResult};
