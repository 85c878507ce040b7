//! Catalog snapshot, its derived views, and the store that keeps it current.

pub mod item;
pub mod store;
pub mod view;

pub use item::CatalogItem;
pub use store::{CatalogSource, CatalogState, CatalogStore, SnapshotSource};
pub use view::{project, SortKey};
