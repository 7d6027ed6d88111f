//! Core domain types for the townlands gazetteer.
//!
//! The crate models the administrative hierarchy of Ireland (counties,
//! baronies, civil parishes and electoral divisions), the townlands within
//! it, directed adjacency between townlands and their boundary geometry. The
//! [`GazetteerStore`] trait is the write seam the loaders depend on.

#![forbid(unsafe_code)]

mod compass;
pub mod geometry;
mod hierarchy;
mod store;
mod townland;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use compass::CompassBucket;
pub use geometry::{CANONICAL_SRID, GeometryRecord, WGS84_SRID};
pub use hierarchy::{DivisionRecord, HierarchyLevel};
pub use store::{GazetteerStore, StoreError, TownlandIndex};
pub use townland::{HierarchyRefs, TouchEdge, TownlandNames, TownlandRecord};
