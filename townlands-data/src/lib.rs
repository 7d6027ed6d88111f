//! Loaders and storage adapters for the townlands gazetteer.
//!
//! Responsibilities:
//! - Read the townland CSV export, the adjacency CSV and per-county GeoJSON
//!   feature collections.
//! - Parse scalar cells permissively and resolve the administrative hierarchy.
//! - Write through a [`townlands_core::GazetteerStore`], committing in batches.
//! - Provide the PostGIS store and its bundled schema (feature
//!   `store-postgis`).
//!
//! Boundaries:
//! - Domain types and the store contract live in `townlands-core`.
//! - Loaders are synchronous and drive one store sequentially.

#![forbid(unsafe_code)]

pub mod ingest;
#[cfg(feature = "store-postgis")]
pub mod postgis;

pub use ingest::{
    ADJACENCY_COLUMNS, AdjacencyLoadReport, GeometryLoadReport, HierarchyCache, LoadError,
    TOWNLAND_COLUMNS, TownlandLoadReport, load_adjacency, load_geometry, load_townlands,
    resolve_division,
};
