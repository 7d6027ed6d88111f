//! Facade crate for the townlands gazetteer loader.
//!
//! This crate re-exports the core domain types and the batch loaders. The
//! PostGIS store adapter is available behind the `store-postgis` feature.

#![forbid(unsafe_code)]

pub use townlands_core::{
    CompassBucket, DivisionRecord, GazetteerStore, GeometryRecord, HierarchyLevel, HierarchyRefs,
    StoreError, TouchEdge, TownlandIndex, TownlandNames, TownlandRecord,
};
pub use townlands_data::{
    AdjacencyLoadReport, GeometryLoadReport, HierarchyCache, LoadError, TownlandLoadReport,
    load_adjacency, load_geometry, load_townlands, resolve_division,
};

#[cfg(feature = "store-postgis")]
pub use townlands_data::postgis::{BUNDLED_SCHEMA, PostgisError, PostgisStore};

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "facade tests use expect for readable failures"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use townlands_core::test_support::MemoryStore;

    #[rstest]
    fn facade_resolves_divisions_and_edges() {
        let mut store = MemoryStore::with_townlands([-1, -2]);
        let mut cache = HierarchyCache::new();
        let county = DivisionRecord::new(5, Some("Cork".into()), None);
        let id = resolve_division(&mut store, &mut cache, HierarchyLevel::County, &county)
            .expect("resolve county");
        let again = resolve_division(&mut store, &mut cache, HierarchyLevel::County, &county)
            .expect("resolve county again");
        assert_eq!(id, again);
        assert_eq!(store.division_upserts(), 1);

        let index: TownlandIndex = store.townland_index().expect("townland index");
        let a = *index.get(&-1).expect("townland -1");
        let b = *index.get(&-2).expect("townland -2");
        let edge = TouchEdge::new(a, b, Some(180.0), None);
        assert_eq!(edge.bucket(), Some(CompassBucket::South));
        store.upsert_touch(&edge).expect("store edge");
    }

    #[cfg(feature = "store-postgis")]
    #[rstest]
    fn facade_bundles_the_schema() {
        assert!(BUNDLED_SCHEMA.contains("CREATE TABLE IF NOT EXISTS townland_geoms"));
    }
}
