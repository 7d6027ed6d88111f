//! Test-only, in-memory `GazetteerStore` implementation used by unit and
//! behaviour tests.

use std::collections::{BTreeMap, BTreeSet};

use geo::MultiPolygon;
use serde_json::Value;
use thiserror::Error;

use crate::geometry::{decode_geojson_geometry, polygonal_parts};
use crate::{
    DivisionRecord, GazetteerStore, GeometryRecord, HierarchyLevel, StoreError, TouchEdge,
    TownlandIndex, TownlandRecord,
};

/// A stored division and its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDivision {
    /// Surrogate identity.
    pub id: i64,
    /// Attributes from the most recent upsert.
    pub record: DivisionRecord,
}

/// A stored townland and its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTownland {
    /// Surrogate identity.
    pub id: i64,
    /// Attributes from the most recent upsert.
    pub record: TownlandRecord,
    /// Knowledge-base reference set by the geometry load.
    pub wikidata: Option<String>,
}

/// A stored geometry row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGeometry {
    /// Polygonal parts of the supplied geometry.
    pub multi_polygon: MultiPolygon<f64>,
    /// Spatial reference the geometry arrived in.
    pub source_srid: i32,
    /// Provenance payload.
    pub feature: Value,
}

/// Constraint violations raised by [`MemoryStore`].
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// A row referenced a townland identity that does not exist.
    #[error("townland {townland_id} does not exist")]
    UnknownTownland {
        /// The dangling identity.
        townland_id: i64,
    },
}

/// In-memory `GazetteerStore` implementation used in tests.
///
/// Identities are assigned per table from 1. Geometry is decoded and reduced
/// to its polygonal parts but neither reprojected nor repaired.
///
/// # Examples
///
/// ```rust
/// use townlands_core::{DivisionRecord, GazetteerStore, HierarchyLevel};
/// use townlands_core::test_support::MemoryStore;
///
/// let mut store = MemoryStore::default();
/// let record = DivisionRecord::new(5, Some("Cork".into()), None);
/// let first = store.upsert_division(HierarchyLevel::County, &record)?;
/// let again = store.upsert_division(HierarchyLevel::County, &record)?;
/// assert_eq!(first, again);
/// assert_eq!(store.division_count(HierarchyLevel::County), 1);
/// # Ok::<(), townlands_core::StoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    divisions: BTreeMap<HierarchyLevel, BTreeMap<i64, StoredDivision>>,
    townlands: BTreeMap<i64, StoredTownland>,
    touches: BTreeMap<(i64, i64), TouchEdge>,
    geometries: BTreeMap<i64, StoredGeometry>,
    sequences: BTreeMap<&'static str, i64>,
    rejected_geometries: BTreeSet<i64>,
    applied_schema: Vec<String>,
    division_upserts: usize,
    commits: usize,
}

impl MemoryStore {
    /// Create a store pre-populated with bare townlands for each external id.
    pub fn with_townlands<I>(osm_ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut store = Self::default();
        for osm_id in osm_ids {
            let record = TownlandRecord {
                osm_id,
                ..TownlandRecord::default()
            };
            store.insert_or_update_townland(&record);
        }
        store
    }

    /// Make every later geometry upsert for `townland_id` fail as an engine
    /// rejection.
    pub fn reject_geometry_for(&mut self, townland_id: i64) {
        self.rejected_geometries.insert(townland_id);
    }

    /// Look up a division by level and external id.
    pub fn division(&self, level: HierarchyLevel, osm_id: i64) -> Option<&StoredDivision> {
        self.divisions.get(&level)?.get(&osm_id)
    }

    /// Number of divisions stored at `level`.
    pub fn division_count(&self, level: HierarchyLevel) -> usize {
        self.divisions.get(&level).map_or(0, BTreeMap::len)
    }

    /// Number of division upserts received, including repeats.
    pub const fn division_upserts(&self) -> usize {
        self.division_upserts
    }

    /// Look up a townland by external id.
    pub fn townland(&self, osm_id: i64) -> Option<&StoredTownland> {
        self.townlands.get(&osm_id)
    }

    /// Number of stored townlands.
    pub fn townland_count(&self) -> usize {
        self.townlands.len()
    }

    /// Look up the edge from `src_id` to `dst_id`.
    pub fn touch(&self, src_id: i64, dst_id: i64) -> Option<&TouchEdge> {
        self.touches.get(&(src_id, dst_id))
    }

    /// Number of stored edges.
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Look up the geometry stored for a townland identity.
    pub fn geometry(&self, townland_id: i64) -> Option<&StoredGeometry> {
        self.geometries.get(&townland_id)
    }

    /// Number of stored geometries.
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Number of commits issued.
    pub const fn commits(&self) -> usize {
        self.commits
    }

    /// DDL scripts applied so far, oldest first.
    pub fn applied_schema(&self) -> &[String] {
        &self.applied_schema
    }

    fn next_id(&mut self, table: &'static str) -> i64 {
        let counter = self.sequences.entry(table).or_insert(0);
        *counter += 1;
        *counter
    }

    fn insert_or_update_townland(&mut self, record: &TownlandRecord) -> i64 {
        if let Some(existing) = self.townlands.get_mut(&record.osm_id) {
            existing.record = record.clone();
            return existing.id;
        }
        let id = self.next_id("townlands");
        self.townlands.insert(
            record.osm_id,
            StoredTownland {
                id,
                record: record.clone(),
                wikidata: None,
            },
        );
        id
    }

    fn townland_by_id_mut(&mut self, townland_id: i64) -> Option<&mut StoredTownland> {
        self.townlands
            .values_mut()
            .find(|townland| townland.id == townland_id)
    }

    fn require_townland(&self, townland_id: i64) -> Result<(), StoreError> {
        if self.townlands.values().any(|townland| townland.id == townland_id) {
            Ok(())
        } else {
            Err(StoreError::backend(
                "check townland reference",
                MemoryStoreError::UnknownTownland { townland_id },
            ))
        }
    }
}

impl GazetteerStore for MemoryStore {
    fn apply_schema(&mut self, ddl: &str) -> Result<(), StoreError> {
        self.applied_schema.push(ddl.to_owned());
        Ok(())
    }

    fn upsert_division(
        &mut self,
        level: HierarchyLevel,
        record: &DivisionRecord,
    ) -> Result<i64, StoreError> {
        self.division_upserts += 1;
        let mut stored = record.clone();
        if !level.has_county() {
            stored.county_id = None;
        }
        if let Some(existing) = self
            .divisions
            .get_mut(&level)
            .and_then(|rows| rows.get_mut(&record.osm_id))
        {
            existing.record = stored;
            return Ok(existing.id);
        }
        let id = self.next_id(level.table());
        self.divisions
            .entry(level)
            .or_default()
            .insert(record.osm_id, StoredDivision { id, record: stored });
        Ok(id)
    }

    fn upsert_townland(&mut self, record: &TownlandRecord) -> Result<i64, StoreError> {
        Ok(self.insert_or_update_townland(record))
    }

    fn townland_index(&mut self) -> Result<TownlandIndex, StoreError> {
        Ok(self
            .townlands
            .iter()
            .map(|(osm_id, townland)| (*osm_id, townland.id))
            .collect())
    }

    fn upsert_touch(&mut self, edge: &TouchEdge) -> Result<(), StoreError> {
        self.require_townland(edge.src_id())?;
        self.require_townland(edge.dst_id())?;
        self.touches.insert((edge.src_id(), edge.dst_id()), *edge);
        Ok(())
    }

    fn set_townland_wikidata(
        &mut self,
        townland_id: i64,
        wikidata: &str,
    ) -> Result<(), StoreError> {
        if let Some(townland) = self.townland_by_id_mut(townland_id) {
            townland.wikidata = Some(wikidata.to_owned());
        }
        Ok(())
    }

    fn upsert_geometry(&mut self, record: &GeometryRecord<'_>) -> Result<(), StoreError> {
        self.require_townland(record.townland_id)?;
        if self.rejected_geometries.contains(&record.townland_id) {
            return Err(StoreError::GeometryRejected {
                reason: format!("geometry for townland {} refused", record.townland_id),
            });
        }
        let geometry = decode_geojson_geometry(record.geometry).map_err(|err| {
            StoreError::GeometryRejected {
                reason: err.to_string(),
            }
        })?;
        self.geometries.insert(
            record.townland_id,
            StoredGeometry {
                multi_polygon: polygonal_parts(geometry),
                source_srid: record.source_srid,
                feature: record.feature.clone(),
            },
        );
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn division_upsert_overwrites_attributes() {
        let mut store = MemoryStore::default();
        let first = store
            .upsert_division(
                HierarchyLevel::Barony,
                &DivisionRecord::new(9, Some("Old".into()), None).with_county(Some(1)),
            )
            .expect("first upsert");
        let second = store
            .upsert_division(
                HierarchyLevel::Barony,
                &DivisionRecord::new(9, Some("New".into()), None).with_county(Some(1)),
            )
            .expect("second upsert");
        assert_eq!(first, second);
        let stored = store
            .division(HierarchyLevel::Barony, 9)
            .expect("stored barony");
        assert_eq!(stored.record.name.as_deref(), Some("New"));
        assert_eq!(stored.record.county_id, Some(1));
    }

    #[rstest]
    fn parishes_never_record_a_county() {
        let mut store = MemoryStore::default();
        store
            .upsert_division(
                HierarchyLevel::CivilParish,
                &DivisionRecord::new(3, None, None).with_county(Some(1)),
            )
            .expect("upsert parish");
        let stored = store
            .division(HierarchyLevel::CivilParish, 3)
            .expect("stored parish");
        assert_eq!(stored.record.county_id, None);
    }

    #[rstest]
    fn touch_requires_known_townlands() {
        let mut store = MemoryStore::with_townlands([100]);
        let err = store
            .upsert_touch(&TouchEdge::new(1, 2, Some(10.0), None))
            .expect_err("dangling edge");
        assert!(matches!(err, StoreError::Backend { .. }));
    }

    #[rstest]
    fn townland_upsert_keeps_wikidata() {
        let mut store = MemoryStore::with_townlands([100]);
        let id = store.townland(100).expect("seeded").id;
        store
            .set_townland_wikidata(id, "Q42")
            .expect("set wikidata");
        let record = TownlandRecord {
            osm_id: 100,
            ..TownlandRecord::default()
        };
        assert_eq!(store.upsert_townland(&record).expect("upsert"), id);
        assert_eq!(
            store.townland(100).and_then(|t| t.wikidata.as_deref()),
            Some("Q42")
        );
    }

    #[rstest]
    fn rejected_geometry_is_not_stored() {
        let mut store = MemoryStore::with_townlands([100]);
        let id = store.townland(100).expect("seeded").id;
        store.reject_geometry_for(id);
        let geometry = json!({"type": "Point", "coordinates": [0.0, 0.0]});
        let feature = json!({"geometry": geometry.clone()});
        let err = store
            .upsert_geometry(&GeometryRecord {
                townland_id: id,
                geometry: &geometry,
                source_srid: 4326,
                feature: &feature,
            })
            .expect_err("rejection");
        assert!(matches!(err, StoreError::GeometryRejected { .. }));
        assert_eq!(store.geometry_count(), 0);
    }
}
