//! Per-run deduplication of administrative divisions.

use std::collections::HashMap;

use log::debug;
use townlands_core::{DivisionRecord, GazetteerStore, HierarchyLevel, StoreError};

#[derive(Debug, Clone)]
struct CachedDivision {
    id: i64,
    record: DivisionRecord,
}

/// Identities of the divisions resolved during one load.
///
/// The cache belongs to a single invocation of the normalised load and is
/// passed explicitly to [`resolve_division`].
#[derive(Debug, Default)]
pub struct HierarchyCache {
    levels: HashMap<HierarchyLevel, HashMap<i64, CachedDivision>>,
}

impl HierarchyCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct divisions resolved at `level`.
    #[must_use]
    pub fn unique_count(&self, level: HierarchyLevel) -> usize {
        self.levels.get(&level).map_or(0, HashMap::len)
    }
}

/// Resolve a division to its internal identity, writing it when needed.
///
/// The first sighting of a natural key upserts the row. Later sightings with
/// the same attributes are answered from `cache`; sightings with different
/// attributes upsert again so the most recent row wins.
///
/// # Examples
/// ```
/// use townlands_core::{DivisionRecord, HierarchyLevel};
/// use townlands_core::test_support::MemoryStore;
/// use townlands_data::{HierarchyCache, resolve_division};
///
/// let mut store = MemoryStore::default();
/// let mut cache = HierarchyCache::new();
/// let cork = DivisionRecord::new(5, Some("Cork".into()), None);
/// let id = resolve_division(&mut store, &mut cache, HierarchyLevel::County, &cork)?;
/// let again = resolve_division(&mut store, &mut cache, HierarchyLevel::County, &cork)?;
/// assert_eq!(id, again);
/// assert_eq!(store.division_upserts(), 1);
/// # Ok::<(), townlands_core::StoreError>(())
/// ```
pub fn resolve_division<S>(
    store: &mut S,
    cache: &mut HierarchyCache,
    level: HierarchyLevel,
    record: &DivisionRecord,
) -> Result<i64, StoreError>
where
    S: GazetteerStore + ?Sized,
{
    let entries = cache.levels.entry(level).or_default();
    if let Some(cached) = entries.get(&record.osm_id)
        && cached.record == *record
    {
        return Ok(cached.id);
    }
    let id = store.upsert_division(level, record)?;
    debug!("upserted {level} {} as {id}", record.osm_id);
    entries.insert(
        record.osm_id,
        CachedDivision {
            id,
            record: record.clone(),
        },
    );
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use townlands_core::test_support::MemoryStore;

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::default()
    }

    fn county(name: &str) -> DivisionRecord {
        DivisionRecord::new(5, Some(name.to_owned()), Some("100011".to_owned()))
    }

    #[rstest]
    fn repeated_identical_rows_hit_the_cache(mut store: MemoryStore) {
        let mut cache = HierarchyCache::new();
        for _ in 0..3 {
            resolve_division(&mut store, &mut cache, HierarchyLevel::County, &county("Cork"))
                .expect("resolve county");
        }
        assert_eq!(store.division_upserts(), 1);
        assert_eq!(cache.unique_count(HierarchyLevel::County), 1);
    }

    #[rstest]
    fn later_attributes_win(mut store: MemoryStore) {
        let mut cache = HierarchyCache::new();
        let first = resolve_division(&mut store, &mut cache, HierarchyLevel::County, &county("Cork"))
            .expect("first row");
        let second = resolve_division(
            &mut store,
            &mut cache,
            HierarchyLevel::County,
            &county("Corcaigh"),
        )
        .expect("second row");

        assert_eq!(first, second);
        assert_eq!(store.division_upserts(), 2);
        let stored = store
            .division(HierarchyLevel::County, 5)
            .expect("county stored");
        assert_eq!(stored.record.name.as_deref(), Some("Corcaigh"));
        assert_eq!(cache.unique_count(HierarchyLevel::County), 1);
    }

    #[rstest]
    fn levels_are_keyed_independently(mut store: MemoryStore) {
        let mut cache = HierarchyCache::new();
        let record = DivisionRecord::new(7, None, None);
        let parish = resolve_division(&mut store, &mut cache, HierarchyLevel::CivilParish, &record)
            .expect("parish");
        let division =
            resolve_division(&mut store, &mut cache, HierarchyLevel::ElectoralDivision, &record)
                .expect("electoral division");

        let stored_id = |level: HierarchyLevel| store.division(level, 7).map(|stored| stored.id);
        assert_eq!(stored_id(HierarchyLevel::CivilParish), Some(parish));
        assert_eq!(stored_id(HierarchyLevel::ElectoralDivision), Some(division));
        assert_eq!(cache.unique_count(HierarchyLevel::CivilParish), 1);
        assert_eq!(cache.unique_count(HierarchyLevel::ElectoralDivision), 1);
        assert_eq!(store.division_upserts(), 2);
        assert_eq!(cache.unique_count(HierarchyLevel::County), 0);
    }
}
