//! Storage contract for the gazetteer load pipeline.
//!
//! The `GazetteerStore` trait is the seam between the loaders and the
//! relational store. Every write is an upsert keyed by a natural key, so
//! re-applying the same input converges on the same state. Writes accumulate
//! in an open transaction until [`GazetteerStore::commit`] is called; rows
//! written after the last commit are discarded if the process stops.

use std::collections::HashMap;
use std::error::Error as StdError;

use thiserror::Error;

use crate::{DivisionRecord, GeometryRecord, HierarchyLevel, TouchEdge, TownlandRecord};

/// Mapping from townland external identifier to internal identity.
pub type TownlandIndex = HashMap<i64, i64>;

/// Errors reported by a [`GazetteerStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed while performing `operation`.
    #[error("store failed to {operation}: {source}")]
    Backend {
        /// Short description of the attempted operation.
        operation: &'static str,
        /// Underlying backend error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The geometry engine refused one geometry; the store remains usable.
    #[error("geometry rejected: {reason}")]
    GeometryRejected {
        /// Message reported by the engine.
        reason: String,
    },
}

impl StoreError {
    /// Wrap a backend error with the operation that raised it.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

/// Write access to the normalised gazetteer tables.
///
/// Implementations own a single connection for their lifetime and are driven
/// sequentially by one loader at a time.
pub trait GazetteerStore {
    /// Execute schema DDL against the store.
    fn apply_schema(&mut self, ddl: &str) -> Result<(), StoreError>;

    /// Insert or update a division keyed by `record.osm_id`, returning its
    /// internal identity.
    fn upsert_division(
        &mut self,
        level: HierarchyLevel,
        record: &DivisionRecord,
    ) -> Result<i64, StoreError>;

    /// Insert or update a townland keyed by `record.osm_id`, returning its
    /// internal identity. An existing `wikidata` reference is preserved.
    fn upsert_townland(&mut self, record: &TownlandRecord) -> Result<i64, StoreError>;

    /// Read the identity of every stored townland in one pass.
    fn townland_index(&mut self) -> Result<TownlandIndex, StoreError>;

    /// Insert or update the edge keyed by its `(src_id, dst_id)` pair.
    fn upsert_touch(&mut self, edge: &TouchEdge) -> Result<(), StoreError>;

    /// Record the knowledge-base reference of a stored townland.
    fn set_townland_wikidata(&mut self, townland_id: i64, wikidata: &str)
    -> Result<(), StoreError>;

    /// Normalise and store a townland geometry keyed by `record.townland_id`.
    ///
    /// Returns [`StoreError::GeometryRejected`] when the engine cannot
    /// process this geometry; the open transaction stays usable.
    fn upsert_geometry(&mut self, record: &GeometryRecord<'_>) -> Result<(), StoreError>;

    /// Commit the writes made since the previous commit.
    fn commit(&mut self) -> Result<(), StoreError>;
}
