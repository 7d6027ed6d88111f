//! Townland records and the directed touch edges between them.

use chrono::{DateTime, Utc};

use crate::CompassBucket;

/// Name variants recorded for a townland.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TownlandNames {
    /// Primary `name` tag.
    pub name_tag: Option<String>,
    /// Irish-language name.
    pub name_ga: Option<String>,
    /// English-language name.
    pub name_en: Option<String>,
    /// Alternative name.
    pub alt_name: Option<String>,
    /// Alternative Irish-language name.
    pub alt_name_g: Option<String>,
}

/// Internal identities of the divisions a townland belongs to.
///
/// Any reference may be absent when the source row omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchyRefs {
    /// Owning county.
    pub county_id: Option<i64>,
    /// Owning barony.
    pub barony_id: Option<i64>,
    /// Civil parish.
    pub civil_parish_id: Option<i64>,
    /// Electoral division.
    pub electoral_division_id: Option<i64>,
}

/// A townland row as written by the normalised load.
///
/// The `wikidata` reference is not part of the record: it is populated later
/// by the geometry load and survives re-imports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TownlandRecord {
    /// External identifier, stable across re-imports (natural key).
    pub osm_id: i64,
    /// Name variants.
    pub names: TownlandNames,
    /// Link to the townland's page on townlands.ie.
    pub t_ie_url: Option<String>,
    /// Area as published by the source.
    pub area: Option<f64>,
    /// Representative latitude in degrees.
    pub latitude: Option<f64>,
    /// Representative longitude in degrees.
    pub longitude: Option<f64>,
    /// Last contributor to edit the source object.
    pub osm_user: Option<String>,
    /// Timestamp of the last edit.
    pub osm_timestamp: Option<DateTime<Utc>>,
    /// Free-text attribution.
    pub attribution: Option<String>,
    /// Placenames database reference.
    pub logainm_ref: Option<String>,
    /// Epoch timestamp published by the source.
    pub epoch_tstm: Option<i64>,
    /// Resolved hierarchy references.
    pub hierarchy: HierarchyRefs,
}

/// A directed adjacency between two stored townlands.
///
/// The compass bucket is derived from the bearing when the edge is built and
/// cannot be set independently.
///
/// # Examples
/// ```
/// use townlands_core::{CompassBucket, TouchEdge};
///
/// let edge = TouchEdge::new(1, 2, Some(45.0), Some(120.5));
/// assert_eq!(edge.bucket(), Some(CompassBucket::NorthEast));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEdge {
    src_id: i64,
    dst_id: i64,
    direction_deg: Option<f64>,
    bucket: Option<CompassBucket>,
    shared_length_m: Option<f64>,
}

impl TouchEdge {
    /// Build an edge from `src_id` looking toward `dst_id`.
    #[must_use]
    pub fn new(
        src_id: i64,
        dst_id: i64,
        direction_deg: Option<f64>,
        shared_length_m: Option<f64>,
    ) -> Self {
        Self {
            src_id,
            dst_id,
            direction_deg,
            bucket: direction_deg.and_then(CompassBucket::from_bearing),
            shared_length_m,
        }
    }

    /// Internal identity of the source townland.
    #[must_use]
    pub const fn src_id(&self) -> i64 {
        self.src_id
    }

    /// Internal identity of the destination townland.
    #[must_use]
    pub const fn dst_id(&self) -> i64 {
        self.dst_id
    }

    /// Bearing in degrees from the source toward the destination.
    #[must_use]
    pub const fn direction_deg(&self) -> Option<f64> {
        self.direction_deg
    }

    /// Compass bucket derived from [`Self::direction_deg`].
    #[must_use]
    pub const fn bucket(&self) -> Option<CompassBucket> {
        self.bucket
    }

    /// Length of the shared boundary in metres.
    #[must_use]
    pub const fn shared_length_m(&self) -> Option<f64> {
        self.shared_length_m
    }
}
