//! Administrative divisions above the townland.
//!
//! Counties, baronies, civil parishes and electoral divisions share one record
//! shape. Only baronies carry a parent reference; civil parishes and electoral
//! divisions are linked to townlands alone because the source data does not
//! relate them to baronies or counties.

use std::fmt;

/// Level of the administrative hierarchy a division belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HierarchyLevel {
    /// Top of the hierarchy.
    County,
    /// Subdivision of a county.
    Barony,
    /// Ecclesiastical-origin civil parish.
    CivilParish,
    /// Electoral division.
    ElectoralDivision,
}

impl HierarchyLevel {
    /// Table holding rows of this level.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::County => "counties",
            Self::Barony => "baronies",
            Self::CivilParish => "civil_parishes",
            Self::ElectoralDivision => "electoral_divisions",
        }
    }

    /// Whether rows of this level record an owning county.
    #[must_use]
    pub const fn has_county(self) -> bool {
        matches!(self, Self::Barony)
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::County => "county",
            Self::Barony => "barony",
            Self::CivilParish => "civil parish",
            Self::ElectoralDivision => "electoral division",
        })
    }
}

/// Attributes of one administrative division, keyed by its external id.
///
/// # Examples
/// ```
/// use townlands_core::DivisionRecord;
///
/// let county = DivisionRecord::new(5, Some("Cork".into()), Some("100011".into()));
/// assert_eq!(county.osm_id, 5);
/// assert_eq!(county.county_id, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DivisionRecord {
    /// External identifier from the upstream dataset (natural key).
    pub osm_id: i64,
    /// Display name.
    pub name: Option<String>,
    /// Placenames database reference.
    pub logainm: Option<String>,
    /// Owning county identity; only stored for baronies.
    pub county_id: Option<i64>,
}

impl DivisionRecord {
    /// Construct a record without a parent county.
    #[must_use]
    pub const fn new(osm_id: i64, name: Option<String>, logainm: Option<String>) -> Self {
        Self {
            osm_id,
            name,
            logainm,
            county_id: None,
        }
    }

    /// Attach the owning county identity.
    #[must_use]
    pub fn with_county(mut self, county_id: Option<i64>) -> Self {
        self.county_id = county_id;
        self
    }
}
