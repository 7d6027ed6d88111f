//! Normalised load of the townland CSV export.

use std::fmt;
use std::num::NonZeroUsize;

use camino::Utf8Path;
use log::{info, warn};
use townlands_core::{
    DivisionRecord, GazetteerStore, HierarchyLevel, HierarchyRefs, TownlandNames, TownlandRecord,
};

use super::hierarchy::{HierarchyCache, resolve_division};
use super::scalar::{clean_text, parse_float, parse_int, parse_timestamp};
use super::{CsvInput, CsvRow, LoadError};

/// Columns the townland CSV must carry.
pub const TOWNLAND_COLUMNS: [&str; 27] = [
    "OSM_ID",
    "NAME_TAG",
    "NAME_GA",
    "NAME_EN",
    "ALT_NAME",
    "ALT_NAME_G",
    "OSM_USER",
    "OSM_TIMEST",
    "ATTRIBUTIO",
    "LOGAINM_RE",
    "CO_NAME",
    "CO_OSM_ID",
    "CO_LOGAINM",
    "CP_NAME",
    "CP_OSM_ID",
    "CP_LOGAINM",
    "ED_NAME",
    "ED_OSM_ID",
    "ED_LOGAINM",
    "BAR_NAME",
    "BAR_OSM_ID",
    "BAR_LOGAIN",
    "T_IE_URL",
    "AREA",
    "LATITUDE",
    "LONGITUDE",
    "EPOCH_TSTM",
];

/// Column names describing one division level within a townland row.
struct DivisionColumns {
    level: HierarchyLevel,
    osm_id: &'static str,
    name: &'static str,
    logainm: &'static str,
}

/// Resolution order matters: baronies reference the county from the same row.
const DIVISION_COLUMNS: [DivisionColumns; 4] = [
    DivisionColumns {
        level: HierarchyLevel::County,
        osm_id: "CO_OSM_ID",
        name: "CO_NAME",
        logainm: "CO_LOGAINM",
    },
    DivisionColumns {
        level: HierarchyLevel::Barony,
        osm_id: "BAR_OSM_ID",
        name: "BAR_NAME",
        logainm: "BAR_LOGAIN",
    },
    DivisionColumns {
        level: HierarchyLevel::CivilParish,
        osm_id: "CP_OSM_ID",
        name: "CP_NAME",
        logainm: "CP_LOGAINM",
    },
    DivisionColumns {
        level: HierarchyLevel::ElectoralDivision,
        osm_id: "ED_OSM_ID",
        name: "ED_NAME",
        logainm: "ED_LOGAINM",
    },
];

/// Outcome of a normalised townland load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TownlandLoadReport {
    /// Data rows read from the CSV.
    pub rows_read: usize,
    /// Townland upserts issued.
    pub townlands_written: usize,
    /// Rows skipped because their own identifier could not be parsed.
    pub rows_skipped: usize,
    /// Distinct counties resolved.
    pub counties: usize,
    /// Distinct baronies resolved.
    pub baronies: usize,
    /// Distinct civil parishes resolved.
    pub civil_parishes: usize,
    /// Distinct electoral divisions resolved.
    pub electoral_divisions: usize,
}

impl fmt::Display for TownlandLoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed rows: {}. Townlands written: {}. Skipped: {}. Unique counties: {}. \
             Unique baronies: {}. Unique civil parishes: {}. Unique EDs: {}.",
            self.rows_read,
            self.townlands_written,
            self.rows_skipped,
            self.counties,
            self.baronies,
            self.civil_parishes,
            self.electoral_divisions,
        )
    }
}

/// Load the townland CSV at `csv_path`, resolving the administrative
/// hierarchy of every row on the way.
///
/// The header is validated before anything is written. The store commits
/// after every `batch_size` rows and once more at the end.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumns`] when the header lacks any of
/// [`TOWNLAND_COLUMNS`], and propagates IO, CSV and store failures.
///
/// # Examples
/// ```no_run
/// use std::num::NonZeroUsize;
/// use camino::Utf8Path;
/// use townlands_core::test_support::MemoryStore;
/// use townlands_data::load_townlands;
///
/// let mut store = MemoryStore::default();
/// let batch = NonZeroUsize::new(1000).ok_or("zero batch")?;
/// let report = load_townlands(&mut store, Utf8Path::new("townlands.csv"), batch)?;
/// println!("{report}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_townlands<S>(
    store: &mut S,
    csv_path: &Utf8Path,
    batch_size: NonZeroUsize,
) -> Result<TownlandLoadReport, LoadError>
where
    S: GazetteerStore + ?Sized,
{
    let mut input = CsvInput::open(csv_path, &TOWNLAND_COLUMNS)?;
    let mut cache = HierarchyCache::new();
    let mut report = TownlandLoadReport::default();

    while let Some(row) = input.next_row()? {
        report.rows_read += 1;
        let hierarchy = resolve_row_hierarchy(store, &mut cache, &row)?;

        match townland_from_row(&row, hierarchy) {
            Some(record) => {
                store.upsert_townland(&record)?;
                report.townlands_written += 1;
            }
            None => {
                warn!(
                    "row {} of {csv_path} has no usable OSM_ID ({:?}); skipping",
                    report.rows_read,
                    row.field("OSM_ID").unwrap_or_default(),
                );
                report.rows_skipped += 1;
            }
        }

        if report.rows_read.is_multiple_of(batch_size.get()) {
            store.commit()?;
            info!("Processed {} rows...", report.rows_read);
        }
    }
    store.commit()?;

    report.counties = cache.unique_count(HierarchyLevel::County);
    report.baronies = cache.unique_count(HierarchyLevel::Barony);
    report.civil_parishes = cache.unique_count(HierarchyLevel::CivilParish);
    report.electoral_divisions = cache.unique_count(HierarchyLevel::ElectoralDivision);
    Ok(report)
}

fn resolve_row_hierarchy<S>(
    store: &mut S,
    cache: &mut HierarchyCache,
    row: &CsvRow<'_>,
) -> Result<HierarchyRefs, LoadError>
where
    S: GazetteerStore + ?Sized,
{
    let mut refs = HierarchyRefs::default();
    for columns in &DIVISION_COLUMNS {
        let Some(osm_id) = parse_int(row.field(columns.osm_id)) else {
            continue;
        };
        let mut record = DivisionRecord::new(
            osm_id,
            clean_text(row.field(columns.name)),
            clean_text(row.field(columns.logainm)),
        );
        if columns.level.has_county() {
            record = record.with_county(refs.county_id);
        }
        let id = resolve_division(store, cache, columns.level, &record)?;
        let slot = match columns.level {
            HierarchyLevel::County => &mut refs.county_id,
            HierarchyLevel::Barony => &mut refs.barony_id,
            HierarchyLevel::CivilParish => &mut refs.civil_parish_id,
            HierarchyLevel::ElectoralDivision => &mut refs.electoral_division_id,
        };
        *slot = Some(id);
    }
    Ok(refs)
}

fn townland_from_row(row: &CsvRow<'_>, hierarchy: HierarchyRefs) -> Option<TownlandRecord> {
    let text = |column: &str| clean_text(row.field(column));
    Some(TownlandRecord {
        osm_id: parse_int(row.field("OSM_ID"))?,
        names: TownlandNames {
            name_tag: text("NAME_TAG"),
            name_ga: text("NAME_GA"),
            name_en: text("NAME_EN"),
            alt_name: text("ALT_NAME"),
            alt_name_g: text("ALT_NAME_G"),
        },
        t_ie_url: text("T_IE_URL"),
        area: parse_float(row.field("AREA")),
        latitude: parse_float(row.field("LATITUDE")),
        longitude: parse_float(row.field("LONGITUDE")),
        osm_user: text("OSM_USER"),
        osm_timestamp: parse_timestamp(row.field("OSM_TIMEST")),
        attribution: text("ATTRIBUTIO"),
        logainm_ref: text("LOGAINM_RE"),
        epoch_tstm: parse_int(row.field("EPOCH_TSTM")),
        hierarchy,
    })
}
