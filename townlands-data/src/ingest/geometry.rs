//! Load of townland boundaries from per-county GeoJSON feature collections.

use std::fmt;
use std::io::BufReader;
use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use townlands_core::geometry::{decode_geojson_geometry, is_valid_geometry};
use townlands_core::{GazetteerStore, GeometryRecord, StoreError, TownlandIndex};

use super::LoadError;

/// Outcome of a geometry load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryLoadReport {
    /// Feature-collection files read.
    pub files: usize,
    /// Features encountered across all files.
    pub features_total: usize,
    /// Geometries stored.
    pub features_loaded: usize,
    /// Features without an identifier, a known townland or a geometry.
    pub features_skipped: usize,
    /// Features whose geometry the store refused.
    pub features_rejected: usize,
    /// Stored geometries that were invalid on input and repaired by the store.
    pub features_repaired: usize,
}

impl fmt::Display for GeometryLoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Files: {}. Features total: {}. Loaded: {}. Skipped: {}. Rejected: {}. Repaired: {}.",
            self.files,
            self.features_total,
            self.features_loaded,
            self.features_skipped,
            self.features_rejected,
            self.features_repaired,
        )
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Value>,
}

/// Map a feature identifier to the signed external id of its townland.
///
/// Townland boundaries are relations, whose external ids are stored negated:
/// `relation/<n>` maps to `-n` and a bare integer `n` to `-|n|`.
///
/// # Examples
/// ```
/// use townlands_data::ingest::osm_id_from_feature_id;
///
/// assert_eq!(osm_id_from_feature_id("relation/123"), Some(-123));
/// assert_eq!(osm_id_from_feature_id("123"), Some(-123));
/// assert_eq!(osm_id_from_feature_id("-123"), Some(-123));
/// assert_eq!(osm_id_from_feature_id("way/123"), None);
/// ```
#[must_use]
pub fn osm_id_from_feature_id(feature_id: &str) -> Option<i64> {
    let text = feature_id.trim();
    if let Some(relation) = text.strip_prefix("relation/") {
        return relation.trim().parse::<i64>().ok()?.checked_neg();
    }
    let value = text.parse::<i64>().ok()?;
    Some(if value > 0 { -value } else { value })
}

/// Identifier text carried by a JSON value. Only strings and numbers name a
/// relation; any other present value yields nothing.
fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Derive the signed external id of the townland a feature describes.
///
/// The feature's own `id` is preferred; when it is missing or blank (null,
/// `false`, zero or empty) the `@id` property is used instead. A present id
/// that is neither a string nor a number does not fall back and yields `None`.
#[must_use]
pub fn feature_external_id(feature: &Value) -> Option<i64> {
    let present = |value: &&Value| !is_blank(value);
    let id = feature
        .get("id")
        .filter(present)
        .or_else(|| feature.get("properties")?.get("@id").filter(present))?;
    osm_id_from_feature_id(&identifier_text(id)?)
}

/// Discover feature-collection files: sorted `*.geojson` followed by sorted
/// `*.json`, without descending into subdirectories.
///
/// # Errors
///
/// Returns [`LoadError::ReadFolder`] when the folder cannot be listed.
pub fn feature_collection_files(folder: &Utf8Path) -> Result<Vec<Utf8PathBuf>, LoadError> {
    let list = |extension: &str| {
        townlands_fs::list_files_with_extension(folder, extension).map_err(|source| {
            LoadError::ReadFolder {
                path: folder.to_path_buf(),
                source,
            }
        })
    };
    let mut files = list("geojson")?;
    files.extend(list("json")?);
    Ok(files)
}

fn read_feature_collection(path: &Utf8Path) -> Result<FeatureCollection, LoadError> {
    let file = townlands_fs::open_utf8_file(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        LoadError::ParseFeatureCollection {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Whether a JSON value counts as absent: null, `false`, zero or empty.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Object(members) => members.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Bool(true) => false,
    }
}

fn wikidata_reference(feature: &Value) -> Option<String> {
    let raw = feature
        .get("properties")?
        .get("wikidata")
        .filter(|value| !is_blank(value))?;
    let text = match raw {
        Value::String(text) => text.trim().to_owned(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Tracks progress through the features of every file in one load.
struct GeometryLoad<'a, S: ?Sized> {
    store: &'a mut S,
    index: TownlandIndex,
    source_srid: i32,
    batch_size: NonZeroUsize,
    report: GeometryLoadReport,
}

impl<S> GeometryLoad<'_, S>
where
    S: GazetteerStore + ?Sized,
{
    fn load_file(&mut self, path: &Utf8Path) -> Result<(), LoadError> {
        info!("file: {path}");
        let collection = read_feature_collection(path)?;
        for feature in &collection.features {
            self.report.features_total += 1;
            self.load_feature(path, feature)?;
        }
        Ok(())
    }

    fn load_feature(&mut self, path: &Utf8Path, feature: &Value) -> Result<(), LoadError> {
        let Some(osm_id) = feature_external_id(feature) else {
            self.report.features_skipped += 1;
            return Ok(());
        };
        let Some(&townland_id) = self.index.get(&osm_id) else {
            self.report.features_skipped += 1;
            return Ok(());
        };
        let geometry = feature
            .get("geometry")
            .filter(|geometry| !is_blank(geometry));
        let Some(geometry) = geometry else {
            warn!("feature {osm_id} in file {path} has no geometry; skipping");
            self.report.features_skipped += 1;
            return Ok(());
        };

        if let Some(wikidata) = wikidata_reference(feature) {
            self.store.set_townland_wikidata(townland_id, &wikidata)?;
        }

        let needs_repair = decode_geojson_geometry(geometry)
            .is_ok_and(|decoded| !is_valid_geometry(&decoded));
        let record = GeometryRecord {
            townland_id,
            geometry,
            source_srid: self.source_srid,
            feature,
        };
        match self.store.upsert_geometry(&record) {
            Ok(()) => {}
            Err(StoreError::GeometryRejected { reason }) => {
                error!("rejected geometry in file {path}: feature {osm_id}: {reason}");
                self.report.features_rejected += 1;
                return Ok(());
            }
            Err(other) => return Err(other.into()),
        }

        self.report.features_loaded += 1;
        if needs_repair {
            self.report.features_repaired += 1;
        }
        if self
            .report
            .features_loaded
            .is_multiple_of(self.batch_size.get())
        {
            self.store.commit()?;
            info!(
                "Loaded {}/{} features...",
                self.report.features_loaded, self.report.features_total
            );
        }
        Ok(())
    }
}

/// Load townland geometry from every feature collection in `folder`.
///
/// Features are matched to stored townlands through the signed external id
/// (see [`feature_external_id`]); unmatched features and features without
/// geometry are skipped. A non-blank `properties.wikidata` value is copied
/// onto the townland. Geometry is handed to the store in `source_srid` along
/// with the complete feature for provenance; features the store rejects are
/// logged and counted without stopping the load.
///
/// # Errors
///
/// Fails when the folder cannot be listed, a file cannot be opened or is not
/// valid JSON, or the store reports a backend failure.
pub fn load_geometry<S>(
    store: &mut S,
    folder: &Utf8Path,
    source_srid: i32,
    batch_size: NonZeroUsize,
) -> Result<GeometryLoadReport, LoadError>
where
    S: GazetteerStore + ?Sized,
{
    let index = store.townland_index()?;
    let files = feature_collection_files(folder)?;
    let mut load = GeometryLoad {
        store,
        index,
        source_srid,
        batch_size,
        report: GeometryLoadReport {
            files: files.len(),
            ..GeometryLoadReport::default()
        },
    };
    for path in &files {
        load.load_file(path)?;
    }
    load.store.commit()?;
    Ok(load.report)
}
