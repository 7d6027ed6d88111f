//! Batch loaders that move gazetteer files into a [`GazetteerStore`].
//!
//! Each loader streams its input once, writes through the store's upsert
//! operations and commits every `batch_size` units of work, so an interrupted
//! run keeps its committed prefix and can simply be repeated.
//!
//! [`GazetteerStore`]: townlands_core::GazetteerStore

use std::collections::HashMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::File;
use csv::StringRecord;
use thiserror::Error;
use townlands_core::StoreError;

mod adjacency;
mod geometry;
mod hierarchy;
mod scalar;
mod townlands;

pub use adjacency::{ADJACENCY_COLUMNS, AdjacencyLoadReport, load_adjacency};
pub use geometry::{
    GeometryLoadReport, feature_collection_files, feature_external_id, load_geometry,
    osm_id_from_feature_id,
};
pub use hierarchy::{HierarchyCache, resolve_division};
pub use scalar::{clean_text, parse_float, parse_int, parse_timestamp};
pub use townlands::{TOWNLAND_COLUMNS, TownlandLoadReport, load_townlands};

/// Errors that abort a load.
///
/// Row-level problems (unparsable cells, unknown townlands, rejected
/// geometry) never surface here; they are counted in the load reports.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file could not be opened.
    #[error("failed to open {path}")]
    Open {
        /// Path that was requested.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A CSV header or row could not be read.
    #[error("failed to read CSV data from {path}")]
    ReadRow {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// The CSV header lacks columns the loader depends on.
    #[error("{path} is missing expected columns: {}", missing.join(", "))]
    MissingColumns {
        /// File being read.
        path: Utf8PathBuf,
        /// Required columns that were not found, in canonical order.
        missing: Vec<String>,
    },
    /// The feature folder could not be listed.
    #[error("failed to list feature collections in {path}")]
    ReadFolder {
        /// Folder that was requested.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A feature-collection file is not valid JSON.
    #[error("failed to parse feature collection {path}")]
    ParseFeatureCollection {
        /// Offending file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The store failed while the load was running.
    #[error("store failure during load")]
    Store {
        /// Underlying store error.
        #[from]
        source: StoreError,
    },
}

/// A CSV reader whose header has been checked for the required columns.
struct CsvInput {
    path: Utf8PathBuf,
    reader: csv::Reader<File>,
    columns: HashMap<String, usize>,
}

impl CsvInput {
    fn open(path: &Utf8Path, required: &[&str]) -> Result<Self, LoadError> {
        let file = townlands_fs::open_utf8_file(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader.headers().map_err(|source| LoadError::ReadRow {
            path: path.to_path_buf(),
            source,
        })?;
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.trim_start_matches('\u{feff}').to_owned(), index))
            .collect();
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !columns.contains_key(**name))
            .map(|name| (*name).to_owned())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            columns,
        })
    }

    /// Read the next row, or `None` at end of input.
    fn next_row(&mut self) -> Result<Option<CsvRow<'_>>, LoadError> {
        let mut record = StringRecord::new();
        let more = self
            .reader
            .read_record(&mut record)
            .map_err(|source| LoadError::ReadRow {
                path: self.path.clone(),
                source,
            })?;
        Ok(more.then_some(CsvRow {
            record,
            columns: &self.columns,
        }))
    }
}

/// One CSV row addressed by column name.
struct CsvRow<'a> {
    record: StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl CsvRow<'_> {
    /// Raw cell for `column`; short rows yield `None` for trailing cells.
    fn field(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|index| self.record.get(*index))
    }
}
