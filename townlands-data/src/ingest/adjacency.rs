//! Load of directed townland adjacency ("touch") rows.

use std::fmt;
use std::num::NonZeroUsize;

use camino::Utf8Path;
use log::info;
use townlands_core::{GazetteerStore, TouchEdge};

use super::scalar::{parse_float, parse_int};
use super::{CsvInput, LoadError};

/// Columns the adjacency CSV must carry.
pub const ADJACENCY_COLUMNS: [&str; 4] = ["t1_osm_id", "t2_osm_id", "direction", "length_m"];

/// Outcome of an adjacency load. `rows_read` always equals
/// `edges_written + rows_skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjacencyLoadReport {
    /// Data rows read from the CSV.
    pub rows_read: usize,
    /// Edges upserted.
    pub edges_written: usize,
    /// Rows dropped because an endpoint is not a stored townland.
    pub rows_skipped: usize,
}

impl fmt::Display for AdjacencyLoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Touch rows read: {}. Edges written: {}. Skipped (unknown townland): {}.",
            self.rows_read, self.edges_written, self.rows_skipped
        )
    }
}

/// Load directed adjacency rows from `csv_path`.
///
/// Endpoints are resolved through one bulk read of the townland index taken
/// before the file is opened. Each edge's compass bucket is derived from its
/// bearing. Edges are not mirrored.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumns`] when the header lacks any of
/// [`ADJACENCY_COLUMNS`], and propagates IO, CSV and store failures.
pub fn load_adjacency<S>(
    store: &mut S,
    csv_path: &Utf8Path,
    batch_size: NonZeroUsize,
) -> Result<AdjacencyLoadReport, LoadError>
where
    S: GazetteerStore + ?Sized,
{
    let index = store.townland_index()?;
    let mut input = CsvInput::open(csv_path, &ADJACENCY_COLUMNS)?;
    let mut report = AdjacencyLoadReport::default();

    while let Some(row) = input.next_row()? {
        report.rows_read += 1;
        let src = parse_int(row.field("t1_osm_id")).and_then(|osm_id| index.get(&osm_id));
        let dst = parse_int(row.field("t2_osm_id")).and_then(|osm_id| index.get(&osm_id));

        if let (Some(&src_id), Some(&dst_id)) = (src, dst) {
            let edge = TouchEdge::new(
                src_id,
                dst_id,
                parse_float(row.field("direction")),
                parse_float(row.field("length_m")),
            );
            store.upsert_touch(&edge)?;
            report.edges_written += 1;
        } else {
            report.rows_skipped += 1;
        }

        if report.rows_read.is_multiple_of(batch_size.get()) {
            store.commit()?;
            info!("Processed {} touch rows...", report.rows_read);
        }
    }
    store.commit()?;
    Ok(report)
}
