//! `load-normalized`, `load-touch` and `load-geometry` commands.

use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use townlands_core::WGS84_SRID;

use crate::{
    ARG_BATCH, ARG_CSV, ARG_FOLDER, ARG_SOURCE_SRID, CliError, ENV_LOAD_GEOMETRY_BATCH,
    ENV_LOAD_GEOMETRY_FOLDER, ENV_LOAD_NORMALIZED_BATCH, ENV_LOAD_NORMALIZED_CSV,
    ENV_LOAD_TOUCH_BATCH, ENV_LOAD_TOUCH_CSV,
};

/// Rows per commit for the normalised townland load.
pub(crate) const DEFAULT_TOWNLAND_BATCH: usize = 1000;
/// Rows per commit for the adjacency load.
pub(crate) const DEFAULT_TOUCH_BATCH: usize = 500;
/// Features per commit for the geometry load.
pub(crate) const DEFAULT_GEOMETRY_BATCH: usize = 200;
/// Coordinate reference system assumed for feature collections.
pub(crate) const DEFAULT_SOURCE_SRID: i32 = WGS84_SRID;

/// CLI arguments for the `load-normalized` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load the townland CSV export, creating or updating every \
                 county, barony, civil parish and electoral division it \
                 references. Re-running with the same file is idempotent.",
    about = "Load townlands and their administrative hierarchy"
)]
#[ortho_config(prefix = "TOWNLANDS")]
pub(crate) struct LoadNormalizedArgs {
    /// Path to the townland CSV export.
    #[arg(long = ARG_CSV, value_name = "path")]
    #[serde(default)]
    pub(crate) csv: Option<Utf8PathBuf>,
    /// Commit after this many rows (default 1000).
    #[arg(long = ARG_BATCH, value_name = "n")]
    #[serde(default)]
    pub(crate) batch: Option<usize>,
}

impl LoadNormalizedArgs {
    pub(crate) fn into_config(self) -> Result<CsvLoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CsvLoadConfig::try_from(merged)
    }
}

/// CLI arguments for the `load-touch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load directed adjacency edges between townlands that are \
                 already stored. Rows naming an unknown townland are skipped.",
    about = "Load townland adjacency"
)]
#[ortho_config(prefix = "TOWNLANDS")]
pub(crate) struct LoadTouchArgs {
    /// Path to a CSV with headers t1_osm_id,t2_osm_id,direction,length_m.
    #[arg(long = ARG_CSV, value_name = "path")]
    #[serde(default)]
    pub(crate) csv: Option<Utf8PathBuf>,
    /// Commit after this many rows (default 500).
    #[arg(long = ARG_BATCH, value_name = "n")]
    #[serde(default)]
    pub(crate) batch: Option<usize>,
}

impl LoadTouchArgs {
    pub(crate) fn into_config(self) -> Result<CsvLoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CsvLoadConfig::try_from(merged)
    }
}

/// CLI arguments for the `load-geometry` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load townland boundaries from a folder of GeoJSON feature \
                 collections (*.geojson, then *.json). Geometry is \
                 reprojected to the Irish Transverse Mercator grid and \
                 repaired when invalid.",
    about = "Load townland boundaries"
)]
#[ortho_config(prefix = "TOWNLANDS")]
pub(crate) struct LoadGeometryArgs {
    /// Folder containing one feature collection per county.
    #[arg(long = ARG_FOLDER, value_name = "dir")]
    #[serde(default)]
    pub(crate) folder: Option<Utf8PathBuf>,
    /// SRID of the input coordinates (default 4326).
    #[arg(long = ARG_SOURCE_SRID, value_name = "srid", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) source_srid: Option<i32>,
    /// Commit after this many features (default 200).
    #[arg(long = ARG_BATCH, value_name = "n")]
    #[serde(default)]
    pub(crate) batch: Option<usize>,
}

impl LoadGeometryArgs {
    pub(crate) fn into_config(self) -> Result<GeometryLoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeometryLoadConfig::try_from(merged)
    }
}

/// Resolved configuration shared by the two CSV loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CsvLoadConfig {
    pub(crate) csv: Utf8PathBuf,
    pub(crate) batch: NonZeroUsize,
}

impl CsvLoadConfig {
    fn resolve(
        csv: Option<Utf8PathBuf>,
        batch: Option<usize>,
        default_batch: usize,
        env: (&'static str, &'static str),
    ) -> Result<Self, CliError> {
        let (csv_env, batch_env) = env;
        let csv = csv.ok_or(CliError::MissingArgument {
            field: ARG_CSV,
            env: csv_env,
        })?;
        let batch = batch_size(batch, default_batch, batch_env)?;
        Ok(Self { csv, batch })
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_file(&self.csv, ARG_CSV)
    }
}

impl TryFrom<LoadNormalizedArgs> for CsvLoadConfig {
    type Error = CliError;

    fn try_from(args: LoadNormalizedArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.csv,
            args.batch,
            DEFAULT_TOWNLAND_BATCH,
            (ENV_LOAD_NORMALIZED_CSV, ENV_LOAD_NORMALIZED_BATCH),
        )
    }
}

impl TryFrom<LoadTouchArgs> for CsvLoadConfig {
    type Error = CliError;

    fn try_from(args: LoadTouchArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.csv,
            args.batch,
            DEFAULT_TOUCH_BATCH,
            (ENV_LOAD_TOUCH_CSV, ENV_LOAD_TOUCH_BATCH),
        )
    }
}

/// Resolved `load-geometry` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeometryLoadConfig {
    pub(crate) folder: Utf8PathBuf,
    pub(crate) source_srid: i32,
    pub(crate) batch: NonZeroUsize,
}

impl GeometryLoadConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match townlands_fs::dir_is_dir(&self.folder) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::MissingSourceFolder {
                field: ARG_FOLDER,
                path: self.folder.clone(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_FOLDER,
                path: self.folder.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<LoadGeometryArgs> for GeometryLoadConfig {
    type Error = CliError;

    fn try_from(args: LoadGeometryArgs) -> Result<Self, Self::Error> {
        let folder = args.folder.ok_or(CliError::MissingArgument {
            field: ARG_FOLDER,
            env: ENV_LOAD_GEOMETRY_FOLDER,
        })?;
        let batch = batch_size(args.batch, DEFAULT_GEOMETRY_BATCH, ENV_LOAD_GEOMETRY_BATCH)?;
        Ok(Self {
            folder,
            source_srid: args.source_srid.unwrap_or(DEFAULT_SOURCE_SRID),
            batch,
        })
    }
}

fn batch_size(
    configured: Option<usize>,
    default: usize,
    env: &'static str,
) -> Result<NonZeroUsize, CliError> {
    NonZeroUsize::new(configured.unwrap_or(default)).ok_or(CliError::InvalidBatchSize {
        field: ARG_BATCH,
        env,
    })
}

fn require_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match townlands_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
pub(crate) fn townland_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<CsvLoadConfig, CliError> {
    let merged = LoadNormalizedArgs::merge_from_layers(layers).map_err(CliError::from)?;
    CsvLoadConfig::try_from(merged)
}

#[cfg(test)]
pub(crate) fn geometry_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<GeometryLoadConfig, CliError> {
    let merged = LoadGeometryArgs::merge_from_layers(layers).map_err(CliError::from)?;
    GeometryLoadConfig::try_from(merged)
}
