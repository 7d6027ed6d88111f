//! `schema-apply` command.

use std::fmt;
use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use townlands_data::postgis::BUNDLED_SCHEMA;
use townlands_fs::open_utf8_file;

use crate::{ARG_SCHEMA, CliError};

/// CLI arguments for the `schema-apply` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Create the gazetteer tables, indexes and the PostGIS \
                 extension if they do not already exist. The schema bundled \
                 with this binary is used unless another script is given.",
    about = "Create or update the database schema"
)]
#[ortho_config(prefix = "TOWNLANDS")]
pub(crate) struct SchemaApplyArgs {
    /// Path to a schema script replacing the bundled one.
    #[arg(long = ARG_SCHEMA, value_name = "path")]
    #[serde(default)]
    pub(crate) schema: Option<Utf8PathBuf>,
}

impl SchemaApplyArgs {
    pub(crate) fn into_config(self) -> Result<SchemaConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SchemaConfig::try_from(merged)
    }
}

/// Where the schema script came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaSource {
    Bundled,
    File(Utf8PathBuf),
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("the bundled schema"),
            Self::File(path) => write!(f, "{path}"),
        }
    }
}

/// Resolved `schema-apply` configuration with the script already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SchemaConfig {
    pub(crate) source: SchemaSource,
    pub(crate) sql: String,
}

impl TryFrom<SchemaApplyArgs> for SchemaConfig {
    type Error = CliError;

    fn try_from(args: SchemaApplyArgs) -> Result<Self, Self::Error> {
        match args.schema {
            None => Ok(Self {
                source: SchemaSource::Bundled,
                sql: BUNDLED_SCHEMA.to_owned(),
            }),
            Some(path) => {
                let sql = read_schema(&path)?;
                Ok(Self {
                    source: SchemaSource::File(path),
                    sql,
                })
            }
        }
    }
}

/// Read a schema script from disk.
pub(crate) fn read_schema(path: &Utf8Path) -> Result<String, CliError> {
    let read_error = |source: std::io::Error| CliError::ReadSchema {
        path: path.to_path_buf(),
        source,
    };
    let mut file = open_utf8_file(path).map_err(read_error)?;
    let mut sql = String::new();
    file.read_to_string(&mut sql).map_err(read_error)?;
    Ok(sql)
}

#[cfg(test)]
pub(crate) fn schema_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SchemaConfig, CliError> {
    let merged = SchemaApplyArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SchemaConfig::try_from(merged)
}
