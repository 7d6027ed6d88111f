//! Error types emitted by the townlands CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.
//! Messages omit their sources; `main` prints the whole chain.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use townlands_core::StoreError;
use townlands_data::LoadError;
use townlands_data::postgis::PostgisError;

/// Exit status for failures detected before any data is written.
pub const EXIT_SETUP_FAILURE: u8 = 2;
/// Exit status for failures raised while a command is running.
pub const EXIT_RUN_FAILURE: u8 = 1;

/// Errors emitted by the townlands CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A batch size of zero was configured.
    #[error("{field} must be at least 1 (set --{field} or {env})")]
    InvalidBatchSize {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input folder does not exist or is not a directory.
    #[error("{field} path {path:?} does not exist or is not a directory")]
    MissingSourceFolder {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The schema file could not be read.
    #[error("failed to read schema file {path:?}")]
    ReadSchema {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the database connection failed.
    #[error("failed to open the gazetteer database")]
    Connect(#[source] PostgisError),
    /// The store rejected the schema script.
    #[error("failed to apply schema")]
    ApplySchema(#[source] StoreError),
    /// A load aborted.
    #[error("load failed")]
    Load(#[from] LoadError),
    /// Writing the summary line failed.
    #[error("failed to write command output")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// Problems found while preparing a command (configuration, inputs,
    /// connection) exit with [`EXIT_SETUP_FAILURE`]; anything raised once
    /// the command runs exits with [`EXIT_RUN_FAILURE`]. Argument errors
    /// defer to Clap.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ArgumentParsing(err) => {
                u8::try_from(err.exit_code()).unwrap_or(EXIT_SETUP_FAILURE)
            }
            Self::Configuration(_)
            | Self::MissingArgument { .. }
            | Self::InvalidBatchSize { .. }
            | Self::MissingSourceFile { .. }
            | Self::SourcePathNotFile { .. }
            | Self::MissingSourceFolder { .. }
            | Self::InspectSourcePath { .. }
            | Self::ReadSchema { .. }
            | Self::Connect(_) => EXIT_SETUP_FAILURE,
            Self::ApplySchema(_) | Self::Load(_) | Self::WriteOutput(_) => EXIT_RUN_FAILURE,
        }
    }
}
