//! Error types emitted by the stopline CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use stopline_core::{EditError, RouteStoreError, SequenceError};
use stopline_data::remote::StoreBuildError;
use thiserror::Error;

/// Errors emitted by the stopline CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// Opening the sequence file failed.
    #[error("failed to open sequence at {path:?}: {source}")]
    OpenSequence {
        /// Sequence file.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Sequence JSON could not be decoded.
    #[error("failed to parse sequence JSON at {path:?}: {source}")]
    ParseSequence {
        /// Sequence file.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The sequence breaks a structural or precedence invariant.
    #[error("sequence in {path:?} is invalid: {source}")]
    InvalidSequence {
        /// Sequence file.
        path: Utf8PathBuf,
        /// First violation found.
        #[source]
        source: SequenceError,
    },
    /// Constructing the HTTP route store failed.
    #[error("failed to build route store for {base_url:?}: {source}")]
    BuildRouteStore {
        /// Configured service URL.
        base_url: String,
        /// Builder failure.
        #[source]
        source: StoreBuildError,
    },
    /// The engine refused the edit; the sequence is unchanged.
    #[error("{action} was rejected: the result would break the stop order")]
    EditRejected {
        /// Subcommand that was refused.
        action: &'static str,
    },
    /// The editor rejected the request outright.
    #[error(transparent)]
    Edit(EditError),
    /// The edit was applied but the route service did not accept it.
    #[error("edit applied but not persisted: {0}")]
    Persist(#[source] RouteStoreError),
    /// Serialising the command output failed.
    #[error("failed to serialise command output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
