//! Typed error surface of the extraction engine.
//!
//! Session-construction failures (`NotFound`, `BadDatabaseLayout`,
//! `UnsupportedVersion`, `MalformedDatabase`) are fatal; per-request failures
//! (`ElementNotFound`, `InvalidArgument`, `UnsupportedDump`,
//! `UnsupportedMode`) abort the single query and leave the session usable.
//! Underlying I/O and netCDF errors are surfaced verbatim as sources.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong opening a database or extracting a
/// seismogram.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No `ordered_output.nc4` files below the given root.
    #[error("no wavefield database found under '{path}'")]
    NotFound {
        /// The scanned root directory.
        path: PathBuf,
    },

    /// Wrong file cardinality or missing mesh components.
    #[error("bad database layout: {0}")]
    BadDatabaseLayout(String),

    /// File format version below the supported floor.
    #[error("file format version {found} is older than the supported floor {floor}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: i64,
        /// Minimum supported version.
        floor: i64,
    },

    /// Operation not available for this database's dump type.
    #[error("unsupported for dump type '{dump}': {what}")]
    UnsupportedDump {
        /// Dump type of the database.
        dump: String,
        /// The rejected operation.
        what: String,
    },

    /// Operation not available in this database's reciprocity mode.
    #[error("unsupported in this database mode: {0}")]
    UnsupportedMode(String),

    /// No candidate element contained the rotated query point.
    #[error("no mesh element contains the query point (s = {s:.6e}, z = {z:.6e})")]
    ElementNotFound {
        /// Rotated cylindrical radius of the query.
        s: f64,
        /// Rotated vertical coordinate of the query.
        z: f64,
    },

    /// Malformed request (unknown component letter, wrong tensor shape, …).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Required attribute/variable/group missing or of an unexpected type.
    #[error("malformed database file: {0}")]
    MalformedDatabase(String),

    /// netCDF library failure, surfaced verbatim.
    #[error("netCDF error")]
    Nc(#[from] netcdf::Error),

    /// Filesystem failure, surfaced verbatim.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ExtractError>;
