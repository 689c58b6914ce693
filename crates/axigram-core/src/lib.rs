//! Seismogram extraction from precomputed axisymmetric spectral-element
//! wavefield databases.
//!
//! A [`DatabaseSession`] opens the netCDF files below a directory, indexes
//! the 2-D mesh, and reconstructs 3-D seismograms for arbitrary
//! source/receiver geometries: element location (kd-tree + Newton inverse
//! mapping), strain/displacement reconstruction, tensor contraction, and the
//! frame-rotation chain between source-, Earth- and receiver-centred frames.
//!
//! Sessions are single-threaded; run one session per worker thread for
//! parallel extraction. Reconstructed per-element fields are kept in
//! byte-bounded buffers shared across queries of one session.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::unwrap_used, clippy::expect_used)]

pub mod buffer;
pub mod discover;
pub mod engine;
pub mod error;
pub mod info;
pub mod mesh;
pub mod rotations;
pub mod source;

pub use discover::{find_databases, MeshTag};
pub use engine::{Component, DatabaseSession, DEFAULT_BUFFER_MB};
pub use error::{ExtractError, Result};
pub use info::Info;
pub use mesh::{DumpType, Mesh, MIN_FILE_VERSION};
pub use source::{ForceSource, Receiver, Source, SourceMechanism};

// The spectral kernels are part of the public contract.
pub use axigram_sem as sem;
