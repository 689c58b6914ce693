//! Immutable descriptor of an open database session.

use ndarray::Array1;
use serde::Serialize;

use crate::mesh::DumpType;

/// Everything a caller can know about a database without querying it.
///
/// Produced by `DatabaseSession::info`; all values come from the canonical
/// mesh's metadata.
#[derive(Clone, Debug, Serialize)]
pub struct Info {
    /// Whether the database stores reciprocal Green's functions.
    pub is_reciprocal: bool,
    /// Human-readable component availability.
    pub components: String,
    /// Source depth in kilometres (forward databases only).
    pub source_depth: Option<f64>,
    /// Background velocity model name.
    pub velocity_model: String,
    /// Attenuation flag of the forward run.
    pub attenuation: bool,
    /// Dominant source period in seconds.
    pub period: f64,
    /// Dump kind of the database.
    pub dump_type: DumpType,
    /// Excitation symmetry name.
    pub excitation_type: String,
    /// Sampling interval in seconds.
    pub dt: f64,
    /// Samples per second.
    pub sampling_rate: f64,
    /// Samples per trace.
    pub npts: usize,
    /// FFT length downstream consumers should use (2 · next power of two).
    pub nfft: usize,
    /// Trace duration in seconds, `dt · (npts - 1)`.
    pub length: f64,
    /// Source time function kind.
    pub stf: String,
    /// Amplitude normalization kind (the solver's `source type`).
    pub amplitude_kind: String,
    /// Source shift in seconds.
    pub src_shift: f64,
    /// Source shift in samples.
    pub src_shift_samples: i64,
    /// Normalized source time function (length `npts`).
    pub slip: Vec<f64>,
    /// Normalized source time function derivative (length `npts`).
    pub sliprate: Vec<f64>,
    /// Polynomial order of the spectral elements.
    pub spatial_order: usize,
    /// Minimum radius of the kernel wavefield in metres.
    pub min_radius: f64,
    /// Maximum radius of the kernel wavefield in metres.
    pub max_radius: f64,
    /// Planet radius in metres.
    pub planet_radius: f64,
    /// Minimum colatitude of the kernel wavefield in degrees.
    pub min_d: f64,
    /// Maximum colatitude of the kernel wavefield in degrees.
    pub max_d: f64,
    /// Time scheme of the forward solver.
    pub time_scheme: String,
    /// Directory the session was opened from.
    pub directory: String,
    /// Total byte size of the database files.
    pub filesize: u64,
    /// Compiler provenance of the forward run.
    pub compiler: String,
    /// User/host provenance of the forward run.
    pub user: String,
    /// File format version.
    pub format_version: i64,
    /// Forward solver revision.
    pub solver_revision: String,
}

/// Normalize a sampled function so its trapezoid integral is one.
///
/// Returns the input unchanged when the integral vanishes.
#[must_use]
pub(crate) fn normalized_by_trapezoid(y: &Array1<f64>, dx: f64) -> Vec<f64> {
    let n = y.len();
    if n < 2 {
        return y.to_vec();
    }
    let integral = dx * (y.sum() - 0.5 * (y[0] + y[n - 1]));
    if integral.abs() < f64::MIN_POSITIVE {
        return y.to_vec();
    }
    y.iter().map(|v| v / integral).collect()
}
