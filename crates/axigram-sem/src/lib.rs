//! Spectral-element kernels for seismogram extraction from axisymmetric
//! wavefield databases.
//!
//! - [`basis`]: GLL/GLJ collocation nodes, Lagrange derivative matrices, and
//!   tensor-product interpolation of time-series fields.
//! - [`mapping`]: analytic reference↔physical maps for the four element
//!   families and the Newton point-in-element test.
//! - [`derivatives`]: nodal strain tensors per excitation symmetry.
//!
//! This crate is pure math over `ndarray`; all I/O and orchestration live in
//! `axigram-core`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all, clippy::unwrap_used, clippy::expect_used)]

pub mod basis;
pub mod derivatives;
pub mod mapping;

pub use basis::{
    gll_points, glj_points, lagrange_derivs_glj, lagrange_derivs_gll, lagrange_interp_2d,
};
pub use derivatives::{strain_td, Excitation};
pub use mapping::{inside_element, Corners, ElemKind};
