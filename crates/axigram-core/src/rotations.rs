//! Frame rotations between source-local, Earth-centred, and receiver-local
//! Cartesian frames, plus the reduction of a query point into the mesh's
//! cylindrical frame.
//!
//! Conventions:
//! - All angles are radians.
//! - A "local" frame at (lon, colat) has x pointing south (the θ direction),
//!   y east, z up; the Earth frame has z through the north pole and x through
//!   the equator at zero longitude.
//! - Symmetric tensors use the xyz Voigt order (xx, yy, zz, yz, xz, xy).
//!
//! Every function is a pure map on fixed-size arrays; no hidden state.

use ndarray::{Array2, ArrayView2};

/// 3×3 matrix type used throughout this module.
pub type Mat3 = [[f64; 3]; 3];

/// Rotation about z by `phi` (active, right-handed).
#[must_use]
fn rot_z(phi: f64) -> Mat3 {
    let (s, c) = phi.sin_cos();
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

/// Rotation about y by `theta` (active, right-handed).
#[must_use]
fn rot_y(theta: f64) -> Mat3 {
    let (s, c) = theta.sin_cos();
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

fn matmul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for (k, bk) in b.iter().enumerate() {
                out[i][j] += a[i][k] * bk[j];
            }
        }
    }
    out
}

fn transpose(a: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[j][i];
        }
    }
    out
}

fn matvec(a: &Mat3, v: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = a[i][0] * v[0] + a[i][1] * v[1] + a[i][2] * v[2];
    }
    out
}

/// Local frame at (lon, colat) expressed in the Earth frame.
fn local_to_earth(lon: f64, colat: f64) -> Mat3 {
    matmul(&rot_z(lon), &rot_y(colat))
}

fn voigt_to_mat(t: [f64; 6]) -> Mat3 {
    [[t[0], t[5], t[4]], [t[5], t[1], t[3]], [t[4], t[3], t[2]]]
}

fn mat_to_voigt(m: &Mat3) -> [f64; 6] {
    [m[0][0], m[1][1], m[2][2], m[1][2], m[0][2], m[0][1]]
}

fn rotate_voigt(t: [f64; 6], r: &Mat3) -> [f64; 6] {
    let m = voigt_to_mat(t);
    let rt = transpose(r);
    mat_to_voigt(&matmul(r, &matmul(&m, &rt)))
}

/// Reduce a Cartesian point `(x, y, z)` to the mesh cylindrical frame after
/// rotating the axis onto the epicentre at `(lon, colat)`.
///
/// Returns `(s, phi, z)`: cylindrical radius, azimuth in the rotated frame,
/// and coordinate along the rotated axis.
#[must_use]
pub fn rotate_frame_rd(x: f64, y: f64, z: f64, lon: f64, colat: f64) -> (f64, f64, f64) {
    let (sin_l, cos_l) = lon.sin_cos();
    let (sin_c, cos_c) = colat.sin_cos();
    // Undo the longitude, then the colatitude.
    let xp = x * cos_l + y * sin_l;
    let yp = -x * sin_l + y * cos_l;
    let xr = xp * cos_c - z * sin_c;
    let zr = xp * sin_c + z * cos_c;
    (xr.hypot(yp), yp.atan2(xr), zr)
}

/// Rotate a symmetric Voigt tensor from the source-local frame to the Earth
/// frame.
#[must_use]
pub fn rotate_symm_tensor_voigt_xyz_src_to_earth(t: [f64; 6], lon: f64, colat: f64) -> [f64; 6] {
    rotate_voigt(t, &local_to_earth(lon, colat))
}

/// Rotate a symmetric Voigt tensor from the Earth frame to the local frame at
/// (lon, colat).
#[must_use]
pub fn rotate_symm_tensor_voigt_xyz_earth_to_src(t: [f64; 6], lon: f64, colat: f64) -> [f64; 6] {
    rotate_voigt(t, &transpose(&local_to_earth(lon, colat)))
}

/// Rotate a symmetric Voigt tensor by `-phi` about z, aligning the x axis
/// with the mesh azimuth of the query point.
#[must_use]
pub fn rotate_symm_tensor_voigt_xyz_to_src(t: [f64; 6], phi: f64) -> [f64; 6] {
    rotate_voigt(t, &transpose(&rot_z(phi)))
}

/// Vector counterpart of [`rotate_symm_tensor_voigt_xyz_src_to_earth`].
#[must_use]
pub fn rotate_vector_xyz_src_to_earth(v: [f64; 3], lon: f64, colat: f64) -> [f64; 3] {
    matvec(&local_to_earth(lon, colat), v)
}

/// Vector counterpart of [`rotate_symm_tensor_voigt_xyz_earth_to_src`].
#[must_use]
pub fn rotate_vector_xyz_earth_to_src(v: [f64; 3], lon: f64, colat: f64) -> [f64; 3] {
    matvec(&transpose(&local_to_earth(lon, colat)), v)
}

/// Vector counterpart of [`rotate_symm_tensor_voigt_xyz_to_src`].
#[must_use]
pub fn rotate_vector_xyz_to_src(v: [f64; 3], phi: f64) -> [f64; 3] {
    matvec(&transpose(&rot_z(phi)), v)
}

/// Rotate a `[3, T]` block of cylindrical `(s, p, z)` samples at mesh azimuth
/// `phi` into receiver-local `(N, E, Z)` components.
///
/// The chain is: cylindrical → source-local Cartesian (rotation by `phi`
/// about the source axis) → Earth frame → receiver-local frame; north is the
/// negative θ direction.
#[must_use]
pub fn rotate_vector_src_to_nez(
    v: ArrayView2<'_, f64>,
    phi: f64,
    src_lon: f64,
    src_colat: f64,
    rec_lon: f64,
    rec_colat: f64,
) -> Array2<f64> {
    debug_assert_eq!(v.dim().0, 3);
    let chain = matmul(
        &transpose(&local_to_earth(rec_lon, rec_colat)),
        &matmul(&local_to_earth(src_lon, src_colat), &rot_z(phi)),
    );
    let nt = v.dim().1;
    let mut out = Array2::<f64>::zeros((3, nt));
    for t in 0..nt {
        let w = matvec(&chain, [v[[0, t]], v[[1, t]], v[[2, t]]]);
        out[[0, t]] = -w[0];
        out[[1, t]] = w[1];
        out[[2, t]] = w[2];
    }
    out
}
