//! Nodal bases on [-1, 1]: Gauss–Lobatto–Legendre and Gauss–Lobatto–Jacobi
//! collocation points, Lagrange derivative matrices, and tensor-product
//! interpolation of time-series fields.
//!
//! Design notes:
//! - Interior nodes are roots of a Jacobi polynomial (GLL: P'_n ∝ P_{n-1}^{(1,1)},
//!   GLJ(0,1): the axial basis used on elements touching the symmetry axis).
//!   Roots are bracketed by a sign scan and polished by bisection, which is
//!   deterministic and immune to Newton escaping the interval.
//! - Derivative matrices and point evaluation use barycentric weights, so the
//!   same code serves both node families.
//! - Evaluation stays stable slightly outside the element (|x| ≤ 1 + 1e-3),
//!   which the inverse mapping tolerance requires.

use ndarray::{Array1, Array2, ArrayView3};

/// Evaluate the Jacobi polynomial `P_n^{(a,b)}` at `x` via the three-term
/// recurrence.
#[must_use]
pub fn jacobi(n: usize, a: f64, b: f64, x: f64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let mut p_prev = 1.0;
    let mut p = (a + 1.0) + (a + b + 2.0) * (x - 1.0) / 2.0;
    for k in 2..=n {
        let k = k as f64;
        let c0 = 2.0 * k * (k + a + b) * (2.0 * k + a + b - 2.0);
        let c1 = (2.0 * k + a + b - 1.0)
            * ((2.0 * k + a + b) * (2.0 * k + a + b - 2.0) * x + a * a - b * b);
        let c2 = 2.0 * (k + a - 1.0) * (k + b - 1.0) * (2.0 * k + a + b);
        let p_next = (c1 * p - c2 * p_prev) / c0;
        p_prev = p;
        p = p_next;
    }
    p
}

/// All `n` roots of `P_n^{(a,b)}` in ascending order.
///
/// Roots of Jacobi polynomials are simple and interior to (-1, 1), so a sign
/// scan over a fine grid brackets every one of them.
fn jacobi_roots(n: usize, a: f64, b: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let samples = (40 * n).max(400);
    let mut roots = Vec::with_capacity(n);
    let grid = |i: usize| -1.0 + 2.0 * (i as f64) / (samples as f64);

    let mut x_lo = grid(0);
    let mut f_lo = jacobi(n, a, b, x_lo);
    for i in 1..=samples {
        let x_hi = grid(i);
        let f_hi = jacobi(n, a, b, x_hi);
        if f_lo == 0.0 {
            roots.push(x_lo);
        } else if f_lo * f_hi < 0.0 {
            roots.push(bisect(|x| jacobi(n, a, b, x), x_lo, x_hi, f_lo));
        }
        x_lo = x_hi;
        f_lo = f_hi;
    }
    debug_assert_eq!(roots.len(), n, "jacobi root scan missed a bracket");
    roots
}

/// Bisection to f64 resolution inside a sign-change bracket.
fn bisect(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64, f_lo: f64) -> f64 {
    let mut f_lo = f_lo;
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = f(mid);
        if f_lo * f_mid <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }
    0.5 * (lo + hi)
}

/// The `n + 1` Gauss–Lobatto–Legendre points on [-1, 1] for polynomial
/// degree `n`: both endpoints plus the roots of `P'_n`.
///
/// # Panics
/// Panics if `n == 0`.
#[must_use]
pub fn gll_points(n: usize) -> Array1<f64> {
    assert!(n >= 1, "spatial order must be at least 1");
    let mut pts = Vec::with_capacity(n + 1);
    pts.push(-1.0);
    // P'_n has the same roots as P_{n-1}^{(1,1)}.
    pts.extend(jacobi_roots(n - 1, 1.0, 1.0));
    pts.push(1.0);
    // Symmetrize: GLL nodes come in ± pairs; averaging kills scan noise.
    let m = pts.len();
    for i in 0..m / 2 {
        let v = 0.5 * (pts[m - 1 - i] - pts[i]);
        pts[i] = -v;
        pts[m - 1 - i] = v;
    }
    if m % 2 == 1 {
        pts[m / 2] = 0.0;
    }
    Array1::from(pts)
}

/// The `n + 1` Gauss–Lobatto–Jacobi (α=0, β=1) points on [-1, 1], used in
/// the ξ direction of elements touching the symmetry axis (ξ = -1 sits on
/// the axis).
///
/// # Panics
/// Panics if `n == 0`.
#[must_use]
pub fn glj_points(n: usize) -> Array1<f64> {
    assert!(n >= 1, "spatial order must be at least 1");
    let mut pts = Vec::with_capacity(n + 1);
    pts.push(-1.0);
    // d/dx P_n^{(0,1)} ∝ P_{n-1}^{(1,2)}.
    pts.extend(jacobi_roots(n - 1, 1.0, 2.0));
    pts.push(1.0);
    Array1::from(pts)
}

/// Barycentric weights `w_i = 1 / Π_{j≠i} (x_i - x_j)` for a node set.
#[must_use]
pub fn barycentric_weights(nodes: &Array1<f64>) -> Array1<f64> {
    let n = nodes.len();
    let mut w = Array1::<f64>::ones(n);
    for i in 0..n {
        for j in 0..n {
            if i != j {
                w[i] /= nodes[i] - nodes[j];
            }
        }
    }
    w
}

/// Dense derivative matrix `G[[i, j]] = l_i'(x_j)` for the Lagrange cardinal
/// polynomials on `nodes`.
#[must_use]
pub fn lagrange_derivs(nodes: &Array1<f64>) -> Array2<f64> {
    let n = nodes.len();
    let w = barycentric_weights(nodes);
    let mut g = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        for i in 0..n {
            if i != j {
                g[[i, j]] = (w[i] / w[j]) / (nodes[j] - nodes[i]);
            }
        }
        // Cardinal polynomials sum to one, so every column of G sums to zero.
        let mut diag = 0.0;
        for i in 0..n {
            if i != j {
                diag -= g[[i, j]];
            }
        }
        g[[j, j]] = diag;
    }
    g
}

/// Derivative matrix `G2` on the GLL nodes of degree `n`.
#[must_use]
pub fn lagrange_derivs_gll(n: usize) -> Array2<f64> {
    lagrange_derivs(&gll_points(n))
}

/// Derivative data on the GLJ nodes of degree `n`: `G0` is the derivative
/// column at the axis node (`G0[i] = l_i'(-1)`, the L'Hôpital weights for
/// `f/s` on the axis) and `G1` the full matrix.
#[must_use]
pub fn lagrange_derivs_glj(n: usize) -> (Array1<f64>, Array2<f64>) {
    let g1 = lagrange_derivs(&glj_points(n));
    let g0 = g1.column(0).to_owned();
    (g0, g1)
}

/// Values of all cardinal polynomials at `x`, by the barycentric formula.
///
/// Exact (a unit vector) when `x` coincides with a node; otherwise stable for
/// `x` slightly outside [-1, 1] as needed by the inverse-mapping tolerance.
#[must_use]
pub fn lagrange_eval(nodes: &Array1<f64>, x: f64) -> Array1<f64> {
    let n = nodes.len();
    let w = barycentric_weights(nodes);
    let mut out = Array1::<f64>::zeros(n);
    for i in 0..n {
        let d = x - nodes[i];
        if d.abs() < 1e-14 {
            out.fill(0.0);
            out[i] = 1.0;
            return out;
        }
        out[i] = w[i] / d;
    }
    let denom: f64 = out.sum();
    out.mapv_inplace(|v| v / denom);
    out
}

/// Tensor-product Lagrange interpolation of a time-series field.
///
/// `field` has shape `[T, n+1, n+1]` indexed `[t, i, j]` with `i` the ξ index
/// on `xi_nodes` and `j` the η index on `eta_nodes`. The cardinal values at
/// `(xi, eta)` are evaluated once and contracted over every time sample.
#[must_use]
pub fn lagrange_interp_2d(
    xi_nodes: &Array1<f64>,
    eta_nodes: &Array1<f64>,
    field: ArrayView3<'_, f64>,
    xi: f64,
    eta: f64,
) -> Array1<f64> {
    let a = lagrange_eval(xi_nodes, xi);
    let b = lagrange_eval(eta_nodes, eta);
    let (nt, ni, nj) = field.dim();
    debug_assert_eq!(ni, a.len());
    debug_assert_eq!(nj, b.len());

    let mut out = Array1::<f64>::zeros(nt);
    for i in 0..ni {
        if a[i] == 0.0 {
            continue;
        }
        for j in 0..nj {
            let wij = a[i] * b[j];
            if wij == 0.0 {
                continue;
            }
            for t in 0..nt {
                out[t] += wij * field[[t, i, j]];
            }
        }
    }
    out
}
