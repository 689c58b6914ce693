//! Strain tensors at every collocation point from nodal displacement, one
//! routine per excitation symmetry (azimuthal order m = 0, 1, 2).
//!
//! The displacement field of an axisymmetric database is the m-th azimuthal
//! Fourier coefficient of the 3-D wavefield; the φ-derivatives of the strain
//! therefore reduce to algebraic m·f/s terms. On elements touching the
//! symmetry axis, f/s at s = 0 is evaluated by L'Hôpital as ∂f/∂s, which the
//! GLJ derivative matrix provides exactly.
//!
//! Voigt order of the result: (ε_ss, ε_pp, ε_zz, ε_zp, ε_sz, ε_sp). The sign
//! flips on ε_zp and ε_sp for non-monopole excitations are applied by the
//! caller after interpolation, not here.

use ndarray::{Array2, Array3, Array4, ArrayView2, ArrayView3, ArrayView4, Axis};

use crate::mapping::{inv_jacobian_at, s_at_nodes, Corners, ElemKind};

/// Azimuthal symmetry of the stored wavefield, fixed per database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Excitation {
    /// m = 0; no transverse component.
    Monopole,
    /// m = 1.
    Dipole,
    /// m = 2.
    Quadpole,
}

impl Excitation {
    /// Parse the database's `excitation type` attribute.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "monopole" => Some(Self::Monopole),
            "dipole" => Some(Self::Dipole),
            "quadpole" => Some(Self::Quadpole),
            _ => None,
        }
    }

    /// Azimuthal order m.
    #[must_use]
    pub const fn order(self) -> usize {
        match self {
            Self::Monopole => 0,
            Self::Dipole => 1,
            Self::Quadpole => 2,
        }
    }
}

/// ∂f/∂s and ∂f/∂z of a scalar nodal time-series field `f[t, i, j]`.
///
/// `gt` is the ξ-direction operator in transposed layout
/// (`gt[[i, p]] = l_p'(ξ_i)`, i.e. `G2T` off-axis or `G1T` on-axis) and `g`
/// the η-direction operator (`g[[q, j]] = l_q'(η_j)`, always `G2`). The
/// reference-space gradient is pushed to physical space with the analytic
/// inverse Jacobian evaluated at each collocation point.
#[must_use]
pub fn axisym_gradient_td(
    f: ArrayView3<'_, f64>,
    gt: ArrayView2<'_, f64>,
    g: ArrayView2<'_, f64>,
    xi_nodes: &ndarray::Array1<f64>,
    eta_nodes: &ndarray::Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
) -> (Array3<f64>, Array3<f64>) {
    let (nt, ni, nj) = f.dim();
    let mut grad_s = Array3::<f64>::zeros((nt, ni, nj));
    let mut grad_z = Array3::<f64>::zeros((nt, ni, nj));

    for i in 0..ni {
        for j in 0..nj {
            let ji = inv_jacobian_at(xi_nodes[i], eta_nodes[j], corners, kind);
            for t in 0..nt {
                let mut df_dxi = 0.0;
                for p in 0..ni {
                    df_dxi += gt[[i, p]] * f[[t, p, j]];
                }
                let mut df_deta = 0.0;
                for q in 0..nj {
                    df_deta += f[[t, i, q]] * g[[q, j]];
                }
                grad_s[[t, i, j]] = df_dxi * ji[0][0] + df_deta * ji[1][0];
                grad_z[[t, i, j]] = df_dxi * ji[0][1] + df_deta * ji[1][1];
            }
        }
    }
    (grad_s, grad_z)
}

/// `f/s` at every collocation point; on the axis column (ξ index 0 of an
/// axial element, where s = 0) the value is replaced by the precomputed
/// s-gradient of `f` (L'Hôpital).
#[must_use]
pub fn f_over_s_td(
    f: ArrayView3<'_, f64>,
    grad_s: ArrayView3<'_, f64>,
    s_nodes: &Array2<f64>,
    axial: bool,
) -> Array3<f64> {
    let (nt, ni, nj) = f.dim();
    let mut out = Array3::<f64>::zeros((nt, ni, nj));
    for i in 0..ni {
        for j in 0..nj {
            let on_axis = axial && i == 0;
            for t in 0..nt {
                out[[t, i, j]] = if on_axis {
                    grad_s[[t, i, j]]
                } else {
                    f[[t, i, j]] / s_nodes[[i, j]]
                };
            }
        }
    }
    out
}

/// Strain of a monopole (m = 0) wavefield.
#[must_use]
pub fn strain_monopole_td(
    u: ArrayView4<'_, f64>,
    gt: ArrayView2<'_, f64>,
    g: ArrayView2<'_, f64>,
    xi_nodes: &ndarray::Array1<f64>,
    eta_nodes: &ndarray::Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
    axial: bool,
) -> Array4<f64> {
    strain_multipole_td(u, 0, gt, g, xi_nodes, eta_nodes, corners, kind, axial)
}

/// Strain of a dipole (m = 1) wavefield.
#[must_use]
pub fn strain_dipole_td(
    u: ArrayView4<'_, f64>,
    gt: ArrayView2<'_, f64>,
    g: ArrayView2<'_, f64>,
    xi_nodes: &ndarray::Array1<f64>,
    eta_nodes: &ndarray::Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
    axial: bool,
) -> Array4<f64> {
    strain_multipole_td(u, 1, gt, g, xi_nodes, eta_nodes, corners, kind, axial)
}

/// Strain of a quadpole (m = 2) wavefield.
#[must_use]
pub fn strain_quadpole_td(
    u: ArrayView4<'_, f64>,
    gt: ArrayView2<'_, f64>,
    g: ArrayView2<'_, f64>,
    xi_nodes: &ndarray::Array1<f64>,
    eta_nodes: &ndarray::Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
    axial: bool,
) -> Array4<f64> {
    strain_multipole_td(u, 2, gt, g, xi_nodes, eta_nodes, corners, kind, axial)
}

/// Dispatch on the excitation symmetry decided at database-open time.
#[must_use]
pub fn strain_td(
    u: ArrayView4<'_, f64>,
    excitation: Excitation,
    gt: ArrayView2<'_, f64>,
    g: ArrayView2<'_, f64>,
    xi_nodes: &ndarray::Array1<f64>,
    eta_nodes: &ndarray::Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
    axial: bool,
) -> Array4<f64> {
    match excitation {
        Excitation::Monopole => {
            strain_monopole_td(u, gt, g, xi_nodes, eta_nodes, corners, kind, axial)
        }
        Excitation::Dipole => {
            strain_dipole_td(u, gt, g, xi_nodes, eta_nodes, corners, kind, axial)
        }
        Excitation::Quadpole => {
            strain_quadpole_td(u, gt, g, xi_nodes, eta_nodes, corners, kind, axial)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn strain_multipole_td(
    u: ArrayView4<'_, f64>,
    m: usize,
    gt: ArrayView2<'_, f64>,
    g: ArrayView2<'_, f64>,
    xi_nodes: &ndarray::Array1<f64>,
    eta_nodes: &ndarray::Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
    axial: bool,
) -> Array4<f64> {
    let (nt, ni, nj, ncomp) = u.dim();
    debug_assert_eq!(ncomp, 3);
    let mf = m as f64;
    let s_nodes = s_at_nodes(xi_nodes, eta_nodes, corners, kind);

    let us = u.index_axis(Axis(3), 0);
    let up = u.index_axis(Axis(3), 1);
    let uz = u.index_axis(Axis(3), 2);

    let (gus_s, gus_z) = axisym_gradient_td(us, gt, g, xi_nodes, eta_nodes, corners, kind);
    let (guz_s, guz_z) = axisym_gradient_td(uz, gt, g, xi_nodes, eta_nodes, corners, kind);
    let gup = (m > 0).then(|| axisym_gradient_td(up, gt, g, xi_nodes, eta_nodes, corners, kind));

    let mut e = Array4::<f64>::zeros((nt, ni, nj, 6));

    // ε_pp = (u_s - m·u_p)/s.
    let (hoop, hoop_grad_s) = match &gup {
        Some((gup_s, _)) => (&us.to_owned() - &(&up.to_owned() * mf), &gus_s - &(gup_s * mf)),
        None => (us.to_owned(), gus_s.clone()),
    };
    let epp = f_over_s_td(hoop.view(), hoop_grad_s.view(), &s_nodes, axial);

    for t in 0..nt {
        for i in 0..ni {
            for j in 0..nj {
                e[[t, i, j, 0]] = gus_s[[t, i, j]];
                e[[t, i, j, 1]] = epp[[t, i, j]];
                e[[t, i, j, 2]] = guz_z[[t, i, j]];
                e[[t, i, j, 4]] = 0.5 * (gus_z[[t, i, j]] + guz_s[[t, i, j]]);
            }
        }
    }

    if let Some((gup_s, gup_z)) = &gup {
        // ε_zp = (∂_z u_p + m·u_z/s) / 2.
        let uz_over_s = f_over_s_td(uz, guz_s.view(), &s_nodes, axial);
        // ε_sp = (∂_s u_p + (m·u_s - u_p)/s) / 2.
        let twist = &(&us.to_owned() * mf) - &up.to_owned();
        let twist_grad_s = &(&gus_s * mf) - gup_s;
        let twist_over_s = f_over_s_td(twist.view(), twist_grad_s.view(), &s_nodes, axial);

        for t in 0..nt {
            for i in 0..ni {
                for j in 0..nj {
                    e[[t, i, j, 3]] = 0.5 * (gup_z[[t, i, j]] + mf * uz_over_s[[t, i, j]]);
                    e[[t, i, j, 5]] = 0.5 * (gup_s[[t, i, j]] + twist_over_s[[t, i, j]]);
                }
            }
        }
    }

    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{gll_points, glj_points, lagrange_derivs};
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    const N: usize = 4;

    fn shell_corners() -> Corners {
        let (r0, r1) = (5000.0, 6000.0);
        let (t0, t1) = (0.4f64, 0.7f64);
        [
            [r0 * t0.sin(), r0 * t0.cos()],
            [r0 * t1.sin(), r0 * t1.cos()],
            [r1 * t1.sin(), r1 * t1.cos()],
            [r1 * t0.sin(), r1 * t0.cos()],
        ]
    }

    fn axis_corners() -> Corners {
        let (r0, r1) = (5000.0, 6000.0);
        let t1 = 0.3f64;
        [
            [0.0, r0],
            [r0 * t1.sin(), r0 * t1.cos()],
            [r1 * t1.sin(), r1 * t1.cos()],
            [0.0, r1],
        ]
    }

    struct Setup {
        xi: Array1<f64>,
        eta: Array1<f64>,
        gt: ndarray::Array2<f64>,
        g: ndarray::Array2<f64>,
    }

    fn setup(axial: bool) -> Setup {
        let eta = gll_points(N);
        let xi = if axial { glj_points(N) } else { gll_points(N) };
        let g = lagrange_derivs(&eta);
        let gt = lagrange_derivs(&xi).t().to_owned();
        Setup { xi, eta, gt, g }
    }

    /// Fill a one-sample nodal field from closures of (s, z).
    fn nodal_field(
        su: &Setup,
        corners: &Corners,
        kind: ElemKind,
        fs: impl Fn(f64, f64) -> f64,
        fp: impl Fn(f64, f64) -> f64,
        fz: impl Fn(f64, f64) -> f64,
    ) -> Array4<f64> {
        let mut u = Array4::<f64>::zeros((1, N + 1, N + 1, 3));
        for i in 0..=N {
            for j in 0..=N {
                let (s, z) = crate::mapping::mapping(su.xi[i], su.eta[j], corners, kind);
                u[[0, i, j, 0]] = fs(s, z);
                u[[0, i, j, 1]] = fp(s, z);
                u[[0, i, j, 2]] = fz(s, z);
            }
        }
        u
    }

    #[test]
    fn rigid_translation_has_zero_strain() {
        let su = setup(false);
        let corners = shell_corners();
        let kind = ElemKind::Subpar;
        let u = nodal_field(&su, &corners, kind, |_, _| 0.0, |_, _| 0.0, |_, _| 3.5);
        let e = strain_monopole_td(
            u.view(), su.gt.view(), su.g.view(), &su.xi, &su.eta, &corners, kind, false,
        );
        for v in e.iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn monopole_linear_field_has_constant_strain() {
        let su = setup(false);
        let corners = shell_corners();
        let kind = ElemKind::Linear;
        // u_s = 2 s, u_z = 3 z: ε_ss = 2, ε_pp = 2, ε_zz = 3, ε_sz = 0.
        let u = nodal_field(&su, &corners, kind, |s, _| 2.0 * s, |_, _| 0.0, |_, z| 3.0 * z);
        let e = strain_monopole_td(
            u.view(), su.gt.view(), su.g.view(), &su.xi, &su.eta, &corners, kind, false,
        );
        for i in 0..=N {
            for j in 0..=N {
                assert_abs_diff_eq!(e[[0, i, j, 0]], 2.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 1]], 2.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 2]], 3.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 3]], 0.0, epsilon = 1e-10);
                assert_abs_diff_eq!(e[[0, i, j, 4]], 0.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 5]], 0.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn monopole_shear_field() {
        let su = setup(false);
        let corners = shell_corners();
        let kind = ElemKind::Linear;
        // u_s = 0.1 z: ε_sz = 0.05, ε_pp = 0.1 z / s.
        let u = nodal_field(&su, &corners, kind, |_, z| 0.1 * z, |_, _| 0.0, |_, _| 0.0);
        let e = strain_monopole_td(
            u.view(), su.gt.view(), su.g.view(), &su.xi, &su.eta, &corners, kind, false,
        );
        for i in 0..=N {
            for j in 0..=N {
                let (s, z) = crate::mapping::mapping(su.xi[i], su.eta[j], &corners, kind);
                assert_abs_diff_eq!(e[[0, i, j, 4]], 0.05, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 1]], 0.1 * z / s, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn dipole_transverse_field() {
        let su = setup(false);
        let corners = shell_corners();
        let kind = ElemKind::Linear;
        // u_p = s, m = 1: ε_pp = -1, ε_sp = (1 - 1)/2 = 0, ε_zp = 0.
        let u = nodal_field(&su, &corners, kind, |_, _| 0.0, |s, _| s, |_, _| 0.0);
        let e = strain_dipole_td(
            u.view(), su.gt.view(), su.g.view(), &su.xi, &su.eta, &corners, kind, false,
        );
        for i in 0..=N {
            for j in 0..=N {
                assert_abs_diff_eq!(e[[0, i, j, 1]], -1.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 3]], 0.0, epsilon = 1e-10);
                assert_abs_diff_eq!(e[[0, i, j, 5]], 0.0, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn quadpole_radial_field() {
        let su = setup(false);
        let corners = shell_corners();
        let kind = ElemKind::Linear;
        // u_s = s, m = 2: ε_ss = 1, ε_pp = 1, ε_sp = (0 + 2·s/s)/2 = 1.
        let u = nodal_field(&su, &corners, kind, |s, _| s, |_, _| 0.0, |_, _| 0.0);
        let e = strain_quadpole_td(
            u.view(), su.gt.view(), su.g.view(), &su.xi, &su.eta, &corners, kind, false,
        );
        for i in 0..=N {
            for j in 0..=N {
                assert_abs_diff_eq!(e[[0, i, j, 0]], 1.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 1]], 1.0, epsilon = 1e-8);
                assert_abs_diff_eq!(e[[0, i, j, 5]], 1.0, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn axial_element_hoop_strain_is_finite_on_axis() {
        let su = setup(true);
        let corners = axis_corners();
        let kind = ElemKind::Subpar;
        // u_s = s: ε_pp = s/s = 1, including at s = 0 by L'Hôpital.
        let u = nodal_field(&su, &corners, kind, |s, _| s, |_, _| 0.0, |_, _| 0.0);
        let e = strain_monopole_td(
            u.view(), su.gt.view(), su.g.view(), &su.xi, &su.eta, &corners, kind, true,
        );
        for i in 0..=N {
            for j in 0..=N {
                assert!(e[[0, i, j, 1]].is_finite());
                // The curved mapping makes s non-polynomial in ξ, so the
                // nodal interpolant carries a small truncation error.
                assert_abs_diff_eq!(e[[0, i, j, 1]], 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn excitation_names_parse() {
        assert_eq!(Excitation::from_name("monopole"), Some(Excitation::Monopole));
        assert_eq!(Excitation::from_name("dipole"), Some(Excitation::Dipole));
        assert_eq!(Excitation::from_name("quadpole"), Some(Excitation::Quadpole));
        assert_eq!(Excitation::from_name("octopole"), None);
        assert_eq!(Excitation::Dipole.order(), 1);
    }
}
