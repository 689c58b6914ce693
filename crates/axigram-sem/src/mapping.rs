//! Analytic reference↔physical mappings for the four axisymmetric element
//! families, their Jacobians, and the Newton point-in-element test.
//!
//! Elements are quadrilaterals in the (s, z) half-plane with corners ordered
//! counterclockwise: corners 0→1 trace the η = -1 edge, corners 3→2 the
//! η = +1 edge. Curved edges are arcs of circles centred on the coordinate
//! origin, parameterised by a linear blend of radius and colatitude
//! `θ = atan2(s, z)` between the two corner values.

use ndarray::Array1;

/// Reference-element family of a mesh element.
///
/// Decoded from the small integer codes stored in the database mesh group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElemKind {
    /// Straight edges; plain bilinear map of the four corners.
    Linear,
    /// Both the η = -1 and η = +1 edges are arcs.
    Subpar,
    /// Only the η = +1 edge is an arc.
    Semino,
    /// Only the η = -1 edge is an arc.
    Semiso,
}

impl ElemKind {
    /// Decode a stored element-type code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Linear),
            1 => Some(Self::Subpar),
            2 => Some(Self::Semino),
            3 => Some(Self::Semiso),
            _ => None,
        }
    }

    const fn curved_bottom(self) -> bool {
        matches!(self, Self::Subpar | Self::Semiso)
    }

    const fn curved_top(self) -> bool {
        matches!(self, Self::Subpar | Self::Semino)
    }
}

/// Physical corner coordinates, `corners[c] = [s, z]`.
pub type Corners = [[f64; 2]; 4];

/// Point and ξ-tangent of one element edge at parameter `xi`.
fn edge_at(p: [f64; 2], q: [f64; 2], xi: f64, curved: bool) -> ([f64; 2], [f64; 2]) {
    if curved {
        let rp = p[0].hypot(p[1]);
        let rq = q[0].hypot(q[1]);
        let tp = p[0].atan2(p[1]);
        let tq = q[0].atan2(q[1]);
        let r = 0.5 * ((1.0 - xi) * rp + (1.0 + xi) * rq);
        let t = 0.5 * ((1.0 - xi) * tp + (1.0 + xi) * tq);
        let dr = 0.5 * (rq - rp);
        let dt = 0.5 * (tq - tp);
        let (sin_t, cos_t) = t.sin_cos();
        (
            [r * sin_t, r * cos_t],
            [dr * sin_t + r * cos_t * dt, dr * cos_t - r * sin_t * dt],
        )
    } else {
        (
            [
                0.5 * ((1.0 - xi) * p[0] + (1.0 + xi) * q[0]),
                0.5 * ((1.0 - xi) * p[1] + (1.0 + xi) * q[1]),
            ],
            [0.5 * (q[0] - p[0]), 0.5 * (q[1] - p[1])],
        )
    }
}

/// Forward map: reference `(xi, eta)` to physical `(s, z)`.
#[must_use]
pub fn mapping(xi: f64, eta: f64, corners: &Corners, kind: ElemKind) -> (f64, f64) {
    let (bot, _) = edge_at(corners[0], corners[1], xi, kind.curved_bottom());
    let (top, _) = edge_at(corners[3], corners[2], xi, kind.curved_top());
    let wb = 0.5 * (1.0 - eta);
    let wt = 0.5 * (1.0 + eta);
    (wb * bot[0] + wt * top[0], wb * bot[1] + wt * top[1])
}

/// Jacobian of the forward map:
/// `[[ds_dxi, ds_deta], [dz_dxi, dz_deta]]`.
#[must_use]
pub fn jacobian(xi: f64, eta: f64, corners: &Corners, kind: ElemKind) -> [[f64; 2]; 2] {
    let (bot, dbot) = edge_at(corners[0], corners[1], xi, kind.curved_bottom());
    let (top, dtop) = edge_at(corners[3], corners[2], xi, kind.curved_top());
    let wb = 0.5 * (1.0 - eta);
    let wt = 0.5 * (1.0 + eta);
    [
        [wb * dbot[0] + wt * dtop[0], 0.5 * (top[0] - bot[0])],
        [wb * dbot[1] + wt * dtop[1], 0.5 * (top[1] - bot[1])],
    ]
}

/// Inverse Jacobian `[[dxi_ds, dxi_dz], [deta_ds, deta_dz]]` at a reference
/// point, used by the strain kernels to turn (∂/∂ξ, ∂/∂η) into (∂/∂s, ∂/∂z).
#[must_use]
pub fn inv_jacobian_at(xi: f64, eta: f64, corners: &Corners, kind: ElemKind) -> [[f64; 2]; 2] {
    let j = jacobian(xi, eta, corners, kind);
    let det = j[0][0] * j[1][1] - j[0][1] * j[1][0];
    [
        [j[1][1] / det, -j[0][1] / det],
        [-j[1][0] / det, j[0][0] / det],
    ]
}

/// Physical `s` coordinate at every collocation point of an element.
#[must_use]
pub fn s_at_nodes(
    xi_nodes: &Array1<f64>,
    eta_nodes: &Array1<f64>,
    corners: &Corners,
    kind: ElemKind,
) -> ndarray::Array2<f64> {
    let mut s = ndarray::Array2::<f64>::zeros((xi_nodes.len(), eta_nodes.len()));
    for (i, &xi) in xi_nodes.iter().enumerate() {
        for (j, &eta) in eta_nodes.iter().enumerate() {
            s[[i, j]] = mapping(xi, eta, corners, kind).0;
        }
    }
    s
}

const NEWTON_ITERATIONS: usize = 10;

/// Newton inversion of the forward map. Returns the reference coordinates of
/// `(s, z)` if the iteration converges and lands within `[-1-tol, 1+tol]²`.
///
/// The residual criterion is scaled by the coordinate magnitude so the test
/// behaves identically for metre-scale and planet-scale meshes.
#[must_use]
pub fn inside_element(
    s: f64,
    z: f64,
    corners: &Corners,
    kind: ElemKind,
    tol: f64,
) -> Option<(f64, f64)> {
    let scale = corners
        .iter()
        .map(|c| c[0].abs().max(c[1].abs()))
        .fold(1.0f64, f64::max);
    let tol_phys = 1e-10 * scale;

    let mut xi = 0.0f64;
    let mut eta = 0.0f64;
    for _ in 0..NEWTON_ITERATIONS {
        let (sm, zm) = mapping(xi, eta, corners, kind);
        let rs = s - sm;
        let rz = z - zm;
        let j = jacobian(xi, eta, corners, kind);
        let det = j[0][0] * j[1][1] - j[0][1] * j[1][0];
        if det.abs() < f64::EPSILON * scale * scale {
            return None;
        }
        let dxi = (j[1][1] * rs - j[0][1] * rz) / det;
        let deta = (-j[1][0] * rs + j[0][0] * rz) / det;
        xi += dxi;
        eta += deta;
        if dxi.hypot(deta) < 1e-12 {
            break;
        }
    }
    let (sm, zm) = mapping(xi, eta, corners, kind);
    let bound = 1.0 + tol;
    if (s - sm).hypot(z - zm) < tol_phys && xi.abs() <= bound && eta.abs() <= bound {
        Some((xi, eta))
    } else {
        None
    }
}
