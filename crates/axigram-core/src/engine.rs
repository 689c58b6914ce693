//! The extraction engine: opens a database session and turns
//! (source, receiver, components) requests into time series.
//!
//! Pipeline per request: rotate the endpoints into the mesh frame, find the
//! containing element through the kd-tree and the Newton point test, fetch
//! (or reconstruct and buffer) the element's field, interpolate at the
//! intra-element coordinates, contract with the rotated source tensor or
//! force vector, and synthesize the requested components.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, info};

use axigram_sem::mapping::{inside_element, ElemKind};

use crate::discover::{find_databases, MeshTag};
use crate::error::{ExtractError, Result};
use crate::info::{normalized_by_trapezoid, Info};
use crate::mesh::{DumpType, Mesh, ResolvedElement};
use crate::rotations::{
    rotate_frame_rd, rotate_symm_tensor_voigt_xyz_earth_to_src,
    rotate_symm_tensor_voigt_xyz_src_to_earth, rotate_symm_tensor_voigt_xyz_to_src,
    rotate_vector_src_to_nez, rotate_vector_xyz_earth_to_src, rotate_vector_xyz_src_to_earth,
    rotate_vector_xyz_to_src,
};
use crate::source::{Receiver, SourceMechanism};

/// Default buffer budget per field kind, in megabytes.
pub const DEFAULT_BUFFER_MB: u64 = 100;

/// Tolerance of the point-in-element test in reference coordinates.
const ELEMENT_TOLERANCE: f64 = 1e-3;

/// A seismogram component a caller can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Component {
    /// Vertical (up).
    Z,
    /// North.
    N,
    /// East.
    E,
    /// Radial (source → receiver).
    R,
    /// Transverse.
    T,
}

impl Component {
    /// Parse a single component letter.
    ///
    /// # Errors
    /// `InvalidArgument` for anything but Z, N, E, R, T.
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'Z' => Ok(Self::Z),
            'N' => Ok(Self::N),
            'E' => Ok(Self::E),
            'R' => Ok(Self::R),
            'T' => Ok(Self::T),
            other => Err(ExtractError::InvalidArgument(format!(
                "unknown component letter '{other}' (expected Z, N, E, R or T)"
            ))),
        }
    }

    /// Parse a component string such as `"ZNE"`.
    ///
    /// # Errors
    /// `InvalidArgument` on any unknown letter.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        s.chars().map(Self::from_char).collect()
    }

    /// The component letter.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Z => 'Z',
            Self::N => 'N',
            Self::E => 'E',
            Self::R => 'R',
            Self::T => 'T',
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The meshes of one database, shaped by its reciprocity.
enum MeshCollection {
    /// Reciprocal Green's functions: any subset of {PX, PZ}.
    Reciprocal { px: Option<Mesh>, pz: Option<Mesh> },
    /// Forward run: all four elemental moment-tensor meshes.
    Forward {
        mzz: Mesh,
        mxx_p_myy: Mesh,
        mxz_myz: Mesh,
        mxy_mxx_m_myy: Mesh,
    },
}

/// An open database; one per caller thread.
///
/// A session serializes its file reads and buffer updates internally and is
/// not meant to be shared; open one session per worker for parallel
/// extraction.
pub struct DatabaseSession {
    collection: MeshCollection,
    db_path: PathBuf,
}

impl DatabaseSession {
    /// Open the database below `db_path` with default buffer budgets and
    /// eager nodal arrays.
    ///
    /// # Errors
    /// `NotFound` / `BadDatabaseLayout` for an unusable directory,
    /// `UnsupportedVersion` / `MalformedDatabase` for unusable files.
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::open_with(db_path, DEFAULT_BUFFER_MB, false)
    }

    /// Open with explicit per-field buffer budgets (megabytes) and nodal
    /// array strategy.
    pub fn open_with(db_path: &Path, buffer_budget_mb: u64, read_on_demand: bool) -> Result<Self> {
        let mut files = find_databases(db_path)?;
        let reciprocal = files.keys().all(|t| t.is_reciprocal());

        let collection = if reciprocal {
            let px_path = files.remove(&MeshTag::Px);
            let pz_path = files.remove(&MeshTag::Pz);
            // The first mesh opened is fully parsed and canonical.
            let px = px_path
                .map(|p| Mesh::open(&p, true, buffer_budget_mb, buffer_budget_mb, read_on_demand))
                .transpose()?;
            let pz = pz_path
                .map(|p| {
                    Mesh::open(
                        &p,
                        px.is_none(),
                        buffer_budget_mb,
                        buffer_budget_mb,
                        read_on_demand,
                    )
                })
                .transpose()?;
            MeshCollection::Reciprocal { px, pz }
        } else {
            let mut take = |tag: MeshTag, full: bool| -> Result<Mesh> {
                let path = files.remove(&tag).ok_or_else(|| {
                    ExtractError::BadDatabaseLayout(format!("missing {} mesh", tag.pattern()))
                })?;
                // Forward databases never reconstruct strain.
                Mesh::open(&path, full, 0, buffer_budget_mb, read_on_demand)
            };
            MeshCollection::Forward {
                mzz: take(MeshTag::Mzz, true)?,
                mxx_p_myy: take(MeshTag::MxxPMyy, false)?,
                mxz_myz: take(MeshTag::MxzMyz, false)?,
                mxy_mxx_m_myy: take(MeshTag::MxyMxxMMyy, false)?,
            }
        };

        let session = Self {
            collection,
            db_path: db_path.to_path_buf(),
        };
        let canon = session.canonical();
        info!(
            path = %db_path.display(),
            reciprocal,
            dump = canon.dump_type.name(),
            npts = canon.ndumps,
            "database session opened"
        );
        Ok(session)
    }

    /// Whether this session evaluates reciprocal Green's functions.
    #[must_use]
    pub fn is_reciprocal(&self) -> bool {
        matches!(self.collection, MeshCollection::Reciprocal { .. })
    }

    /// The mesh whose metadata is authoritative for the session.
    fn canonical(&self) -> &Mesh {
        match &self.collection {
            MeshCollection::Reciprocal { px: Some(m), .. }
            | MeshCollection::Reciprocal {
                px: None,
                pz: Some(m),
            }
            | MeshCollection::Forward { mzz: m, .. } => m,
            MeshCollection::Reciprocal { px: None, pz: None } => {
                unreachable!("a session is never constructed without meshes")
            }
        }
    }

    /// Extract seismograms for every requested component.
    ///
    /// Every returned series has the database's full sample count. The
    /// request aborts on error but leaves the session usable.
    ///
    /// # Errors
    /// `ElementNotFound` when the rotated point lies outside the mesh,
    /// `InvalidArgument` for unavailable components,
    /// `UnsupportedDump` / `UnsupportedMode` for force sources outside
    /// reciprocal displacement databases.
    pub fn get_seismograms(
        &mut self,
        source: &SourceMechanism,
        receiver: &Receiver,
        components: &[Component],
    ) -> Result<BTreeMap<Component, Array1<f64>>> {
        let reciprocal = self.is_reciprocal();
        let canon = self.canonical();
        let full = canon.full()?;
        let planet_radius = full.meta.planet_radius;
        let amplitude = full.meta.amplitude;
        let dump = canon.dump_type;

        // 1. Rotate the moving endpoint into the frame whose pole is the
        //    fixed endpoint.
        let (axyz, b_lon, b_colat) = if reciprocal {
            (
                source.xyz(planet_radius),
                receiver.longitude_rad(),
                receiver.colatitude_rad(),
            )
        } else {
            (
                receiver.xyz(planet_radius),
                source.longitude_rad(),
                source.colatitude_rad(),
            )
        };
        let (rot_s, rot_phi, rot_z) = rotate_frame_rd(axyz[0], axyz[1], axyz[2], b_lon, b_colat);

        // 2.–4. Candidate elements, containment, nodal basis.
        let k = if dump == DumpType::DisplOnly { 6 } else { 1 };
        let candidates = canon.nearest_elements(rot_s, rot_z, k)?;

        let resolved = if dump == DumpType::DisplOnly {
            let mut hit = None;
            for &elem in &candidates {
                let (corners, kind) = canon.corner_info(elem)?;
                if let Some((xi, eta)) = inside_element(rot_s, rot_z, &corners, kind, ELEMENT_TOLERANCE)
                {
                    hit = Some((elem, corners, kind, xi, eta));
                    break;
                }
            }
            let Some((elem, corners, kind, xi, eta)) = hit else {
                return Err(ExtractError::ElementNotFound { s: rot_s, z: rot_z });
            };
            let (gll_ids, axial) = canon.element_basis(elem)?;
            let ops = &full.ops;
            let (xi_nodes, gt) = if axial {
                (ops.glj.clone(), ops.g1t.clone())
            } else {
                (ops.gll.clone(), ops.g2t.clone())
            };
            ResolvedElement {
                elem,
                gll_ids,
                xi,
                eta,
                xi_nodes,
                eta_nodes: ops.gll.clone(),
                gt,
                g: ops.g2.clone(),
                corners,
                kind,
                axial,
            }
        } else {
            // Strain databases index fields per element; the nearest
            // midpoint decides, and no intra-element geometry is needed.
            let elem = *candidates.first().ok_or(ExtractError::ElementNotFound {
                s: rot_s,
                z: rot_z,
            })?;
            ResolvedElement {
                elem,
                gll_ids: Array2::zeros((0, 0)),
                xi: 0.0,
                eta: 0.0,
                xi_nodes: full.ops.gll.clone(),
                eta_nodes: full.ops.gll.clone(),
                gt: full.ops.g2t.clone(),
                g: full.ops.g2.clone(),
                corners: [[0.0; 2]; 4],
                kind: ElemKind::Linear,
                axial: false,
            }
        };

        let mu = self.canonical().mu_for_element(
            resolved.elem,
            (dump == DumpType::DisplOnly).then_some(&resolved.gll_ids),
        )?;
        debug!(
            elem = resolved.elem,
            xi = resolved.xi,
            eta = resolved.eta,
            mu,
            phi = rot_phi,
            "query point resolved"
        );

        let mut out = BTreeMap::new();
        if components.is_empty() {
            return Ok(out);
        }

        match (&mut self.collection, source) {
            (MeshCollection::Reciprocal { px, pz }, SourceMechanism::Moment(src)) => {
                let wants_z = components.contains(&Component::Z);
                let wants_x = components
                    .iter()
                    .any(|c| matches!(c, Component::N | Component::E | Component::R | Component::T));

                let strain_z = if wants_z {
                    let mesh = pz.as_mut().ok_or_else(|| {
                        ExtractError::InvalidArgument(
                            "vertical component requested but the database has no PZ mesh".into(),
                        )
                    })?;
                    Some(element_strain(mesh, &resolved, dump)?)
                } else {
                    None
                };
                let strain_x = if wants_x {
                    let mesh = px.as_mut().ok_or_else(|| {
                        ExtractError::InvalidArgument(
                            "horizontal components requested but the database has no PX mesh"
                                .into(),
                        )
                    })?;
                    Some(element_strain(mesh, &resolved, dump)?)
                } else {
                    None
                };

                // 8. Source tensor through src → earth → receiver-src →
                //    mesh-phi, then amplitude normalization.
                let mij = rotate_symm_tensor_voigt_xyz_src_to_earth(
                    src.tensor_voigt(),
                    src.longitude_rad(),
                    src.colatitude_rad(),
                );
                let mij = rotate_symm_tensor_voigt_xyz_earth_to_src(
                    mij,
                    receiver.longitude_rad(),
                    receiver.colatitude_rad(),
                );
                let mut mij = rotate_symm_tensor_voigt_xyz_to_src(mij, rot_phi);
                for v in &mut mij {
                    *v /= amplitude;
                }

                for &comp in components {
                    let series = match comp {
                        Component::Z => {
                            let e = strain_z.as_ref().ok_or_else(series_bug)?;
                            contract(e, |row| {
                                mij[0] * row[0]
                                    + mij[1] * row[1]
                                    + mij[2] * row[2]
                                    + 2.0 * mij[4] * row[4]
                            })
                        }
                        Component::R => {
                            let e = strain_x.as_ref().ok_or_else(series_bug)?;
                            contract(e, |row| {
                                -(mij[0] * row[0]
                                    + mij[1] * row[1]
                                    + mij[2] * row[2]
                                    + 2.0 * mij[4] * row[4])
                            })
                        }
                        Component::T => {
                            let e = strain_x.as_ref().ok_or_else(series_bug)?;
                            contract(e, |row| 2.0 * mij[3] * row[3] + 2.0 * mij[5] * row[5])
                        }
                        Component::N | Component::E => {
                            let e = strain_x.as_ref().ok_or_else(series_bug)?;
                            let (fac_1, fac_2, sign) = azimuth_factors(comp, rot_phi);
                            contract(e, |row| {
                                sign * ((mij[0] * row[0]
                                    + mij[1] * row[1]
                                    + mij[2] * row[2]
                                    + 2.0 * mij[4] * row[4])
                                    * fac_1
                                    + (2.0 * mij[3] * row[3] + 2.0 * mij[5] * row[5]) * fac_2)
                            })
                        }
                    };
                    out.insert(comp, series);
                }
            }

            (MeshCollection::Reciprocal { px, pz }, SourceMechanism::Force(src)) => {
                if dump != DumpType::DisplOnly {
                    return Err(ExtractError::UnsupportedDump {
                        dump: dump.name().into(),
                        what: "force sources need stored displacement".into(),
                    });
                }

                let wants_z = components.contains(&Component::Z);
                let wants_x = components
                    .iter()
                    .any(|c| matches!(c, Component::N | Component::E | Component::R | Component::T));

                let displ_z = if wants_z {
                    let mesh = pz.as_mut().ok_or_else(|| {
                        ExtractError::InvalidArgument(
                            "vertical component requested but the database has no PZ mesh".into(),
                        )
                    })?;
                    Some(mesh.displacement_interp(&resolved)?)
                } else {
                    None
                };
                let displ_x = if wants_x {
                    let mesh = px.as_mut().ok_or_else(|| {
                        ExtractError::InvalidArgument(
                            "horizontal components requested but the database has no PX mesh"
                                .into(),
                        )
                    })?;
                    Some(mesh.displacement_interp(&resolved)?)
                } else {
                    None
                };

                let f = rotate_vector_xyz_src_to_earth(
                    src.force_tpr(),
                    src.longitude_rad(),
                    src.colatitude_rad(),
                );
                let f = rotate_vector_xyz_earth_to_src(
                    f,
                    receiver.longitude_rad(),
                    receiver.colatitude_rad(),
                );
                let mut f = rotate_vector_xyz_to_src(f, rot_phi);
                for v in &mut f {
                    *v /= amplitude;
                }

                for &comp in components {
                    let series = match comp {
                        Component::Z => {
                            let u = displ_z.as_ref().ok_or_else(series_bug)?;
                            contract(u, |row| f[0] * row[0] + f[2] * row[2])
                        }
                        Component::R => {
                            let u = displ_x.as_ref().ok_or_else(series_bug)?;
                            contract(u, |row| f[0] * row[0] + f[2] * row[2])
                        }
                        Component::T => {
                            let u = displ_x.as_ref().ok_or_else(series_bug)?;
                            contract(u, |row| f[1] * row[1])
                        }
                        Component::N | Component::E => {
                            let u = displ_x.as_ref().ok_or_else(series_bug)?;
                            let (fac_1, fac_2, sign) = azimuth_factors(comp, rot_phi);
                            contract(u, |row| {
                                sign * ((f[0] * row[0] + f[2] * row[2]) * fac_1
                                    + f[1] * row[1] * fac_2)
                            })
                        }
                    };
                    out.insert(comp, series);
                }
            }

            (MeshCollection::Forward { .. }, SourceMechanism::Force(_)) => {
                return Err(ExtractError::UnsupportedMode(
                    "force sources require a reciprocal database".into(),
                ));
            }

            (
                MeshCollection::Forward {
                    mzz,
                    mxx_p_myy,
                    mxz_myz,
                    mxy_mxx_m_myy,
                },
                SourceMechanism::Moment(src),
            ) => {
                if dump != DumpType::DisplOnly {
                    return Err(ExtractError::UnsupportedDump {
                        dump: dump.name().into(),
                        what: "forward extraction needs stored displacement".into(),
                    });
                }

                let d1 = mzz.displacement_interp(&resolved)?;
                let d2 = mxx_p_myy.displacement_interp(&resolved)?;
                let d3 = mxz_myz.displacement_interp(&resolved)?;
                let d4 = mxy_mxx_m_myy.displacement_interp(&resolved)?;

                let mut mij = src.tensor();
                for v in &mut mij {
                    *v /= amplitude;
                }

                // 9. Sum the elemental fields with their azimuthal factors;
                //    the result is an (s, p, z) vector per sample.
                let nt = d1.dim().0;
                let mut final_spz = Array2::<f64>::zeros((3, nt));
                let (sin_p, cos_p) = rot_phi.sin_cos();
                let (sin_2p, cos_2p) = (2.0 * rot_phi).sin_cos();
                let fac_1_d = mij[3] * cos_p + mij[4] * sin_p;
                let fac_2_d = -mij[3] * sin_p + mij[4] * cos_p;
                let fac_1_q = (mij[1] - mij[2]) * cos_2p + 2.0 * mij[5] * sin_2p;
                let fac_2_q = -(mij[1] - mij[2]) * sin_2p + 2.0 * mij[5] * cos_2p;
                for t in 0..nt {
                    final_spz[[0, t]] = d1[[t, 0]] * mij[0]
                        + d2[[t, 0]] * (mij[1] + mij[2])
                        + d3[[t, 0]] * fac_1_d
                        + d4[[t, 0]] * fac_1_q;
                    final_spz[[1, t]] = d3[[t, 1]] * fac_2_d + d4[[t, 1]] * fac_2_q;
                    final_spz[[2, t]] = d1[[t, 2]] * mij[0]
                        + d2[[t, 2]] * (mij[1] + mij[2])
                        + d3[[t, 2]] * fac_1_d
                        + d4[[t, 2]] * fac_1_q;
                }

                let rot_colat = rot_s.atan2(rot_z);
                let nez = if components
                    .iter()
                    .any(|c| matches!(c, Component::N | Component::E | Component::Z))
                {
                    Some(rotate_vector_src_to_nez(
                        final_spz.view(),
                        rot_phi,
                        src.longitude_rad(),
                        src.colatitude_rad(),
                        receiver.longitude_rad(),
                        receiver.colatitude_rad(),
                    ))
                } else {
                    None
                };

                for &comp in components {
                    let series = match comp {
                        Component::T => {
                            // Sign matches the reciprocal-mode convention.
                            Array1::from_iter((0..nt).map(|t| -final_spz[[1, t]]))
                        }
                        Component::R => Array1::from_iter((0..nt).map(|t| {
                            final_spz[[0, t]] * rot_colat.cos()
                                - final_spz[[2, t]] * rot_colat.sin()
                        })),
                        Component::N => {
                            let nez = nez.as_ref().ok_or_else(series_bug)?;
                            nez.row(0).to_owned()
                        }
                        Component::E => {
                            let nez = nez.as_ref().ok_or_else(series_bug)?;
                            nez.row(1).to_owned()
                        }
                        Component::Z => {
                            let nez = nez.as_ref().ok_or_else(series_bug)?;
                            nez.row(2).to_owned()
                        }
                    };
                    out.insert(comp, series);
                }
            }
        }

        Ok(out)
    }

    /// Like [`Self::get_seismograms`], optionally dropping the leading
    /// source-shift samples so the trace starts at the origin time. With the
    /// shift removed the series are shorter by `src_shift_samples`.
    pub fn get_seismograms_shifted(
        &mut self,
        source: &SourceMechanism,
        receiver: &Receiver,
        components: &[Component],
        remove_source_shift: bool,
    ) -> Result<BTreeMap<Component, Array1<f64>>> {
        let mut out = self.get_seismograms(source, receiver, components)?;
        if remove_source_shift {
            let shift = self.canonical().full()?.meta.source_shift_samples.max(0) as usize;
            for series in out.values_mut() {
                *series = series.slice(ndarray::s![shift.min(series.len())..]).to_owned();
            }
        }
        Ok(out)
    }

    /// Immutable descriptor of the session.
    ///
    /// # Errors
    /// `Io` when a file size cannot be read.
    pub fn info(&self) -> Result<Info> {
        let canon = self.canonical();
        let full = canon.full()?;
        let meta = &full.meta;

        let (is_reciprocal, components, filesize) = match &self.collection {
            MeshCollection::Reciprocal { px, pz } => {
                let components = match (px.is_some(), pz.is_some()) {
                    (true, true) => "vertical and horizontal",
                    (true, false) => "horizontal only",
                    (false, true) => "vertical only",
                    (false, false) => unreachable!("a session is never constructed without meshes"),
                };
                let mut size = 0;
                for mesh in [px.as_ref(), pz.as_ref()].into_iter().flatten() {
                    size += mesh.file_size_bytes()?;
                }
                (true, components.to_string(), size)
            }
            MeshCollection::Forward {
                mzz,
                mxx_p_myy,
                mxz_myz,
                mxy_mxx_m_myy,
            } => {
                let mut size = 0;
                for mesh in [mzz, mxx_p_myy, mxz_myz, mxy_mxx_m_myy] {
                    size += mesh.file_size_bytes()?;
                }
                (false, "4 elemental moment tensors".to_string(), size)
            }
        };

        let npts = canon.ndumps;
        Ok(Info {
            is_reciprocal,
            components,
            source_depth: (!is_reciprocal).then_some(meta.source_depth_km),
            velocity_model: meta.background_model.clone(),
            attenuation: meta.attenuation,
            period: meta.dominant_period,
            dump_type: canon.dump_type,
            excitation_type: format!("{:?}", canon.excitation).to_lowercase(),
            dt: meta.dt,
            sampling_rate: 1.0 / meta.dt,
            npts,
            nfft: 2 * npts.next_power_of_two(),
            length: meta.dt * (npts.saturating_sub(1)) as f64,
            stf: meta.stf_kind.clone(),
            amplitude_kind: meta.source_type.clone(),
            src_shift: meta.source_shift,
            src_shift_samples: meta.source_shift_samples,
            slip: normalized_by_trapezoid(&full.stf, meta.dt),
            sliprate: normalized_by_trapezoid(&full.stf_d, meta.dt),
            spatial_order: canon.npol,
            min_radius: meta.kwf_rmin * 1e3,
            max_radius: meta.kwf_rmax * 1e3,
            planet_radius: meta.planet_radius,
            min_d: meta.kwf_colatmin,
            max_d: meta.kwf_colatmax,
            time_scheme: meta.time_scheme.clone(),
            directory: self.db_path.display().to_string(),
            filesize,
            compiler: meta.compiler.clone(),
            user: meta.user.clone(),
            format_version: canon.file_version,
            solver_revision: meta.solver_revision.clone(),
        })
    }
}

/// Per-sample contraction of a `[T, width]` field into a series.
fn contract(field: &Array2<f64>, f: impl Fn(ndarray::ArrayView1<'_, f64>) -> f64) -> Array1<f64> {
    let nt = field.dim().0;
    Array1::from_iter((0..nt).map(|t| f(field.row(t))))
}

/// `(fac_1, fac_2, sign)` for the N/E synthesis at mesh azimuth `phi`; north
/// carries the seismological sign flip.
fn azimuth_factors(comp: Component, phi: f64) -> (f64, f64, f64) {
    let (sin_p, cos_p) = phi.sin_cos();
    match comp {
        Component::N => (cos_p, -sin_p, -1.0),
        Component::E => (sin_p, cos_p, 1.0),
        _ => (1.0, 0.0, 1.0),
    }
}

/// Strain of the resolved element from one mesh, interpolated or read
/// directly depending on the dump kind.
fn element_strain(mesh: &mut Mesh, resolved: &ResolvedElement, dump: DumpType) -> Result<Array2<f64>> {
    if dump.has_strain_traces() {
        mesh.strain_traces(resolved.elem)
    } else {
        mesh.strain_interp(resolved)
    }
}

/// Internal invariant: a component series was requested but its field was
/// not loaded.
fn series_bug() -> ExtractError {
    ExtractError::InvalidArgument("component requested without its field being loaded".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_letters_round_trip() {
        for c in ['Z', 'N', 'E', 'R', 'T'] {
            assert_eq!(Component::from_char(c).unwrap().letter(), c);
        }
        assert!(Component::from_char('Q').is_err());
    }

    #[test]
    fn component_list_parses_lowercase() {
        let list = Component::parse_list("znert").unwrap();
        assert_eq!(
            list,
            vec![
                Component::Z,
                Component::N,
                Component::E,
                Component::R,
                Component::T
            ]
        );
    }

    #[test]
    fn azimuth_factors_match_convention() {
        let phi = 0.7f64;
        let (f1, f2, sign) = azimuth_factors(Component::N, phi);
        assert_eq!(f1, phi.cos());
        assert_eq!(f2, -phi.sin());
        assert_eq!(sign, -1.0);
        let (f1, f2, sign) = azimuth_factors(Component::E, phi);
        assert_eq!(f1, phi.sin());
        assert_eq!(f2, phi.cos());
        assert_eq!(sign, 1.0);
    }
}
