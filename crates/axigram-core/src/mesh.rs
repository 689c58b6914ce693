//! Handle over one wavefield database file.
//!
//! A [`Mesh`] owns the open netCDF file, the parsed metadata, the kd-tree
//! over element midpoints, the precomputed spectral operators, and the two
//! byte-bounded buffers for reconstructed fields. Secondary meshes of a
//! collection (the PZ file of a reciprocal pair, or the elemental
//! moment-tensor files m2…m4) skip the full parse: the canonical mesh's
//! metadata is authoritative and only the cheap scalars, the snapshot
//! readers and the buffers are needed on them.
//!
//! Nodal arrays sit behind one accessor with two implementations: read into
//! memory at open time, or lazily from the file. The file format rejects
//! unsorted or duplicated index slices, so every lazy indexed read sorts the
//! ids, reads ascending, and permutes the result back to the caller's order.
//! This is applied unconditionally — repacking a file with new per-variable
//! chunking may reintroduce the restriction on databases that did not
//! originally exhibit it.

use std::path::{Path, PathBuf};

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use ndarray::{Array1, Array2, Array3, Array4};
use serde::Serialize;
use tracing::debug;

use axigram_sem::basis::{
    gll_points, glj_points, lagrange_derivs_glj, lagrange_derivs_gll, lagrange_interp_2d,
};
use axigram_sem::derivatives::{strain_td, Excitation};
use axigram_sem::mapping::{Corners, ElemKind};

use crate::buffer::{ByteSized, LruBuffer};
use crate::error::{ExtractError, Result};

/// Oldest supported database format version.
pub const MIN_FILE_VERSION: i64 = 4;

/// What the forward solver dumped per snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DumpType {
    /// Displacement at every GLL point; strain is reconstructed on demand.
    DisplOnly,
    /// Six strain components per element.
    StrainOnly,
    /// Both displacement and strain.
    FullFields,
}

impl DumpType {
    /// Parse the `dump type` attribute.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "displ_only" => Some(Self::DisplOnly),
            "strain_only" => Some(Self::StrainOnly),
            "fullfields" => Some(Self::FullFields),
            _ => None,
        }
    }

    /// The attribute spelling of this dump type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DisplOnly => "displ_only",
            Self::StrainOnly => "strain_only",
            Self::FullFields => "fullfields",
        }
    }

    /// Whether per-element strain traces are stored directly.
    #[must_use]
    pub const fn has_strain_traces(self) -> bool {
        matches!(self, Self::StrainOnly | Self::FullFields)
    }
}

/// Scalar metadata available only after a full parse.
#[derive(Clone, Debug)]
pub struct FullMeta {
    /// `source type` attribute (amplitude normalization kind).
    pub source_type: String,
    /// Scalar source magnitude all request magnitudes are divided by.
    pub amplitude: f64,
    /// Snapshot sampling interval in seconds.
    pub dt: f64,
    /// Source shift in seconds.
    pub source_shift: f64,
    /// Source shift in coarse samples.
    pub source_shift_samples: i64,
    /// Number of global GLL points.
    pub npoints: usize,
    /// Background model name.
    pub background_model: String,
    /// Attenuation flag.
    pub attenuation: bool,
    /// Planet radius in metres (the file stores kilometres).
    pub planet_radius: f64,
    /// Dominant source period in seconds.
    pub dominant_period: f64,
    /// Source depth in kilometres (forward databases).
    pub source_depth_km: f64,
    /// Kernel wavefield minimum radius in kilometres.
    pub kwf_rmin: f64,
    /// Kernel wavefield maximum radius in kilometres.
    pub kwf_rmax: f64,
    /// Kernel wavefield minimum colatitude in degrees.
    pub kwf_colatmin: f64,
    /// Kernel wavefield maximum colatitude in degrees.
    pub kwf_colatmax: f64,
    /// Time scheme of the solver.
    pub time_scheme: String,
    /// Source time function kind.
    pub stf_kind: String,
    /// Solver revision string.
    pub solver_revision: String,
    /// Compiler brand and version.
    pub compiler: String,
    /// User and host that produced the file.
    pub user: String,
}

/// Precomputed nodal bases and derivative operators.
#[derive(Clone, Debug)]
pub struct SpectralOps {
    /// GLL points of the spatial order.
    pub gll: Array1<f64>,
    /// GLJ points for the ξ direction of axial elements.
    pub glj: Array1<f64>,
    /// GLJ derivative column at the axis node.
    pub g0: Array1<f64>,
    /// GLJ derivative matrix.
    pub g1: Array2<f64>,
    /// GLL derivative matrix.
    pub g2: Array2<f64>,
    /// Transposed GLJ derivative matrix (ξ operator on axial elements).
    pub g1t: Array2<f64>,
    /// Transposed GLL derivative matrix (ξ operator off the axis).
    pub g2t: Array2<f64>,
}

impl SpectralOps {
    fn new(npol: usize) -> Self {
        let gll = gll_points(npol);
        let glj = glj_points(npol);
        let (g0, g1) = lagrange_derivs_glj(npol);
        let g2 = lagrange_derivs_gll(npol);
        let g1t = g1.t().to_owned();
        let g2t = g2.t().to_owned();
        Self {
            gll,
            glj,
            g0,
            g1,
            g2,
            g1t,
            g2t,
        }
    }
}

/// In-memory copy of the nodal arrays.
struct NodalArrays {
    s: Array1<f64>,
    z: Array1<f64>,
    mu: Array1<f64>,
    fem: Array2<usize>,
    sem: Array3<usize>,
    eltype: Vec<ElemKind>,
    axis: Vec<bool>,
}

/// Eager or lazy access to the nodal arrays.
enum NodalStore {
    InMemory(NodalArrays),
    OnDemand,
}

/// Everything the canonical mesh carries beyond the cheap scalars.
pub struct FullParse {
    /// Remaining scalar metadata.
    pub meta: FullMeta,
    /// Source time function samples (length T).
    pub stf: Array1<f64>,
    /// Time derivative of the source time function (length T).
    pub stf_d: Array1<f64>,
    /// Precomputed spectral operators.
    pub ops: SpectralOps,
    /// Number of mesh elements.
    pub nelem: usize,
    kdtree: KdTree<f64, usize, [f64; 2]>,
    nodal: NodalStore,
}

/// A buffered per-element strain value.
pub(crate) enum StrainEntry {
    /// Full nodal strain `[T, n+1, n+1, 6]` (displacement dumps).
    Nodal(Array4<f64>),
    /// Voigt-remapped element traces `[T, 6]` (strain dumps).
    Traces(Array2<f64>),
}

impl ByteSized for StrainEntry {
    fn size_bytes(&self) -> u64 {
        match self {
            Self::Nodal(a) => a.size_bytes(),
            Self::Traces(a) => a.size_bytes(),
        }
    }
}

/// Geometry and basis of a resolved element, owned so the engine can hand it
/// to any mesh of the collection while that mesh mutates its buffers.
#[derive(Clone)]
pub(crate) struct ResolvedElement {
    pub elem: usize,
    pub gll_ids: Array2<usize>,
    pub xi: f64,
    pub eta: f64,
    pub xi_nodes: Array1<f64>,
    pub eta_nodes: Array1<f64>,
    /// ξ-direction derivative operator, transposed layout (G2T or G1T).
    pub gt: Array2<f64>,
    /// η-direction derivative operator (G2).
    pub g: Array2<f64>,
    pub corners: Corners,
    pub kind: ElemKind,
    pub axial: bool,
}

/// Handle over one open database file.
pub struct Mesh {
    file: netcdf::File,
    path: PathBuf,
    /// Dump kind of this file.
    pub dump_type: DumpType,
    /// Polynomial order (npol); `npol + 1` GLL points per direction.
    pub npol: usize,
    /// Number of time samples per trace.
    pub ndumps: usize,
    /// Excitation symmetry of the stored wavefield.
    pub excitation: Excitation,
    /// File format version.
    pub file_version: i64,
    read_on_demand: bool,
    pub(crate) strain_buffer: LruBuffer<StrainEntry>,
    pub(crate) displ_buffer: LruBuffer<Array4<f64>>,
    full: Option<Box<FullParse>>,
}

impl Mesh {
    /// Open a database file read-only.
    ///
    /// `full_parse` reads all metadata, builds the kd-tree and precomputes
    /// the spectral operators; without it only the cheap scalars are read.
    /// `read_on_demand` keeps the nodal arrays on disk instead of
    /// materializing them at open time.
    ///
    /// # Errors
    /// `UnsupportedVersion` below the format floor, `UnsupportedDump` for an
    /// unknown dump kind, `MalformedDatabase` for missing attributes,
    /// groups or variables.
    pub fn open(
        path: &Path,
        full_parse: bool,
        strain_budget_mb: u64,
        displ_budget_mb: u64,
        read_on_demand: bool,
    ) -> Result<Self> {
        let file = netcdf::open(path)?;

        let dump_name = attr_string(&file, "dump type")?;
        let dump_type = DumpType::from_name(&dump_name).ok_or_else(|| {
            ExtractError::UnsupportedDump {
                dump: dump_name.clone(),
                what: "opening the database".into(),
            }
        })?;

        let file_version = attr_i64(&file, "file version")?;
        if file_version < MIN_FILE_VERSION {
            return Err(ExtractError::UnsupportedVersion {
                found: file_version,
                floor: MIN_FILE_VERSION,
            });
        }

        let npol = attr_i64(&file, "npol")? as usize;
        let ndumps = attr_i64(&file, "number of strain dumps")? as usize;
        let excitation_name = attr_string(&file, "excitation type")?;
        let excitation = Excitation::from_name(&excitation_name).ok_or_else(|| {
            ExtractError::MalformedDatabase(format!(
                "unknown excitation type '{excitation_name}'"
            ))
        })?;

        let mut mesh = Self {
            file,
            path: path.to_path_buf(),
            dump_type,
            npol,
            ndumps,
            excitation,
            file_version,
            read_on_demand,
            strain_buffer: LruBuffer::with_budget_mb(strain_budget_mb),
            displ_buffer: LruBuffer::with_budget_mb(displ_budget_mb),
            full: None,
        };
        if full_parse {
            let parsed = mesh.parse_full()?;
            mesh.full = Some(Box::new(parsed));
        }
        debug!(
            path = %path.display(),
            dump = dump_type.name(),
            npol,
            ndumps,
            full_parse,
            "opened wavefield database"
        );
        Ok(mesh)
    }

    fn parse_full(&self) -> Result<FullParse> {
        let f = &self.file;
        let meta = FullMeta {
            source_type: attr_string(f, "source type")?,
            amplitude: attr_f64(f, "scalar source magnitude")?,
            dt: attr_f64(f, "strain dump sampling rate in sec")?,
            source_shift: attr_f64(f, "source shift factor in sec")?,
            source_shift_samples: attr_i64(f, "source shift factor for deltat_coarse")?,
            npoints: attr_i64(f, "npoints")? as usize,
            background_model: attr_string(f, "background model")?,
            attenuation: attr_i64(f, "attenuation")? != 0,
            planet_radius: attr_f64(f, "planet radius")? * 1e3,
            dominant_period: attr_f64(f, "dominant source period")?,
            source_depth_km: attr_f64(f, "source depth in km")?,
            kwf_rmin: attr_f64(f, "kernel wavefield rmin")?,
            kwf_rmax: attr_f64(f, "kernel wavefield rmax")?,
            kwf_colatmin: attr_f64(f, "kernel wavefield colatmin")?,
            kwf_colatmax: attr_f64(f, "kernel wavefield colatmax")?,
            time_scheme: attr_string(f, "time scheme")?,
            stf_kind: attr_string(f, "source time function")?,
            solver_revision: attr_string(f, "SVN revision").unwrap_or_default(),
            compiler: format!(
                "{} {}",
                attr_string(f, "compiler brand").unwrap_or_default(),
                attr_string(f, "compiler version").unwrap_or_default()
            ),
            user: format!(
                "{} on {}",
                attr_string(f, "user name").unwrap_or_default(),
                attr_string(f, "host name").unwrap_or_default()
            ),
        };

        let surface = group(f, "Surface")?;
        let stf = Array1::from(var_in(&surface, "stf_dump")?.get_values::<f64, _>(..)?);
        let stf_d = Array1::from(var_in(&surface, "stf_d_dump")?.get_values::<f64, _>(..)?);

        let ops = SpectralOps::new(self.npol);

        let mesh_group = group(f, "Mesh")?;
        let mp_s = var_in(&mesh_group, "mp_mesh_S")?.get_values::<f64, _>(..)?;
        let mp_z = var_in(&mesh_group, "mp_mesh_Z")?.get_values::<f64, _>(..)?;
        let nelem = mp_s.len();
        let mut kdtree = KdTree::new(2);
        for (e, (&s, &z)) in mp_s.iter().zip(mp_z.iter()).enumerate() {
            kdtree
                .add([s, z], e)
                .map_err(|err| ExtractError::MalformedDatabase(format!("kd-tree: {err:?}")))?;
        }

        let nodal = if self.read_on_demand {
            NodalStore::OnDemand
        } else {
            NodalStore::InMemory(self.read_nodal_arrays(nelem)?)
        };

        Ok(FullParse {
            meta,
            stf,
            stf_d,
            ops,
            nelem,
            kdtree,
            nodal,
        })
    }

    fn read_nodal_arrays(&self, nelem: usize) -> Result<NodalArrays> {
        let mesh_group = group(&self.file, "Mesh")?;
        let np1 = self.npol + 1;

        let s = Array1::from(var_in(&mesh_group, "mesh_S")?.get_values::<f64, _>(..)?);
        let z = Array1::from(var_in(&mesh_group, "mesh_Z")?.get_values::<f64, _>(..)?);
        let mu = Array1::from(var_in(&mesh_group, "mesh_mu")?.get_values::<f64, _>(..)?);

        let fem_raw = var_in(&mesh_group, "fem_mesh")?.get_values::<i64, _>(..)?;
        let fem = Array2::from_shape_vec((nelem, 4), to_usize(fem_raw))
            .map_err(|e| ExtractError::MalformedDatabase(format!("fem_mesh shape: {e}")))?;

        let sem_raw = var_in(&mesh_group, "sem_mesh")?.get_values::<i64, _>(..)?;
        let sem = Array3::from_shape_vec((nelem, np1, np1), to_usize(sem_raw))
            .map_err(|e| ExtractError::MalformedDatabase(format!("sem_mesh shape: {e}")))?;

        let eltype = var_in(&mesh_group, "eltype")?
            .get_values::<i64, _>(..)?
            .into_iter()
            .map(decode_eltype)
            .collect::<Result<Vec<_>>>()?;

        let axis = var_in(&mesh_group, "axis")?
            .get_values::<i64, _>(..)?
            .into_iter()
            .map(|v| v != 0)
            .collect();

        Ok(NodalArrays {
            s,
            z,
            mu,
            fem,
            sem,
            eltype,
            axis,
        })
    }

    /// The full-parse payload; only the canonical mesh of a collection has
    /// one.
    pub fn full(&self) -> Result<&FullParse> {
        self.full.as_deref().ok_or_else(|| {
            ExtractError::MalformedDatabase("mesh was opened without a full parse".into())
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte size of the underlying file.
    pub fn file_size_bytes(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Hit rates of the (strain, displacement) buffers.
    #[must_use]
    pub fn buffer_efficiencies(&self) -> (f64, f64) {
        (self.strain_buffer.efficiency(), self.displ_buffer.efficiency())
    }

    /// Indices of the `k` elements whose midpoints are nearest to `(s, z)`,
    /// in ascending distance order.
    pub fn nearest_elements(&self, s: f64, z: f64, k: usize) -> Result<Vec<usize>> {
        let full = self.full()?;
        let found = full
            .kdtree
            .nearest(&[s, z], k, &squared_euclidean)
            .map_err(|e| ExtractError::InvalidArgument(format!("kd-tree query: {e:?}")))?;
        Ok(found.into_iter().map(|(_, &e)| e).collect())
    }

    /// Corner coordinates and element family of one element.
    pub fn corner_info(&self, elem: usize) -> Result<(Corners, ElemKind)> {
        let full = self.full()?;
        match &full.nodal {
            NodalStore::InMemory(n) => {
                let mut corners = [[0.0; 2]; 4];
                for c in 0..4 {
                    let id = n.fem[[elem, c]];
                    corners[c] = [n.s[id], n.z[id]];
                }
                Ok((corners, n.eltype[elem]))
            }
            NodalStore::OnDemand => {
                let mesh_group = group(&self.file, "Mesh")?;
                let ids = var_in(&mesh_group, "fem_mesh")?
                    .get_values::<i64, _>((elem..elem + 1, ..))?;
                let ids = to_usize(ids);
                let s = read_indexed_f64(&var_in(&mesh_group, "mesh_S")?, &ids)?;
                let z = read_indexed_f64(&var_in(&mesh_group, "mesh_Z")?, &ids)?;
                let mut corners = [[0.0; 2]; 4];
                for c in 0..4 {
                    corners[c] = [s[c], z[c]];
                }
                let code = var_in(&mesh_group, "eltype")?
                    .get_values::<i64, _>(elem..elem + 1)?[0];
                Ok((corners, decode_eltype(code)?))
            }
        }
    }

    /// GLL point ids (`[npol+1, npol+1]`, ξ-major) and axis flag of one
    /// element.
    pub fn element_basis(&self, elem: usize) -> Result<(Array2<usize>, bool)> {
        let full = self.full()?;
        let np1 = self.npol + 1;
        match &full.nodal {
            NodalStore::InMemory(n) => {
                let ids = n
                    .sem
                    .index_axis(ndarray::Axis(0), elem)
                    .to_owned();
                Ok((ids, n.axis[elem]))
            }
            NodalStore::OnDemand => {
                let mesh_group = group(&self.file, "Mesh")?;
                let raw = var_in(&mesh_group, "sem_mesh")?
                    .get_values::<i64, _>((elem..elem + 1, .., ..))?;
                let ids = Array2::from_shape_vec((np1, np1), to_usize(raw))
                    .map_err(|e| ExtractError::MalformedDatabase(format!("sem_mesh row: {e}")))?;
                let axis = var_in(&mesh_group, "axis")?
                    .get_values::<i64, _>(elem..elem + 1)?[0]
                    != 0;
                Ok((ids, axis))
            }
        }
    }

    /// Shear modulus associated with a query in this element.
    ///
    /// For displacement dumps this is the value at the central GLL point of
    /// the element. For strain dumps the element id indexes the nodal `mu`
    /// array directly — physically questionable but preserved as the
    /// observed behavior of the file producer's own reader.
    pub fn mu_for_element(&self, elem: usize, gll_ids: Option<&Array2<usize>>) -> Result<f64> {
        let full = self.full()?;
        let point = mu_lookup_index(self.dump_type, elem, gll_ids, self.npol);
        match &full.nodal {
            NodalStore::InMemory(n) => Ok(n.mu[point]),
            NodalStore::OnDemand => {
                let mesh_group = group(&self.file, "Mesh")?;
                Ok(var_in(&mesh_group, "mesh_mu")?.get_values::<f64, _>(point..point + 1)?[0])
            }
        }
    }

    /* ---------------- snapshot readers ---------------- */

    /// Read the nodal displacement of one element, `[T, npol+1, npol+1, 3]`.
    ///
    /// Missing components (e.g. `disp_p` of a monopole database) stay zero.
    fn read_displacement_nodal(&self, gll_ids: &Array2<usize>) -> Result<Array4<f64>> {
        let np1 = self.npol + 1;
        let nt = self.ndumps;
        let snapshots = group(&self.file, "Snapshots")?;
        let mut u = Array4::<f64>::zeros((nt, np1, np1, 3));

        let flat: Vec<usize> = gll_ids.iter().copied().collect();
        for (c, name) in ["disp_s", "disp_p", "disp_z"].into_iter().enumerate() {
            let Some(var) = snapshots.variable(name) else {
                continue;
            };
            let columns = read_time_columns(&var, &flat, nt)?;
            for i in 0..np1 {
                for j in 0..np1 {
                    let col = &columns[i * np1 + j];
                    for t in 0..nt {
                        u[[t, i, j, c]] = col[t];
                    }
                }
            }
        }
        Ok(u)
    }

    /// Read and Voigt-remap the stored strain traces of one element,
    /// `[T, 6]`.
    fn read_strain_traces_raw(&self, elem: usize) -> Result<Array2<f64>> {
        let nt = self.ndumps;
        let snapshots = group(&self.file, "Snapshots")?;

        // Stored order: dsus, dsuz, dpup, dsup, dzup, straintrace.
        let mut raw = Array2::<f64>::zeros((nt, 6));
        for (k, name) in [
            "strain_dsus",
            "strain_dsuz",
            "strain_dpup",
            "strain_dsup",
            "strain_dzup",
            "straintrace",
        ]
        .into_iter()
        .enumerate()
        {
            let Some(var) = snapshots.variable(name) else {
                continue;
            };
            let col = &read_time_columns(&var, &[elem], nt)?[0];
            for t in 0..nt {
                raw[[t, k]] = col[t];
            }
        }

        Ok(voigt_remap_strain(&raw))
    }

    /* ---------------- buffered field access ---------------- */

    /// Interpolated strain at the query point, `[T, 6]`, reconstructing and
    /// buffering the nodal strain of the element on a miss. Applies the
    /// non-monopole sign flips on ε_zp and ε_sp.
    pub(crate) fn strain_interp(&mut self, q: &ResolvedElement) -> Result<Array2<f64>> {
        let key = q.elem as u64;
        if !self.strain_buffer.contains(key) {
            let u = self.read_displacement_nodal(&q.gll_ids)?;
            let strain = strain_td(
                u.view(),
                self.excitation,
                q.gt.view(),
                q.g.view(),
                &q.xi_nodes,
                &q.eta_nodes,
                &q.corners,
                q.kind,
                q.axial,
            );
            self.strain_buffer.add(key, StrainEntry::Nodal(strain));
        }
        let Some(StrainEntry::Nodal(strain)) = self.strain_buffer.get(key) else {
            return Err(ExtractError::MalformedDatabase(
                "strain buffer holds traces for a displacement database".into(),
            ));
        };

        let nt = strain.dim().0;
        let mut out = Array2::<f64>::zeros((nt, 6));
        for c in 0..6 {
            let series = lagrange_interp_2d(
                &q.xi_nodes,
                &q.eta_nodes,
                strain.index_axis(ndarray::Axis(3), c),
                q.xi,
                q.eta,
            );
            for t in 0..nt {
                out[[t, c]] = series[t];
            }
        }
        if self.excitation != Excitation::Monopole {
            for t in 0..nt {
                out[[t, 3]] *= -1.0;
                out[[t, 5]] *= -1.0;
            }
        }
        Ok(out)
    }

    /// Stored strain traces of an element, `[T, 6]`, buffered by element id.
    pub(crate) fn strain_traces(&mut self, elem: usize) -> Result<Array2<f64>> {
        let key = elem as u64;
        if !self.strain_buffer.contains(key) {
            let voigt = self.read_strain_traces_raw(elem)?;
            self.strain_buffer.add(key, StrainEntry::Traces(voigt));
        }
        match self.strain_buffer.get(key) {
            Some(StrainEntry::Traces(v)) => Ok(v.clone()),
            _ => Err(ExtractError::MalformedDatabase(
                "strain buffer holds nodal strain for a strain database".into(),
            )),
        }
    }

    /// Interpolated displacement at the query point, `[T, 3]`, buffering the
    /// nodal field of the element on a miss.
    pub(crate) fn displacement_interp(&mut self, q: &ResolvedElement) -> Result<Array2<f64>> {
        let key = q.elem as u64;
        if !self.displ_buffer.contains(key) {
            let u = self.read_displacement_nodal(&q.gll_ids)?;
            self.displ_buffer.add(key, u);
        }
        let Some(u) = self.displ_buffer.get(key) else {
            return Err(ExtractError::MalformedDatabase(
                "displacement buffer lost the entry it just stored".into(),
            ));
        };

        let nt = u.dim().0;
        let mut out = Array2::<f64>::zeros((nt, 3));
        for c in 0..3 {
            let series = lagrange_interp_2d(
                &q.xi_nodes,
                &q.eta_nodes,
                u.index_axis(ndarray::Axis(3), c),
                q.xi,
                q.eta,
            );
            for t in 0..nt {
                out[[t, c]] = series[t];
            }
        }
        Ok(out)
    }
}

/// Voigt remap of the stored strain-trace order
/// (dsus, dsuz, dpup, dsup, dzup, straintrace) into
/// (ss, pp, zz, zp, sz, sp), with ε_zz = trace - ε_ss - ε_pp and the stored
/// zp/sp sign convention.
fn voigt_remap_strain(raw: &Array2<f64>) -> Array2<f64> {
    let nt = raw.dim().0;
    let mut voigt = Array2::<f64>::zeros((nt, 6));
    for t in 0..nt {
        voigt[[t, 0]] = raw[[t, 0]];
        voigt[[t, 1]] = raw[[t, 2]];
        voigt[[t, 2]] = raw[[t, 5]] - raw[[t, 0]] - raw[[t, 2]];
        voigt[[t, 3]] = -raw[[t, 4]];
        voigt[[t, 4]] = raw[[t, 1]];
        voigt[[t, 5]] = -raw[[t, 3]];
    }
    voigt
}

/// Which index of `mesh_mu` answers a query in `elem`: the central GLL point
/// for displacement dumps, the element id itself for strain dumps (the
/// producer's own reader does the latter; see `Mesh::mu_for_element`).
fn mu_lookup_index(
    dump: DumpType,
    elem: usize,
    gll_ids: Option<&Array2<usize>>,
    npol: usize,
) -> usize {
    match (dump, gll_ids) {
        (DumpType::DisplOnly, Some(ids)) => ids[[npol / 2, npol / 2]],
        _ => elem,
    }
}

/* ---------------- low-level file access ---------------- */

fn decode_eltype(code: i64) -> Result<ElemKind> {
    ElemKind::from_code(code)
        .ok_or_else(|| ExtractError::MalformedDatabase(format!("unknown eltype code {code}")))
}

fn to_usize(v: Vec<i64>) -> Vec<usize> {
    v.into_iter().map(|x| x as usize).collect()
}

fn group<'f>(file: &'f netcdf::File, name: &str) -> Result<netcdf::Group<'f>> {
    file.group(name)?
        .ok_or_else(|| ExtractError::MalformedDatabase(format!("missing group '{name}'")))
}

fn var_in<'a>(grp: &'a netcdf::Group<'_>, name: &str) -> Result<netcdf::Variable<'a>> {
    grp.variable(name)
        .ok_or_else(|| ExtractError::MalformedDatabase(format!("missing variable '{name}'")))
}

fn attr_value(file: &netcdf::File, name: &str) -> Result<netcdf::AttributeValue> {
    file.attribute(name)
        .ok_or_else(|| ExtractError::MalformedDatabase(format!("missing attribute '{name}'")))?
        .value()
        .map_err(Into::into)
}

fn attr_string(file: &netcdf::File, name: &str) -> Result<String> {
    use netcdf::AttributeValue as A;
    match attr_value(file, name)? {
        A::Str(s) => Ok(s.trim().to_string()),
        other => Err(ExtractError::MalformedDatabase(format!(
            "attribute '{name}' is not a string ({other:?})"
        ))),
    }
}

fn attr_f64(file: &netcdf::File, name: &str) -> Result<f64> {
    use netcdf::AttributeValue as A;
    match attr_value(file, name)? {
        A::Double(v) => Ok(v),
        A::Float(v) => Ok(f64::from(v)),
        A::Int(v) => Ok(f64::from(v)),
        A::Uint(v) => Ok(f64::from(v)),
        A::Short(v) => Ok(f64::from(v)),
        A::Ushort(v) => Ok(f64::from(v)),
        A::Longlong(v) => Ok(v as f64),
        A::Ulonglong(v) => Ok(v as f64),
        other => Err(ExtractError::MalformedDatabase(format!(
            "attribute '{name}' is not numeric ({other:?})"
        ))),
    }
}

fn attr_i64(file: &netcdf::File, name: &str) -> Result<i64> {
    use netcdf::AttributeValue as A;
    match attr_value(file, name)? {
        A::Int(v) => Ok(i64::from(v)),
        A::Uint(v) => Ok(i64::from(v)),
        A::Short(v) => Ok(i64::from(v)),
        A::Ushort(v) => Ok(i64::from(v)),
        A::Schar(v) => Ok(i64::from(v)),
        A::Uchar(v) => Ok(i64::from(v)),
        A::Longlong(v) => Ok(v),
        A::Ulonglong(v) => Ok(v as i64),
        A::Double(v) => Ok(v as i64),
        A::Float(v) => Ok(v as i64),
        other => Err(ExtractError::MalformedDatabase(format!(
            "attribute '{name}' is not an integer ({other:?})"
        ))),
    }
}

/// Indexed read from a 1-D variable under the sort-read-permute rule.
fn read_indexed_f64(var: &netcdf::Variable<'_>, ids: &[usize]) -> Result<Vec<f64>> {
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by_key(|&k| ids[k]);
    let mut out = vec![0.0; ids.len()];
    for &k in &order {
        out[k] = var.get_values::<f64, _>(ids[k]..ids[k] + 1)?[0];
    }
    Ok(out)
}

/// Read full time columns at the given point/element ids from a snapshot
/// variable, honoring the sort-read-permute rule and detecting repacked
/// (transposed) dimension order by comparing against the time-sample count.
fn read_time_columns(
    var: &netcdf::Variable<'_>,
    ids: &[usize],
    nt: usize,
) -> Result<Vec<Vec<f64>>> {
    let dims = var.dimensions();
    if dims.len() != 2 {
        return Err(ExtractError::MalformedDatabase(format!(
            "snapshot variable '{}' is not 2-D",
            var.name()
        )));
    }
    let time_major = dims[0].len() == nt;

    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.sort_by_key(|&k| ids[k]);

    let mut out = vec![Vec::new(); ids.len()];
    for &k in &order {
        let id = ids[k];
        let col = if time_major {
            var.get_values::<f64, _>((.., id..id + 1))?
        } else {
            var.get_values::<f64, _>((id..id + 1, ..))?
        };
        out[k] = col;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tmp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("axigram_mesh_{name}_{nanos}.nc"))
    }

    #[test]
    fn voigt_remap_matches_stored_convention() {
        // Stored order: dsus, dsuz, dpup, dsup, dzup, straintrace.
        let mut raw = Array2::<f64>::zeros((2, 6));
        for (k, v) in [1.0, 2.0, 3.0, 4.0, 5.0, 21.0].into_iter().enumerate() {
            raw[[0, k]] = v;
            raw[[1, k]] = 10.0 * v;
        }
        let voigt = voigt_remap_strain(&raw);
        // (ss, pp, zz, zp, sz, sp) = (dsus, dpup, trace-ss-pp, -dzup, dsuz, -dsup).
        let want = [1.0, 3.0, 17.0, -5.0, 2.0, -4.0];
        for (k, w) in want.into_iter().enumerate() {
            assert_abs_diff_eq!(voigt[[0, k]], w);
            assert_abs_diff_eq!(voigt[[1, k]], 10.0 * w);
        }
    }

    #[test]
    fn mu_index_uses_central_gll_point_for_displacement_dumps() {
        let npol = 4;
        let mut ids = Array2::<usize>::zeros((npol + 1, npol + 1));
        for (k, v) in ids.iter_mut().enumerate() {
            *v = 1000 + k;
        }
        let central = ids[[2, 2]];
        assert_eq!(
            mu_lookup_index(DumpType::DisplOnly, 7, Some(&ids), npol),
            central
        );
    }

    #[test]
    fn mu_index_falls_back_to_the_element_id_for_strain_dumps() {
        let ids = Array2::<usize>::zeros((5, 5));
        assert_eq!(mu_lookup_index(DumpType::StrainOnly, 7, Some(&ids), 4), 7);
        assert_eq!(mu_lookup_index(DumpType::FullFields, 9, None, 4), 9);
        assert_eq!(mu_lookup_index(DumpType::DisplOnly, 3, None, 4), 3);
    }

    #[test]
    fn eltype_codes_decode_and_reject() {
        assert_eq!(decode_eltype(0).unwrap(), ElemKind::Linear);
        assert_eq!(decode_eltype(1).unwrap(), ElemKind::Subpar);
        assert_eq!(decode_eltype(2).unwrap(), ElemKind::Semino);
        assert_eq!(decode_eltype(3).unwrap(), ElemKind::Semiso);
        assert!(matches!(
            decode_eltype(42),
            Err(ExtractError::MalformedDatabase(_))
        ));
    }

    #[test]
    fn indexed_reads_restore_caller_order() {
        let path = tmp_path("indexed");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("points", 8).unwrap();
            let mut var = file.add_variable::<f64>("w", &["points"]).unwrap();
            let data: Vec<f64> = (0..8).map(|i| i as f64).collect();
            var.put_values(&data, ..).unwrap();
        }
        let file = netcdf::open(&path).unwrap();
        let var = file.variable("w").unwrap();
        // Unsorted request; the read happens ascending, the result in
        // caller order.
        let got = read_indexed_f64(&var, &[4, 0, 3]).unwrap();
        assert_eq!(got, vec![4.0, 0.0, 3.0]);
        drop(file);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn time_columns_read_identically_from_transposed_variables() {
        const NT: usize = 4;
        const NP: usize = 6;
        let value = |t: usize, p: usize| (t * 100 + p) as f64;

        let path = tmp_path("transposed");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("time", NT).unwrap();
            file.add_dimension("points", NP).unwrap();

            let mut tm: Vec<f64> = Vec::with_capacity(NT * NP);
            for t in 0..NT {
                for p in 0..NP {
                    tm.push(value(t, p));
                }
            }
            let mut var = file.add_variable::<f64>("tm", &["time", "points"]).unwrap();
            var.put_values(&tm, ..).unwrap();

            // Same logical content with the dimensions reversed, as a
            // repacking with transposed storage produces.
            let mut pm: Vec<f64> = Vec::with_capacity(NT * NP);
            for p in 0..NP {
                for t in 0..NT {
                    pm.push(value(t, p));
                }
            }
            let mut var = file.add_variable::<f64>("pm", &["points", "time"]).unwrap();
            var.put_values(&pm, ..).unwrap();
        }

        let file = netcdf::open(&path).unwrap();
        let ids = [3usize, 0, 5];
        let a = read_time_columns(&file.variable("tm").unwrap(), &ids, NT).unwrap();
        let b = read_time_columns(&file.variable("pm").unwrap(), &ids, NT).unwrap();
        for (k, &p) in ids.iter().enumerate() {
            assert_eq!(a[k].len(), NT);
            for t in 0..NT {
                assert_abs_diff_eq!(a[k][t], value(t, p));
                assert_abs_diff_eq!(b[k][t], value(t, p));
            }
        }
        drop(file);
        let _ = std::fs::remove_file(path);
    }
}
