//! Source and receiver descriptions.
//!
//! Latitudes are geographic degrees at the API surface and converted to
//! geocentric internally (WGS84 flattening); every angle handed to the
//! rotation layer is a geocentric radian. Moment tensors are in N·m with the
//! usual (r, θ, φ) component naming; forces are in N in the source-local
//! spherical basis.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// WGS84 flattening used for the geographic → geocentric conversion.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Geocentric colatitude in radians for a geographic latitude in degrees.
#[must_use]
pub fn geocentric_colatitude_rad(latitude_deg: f64) -> f64 {
    let lat = latitude_deg.to_radians();
    if (lat.abs() - FRAC_PI_2).abs() < 1e-12 {
        return FRAC_PI_2 - lat;
    }
    let geocentric = ((1.0 - WGS84_F) * (1.0 - WGS84_F) * lat.tan()).atan();
    FRAC_PI_2 - geocentric
}

/// Cartesian Earth-frame coordinates of a point at geocentric colatitude
/// `colat`, longitude `lon` (radians) and radius `r`.
fn xyz_at(colat: f64, lon: f64, r: f64) -> [f64; 3] {
    [
        r * colat.sin() * lon.cos(),
        r * colat.sin() * lon.sin(),
        r * colat.cos(),
    ]
}

/// A seismic receiver on or below the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    /// Geographic latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Burial depth in metres (0 at the surface).
    pub depth_in_m: f64,
    /// Network code, informational only.
    pub network: String,
    /// Station code, informational only.
    pub station: String,
}

impl Receiver {
    /// Receiver at the surface with empty codes.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            depth_in_m: 0.0,
            network: String::new(),
            station: String::new(),
        }
    }

    /// Geocentric colatitude in radians.
    #[must_use]
    pub fn colatitude_rad(&self) -> f64 {
        geocentric_colatitude_rad(self.latitude)
    }

    /// Longitude in radians.
    #[must_use]
    pub fn longitude_rad(&self) -> f64 {
        self.longitude.to_radians()
    }

    /// Earth-frame Cartesian coordinates for a given planet radius.
    #[must_use]
    pub fn xyz(&self, planet_radius: f64) -> [f64; 3] {
        xyz_at(
            self.colatitude_rad(),
            self.longitude_rad(),
            planet_radius - self.depth_in_m,
        )
    }
}

/// A moment-tensor point source. Tensor components in N·m, (r, θ, φ) naming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Geographic latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Source depth in metres.
    pub depth_in_m: f64,
    /// M_rr component.
    pub m_rr: f64,
    /// M_tt component.
    pub m_tt: f64,
    /// M_pp component.
    pub m_pp: f64,
    /// M_rt component.
    pub m_rt: f64,
    /// M_rp component.
    pub m_rp: f64,
    /// M_tp component.
    pub m_tp: f64,
}

impl Source {
    /// Moment tensor source at the surface.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        latitude: f64,
        longitude: f64,
        depth_in_m: f64,
        m_rr: f64,
        m_tt: f64,
        m_pp: f64,
        m_rt: f64,
        m_rp: f64,
        m_tp: f64,
    ) -> Self {
        Self {
            latitude,
            longitude,
            depth_in_m,
            m_rr,
            m_tt,
            m_pp,
            m_rt,
            m_rp,
            m_tp,
        }
    }

    /// Components in (rr, tt, pp, rt, rp, tp) order, as used by the
    /// forward-mode elemental-field summation.
    #[must_use]
    pub fn tensor(&self) -> [f64; 6] {
        [self.m_rr, self.m_tt, self.m_pp, self.m_rt, self.m_rp, self.m_tp]
    }

    /// Voigt components in the source-local xyz frame (x = θ, y = φ, z = r):
    /// (xx, yy, zz, yz, xz, xy) = (tt, pp, rr, rp, rt, tp).
    #[must_use]
    pub fn tensor_voigt(&self) -> [f64; 6] {
        [self.m_tt, self.m_pp, self.m_rr, self.m_rp, self.m_rt, self.m_tp]
    }

    /// Geocentric colatitude in radians.
    #[must_use]
    pub fn colatitude_rad(&self) -> f64 {
        geocentric_colatitude_rad(self.latitude)
    }

    /// Longitude in radians.
    #[must_use]
    pub fn longitude_rad(&self) -> f64 {
        self.longitude.to_radians()
    }

    /// Earth-frame Cartesian coordinates for a given planet radius.
    #[must_use]
    pub fn xyz(&self, planet_radius: f64) -> [f64; 3] {
        xyz_at(
            self.colatitude_rad(),
            self.longitude_rad(),
            planet_radius - self.depth_in_m,
        )
    }
}

/// A point-force source in the source-local spherical basis, in N.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForceSource {
    /// Geographic latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Source depth in metres.
    pub depth_in_m: f64,
    /// Radial (up) force component.
    pub f_r: f64,
    /// Southward (θ) force component.
    pub f_t: f64,
    /// Eastward (φ) force component.
    pub f_p: f64,
}

impl ForceSource {
    /// Force source at depth.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, depth_in_m: f64, f_r: f64, f_t: f64, f_p: f64) -> Self {
        Self {
            latitude,
            longitude,
            depth_in_m,
            f_r,
            f_t,
            f_p,
        }
    }

    /// Components in the source-local xyz frame (x = θ, y = φ, z = r).
    #[must_use]
    pub fn force_tpr(&self) -> [f64; 3] {
        [self.f_t, self.f_p, self.f_r]
    }

    /// Geocentric colatitude in radians.
    #[must_use]
    pub fn colatitude_rad(&self) -> f64 {
        geocentric_colatitude_rad(self.latitude)
    }

    /// Longitude in radians.
    #[must_use]
    pub fn longitude_rad(&self) -> f64 {
        self.longitude.to_radians()
    }

    /// Earth-frame Cartesian coordinates for a given planet radius.
    #[must_use]
    pub fn xyz(&self, planet_radius: f64) -> [f64; 3] {
        xyz_at(
            self.colatitude_rad(),
            self.longitude_rad(),
            planet_radius - self.depth_in_m,
        )
    }
}

/// Either kind of point source accepted by the extraction engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SourceMechanism {
    /// Moment-tensor source.
    Moment(Source),
    /// Point-force source.
    Force(ForceSource),
}

impl SourceMechanism {
    /// Geocentric colatitude in radians.
    #[must_use]
    pub fn colatitude_rad(&self) -> f64 {
        match self {
            Self::Moment(s) => s.colatitude_rad(),
            Self::Force(s) => s.colatitude_rad(),
        }
    }

    /// Longitude in radians.
    #[must_use]
    pub fn longitude_rad(&self) -> f64 {
        match self {
            Self::Moment(s) => s.longitude_rad(),
            Self::Force(s) => s.longitude_rad(),
        }
    }

    /// Earth-frame Cartesian coordinates.
    #[must_use]
    pub fn xyz(&self, planet_radius: f64) -> [f64; 3] {
        match self {
            Self::Moment(s) => s.xyz(planet_radius),
            Self::Force(s) => s.xyz(planet_radius),
        }
    }
}

impl From<Source> for SourceMechanism {
    fn from(s: Source) -> Self {
        Self::Moment(s)
    }
}

impl From<ForceSource> for SourceMechanism {
    fn from(s: ForceSource) -> Self {
        Self::Force(s)
    }
}
