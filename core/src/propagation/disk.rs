use super::ElectronDensityModel;
use serde::{Deserialize, Serialize};

/// Fluctuation-to-density conversion for the scattering measure
/// [kpc m^-20/3 per (cm^-6 kpc)].
const C_U: f64 = 10.2;

/// Analytic plane-parallel electron disk.
///
/// The density falls off exponentially with height above the plane and
/// stops at a finite galactocentric radius. It is a smooth stand-in for a
/// full model such as NE2001: it reproduces the latitude dependence of the
/// Milky-Way dispersion measure but none of the spiral-arm or clump
/// structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialDisk {
    /// Mid-plane electron density [cm^-3].
    pub n0: f64,
    /// Scale height [kpc].
    pub scale_height_kpc: f64,
    /// Radial extent of the disk along the line of sight [kpc].
    pub radius_kpc: f64,
    /// Fluctuation parameter of the turbulent component.
    pub fluctuation: f64,
}

impl Default for ExponentialDisk {
    fn default() -> Self {
        Self {
            n0: 0.014,
            scale_height_kpc: 1.8,
            radius_kpc: 20.0,
            fluctuation: 0.2,
        }
    }
}

impl ExponentialDisk {
    /// Integral of `exp(-k h / H)` along a sight line of length `dist_kpc`
    /// at latitude `gb_rad` [kpc].
    fn column(&self, dist_kpc: f64, gb_rad: f64, k: f64) -> f64 {
        let path = dist_kpc.min(self.radius_kpc);
        let sin_b = gb_rad.sin().abs();
        let scale = self.scale_height_kpc / k;
        if sin_b * path < 1e-9 * scale {
            return path;
        }
        scale / sin_b * (1.0 - (-path * sin_b / scale).exp())
    }
}

impl ElectronDensityModel for ExponentialDisk {
    fn dispersion_measure(&self, dist_kpc: f64, _gl_deg: f64, gb_deg: f64) -> f64 {
        // kpc -> pc
        self.n0 * self.column(dist_kpc, gb_deg.to_radians(), 1.0) * 1e3
    }

    fn scattering_parameters(&self, _gl_rad: f64, gb_rad: f64, dist_kpc: f64) -> (f64, f64) {
        let sm = C_U * self.fluctuation * self.n0 * self.n0 * self.column(dist_kpc, gb_rad, 2.0);
        // A uniform slab weights every part of the sight line alike.
        (sm, sm)
    }
}
