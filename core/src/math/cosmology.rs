//! Redshift to distance conversions.
//!
//! [`Redshift`] integrates the comoving-distance integral numerically in the
//! manner of Wright's cosmology calculator; [`approx_distance_from_redshift`]
//! and [`approx_redshift_from_distance`] trade accuracy for speed at low
//! redshift.

use crate::prelude::{SurveyError, SurveyResult};
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Speed of light [km/s].
pub const C_KMS: f64 = 299_792.458;

/// Number of scale-factor steps in the comoving-distance sum.
const INTEGRATION_STEPS: usize = 1000;

/// Curvature arguments below this use a Taylor expansion.
const SMALL_ARGUMENT: f64 = 0.1;

/// Cosmological parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cosmology {
    /// Hubble constant [km/s/Mpc].
    pub h0: f64,
    /// Omega matter.
    pub w_m: f64,
    /// Omega vacuum.
    pub w_v: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            h0: 67.74,
            w_m: 0.3089,
            w_v: 0.6911,
        }
    }
}

impl Cosmology {
    /// Omega radiation, fixed by the Hubble constant.
    pub fn w_r(&self) -> f64 {
        0.4165 / (self.h0 * self.h0)
    }

    /// Omega curvature.
    pub fn w_k(&self) -> f64 {
        1.0 - self.w_m - self.w_r() - self.w_v
    }

    /// Hubble distance [Mpc].
    pub fn hubble_distance(&self) -> f64 {
        C_KMS / self.h0
    }

    fn validate(&self) -> SurveyResult<()> {
        if !(self.h0.is_finite() && self.h0 > 0.0) {
            return Err(SurveyError::InvalidInput(format!(
                "Hubble constant must be positive, got {}",
                self.h0
            )));
        }
        Ok(())
    }
}

/// Distance measures for a set of redshifts under one cosmology.
///
/// The dimensionless comoving-distance sum is computed once and reused by
/// [`Redshift::dist_lum`] and [`Redshift::vol_co`].
#[derive(Debug, Clone)]
pub struct Redshift {
    z: Array1<f64>,
    cosmology: Cosmology,
    dcmr: Option<Array1<f64>>,
}

impl Redshift {
    pub fn new(z: ArrayView1<f64>, cosmology: Cosmology) -> SurveyResult<Self> {
        cosmology.validate()?;
        if let Some(bad) = z.iter().find(|&&z| !(z.is_finite() && z > -1.0)) {
            return Err(SurveyError::InvalidInput(format!(
                "redshift must be finite and above -1, got {}",
                bad
            )));
        }
        Ok(Self {
            z: z.to_owned(),
            cosmology,
            dcmr: None,
        })
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    fn dcmr(&mut self) -> &Array1<f64> {
        let cosmology = self.cosmology;
        let z = &self.z;
        self.dcmr.get_or_insert_with(|| {
            let (w_k, w_m, w_r, w_v) = (
                cosmology.w_k(),
                cosmology.w_m,
                cosmology.w_r(),
                cosmology.w_v,
            );
            z.mapv(|z| {
                let az = 1.0 / (1.0 + z);
                let sum: f64 = (0..INTEGRATION_STEPS)
                    .map(|i| {
                        let a = az + (1.0 - az) * (i as f64 + 0.5) / INTEGRATION_STEPS as f64;
                        let adot = (w_k + w_m / a + w_r / (a * a) + w_v * a * a).sqrt();
                        1.0 / (a * adot)
                    })
                    .sum();
                (1.0 - az) * sum / INTEGRATION_STEPS as f64
            })
        })
    }

    /// Comoving distance [Gpc].
    pub fn dist_co(&mut self) -> Array1<f64> {
        let scale = self.cosmology.hubble_distance() * 1e-3;
        self.dcmr().mapv(|d| d * scale)
    }

    /// Luminosity distance [Gpc].
    pub fn dist_lum(&mut self) -> Array1<f64> {
        let w_k = self.cosmology.w_k();
        let scale = self.cosmology.hubble_distance() * 1e-3;
        let z = self.z.clone();
        let dcmr = self.dcmr();

        let mut dl = Array1::zeros(dcmr.len());
        for (i, (&d, &z)) in dcmr.iter().zip(z.iter()).enumerate() {
            let x = w_k.abs().sqrt() * d;
            let ratio = if x > SMALL_ARGUMENT {
                if w_k > 0.0 {
                    x.sinh() / x
                } else {
                    x.sin() / x
                }
            } else {
                let y = if w_k < 0.0 { -x * x } else { x * x };
                1.0 + y / 6.0 + y * y / 120.0
            };
            // Angular-diameter distance times (1+z)^2.
            dl[i] = scale * ratio * d * (1.0 + z);
        }
        dl
    }

    /// Comoving volume enclosed within each redshift [Gpc^3].
    pub fn vol_co(&mut self) -> Array1<f64> {
        let w_k = self.cosmology.w_k();
        let scale = (1e-3 * self.cosmology.hubble_distance()).powi(3);

        self.dcmr().mapv(|d| {
            let x = w_k.abs().sqrt() * d;
            let ratio = if x > SMALL_ARGUMENT {
                let numerator = if w_k > 0.0 {
                    0.125 * ((2.0 * x).exp() - (-2.0 * x).exp()) - x / 2.0
                } else {
                    x / 2.0 - (2.0 * x).sin() / 4.0
                };
                numerator / (x.powi(3) / 3.0)
            } else {
                let y = if w_k < 0.0 { -x * x } else { x * x };
                1.0 + y / 5.0 + (2.0 / 105.0) * y * y
            };
            4.0 * PI * scale * ratio * d.powi(3) / 3.0
        })
    }
}

/// Converts redshifts to distances with the closed-form low-redshift relation.
///
/// Only valid for `z <= 2`. Returns distance in Gpc.
pub fn approx_distance_from_redshift(z: ArrayView1<f64>, h0: f64) -> SurveyResult<Array1<f64>> {
    if let Some(bad) = z.iter().find(|&&z| !(z.is_finite() && z > -1.0)) {
        return Err(SurveyError::InvalidInput(format!(
            "redshift must be finite and above -1, got {}",
            bad
        )));
    }
    let hubble = C_KMS / h0;
    Ok(z.mapv(|z| {
        let zsq = (z + 1.0).powi(2);
        hubble * (zsq - 1.0) / (zsq + 1.0) * 1e-3
    }))
}

/// Inverse of [`approx_distance_from_redshift`]; distances in Gpc.
pub fn approx_redshift_from_distance(
    dist: ArrayView1<f64>,
    h0: f64,
) -> SurveyResult<Array1<f64>> {
    let hubble = C_KMS / h0;
    let mut z = Array1::zeros(dist.len());
    for (out, &d) in z.iter_mut().zip(dist.iter()) {
        let dhc = d * 1e3 / hubble;
        if !(0.0..1.0).contains(&dhc) {
            return Err(SurveyError::InvalidInput(format!(
                "distance {} Gpc is negative or beyond the Hubble radius",
                d
            )));
        }
        let det = (1.0 - dhc * dhc).sqrt();
        *out = -(det + dhc - 1.0) / (dhc - 1.0);
    }
    Ok(z)
}

/// Draws the intergalactic-medium contribution to the dispersion measure
/// [pc cm^-3] for each redshift.
///
/// Mean `slope * z`; the standard deviation defaults to `0.2 * slope * z`.
pub fn igm_dispersion_measure<R: Rng + ?Sized>(
    z: ArrayView1<f64>,
    slope: f64,
    sigma: Option<f64>,
    rng: &mut R,
) -> SurveyResult<Array1<f64>> {
    let mut dm = Array1::zeros(z.len());
    for (out, &z) in dm.iter_mut().zip(z.iter()) {
        let mean = slope * z;
        let std_dev = sigma.unwrap_or(0.2 * mean);
        let normal = Normal::new(mean, std_dev)
            .map_err(|err| SurveyError::Distribution(format!("IGM DM: {}", err)))?;
        *out = normal.sample(rng);
    }
    Ok(dm)
}
