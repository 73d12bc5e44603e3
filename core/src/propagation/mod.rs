//! Galactic propagation effects: Milky-Way dispersion, scattering and
//! scintillation.
//!
//! The electron-density model is injected through [`ElectronDensityModel`].
//! Every call into a model passes through the wrappers in this module, which
//! clamp the line-of-sight distance to [`MAX_DISTANCE_KPC`]; the models are
//! undefined beyond it and the Galaxy is well cleared by then.

pub mod disk;
#[cfg(feature = "ne2001")]
pub mod ne2001;

pub use disk::ExponentialDisk;

use crate::prelude::{SurveyError, SurveyResult};
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Largest distance handed to an electron-density model [kpc].
pub const MAX_DISTANCE_KPC: f64 = 100.0;

/// Kiloparsecs per gigaparsec.
const KPC_PER_GPC: f64 = 1e6;

/// Width of the log-normal scatter around the scattering relation [dex].
const SCATTER_DEX: f64 = 0.8;

/// Line-of-sight electron-density model of the Milky Way.
///
/// Distances are in kpc and are never above [`MAX_DISTANCE_KPC`].
pub trait ElectronDensityModel {
    /// Dispersion measure [pc cm^-3] towards galactic longitude/latitude in
    /// degrees.
    fn dispersion_measure(&self, dist_kpc: f64, gl_deg: f64, gb_deg: f64) -> f64;

    /// Scattering measure and its `smtau` weighting towards galactic
    /// longitude/latitude in radians.
    fn scattering_parameters(&self, gl_rad: f64, gb_rad: f64, dist_kpc: f64) -> (f64, f64);

    /// Batched form of [`ElectronDensityModel::dispersion_measure`].
    fn dispersion_measures(
        &self,
        dist_kpc: ArrayView1<f64>,
        gl_deg: ArrayView1<f64>,
        gb_deg: ArrayView1<f64>,
    ) -> Array1<f64> {
        dist_kpc
            .iter()
            .zip(gl_deg.iter().zip(gb_deg.iter()))
            .map(|(&d, (&l, &b))| self.dispersion_measure(d, l, b))
            .collect()
    }

    /// Batched form of [`ElectronDensityModel::scattering_parameters`];
    /// returns `(sm, smtau)`.
    fn scattering_parameters_batch(
        &self,
        gl_rad: ArrayView1<f64>,
        gb_rad: ArrayView1<f64>,
        dist_kpc: ArrayView1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let n = dist_kpc.len();
        let mut sm = Array1::zeros(n);
        let mut smtau = Array1::zeros(n);
        for i in 0..n {
            let (s, t) = self.scattering_parameters(gl_rad[i], gb_rad[i], dist_kpc[i]);
            sm[i] = s;
            smtau[i] = t;
        }
        (sm, smtau)
    }
}

fn clamp_kpc(dist_kpc: f64) -> SurveyResult<f64> {
    if !(dist_kpc >= 0.0) {
        return Err(SurveyError::InvalidInput(format!(
            "line-of-sight distance must be non-negative, got {} kpc",
            dist_kpc
        )));
    }
    Ok(dist_kpc.min(MAX_DISTANCE_KPC))
}

fn check_lengths(expected: usize, others: &[(&'static str, usize)]) -> SurveyResult<()> {
    for &(column, found) in others {
        if found != expected {
            return Err(SurveyError::LengthMismatch {
                column,
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Milky-Way dispersion measure [pc cm^-3] for sources at `dist` [Gpc].
pub fn milky_way_dm(
    model: &dyn ElectronDensityModel,
    dist: ArrayView1<f64>,
    gl: ArrayView1<f64>,
    gb: ArrayView1<f64>,
) -> SurveyResult<Array1<f64>> {
    check_lengths(dist.len(), &[("gl", gl.len()), ("gb", gb.len())])?;
    let clamped = dist
        .iter()
        .map(|&d| clamp_kpc(d * KPC_PER_GPC))
        .collect::<SurveyResult<Array1<f64>>>()?;
    Ok(model.dispersion_measures(clamped.view(), gl, gb))
}

/// Scattering measure and `smtau` for sources at `dist_kpc`, with galactic
/// coordinates in degrees.
pub fn scattering_measures(
    model: &dyn ElectronDensityModel,
    dist_kpc: ArrayView1<f64>,
    gl: ArrayView1<f64>,
    gb: ArrayView1<f64>,
) -> SurveyResult<(Array1<f64>, Array1<f64>)> {
    check_lengths(dist_kpc.len(), &[("gl", gl.len()), ("gb", gb.len())])?;
    let clamped = dist_kpc
        .iter()
        .map(|&d| clamp_kpc(d))
        .collect::<SurveyResult<Array1<f64>>>()?;
    let gl_rad = gl.mapv(f64::to_radians);
    let gb_rad = gb.mapv(f64::to_radians);
    Ok(model.scattering_parameters_batch(gl_rad.view(), gb_rad.view(), clamped.view()))
}

/// Diffractive scintillation timescale [s] and bandwidth [kHz] at `freq`
/// [MHz] for sources at `dist` [Gpc].
///
/// Only the Milky-Way screen contributes. Sources whose (tau-weighted)
/// scattering measure is not positive get `NaN`, meaning no estimate is
/// available.
pub fn scintillation_parameters(
    model: &dyn ElectronDensityModel,
    dist: ArrayView1<f64>,
    gl: ArrayView1<f64>,
    gb: ArrayView1<f64>,
    freq: f64,
) -> SurveyResult<(Array1<f64>, Array1<f64>)> {
    let dist_kpc = dist
        .iter()
        .map(|&d| clamp_kpc(d * KPC_PER_GPC))
        .collect::<SurveyResult<Array1<f64>>>()?;
    let (sm, smtau) = scattering_measures(model, dist_kpc.view(), gl, gb)?;
    let f_ghz = freq / 1e3;

    // Cordes & Lazio (1991) eq. 46, with the 3.3 coefficient used in
    // practice instead of the published 2.3.
    let scint_time = smtau.mapv(|t| {
        if t > 0.0 {
            3.3 * f_ghz.powf(1.2) * t.powf(-0.6)
        } else {
            f64::NAN
        }
    });

    // Cordes & Lazio (1991) eq. 48.
    let scint_bw = sm
        .iter()
        .zip(dist_kpc.iter())
        .map(|(&s, &d)| {
            if s > 0.0 {
                223.0 * f_ghz.powf(4.4) * s.powf(-1.2) / d
            } else {
                f64::NAN
            }
        })
        .collect();

    Ok((scint_time, scint_bw))
}

/// Parameters of the empirical scattering-time relation.
///
/// Defaults follow Bhat et al. (2004).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatteringLaw {
    pub offset: f64,
    pub scindex: f64,
}

impl Default for ScatteringLaw {
    fn default() -> Self {
        Self {
            offset: -6.46,
            scindex: -3.86,
        }
    }
}

impl ScatteringLaw {
    /// Mean log10 scattering time [ms] for a dispersion measure at `freq`
    /// [MHz].
    pub fn mean_log_time(&self, dm: f64, freq: f64) -> f64 {
        let log_dm = dm.log10();
        self.offset + 0.154 * log_dm + 1.07 * log_dm * log_dm + self.scindex * (freq / 1e3).log10()
    }
}

/// Draws scattering timescales [ms] around the empirical relation.
///
/// Each source scatters with 0.8 dex of log-normal spread (Lorimer et al.
/// 2008), so repeated calls give different values.
pub fn scattering_timescale<R: Rng + ?Sized>(
    dm: ArrayView1<f64>,
    law: &ScatteringLaw,
    freq: f64,
    rng: &mut R,
) -> SurveyResult<Array1<f64>> {
    let scatter = Normal::new(0.0, SCATTER_DEX)
        .map_err(|err| SurveyError::Distribution(format!("scattering: {}", err)))?;
    let mut t_scat = Array1::zeros(dm.len());
    for (out, &dm) in t_scat.iter_mut().zip(dm.iter()) {
        if !(dm > 0.0) {
            return Err(SurveyError::InvalidInput(format!(
                "scattering needs a positive dispersion measure, got {}",
                dm
            )));
        }
        let log_t = law.mean_log_time(dm, freq) + scatter.sample(rng);
        *out = 10f64.powf(log_t);
    }
    Ok(t_scat)
}
