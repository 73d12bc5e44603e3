use super::config::BeamConfig;
use crate::math::bessel::airy_intensity;
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};

/// Shape of the beam's sensitivity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamPattern {
    /// Full sensitivity inside half the FWHM.
    Perfect,
    Gaussian,
    /// Diffraction pattern of a uniformly illuminated circular dish.
    Airy,
    /// Full sensitivity inside half the FWHM, none beyond it.
    Tophat,
}

/// Zeros of J1, i.e. the nulls of the Airy pattern.
pub const AIRY_ZEROS: [f64; 10] = [
    3.831_706, 7.015_587, 10.173_468, 13.323_692, 16.470_630, 19.615_859, 22.760_084,
    25.903_672, 29.046_829, 32.189_680,
];

/// Airy argument at which the intensity falls to one half.
const AIRY_HALF_POWER: f64 = 1.616_34;

impl BeamConfig {
    /// Radius out to which sources are placed in the beam [arcmin].
    pub fn max_offset(&self) -> f64 {
        match self.pattern {
            BeamPattern::Perfect => self.fwhm_arcmin / 2.0,
            BeamPattern::Gaussian | BeamPattern::Tophat => self.extent_fwhm * self.fwhm_arcmin,
            BeamPattern::Airy => {
                AIRY_ZEROS[self.n_sidelobes] * self.fwhm_arcmin / (2.0 * AIRY_HALF_POWER)
            }
        }
    }

    /// Sky area the beam covers [sq. deg].
    pub fn beam_size(&self) -> f64 {
        PI * (self.max_offset() / 60.0).powi(2)
    }

    /// Fractional sensitivity at `offset` arcmin from the pointing centre.
    pub fn gain_at(&self, offset: f64) -> f64 {
        let fwhm = self.fwhm_arcmin;
        match self.pattern {
            BeamPattern::Perfect => 1.0,
            BeamPattern::Gaussian => (-4.0 * LN_2 * (offset / fwhm).powi(2)).exp(),
            BeamPattern::Airy => airy_intensity(2.0 * AIRY_HALF_POWER * offset / fwhm),
            BeamPattern::Tophat => {
                if offset <= fwhm / 2.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Draws `n` beam positions and the sensitivity at each.
    ///
    /// Offsets are spread uniformly over the solid angle out to
    /// [`BeamConfig::max_offset`] and weighted by the profile, rather than
    /// drawn by inverting the profile itself. Returns `(gain, offset)` with
    /// offsets in arcmin.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> (Array1<f64>, Array1<f64>) {
        let max_offset = self.max_offset();
        let offset: Array1<f64> = (0..n)
            .map(|_| max_offset * rng.gen::<f64>().sqrt())
            .collect();
        let gain = offset.mapv(|r| self.gain_at(r));
        (gain, offset)
    }
}
