use super::beam::{BeamPattern, AIRY_ZEROS};
use crate::prelude::{SurveyError, SurveyResult};
use crate::propagation::ScatteringLaw;
use serde::{Deserialize, Serialize};

/// Beam geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    pub pattern: BeamPattern,
    /// Full width at half maximum [arcmin].
    pub fwhm_arcmin: f64,
    /// Airy side lobes included in the beam.
    pub n_sidelobes: usize,
    /// Radius of the Gaussian and tophat beams in units of the FWHM.
    pub extent_fwhm: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            pattern: BeamPattern::Gaussian,
            fwhm_arcmin: 14.0,
            n_sidelobes: 1,
            extent_fwhm: 2.0,
        }
    }
}

/// Observable part of the sky and of pulse-width space.
///
/// Angles in degrees; galactic longitude is compared in (-180, 180].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionLimits {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
    pub gl_min: f64,
    pub gl_max: f64,
    pub gb_min: f64,
    pub gb_max: f64,
    /// Narrowest arrival width the back-end searches [ms].
    pub w_min: Option<f64>,
    /// Widest arrival width the back-end searches [ms].
    pub w_max: Option<f64>,
}

impl Default for RegionLimits {
    fn default() -> Self {
        Self {
            ra_min: 0.0,
            ra_max: 360.0,
            dec_min: -90.0,
            dec_max: 90.0,
            gl_min: -180.0,
            gl_max: 180.0,
            gb_min: -90.0,
            gb_max: 90.0,
            w_min: None,
            w_max: None,
        }
    }
}

/// Instrumental parameters of one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub name: String,
    pub beam: BeamConfig,
    /// Centre frequency [MHz].
    pub central_freq: f64,
    /// Observing bandwidth [MHz].
    pub bw: f64,
    /// Channel bandwidth [MHz].
    pub bw_chan: f64,
    /// Receiver temperature [K].
    pub t_rec: f64,
    /// Any further contribution to the system temperature [K].
    pub t_extra: f64,
    /// Telescope gain [K/Jy].
    pub gain: f64,
    /// Sampling time [ms].
    pub t_samp: f64,
    pub n_pol: u32,
    pub snr_limit: f64,
    /// Digitisation and back-end loss factor.
    pub beta: f64,
    pub region: RegionLimits,
    pub scattering: ScatteringLaw,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            name: "htru".into(),
            beam: BeamConfig::default(),
            central_freq: 1352.0,
            bw: 340.0,
            bw_chan: 0.390,
            t_rec: 28.0,
            t_extra: 0.0,
            gain: 0.69,
            t_samp: 0.064,
            n_pol: 2,
            snr_limit: 10.0,
            beta: 1.2,
            region: RegionLimits::default(),
            scattering: ScatteringLaw::default(),
        }
    }
}

fn positive(name: &str, value: f64) -> SurveyResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SurveyError::InvalidConfig(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

fn ordered(name: &str, min: f64, max: f64) -> SurveyResult<()> {
    if min <= max {
        Ok(())
    } else {
        Err(SurveyError::InvalidConfig(format!(
            "{} limits are inverted: {} > {}",
            name, min, max
        )))
    }
}

impl SurveyConfig {
    pub fn validate(&self) -> SurveyResult<()> {
        positive("central frequency", self.central_freq)?;
        positive("bandwidth", self.bw)?;
        positive("channel bandwidth", self.bw_chan)?;
        positive("gain", self.gain)?;
        positive("sampling time", self.t_samp)?;
        positive("beta", self.beta)?;
        positive("beam FWHM", self.beam.fwhm_arcmin)?;
        positive("beam extent", self.beam.extent_fwhm)?;
        if self.bw >= 2.0 * self.central_freq {
            return Err(SurveyError::InvalidConfig(format!(
                "bandwidth {} MHz reaches below zero frequency",
                self.bw
            )));
        }
        if self.n_pol == 0 {
            return Err(SurveyError::InvalidConfig(
                "at least one polarisation is required".into(),
            ));
        }
        if self.t_rec < 0.0 || self.t_extra < 0.0 {
            return Err(SurveyError::InvalidConfig(
                "temperatures must not be negative".into(),
            ));
        }
        if self.beam.pattern == BeamPattern::Airy && self.beam.n_sidelobes >= AIRY_ZEROS.len() {
            return Err(SurveyError::InvalidConfig(format!(
                "at most {} Airy side lobes are supported, got {}",
                AIRY_ZEROS.len() - 1,
                self.beam.n_sidelobes
            )));
        }

        let r = &self.region;
        ordered("right ascension", r.ra_min, r.ra_max)?;
        ordered("declination", r.dec_min, r.dec_max)?;
        ordered("galactic longitude", r.gl_min, r.gl_max)?;
        ordered("galactic latitude", r.gb_min, r.gb_max)?;
        if let (Some(min), Some(max)) = (r.w_min, r.w_max) {
            ordered("width", min, max)?;
        }
        Ok(())
    }
}
