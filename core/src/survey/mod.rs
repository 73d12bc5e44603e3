//! Instrument model of a single survey.
//!
//! [`Survey`] is immutable once built and is shared read-only by every
//! source it observes. Each method works on a whole population at a time.

pub mod beam;
pub mod config;
pub mod sky;

pub use beam::BeamPattern;
pub use config::{BeamConfig, RegionLimits, SurveyConfig};
pub use sky::SkyTemperatureMap;

use crate::math::coords::galactic_to_equatorial;
use crate::population::Frbs;
use crate::prelude::{SurveyError, SurveyResult};
use crate::propagation::{scattering_timescale, scintillation_parameters, ElectronDensityModel};
use ndarray::{Array1, Zip};
use rand::Rng;
use rand_distr::{Distribution, Gamma};
use std::f64::consts::PI;

/// Dispersion constant scaled for MHz and ms.
const DM_SMEAR_CONSTANT: f64 = 8.297_616e6;

/// Metres per gigaparsec.
const METRES_PER_GPC: f64 = 3.0857e25;

/// Scintle-count coefficient.
const KAPPA: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct Survey {
    config: SurveyConfig,
    sky: SkyTemperatureMap,
}

impl Survey {
    pub fn new(config: SurveyConfig, sky: SkyTemperatureMap) -> SurveyResult<Self> {
        config.validate()?;
        Ok(Self { config, sky })
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn snr_limit(&self) -> f64 {
        self.config.snr_limit
    }

    /// Sky area covered by one beam [sq. deg].
    pub fn beam_size(&self) -> f64 {
        self.config.beam.beam_size()
    }

    /// Which sources fall inside the survey's sky coverage and searched
    /// width range.
    pub fn in_region(&self, frbs: &Frbs) -> Vec<bool> {
        let r = &self.config.region;
        let (ra, dec) = galactic_to_equatorial(frbs.gl.view(), frbs.gb.view());

        let mut mask = Vec::with_capacity(frbs.len());
        for i in 0..frbs.len() {
            let gl = {
                let l = frbs.gl[i].rem_euclid(360.0);
                if l > 180.0 {
                    l - 360.0
                } else {
                    l
                }
            };
            let gb = frbs.gb[i];
            let w = frbs.w_arr[i];

            let inside = (r.ra_min..=r.ra_max).contains(&ra[i])
                && (r.dec_min..=r.dec_max).contains(&dec[i])
                && (r.gl_min..=r.gl_max).contains(&gl)
                && (r.gb_min..=r.gb_max).contains(&gb)
                && r.w_min.map_or(true, |min| w >= min)
                && r.w_max.map_or(true, |max| w <= max);
            mask.push(inside);
        }
        mask
    }

    /// Draws `n` beam sensitivities and offsets [arcmin] for the configured
    /// beam shape.
    pub fn beam_response<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> (Array1<f64>, Array1<f64>) {
        self.config.beam.sample(n, rng)
    }

    /// Dispersion smearing across one frequency channel [ms].
    pub fn dm_smear(&self, frbs: &Frbs) -> Array1<f64> {
        let c = &self.config;
        frbs.dm
            .mapv(|dm| DM_SMEAR_CONSTANT * c.bw_chan * dm * c.central_freq.powi(-3))
    }

    /// Scattering timescale [ms] drawn around the survey's scattering law at
    /// the centre frequency.
    pub fn scattering<R: Rng + ?Sized>(&self, frbs: &Frbs, rng: &mut R) -> SurveyResult<Array1<f64>> {
        scattering_timescale(
            frbs.dm.view(),
            &self.config.scattering,
            self.config.central_freq,
            rng,
        )
    }

    /// Sky and system temperature [K] towards each source.
    pub fn system_temperature(&self, frbs: &Frbs) -> (Array1<f64>, Array1<f64>) {
        let c = &self.config;
        let t_sky = Zip::from(&frbs.gl)
            .and(&frbs.gb)
            .map_collect(|&gl, &gb| self.sky.temperature(gl, gb, c.central_freq));
        let t_sys = t_sky.mapv(|t| c.t_rec + t + c.t_extra);
        (t_sky, t_sys)
    }

    /// Observed pulse width [ms]: arrival width, channel smearing,
    /// scattering and sampling time added in quadrature.
    pub fn effective_pulse_width(&self, frbs: &Frbs) -> Array1<f64> {
        let t_samp = self.config.t_samp;
        Zip::from(&frbs.w_arr)
            .and(&frbs.t_dm)
            .and(&frbs.t_scat)
            .map_collect(|&w, &t_dm, &t_scat| {
                (w * w + t_dm * t_dm + t_scat * t_scat + t_samp * t_samp).sqrt()
            })
    }

    /// Peak flux density [Jy] within the observing band of sources emitting
    /// between `f_low` and `f_high` [Hz].
    pub fn peak_flux_density(&self, frbs: &Frbs, f_low: f64, f_high: f64) -> SurveyResult<Array1<f64>> {
        if !(f_low > 0.0 && f_high > f_low) {
            return Err(SurveyError::InvalidInput(format!(
                "emission band [{}, {}] Hz is empty",
                f_low, f_high
            )));
        }
        let c = &self.config;
        let f_1 = (c.central_freq - 0.5 * c.bw) * 1e6;
        let f_2 = (c.central_freq + 0.5 * c.bw) * 1e6;
        let bw_hz = c.bw * 1e6;

        let mut s_peak = Array1::zeros(frbs.len());
        for i in 0..frbs.len() {
            let dist = frbs.dist_co[i] * METRES_PER_GPC;
            if !(dist > 0.0) {
                return Err(SurveyError::InvalidInput(format!(
                    "comoving distance must be positive, got {} Gpc",
                    frbs.dist_co[i]
                )));
            }
            let lum = frbs.lum_bol[i] * 1e-7;
            let sp = frbs.si[i] + 1.0;
            let in_band = band_fraction(sp, f_1, f_2, f_low, f_high);
            let flux = lum * (1.0 + frbs.z[i]).powf(sp) * in_band / (4.0 * PI * dist * dist);
            // W m^-2 Hz^-1 -> Jy
            s_peak[i] = flux / bw_hz * 1e26;
        }
        Ok(s_peak)
    }

    /// Radiometer signal-to-noise ratio of each pulse.
    ///
    /// Expects `s_peak` to already include the beam attenuation.
    pub fn signal_to_noise(&self, frbs: &Frbs) -> Array1<f64> {
        let c = &self.config;
        let radiometer = (f64::from(c.n_pol) * c.bw * 1e6 * c.t_samp * 1e-3).sqrt();
        Zip::from(&frbs.s_peak)
            .and(&frbs.t_sys)
            .and(&frbs.w_eff)
            .map_collect(|&s_peak, &t_sys, &w_eff| {
                s_peak * c.gain * radiometer / (c.beta * t_sys * (w_eff / c.t_samp).sqrt())
            })
    }

    /// Signal-to-noise ratio after Milky-Way scintillation.
    ///
    /// Each pulse is averaged over `n_t * n_f` scintles; the gain is drawn
    /// from a Gamma distribution of mean one and modulation index
    /// `1 / sqrt(n_t * n_f)`. Lines of sight without a scintillation
    /// estimate count as a single scintle.
    pub fn apply_scintillation<R: Rng + ?Sized>(
        &self,
        frbs: &Frbs,
        model: &dyn ElectronDensityModel,
        rng: &mut R,
    ) -> SurveyResult<Array1<f64>> {
        let c = &self.config;
        let (t_scint, bw_scint) = scintillation_parameters(
            model,
            frbs.dist_co.view(),
            frbs.gl.view(),
            frbs.gb.view(),
            c.central_freq,
        )?;
        let bw_khz = c.bw * 1e3;

        let mut snr = Array1::zeros(frbs.len());
        for i in 0..frbs.len() {
            let n_t = if t_scint[i].is_finite() {
                1.0 + KAPPA * (frbs.w_eff[i] * 1e-3) / t_scint[i]
            } else {
                1.0
            };
            let n_f = if bw_scint[i].is_finite() {
                1.0 + KAPPA * bw_khz / bw_scint[i]
            } else {
                1.0
            };
            let scintles = n_t * n_f;
            let gain = Gamma::new(scintles, 1.0 / scintles)
                .map_err(|err| SurveyError::Distribution(format!("scintillation: {}", err)))?;
            snr[i] = frbs.snr[i] * gain.sample(rng);
        }
        Ok(snr)
    }
}

/// Fraction of a power-law spectrum with exponent `sp` emitted between
/// `f_1` and `f_2`, out of the total between `f_low` and `f_high`.
fn band_fraction(sp: f64, f_1: f64, f_2: f64, f_low: f64, f_high: f64) -> f64 {
    if sp.abs() < 1e-12 {
        (f_2 / f_1).ln() / (f_high / f_low).ln()
    } else {
        (f_2.powf(sp) - f_1.powf(sp)) / (f_high.powf(sp) - f_low.powf(sp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::ExponentialDisk;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn survey() -> Survey {
        let config = SurveyConfig {
            name: "test".into(),
            beam: BeamConfig {
                pattern: BeamPattern::Perfect,
                fwhm_arcmin: 30.0,
                ..Default::default()
            },
            central_freq: 1400.0,
            bw: 300.0,
            bw_chan: 0.39,
            t_rec: 25.0,
            gain: 0.7,
            t_samp: 0.064,
            n_pol: 2,
            beta: 1.2,
            ..Default::default()
        };
        Survey::new(config, SkyTemperatureMap::uniform(5.0)).unwrap()
    }

    fn population() -> Frbs {
        let mut frbs = Frbs::with_len(2);
        frbs.gl = array![0.0, 120.0];
        frbs.gb = array![0.0, -45.0];
        frbs.z = array![0.2, 1.0];
        frbs.dist_co = array![0.8, 3.4];
        frbs.dm = array![500.0, 1500.0];
        frbs.lum_bol = array![1e42, 1e44];
        frbs.si = array![0.0, -1.4];
        frbs.w_int = array![1.0, 2.0];
        frbs.w_arr = array![1.2, 4.0];
        frbs
    }

    #[test]
    fn dm_smear_follows_channel_width() {
        let smear = survey().dm_smear(&population());
        assert_relative_eq!(
            smear[0],
            8.297616e6 * 0.39 * 500.0 / 1400f64.powi(3),
            max_relative = 1e-12
        );
        assert_relative_eq!(smear[1], 3.0 * smear[0], max_relative = 1e-12);
    }

    #[test]
    fn system_temperature_adds_receiver_and_sky() {
        let (t_sky, t_sys) = survey().system_temperature(&population());
        let expected_sky = 5.0 * (1400.0f64 / 408.0).powf(-2.6);
        assert_relative_eq!(t_sky[0], expected_sky, max_relative = 1e-12);
        assert_relative_eq!(t_sys[1], 25.0 + expected_sky, max_relative = 1e-12);
    }

    #[test]
    fn effective_width_adds_in_quadrature() {
        let mut frbs = population();
        frbs.t_dm = array![0.0, 3.0];
        frbs.t_scat = array![0.0, 0.0];
        let w_eff = survey().effective_pulse_width(&frbs);
        assert_relative_eq!(w_eff[0], (1.44f64 + 0.064 * 0.064).sqrt(), max_relative = 1e-12);
        assert_relative_eq!(w_eff[1], (25.0f64 + 0.064 * 0.064).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn peak_flux_falls_with_distance_squared() {
        let s = survey();
        let mut frbs = population();
        frbs.si = array![0.0, 0.0];
        frbs.z = array![0.2, 0.2];
        frbs.lum_bol = array![1e42, 1e42];
        frbs.dist_co = array![1.0, 2.0];
        let s_peak = s.peak_flux_density(&frbs, 10e6, 10e9).unwrap();
        assert_relative_eq!(s_peak[0], 4.0 * s_peak[1], max_relative = 1e-12);

        let in_band = (1550e6 - 1250e6) / (10e9 - 10e6);
        let expected = 1e35 * 1.2 * in_band / (4.0 * PI * METRES_PER_GPC.powi(2)) / 300e6 * 1e26;
        assert_relative_eq!(s_peak[0], expected, max_relative = 1e-12);
    }

    #[test]
    fn flat_spectrum_in_frequency_uses_log_band() {
        assert_relative_eq!(
            band_fraction(0.0, 1e9, 2e9, 1e8, 1e10),
            2f64.ln() / 100f64.ln(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            band_fraction(1.0, 1e9, 2e9, 1e8, 1e10),
            1e9 / (1e10 - 1e8),
            max_relative = 1e-12
        );
    }

    #[test]
    fn peak_flux_rejects_bad_inputs() {
        let s = survey();
        assert!(s.peak_flux_density(&population(), 1e9, 1e8).is_err());
        let mut frbs = population();
        frbs.dist_co[0] = 0.0;
        assert!(s.peak_flux_density(&frbs, 10e6, 10e9).is_err());
    }

    #[test]
    fn snr_follows_radiometer_equation() {
        let s = survey();
        let mut frbs = Frbs::with_len(1);
        frbs.s_peak = array![1.0];
        frbs.t_sys = array![30.0];
        frbs.w_eff = array![0.256];
        let snr = s.signal_to_noise(&frbs);
        let expected = 0.7 * (2.0f64 * 300e6 * 0.064e-3).sqrt() / (1.2 * 30.0 * 2.0);
        assert_relative_eq!(snr[0], expected, max_relative = 1e-12);

        frbs.s_peak = array![2.0];
        assert_relative_eq!(s.signal_to_noise(&frbs)[0], 2.0 * expected, max_relative = 1e-12);
    }

    #[test]
    fn region_limits_cut_sky_and_width() {
        let mut config = survey().config().clone();
        config.region.gb_min = -30.0;
        config.region.w_max = Some(2.0);
        let s = Survey::new(config, SkyTemperatureMap::uniform(5.0)).unwrap();

        let mut frbs = Frbs::with_len(3);
        frbs.gl = array![10.0, 200.0, 10.0];
        frbs.gb = array![0.0, 10.0, -60.0];
        frbs.w_arr = array![1.0, 1.0, 1.0];
        assert_eq!(s.in_region(&frbs), vec![true, true, false]);

        frbs.w_arr = array![5.0, 1.0, 1.0];
        assert_eq!(s.in_region(&frbs), vec![false, true, false]);
    }

    #[test]
    fn declination_limits_use_equatorial_position() {
        let mut config = survey().config().clone();
        config.region.dec_max = 0.0;
        let s = Survey::new(config, SkyTemperatureMap::uniform(5.0)).unwrap();
        let mut frbs = Frbs::with_len(2);
        // Galactic centre lies south, the anticentre north.
        frbs.gl = array![0.0, 180.0];
        frbs.gb = array![0.0, 0.0];
        assert_eq!(s.in_region(&frbs), vec![true, false]);
    }

    #[test]
    fn scintillation_keeps_mean_snr() {
        let s = survey();
        let n = 20_000;
        let mut frbs = Frbs::with_len(n);
        frbs.gl.fill(30.0);
        frbs.gb.fill(40.0);
        frbs.dist_co.fill(1.0);
        frbs.w_eff.fill(1.0);
        frbs.snr.fill(10.0);
        let mut rng = StdRng::seed_from_u64(21);
        let snr = s
            .apply_scintillation(&frbs, &ExponentialDisk::default(), &mut rng)
            .unwrap();
        assert!(snr.iter().all(|&v| v >= 0.0));
        assert_relative_eq!(snr.mean().unwrap(), 10.0, max_relative = 0.02);
        assert!(snr.std(0.0) > 0.0);
    }

    /// No scattering anywhere, so no scintillation estimate either.
    struct ClearSky;

    impl ElectronDensityModel for ClearSky {
        fn dispersion_measure(&self, _dist_kpc: f64, _gl: f64, _gb: f64) -> f64 {
            0.0
        }

        fn scattering_parameters(&self, _gl: f64, _gb: f64, _dist_kpc: f64) -> (f64, f64) {
            (0.0, 0.0)
        }
    }

    #[test]
    fn missing_scintillation_estimate_counts_as_one_scintle() {
        let s = survey();
        let n = 2_000;
        let mut frbs = Frbs::with_len(n);
        frbs.gl.fill(30.0);
        frbs.gb.fill(40.0);
        frbs.dist_co.fill(1.0);
        frbs.w_eff.fill(1.0);
        frbs.snr.fill(10.0);

        let mut rng = StdRng::seed_from_u64(33);
        let snr = s.apply_scintillation(&frbs, &ClearSky, &mut rng).unwrap();
        assert!(snr.iter().all(|v| v.is_finite() && *v >= 0.0));

        let single = Gamma::new(1.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(33);
        for &v in snr.iter() {
            assert_relative_eq!(v, 10.0 * single.sample(&mut rng), max_relative = 1e-12);
        }
        assert_relative_eq!(snr.mean().unwrap(), 10.0, max_relative = 0.1);
        assert_relative_eq!(snr.std(0.0), 10.0, max_relative = 0.15);
    }

    #[test]
    fn beam_response_uses_configured_shape() {
        let s = survey();
        let mut rng = StdRng::seed_from_u64(2);
        let (gain, offset) = s.beam_response(100, &mut rng);
        assert_eq!(gain.len(), 100);
        assert!(gain.iter().all(|&g| g == 1.0));
        assert!(offset.iter().all(|&r| r <= 15.0));
        assert_abs_diff_eq!(s.beam_size(), PI * 0.0625, epsilon = 1e-12);
    }
}
