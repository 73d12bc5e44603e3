//! Survey-detection pipeline.
//!
//! A run owns a private copy of the cosmic population and pushes it through
//! four stages in a fixed order: region, signal chain, threshold and
//! (optionally) rate limit. Every source ends up either detected or in
//! exactly one rejection count of the [`Rates`] record.

use crate::math::stats::StatsHelper;
use crate::population::{CosmicPopulation, Frbs};
use crate::prelude::{DetectionStage, SurveyError, SurveyResult};
use crate::processing::{RateLimitStage, RegionStage, SignalChainStage, ThresholdStage};
use crate::propagation::ElectronDensityModel;
use crate::rates::{scale, Rates, ScaledRates};
use crate::survey::Survey;
use crate::telemetry::log::StageLog;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Which optional propagation effects a run models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyOptions {
    /// Broaden pulses by interstellar scattering.
    pub scattering: bool,
    /// Modulate the signal-to-noise by Milky-Way scintillation.
    pub scintillation: bool,
    /// Keep detections with probability `1 / (1 + z)`.
    pub rate_limit: bool,
    /// Seed of the run's random number generator.
    pub seed: u64,
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self {
            scattering: false,
            scintillation: false,
            rate_limit: true,
            seed: 0,
        }
    }
}

/// The sources a survey detected, along with the run's rate record.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyPopulation {
    pub name: String,
    pub frbs: Frbs,
    pub rate: Rates,
    /// Observing time inherited from the cosmic population [s].
    pub time: f64,
    /// Maximum comoving volume inherited from the cosmic population [Gpc^3].
    pub vol_co_max: f64,
}

/// Population parameter a logN-logS fit runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LognParameter {
    Fluence,
    SPeak,
    Snr,
}

impl SurveyPopulation {
    /// Surveys `cosmic` with `survey`.
    ///
    /// The cosmic population is copied on entry and never modified.
    pub fn run(
        cosmic: &CosmicPopulation,
        survey: &Survey,
        model: &dyn ElectronDensityModel,
        options: SurveyOptions,
    ) -> SurveyResult<Self> {
        cosmic.validate()?;
        let logger = StageLog::new(survey.name());
        logger.record(&format!("Surveying {} with {}", cosmic.name, survey.name()));

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut rate = Rates::new(survey.name());
        let frbs = cosmic.frbs.clone();

        let mut region = RegionStage::new(survey);
        let output = region.execute(frbs, &mut rng)?;
        rate.out = output.rejected;

        let mut signal = SignalChainStage::new(survey, model, cosmic.f_min, cosmic.f_max)
            .with_scattering(options.scattering)
            .with_scintillation(options.scintillation);
        let mut output = signal.execute(output.frbs, &mut rng)?;
        // Drawn for every source in the region, so a source keeps its draw
        // whatever the signal-to-noise limit.
        output.frbs.arrival = Array1::from_shape_fn(output.frbs.len(), |_| rng.gen::<f64>());

        let mut threshold = ThresholdStage::new(survey.name(), survey.snr_limit());
        let mut output = threshold.execute(output.frbs, &mut rng)?;
        rate.faint = output.rejected;

        if options.rate_limit {
            let mut rate_limit = RateLimitStage::new(survey.name());
            output = rate_limit.execute(output.frbs, &mut rng)?;
            rate.late = output.rejected;
        }

        let frbs = output.frbs;
        rate.det = frbs.len();
        rate.finalize(survey.beam_size(), cosmic.time, cosmic.vol_co_max);

        rate.check_total(cosmic.frbs.len())?;
        logger.record(&format!(
            "detected {} (out {}, faint {}, late {})",
            rate.det, rate.out, rate.faint, rate.late
        ));

        Ok(Self {
            name: survey.name().to_string(),
            frbs,
            rate,
            time: cosmic.time,
            vol_co_max: cosmic.vol_co_max,
        })
    }

    /// Detection counts scaled by beam area and/or observing time.
    pub fn rates(&self, scale_area: bool, scale_time: bool) -> ScaledRates {
        scale(&self.rate, scale_area, scale_time)
    }

    /// Slope of the cumulative source counts of the detected population.
    ///
    /// `min_p` defaults to the smallest value present; values outside
    /// `[min_p, max_p]` are ignored.
    pub fn logn_logs(
        &self,
        parameter: LognParameter,
        min_p: Option<f64>,
        max_p: Option<f64>,
    ) -> SurveyResult<(f64, f64, f64)> {
        let column = match parameter {
            LognParameter::Fluence => &self.frbs.fluence,
            LognParameter::SPeak => &self.frbs.s_peak,
            LognParameter::Snr => &self.frbs.snr,
        };
        let f_0 = match min_p {
            Some(min) => min,
            None => column
                .iter()
                .cloned()
                .reduce(f64::min)
                .ok_or_else(|| SurveyError::InvalidInput("no detections to fit".into()))?,
        };
        let values: Vec<f64> = column
            .iter()
            .cloned()
            .filter(|&v| v >= f_0 && max_p.map_or(true, |max| v <= max))
            .collect();
        StatsHelper::logn_logs(&values, f_0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::ExponentialDisk;
    use crate::survey::{BeamConfig, BeamPattern, SkyTemperatureMap, SurveyConfig};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn survey_with(snr_limit: f64, pattern: BeamPattern) -> Survey {
        let config = SurveyConfig {
            name: "test".into(),
            beam: BeamConfig {
                pattern,
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
            snr_limit,
            beta: 1.2,
            ..Default::default()
        };
        Survey::new(config, SkyTemperatureMap::uniform(5.0)).unwrap()
    }

    /// Sources spread over the sky, distance and luminosity.
    fn cosmic(n: usize, seed: u64) -> CosmicPopulation {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut frbs = Frbs::with_len(n);
        for i in 0..n {
            frbs.gl[i] = rng.gen_range(-180.0..180.0);
            frbs.gb[i] = rng.gen_range(-90.0..90.0);
            frbs.z[i] = rng.gen_range(0.01..2.0);
            frbs.dist_co[i] = 4.0 * frbs.z[i] / (1.0 + frbs.z[i]);
            frbs.dm[i] = 50.0 + 1000.0 * frbs.z[i];
            frbs.lum_bol[i] = 10f64.powf(rng.gen_range(42.0..46.0));
            frbs.si[i] = -1.4;
            frbs.w_int[i] = rng.gen_range(0.5..5.0);
            frbs.w_arr[i] = frbs.w_int[i] * (1.0 + frbs.z[i]);
        }
        CosmicPopulation::new("cosmic", frbs, 86_400.0, 500.0)
    }

    #[test]
    fn every_source_is_accounted_for() {
        let mut config = survey_with(10.0, BeamPattern::Gaussian).config().clone();
        config.region.dec_max = 30.0;
        let survey = Survey::new(config, SkyTemperatureMap::uniform(5.0)).unwrap();
        let cosmic = cosmic(5_000, 1);
        let options = SurveyOptions {
            scattering: true,
            scintillation: true,
            rate_limit: true,
            seed: 99,
        };

        let surveyed =
            SurveyPopulation::run(&cosmic, &survey, &ExponentialDisk::default(), options).unwrap();
        let rate = &surveyed.rate;
        assert_eq!(rate.det + rate.out + rate.faint + rate.late, 5_000);
        assert_eq!(rate.det, surveyed.frbs.len());
        assert!(rate.out > 0);
        assert!(rate.faint > 0);
        assert!(rate.det > 0);
        surveyed.frbs.validate().unwrap();
        assert!(surveyed.frbs.snr.iter().all(|&snr| snr >= 10.0));
    }

    #[test]
    fn cosmic_population_is_not_modified() {
        let survey = survey_with(10.0, BeamPattern::Airy);
        let cosmic = cosmic(500, 2);
        let before = cosmic.clone();
        SurveyPopulation::run(
            &cosmic,
            &survey,
            &ExponentialDisk::default(),
            SurveyOptions::default(),
        )
        .unwrap();
        assert_eq!(cosmic, before);
    }

    #[test]
    fn raising_threshold_never_adds_detections() {
        let model = ExponentialDisk::default();
        let limits = [1.0, 2.0, 3.0, 5.0, 8.0, 10.0, 20.0, 50.0];
        for population_seed in 0..5 {
            let cosmic = cosmic(1_000, population_seed);
            for seed in 0..4 {
                for (scattering, scintillation) in [(false, false), (true, true)] {
                    let options = SurveyOptions {
                        scattering,
                        scintillation,
                        seed,
                        ..Default::default()
                    };
                    assert!(options.rate_limit);
                    let mut previous = usize::MAX;
                    for limit in limits {
                        let survey = survey_with(limit, BeamPattern::Gaussian);
                        let det = SurveyPopulation::run(&cosmic, &survey, &model, options)
                            .unwrap()
                            .rate
                            .det;
                        assert!(
                            det <= previous,
                            "population {} seed {}: limit {} detected {} > {}",
                            population_seed,
                            seed,
                            limit,
                            det,
                            previous
                        );
                        previous = det;
                    }
                }
            }
        }
    }

    #[test]
    fn same_seed_gives_identical_runs() {
        let survey = survey_with(10.0, BeamPattern::Gaussian);
        let cosmic = cosmic(2_000, 4);
        let options = SurveyOptions {
            scattering: true,
            scintillation: true,
            rate_limit: true,
            seed: 1234,
        };
        let model = ExponentialDisk::default();
        let first = SurveyPopulation::run(&cosmic, &survey, &model, options).unwrap();
        let second = SurveyPopulation::run(&cosmic, &survey, &model, options).unwrap();
        assert_eq!(first, second);

        let other = SurveyPopulation::run(
            &cosmic,
            &survey,
            &model,
            SurveyOptions {
                seed: 4321,
                ..options
            },
        )
        .unwrap();
        assert_eq!(other.rate.tot(), first.rate.tot());
    }

    #[test]
    fn faint_nearby_source_is_rejected() {
        let survey = survey_with(10.0, BeamPattern::Perfect);
        let mut frbs = Frbs::with_len(1);
        frbs.gl = array![0.0];
        frbs.gb = array![0.0];
        frbs.z = array![0.000_226];
        frbs.dist_co = array![0.001];
        frbs.dm = array![30.0];
        frbs.lum_bol = array![5.2e37];
        frbs.si = array![0.0];
        frbs.w_int = array![1.0];
        frbs.w_arr = array![1.0];
        let cosmic = CosmicPopulation::new("single", frbs, 86_400.0, 1.0);
        let model = ExponentialDisk::default();
        let options = SurveyOptions {
            rate_limit: false,
            ..Default::default()
        };

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut signal = SignalChainStage::new(&survey, &model, cosmic.f_min, cosmic.f_max);
        let measured = signal.execute(cosmic.frbs.clone(), &mut rng).unwrap();
        assert_relative_eq!(measured.frbs.snr[0], 5.0, max_relative = 0.01);

        let surveyed = SurveyPopulation::run(&cosmic, &survey, &model, options).unwrap();
        let rate = &surveyed.rate;
        assert_eq!((rate.det, rate.faint, rate.out, rate.late), (0, 1, 0, 0));
        assert!(surveyed.frbs.is_empty());

        // The same source a hundred times brighter is detected.
        let mut bright = cosmic.clone();
        bright.frbs.lum_bol = array![5.2e39];
        let surveyed = SurveyPopulation::run(&bright, &survey, &model, options).unwrap();
        assert_eq!(surveyed.rate.det, 1);
        let snr = surveyed.frbs.snr[0];
        assert!(snr > 100.0 && snr < 1000.0, "snr {}", snr);
    }

    #[test]
    fn empty_population_gives_empty_record() {
        let survey = survey_with(10.0, BeamPattern::Gaussian);
        let cosmic = CosmicPopulation::new("empty", Frbs::with_len(0), 86_400.0, 1.0);
        let options = SurveyOptions {
            scattering: true,
            scintillation: true,
            ..Default::default()
        };
        let surveyed =
            SurveyPopulation::run(&cosmic, &survey, &ExponentialDisk::default(), options).unwrap();
        assert!(surveyed.frbs.is_empty());
        assert_eq!(surveyed.rate, Rates::new("test"));
        assert_eq!(surveyed.rates(true, true).det, 0.0);
    }

    #[test]
    fn ragged_input_is_rejected() {
        let survey = survey_with(10.0, BeamPattern::Gaussian);
        let mut cosmic = cosmic(10, 6);
        cosmic.frbs.snr = Array1::zeros(3);
        let result = SurveyPopulation::run(
            &cosmic,
            &survey,
            &ExponentialDisk::default(),
            SurveyOptions::default(),
        );
        assert!(matches!(result, Err(SurveyError::LengthMismatch { .. })));
    }

    #[test]
    fn rates_scale_detected_count() {
        let survey = survey_with(10.0, BeamPattern::Gaussian);
        let cosmic = cosmic(2_000, 7);
        let surveyed = SurveyPopulation::run(
            &cosmic,
            &survey,
            &ExponentialDisk::default(),
            SurveyOptions::default(),
        )
        .unwrap();
        let rate = &surveyed.rate;
        assert_eq!(rate.days, 1.0);
        assert_eq!(surveyed.rates(false, false).det, rate.det as f64);
        assert_eq!(
            surveyed.rates(true, false).det,
            rate.det as f64 * rate.f_area
        );
        assert!(rate.f_area > 0.0 && rate.f_area < 1.0);
    }

    #[test]
    fn logn_logs_fits_detected_fluences() {
        let survey = survey_with(5.0, BeamPattern::Perfect);
        let cosmic = cosmic(5_000, 8);
        let surveyed = SurveyPopulation::run(
            &cosmic,
            &survey,
            &ExponentialDisk::default(),
            SurveyOptions {
                rate_limit: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(surveyed.frbs.len() > 10);
        let (alpha, _err, norm) = surveyed
            .logn_logs(LognParameter::Fluence, None, None)
            .unwrap();
        assert!(alpha < 0.0);
        assert!(norm > 0.0);

        let (alpha_snr, _, _) = surveyed
            .logn_logs(LognParameter::Snr, Some(10.0), None)
            .unwrap();
        assert!(alpha_snr < 0.0);
    }
}
