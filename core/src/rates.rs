//! Detection-rate bookkeeping and survey-comparable scalings.

use crate::math::stats::StatsHelper;
use crate::prelude::{SurveyError, SurveyResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Whole sky [sq. deg].
pub const SKY_AREA_SQ_DEG: f64 = 4.0 * PI * (180.0 / PI) * (180.0 / PI);

/// Outcome of one survey run: how many sources were lost at each stage and
/// how many were detected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub name: String,
    /// Outside the survey region.
    pub out: usize,
    /// Below the signal-to-noise limit.
    pub faint: usize,
    /// Lost to the finite observing time.
    pub late: usize,
    pub det: usize,
    /// Observing time [days].
    pub days: f64,
    /// Scaling from the beam to the whole sky.
    pub f_area: f64,
    /// Scaling to a daily rate.
    pub f_time: f64,
    /// Sources per unit of generated comoving volume per sidereal year.
    pub vol: f64,
}

impl Rates {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Every source the run started with.
    pub fn tot(&self) -> usize {
        self.out + self.faint + self.late + self.det
    }

    /// Sources that fell inside the survey region.
    pub fn inside(&self) -> usize {
        self.det + self.late + self.faint
    }

    /// Checks that every one of `n` input sources was detected or rejected
    /// exactly once.
    pub fn check_total(&self, n: usize) -> SurveyResult<()> {
        if self.tot() != n {
            return Err(SurveyError::Internal(format!(
                "rate record accounts for {} of {} sources",
                self.tot(),
                n
            )));
        }
        Ok(())
    }

    /// Derives the scaling factors once all counts are in.
    ///
    /// `beam_size` in sq. deg, `time` in seconds, `vol_co_max` in Gpc^3. A run
    /// that started without sources keeps every field at zero.
    pub fn finalize(&mut self, beam_size: f64, time: f64, vol_co_max: f64) {
        if self.tot() == 0 {
            return;
        }

        self.days = time / SECONDS_PER_DAY;
        self.f_time = SECONDS_PER_DAY / time;
        self.f_area = if self.inside() > 0 {
            beam_size * self.tot() as f64 / (self.inside() as f64 * SKY_AREA_SQ_DEG)
        } else {
            0.0
        };
        // TODO: confirm the year-length factor with the population model;
        // it mixes a 365.25 day year into a per-run volume normalisation.
        self.vol = self.tot() as f64 / (vol_co_max * (365.25 * SECONDS_PER_DAY / time));
    }
}

/// Rates after applying area and/or time scaling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaledRates {
    pub name: String,
    pub out: f64,
    pub faint: f64,
    pub late: f64,
    pub det: f64,
}

/// Scales every count by the area factor, the time factor, or both.
pub fn scale(rates: &Rates, area: bool, time: bool) -> ScaledRates {
    let mut factor = 1.0;
    if area {
        factor *= rates.f_area;
    }
    if time {
        factor *= rates.f_time;
    }
    ScaledRates {
        name: rates.name.clone(),
        out: rates.out as f64 * factor,
        faint: rates.faint as f64 * factor,
        late: rates.late as f64 * factor,
        det: rates.det as f64 * factor,
    }
}

/// Published detections of a survey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedRate {
    /// Number of bursts found (possibly an estimate).
    pub n_frbs: f64,
    /// Converts the count into bursts per day.
    pub scaling: f64,
}

pub const OBSERVED: [(&str, ObservedRate); 7] = [
    (
        "htru",
        ObservedRate {
            n_frbs: 9.0,
            scaling: 24.0 * 0.551 / 1549.0,
        },
    ),
    (
        "apertif",
        ObservedRate {
            n_frbs: 1.0,
            scaling: 1.0 / 7.0,
        },
    ),
    (
        "askap-fly",
        ObservedRate {
            n_frbs: 20.0,
            scaling: 24.0 / 32840.0 * 8.0,
        },
    ),
    (
        "utmost",
        ObservedRate {
            n_frbs: 0.0,
            scaling: 0.0,
        },
    ),
    (
        "chime",
        ObservedRate {
            n_frbs: 0.0,
            scaling: 0.0,
        },
    ),
    (
        "palfa",
        ObservedRate {
            n_frbs: 1.0,
            scaling: 1.0 / 24.1,
        },
    ),
    (
        "guppi",
        ObservedRate {
            n_frbs: 0.4,
            scaling: 1.0 / 81.0,
        },
    ),
];

pub fn observed(survey: &str) -> Option<ObservedRate> {
    OBSERVED
        .iter()
        .find(|(name, _)| *name == survey)
        .map(|(_, rate)| *rate)
}

/// Observed rate of a survey relative to a reference survey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedRate {
    pub name: String,
    pub rate: f64,
    pub min: f64,
    pub max: f64,
}

/// Daily detection rates of `surveys`, normalised to the reference survey's
/// rate, with Poisson intervals of `sigma` standard deviations.
pub fn expected_rates(
    surveys: &[&str],
    reference: &str,
    sigma: f64,
) -> SurveyResult<Vec<ExpectedRate>> {
    let lookup = |name: &str| {
        observed(name)
            .ok_or_else(|| SurveyError::InvalidInput(format!("no observed rate for `{}`", name)))
    };
    let reference = lookup(reference)?;
    let reference_rate = reference.n_frbs * reference.scaling;
    if !(reference_rate > 0.0) {
        return Err(SurveyError::InvalidInput(
            "reference survey has no detections".into(),
        ));
    }
    let norm = 1.0 / reference_rate;

    surveys
        .iter()
        .map(|&name| {
            let obs = lookup(name)?;
            let (low, high) = StatsHelper::poisson_interval(obs.n_frbs, sigma)?;
            Ok(ExpectedRate {
                name: name.to_string(),
                rate: obs.n_frbs * obs.scaling * norm,
                min: low * obs.scaling * norm,
                max: high * obs.scaling * norm,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record() -> Rates {
        Rates {
            name: "test".into(),
            out: 50,
            faint: 30,
            late: 5,
            det: 15,
            ..Default::default()
        }
    }

    #[test]
    fn finalize_derives_scalings() {
        let mut rates = record();
        rates.finalize(0.5, 2.0 * 86_400.0, 10.0);
        assert_eq!(rates.tot(), 100);
        assert_eq!(rates.days, 2.0);
        assert_eq!(rates.f_time, 0.5);
        assert_relative_eq!(rates.f_area, 0.5 * 100.0 / (50.0 * SKY_AREA_SQ_DEG));
        assert_relative_eq!(rates.vol, 100.0 / (10.0 * 365.25 / 2.0));
    }

    #[test]
    fn unbalanced_tally_is_an_internal_error() {
        let rates = record();
        rates.check_total(100).unwrap();
        assert!(matches!(
            rates.check_total(101),
            Err(SurveyError::Internal(_))
        ));
    }

    #[test]
    fn empty_run_stays_zero() {
        let mut rates = Rates::new("empty");
        rates.finalize(0.5, 86_400.0, 10.0);
        assert_eq!(
            rates,
            Rates {
                name: "empty".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn everything_outside_region_has_no_area_scaling() {
        let mut rates = Rates {
            out: 10,
            ..Default::default()
        };
        rates.finalize(0.5, 86_400.0, 10.0);
        assert_eq!(rates.f_area, 0.0);
        assert_eq!(rates.f_time, 1.0);
    }

    #[test]
    fn scaling_composes_area_and_time() {
        let mut rates = record();
        rates.finalize(0.5, 2.0 * 86_400.0, 10.0);
        assert_eq!(scale(&rates, false, false).det, 15.0);
        assert_relative_eq!(scale(&rates, true, false).det, 15.0 * rates.f_area);
        assert_relative_eq!(scale(&rates, false, true).det, 7.5);
        assert_relative_eq!(
            scale(&rates, true, true).faint,
            30.0 * rates.f_area * 0.5
        );
    }

    #[test]
    fn sky_area_is_41253_square_degrees() {
        assert_relative_eq!(SKY_AREA_SQ_DEG, 41_252.96, max_relative = 1e-6);
    }

    #[test]
    fn reference_survey_rate_is_unity() {
        let rates = expected_rates(&["htru", "palfa", "utmost"], "htru", 2.0).unwrap();
        assert_relative_eq!(rates[0].rate, 1.0, max_relative = 1e-12);
        assert!(rates[0].min < 1.0 && rates[0].max > 1.0);
        assert_relative_eq!(
            rates[1].rate,
            (1.0 / 24.1) / (9.0 * 24.0 * 0.551 / 1549.0),
            max_relative = 1e-12
        );
        assert_eq!(rates[2].rate, 0.0);
        assert_eq!(rates[2].min, 0.0);
    }

    #[test]
    fn unknown_surveys_are_rejected() {
        assert!(expected_rates(&["nowhere"], "htru", 1.0).is_err());
        assert!(expected_rates(&["htru"], "chime", 1.0).is_err());
    }
}
