use super::frbs::Frbs;
use crate::prelude::{SurveyError, SurveyResult};

/// Unobserved population handed over by an upstream generator.
#[derive(Debug, Clone, PartialEq)]
pub struct CosmicPopulation {
    pub name: String,
    pub frbs: Frbs,
    /// Observing time the population represents [s].
    pub time: f64,
    /// Comoving volume out to the largest generated redshift [Gpc^3].
    pub vol_co_max: f64,
    /// Lower edge of the emission band [Hz].
    pub f_min: f64,
    /// Upper edge of the emission band [Hz].
    pub f_max: f64,
}

impl CosmicPopulation {
    pub fn new(name: impl Into<String>, frbs: Frbs, time: f64, vol_co_max: f64) -> Self {
        Self {
            name: name.into(),
            frbs,
            time,
            vol_co_max,
            f_min: 10e6,
            f_max: 10e9,
        }
    }

    pub fn with_emission_band(mut self, f_min: f64, f_max: f64) -> Self {
        self.f_min = f_min;
        self.f_max = f_max;
        self
    }

    /// Checks the hand-over contract before a survey consumes the population.
    pub fn validate(&self) -> SurveyResult<()> {
        self.frbs.validate()?;
        if !(self.time > 0.0) {
            return Err(SurveyError::InvalidInput(format!(
                "observing time must be positive, got {} s",
                self.time
            )));
        }
        if !(self.vol_co_max > 0.0) {
            return Err(SurveyError::InvalidInput(format!(
                "maximum comoving volume must be positive, got {} Gpc^3",
                self.vol_co_max
            )));
        }
        if !(self.f_min > 0.0 && self.f_max > self.f_min) {
            return Err(SurveyError::InvalidInput(format!(
                "emission band [{}, {}] Hz is empty",
                self.f_min, self.f_max
            )));
        }
        Ok(())
    }
}
