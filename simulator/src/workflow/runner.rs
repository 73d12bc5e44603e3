use crate::generator::population::generate;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use frbcore::survey::SkyTemperatureMap;
use frbcore::{Rates, ScaledRates, Survey, SurveyPopulation};
use serde::Serialize;

/// 408 MHz brightness of a quiet high-latitude sky [K].
const QUIET_SKY_408_K: f64 = 20.0;

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub population: String,
    pub survey: String,
    pub rates: Rates,
    /// Counts per day over the whole sky.
    pub scaled: ScaledRates,
    pub peak_snr: Option<f64>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let config = &self.config;

        let sky = match &config.sky_map {
            Some(path) => SkyTemperatureMap::load(path)
                .with_context(|| format!("loading sky map {}", path.display()))?,
            None => SkyTemperatureMap::uniform(QUIET_SKY_408_K),
        };
        let survey = Survey::new(config.survey.clone(), sky).context("building survey")?;

        let cosmic = generate(&config.generator, &config.disk, config.seed)
            .context("generating cosmic population")?;
        let surveyed = SurveyPopulation::run(&cosmic, &survey, &config.disk, config.options)
            .with_context(|| format!("surveying {} with {}", cosmic.name, survey.name()))?;

        Ok(WorkflowResult {
            population: cosmic.name,
            survey: surveyed.name.clone(),
            scaled: surveyed.rates(true, true),
            peak_snr: surveyed.frbs.snr.iter().cloned().reduce(f64::max),
            rates: surveyed.rate,
        })
    }
}
