use crate::generator::population::GeneratorConfig;
use anyhow::Context;
use frbcore::propagation::ExponentialDisk;
use frbcore::{SurveyConfig, SurveyOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one simulator run needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Seeds the population generator; the survey run uses `options.seed`.
    pub seed: u64,
    pub survey: SurveyConfig,
    pub options: SurveyOptions,
    pub generator: GeneratorConfig,
    /// Haslam 408 MHz map; a uniform sky is used when absent.
    pub sky_map: Option<PathBuf>,
    pub disk: ExponentialDisk,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(seed: u64, sources: usize, days: f64) -> Self {
        Self {
            seed,
            options: SurveyOptions {
                seed,
                ..Default::default()
            },
            generator: GeneratorConfig {
                n_sources: sources,
                days,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
