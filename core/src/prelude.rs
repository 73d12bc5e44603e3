use crate::population::Frbs;
use rand::rngs::StdRng;

/// Common error type for survey calculations and pipeline stages.
#[derive(thiserror::Error, Debug)]
pub enum SurveyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid survey configuration: {0}")]
    InvalidConfig(String),
    #[error("column `{column}` has {found} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("sky temperature map: {0}")]
    SkyMap(String),
    #[error("distribution parameters rejected: {0}")]
    Distribution(String),
    #[error("internal invariant violated: {0}")]
    Internal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Output produced by each detection stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    /// Sources that survived the stage.
    pub frbs: Frbs,
    /// Number of sources the stage removed.
    pub rejected: usize,
    pub notes: Vec<String>,
}

/// One step of the survey-detection pipeline.
///
/// A stage takes ownership of the population, and hands back the survivors
/// together with the number of sources it rejected. Stages that only enrich
/// the population report zero rejections.
pub trait DetectionStage {
    fn label(&self) -> &'static str;
    fn execute(&mut self, frbs: Frbs, rng: &mut StdRng) -> SurveyResult<StageOutput>;
}
