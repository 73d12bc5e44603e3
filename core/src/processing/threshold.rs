use crate::population::Frbs;
use crate::prelude::{DetectionStage, StageOutput, SurveyResult};
use crate::telemetry::log::StageLog;
use rand::rngs::StdRng;

/// Drops sources whose signal-to-noise ratio is below the survey limit.
pub struct ThresholdStage {
    snr_limit: f64,
    logger: StageLog,
}

impl ThresholdStage {
    pub fn new(survey_name: &str, snr_limit: f64) -> Self {
        Self {
            snr_limit,
            logger: StageLog::new(survey_name),
        }
    }
}

impl DetectionStage for ThresholdStage {
    fn label(&self) -> &'static str {
        "threshold"
    }

    fn execute(&mut self, frbs: Frbs, _rng: &mut StdRng) -> SurveyResult<StageOutput> {
        let mask: Vec<bool> = frbs.snr.iter().map(|&snr| snr >= self.snr_limit).collect();
        let rejected = mask.iter().filter(|&&bright| !bright).count();
        let kept = frbs.apply_mask(&mask)?;

        self.logger.stage(self.label(), kept.len(), rejected);
        Ok(StageOutput {
            frbs: kept,
            rejected,
            notes: vec![format!("too faint {} (limit {:.2})", rejected, self.snr_limit)],
        })
    }
}
