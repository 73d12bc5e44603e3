use crate::population::Frbs;
use crate::prelude::{DetectionStage, StageOutput, SurveyResult};
use crate::telemetry::log::StageLog;
use ndarray::Zip;
use rand::rngs::StdRng;

/// Keeps each source with probability `1 / (1 + z)`.
///
/// Time dilation stretches the interval between bursts at high redshift, so
/// a finite observation catches proportionally fewer of them. The decision
/// uses each source's `arrival` draw, which must already be filled in.
pub struct RateLimitStage {
    logger: StageLog,
}

impl RateLimitStage {
    pub fn new(survey_name: &str) -> Self {
        Self {
            logger: StageLog::new(survey_name),
        }
    }
}

impl DetectionStage for RateLimitStage {
    fn label(&self) -> &'static str {
        "rate-limit"
    }

    fn execute(&mut self, frbs: Frbs, _rng: &mut StdRng) -> SurveyResult<StageOutput> {
        frbs.validate()?;
        let mask: Vec<bool> = Zip::from(&frbs.z)
            .and(&frbs.arrival)
            .map_collect(|&z, &arrival| arrival <= 1.0 / (1.0 + z))
            .to_vec();
        let rejected = mask.iter().filter(|&&kept| !kept).count();
        let kept = frbs.apply_mask(&mask)?;

        self.logger.stage(self.label(), kept.len(), rejected);
        Ok(StageOutput {
            frbs: kept,
            rejected,
            notes: vec![format!("too late {}", rejected)],
        })
    }
}
