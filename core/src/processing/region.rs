use crate::math::coords::galactic_to_equatorial;
use crate::population::Frbs;
use crate::prelude::{DetectionStage, StageOutput, SurveyResult};
use crate::survey::Survey;
use crate::telemetry::log::StageLog;
use rand::rngs::StdRng;

/// Drops sources outside the survey's sky and width coverage.
pub struct RegionStage<'a> {
    survey: &'a Survey,
    logger: StageLog,
}

impl<'a> RegionStage<'a> {
    pub fn new(survey: &'a Survey) -> Self {
        Self {
            survey,
            logger: StageLog::new(survey.name()),
        }
    }
}

impl DetectionStage for RegionStage<'_> {
    fn label(&self) -> &'static str {
        "region"
    }

    fn execute(&mut self, frbs: Frbs, _rng: &mut StdRng) -> SurveyResult<StageOutput> {
        let mask = self.survey.in_region(&frbs);
        let rejected = mask.iter().filter(|&&inside| !inside).count();
        let mut kept = frbs.apply_mask(&mask)?;

        let (ra, dec) = galactic_to_equatorial(kept.gl.view(), kept.gb.view());
        kept.ra = ra;
        kept.dec = dec;

        self.logger.stage(self.label(), kept.len(), rejected);
        Ok(StageOutput {
            frbs: kept,
            rejected,
            notes: vec![format!("out of region {}", rejected)],
        })
    }
}
