use crate::population::Frbs;
use crate::prelude::{DetectionStage, StageOutput, SurveyResult};
use crate::propagation::ElectronDensityModel;
use crate::survey::Survey;
use crate::telemetry::log::StageLog;
use rand::rngs::StdRng;

/// Runs every source through the survey's signal chain.
///
/// Fills in smearing, scattering, temperatures, effective width, peak flux
/// density, fluence and signal-to-noise. Nothing is rejected here.
pub struct SignalChainStage<'a> {
    survey: &'a Survey,
    model: &'a dyn ElectronDensityModel,
    scattering: bool,
    scintillation: bool,
    f_low: f64,
    f_high: f64,
    logger: StageLog,
}

impl<'a> SignalChainStage<'a> {
    pub fn new(
        survey: &'a Survey,
        model: &'a dyn ElectronDensityModel,
        f_low: f64,
        f_high: f64,
    ) -> Self {
        Self {
            survey,
            model,
            scattering: false,
            scintillation: false,
            f_low,
            f_high,
            logger: StageLog::new(survey.name()),
        }
    }

    pub fn with_scattering(mut self, enabled: bool) -> Self {
        self.scattering = enabled;
        self
    }

    pub fn with_scintillation(mut self, enabled: bool) -> Self {
        self.scintillation = enabled;
        self
    }
}

impl DetectionStage for SignalChainStage<'_> {
    fn label(&self) -> &'static str {
        "signal"
    }

    fn execute(&mut self, mut frbs: Frbs, rng: &mut StdRng) -> SurveyResult<StageOutput> {
        let survey = self.survey;

        frbs.t_dm = survey.dm_smear(&frbs);
        if self.scattering {
            frbs.t_scat = survey.scattering(&frbs, rng)?;
        }

        let (t_sky, t_sys) = survey.system_temperature(&frbs);
        frbs.t_sky = t_sky;
        frbs.t_sys = t_sys;

        frbs.w_eff = survey.effective_pulse_width(&frbs);
        frbs.s_peak = survey.peak_flux_density(&frbs, self.f_low, self.f_high)?;

        let (beam_gain, _offset) = survey.beam_response(frbs.len(), rng);
        frbs.s_peak *= &beam_gain;

        frbs.fluence = &frbs.s_peak * &frbs.w_eff;
        frbs.snr = survey.signal_to_noise(&frbs);

        if self.scintillation {
            frbs.snr = survey.apply_scintillation(&frbs, self.model, rng)?;
        }

        let mut notes = Vec::new();
        if let Some(max_snr) = frbs.snr.iter().cloned().reduce(f64::max) {
            notes.push(format!("peak SNR {:.3}", max_snr));
        }
        self.logger.stage(self.label(), frbs.len(), 0);
        for note in &notes {
            self.logger.detail(note);
        }

        Ok(StageOutput {
            frbs,
            rejected: 0,
            notes,
        })
    }
}
