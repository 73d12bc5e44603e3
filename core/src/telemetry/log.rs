use log::{debug, info};

/// Per-survey logger for pipeline stages.
pub struct StageLog {
    survey: String,
}

impl StageLog {
    pub fn new(survey: impl Into<String>) -> Self {
        Self {
            survey: survey.into(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.survey, message);
    }

    /// Summarises the outcome of one stage.
    pub fn stage(&self, label: &str, survivors: usize, rejected: usize) {
        info!(
            "[{}] {:<12} kept {:>8} rejected {:>8}",
            self.survey, label, survivors, rejected
        );
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.survey, message);
    }
}
