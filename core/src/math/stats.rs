use crate::prelude::{SurveyError, SurveyResult};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

pub struct StatsHelper;

impl StatsHelper {
    /// Poisson confidence interval on an observed count `k`.
    ///
    /// Returns the range of expected counts for which observing `k` events is
    /// within `sigma` standard deviations, using the chi-squared relation.
    /// Fractional counts are accepted for estimated detections.
    pub fn poisson_interval(k: f64, sigma: f64) -> SurveyResult<(f64, f64)> {
        let gauss = Normal::new(0.0, 1.0).map_err(distribution_error)?;
        let a = 1.0 - (gauss.cdf(sigma) - gauss.cdf(-sigma));

        if !(k >= 0.0 && k.is_finite()) {
            return Err(SurveyError::InvalidInput(format!(
                "event count must be non-negative, got {}",
                k
            )));
        }

        let low = if k == 0.0 {
            0.0
        } else {
            ChiSquared::new(2.0 * k)
                .map_err(distribution_error)?
                .inverse_cdf(a / 2.0)
                / 2.0
        };
        let high = ChiSquared::new(2.0 * k + 2.0)
            .map_err(distribution_error)?
            .inverse_cdf(1.0 - a / 2.0)
            / 2.0;

        Ok((low, high))
    }

    /// Maximum-likelihood slope of a cumulative logN-logS distribution.
    ///
    /// `values` must all be at or above `f_0`. Returns `(alpha, alpha_err,
    /// norm)` where `norm` is the count normalisation at `f_0`.
    pub fn logn_logs(values: &[f64], f_0: f64) -> SurveyResult<(f64, f64, f64)> {
        let n = values.len();
        if n < 3 {
            return Err(SurveyError::InvalidInput(format!(
                "logN-logS needs at least 3 values, got {}",
                n
            )));
        }
        if !(f_0 > 0.0) || values.iter().any(|&f| f < f_0) {
            return Err(SurveyError::InvalidInput(
                "logN-logS values must be positive and above the lower limit".into(),
            ));
        }

        let n_f = n as f64;
        let log_sum: f64 = values.iter().map(|f| (f / f_0).ln()).sum();
        if log_sum <= 0.0 {
            return Err(SurveyError::InvalidInput(
                "logN-logS values carry no spread above the lower limit".into(),
            ));
        }
        let mut alpha = -1.0 / (log_sum / n_f);
        // Removes the bias of the estimator.
        alpha *= (n_f - 1.0) / n_f;
        let alpha_err = n_f * alpha / ((n_f - 1.0) * (n_f - 2.0).sqrt());
        let norm = n_f / f_0.powf(alpha);

        Ok((alpha, alpha_err, norm))
    }
}

fn distribution_error(err: statrs::StatsError) -> SurveyError {
    SurveyError::Distribution(err.to_string())
}
