//! Survey-detection core for simulated Fast Radio Burst populations.
//!
//! A cosmic population of sources is pushed through a survey's region,
//! signal-chain, threshold and rate-limit stages. Every rejection is tallied
//! in a [`rates::Rates`] record so detection rates can be compared across
//! surveys with different beams, integration times and volumes.

pub mod math;
pub mod pipeline;
pub mod population;
pub mod prelude;
pub mod processing;
pub mod propagation;
pub mod rates;
pub mod survey;
pub mod telemetry;

pub use pipeline::{LognParameter, SurveyOptions, SurveyPopulation};
pub use population::{CosmicPopulation, Frbs};
pub use prelude::{DetectionStage, StageOutput, SurveyError, SurveyResult};
pub use rates::{Rates, ScaledRates};
pub use survey::{Survey, SurveyConfig};
