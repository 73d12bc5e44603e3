pub mod rate_limit;
pub mod region;
pub mod signal;
pub mod threshold;

pub use rate_limit::RateLimitStage;
pub use region::RegionStage;
pub use signal::SignalChainStage;
pub use threshold::ThresholdStage;
