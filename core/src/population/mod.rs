pub mod cosmic;
pub mod frbs;

pub use cosmic::CosmicPopulation;
pub use frbs::Frbs;
