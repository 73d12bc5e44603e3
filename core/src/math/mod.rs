pub mod bessel;
pub mod coords;
pub mod cosmology;
pub mod stats;

pub use coords::{equatorial_to_galactic, galactic_to_equatorial, galactic_to_xyz};
pub use cosmology::{Cosmology, Redshift};
pub use stats::StatsHelper;
