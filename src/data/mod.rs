//! Data module - CSV loading, reshaping and export

pub mod export;
pub mod loader;
pub mod reshape;

pub use loader::{CarbonFactors, Dataset, EnergyUnit};
