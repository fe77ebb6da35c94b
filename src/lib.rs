//! Multi-year cost projections for the energy components of a household.
//!
//! A [`scenario::Scenario`] combines energetic components (boilers, heat pumps, solar panels and
//! so on) with the price profiles of the energies they use. Its total cost over a horizon of years
//! can be evaluated repeatedly for different values of the uncertain parameters.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod component;
pub mod cost;
pub mod error;
pub mod id;
pub mod input;
pub mod item;
pub mod log;
pub mod output;
pub mod parameter;
pub mod price;
pub mod registry;
pub mod scenario;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the folder where program configuration is stored.
///
/// Falls back to the current folder on platforms without a config folder.
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("house-energy-cost");

    path
}
