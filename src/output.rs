//! The module responsible for writing output data to disk.
use crate::component::ComponentID;
use crate::cost::CostBreakdown;
use crate::parameter::ParameterName;
use crate::price::{PriceProfile, ProfileID};
use crate::scenario::Scenario;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "house_energy_cost_results";

/// The output file name for the cost breakdown
const COSTS_FILE_NAME: &str = "costs.csv";

/// The output file name for parameter values
const PARAMETERS_FILE_NAME: &str = "parameters.csv";

/// The output file name for projected prices
const PRICE_PROJECTIONS_FILE_NAME: &str = "price_projections.csv";

/// Get the default output directory for the scenario at the specified path
pub fn get_output_dir(scenario_path: &Path) -> Result<PathBuf> {
    let scenario_name = scenario_path
        .file_stem()
        .context("Scenario path has no file name")?
        .to_str()
        .context("Invalid chars in scenario file name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, scenario_name].iter().collect())
}

/// Create a new output directory, if it doesn't already exist.
///
/// # Arguments
///
/// * `output_dir` - Folder to create
/// * `allow_overwrite` - Whether an existing, non-empty folder may be replaced
///
/// # Returns
///
/// Whether an existing folder is going to be overwritten, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
            --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CostRow {
    year: u32,
    component: ComponentID,
    energy_name: String,
    cost: f64,
}

/// Represents a row in the parameters CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ParameterRow {
    name: ParameterName,
    value: f64,
    default_value: f64,
    min_value: f64,
    max_value: f64,
    is_uncertain: bool,
}

/// Represents a row in the price projections CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PriceRow {
    year: u32,
    price_profile: ProfileID,
    price: f64,
}

/// An object for writing the results of a scenario to file
pub struct DataWriter {
    costs_writer: csv::Writer<File>,
    parameters_writer: csv::Writer<File>,
    prices_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            costs_writer: new_writer(COSTS_FILE_NAME)?,
            parameters_writer: new_writer(PARAMETERS_FILE_NAME)?,
            prices_writer: new_writer(PRICE_PROJECTIONS_FILE_NAME)?,
        })
    }

    /// Write the cost of every item in every year
    pub fn write_costs(&mut self, scenario: &Scenario, breakdown: &CostBreakdown) -> Result<()> {
        for (year, costs) in (0..).zip(&breakdown.cost_matrix) {
            for (item, cost) in scenario.items.iter().zip(costs) {
                let row = CostRow {
                    year,
                    component: item.component.id.clone(),
                    energy_name: item.price_profile.energy_name.clone(),
                    cost: cost.value(),
                };
                self.costs_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Write the current value and bounds of every parameter
    pub fn write_parameters(&mut self, scenario: &Scenario) -> Result<()> {
        for (_, parameter) in scenario.parameters.iter() {
            let row = ParameterRow {
                name: parameter.name().clone(),
                value: parameter.get(),
                default_value: parameter.default_value(),
                min_value: parameter.min_value(),
                max_value: parameter.max_value(),
                is_uncertain: parameter.is_uncertain(),
            };
            self.parameters_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the price of one kWh at the start of every year, for each price profile used
    pub fn write_price_projections(&mut self, scenario: &Scenario) -> Result<()> {
        let profiles: IndexMap<&ProfileID, &Rc<PriceProfile>> = scenario
            .items
            .iter()
            .map(|item| (&item.price_profile.id, &item.price_profile))
            .collect();

        for (id, profile) in profiles {
            let prices = profile.projected_prices(&scenario.parameters, scenario.duration_years)?;
            for (year, price) in (0..).zip(prices) {
                let row = PriceRow {
                    year,
                    price_profile: id.clone(),
                    price: price.value(),
                };
                self.prices_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.costs_writer.flush()?;
        self.parameters_writer.flush()?;
        self.prices_writer.flush()?;

        Ok(())
    }
}
