//! Common routines for reading a scenario from a TOML file.
use crate::error::CostModelError;
use crate::id::HasID;
use crate::parameter::ParameterStore;
use crate::registry::ApplyMode;
use crate::scenario::Scenario;
use anyhow::{Context, Result, bail};
use itertools::Itertools;
use log::warn;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::rc::Rc;

pub mod component;
use component::ComponentDefinition;
pub mod item;
use item::{ComponentMap, EnergyItemDefinition, PriceProfileMap};
pub mod price;
use price::PriceProfileDefinition;

/// Read a TOML file.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// The contents of a scenario file
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    duration_years: u32,
    #[serde(default)]
    apply_mode: ApplyMode,
    #[serde(default)]
    price_profiles: Vec<PriceProfileDefinition>,
    #[serde(default)]
    components: Vec<ComponentDefinition>,
    energy_items: Vec<EnergyItemDefinition>,
}

/// Fail if any name appears more than once
fn check_unique_names<'a>(kind: &str, names: impl Iterator<Item = &'a String>) -> Result<()> {
    if let Some(name) = names.duplicates().next() {
        bail!(CostModelError::InvalidConfiguration(format!(
            "Duplicate {kind} name: {name}"
        )));
    }

    Ok(())
}

impl ScenarioFile {
    /// Build the components, price profiles and energy items described by the file
    fn into_scenario(self) -> Result<Scenario> {
        check_unique_names("price profile", self.price_profiles.iter().map(|def| &def.name))?;
        check_unique_names("component", self.components.iter().map(|def| &def.name))?;

        let mut store = ParameterStore::new();
        let mut profiles = PriceProfileMap::new();
        for definition in self.price_profiles {
            let profile = definition.build(&mut store, self.duration_years)?;
            profiles.insert(profile.get_id().clone(), Rc::new(profile));
        }
        let mut components = ComponentMap::new();
        for definition in self.components {
            let component = definition.build(&mut store)?;
            components.insert(component.get_id().clone(), Rc::new(component));
        }

        let items: Vec<_> = self
            .energy_items
            .iter()
            .enumerate()
            .map(|(idx, definition)| {
                definition
                    .resolve(&components, &profiles)
                    .with_context(|| format!("Invalid energy item {}", idx + 1))
            })
            .try_collect()?;

        let used_components: HashSet<_> = items.iter().map(|item| &item.component.id).collect();
        for id in components.keys().filter(|id| !used_components.contains(id)) {
            warn!("Component {id} is not used by any energy item");
        }
        let used_profiles: HashSet<_> = items.iter().map(|item| &item.price_profile.id).collect();
        for id in profiles.keys().filter(|id| !used_profiles.contains(id)) {
            warn!("Price profile {id} is not used by any energy item");
        }

        Ok(Scenario::new(self.duration_years, store, items)?.with_apply_mode(self.apply_mode))
    }
}

/// Read a scenario from a string containing TOML
pub fn read_scenario_from_str(toml_str: &str) -> Result<Scenario> {
    let file: ScenarioFile = toml::from_str(toml_str)?;
    file.into_scenario()
}

/// Load a scenario from the specified file.
///
/// # Arguments
///
/// * `file_path` - Path to the scenario file
///
/// # Returns
///
/// The scenario, with every parameter at its default value, or an error.
pub fn load_scenario(file_path: &Path) -> Result<Scenario> {
    let file: ScenarioFile = read_toml(file_path)?;
    file.into_scenario().with_context(|| input_err_msg(file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};
    use crate::fixture::assert_error;
    use rstest::{fixture, rstest};
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn scenario_toml() -> String {
        r#"
        duration_years = 15
        apply_mode = "partial"

        [[price_profiles]]
        name = "gas"
        energy_name = "gas"
        profile_type = "power"
        initial_cost_one_kwh = 0.1043
        percentage_of_increase_per_year = { value = 10.0, min = 5.0, max = 15.0 }

        [[components]]
        name = "boiler"
        initial_install_cost = 7000
        maintenance_cost_per_year = 100
        production_over_consumption_ratio = 0.6

        [[energy_items]]
        component = "boiler"
        price_profile = "gas"
        energy_value = 3400
        "#
        .to_string()
    }

    #[rstest]
    fn test_read_scenario_from_str(scenario_toml: String) {
        let scenario = read_scenario_from_str(&scenario_toml).unwrap();
        assert_eq!(scenario.duration_years, 15);
        assert_eq!(scenario.apply_mode, ApplyMode::Partial);
        assert_eq!(scenario.items.len(), 1);
        assert_eq!(scenario.parameters.len(), 6);
        assert_eq!(scenario.uncertain_parameters().len(), 1);
    }

    #[rstest]
    fn test_load_scenario(scenario_toml: String) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("house.toml");
        {
            let mut file = fs::File::create(&file_path).unwrap();
            write!(file, "{scenario_toml}").unwrap();
        }

        let mut scenario = load_scenario(&file_path).unwrap();
        assert!(scenario.compute_cost().unwrap().total_cost.value() > 8400.0);
    }

    #[test]
    fn test_load_scenario_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing.toml");
        assert_error!(load_scenario(&file_path), input_err_msg(&file_path));
    }

    #[rstest]
    fn test_load_scenario_invalid_contents_has_path(scenario_toml: String) {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("house.toml");
        let toml_str = scenario_toml.replace("price_profile = \"gas\"", "price_profile = \"fuel\"");
        fs::write(&file_path, toml_str).unwrap();

        let err = load_scenario(&file_path).unwrap_err();
        assert_eq!(err.to_string(), input_err_msg(&file_path));
        assert_eq!(
            err.chain().nth(1).unwrap().to_string(),
            "Invalid energy item 1"
        );
    }

    #[rstest]
    fn test_duplicate_names(scenario_toml: String) {
        let toml_str = scenario_toml.replace(
            "[[energy_items]]",
            "[[components]]\nname = \"boiler\"\n\n[[energy_items]]",
        );
        assert_error!(
            read_scenario_from_str(&toml_str),
            "Duplicate component name: boiler"
        );
    }

    #[rstest]
    fn test_zero_duration(scenario_toml: String) {
        let toml_str = scenario_toml.replace("duration_years = 15", "duration_years = 0");
        let err = read_scenario_from_str(&toml_str).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Configuration));
    }

    #[rstest]
    fn test_unknown_profile_type(scenario_toml: String) {
        let toml_str = scenario_toml.replace("\"power\"", "\"exponential\"");
        assert_error!(
            read_scenario_from_str(&toml_str),
            "Unknown profile type: exponential. Should be 'linear', 'power' or 'points'"
        );
    }

    #[rstest]
    fn test_extra_keys_become_parameters(scenario_toml: String) {
        let toml_str = scenario_toml.replace(
            "production_over_consumption_ratio = 0.6",
            "production_over_consumption_ratio = 0.6\nstandby_losses = { value = 50.0, min = 0.0, max = 100.0 }",
        );
        let scenario = read_scenario_from_str(&toml_str).unwrap();
        assert!(scenario.inputs().contains_key("boiler.standby_losses"));
        assert_eq!(scenario.uncertain_parameters().len(), 2);
    }
}
