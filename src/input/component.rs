//! Code for reading energetic components from a scenario file.
use crate::component::{ComponentKind, EnergeticComponent};
use crate::error::CostModelError;
use crate::parameter::{ParameterID, ParameterStore, ParameterValue};
use crate::units::Energy;
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

/// The number of hours of sunshine per day assumed for productors rated by peak power
const DEFAULT_SUNNY_HOURS_PER_DAY: f64 = 7.0;

/// The number of days per year assumed for productors rated by peak power
const DEFAULT_DAYS_PER_YEAR: f64 = 365.0;

fn default_sunny_hours_per_day() -> f64 {
    DEFAULT_SUNNY_HOURS_PER_DAY
}

fn default_days_per_year() -> f64 {
    DEFAULT_DAYS_PER_YEAR
}

/// The kind of component, as given in an input file
#[derive(DeserializeLabeledStringEnum, Clone, Copy, Debug, PartialEq, Default)]
pub enum ComponentType {
    /// Only draws energy
    #[default]
    #[string = "plain"]
    Plain,
    /// Produces energy and may sell the surplus
    #[string = "productor"]
    Productor,
}

/// The definition of an energetic component, as read from an input file
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ComponentDefinition {
    /// Unique name of the component
    pub name: String,
    /// Plain or productor
    #[serde(default)]
    pub kind: ComponentType,
    /// Cost paid once, in the first year
    #[serde(default)]
    pub initial_install_cost: ParameterValue,
    /// Cost paid every year after the first
    #[serde(default, alias = "maintenance_cost")]
    pub maintenance_cost_per_year: ParameterValue,
    /// Ratio used to convert produced energy into consumed energy
    pub production_over_consumption_ratio: Option<ParameterValue>,
    /// Share of a productor's output which is consumed on site
    pub auto_consumption_ratio: Option<ParameterValue>,
    /// Energy produced by a productor per year
    pub produced_energy_kwh: Option<f64>,
    /// Peak power of a productor, used if `produced_energy_kwh` is not given
    pub peak_power_kw: Option<f64>,
    /// Hours per day at peak power
    #[serde(default = "default_sunny_hours_per_day")]
    pub sunny_hours_per_day: f64,
    /// Days per year of production
    #[serde(default = "default_days_per_year")]
    pub days_per_year: f64,
    /// Any other keys, which become parameters of the component
    #[serde(flatten)]
    pub extra: IndexMap<String, ParameterValue>,
}

impl ComponentDefinition {
    /// A plain component with no costs
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ComponentType::Plain,
            initial_install_cost: ParameterValue::default(),
            maintenance_cost_per_year: ParameterValue::default(),
            production_over_consumption_ratio: None,
            auto_consumption_ratio: None,
            produced_energy_kwh: None,
            peak_power_kw: None,
            sunny_hours_per_day: DEFAULT_SUNNY_HOURS_PER_DAY,
            days_per_year: DEFAULT_DAYS_PER_YEAR,
            extra: IndexMap::new(),
        }
    }

    /// A productor component with no costs
    pub fn productor(
        name: &str,
        auto_consumption_ratio: ParameterValue,
        produced_energy_kwh: f64,
    ) -> Self {
        Self {
            kind: ComponentType::Productor,
            auto_consumption_ratio: Some(auto_consumption_ratio),
            produced_energy_kwh: Some(produced_energy_kwh),
            ..Self::plain(name)
        }
    }

    /// Set the installation cost
    pub fn with_install_cost(mut self, initial_install_cost: ParameterValue) -> Self {
        self.initial_install_cost = initial_install_cost;
        self
    }

    /// Set the yearly maintenance cost
    pub fn with_maintenance_cost(mut self, maintenance_cost_per_year: ParameterValue) -> Self {
        self.maintenance_cost_per_year = maintenance_cost_per_year;
        self
    }

    /// Set the production/consumption ratio
    pub fn with_ratio(mut self, production_over_consumption_ratio: ParameterValue) -> Self {
        self.production_over_consumption_ratio = Some(production_over_consumption_ratio);
        self
    }

    /// The energy a productor generates per year
    fn produced_energy(&self) -> Result<Energy> {
        let name = &self.name;
        let energy = match (self.produced_energy_kwh, self.peak_power_kw) {
            (Some(energy), None) => energy,
            (None, Some(power)) => power * self.sunny_hours_per_day * self.days_per_year,
            (Some(_), Some(_)) => bail!(CostModelError::InvalidConfiguration(format!(
                "Component {name}: only one of produced_energy_kwh and peak_power_kw may be given"
            ))),
            (None, None) => bail!(CostModelError::InvalidConfiguration(format!(
                "Productor component {name} requires produced_energy_kwh or peak_power_kw"
            ))),
        };
        ensure!(
            energy.is_finite() && energy >= 0.0,
            CostModelError::InvalidConfiguration(format!(
                "Component {name}: produced energy must be a non-negative number, got {energy}"
            ))
        );

        Ok(Energy(energy))
    }

    /// Create the component, declaring its parameters in `store`
    pub fn build(self, store: &mut ParameterStore) -> Result<EnergeticComponent> {
        let name = self.name.as_str();
        let kind = match self.kind {
            ComponentType::Plain => {
                ensure!(
                    self.auto_consumption_ratio.is_none()
                        && self.produced_energy_kwh.is_none()
                        && self.peak_power_kw.is_none(),
                    CostModelError::InvalidConfiguration(format!(
                        "Component {name} is not a productor, so cannot produce energy of its own"
                    ))
                );
                None
            }
            ComponentType::Productor => {
                let ratio = self.auto_consumption_ratio.ok_or_else(|| {
                    CostModelError::InvalidConfiguration(format!(
                        "Productor component {name} requires an auto_consumption_ratio"
                    ))
                })?;
                check_proportion(name, ratio)?;
                Some((ratio, self.produced_energy()?))
            }
        };

        let initial_install_cost =
            store.declare(name, "initial_install_cost", self.initial_install_cost)?;
        let maintenance_cost_per_year = store.declare(
            name,
            "maintenance_cost_per_year",
            self.maintenance_cost_per_year,
        )?;
        let production_over_consumption_ratio = self
            .production_over_consumption_ratio
            .map(|ratio| store.declare(name, "production_over_consumption_ratio", ratio))
            .transpose()?;
        let kind = match kind {
            None => ComponentKind::Plain,
            Some((ratio, produced_energy)) => ComponentKind::Productor {
                auto_consumption_ratio: store.declare(name, "auto_consumption_ratio", ratio)?,
                produced_energy,
            },
        };
        let extra_parameters: Vec<ParameterID> = self
            .extra
            .iter()
            .map(|(key, value)| store.declare(name, key, *value))
            .try_collect()?;

        Ok(EnergeticComponent {
            id: self.name.into(),
            initial_install_cost,
            maintenance_cost_per_year,
            production_over_consumption_ratio,
            kind,
            extra_parameters,
        })
    }
}

/// Check that a ratio and any bounds it has lie between 0 and 1
fn check_proportion(name: &str, ratio: ParameterValue) -> Result<()> {
    let bounds = match ratio {
        ParameterValue::Fixed(_) => [None, None],
        ParameterValue::Ranged { min, max, .. } => [min, max],
    };
    ensure!(
        bounds
            .into_iter()
            .flatten()
            .chain([ratio.value()])
            .all(|value| (0.0..=1.0).contains(&value)),
        CostModelError::InvalidConfiguration(format!(
            "auto_consumption_ratio of component {name} must lie between 0 and 1"
        ))
    );

    Ok(())
}
