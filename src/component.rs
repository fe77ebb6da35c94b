//! Energetic components: the household equipment which consumes or produces energy.
use crate::error::CostModelError;
use crate::id::{define_id_getter, define_id_type};
use crate::parameter::{ParameterID, ParameterStore};
use crate::units::{Dimensionless, Energy, Money};
use anyhow::{Result, ensure};
use std::iter;

define_id_type! {ComponentID}

/// What a component is able to do besides consuming energy
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentKind {
    /// A component which only draws energy
    Plain,
    /// A component which produces energy, part of which is consumed on site and the rest sold
    Productor {
        /// Share of the produced energy which is consumed on site
        auto_consumption_ratio: ParameterID,
        /// Energy produced per year
        produced_energy: Energy,
    },
}

/// A piece of household equipment (boiler, heat pump, photovoltaic panel, etc.)
#[derive(Clone, Debug, PartialEq)]
pub struct EnergeticComponent {
    /// Unique name of the component
    pub id: ComponentID,
    /// Cost paid once, in the first year
    pub initial_install_cost: ParameterID,
    /// Cost paid every year after the first
    pub maintenance_cost_per_year: ParameterID,
    /// Ratio used to convert produced energy into consumed energy
    pub production_over_consumption_ratio: Option<ParameterID>,
    /// Plain or productor
    pub kind: ComponentKind,
    /// Parameters declared in the input which the model does not use
    pub extra_parameters: Vec<ParameterID>,
}
define_id_getter! {EnergeticComponent, ComponentID}

impl EnergeticComponent {
    /// Whether the component can sell surplus energy
    pub fn is_productor(&self) -> bool {
        matches!(self.kind, ComponentKind::Productor { .. })
    }

    /// The one-off installation cost
    pub fn install_cost(&self, store: &ParameterStore) -> Money {
        Money(store.value(self.initial_install_cost))
    }

    /// The yearly maintenance cost
    pub fn maintenance_cost(&self, store: &ParameterStore) -> Money {
        Money(store.value(self.maintenance_cost_per_year))
    }

    /// Every parameter owned by this component
    pub fn parameters(&self) -> impl Iterator<Item = ParameterID> + '_ {
        let auto_consumption_ratio = match self.kind {
            ComponentKind::Plain => None,
            ComponentKind::Productor {
                auto_consumption_ratio,
                ..
            } => Some(auto_consumption_ratio),
        };

        [self.initial_install_cost, self.maintenance_cost_per_year]
            .into_iter()
            .chain(self.production_over_consumption_ratio)
            .chain(auto_consumption_ratio)
            .chain(self.extra_parameters.iter().copied())
    }

    /// The energy drawn from the grid per year.
    ///
    /// Consumed energy is returned unchanged and produced energy is divided by the
    /// production/consumption ratio. For a productor the arguments are ignored: the result is the
    /// (negative) share of its own production which is consumed on site.
    pub fn energy_consumption(
        &self,
        store: &ParameterStore,
        energy_value: Energy,
        is_produced: bool,
    ) -> Result<Energy> {
        if let ComponentKind::Productor {
            auto_consumption_ratio,
            produced_energy,
        } = self.kind
        {
            return Ok(-(Dimensionless(store.value(auto_consumption_ratio)) * produced_energy));
        }

        if !is_produced {
            return Ok(energy_value);
        }

        let ratio = self
            .production_over_consumption_ratio
            .ok_or_else(|| CostModelError::UndefinedRatio(self.id.to_string()))?;
        let ratio = store.value(ratio);
        ensure!(
            ratio > 0.0,
            CostModelError::InvalidConfiguration(format!(
                "production_over_consumption_ratio of component {} must be positive, got {ratio}",
                self.id
            ))
        );

        Ok(energy_value / Dimensionless(ratio))
    }

    /// Surplus energy available to sell per year (always zero for plain components)
    pub fn injected_energy(&self, store: &ParameterStore) -> Energy {
        match self.kind {
            ComponentKind::Plain => Energy(0.0),
            ComponentKind::Productor {
                auto_consumption_ratio,
                produced_energy,
            } => Dimensionless(1.0 - store.value(auto_consumption_ratio)) * produced_energy,
        }
    }

    /// A human-readable description of what the component does with `consumption`, as returned
    /// by [`Self::energy_consumption`]
    pub fn summary(&self, store: &ParameterStore, consumption: Energy) -> String {
        if !self.is_productor() {
            return format!("consumes {:.0} kWh per year from the grid", consumption.value());
        }

        let injected = self.injected_energy(store);
        let sold = (injected > Energy(0.0))
            .then(|| format!(" and sells {:.0} kWh per year", injected.value()));
        iter::once(format!(
            "saves {:.0} kWh per year of grid consumption",
            -consumption.value()
        ))
        .chain(sold)
        .collect()
    }
}
