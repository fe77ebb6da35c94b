//! Energy items: the lines of a household's energy profile.
use crate::component::EnergeticComponent;
use crate::parameter::{ParameterID, ParameterStore};
use crate::price::PriceProfile;
use crate::units::{Dimensionless, Energy, Money};
use anyhow::Result;
use std::rc::Rc;

/// A quantity of energy attributed to one component and priced by one profile
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyItem {
    /// Energy per year, either consumed or produced by the component
    pub energy_value: Energy,
    /// The component the energy is attributed to
    pub component: Rc<EnergeticComponent>,
    /// The price profile of the energy
    pub price_profile: Rc<PriceProfile>,
    /// Whether `energy_value` is produced rather than consumed
    pub is_produced: bool,
    /// Total cost over the duration of the last computation, if one has been run
    pub integrated_cost: Option<Money>,
}

impl EnergyItem {
    /// Create a new [`EnergyItem`] with no cost computed yet
    pub fn new(
        energy_value: Energy,
        component: Rc<EnergeticComponent>,
        price_profile: Rc<PriceProfile>,
        is_produced: bool,
    ) -> Self {
        Self {
            energy_value,
            component,
            price_profile,
            is_produced,
            integrated_cost: None,
        }
    }

    /// The energy drawn from the grid per year
    pub fn consumed_energy(&self, store: &ParameterStore) -> Result<Energy> {
        self.component
            .energy_consumption(store, self.energy_value, self.is_produced)
    }

    /// The integrated cost averaged over the years of the price profile
    pub fn year_averaged_cost(&self) -> Option<Money> {
        let years = Dimensionless(f64::from(self.price_profile.duration_years));
        self.integrated_cost.map(|cost| cost / years)
    }

    /// Parameters of the component followed by those of the price profile
    pub fn parameters(&self) -> impl Iterator<Item = ParameterID> + '_ {
        self.component
            .parameters()
            .chain(self.price_profile.parameters())
    }

    /// A one-line report of the item
    pub fn describe(&self, store: &ParameterStore) -> Result<String> {
        let consumption = self.consumed_energy(store)?;
        let mut description = format!(
            "{} {} of {}",
            self.component.id,
            self.component.summary(store, consumption),
            self.price_profile.energy_name
        );
        if let Some(cost) = self.year_averaged_cost() {
            description.push_str(&format!(
                ", which represents {:.0} euros per year on average (including initial cost and \
                maintenance)",
                cost.value()
            ));
        }

        Ok(description)
    }
}
