//! Code for reading energy items from a scenario file.
use crate::component::{ComponentID, EnergeticComponent};
use crate::error::CostModelError;
use crate::id::IDMap;
use crate::item::EnergyItem;
use crate::price::{PriceProfile, ProfileID};
use crate::units::Energy;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::rc::Rc;

/// Components of a scenario, keyed by name
pub type ComponentMap = IndexMap<ComponentID, Rc<EnergeticComponent>>;

/// Price profiles of a scenario, keyed by name
pub type PriceProfileMap = IndexMap<ProfileID, Rc<PriceProfile>>;

/// An energy item as read from an input file, referring to its component and price profile by name
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EnergyItemDefinition {
    /// Name of the component
    pub component: String,
    /// Name of the price profile
    pub price_profile: String,
    /// Energy per year (kWh)
    pub energy_value: f64,
    /// Whether the energy is produced rather than consumed
    #[serde(default)]
    pub is_produced: bool,
}

impl EnergyItemDefinition {
    /// Create the item, looking up its component and price profile
    pub fn resolve(
        &self,
        components: &ComponentMap,
        profiles: &PriceProfileMap,
    ) -> Result<EnergyItem> {
        ensure!(
            self.energy_value.is_finite(),
            CostModelError::InvalidConfiguration(format!(
                "Energy value of item of component {} must be a number",
                self.component
            ))
        );
        let component = components
            .get_by_str(&self.component)
            .context("Energy item refers to an unknown component")?;
        let price_profile = profiles
            .get_by_str(&self.price_profile)
            .context("Energy item refers to an unknown price profile")?;

        Ok(EnergyItem::new(
            Energy(self.energy_value),
            Rc::clone(component),
            Rc::clone(price_profile),
            self.is_produced,
        ))
    }
}
