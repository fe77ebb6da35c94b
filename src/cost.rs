//! Integration of the cost of energy items over a number of years.
use crate::component::ComponentID;
use crate::error::CostModelError;
use crate::item::EnergyItem;
use crate::parameter::ParameterStore;
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::{debug, info};

/// The cost of a list of energy items, per year and per item
#[derive(Clone, Debug, PartialEq)]
pub struct CostBreakdown {
    /// Sum of the costs of every item over every year
    pub total_cost: Money,
    /// Name of the component of each item
    pub component_names: Vec<ComponentID>,
    /// Cost indexed by year, then by item
    pub cost_matrix: Vec<Vec<Money>>,
}

impl CostBreakdown {
    /// The number of years costs were computed for
    pub fn duration_years(&self) -> usize {
        self.cost_matrix.len()
    }

    /// Cost of every item in the given year
    ///
    /// # Panics
    ///
    /// If `year` is not less than [`CostBreakdown::duration_years`].
    pub fn year_total(&self, year: usize) -> Money {
        self.cost_matrix[year].iter().copied().sum()
    }

    /// Cost of the given item over every year
    ///
    /// # Panics
    ///
    /// If `item` is not a valid index into [`CostBreakdown::component_names`].
    pub fn item_total(&self, item: usize) -> Money {
        self.cost_matrix.iter().map(|costs| costs[item]).sum()
    }
}

/// Fail unless costs cover at least one year
fn check_duration(duration_years: u32) -> Result<()> {
    ensure!(
        duration_years > 0,
        CostModelError::InvalidConfiguration("Duration must be at least one year".into())
    );

    Ok(())
}

/// The cost of one item for every year from now until `duration_years` ahead
fn yearly_costs(
    item: &EnergyItem,
    store: &ParameterStore,
    duration_years: u32,
) -> Result<Vec<Money>> {
    check_duration(duration_years)?;

    let component = &item.component;
    let profile = &item.price_profile;
    let energy = item.consumed_energy(store)?;
    let injected = component.injected_energy(store);

    (0..duration_years)
        .map(|year| {
            let mut cost = profile.cost_for_year(store, year, energy)?;
            if component.is_productor() {
                cost -= profile.injected_revenue(store, year, injected);
            }
            if year == 0 {
                cost += component.install_cost(store);
            } else {
                cost += component.maintenance_cost(store);
            }

            Ok(cost)
        })
        .try_collect()
}

/// Compute the integrated cost of an item over `duration_years`.
///
/// The total is also cached in [`EnergyItem::integrated_cost`].
///
/// # Returns
///
/// The total cost and the cost for each year.
pub fn component_integrated_cost(
    item: &mut EnergyItem,
    store: &ParameterStore,
    duration_years: u32,
) -> Result<(Money, Vec<Money>)> {
    let costs = yearly_costs(item, store, duration_years)?;
    let total: Money = costs.iter().copied().sum();
    item.integrated_cost = Some(total);

    Ok((total, costs))
}

/// Compute the cost of every item over `duration_years`.
///
/// Items are costed independently of one another. If any of them fails, no item's cached cost is
/// updated.
pub fn compute_cost(
    items: &mut [EnergyItem],
    store: &ParameterStore,
    duration_years: u32,
) -> Result<CostBreakdown> {
    check_duration(duration_years)?;
    let costs_by_item: Vec<Vec<Money>> = items
        .iter()
        .map(|item| {
            yearly_costs(item, store, duration_years).with_context(|| {
                format!("Failed to compute cost of component {}", item.component.id)
            })
        })
        .try_collect()?;

    let mut total_cost = Money(0.0);
    for (item, costs) in items.iter_mut().zip(&costs_by_item) {
        let item_cost: Money = costs.iter().copied().sum();
        item.integrated_cost = Some(item_cost);
        total_cost += item_cost;
        debug!("{}", item.describe(store)?);
    }
    info!("Total cost over {duration_years} years: {:.0}", total_cost.value());

    let cost_matrix = (0..usize::try_from(duration_years)?)
        .map(|year| costs_by_item.iter().map(|costs| costs[year]).collect())
        .collect();

    Ok(CostBreakdown {
        total_cost,
        component_names: items.iter().map(|item| item.component.id.clone()).collect(),
        cost_matrix,
    })
}
