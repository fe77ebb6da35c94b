//! The evaluation contract exposed to an external sampling driver.
//!
//! A driver reads the sampling space with [`Scenario::uncertain_parameters`], then repeatedly calls
//! [`Scenario::evaluate`] with a set of values and reads back the total cost. Evaluations on the
//! same scenario are serialised because they take `&mut self`; to run samples independently, clone
//! the scenario for each of them.
use crate::cost::{CostBreakdown, compute_cost};
use crate::error::CostModelError;
use crate::item::EnergyItem;
use crate::parameter::{BoundedParameter, ParameterName, ParameterStore};
use crate::registry::{self, ApplyMode, ParameterValues};
use crate::units::Money;
use anyhow::{Result, ensure};
use indexmap::IndexMap;

/// A household energy profile together with the parameters it depends on
#[derive(Clone, Debug)]
pub struct Scenario {
    /// The number of years costs are computed over
    pub duration_years: u32,
    /// Every parameter of the components and price profiles
    pub parameters: ParameterStore,
    /// The energy profile
    pub items: Vec<EnergyItem>,
    /// How missing values are treated by [`Scenario::apply`]
    pub apply_mode: ApplyMode,
}

impl Scenario {
    /// Create a new [`Scenario`], checking that its parts are consistent
    pub fn new(
        duration_years: u32,
        parameters: ParameterStore,
        items: Vec<EnergyItem>,
    ) -> Result<Self> {
        let config_err = CostModelError::InvalidConfiguration;
        ensure!(
            duration_years > 0,
            config_err("Duration must be at least one year".into())
        );
        ensure!(
            !items.is_empty(),
            config_err("A scenario must contain at least one energy item".into())
        );
        for item in &items {
            let profile = &item.price_profile;
            ensure!(
                profile.duration_years == duration_years,
                config_err(format!(
                    "Price profile {} was built for {} years but the scenario lasts {duration_years}",
                    profile.id, profile.duration_years
                ))
            );
        }

        Ok(Self {
            duration_years,
            parameters,
            items,
            apply_mode: ApplyMode::default(),
        })
    }

    /// Use the given mode when applying values
    pub fn with_apply_mode(mut self, apply_mode: ApplyMode) -> Self {
        self.apply_mode = apply_mode;
        self
    }

    /// The default value of every parameter, keyed by qualified name
    pub fn inputs(&self) -> ParameterValues {
        registry::inputs(&self.items, &self.parameters)
    }

    /// The parameters with both bounds defined, i.e. the space a driver should sample
    pub fn uncertain_parameters(&self) -> IndexMap<ParameterName, &BoundedParameter> {
        registry::collect(&self.items, &self.parameters)
            .into_iter()
            .filter(|(_, parameter)| parameter.is_uncertain())
            .collect()
    }

    /// Assign values to parameters according to the scenario's [`ApplyMode`]
    pub fn apply(&mut self, values: &ParameterValues) -> Result<usize> {
        registry::apply(&self.items, &mut self.parameters, values, self.apply_mode)
    }

    /// Compute the cost of the energy profile with the current parameter values
    pub fn compute_cost(&mut self) -> Result<CostBreakdown> {
        compute_cost(&mut self.items, &self.parameters, self.duration_years)
    }

    /// Apply `values`, then compute the total cost
    pub fn evaluate(&mut self, values: &ParameterValues) -> Result<Money> {
        self.apply(values)?;
        Ok(self.compute_cost()?.total_cost)
    }

    /// Restore every parameter to its default value
    pub fn reset(&mut self) {
        self.parameters.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};
    use crate::fixture::{assert_error, boiler_items, linear_profile, store};
    use crate::units::Energy;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};
    use std::rc::Rc;

    #[fixture]
    fn scenario(mut store: ParameterStore) -> Scenario {
        let items = boiler_items(&mut store);
        Scenario::new(15, store, items).unwrap()
    }

    #[rstest]
    fn test_new_invalid(mut store: ParameterStore) {
        let items = boiler_items(&mut store);
        assert_error!(
            Scenario::new(10, store.clone(), items.clone()),
            "Price profile gas was built for 15 years but the scenario lasts 10"
        );
        assert_error!(
            Scenario::new(15, store.clone(), Vec::new()),
            "A scenario must contain at least one energy item"
        );
        let err = Scenario::new(0, store, items).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Configuration));
    }

    #[rstest]
    fn test_uncertain_parameters(scenario: Scenario) {
        let names = scenario
            .uncertain_parameters()
            .keys()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(names, ["gas.percentage_of_increase_per_year"]);
        assert_eq!(scenario.inputs().len(), 6);
    }

    #[rstest]
    fn test_evaluate_defaults_is_compute_cost(mut scenario: Scenario) {
        let expected = scenario.compute_cost().unwrap().total_cost;
        let inputs = scenario.inputs();
        assert_eq!(scenario.evaluate(&inputs).unwrap(), expected);
    }

    #[rstest]
    fn test_evaluate_responds_to_values(mut scenario: Scenario) {
        let mut values = scenario.inputs();
        let base = scenario.evaluate(&values).unwrap();

        values.insert("gas.percentage_of_increase_per_year".into(), 15.0);
        let dearer = scenario.evaluate(&values).unwrap();
        assert!(dearer > base);

        scenario.reset();
        assert_eq!(scenario.compute_cost().unwrap().total_cost, base);
    }

    #[rstest]
    fn test_evaluate_out_of_bounds(mut scenario: Scenario) {
        let base = scenario.compute_cost().unwrap();

        let mut values = scenario.inputs();
        values.insert("gas.percentage_of_increase_per_year".into(), 16.0);
        let err = scenario.evaluate(&values).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Range));

        // Nothing has changed
        assert_eq!(scenario.compute_cost().unwrap(), base);
    }

    #[rstest]
    fn test_partial_mode(scenario: Scenario) {
        let mut scenario = scenario.with_apply_mode(ApplyMode::Partial);
        let values: ParameterValues =
            [("boiler.maintenance_cost_per_year".into(), 200.0)].into_iter().collect();
        let base = scenario.compute_cost().unwrap().total_cost;
        let cost = scenario.evaluate(&values).unwrap();

        // Two items over 14 years of maintenance
        assert_approx_eq!(Money, cost - base, Money(2.0 * 14.0 * 100.0), epsilon = 1e-6);

        let mut strict = scenario.with_apply_mode(ApplyMode::Strict);
        let err = strict.evaluate(&values).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Key));
    }

    #[rstest]
    fn test_clones_are_independent(scenario: Scenario) {
        let mut first = scenario.clone();
        let mut second = scenario;
        let mut values = first.inputs();
        values.insert("gas.percentage_of_increase_per_year".into(), 5.0);

        let cheaper = first.evaluate(&values).unwrap();
        let defaults = second.inputs();
        let base = second.evaluate(&defaults).unwrap();
        assert!(cheaper < base);
        assert!(second.items[0].integrated_cost.is_some());
    }

    #[rstest]
    fn test_profiles_shared_between_items(mut store: ParameterStore) {
        let items = boiler_items(&mut store);
        let electricity = Rc::new(linear_profile(&mut store, 0.2, 0.0, 15));
        let lights = EnergyItem::new(
            Energy(500.0),
            items[0].component.clone(),
            electricity,
            false,
        );
        let mut scenario = Scenario::new(15, store, vec![items[0].clone(), lights]).unwrap();

        let breakdown = scenario.compute_cost().unwrap();
        assert_eq!(breakdown.component_names.len(), 2);
        assert_eq!(scenario.inputs().len(), 9);
    }
}
