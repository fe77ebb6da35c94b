//! Fixtures for tests
use crate::component::EnergeticComponent;
use crate::input::component::ComponentDefinition;
use crate::input::price::{PricePointDefinition, PriceProfileDefinition};
use crate::item::EnergyItem;
use crate::parameter::{ParameterStore, ParameterValue};
use crate::price::PriceProfile;
use crate::units::Energy;
use anyhow::Result;
use rstest::fixture;
use std::rc::Rc;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn store() -> ParameterStore {
    ParameterStore::new()
}

/// A boiler with a production/consumption ratio of 0.6
pub fn boiler(store: &mut ParameterStore) -> EnergeticComponent {
    ComponentDefinition::plain("boiler")
        .with_install_cost(7000.0.into())
        .with_maintenance_cost(100.0.into())
        .with_ratio(0.6.into())
        .build(store)
        .unwrap()
}

/// A photovoltaic panel producing 3066 kWh per year
pub fn photovoltaic(store: &mut ParameterStore) -> EnergeticComponent {
    ComponentDefinition::productor("pv", ParameterValue::ranged(0.4, 0.3, 0.5), 3066.0)
        .with_install_cost(5000.0.into())
        .build(store)
        .unwrap()
}

/// A linear electricity price profile called `grid`
pub fn linear_profile(
    store: &mut ParameterStore,
    initial: f64,
    slope: f64,
    duration_years: u32,
) -> PriceProfile {
    PriceProfileDefinition::linear("grid", "electricity", initial.into(), slope.into())
        .build(store, duration_years)
        .unwrap()
}

/// An electricity price profile defined by points up to year 5
pub fn electricity_profile(
    store: &mut ParameterStore,
    duration_years: u32,
) -> Result<PriceProfile> {
    PriceProfileDefinition::points(
        "electricity",
        "electricity",
        0.2.into(),
        vec![
            PricePointDefinition::ranged(1.0, 0.22, 0.2, 0.24),
            PricePointDefinition::new(5.0, 0.30),
        ],
    )
    .with_injected_price(0.1.into())
    .build(store, duration_years)
}

/// A gas price profile increasing by 10% (in [5%, 15%]) per year, over 15 years
pub fn gas_profile(store: &mut ParameterStore) -> PriceProfile {
    PriceProfileDefinition::power(
        "gas",
        "gas",
        0.1043.into(),
        ParameterValue::ranged(10.0, 5.0, 15.0),
    )
    .build(store, 15)
    .unwrap()
}

/// Heating and hot water, both supplied by the same boiler running on gas
pub fn boiler_items(store: &mut ParameterStore) -> Vec<EnergyItem> {
    let boiler = Rc::new(boiler(store));
    let gas = Rc::new(gas_profile(store));
    vec![
        EnergyItem::new(Energy(3400.0), boiler.clone(), gas.clone(), false),
        EnergyItem::new(Energy(1200.0), boiler, gas, true),
    ]
}
