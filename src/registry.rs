//! The parameter registry: a flat view of every parameter reachable from a list of energy items.
use crate::error::CostModelError;
use crate::item::EnergyItem;
use crate::parameter::{BoundedParameter, ParameterID, ParameterName, ParameterStore};
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Values for parameters, keyed by qualified name
pub type ParameterValues = IndexMap<ParameterName, f64>;

/// How [`apply`] treats parameters for which no value is supplied
#[derive(
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Default,
)]
pub enum ApplyMode {
    /// Every parameter must be given a value
    #[default]
    #[string = "strict"]
    Strict,
    /// Parameters without a value are left unchanged
    #[string = "partial"]
    Partial,
}

/// Handles of the parameters reachable from `items`, without repeats, in order of first appearance
fn reachable(items: &[EnergyItem]) -> IndexSet<ParameterID> {
    items.iter().flat_map(|item| item.parameters()).collect()
}

/// Every parameter reachable from `items`, keyed by qualified name.
///
/// Items may share components and price profiles, in which case the shared parameters appear once.
pub fn collect<'a>(
    items: &[EnergyItem],
    store: &'a ParameterStore,
) -> IndexMap<ParameterName, &'a BoundedParameter> {
    reachable(items)
        .into_iter()
        .map(|id| {
            let parameter = store.get(id);
            (parameter.name().clone(), parameter)
        })
        .collect()
}

/// The default value of every parameter reachable from `items`
pub fn inputs(items: &[EnergyItem], store: &ParameterStore) -> ParameterValues {
    collect(items, store)
        .into_iter()
        .map(|(name, parameter)| (name, parameter.default_value()))
        .collect()
}

/// Assign `values` to the parameters reachable from `items`.
///
/// Either every value is assigned or, if any of them is invalid, none is.
///
/// # Returns
///
/// The number of parameters assigned, or an error if a name is unknown, a value is out of bounds or
/// (in strict mode) a parameter has no value.
pub fn apply(
    items: &[EnergyItem],
    store: &mut ParameterStore,
    values: &ParameterValues,
    mode: ApplyMode,
) -> Result<usize> {
    let parameters = collect(items, store);
    for name in values.keys() {
        ensure!(
            parameters.contains_key(name),
            CostModelError::UnknownParameter(name.to_string())
        );
    }

    let mut updates = Vec::with_capacity(values.len());
    for (id, (name, parameter)) in reachable(items).into_iter().zip(&parameters) {
        let Some(&value) = values.get(name) else {
            ensure!(
                mode == ApplyMode::Partial,
                CostModelError::MissingParameter(name.to_string())
            );
            debug!("No value supplied for {name}: keeping {}", parameter.get());
            continue;
        };

        parameter.check(value)?;
        updates.push((id, value));
    }

    for &(id, value) in &updates {
        store.set(id, value)?;
    }

    Ok(updates.len())
}
