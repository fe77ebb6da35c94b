//! Bounded parameters and the store which owns them.
//!
//! Every uncertain quantity in the model (unit prices, costs, ratios, etc.) is a
//! [`BoundedParameter`] held in a single [`ParameterStore`]. Components and price profiles refer to
//! their parameters by [`ParameterID`] handle, which lets an external driver address any parameter
//! by its qualified name (`<owner>.<field>`) without walking the object graph.
use crate::error::CostModelError;
use crate::id::define_id_type;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

define_id_type! {ParameterName}

/// Build the qualified name of a parameter from the name of its owner and field
pub fn qualified_name(owner: &str, field: &str) -> ParameterName {
    format!("{owner}.{field}").into()
}

/// A stable handle to a parameter held in a [`ParameterStore`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterID(usize);

impl fmt::Display for ParameterID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named scalar value with optional bounds
#[derive(Clone, Debug, PartialEq)]
pub struct BoundedParameter {
    name: ParameterName,
    default_value: f64,
    value: f64,
    min_value: f64,
    max_value: f64,
    is_uncertain: bool,
}

impl BoundedParameter {
    /// Create a new parameter.
    ///
    /// A missing bound is treated as infinite. The parameter is only considered uncertain if both
    /// bounds are given.
    pub fn new(
        name: ParameterName,
        value: f64,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> Result<Self> {
        let is_uncertain = min_value.is_some() && max_value.is_some();
        let min_value = min_value.unwrap_or(f64::NEG_INFINITY);
        let max_value = max_value.unwrap_or(f64::INFINITY);
        ensure!(
            min_value <= max_value,
            CostModelError::InvalidConfiguration(format!(
                "Minimum value of parameter {name} ({min_value}) is greater than its maximum \
                value ({max_value})"
            ))
        );

        let parameter = Self {
            name,
            default_value: value,
            value,
            min_value,
            max_value,
            is_uncertain,
        };
        parameter.check(value)?;

        Ok(parameter)
    }

    /// Create a new parameter with no bounds
    pub fn fixed(name: ParameterName, value: f64) -> Result<Self> {
        Self::new(name, value, None, None)
    }

    /// The qualified name of the parameter
    pub fn name(&self) -> &ParameterName {
        &self.name
    }

    /// The current value
    pub fn get(&self) -> f64 {
        self.value
    }

    /// The value the parameter was created with
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Lower bound (`-inf` if unbounded)
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Upper bound (`inf` if unbounded)
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Whether both bounds were supplied, i.e. the parameter spans a range to be sampled
    pub fn is_uncertain(&self) -> bool {
        self.is_uncertain
    }

    /// Check whether `value` could be assigned to this parameter.
    ///
    /// NaN is never within bounds.
    pub fn check(&self, value: f64) -> Result<()> {
        ensure!(
            (self.min_value..=self.max_value).contains(&value),
            CostModelError::OutOfBounds {
                name: self.name.to_string(),
                value,
                min: self.min_value,
                max: self.max_value,
            }
        );

        Ok(())
    }

    /// Assign a new value, leaving the parameter untouched if it is out of bounds
    pub fn set(&mut self, value: f64) -> Result<()> {
        self.check(value)?;
        self.value = value;
        Ok(())
    }

    /// Restore the default value
    pub fn reset(&mut self) {
        self.value = self.default_value;
    }
}

impl fmt::Display for BoundedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: value = {}", self.name, self.value)?;
        if self.is_uncertain {
            write!(f, " ranging in [{}, {}]", self.min_value, self.max_value)?;
        }
        Ok(())
    }
}

/// The value of a parameter as given in an input file.
///
/// Either a bare number, which gives a parameter without bounds, or a table with a value and
/// optional bounds, e.g. `{ value = 10.0, min = 5.0, max = 15.0 }`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A value with no bounds
    Fixed(f64),
    /// A value with optional bounds
    Ranged {
        /// The default value
        value: f64,
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
}

impl ParameterValue {
    /// A value with both bounds set
    pub fn ranged(value: f64, min: f64, max: f64) -> Self {
        Self::Ranged {
            value,
            min: Some(min),
            max: Some(max),
        }
    }

    /// The default value
    pub fn value(&self) -> f64 {
        match self {
            Self::Fixed(value) | Self::Ranged { value, .. } => *value,
        }
    }

    /// Create a [`BoundedParameter`] with the given name from this value
    pub fn into_parameter(self, name: ParameterName) -> Result<BoundedParameter> {
        match self {
            Self::Fixed(value) => BoundedParameter::fixed(name, value),
            Self::Ranged { value, min, max } => BoundedParameter::new(name, value, min, max),
        }
    }
}

impl Default for ParameterValue {
    fn default() -> Self {
        Self::Fixed(0.0)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Fixed(value)
    }
}

/// Owns every parameter in a scenario, indexed by handle and by qualified name.
///
/// Cloning the store gives an independent set of values which the same handles can be used with.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    parameters: Vec<BoundedParameter>,
    index: IndexMap<ParameterName, ParameterID>,
}

impl ParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the store.
    ///
    /// # Returns
    ///
    /// A handle to the new parameter, or an error if a parameter with the same name exists.
    pub fn add(&mut self, parameter: BoundedParameter) -> Result<ParameterID> {
        ensure!(
            !self.index.contains_key(parameter.name()),
            CostModelError::DuplicateParameter(parameter.name().to_string())
        );

        let id = ParameterID(self.parameters.len());
        self.index.insert(parameter.name().clone(), id);
        self.parameters.push(parameter);

        Ok(id)
    }

    /// Create and add a parameter named `<owner>.<field>`
    pub fn declare(
        &mut self,
        owner: &str,
        field: &str,
        value: ParameterValue,
    ) -> Result<ParameterID> {
        let parameter = value.into_parameter(qualified_name(owner, field))?;
        self.add(parameter)
    }

    /// Get the parameter for a handle.
    ///
    /// # Panics
    ///
    /// If the handle was not issued by this store (or a clone of it).
    pub fn get(&self, id: ParameterID) -> &BoundedParameter {
        &self.parameters[id.0]
    }

    /// The current value of a parameter
    pub fn value(&self, id: ParameterID) -> f64 {
        self.get(id).get()
    }

    /// Assign a new value to a parameter
    pub fn set(&mut self, id: ParameterID, value: f64) -> Result<()> {
        self.parameters[id.0].set(value)
    }

    /// Look up the handle of a parameter by its qualified name
    pub fn id_of(&self, name: &str) -> Result<ParameterID> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CostModelError::UnknownParameter(name.to_string()).into())
    }

    /// Iterate over all parameters in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = (ParameterID, &BoundedParameter)> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(idx, parameter)| (ParameterID(idx), parameter))
    }

    /// The number of parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Restore every parameter to its default value
    pub fn reset(&mut self) {
        for parameter in &mut self.parameters {
            parameter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};
    use crate::fixture::assert_error;
    use rstest::rstest;

    fn ranged(value: f64, min: f64, max: f64) -> BoundedParameter {
        BoundedParameter::new("pv.auto_consumption_ratio".into(), value, Some(min), Some(max))
            .unwrap()
    }

    #[test]
    fn test_bounded_parameter_new() {
        let param = ranged(0.4, 0.3, 0.5);
        assert!(param.is_uncertain());
        assert_eq!(param.get(), 0.4);
        assert_eq!(param.default_value(), 0.4);

        let param = BoundedParameter::new("gas.slope".into(), 1.0, Some(0.0), None).unwrap();
        assert!(!param.is_uncertain());
        assert_eq!(param.max_value(), f64::INFINITY);

        let param = BoundedParameter::fixed("gas.slope".into(), -3.0).unwrap();
        assert!(!param.is_uncertain());
        assert_eq!(param.min_value(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_bounded_parameter_new_invalid() {
        let result = BoundedParameter::new("a.b".into(), 0.4, Some(0.5), Some(0.3));
        assert_eq!(error_kind(&result.unwrap_err()), Some(ErrorKind::Configuration));

        let result = BoundedParameter::new("a.b".into(), 0.6, Some(0.3), Some(0.5));
        assert_eq!(error_kind(&result.unwrap_err()), Some(ErrorKind::Range));
    }

    #[rstest]
    #[case(0.3)]
    #[case(0.45)]
    #[case(0.5)]
    fn test_set_in_bounds(#[case] value: f64) {
        let mut param = ranged(0.4, 0.3, 0.5);
        param.set(value).unwrap();
        assert_eq!(param.get(), value);
        assert_eq!(param.default_value(), 0.4);
    }

    #[rstest]
    #[case(0.29)]
    #[case(0.51)]
    #[case(f64::INFINITY)]
    #[case(f64::NAN)]
    fn test_set_out_of_bounds(#[case] value: f64) {
        let mut param = ranged(0.4, 0.3, 0.5);
        let err = param.set(value).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Range));
        assert_eq!(param.get(), 0.4);
    }

    #[test]
    fn test_reset() {
        let mut param = ranged(0.4, 0.3, 0.5);
        param.set(0.35).unwrap();
        param.reset();
        assert_eq!(param.get(), 0.4);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ranged(0.4, 0.3, 0.5).to_string(),
            "pv.auto_consumption_ratio: value = 0.4 ranging in [0.3, 0.5]"
        );
        assert_eq!(
            BoundedParameter::fixed("gas.slope".into(), 2.0)
                .unwrap()
                .to_string(),
            "gas.slope: value = 2"
        );
    }

    #[test]
    fn test_parameter_value_deserialise() {
        #[derive(Deserialize)]
        struct Record {
            a: ParameterValue,
            b: ParameterValue,
            c: ParameterValue,
        }

        let record: Record =
            toml::from_str("a = 7000\nb = { value = 10.0, min = 5.0, max = 15.0 }\nc = { value = 1.0 }")
                .unwrap();
        assert_eq!(record.a, ParameterValue::Fixed(7000.0));
        assert_eq!(record.b, ParameterValue::ranged(10.0, 5.0, 15.0));
        assert_eq!(
            record.c,
            ParameterValue::Ranged {
                value: 1.0,
                min: None,
                max: None
            }
        );
    }

    #[test]
    fn test_store_declare_and_lookup() {
        let mut store = ParameterStore::new();
        let slope = store.declare("gas", "slope", 0.01.into()).unwrap();
        let ratio = store
            .declare("pv", "auto_consumption_ratio", ParameterValue::ranged(0.4, 0.3, 0.5))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.id_of("gas.slope").unwrap(), slope);
        assert_eq!(store.id_of("pv.auto_consumption_ratio").unwrap(), ratio);
        assert_eq!(store.get(ratio).name().to_string(), "pv.auto_consumption_ratio");
        assert_eq!(
            error_kind(&store.id_of("pv.slope").unwrap_err()),
            Some(ErrorKind::Key)
        );
    }

    #[test]
    fn test_store_duplicate_name() {
        let mut store = ParameterStore::new();
        store.declare("boiler", "initial_install_cost", 7000.0.into()).unwrap();
        assert_error!(
            store.declare("boiler", "initial_install_cost", 8000.0.into()),
            "Parameter boiler.initial_install_cost is declared more than once"
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_clone_is_independent() {
        let mut store = ParameterStore::new();
        let id = store
            .declare(
                "gas",
                "percentage_of_increase_per_year",
                ParameterValue::ranged(10.0, 5.0, 15.0),
            )
            .unwrap();
        let mut sample = store.clone();
        sample.set(id, 12.0).unwrap();
        assert_eq!(sample.value(id), 12.0);
        assert_eq!(store.value(id), 10.0);

        sample.reset();
        assert_eq!(sample.value(id), 10.0);
    }
}
