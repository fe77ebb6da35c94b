//! Code for reading price profiles from a scenario file.
use crate::error::CostModelError;
use crate::parameter::{ParameterStore, ParameterValue};
use crate::price::{PriceCurve, PricePoint, PriceProfile, ProfileType};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::warn;
use serde::Deserialize;
use std::iter;

/// Keys of a price profile record which do not become parameters
const RESERVED_KEYS: [&str; 4] = ["name", "energy_name", "profile_type", "points"];

/// A point on a price curve as given in an input file
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct PricePointDefinition {
    /// Number of years ahead of the present
    pub year: f64,
    /// Price of one kWh at `year`
    pub value: f64,
    /// Lower bound of the price
    pub min: Option<f64>,
    /// Upper bound of the price
    pub max: Option<f64>,
}

impl PricePointDefinition {
    /// A point with a fixed price
    pub fn new(year: f64, value: f64) -> Self {
        Self {
            year,
            value,
            min: None,
            max: None,
        }
    }

    /// A point whose price ranges in `[min, max]`
    pub fn ranged(year: f64, value: f64, min: f64, max: f64) -> Self {
        Self {
            year,
            value,
            min: Some(min),
            max: Some(max),
        }
    }

    fn parameter_value(&self) -> ParameterValue {
        ParameterValue::Ranged {
            value: self.value,
            min: self.min,
            max: self.max,
        }
    }
}

/// The definition of a price profile, as read from an input file
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PriceProfileDefinition {
    /// Unique name of the profile
    pub name: String,
    /// The kind of energy being priced
    pub energy_name: String,
    /// One of `linear`, `power` or `points`
    pub profile_type: String,
    /// Current price of one kWh
    pub initial_cost_one_kwh: ParameterValue,
    /// Yearly increase for `linear` profiles
    pub slope: Option<ParameterValue>,
    /// Yearly percentage increase for `power` profiles
    pub percentage_of_increase_per_year: Option<ParameterValue>,
    /// Points of the curve for `points` profiles
    pub points: Option<Vec<PricePointDefinition>>,
    /// Price paid for surplus energy sold back (zero if absent)
    pub injected_price_per_kwh: Option<ParameterValue>,
    /// Any other keys, which become parameters of the profile
    #[serde(flatten)]
    pub extra: IndexMap<String, ParameterValue>,
}

impl PriceProfileDefinition {
    fn with_type(
        name: &str,
        energy_name: &str,
        profile_type: ProfileType,
        initial: ParameterValue,
    ) -> Self {
        Self {
            name: name.to_string(),
            energy_name: energy_name.to_string(),
            profile_type: profile_type.to_string(),
            initial_cost_one_kwh: initial,
            slope: None,
            percentage_of_increase_per_year: None,
            points: None,
            injected_price_per_kwh: None,
            extra: IndexMap::new(),
        }
    }

    /// A `linear` profile definition
    pub fn linear(
        name: &str,
        energy_name: &str,
        initial_cost_one_kwh: ParameterValue,
        slope: ParameterValue,
    ) -> Self {
        Self {
            slope: Some(slope),
            ..Self::with_type(name, energy_name, ProfileType::Linear, initial_cost_one_kwh)
        }
    }

    /// A `power` profile definition
    pub fn power(
        name: &str,
        energy_name: &str,
        initial_cost_one_kwh: ParameterValue,
        percentage_of_increase_per_year: ParameterValue,
    ) -> Self {
        Self {
            percentage_of_increase_per_year: Some(percentage_of_increase_per_year),
            ..Self::with_type(name, energy_name, ProfileType::Power, initial_cost_one_kwh)
        }
    }

    /// A `points` profile definition
    pub fn points(
        name: &str,
        energy_name: &str,
        initial_cost_one_kwh: ParameterValue,
        points: Vec<PricePointDefinition>,
    ) -> Self {
        Self {
            points: Some(points),
            ..Self::with_type(name, energy_name, ProfileType::Points, initial_cost_one_kwh)
        }
    }

    /// Set the price of surplus energy sold back
    pub fn with_injected_price(mut self, injected_price_per_kwh: ParameterValue) -> Self {
        self.injected_price_per_kwh = Some(injected_price_per_kwh);
        self
    }

    /// Create the profile, declaring its parameters in `store`.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the profile's parameters are declared
    /// * `duration_years` - The number of years over which costs will be computed
    pub fn build(self, store: &mut ParameterStore, duration_years: u32) -> Result<PriceProfile> {
        let profile_type = ProfileType::parse(&self.profile_type)?;
        let name = self.name.as_str();
        let config_err = |msg: String| CostModelError::InvalidConfiguration(msg);

        for key in self.extra.keys() {
            ensure!(
                !RESERVED_KEYS.contains(&key.as_str()),
                config_err(format!("Price profile {name}: {key} cannot be a parameter"))
            );
        }

        ensure!(
            profile_type == ProfileType::Points || self.points.is_none(),
            config_err(format!(
                "Price profile {name} is not a points profile, so cannot have points"
            ))
        );

        let initial_cost_one_kwh =
            store.declare(name, "initial_cost_one_kwh", self.initial_cost_one_kwh)?;
        let curve = match profile_type {
            ProfileType::Linear => {
                let slope = self.slope.ok_or_else(|| {
                    config_err(format!("Linear price profile {name} requires a slope"))
                })?;
                PriceCurve::Linear {
                    slope: store.declare(name, "slope", slope)?,
                }
            }
            ProfileType::Power => {
                let percentage = self.percentage_of_increase_per_year.ok_or_else(|| {
                    config_err(format!(
                        "Power price profile {name} requires a percentage_of_increase_per_year"
                    ))
                })?;
                PriceCurve::Power {
                    percentage_of_increase_per_year: store.declare(
                        name,
                        "percentage_of_increase_per_year",
                        percentage,
                    )?,
                }
            }
            ProfileType::Points => {
                let points = self.points.as_deref().unwrap_or_default();
                ensure!(
                    !points.is_empty(),
                    config_err(format!("Points price profile {name} requires at least one point"))
                );
                ensure!(
                    iter::once(0.0)
                        .chain(points.iter().map(|point| point.year))
                        .tuple_windows()
                        .all(|(prev, next)| prev < next),
                    config_err(format!(
                        "Years of the points of price profile {name} must be positive and in \
                        increasing order"
                    ))
                );

                let points: Vec<PricePoint> = points
                    .iter()
                    .enumerate()
                    .map(|(idx, point)| {
                        let value =
                            store.declare(name, &format!("point{idx}"), point.parameter_value())?;
                        Ok(PricePoint {
                            year: point.year,
                            value,
                        })
                    })
                    .collect::<Result<_>>()?;
                PriceCurve::Points(points)
            }
        };
        let injected_price_per_kwh = store.declare(
            name,
            "injected_price_per_kwh",
            self.injected_price_per_kwh.unwrap_or_default(),
        )?;

        // Curve keys the profile type doesn't use are kept as ordinary parameters
        let unused_curve_keys = [
            ("slope", self.slope, ProfileType::Linear),
            (
                "percentage_of_increase_per_year",
                self.percentage_of_increase_per_year,
                ProfileType::Power,
            ),
        ]
        .into_iter()
        .filter(|(_, _, used_by)| *used_by != profile_type)
        .filter_map(|(key, value, _)| Some((key, value?)));
        let mut extra_parameters = Vec::new();
        for (key, value) in unused_curve_keys {
            warn!("Price profile {name} is of type {profile_type}, so does not use its {key}");
            extra_parameters.push(store.declare(name, key, value)?);
        }
        for (key, value) in &self.extra {
            extra_parameters.push(store.declare(name, key, *value)?);
        }

        let profile = PriceProfile {
            id: self.name.into(),
            energy_name: self.energy_name,
            duration_years,
            initial_cost_one_kwh,
            injected_price_per_kwh,
            curve,
            extra_parameters,
        };
        profile.check_horizon()?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};
    use crate::fixture::{assert_error, electricity_profile, store};
    use rstest::rstest;

    #[rstest]
    fn test_build_points(mut store: ParameterStore) {
        let profile = electricity_profile(&mut store, 5).unwrap();
        assert_eq!(profile.profile_type(), ProfileType::Points);
        assert_eq!(profile.energy_name, "electricity");
        let PriceCurve::Points(points) = &profile.curve else {
            panic!("Expected a points curve");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].year, 5.0);
        assert!(store.get(points[0].value).is_uncertain());
        assert!(!store.get(points[1].value).is_uncertain());
    }

    #[rstest]
    fn test_build_horizon_too_short(mut store: ParameterStore) {
        let err = electricity_profile(&mut store, 6).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Range));
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![PricePointDefinition::new(0.0, 0.2)])]
    #[case(vec![PricePointDefinition::new(5.0, 0.2), PricePointDefinition::new(3.0, 0.3)])]
    #[case(vec![PricePointDefinition::new(2.0, 0.2), PricePointDefinition::new(2.0, 0.3)])]
    fn test_build_points_invalid(
        mut store: ParameterStore,
        #[case] points: Vec<PricePointDefinition>,
    ) {
        let result = PriceProfileDefinition::points("grid", "electricity", 0.2.into(), points)
            .build(&mut store, 1);
        assert_eq!(
            error_kind(&result.unwrap_err()),
            Some(ErrorKind::Configuration)
        );
    }

    #[rstest]
    fn test_build_missing_slope(mut store: ParameterStore) {
        let mut definition = PriceProfileDefinition::linear("gas", "gas", 0.1.into(), 0.0.into());
        definition.slope = None;
        assert_error!(
            definition.build(&mut store, 1),
            "Linear price profile gas requires a slope"
        );
    }

    #[rstest]
    fn test_build_missing_percentage(mut store: ParameterStore) {
        let mut definition = PriceProfileDefinition::power("gas", "gas", 0.1.into(), 5.0.into());
        definition.percentage_of_increase_per_year = None;
        assert_error!(
            definition.build(&mut store, 1),
            "Power price profile gas requires a percentage_of_increase_per_year"
        );
    }

    #[rstest]
    fn test_build_unknown_profile_type(mut store: ParameterStore) {
        let mut definition = PriceProfileDefinition::linear("gas", "gas", 0.1.into(), 0.0.into());
        definition.profile_type = "curve".into();
        let err = definition.build(&mut store, 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CostModelError>(),
            Some(&CostModelError::UnknownProfileType("curve".into()))
        );
        assert!(store.is_empty());
    }

    #[rstest]
    fn test_build_reserved_extra_key(mut store: ParameterStore) {
        let mut definition = PriceProfileDefinition::linear("gas", "gas", 0.1.into(), 0.0.into());
        definition.extra.insert("points".into(), 1.0.into());
        assert_error!(
            definition.build(&mut store, 1),
            "Price profile gas: points cannot be a parameter"
        );
    }

    #[rstest]
    fn test_parameters(mut store: ParameterStore) {
        let mut definition = PriceProfileDefinition::points(
            "electricity",
            "electricity",
            0.2.into(),
            vec![PricePointDefinition::new(10.0, 0.3)],
        );
        definition.extra.insert("tax".into(), 0.05.into());
        let profile = definition.build(&mut store, 10).unwrap();

        let names = profile
            .parameters()
            .map(|id| store.get(id).name().to_string())
            .collect_vec();
        assert_eq!(
            names,
            [
                "electricity.initial_cost_one_kwh",
                "electricity.point0",
                "electricity.injected_price_per_kwh",
                "electricity.tax"
            ]
        );
        assert_eq!(store.value(profile.injected_price_per_kwh), 0.0);
    }

    #[rstest]
    fn test_build_unused_curve_keys_become_parameters(mut store: ParameterStore) {
        let mut definition =
            PriceProfileDefinition::linear("grid", "electricity", 0.2.into(), 0.01.into());
        definition.percentage_of_increase_per_year = Some(ParameterValue::ranged(10.0, 5.0, 15.0));
        let profile = definition.build(&mut store, 15).unwrap();

        let names = profile
            .parameters()
            .map(|id| store.get(id).name().to_string())
            .collect_vec();
        assert_eq!(
            names,
            [
                "grid.initial_cost_one_kwh",
                "grid.slope",
                "grid.injected_price_per_kwh",
                "grid.percentage_of_increase_per_year"
            ]
        );
        let id = store.id_of("grid.percentage_of_increase_per_year").unwrap();
        assert!(store.get(id).is_uncertain());

        let mut definition = PriceProfileDefinition::power("gas", "gas", 0.1.into(), 10.0.into());
        definition.slope = Some(0.01.into());
        let profile = definition.build(&mut store, 15).unwrap();
        assert_eq!(profile.extra_parameters, [store.id_of("gas.slope").unwrap()]);
    }

    #[rstest]
    fn test_build_points_on_other_types(mut store: ParameterStore) {
        let mut definition =
            PriceProfileDefinition::linear("grid", "electricity", 0.2.into(), 0.01.into());
        definition.points = Some(vec![PricePointDefinition::new(15.0, 0.3)]);
        let result = definition.build(&mut store, 15);
        assert_error!(
            result,
            "Price profile grid is not a points profile, so cannot have points"
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_deserialise_unused_curve_keys() {
        let definition: PriceProfileDefinition = toml::from_str(
            r#"
            name = "grid"
            energy_name = "electricity"
            profile_type = "linear"
            initial_cost_one_kwh = 0.2
            slope = 0.01
            percentage_of_increase_per_year = { value = 10.0, min = 5.0, max = 15.0 }
            "#,
        )
        .unwrap();
        let mut store = ParameterStore::new();
        definition.build(&mut store, 15).unwrap();
        assert_eq!(store.len(), 4);
        assert!(store.id_of("grid.percentage_of_increase_per_year").is_ok());
    }

    #[test]
    fn test_deserialise() {
        let definition: PriceProfileDefinition = toml::from_str(
            r#"
            name = "grid"
            energy_name = "electricity"
            profile_type = "user_points"
            initial_cost_one_kwh = 0.2062
            injected_price_per_kwh = 0.1
            points = [
                { year = 1.0, value = 0.21, min = 0.2, max = 0.22 },
                { year = 20.0, value = 0.3 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(definition.profile_type, "user_points");
        assert!(definition.extra.is_empty());
        assert_eq!(
            definition.points.unwrap(),
            [
                PricePointDefinition::ranged(1.0, 0.21, 0.2, 0.22),
                PricePointDefinition::new(20.0, 0.3)
            ]
        );
        assert_eq!(
            definition.injected_price_per_kwh,
            Some(ParameterValue::Fixed(0.1))
        );
    }
}
