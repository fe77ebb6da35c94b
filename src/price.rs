//! Projections of the future price of energy.
use crate::error::CostModelError;
use crate::id::{define_id_getter, define_id_type};
use crate::parameter::{ParameterID, ParameterStore};
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::iter;
use std::str::FromStr;

define_id_type! {ProfileID}

/// The family of curves a price profile follows
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum ProfileType {
    /// Price increases by a fixed amount every year
    #[strum(serialize = "linear")]
    Linear,
    /// Price increases by a fixed percentage every year
    #[strum(serialize = "power")]
    Power,
    /// Price is interpolated between user-supplied points
    #[strum(to_string = "points", serialize = "user_points")]
    Points,
}

impl ProfileType {
    /// Parse a profile type from its name in an input file
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name)
            .map_err(|_| CostModelError::UnknownProfileType(name.to_string()).into())
    }
}

/// A user-supplied point on a price curve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricePoint {
    /// Number of years ahead of the present. This is never sampled.
    pub year: f64,
    /// Price of one kWh at `year`
    pub value: ParameterID,
}

/// The shape of a price curve, with handles to the parameters it depends on
#[derive(Clone, Debug, PartialEq)]
pub enum PriceCurve {
    /// `initial + slope * year`
    Linear {
        /// Increase in price of one kWh per year
        slope: ParameterID,
    },
    /// `initial * (1 + percentage / 100) ^ year`
    Power {
        /// Percentage increase in price every year
        percentage_of_increase_per_year: ParameterID,
    },
    /// Piecewise linear between `(0, initial)` and the points, in order
    Points(Vec<PricePoint>),
}

/// Estimates the cost of one kind of energy in the future
#[derive(Clone, Debug, PartialEq)]
pub struct PriceProfile {
    /// Unique name of the profile
    pub id: ProfileID,
    /// The kind of energy being priced (e.g. "electricity")
    pub energy_name: String,
    /// The number of years the profile was built to cover
    pub duration_years: u32,
    /// Current price of one kWh
    pub initial_cost_one_kwh: ParameterID,
    /// Price paid for one kWh of surplus energy sold back
    pub injected_price_per_kwh: ParameterID,
    /// The shape of the curve
    pub curve: PriceCurve,
    /// Parameters declared in the input which the curve does not use
    pub extra_parameters: Vec<ParameterID>,
}
define_id_getter! {PriceProfile, ProfileID}

impl PriceProfile {
    /// The type of profile
    pub fn profile_type(&self) -> ProfileType {
        match self.curve {
            PriceCurve::Linear { .. } => ProfileType::Linear,
            PriceCurve::Power { .. } => ProfileType::Power,
            PriceCurve::Points(_) => ProfileType::Points,
        }
    }

    /// Every parameter owned by this profile
    pub fn parameters(&self) -> impl Iterator<Item = ParameterID> + '_ {
        let curve_parameters = match &self.curve {
            PriceCurve::Linear { slope } => vec![*slope],
            PriceCurve::Power {
                percentage_of_increase_per_year,
            } => vec![*percentage_of_increase_per_year],
            PriceCurve::Points(points) => points.iter().map(|point| point.value).collect(),
        };

        iter::once(self.initial_cost_one_kwh)
            .chain(curve_parameters)
            .chain(iter::once(self.injected_price_per_kwh))
            .chain(self.extra_parameters.iter().copied())
    }

    /// The price of one kWh `year` years ahead of the present
    pub fn price_per_unit(&self, store: &ParameterStore, year: f64) -> Result<MoneyPerEnergy> {
        let initial = store.value(self.initial_cost_one_kwh);
        let price = match &self.curve {
            PriceCurve::Linear { slope } => initial + store.value(*slope) * year,
            PriceCurve::Power {
                percentage_of_increase_per_year,
            } => {
                let rate = 1.0 + 0.01 * store.value(*percentage_of_increase_per_year);
                initial * rate.powf(year)
            }
            PriceCurve::Points(points) => self.interpolate(store, initial, points, year)?,
        };

        Ok(MoneyPerEnergy(price))
    }

    /// Linearly interpolate along the user-supplied points. Extrapolating past the last point is an
    /// error.
    fn interpolate(
        &self,
        store: &ParameterStore,
        initial: f64,
        points: &[PricePoint],
        year: f64,
    ) -> Result<f64> {
        let last_year = points.last().map_or(0.0, |point| point.year);
        ensure!(
            year <= last_year,
            CostModelError::BeyondHorizon {
                profile: self.id.to_string(),
                year,
                last_year,
            }
        );

        let knots = iter::once((0.0, initial))
            .chain(points.iter().map(|point| (point.year, store.value(point.value))));
        let price = knots
            .tuple_windows()
            .find(|(_, (end_year, _))| year <= *end_year)
            .map_or(initial, |((x0, y0), (x1, y1))| {
                y0 + (y1 - y0) * (year - x0) / (x1 - x0)
            });

        Ok(price)
    }

    /// The cost of `energy` consumed during year `year_n`.
    ///
    /// The unit price is taken as the mean of the prices at the start and end of the year.
    pub fn cost_for_year(
        &self,
        store: &ParameterStore,
        year_n: u32,
        energy: Energy,
    ) -> Result<Money> {
        let price_january = self.price_per_unit(store, f64::from(year_n))?;
        let price_december = self.price_per_unit(store, f64::from(year_n) + 1.0)?;

        Ok(energy * ((price_january + price_december) * Dimensionless(0.5)))
    }

    /// The revenue from selling `energy` back during year `_year_n`. The buy-back rate is flat.
    pub fn injected_revenue(&self, store: &ParameterStore, _year_n: u32, energy: Energy) -> Money {
        energy * MoneyPerEnergy(store.value(self.injected_price_per_kwh))
    }

    /// The unit price at the start of each year from now until `years` ahead (inclusive)
    pub fn projected_prices(
        &self,
        store: &ParameterStore,
        years: u32,
    ) -> Result<Vec<MoneyPerEnergy>> {
        (0..=years)
            .map(|year| self.price_per_unit(store, f64::from(year)))
            .try_collect()
    }

    /// Check that prices can be computed for every year of the profile's duration
    pub fn check_horizon(&self) -> Result<()> {
        if let PriceCurve::Points(points) = &self.curve {
            let last_year = points.last().map_or(0.0, |point| point.year);
            let required = f64::from(self.duration_years);
            ensure!(
                last_year >= required,
                CostModelError::BeyondHorizon {
                    profile: self.id.to_string(),
                    year: required,
                    last_year,
                }
            );
        }

        Ok(())
    }
}
