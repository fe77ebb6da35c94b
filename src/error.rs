//! Errors raised by the cost model.
//!
//! Library functions return [`anyhow::Result`], but the root cause of any failure in the model
//! itself is a [`CostModelError`], which callers can recover with [`anyhow::Error::downcast_ref`].
use thiserror::Error;

/// The broad family an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model is configured in a way that cannot be evaluated
    Configuration,
    /// A value lies outside its permitted range
    Range,
    /// A parameter name is unknown or missing
    Key,
}

/// An error in the configuration or evaluation of the cost model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostModelError {
    /// Produced energy was given for a component without a production/consumption ratio
    #[error(
        "production_over_consumption_ratio must be defined for component {0} \
        to convert produced energy"
    )]
    UndefinedRatio(String),
    /// The price profile type is not one we know about
    #[error("Unknown profile type: {0}. Should be 'linear', 'power' or 'points'")]
    UnknownProfileType(String),
    /// Any other invalid configuration
    #[error("{0}")]
    InvalidConfiguration(String),
    /// A parameter value lies outside the bounds of the parameter
    #[error("Parameter {name} is out of bounds: value {value} should be in [{min}, {max}]")]
    OutOfBounds {
        /// Qualified name of the parameter
        name: String,
        /// The rejected value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// A price was requested beyond the last year of a points profile
    #[error("Year {year} is beyond the last year ({last_year}) of price profile {profile}")]
    BeyondHorizon {
        /// Name of the price profile
        profile: String,
        /// The requested year
        year: f64,
        /// The last year defined for the profile
        last_year: f64,
    },
    /// A value was supplied for a parameter which doesn't exist
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
    /// No value was supplied for a parameter
    #[error("No value supplied for parameter {0}")]
    MissingParameter(String),
    /// Two parameters were given the same qualified name
    #[error("Parameter {0} is declared more than once")]
    DuplicateParameter(String),
}

impl CostModelError {
    /// The family this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UndefinedRatio(_)
            | Self::UnknownProfileType(_)
            | Self::InvalidConfiguration(_)
            | Self::DuplicateParameter(_) => ErrorKind::Configuration,
            Self::OutOfBounds { .. } | Self::BeyondHorizon { .. } => ErrorKind::Range,
            Self::UnknownParameter(_) | Self::MissingParameter(_) => ErrorKind::Key,
        }
    }
}

/// Get the [`ErrorKind`] of the root cause of an error, if it came from the model
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<CostModelError>()
        .map(CostModelError::kind)
}
