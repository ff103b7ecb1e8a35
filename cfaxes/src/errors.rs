use std::result;

use thiserror::Error;

use crate::{
    axis::{Axis, AxisKind},
    units::Dimensionality,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' is not defined in the unit registry")]
    UndefinedUnit(String),

    #[error("cannot convert from '{from}' ({from_dims}) to '{to}' ({to_dims})")]
    Dimensionality {
        from: String,
        from_dims: Dimensionality,
        to: String,
        to_dims: Dimensionality,
    },

    #[error("offset unit '{0}' cannot be combined with other units")]
    OffsetUnit(String),

    /// The variable has no coordinate playing this axis role. Not a lookup failure: the
    /// variable simply lacks that axis.
    #[error("{0} attribute is not available.")]
    AxisUnavailable(AxisKind),

    #[error("'{0}' is not an interpretable axis.")]
    InvalidAxis(String),

    #[error("no coordinate named '{0}'")]
    NoSuchCoordinate(String),

    #[error("no variable named '{0}'")]
    NoSuchVariable(String),

    #[error("label {label} not found in coordinate '{coordinate}'")]
    LabelNotFound { coordinate: String, label: f64 },

    #[error("'{0}' is not a one dimensional dimension coordinate")]
    NotADimensionCoordinate(String),

    #[error("too many indexers: {given} given for {dims} dimensions")]
    TooManyIndexers { given: usize, dims: usize },

    #[error("slice step {0} is not a positive integer")]
    InvalidStep(f64),

    #[error("Input variables must be on same coordinates.")]
    MismatchedCoordinates,

    #[error("crs attribute is not available.")]
    CrsUnavailable,

    #[error("no criteria given for the {0} axis")]
    MissingCriteria(Axis),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = result::Result<T, Error>;
