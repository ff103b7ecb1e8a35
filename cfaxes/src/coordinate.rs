use std::collections::HashMap;

use ndarray::{Array1, ArrayD, Ix1, IxDyn};

use crate::{
    errors::{Error, Result},
    units::{Unit, UnitArray},
};

/// String keyed metadata attached to a coordinate or variable.
pub type Attributes = HashMap<String, String>;

/// A named, labeled array describing one dimension, or an ancillary position, of a variable.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinate {
    /// Name of the coordinate, e.g. "isobaric"
    pub name: String,

    /// Names of the dimensions this coordinate spans, one per axis of `values`
    pub dims: Vec<String>,

    /// The labels
    pub values: ArrayD<f64>,

    /// Metadata, e.g. "standard_name" or "units"
    pub attrs: Attributes,
}

impl Coordinate {
    pub fn new<S: Into<String>>(name: S, dims: Vec<String>, values: ArrayD<f64>) -> Result<Self> {
        let name = name.into();
        if dims.len() != values.ndim() {
            return Err(Error::Shape(ndarray::ShapeError::from_kind(
                ndarray::ErrorKind::IncompatibleShape,
            )));
        }

        Ok(Self {
            name,
            dims,
            values,
            attrs: Attributes::new(),
        })
    }

    /// A dimension coordinate: one dimensional, indexing the dimension it is named after.
    ///
    pub fn dimension<S: Into<String>>(name: S, values: Array1<f64>) -> Self {
        let name = name.into();
        Self {
            dims: vec![name.clone()],
            name,
            values: values.into_dyn(),
            attrs: Attributes::new(),
        }
    }

    /// A dimension coordinate with evenly spaced labels.
    ///
    pub fn range<S: Into<String>>(name: S, start: f64, step: f64, steps: usize) -> Self {
        let values = Array1::from_iter((0..steps).map(|i| start + (i as f64) * step));
        Self::dimension(name, values)
    }

    /// A zero dimensional coordinate holding a single label.
    ///
    pub fn scalar<S: Into<String>>(name: S, value: f64) -> Self {
        Self {
            name: name.into(),
            dims: vec![],
            values: ArrayD::from_elem(IxDyn(&[]), value),
            attrs: Attributes::new(),
        }
    }

    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// The declared unit string, "dimensionless" if the coordinate has no "units" attribute.
    ///
    pub fn units_str(&self) -> &str {
        self.attr("units").unwrap_or("dimensionless")
    }

    /// The declared unit. A literal "%" is read as percent.
    ///
    pub fn units(&self) -> Result<Unit> {
        parse_declared(self.units_str())
    }

    pub fn unit_array(&self) -> Result<UnitArray> {
        Ok(UnitArray::new(self.values.clone(), self.units()?))
    }

    /// Replace the labels and the "units" attribute.
    ///
    pub fn set_unit_array(&mut self, array: UnitArray) {
        self.values = array.values;
        self.attrs
            .insert(String::from("units"), array.unit.name().to_string());
    }

    /// Convert the labels to different units in place.
    ///
    pub fn convert_units(&mut self, unit: &str) -> Result<()> {
        let converted = self.unit_array()?.to(&Unit::parse(unit)?)?;
        self.set_unit_array(converted);

        Ok(())
    }

    /// Differences between consecutive labels of a one dimensional time coordinate, in
    /// seconds.
    ///
    /// Labels are offsets from a reference time, as in CF units like
    /// "hours since 1987-04-04 18:00:00". Only the unit before "since" matters here.
    ///
    pub fn time_deltas(&self) -> Result<UnitArray> {
        let labels = self.values.view().into_dimensionality::<Ix1>()?;
        let units = self.units_str();
        let step = units.split_once(" since ").map_or(units, |(step, _)| step);

        let deltas: Array1<f64> = (1..labels.len())
            .map(|i| labels[i] - labels[i - 1])
            .collect();

        UnitArray::new(deltas.into_dyn(), parse_declared(step)?).to(&Unit::parse("seconds")?)
    }

    /// Whether this coordinate is named after the only dimension it spans.
    pub fn is_dimension(&self) -> bool {
        self.dims.len() == 1 && self.dims[0] == self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn parse_declared(units: &str) -> Result<Unit> {
    if units == "%" {
        Unit::parse("percent")
    } else {
        Unit::parse(units)
    }
}
