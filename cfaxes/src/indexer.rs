//! Unit aware selection.
//!
//! A `Selection` maps coordinate names, dimension names or readable axis names ("vertical")
//! to labels that may carry units. `translate` rewrites it into a `NativeSelection`, keyed by
//! coordinate name with plain labels in each coordinate's own units, ready for label based
//! selection.
//!
use crate::{
    axis::AxisKind,
    cache::AxisCache,
    coordinate::Coordinate,
    errors::{Error, Result},
    units::Quantity,
    variable::Variable,
};

/// A label, with or without units. Labels without units are taken to already be in the
/// coordinate's units.
///
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Plain(f64),
    Quantity(Quantity),
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Plain(value)
    }
}

impl From<Quantity> for Value {
    fn from(quantity: Quantity) -> Self {
        Value::Quantity(quantity)
    }
}

impl Value {
    fn to_native(&self, coord: Option<&Coordinate>, key: &str) -> Result<f64> {
        match self {
            Value::Plain(value) => Ok(*value),
            Value::Quantity(quantity) => {
                let coord = coord.ok_or_else(|| Error::NoSuchCoordinate(key.to_string()))?;
                Ok(quantity.to(&coord.units()?)?.magnitude)
            }
        }
    }
}

/// A label range. Any part may be missing.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slice {
    pub start: Option<Value>,
    pub stop: Option<Value>,
    pub step: Option<Value>,
}

impl Slice {
    pub fn new<A: Into<Value>, B: Into<Value>>(start: A, stop: B) -> Self {
        Self {
            start: Some(start.into()),
            stop: Some(stop.into()),
            step: None,
        }
    }

    pub fn start<V: Into<Value>>(mut self, start: V) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn stop<V: Into<Value>>(mut self, stop: V) -> Self {
        self.stop = Some(stop.into());
        self
    }

    pub fn step<V: Into<Value>>(mut self, step: V) -> Self {
        self.step = Some(step.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Indexer {
    Scalar(Option<Value>),
    Slice(Slice),
}

impl From<f64> for Indexer {
    fn from(value: f64) -> Self {
        Indexer::Scalar(Some(value.into()))
    }
}

impl From<Quantity> for Indexer {
    fn from(quantity: Quantity) -> Self {
        Indexer::Scalar(Some(quantity.into()))
    }
}

impl From<Value> for Indexer {
    fn from(value: Value) -> Self {
        Indexer::Scalar(Some(value))
    }
}

impl From<Slice> for Indexer {
    fn from(slice: Slice) -> Self {
        Indexer::Slice(slice)
    }
}

/// Labels to select, keyed by coordinate, dimension or readable axis name.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    keys: Vec<(String, Indexer)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the indexer for `key`.
    ///
    pub fn with<K: Into<String>, I: Into<Indexer>>(mut self, key: K, indexer: I) -> Self {
        self.insert(key, indexer);
        self
    }

    pub fn insert<K: Into<String>, I: Into<Indexer>>(&mut self, key: K, indexer: I) {
        let key = key.into();
        let indexer = indexer.into();
        match self.keys.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = indexer,
            None => self.keys.push((key, indexer)),
        }
    }

    /// Key positional indexers by dimension name. Missing trailing indexers select
    /// everything. More indexers than dimensions is an error.
    ///
    pub fn positional(dims: &[String], indexers: Vec<Indexer>) -> Result<Self> {
        if indexers.len() > dims.len() {
            return Err(Error::TooManyIndexers {
                given: indexers.len(),
                dims: dims.len(),
            });
        }

        let mut selection = Self::new();
        for (dim, indexer) in dims.iter().zip(indexers) {
            selection.insert(dim.as_str(), indexer);
        }

        Ok(selection)
    }

    pub fn get(&self, key: &str) -> Option<&Indexer> {
        self.keys
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, indexer)| indexer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Indexer)> {
        self.keys.iter().map(|(key, indexer)| (key.as_str(), indexer))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NativeSlice {
    pub start: Option<f64>,
    pub stop: Option<f64>,
    pub step: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NativeIndexer {
    Scalar(Option<f64>),
    Slice(NativeSlice),
}

/// Plain labels keyed by coordinate or dimension name.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeSelection {
    keys: Vec<(String, NativeIndexer)>,
}

impl NativeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>>(mut self, key: K, indexer: NativeIndexer) -> Self {
        self.insert(key, indexer);
        self
    }

    /// Add or replace the indexer for `key`.
    ///
    pub fn insert<K: Into<String>>(&mut self, key: K, indexer: NativeIndexer) {
        let key = key.into();
        match self.keys.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = indexer,
            None => self.keys.push((key, indexer)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&NativeIndexer> {
        self.keys
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, indexer)| indexer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeIndexer)> {
        self.keys.iter().map(|(key, indexer)| (key.as_str(), indexer))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Rewrite `selection` for `variable` into plain labels in each coordinate's own units.
///
/// A readable axis name ("vertical", "x") that isn't itself a coordinate or dimension name is
/// replaced by the name of the coordinate playing that role, as found through `cache`. Fails
/// with `Error::AxisUnavailable` if there is no such coordinate, and with
/// `Error::InvalidAxis` for names that are neither. If two keys end up naming the same
/// coordinate, the later one wins.
///
pub fn translate(
    cache: &mut AxisCache,
    variable: &Variable,
    selection: &Selection,
) -> Result<NativeSelection> {
    let mut native = NativeSelection::new();
    for (key, indexer) in selection.iter() {
        let name = if variable.coord(key).is_some() || variable.has_dim(key) {
            key
        } else {
            match AxisKind::from_readable(key) {
                Some(kind) => variable.axis(cache, kind)?.name.as_str(),
                None => return Err(Error::InvalidAxis(key.to_string())),
            }
        };

        native.insert(name, to_native(indexer, variable.coord(name), name)?);
    }

    Ok(native)
}

/// Convert a single indexer to the units of `coord`.
///
pub(crate) fn to_native(
    indexer: &Indexer,
    coord: Option<&Coordinate>,
    key: &str,
) -> Result<NativeIndexer> {
    let convert = |value: &Option<Value>| -> Result<Option<f64>> {
        value
            .as_ref()
            .map(|value| value.to_native(coord, key))
            .transpose()
    };

    let native = match indexer {
        Indexer::Scalar(value) => NativeIndexer::Scalar(convert(value)?),
        Indexer::Slice(slice) => NativeIndexer::Slice(NativeSlice {
            start: convert(&slice.start)?,
            stop: convert(&slice.stop)?,
            step: convert(&slice.step)?,
        }),
    };

    Ok(native)
}
