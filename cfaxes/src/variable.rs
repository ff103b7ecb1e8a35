use ndarray::{ArrayD, Axis as ArrayAxis, Dimension, ErrorKind, Ix1, IxDyn, ShapeError};
use paste::paste;

use crate::{
    axis::AxisKind,
    cache::AxisCache,
    coordinate::{parse_declared, Attributes, Coordinate},
    criteria::Metadata,
    dataset::Crs,
    errors::{Error, Result},
    helpers::{label_index, slice_indices},
    indexer::{self, Indexer, NativeIndexer, NativeSelection, Selection},
    units::{Unit, UnitArray},
};

/// A labeled data array: values, the dimensions they span, and the coordinates labeling them.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    /// Name of the variable, e.g. "Temperature"
    pub name: String,

    /// Names of the dimensions spanned by `values`, in axis order
    pub dims: Vec<String>,

    /// The data
    pub values: ArrayD<f64>,

    /// Coordinates, in a stable order. Resolution scans them in this order.
    pub coords: Vec<Coordinate>,

    pub attrs: Attributes,

    /// Coordinate reference system, if known
    pub crs: Option<Crs>,
}

/// An axis given by position or by name.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AxisRef<'a> {
    Number(usize),
    Name(&'a str),
}

impl<'a> From<usize> for AxisRef<'a> {
    fn from(number: usize) -> Self {
        AxisRef::Number(number)
    }
}

impl<'a> From<&'a str> for AxisRef<'a> {
    fn from(name: &'a str) -> Self {
        AxisRef::Name(name)
    }
}

macro_rules! axis_accessor {
    ($kind:ident) => {
        paste! {
            #[doc = "Return the " $kind " coordinate."]
            pub fn [<$kind:lower>](&self, cache: &mut AxisCache) -> Result<&Coordinate> {
                self.axis(cache, AxisKind::$kind)
            }
        }
    };
}

impl Variable {
    pub fn new<S: Into<String>>(name: S, dims: Vec<String>, values: ArrayD<f64>) -> Result<Self> {
        if dims.len() != values.ndim() {
            return Err(Error::Shape(ShapeError::from_kind(ErrorKind::IncompatibleShape)));
        }

        Ok(Self {
            name: name.into(),
            dims,
            values,
            coords: vec![],
            attrs: Attributes::new(),
            crs: None,
        })
    }

    /// Add a coordinate, replacing any existing coordinate with the same name in place.
    ///
    pub fn with_coord(mut self, coord: Coordinate) -> Self {
        match self.coords.iter_mut().find(|existing| existing.name == coord.name) {
            Some(existing) => *existing = coord,
            None => self.coords.push(coord),
        }
        self
    }

    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|coord| coord.name == name)
    }

    pub fn coord_mut(&mut self, name: &str) -> Option<&mut Coordinate> {
        self.coords.iter_mut().find(|coord| coord.name == name)
    }

    pub fn has_dim(&self, name: &str) -> bool {
        self.dims.iter().any(|dim| dim == name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn crs(&self) -> Result<&Crs> {
        self.crs.as_ref().ok_or(Error::CrsUnavailable)
    }

    /// The declared unit, from the "units" attribute. A literal "%" is read as percent.
    ///
    pub fn units(&self) -> Result<Unit> {
        parse_declared(Metadata::units_str(self))
    }

    pub fn unit_array(&self) -> Result<UnitArray> {
        Ok(UnitArray::new(self.values.clone(), self.units()?))
    }

    pub fn set_unit_array(&mut self, array: UnitArray) {
        self.values = array.values;
        self.attrs
            .insert(String::from("units"), array.unit.name().to_string());
    }

    /// Convert the data to different units in place.
    ///
    pub fn convert_units(&mut self, unit: &str) -> Result<()> {
        let converted = self.unit_array()?.to(&Unit::parse(unit)?)?;
        self.set_unit_array(converted);

        Ok(())
    }

    /// Return the coordinate playing the `kind` role.
    ///
    /// Fails with `Error::AxisUnavailable` if there isn't one, or if there are several that
    /// can't be told apart.
    ///
    pub fn axis<'v>(&'v self, cache: &mut AxisCache, kind: AxisKind) -> Result<&'v Coordinate> {
        cache.lookup(self, kind).ok_or(Error::AxisUnavailable(kind))
    }

    /// Same as `axis`, with the axis given by readable name ("time", "vertical", "y", "x").
    ///
    pub fn axis_by_name(&self, cache: &mut AxisCache, name: &str) -> Result<&Coordinate> {
        self.axis(cache, name.parse()?)
    }

    axis_accessor!(Time);
    axis_accessor!(Vertical);
    axis_accessor!(Y);
    axis_accessor!(X);

    /// Return the coordinates playing each of the given roles, in order.
    ///
    pub fn coordinates(&self, cache: &mut AxisCache, kinds: &[AxisKind]) -> Result<Vec<&Coordinate>> {
        kinds.iter().map(|kind| self.axis(cache, *kind)).collect()
    }

    /// Return the name of the dimension or coordinate an axis identifier refers to.
    ///
    /// # Arguments
    ///
    /// * `axis` - A dimension number, a dimension coordinate name, or a readable axis name.
    ///
    pub fn find_axis_name<'a, A>(&self, cache: &mut AxisCache, axis: A) -> Result<String>
    where
        A: Into<AxisRef<'a>>,
    {
        match axis.into() {
            AxisRef::Number(number) => self
                .dims
                .get(number)
                .cloned()
                .ok_or_else(|| Error::InvalidAxis(number.to_string())),
            AxisRef::Name(name) => {
                if !self.has_dim(name) {
                    if let Some(kind) = AxisKind::from_readable(name) {
                        return Ok(self.axis(cache, kind)?.name.clone());
                    }
                } else if self.coord(name).is_some() {
                    return Ok(name.to_string());
                }

                Err(Error::InvalidAxis(name.to_string()))
            }
        }
    }

    /// Whether `other` has exactly the same coordinates, in any order.
    ///
    pub fn coordinates_identical(&self, other: &Variable) -> bool {
        self.coords.len() == other.coords.len()
            && self
                .coords
                .iter()
                .all(|coord| other.coord(&coord.name) == Some(coord))
    }

    /// Select by label, with unit aware labels and readable axis names.
    ///
    pub fn sel(&self, cache: &mut AxisCache, selection: &Selection) -> Result<Variable> {
        let native = indexer::translate(cache, self, selection)?;
        self.sel_native(&native)
    }

    /// Same as `sel`, with indexers given positionally, one per dimension.
    ///
    pub fn loc(&self, cache: &mut AxisCache, indexers: Vec<Indexer>) -> Result<Variable> {
        self.sel(cache, &Selection::positional(&self.dims, indexers)?)
    }

    /// Select by plain label.
    ///
    /// Each key must name a one dimensional dimension coordinate. A scalar selects the label
    /// exactly and drops the dimension, leaving the coordinate behind as a scalar coordinate.
    /// A slice keeps the labels within its bounds, inclusive. The data and every coordinate
    /// spanning the dimension are selected together.
    ///
    pub fn sel_native(&self, selection: &NativeSelection) -> Result<Variable> {
        let mut selected = self.clone();
        for (name, indexer) in selection.iter() {
            if let Some((indices, drop)) = selected.label_positions(name, *indexer)? {
                selected.take(name, &indices, drop);
            }
        }

        Ok(selected)
    }

    /// Assign to the data at the given labels, with unit aware labels and readable axis
    /// names.
    ///
    /// `values` is broadcast to the shape `sel` would return for the same selection.
    ///
    pub fn set_sel(
        &mut self,
        cache: &mut AxisCache,
        selection: &Selection,
        values: &ArrayD<f64>,
    ) -> Result<()> {
        let native = indexer::translate(cache, self, selection)?;
        self.set_native(&native, values)
    }

    /// Same as `set_sel`, with indexers given positionally, one per dimension.
    ///
    pub fn set_loc(
        &mut self,
        cache: &mut AxisCache,
        indexers: Vec<Indexer>,
        values: &ArrayD<f64>,
    ) -> Result<()> {
        let selection = Selection::positional(&self.dims, indexers)?;
        self.set_sel(cache, &selection, values)
    }

    /// Assign to the data at plain labels. Keys follow the rules of `sel_native` and must
    /// also be dimensions of the data. Coordinates are left alone.
    ///
    pub fn set_native(&mut self, selection: &NativeSelection, values: &ArrayD<f64>) -> Result<()> {
        let mut picks: Vec<Vec<usize>> = (0..self.values.ndim())
            .map(|axis| (0..self.values.len_of(ArrayAxis(axis))).collect())
            .collect();
        let mut dropped = vec![false; picks.len()];

        for (name, indexer) in selection.iter() {
            let positions = self.label_positions(name, *indexer)?;
            let axis = self
                .dims
                .iter()
                .position(|dim| dim == name)
                .ok_or_else(|| Error::NotADimensionCoordinate(name.to_string()))?;
            if let Some((indices, drop)) = positions {
                picks[axis] = indices;
                dropped[axis] = drop;
            }
        }

        let shape: Vec<usize> = picks
            .iter()
            .zip(&dropped)
            .filter(|(_, drop)| !**drop)
            .map(|(pick, _)| pick.len())
            .collect();
        let source = values.broadcast(IxDyn(&shape)).ok_or_else(|| {
            Error::Shape(ShapeError::from_kind(ErrorKind::IncompatibleShape))
        })?;

        let counts: Vec<usize> = picks.iter().map(Vec::len).collect();
        for index in ndarray::indices(IxDyn(&counts)) {
            let target: Vec<usize> = index
                .slice()
                .iter()
                .zip(&picks)
                .map(|(i, pick)| pick[*i])
                .collect();
            let from: Vec<usize> = index
                .slice()
                .iter()
                .zip(&dropped)
                .filter(|(_, drop)| !**drop)
                .map(|(i, _)| *i)
                .collect();
            self.values[&target[..]] = source[&from[..]];
        }

        Ok(())
    }

    /// Positions along dimension `name` picked by `indexer`, and whether the dimension is
    /// dropped. `None` when the indexer picks everything.
    ///
    fn label_positions(
        &self,
        name: &str,
        indexer: NativeIndexer,
    ) -> Result<Option<(Vec<usize>, bool)>> {
        let coord = self
            .coord(name)
            .filter(|coord| coord.is_dimension())
            .ok_or_else(|| Error::NotADimensionCoordinate(name.to_string()))?;
        let labels = coord.values.view().into_dimensionality::<Ix1>()?;

        let positions = match indexer {
            NativeIndexer::Scalar(None) => None,
            NativeIndexer::Scalar(Some(label)) => {
                let index = label_index(labels, label).ok_or_else(|| Error::LabelNotFound {
                    coordinate: name.to_string(),
                    label,
                })?;
                Some((vec![index], true))
            }
            NativeIndexer::Slice(slice) => Some((
                slice_indices(labels, slice.start, slice.stop, slice.step)?,
                false,
            )),
        };

        Ok(positions)
    }

    fn take(&mut self, dim: &str, indices: &[usize], drop: bool) {
        if let Some(axis) = self.dims.iter().position(|d| d == dim) {
            self.values = take_along(&self.values, axis, indices, drop);
            if drop {
                self.dims.remove(axis);
            }
        }

        for coord in self.coords.iter_mut() {
            if let Some(axis) = coord.dims.iter().position(|d| d == dim) {
                coord.values = take_along(&coord.values, axis, indices, drop);
                if drop {
                    coord.dims.remove(axis);
                }
            }
        }
    }
}

impl Metadata for Variable {
    fn name(&self) -> &str {
        &self.name
    }

    fn attr(&self, key: &str) -> Option<&str> {
        Variable::attr(self, key)
    }
}

fn take_along(values: &ArrayD<f64>, axis: usize, indices: &[usize], drop: bool) -> ArrayD<f64> {
    if drop {
        values.index_axis(ArrayAxis(axis), indices[0]).to_owned()
    } else {
        values.select(ArrayAxis(axis), indices)
    }
}

/// Make sure all the given variables share the same coordinates.
///
pub fn check_matching_coordinates(variables: &[&Variable]) -> Result<()> {
    if let Some((first, rest)) = variables.split_first() {
        if !rest.iter().all(|other| first.coordinates_identical(other)) {
            return Err(Error::MismatchedCoordinates);
        }
    }

    Ok(())
}
