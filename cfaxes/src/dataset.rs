use log::{info, warn};

use crate::{
    axis::{Axis, AxisKind},
    cache::AxisCache,
    coordinate::Attributes,
    criteria::Criteria,
    errors::{Error, Result},
    indexer::{self, NativeSelection, Selection},
    units::{Quantity, Unit},
    variable::Variable,
};

/// A coordinate reference system, as described by the attributes of a CF grid mapping
/// variable.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Crs {
    pub attrs: Attributes,
}

impl Crs {
    pub fn new(attrs: Attributes) -> Self {
        Self { attrs }
    }

    /// Plain latitude/longitude.
    pub fn latitude_longitude() -> Self {
        let mut attrs = Attributes::new();
        attrs.insert("grid_mapping_name".into(), "latitude_longitude".into());
        Self::new(attrs)
    }

    pub fn grid_mapping_name(&self) -> Option<&str> {
        self.attrs.get("grid_mapping_name").map(String::as_str)
    }

    /// A numeric attribute, e.g. "perspective_point_height".
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.attrs.get(key)?.trim().parse().ok()
    }
}

/// A collection of variables sharing dimensions.
///
/// `data_vars` hold data. `variables` hold everything else that can be looked up by name,
/// such as grid mapping variables whose attributes describe a projection.
///
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub data_vars: Vec<Variable>,
    pub variables: Vec<Variable>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_var(mut self, variable: Variable) -> Self {
        self.data_vars.push(variable);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Get a data variable or other variable by name.
    ///
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.data_vars
            .iter()
            .chain(self.variables.iter())
            .find(|variable| variable.name == name)
    }

    /// Extract a data variable, interpreting its CF metadata.
    ///
    /// A "grid_mapping" attribute attaches the named grid mapping variable as the variable's
    /// CRS. Projection x/y coordinates are converted to meters. A variable with latitude and
    /// longitude coordinates but no grid mapping is assumed to be on a latitude_longitude
    /// grid.
    ///
    /// # Arguments
    ///
    /// * `cache` - Axis cache for the dataset's variables.
    /// * `name` - Name of the variable to extract.
    /// * `coordinates` - Explicit axis assignments, overriding automatic resolution for the
    ///   given kinds.
    ///
    pub fn parse_cf(
        &self,
        cache: &mut AxisCache,
        name: &str,
        coordinates: Option<&[(AxisKind, &str)]>,
    ) -> Result<Variable> {
        let mut variable = self
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoSuchVariable(name.to_string()))?;

        if let Some(grid_mapping) = variable.attr("grid_mapping").map(String::from) {
            match self.get(&grid_mapping) {
                Some(projection) => variable.crs = Some(Crs::new(projection.attrs.clone())),
                None => warn!(
                    "Could not find variable corresponding to the value of grid_mapping: {grid_mapping}"
                ),
            }
        }

        fixup_coords(cache.criteria(), &mut variable)?;

        let criteria = cache.criteria();
        if variable.crs.is_none() && !criteria.check(&variable, &[Axis::Lat, Axis::Lon]) {
            let has_lat = variable.coords.iter().any(|c| criteria.matches(c, Axis::Lat));
            let has_lon = variable.coords.iter().any(|c| criteria.matches(c, Axis::Lon));
            if has_lat && has_lon {
                variable.crs = Some(Crs::latitude_longitude());
                info!(
                    "Found lat/lon values, assuming latitude_longitude for projection grid_mapping variable"
                );
            }
        }

        if let Some(coordinates) = coordinates {
            cache.assign(&variable, coordinates.iter().copied())?;
        }

        Ok(variable)
    }

    /// `parse_cf` for every data variable, collected into a new dataset that keeps this
    /// dataset's other variables and attributes.
    ///
    pub fn parse_cf_all(
        &self,
        cache: &mut AxisCache,
        coordinates: Option<&[(AxisKind, &str)]>,
    ) -> Result<Dataset> {
        let data_vars = self
            .data_vars
            .iter()
            .map(|variable| self.parse_cf(cache, &variable.name, coordinates))
            .collect::<Result<Vec<_>>>()?;

        Ok(Dataset {
            data_vars,
            variables: self.variables.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Rewrite a selection keyed by coordinate or dimension name into plain labels, converting
    /// labels with units to the units of the first data variable coordinate of that name.
    ///
    /// Readable axis names aren't interpreted, since different variables may resolve them to
    /// different coordinates.
    ///
    pub fn translate(&self, selection: &Selection) -> Result<NativeSelection> {
        let mut native = NativeSelection::new();
        for (key, indexer) in selection.iter() {
            let coord = self.data_vars.iter().find_map(|variable| variable.coord(key));
            let known = coord.is_some() || self.data_vars.iter().any(|v| v.has_dim(key));
            if !known {
                return Err(Error::NoSuchCoordinate(key.to_string()));
            }

            native.insert(key, indexer::to_native(indexer, coord, key)?);
        }

        Ok(native)
    }

    /// Select by label across all data variables. Each variable is only selected along the
    /// dimensions it has.
    ///
    pub fn sel(&self, selection: &Selection) -> Result<Dataset> {
        let native = self.translate(selection)?;
        let data_vars = self
            .data_vars
            .iter()
            .map(|variable| {
                let mut own = NativeSelection::new();
                for (key, indexer) in native.iter() {
                    if variable.has_dim(key) {
                        own.insert(key, *indexer);
                    }
                }
                variable.sel_native(&own)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Dataset {
            data_vars,
            variables: self.variables.clone(),
            attrs: self.attrs.clone(),
        })
    }
}

/// Put projection x/y coordinates in meters.
///
/// Coordinates that can't be converted directly are taken to be scan angles in radians, as
/// on geostationary grids, and scaled by the CRS's perspective point height if there is one.
///
fn fixup_coords(criteria: &Criteria, variable: &mut Variable) -> Result<()> {
    let meters = Unit::parse("meters")?;
    let height = variable
        .crs
        .as_ref()
        .and_then(|crs| crs.get_f64("perspective_point_height"));

    for coord in variable.coords.iter_mut() {
        if !criteria.check(coord, &[Axis::X, Axis::Y]) || criteria.check(coord, &[Axis::Lon, Axis::Lat])
        {
            continue;
        }

        match coord.convert_units("meters") {
            Ok(()) => {}
            Err(Error::Dimensionality { .. }) => {
                if let Some(height) = height {
                    let scaled = coord
                        .unit_array()?
                        .scale(&Quantity::new(height, meters.clone()))?;
                    coord.set_unit_array(scaled.to(&meters)?);
                }
            }
            Err(Error::UndefinedUnit(units)) => {
                warn!(
                    "Leaving coordinate \"{}\" unconverted, '{units}' is not a known unit",
                    coord.name
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use log::Level;
    use ndarray::{array, Array1, ArrayD, IxDyn};

    use super::*;

    use crate::{coordinate::Coordinate, indexer::Slice, testing};

    #[test]
    fn test_parse_cf_grid_mapping() {
        let dataset = testing::narr_dataset();
        let mut cache = AxisCache::new();
        let variable = dataset.parse_cf(&mut cache, "Temperature", None).unwrap();

        let crs = variable.crs().unwrap();
        assert_eq!(crs.grid_mapping_name(), Some("lambert_conformal_conic"));
        assert_eq!(crs.get_f64("standard_parallel"), Some(25.0));

        let x = variable.coord("x").unwrap();
        assert_eq!(x.attr("units"), Some("meters"));
        assert_eq!(x.values, array![0.0, 10000.0, 20000.0, 30000.0, 40000.0].into_dyn());

        // Lat/lon keep their units
        assert_eq!(variable.coord("lat").unwrap().attr("units"), Some("degrees_north"));
    }

    #[test]
    fn test_parse_cf_missing_grid_mapping() {
        let mut dataset = testing::narr_dataset();
        dataset.variables.clear();
        let mut cache = AxisCache::new();

        // Falls back on lat/lon
        let (variable, records) =
            testing::capture_logs(|| dataset.parse_cf(&mut cache, "Temperature", None));
        let variable = variable.unwrap();
        assert_eq!(variable.crs().unwrap().grid_mapping_name(), Some("latitude_longitude"));

        assert_eq!(
            testing::at_level(&records, Level::Warn),
            vec!["Could not find variable corresponding to the value of grid_mapping: LambertConformal_Projection"]
        );
        assert_eq!(
            testing::at_level(&records, Level::Info),
            vec!["Found lat/lon values, assuming latitude_longitude for projection grid_mapping variable"]
        );
    }

    #[test]
    fn test_parse_cf_no_crs() {
        let dataset = Dataset::new().with_data_var(testing::pressure_profile());
        let mut cache = AxisCache::new();
        let variable = dataset.parse_cf(&mut cache, "air_temperature", None).unwrap();
        assert!(matches!(variable.crs(), Err(Error::CrsUnavailable)));
    }

    #[test]
    fn test_parse_cf_latitude_variable_gets_no_crs() {
        let values = ArrayD::zeros(IxDyn(&[2]));
        let lat = Variable::new("lat", vec!["station".into()], values.clone())
            .unwrap()
            .with_coord(Coordinate::new("lat", vec!["station".into()], values.clone()).unwrap())
            .with_coord(Coordinate::new("lon", vec!["station".into()], values).unwrap());
        let dataset = Dataset::new().with_data_var(lat);
        let mut cache = AxisCache::new();

        let variable = dataset.parse_cf(&mut cache, "lat", None).unwrap();
        assert!(variable.crs.is_none());
    }

    #[test]
    fn test_parse_cf_unknown_variable() {
        let dataset = testing::narr_dataset();
        let mut cache = AxisCache::new();
        let err = dataset.parse_cf(&mut cache, "nope", None).unwrap_err();
        assert!(matches!(err, Error::NoSuchVariable(_)));
    }

    #[test]
    fn test_parse_cf_assigns_coordinates() {
        let dataset = testing::narr_dataset();
        let mut cache = AxisCache::new();
        let variable = dataset
            .parse_cf(&mut cache, "Temperature", Some(&[(AxisKind::X, "lon")]))
            .unwrap();
        assert_eq!(variable.x(&mut cache).unwrap().name, "lon");
        assert_eq!(variable.y(&mut cache).unwrap().name, "y");
    }

    #[test]
    fn test_parse_cf_all() {
        let mut dataset = testing::narr_dataset();
        dataset.attrs.insert("Conventions".into(), "CF-1.0".into());
        let mut cache = AxisCache::new();

        let parsed = dataset.parse_cf_all(&mut cache, None).unwrap();
        assert_eq!(parsed.data_vars.len(), 2);
        assert!(parsed.data_vars.iter().all(|v| v.crs.is_some()));
        assert_eq!(parsed.attrs, dataset.attrs);
        assert_eq!(parsed.variables, dataset.variables);
        assert!(parsed.get("LambertConformal_Projection").is_some());
    }

    #[test]
    fn test_radians_scaled_by_perspective_point_height() {
        let x = Coordinate::dimension("x", Array1::from(vec![0.0, 0.5e-3]))
            .with_attr("units", "radian")
            .with_attr("axis", "X");
        let variable = Variable::new("Rad", vec!["x".into()], ArrayD::zeros(IxDyn(&[2])))
            .unwrap()
            .with_attr("grid_mapping", "goes_imager_projection")
            .with_coord(x);
        let projection = Variable::new("goes_imager_projection", vec![], ArrayD::zeros(IxDyn(&[])))
            .unwrap()
            .with_attr("grid_mapping_name", "geostationary")
            .with_attr("perspective_point_height", "35786023.0");
        let dataset = Dataset::new().with_data_var(variable).with_variable(projection);

        let mut cache = AxisCache::new();
        let parsed = dataset.parse_cf(&mut cache, "Rad", None).unwrap();
        let x = parsed.coord("x").unwrap();
        let expected = [0.0, 17893.0115];
        for (value, expected) in x.values.iter().zip(expected) {
            assert!((value - expected).abs() < 1e-6, "{value} != {expected}");
        }
        assert_eq!(x.attr("units"), Some("meters"));
    }

    #[test]
    fn test_dataset_sel() {
        let dataset = testing::narr_dataset();
        let selection = Selection::new()
            .with("isobaric", Quantity::parse(70000.0, "Pa").unwrap())
            .with("x", Slice::default().stop(Quantity::parse(10000.0, "m").unwrap()));

        let selected = dataset.sel(&selection).unwrap();
        for variable in &selected.data_vars {
            assert_eq!(variable.dims, vec!["time", "y", "x"]);
            assert_eq!(variable.values.shape(), &[1, 4, 2]);
        }
    }

    #[test]
    fn test_dataset_translate_unknown_key() {
        let dataset = testing::narr_dataset();
        let selection = Selection::new().with("vertical", 500.0);
        assert!(matches!(
            dataset.translate(&selection),
            Err(Error::NoSuchCoordinate(_))
        ));
    }
}
