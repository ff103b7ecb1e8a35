//! Criteria for deciding which axis a coordinate describes.
//!
//! Checks are made, in order, against:
//!
//! - `standard_name` (CF)
//! - `_CoordinateAxisType` (THREDDS)
//! - `axis` (CF)
//! - `positive` (CF, for vertical coordinates that aren't pressure)
//! - `units`, by dimensionality or by exact spelling
//! - the coordinate's name, as a last resort for data without CF metadata
//!
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    axis::Axis,
    coordinate::Coordinate,
    errors::{Error, Result},
    units::{self, Dimensionality, Unit},
};

static CF: Lazy<Arc<Criteria>> =
    Lazy::new(|| Arc::new(cf_table().expect("CF criteria table is well formed")));

/// Read access to the metadata the criteria look at.
///
/// Implemented by coordinates and by variables, so a data variable can be checked too (a
/// variable that is itself latitude, say).
///
pub trait Metadata {
    fn name(&self) -> &str;

    fn attr(&self, key: &str) -> Option<&str>;

    fn units_str(&self) -> &str {
        self.attr("units").unwrap_or("dimensionless")
    }
}

impl Metadata for Coordinate {
    fn name(&self) -> &str {
        &self.name
    }

    fn attr(&self, key: &str) -> Option<&str> {
        Coordinate::attr(self, key)
    }
}

/// The four attributes whose values are matched by exact membership.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttributeCategory {
    StandardName,
    CoordinateAxisType,
    Axis,
    Positive,
}

impl AttributeCategory {
    pub const ALL: [AttributeCategory; 4] = [
        AttributeCategory::StandardName,
        AttributeCategory::CoordinateAxisType,
        AttributeCategory::Axis,
        AttributeCategory::Positive,
    ];

    /// The attribute name this category reads.
    pub fn attribute(&self) -> &'static str {
        match self {
            AttributeCategory::StandardName => "standard_name",
            AttributeCategory::CoordinateAxisType => "_CoordinateAxisType",
            AttributeCategory::Axis => "axis",
            AttributeCategory::Positive => "positive",
        }
    }
}

/// A single predicate on a coordinate.
///
#[derive(Clone, Debug)]
pub enum Criterion {
    /// The attribute's value is one of `values`
    Attribute {
        category: AttributeCategory,
        values: Vec<String>,
    },

    /// The declared unit has the same dimensionality as `reference`
    UnitDimensionality { reference: Dimensionality },

    /// The declared unit is spelled exactly as one of `spellings`
    UnitName { spellings: Vec<String> },

    /// The coordinate's name starts with a match for this case insensitive pattern
    Name(Regex),
}

impl Criterion {
    /// Position in the fixed evaluation order.
    fn rank(&self) -> usize {
        match self {
            Criterion::Attribute { category, .. } => *category as usize,
            Criterion::UnitDimensionality { .. } | Criterion::UnitName { .. } => 4,
            Criterion::Name(_) => 5,
        }
    }

    pub fn matches<M>(&self, coord: &M) -> bool
    where
        M: Metadata + ?Sized,
    {
        match self {
            Criterion::Attribute { category, values } => coord
                .attr(category.attribute())
                .map_or(false, |value| values.iter().any(|v| v == value)),

            // An unparseable unit only fails this criterion.
            Criterion::UnitDimensionality { reference } => {
                match units::dimensionality(coord.units_str()) {
                    Ok(dims) => dims == *reference,
                    Err(_) => false,
                }
            }

            Criterion::UnitName { spellings } => coord
                .attr("units")
                .map_or(false, |units| spellings.iter().any(|s| s == units)),

            Criterion::Name(pattern) => pattern.is_match(coord.name()),
        }
    }
}

/// An immutable table of criteria for every matchable axis.
///
/// The CF table from `Criteria::cf` is built once per process and shared. Custom tables can
/// be assembled with `CriteriaBuilder`.
///
#[derive(Debug)]
pub struct Criteria {
    axes: [Vec<Criterion>; 6],
}

impl Criteria {
    /// The shared table of CF, THREDDS and name based criteria.
    ///
    pub fn cf() -> Arc<Criteria> {
        Arc::clone(&CF)
    }

    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// Criteria for `axis`, in evaluation order.
    pub fn get(&self, axis: Axis) -> &[Criterion] {
        &self.axes[axis.index()]
    }

    /// Whether `coord` satisfies any criterion for `axis`. Stops at the first match.
    ///
    pub fn matches<M>(&self, coord: &M, axis: Axis) -> bool
    where
        M: Metadata + ?Sized,
    {
        self.get(axis).iter().any(|criterion| criterion.matches(coord))
    }

    /// Whether `coord` matches any of `axes`, checked in the order given.
    ///
    pub fn check<M>(&self, coord: &M, axes: &[Axis]) -> bool
    where
        M: Metadata + ?Sized,
    {
        axes.iter().any(|axis| self.matches(coord, *axis))
    }
}

/// Check if the CF criteria for any of the given axes are satisfied.
///
/// # Arguments
///
/// * `coord` - The coordinate to check.
/// * `axes` - Axis flavors to check for, in order.
///
pub fn check_axis<M>(coord: &M, axes: &[Axis]) -> bool
where
    M: Metadata + ?Sized,
{
    CF.check(coord, axes)
}

#[derive(Default)]
pub struct CriteriaBuilder {
    axes: [Vec<Criterion>; 6],
}

impl CriteriaBuilder {
    pub fn attribute(mut self, axis: Axis, category: AttributeCategory, values: &[&str]) -> Self {
        self.axes[axis.index()].push(Criterion::Attribute {
            category,
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Match any unit with the dimensionality of `reference`.
    ///
    pub fn unit_dimensionality(mut self, axis: Axis, reference: &str) -> Result<Self> {
        let reference = Unit::parse(reference)?.dimensionality();
        self.axes[axis.index()].push(Criterion::UnitDimensionality { reference });
        Ok(self)
    }

    pub fn unit_names(mut self, axis: Axis, spellings: &[&str]) -> Self {
        self.axes[axis.index()].push(Criterion::UnitName {
            spellings: spellings.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Match coordinate names starting with `pattern`, ignoring case.
    ///
    pub fn name_pattern(mut self, axis: Axis, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("(?i)^(?:{pattern})"))?;
        self.axes[axis.index()].push(Criterion::Name(pattern));
        Ok(self)
    }

    /// Finish the table, putting each axis's criteria in evaluation order.
    ///
    /// Fails if any axis has no criteria at all.
    ///
    pub fn build(mut self) -> Result<Criteria> {
        for axis in Axis::ALL {
            let criteria = &mut self.axes[axis.index()];
            if criteria.is_empty() {
                return Err(Error::MissingCriteria(axis));
            }
            criteria.sort_by_key(Criterion::rank);
        }

        Ok(Criteria { axes: self.axes })
    }
}

fn cf_table() -> Result<Criteria> {
    use AttributeCategory::{CoordinateAxisType, Positive, StandardName};

    Criteria::builder()
        .attribute(Axis::Time, StandardName, &["time"])
        .attribute(
            Axis::Vertical,
            StandardName,
            &[
                "air_pressure",
                "height",
                "geopotential_height",
                "altitude",
                "model_level_number",
                "atmosphere_ln_pressure_coordinate",
                "atmosphere_sigma_coordinate",
                "atmosphere_hybrid_sigma_pressure_coordinate",
                "atmosphere_hybrid_height_coordinate",
                "atmosphere_sleve_coordinate",
                "height_above_geopotential_datum",
                "height_above_reference_ellipsoid",
                "height_above_mean_sea_level",
            ],
        )
        .attribute(Axis::Y, StandardName, &["projection_y_coordinate"])
        .attribute(Axis::Lat, StandardName, &["latitude"])
        .attribute(Axis::X, StandardName, &["projection_x_coordinate"])
        .attribute(Axis::Lon, StandardName, &["longitude"])
        .attribute(Axis::Time, CoordinateAxisType, &["Time"])
        .attribute(Axis::Vertical, CoordinateAxisType, &["GeoZ", "Height", "Pressure"])
        .attribute(Axis::Y, CoordinateAxisType, &["GeoY"])
        .attribute(Axis::Lat, CoordinateAxisType, &["Lat"])
        .attribute(Axis::X, CoordinateAxisType, &["GeoX"])
        .attribute(Axis::Lon, CoordinateAxisType, &["Lon"])
        .attribute(Axis::Time, AttributeCategory::Axis, &["T"])
        .attribute(Axis::Vertical, AttributeCategory::Axis, &["Z"])
        .attribute(Axis::Y, AttributeCategory::Axis, &["Y"])
        .attribute(Axis::X, AttributeCategory::Axis, &["X"])
        .attribute(Axis::Vertical, Positive, &["up", "down"])
        .unit_dimensionality(Axis::Vertical, "Pa")?
        .unit_names(
            Axis::Lat,
            &[
                "degree_north",
                "degree_N",
                "degreeN",
                "degrees_north",
                "degrees_N",
                "degreesN",
            ],
        )
        .unit_names(
            Axis::Lon,
            &[
                "degree_east",
                "degree_E",
                "degreeE",
                "degrees_east",
                "degrees_E",
                "degreesE",
            ],
        )
        .name_pattern(Axis::Time, r"time[0-9]*")?
        .name_pattern(
            Axis::Vertical,
            r"(bottom_top|sigma|h(ei)?ght|altitude|depth|isobaric|pres|isotherm)[a-z_]*[0-9]*",
        )?
        .name_pattern(Axis::Y, r"y")?
        .name_pattern(Axis::Lat, r"x?lat[a-z0-9]*")?
        .name_pattern(Axis::X, r"x")?
        .name_pattern(Axis::Lon, r"x?lon[a-z0-9]*")?
        .build()
}
