//! Identify the time, vertical, y and x coordinates of labeled data from CF metadata, and
//! select data by physical quantities along them.
//!
mod axis;
mod cache;
mod coordinate;
mod criteria;
mod dataset;
mod errors;
mod helpers;
mod indexer;
mod resolver;
mod units;
mod variable;

#[cfg(test)]
mod testing;

pub use axis::Axis;
pub use axis::AxisKind;

pub use cache::AxisCache;
pub use cache::CoordinateRef;

pub use coordinate::Attributes;
pub use coordinate::Coordinate;

pub use criteria::check_axis;
pub use criteria::AttributeCategory;
pub use criteria::Criteria;
pub use criteria::CriteriaBuilder;
pub use criteria::Criterion;
pub use criteria::Metadata;

pub use dataset::Crs;
pub use dataset::Dataset;

pub use errors::Error;
pub use errors::Result;

pub use indexer::translate;
pub use indexer::Indexer;
pub use indexer::NativeIndexer;
pub use indexer::NativeSelection;
pub use indexer::NativeSlice;
pub use indexer::Selection;
pub use indexer::Slice;
pub use indexer::Value;

pub use resolver::resolve;
pub use resolver::AxisMap;
pub use resolver::Resolution;

pub use units::dimensionality;
pub use units::Dimensionality;
pub use units::Quantity;
pub use units::Unit;
pub use units::UnitArray;

pub use variable::check_matching_coordinates;
pub use variable::AxisRef;
pub use variable::Variable;
