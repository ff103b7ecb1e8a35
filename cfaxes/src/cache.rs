//! Memoization of axis resolution.
//!
use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::{
    axis::AxisKind,
    coordinate::Coordinate,
    criteria::Criteria,
    errors::{Error, Result},
    resolver,
    variable::Variable,
};

/// Remembers which axis role each coordinate was resolved to.
///
/// Marks are kept here, next to the variables they describe, rather than in the
/// coordinates' attributes, so looking an axis up never changes a variable's metadata. Marks
/// are keyed by variable name and coordinate name, so one cache can serve every variable of a
/// dataset. A coordinate without a mark hasn't been resolved yet; that is different from
/// having been resolved to nothing.
///
/// Lookups populate the cache. `assign` sets marks explicitly, overriding the heuristics, and
/// `reset` drops a variable's marks so the next lookup resolves from metadata again.
///
/// A variable is identified by its name alone. Two different variables with the same name
/// share marks for the coordinate names they have in common, so a cache should only hold
/// variables whose names are unique, such as the variables of one dataset. Call `reset` before
/// reusing a name for a different variable.
///
/// The cache has no internal locking. Callers sharing one between threads must serialize
/// access.
///
#[derive(Clone, Debug)]
pub struct AxisCache {
    criteria: Arc<Criteria>,
    marks: HashMap<(String, String), AxisKind>,
}

/// A coordinate given either by name or directly.
///
#[derive(Clone, Copy, Debug)]
pub enum CoordinateRef<'a> {
    Name(&'a str),
    Coordinate(&'a Coordinate),
}

impl<'a> CoordinateRef<'a> {
    fn name(&self) -> &'a str {
        match *self {
            CoordinateRef::Name(name) => name,
            CoordinateRef::Coordinate(coord) => &coord.name,
        }
    }
}

impl<'a> From<&'a str> for CoordinateRef<'a> {
    fn from(name: &'a str) -> Self {
        CoordinateRef::Name(name)
    }
}

impl<'a> From<&'a String> for CoordinateRef<'a> {
    fn from(name: &'a String) -> Self {
        CoordinateRef::Name(name)
    }
}

impl<'a> From<&'a Coordinate> for CoordinateRef<'a> {
    fn from(coord: &'a Coordinate) -> Self {
        CoordinateRef::Coordinate(coord)
    }
}

impl Default for AxisCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisCache {
    /// A cache resolving with the CF criteria.
    ///
    pub fn new() -> Self {
        Self::with_criteria(Criteria::cf())
    }

    pub fn with_criteria(criteria: Arc<Criteria>) -> Self {
        Self {
            criteria,
            marks: HashMap::new(),
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// The axis kind `coord` of `variable` is marked with, if any.
    ///
    pub fn mark(&self, variable: &Variable, coord: &str) -> Option<AxisKind> {
        self.marks.get(&key(variable, coord)).copied()
    }

    /// Number of marks held, across all variables.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Find the coordinate of `variable` playing the `kind` role.
    ///
    /// A coordinate already marked with `kind` is returned without re-matching. Otherwise all
    /// coordinates are resolved at once and every resolved kind is marked, as long as neither
    /// the coordinate nor the kind is marked already. Returns `None` if the variable has no
    /// such coordinate, or more than one and no way to choose.
    ///
    pub fn lookup<'v>(&mut self, variable: &'v Variable, kind: AxisKind) -> Option<&'v Coordinate> {
        if let Some(coord) = self.search(variable, kind) {
            return Some(coord);
        }

        let resolution = resolver::resolve(&self.criteria, variable);
        for (axis, coord) in resolution.map.iter() {
            if let Some(coord) = coord {
                let marked = self.marks.contains_key(&key(variable, &coord.name));
                if marked || self.search(variable, axis).is_some() {
                    continue;
                }
                debug!(
                    "Resolved {axis} axis of \"{}\" to \"{}\"",
                    variable.name, coord.name
                );
                self.marks.insert(key(variable, &coord.name), axis);
            }
        }

        resolution.map.get(kind)
    }

    /// Explicitly set which coordinates play which axis roles, bypassing resolution.
    ///
    /// Coordinates may be given by name or directly; either way they must belong to
    /// `variable`. Nothing is marked unless every coordinate is found. A kind assigned here
    /// is taken off any other coordinate of the variable. An empty mapping resets the
    /// variable, as `reset` does.
    ///
    pub fn assign<'c, I, C>(&mut self, variable: &Variable, mapping: I) -> Result<()>
    where
        I: IntoIterator<Item = (AxisKind, C)>,
        C: Into<CoordinateRef<'c>>,
    {
        let mut found = vec![];
        for (kind, coord) in mapping {
            let coord: CoordinateRef<'c> = coord.into();
            let name = coord.name();
            let coord = variable
                .coord(name)
                .ok_or_else(|| Error::NoSuchCoordinate(name.to_string()))?;
            found.push((kind, coord));
        }

        if found.is_empty() {
            self.reset(variable);
            return Ok(());
        }

        for (kind, coord) in found {
            self.marks
                .retain(|(var, _), marked| var != &variable.name || *marked != kind);
            self.marks.insert(key(variable, &coord.name), kind);
        }

        Ok(())
    }

    /// Remove every mark on the coordinates of `variable`.
    ///
    pub fn reset(&mut self, variable: &Variable) {
        self.marks.retain(|(var, _), _| var != &variable.name);
    }

    /// Remove every mark.
    pub fn clear(&mut self) {
        self.marks.clear();
    }

    fn search<'v>(&self, variable: &'v Variable, kind: AxisKind) -> Option<&'v Coordinate> {
        variable
            .coords
            .iter()
            .find(|coord| self.mark(variable, &coord.name) == Some(kind))
    }
}

fn key(variable: &Variable, coord: &str) -> (String, String) {
    (variable.name.clone(), coord.to_string())
}

#[cfg(test)]
mod tests {
    use paste::paste;

    use super::*;

    use crate::{axis::Axis, criteria::AttributeCategory, testing};

    #[test]
    fn test_lookup_marks_all_kinds() {
        let variable = testing::narr_temperature();
        let mut cache = AxisCache::new();

        let y = cache.lookup(&variable, AxisKind::Y).unwrap();
        assert_eq!(y.name, "y");
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.mark(&variable, "time"), Some(AxisKind::Time));
        assert_eq!(cache.mark(&variable, "isobaric"), Some(AxisKind::Vertical));
        assert_eq!(cache.mark(&variable, "y"), Some(AxisKind::Y));
        assert_eq!(cache.mark(&variable, "x"), Some(AxisKind::X));
        assert_eq!(cache.mark(&variable, "lat"), None);
    }

    macro_rules! lookup_tests {
        ($kind:ident, $expected:expr) => {
            paste! {
                #[test]
                fn [<test_lookup_ $kind:lower>]() {
                    let variable = testing::narr_temperature();
                    let mut cache = AxisCache::new();
                    let coord = cache.lookup(&variable, AxisKind::$kind).unwrap();
                    assert_eq!(coord.name, $expected);

                    // Second lookup is a cache hit and changes nothing
                    let before = cache.clone();
                    let coord = cache.lookup(&variable, AxisKind::$kind).unwrap();
                    assert_eq!(coord.name, $expected);
                    assert_eq!(before.marks, cache.marks);
                }
            }
        };
    }

    lookup_tests!(Time, "time");
    lookup_tests!(Vertical, "isobaric");
    lookup_tests!(Y, "y");
    lookup_tests!(X, "x");

    #[test]
    fn test_lookup_absent() {
        let variable = testing::pressure_profile();
        let mut cache = AxisCache::new();
        assert!(cache.lookup(&variable, AxisKind::Time).is_none());
        assert_eq!(cache.mark(&variable, "pressure"), Some(AxisKind::Vertical));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ambiguous_kind_is_not_marked() {
        let variable = testing::ambiguous_lat();
        let mut cache = AxisCache::new();
        assert!(cache.lookup(&variable, AxisKind::Y).is_none());
        assert_eq!(cache.mark(&variable, "lat"), None);
        assert_eq!(cache.mark(&variable, "latitude"), None);
        assert_eq!(cache.mark(&variable, "lon"), Some(AxisKind::X));
    }

    #[test]
    fn test_assign_overrides_resolution() {
        let variable = testing::narr_temperature();
        let mut cache = AxisCache::new();
        cache
            .assign(&variable, [(AxisKind::Y, "lat"), (AxisKind::X, "lon")])
            .unwrap();

        assert_eq!(cache.lookup(&variable, AxisKind::Y).unwrap().name, "lat");
        assert_eq!(cache.lookup(&variable, AxisKind::X).unwrap().name, "lon");
        assert_eq!(cache.mark(&variable, "isobaric"), None);

        // Resolution finds y and x, but those kinds are taken
        assert_eq!(cache.lookup(&variable, AxisKind::Vertical).unwrap().name, "isobaric");
        assert_eq!(cache.mark(&variable, "y"), None);
        assert_eq!(cache.mark(&variable, "x"), None);
        assert_eq!(cache.mark(&variable, "isobaric"), Some(AxisKind::Vertical));
    }

    #[test]
    fn test_assign_coordinates_directly() {
        let variable = testing::narr_temperature();
        let lat = variable.coord("lat").unwrap();
        let mut cache = AxisCache::new();
        cache.assign(&variable, [(AxisKind::Y, lat)]).unwrap();
        assert_eq!(cache.mark(&variable, "lat"), Some(AxisKind::Y));
    }

    #[test]
    fn test_assign_moves_mark() {
        let variable = testing::narr_temperature();
        let mut cache = AxisCache::new();
        cache.lookup(&variable, AxisKind::Y);
        assert_eq!(cache.mark(&variable, "y"), Some(AxisKind::Y));

        cache.assign(&variable, [(AxisKind::Y, "lat")]).unwrap();
        assert_eq!(cache.mark(&variable, "y"), None);
        assert_eq!(cache.lookup(&variable, AxisKind::Y).unwrap().name, "lat");
    }

    #[test]
    fn test_assign_unknown_coordinate() {
        let variable = testing::narr_temperature();
        let mut cache = AxisCache::new();
        let err = cache
            .assign(&variable, [(AxisKind::Y, "lat"), (AxisKind::X, "nope")])
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchCoordinate(ref name) if name == "nope"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reset() {
        let variable = testing::narr_temperature();
        let other = testing::pressure_profile();
        let mut cache = AxisCache::new();
        cache.assign(&variable, [(AxisKind::Y, "lat")]).unwrap();
        cache.lookup(&other, AxisKind::Vertical);

        cache.assign::<_, &str>(&variable, []).unwrap();
        assert_eq!(cache.mark(&variable, "lat"), None);
        assert_eq!(cache.mark(&other, "pressure"), Some(AxisKind::Vertical));

        // Back to resolving from metadata
        assert_eq!(cache.lookup(&variable, AxisKind::Y).unwrap().name, "y");

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resolution_is_stable_after_reset() {
        let variable = testing::narr_temperature();
        let mut cache = AxisCache::new();
        cache.assign(&variable, [(AxisKind::X, "lon")]).unwrap();
        cache.reset(&variable);

        let first: Vec<_> = AxisKind::ALL
            .iter()
            .map(|kind| cache.lookup(&variable, *kind).map(|c| c.name.clone()))
            .collect();
        cache.reset(&variable);
        let second: Vec<_> = AxisKind::ALL
            .iter()
            .map(|kind| cache.lookup(&variable, *kind).map(|c| c.name.clone()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_marks_follow_variable_name() {
        let variable = testing::narr_temperature();
        let mut cache = AxisCache::new();
        cache.assign(&variable, [(AxisKind::Y, "lat")]).unwrap();

        let mut renamed = testing::narr_temperature();
        renamed.name = String::from("u_wind");
        assert_eq!(cache.lookup(&renamed, AxisKind::Y).unwrap().name, "y");

        // Same name, so the marks carry over until reset
        let same_name = testing::narr_temperature();
        assert_eq!(cache.lookup(&same_name, AxisKind::Y).unwrap().name, "lat");
        cache.reset(&same_name);
        assert_eq!(cache.lookup(&same_name, AxisKind::Y).unwrap().name, "y");
    }

    #[test]
    fn test_custom_criteria() {
        let builder = Criteria::builder();
        let builder = Axis::ALL.iter().fold(builder, |builder, axis| {
            builder.attribute(*axis, AttributeCategory::Axis, &["nothing matches this"])
        });
        let criteria = builder
            .attribute(Axis::Time, AttributeCategory::StandardName, &["air_pressure"])
            .build()
            .unwrap();

        let variable = testing::pressure_profile();
        let mut cache = AxisCache::with_criteria(Arc::new(criteria));
        assert_eq!(cache.lookup(&variable, AxisKind::Time).unwrap().name, "pressure");
        assert!(cache.lookup(&variable, AxisKind::Vertical).is_none());
    }
}
