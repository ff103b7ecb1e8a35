use log::warn;

use crate::{
    axis::AxisKind,
    coordinate::Coordinate,
    criteria::Criteria,
    variable::Variable,
};

/// The coordinate, if any, playing each axis role for a variable.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisMap<'v> {
    coords: [Option<&'v Coordinate>; 4],
}

impl<'v> AxisMap<'v> {
    pub fn get(&self, kind: AxisKind) -> Option<&'v Coordinate> {
        self.coords[kind.index()]
    }

    pub(crate) fn set(&mut self, kind: AxisKind, coord: Option<&'v Coordinate>) {
        self.coords[kind.index()] = coord;
    }

    /// Every axis kind with its coordinate, in `AxisKind::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (AxisKind, Option<&'v Coordinate>)> + '_ {
        AxisKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// The outcome of resolving every coordinate of a variable.
///
#[derive(Clone, Debug, Default)]
pub struct Resolution<'v> {
    /// The surviving coordinate for each axis kind
    pub map: AxisMap<'v>,

    /// Axis kinds with more than one candidate and no way to choose between them. These are
    /// absent from `map`.
    pub ambiguous: Vec<AxisKind>,
}

/// Work out which coordinate of `variable` plays each axis role.
///
/// Every coordinate is checked against every axis kind, in the variable's coordinate order,
/// so a coordinate may be a candidate for more than one kind. Kinds with several candidates
/// are narrowed down by `narrow`. Kinds that can't be narrowed to one candidate are left
/// unresolved, with a warning.
///
pub fn resolve<'v>(criteria: &Criteria, variable: &'v Variable) -> Resolution<'v> {
    let mut candidates: [Vec<&'v Coordinate>; 4] = Default::default();
    for coord in &variable.coords {
        for kind in AxisKind::ALL {
            if criteria.check(coord, kind.flavors()) {
                candidates[kind.index()].push(coord);
            }
        }
    }

    let mut resolution = Resolution::default();
    for kind in AxisKind::ALL {
        let found = &candidates[kind.index()];
        let coord = match found.len() {
            0 => None,
            1 => Some(found[0]),
            _ => {
                let chosen = narrow(criteria, variable, kind, found);
                if chosen.is_none() {
                    warn!(
                        "More than one {kind} coordinate present for variable \"{}\".",
                        variable.name
                    );
                    resolution.ambiguous.push(kind);
                }
                chosen
            }
        };
        resolution.map.set(kind, coord);
    }

    resolution
}

/// Choose one of several candidates for an axis kind.
///
/// For the horizontal kinds a lone projection coordinate wins over lon/lat. Failing that, a
/// lone dimension coordinate wins.
///
fn narrow<'v>(
    criteria: &Criteria,
    variable: &Variable,
    kind: AxisKind,
    found: &[&'v Coordinate],
) -> Option<&'v Coordinate> {
    if let Some(projection) = kind.projection() {
        let projected: Vec<&'v Coordinate> = found
            .iter()
            .copied()
            .filter(|coord| criteria.matches(*coord, projection))
            .collect();
        if projected.len() == 1 {
            return Some(projected[0]);
        }
    }

    let dimensions: Vec<&'v Coordinate> = found
        .iter()
        .copied()
        .filter(|coord| variable.dims.contains(&coord.name))
        .collect();
    if dimensions.len() == 1 {
        return Some(dimensions[0]);
    }

    None
}
