use std::{fmt, str::FromStr};

use crate::errors::{Error, Result};

/// The role a coordinate plays for its parent variable.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisKind {
    Time,
    Vertical,
    Y,
    X,
}

impl AxisKind {
    /// All axis kinds, in resolution order.
    pub const ALL: [AxisKind; 4] = [AxisKind::Time, AxisKind::Vertical, AxisKind::Y, AxisKind::X];

    /// The name callers use for this kind, e.g. "vertical".
    pub fn readable(&self) -> &'static str {
        match self {
            AxisKind::Time => "time",
            AxisKind::Vertical => "vertical",
            AxisKind::Y => "y",
            AxisKind::X => "x",
        }
    }

    /// The CF `axis` attribute letter for this kind.
    pub fn cf_letter(&self) -> &'static str {
        match self {
            AxisKind::Time => "T",
            AxisKind::Vertical => "Z",
            AxisKind::Y => "Y",
            AxisKind::X => "X",
        }
    }

    /// The matchable axes that make up this kind. A coordinate belongs to the kind if it
    /// matches any of them.
    ///
    pub fn flavors(&self) -> &'static [Axis] {
        match self {
            AxisKind::Time => &[Axis::Time],
            AxisKind::Vertical => &[Axis::Vertical],
            AxisKind::Y => &[Axis::Y, Axis::Lat],
            AxisKind::X => &[Axis::X, Axis::Lon],
        }
    }

    /// Strict projection flavor for the horizontal kinds, `None` otherwise.
    pub fn projection(&self) -> Option<Axis> {
        match self {
            AxisKind::Y => Some(Axis::Y),
            AxisKind::X => Some(Axis::X),
            _ => None,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, AxisKind::Y | AxisKind::X)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// Parse a readable axis name, accepting "lat" and "lon" as aliases for y and x.
    ///
    /// Returns `None` for anything else, so callers can fall back to treating the name as a
    /// coordinate or dimension name.
    ///
    pub fn from_readable(name: &str) -> Option<AxisKind> {
        match name {
            "time" => Some(AxisKind::Time),
            "vertical" => Some(AxisKind::Vertical),
            "y" | "lat" => Some(AxisKind::Y),
            "x" | "lon" => Some(AxisKind::X),
            _ => None,
        }
    }
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.readable())
    }
}

impl FromStr for AxisKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AxisKind::from_readable(s).ok_or_else(|| Error::InvalidAxis(s.to_string()))
    }
}

/// A matchable axis flavor. `Lat` and `Lon` are geographic flavors of the horizontal kinds,
/// `Y` and `X` are the projection flavors.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Time,
    Vertical,
    Y,
    Lat,
    X,
    Lon,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::Time,
        Axis::Vertical,
        Axis::Y,
        Axis::Lat,
        Axis::X,
        Axis::Lon,
    ];

    pub fn kind(&self) -> AxisKind {
        match self {
            Axis::Time => AxisKind::Time,
            Axis::Vertical => AxisKind::Vertical,
            Axis::Y | Axis::Lat => AxisKind::Y,
            Axis::X | Axis::Lon => AxisKind::X,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Axis::Time => "time",
            Axis::Vertical => "vertical",
            Axis::Y => "y",
            Axis::Lat => "lat",
            Axis::X => "x",
            Axis::Lon => "lon",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
