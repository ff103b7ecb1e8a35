//! A small unit registry, just large enough for coordinate metadata.
//!
//! Unit expressions follow the UDUNITS/pint style used in CF metadata: terms separated by
//! whitespace or `*`, division with `/`, and integer exponents written as `m2`, `m-2`, `m^2`
//! or `m**2`. Any term may carry an SI prefix (`hPa`, `km`, `millibar`).
//!
use std::{f64::consts::PI, fmt, ops::Mul};

use ndarray::ArrayD;

use crate::errors::{Error, Result};

const BASE_DIMENSIONS: [&str; 7] = [
    "length",
    "mass",
    "time",
    "current",
    "temperature",
    "substance",
    "luminosity",
];

/// The dimensional signature of a unit: exponents of the seven SI base dimensions.
///
/// Angles are dimensionless, as they are in pint, so `degrees_north` and `radian` share the
/// signature of `dimensionless`.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensionality([i8; 7]);

impl Dimensionality {
    pub const DIMENSIONLESS: Dimensionality = Dimensionality([0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimensionality = Dimensionality([1, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimensionality = Dimensionality([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Dimensionality = Dimensionality([0, 0, 1, 0, 0, 0, 0]);
    pub const CURRENT: Dimensionality = Dimensionality([0, 0, 0, 1, 0, 0, 0]);
    pub const TEMPERATURE: Dimensionality = Dimensionality([0, 0, 0, 0, 1, 0, 0]);
    pub const SUBSTANCE: Dimensionality = Dimensionality([0, 0, 0, 0, 0, 1, 0]);
    pub const LUMINOSITY: Dimensionality = Dimensionality([0, 0, 0, 0, 0, 0, 1]);
    pub const PRESSURE: Dimensionality = Dimensionality([-1, 1, -2, 0, 0, 0, 0]);
    pub const VELOCITY: Dimensionality = Dimensionality([1, 0, -1, 0, 0, 0, 0]);
    pub const FORCE: Dimensionality = Dimensionality([1, 1, -2, 0, 0, 0, 0]);
    pub const ENERGY: Dimensionality = Dimensionality([2, 1, -2, 0, 0, 0, 0]);
    pub const POWER: Dimensionality = Dimensionality([2, 1, -3, 0, 0, 0, 0]);

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }

    /// `self * other^exponent`, or `None` if any resulting exponent is out of range.
    fn times(self, other: Dimensionality, exponent: i8) -> Option<Dimensionality> {
        let mut exponents = self.0;
        for (exp, other) in exponents.iter_mut().zip(other.0) {
            *exp = exp.checked_add(other.checked_mul(exponent)?)?;
        }

        Some(Dimensionality(exponents))
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("dimensionless");
        }

        let terms: Vec<String> = BASE_DIMENSIONS
            .iter()
            .zip(self.0)
            .filter(|(_, exp)| *exp != 0)
            .map(|(name, exp)| match exp {
                1 => format!("[{name}]"),
                _ => format!("[{name}]^{exp}"),
            })
            .collect();

        f.write_str(&terms.join(" * "))
    }
}

struct Definition {
    names: &'static [&'static str],
    factor: f64,
    offset: f64,
    dims: Dimensionality,
    prefixable: bool,
}

macro_rules! define {
    ($names:expr, $factor:expr, $dims:ident) => {
        Definition {
            names: $names,
            factor: $factor,
            offset: 0.0,
            dims: Dimensionality::$dims,
            prefixable: false,
        }
    };
    ($names:expr, $factor:expr, $dims:ident, prefixable) => {
        Definition {
            names: $names,
            factor: $factor,
            offset: 0.0,
            dims: Dimensionality::$dims,
            prefixable: true,
        }
    };
}

const DEGREE: f64 = PI / 180.0;

const DEFINITIONS: &[Definition] = &[
    define!(&["dimensionless"], 1.0, DIMENSIONLESS),
    define!(&["percent"], 0.01, DIMENSIONLESS),
    define!(&["radian", "radians", "rad"], 1.0, DIMENSIONLESS),
    define!(&["degree", "degrees", "deg", "arcdeg"], DEGREE, DIMENSIONLESS),
    define!(
        &[
            "degree_north",
            "degree_N",
            "degreeN",
            "degrees_north",
            "degrees_N",
            "degreesN",
        ],
        DEGREE,
        DIMENSIONLESS
    ),
    define!(
        &[
            "degree_east",
            "degree_E",
            "degreeE",
            "degrees_east",
            "degrees_E",
            "degreesE",
        ],
        DEGREE,
        DIMENSIONLESS
    ),
    define!(&["m", "meter", "meters", "metre", "metres"], 1.0, LENGTH, prefixable),
    define!(&["gpm"], 1.0, LENGTH),
    define!(&["ft", "foot", "feet"], 0.3048, LENGTH),
    define!(&["inch", "inches"], 0.0254, LENGTH),
    define!(&["mi", "mile", "miles"], 1609.344, LENGTH),
    define!(&["nmi", "nautical_mile", "nautical_miles"], 1852.0, LENGTH),
    define!(&["g", "gram", "grams"], 1e-3, MASS, prefixable),
    define!(&["s", "sec", "second", "seconds"], 1.0, TIME, prefixable),
    define!(&["min", "minute", "minutes"], 60.0, TIME),
    define!(&["h", "hr", "hour", "hours"], 3600.0, TIME),
    define!(&["d", "day", "days"], 86400.0, TIME),
    define!(&["week", "weeks"], 604800.0, TIME),
    define!(&["A", "ampere", "amperes"], 1.0, CURRENT, prefixable),
    define!(&["K", "kelvin", "degK", "degree_Kelvin"], 1.0, TEMPERATURE, prefixable),
    define!(&["mol", "mole", "moles"], 1.0, SUBSTANCE, prefixable),
    define!(&["cd", "candela"], 1.0, LUMINOSITY),
    define!(&["Pa", "pascal", "pascals"], 1.0, PRESSURE, prefixable),
    define!(&["bar", "bars"], 1e5, PRESSURE, prefixable),
    define!(&["atm", "atmosphere"], 101325.0, PRESSURE),
    define!(&["N", "newton", "newtons"], 1.0, FORCE, prefixable),
    define!(&["J", "joule", "joules"], 1.0, ENERGY, prefixable),
    define!(&["W", "watt", "watts"], 1.0, POWER, prefixable),
    define!(&["knot", "knots", "kt", "kts"], 1852.0 / 3600.0, VELOCITY),
    Definition {
        names: &["degC", "celsius", "degree_Celsius", "degrees_Celsius", "deg_C"],
        factor: 1.0,
        offset: 273.15,
        dims: Dimensionality::TEMPERATURE,
        prefixable: false,
    },
    Definition {
        names: &["degF", "fahrenheit", "degree_Fahrenheit", "degrees_Fahrenheit", "deg_F"],
        factor: 5.0 / 9.0,
        offset: 459.67 * 5.0 / 9.0,
        dims: Dimensionality::TEMPERATURE,
        prefixable: false,
    },
];

/// Longest symbols first so "da" wins over "d".
const PREFIXES: &[(&str, f64)] = &[
    ("giga", 1e9),
    ("mega", 1e6),
    ("kilo", 1e3),
    ("hecto", 1e2),
    ("deca", 1e1),
    ("deci", 1e-1),
    ("centi", 1e-2),
    ("milli", 1e-3),
    ("micro", 1e-6),
    ("nano", 1e-9),
    ("da", 1e1),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
];

fn definition(name: &str) -> Option<&'static Definition> {
    DEFINITIONS.iter().find(|def| def.names.contains(&name))
}

/// Look a single unit name up, first as written and then as a prefixed unit.
///
fn lookup(name: &str) -> Option<(f64, f64, Dimensionality)> {
    if let Some(def) = definition(name) {
        return Some((def.factor, def.offset, def.dims));
    }

    PREFIXES.iter().find_map(|(prefix, scale)| {
        let rest = name.strip_prefix(prefix)?;
        let def = definition(rest).filter(|def| def.prefixable)?;
        Some((scale * def.factor, def.offset, def.dims))
    })
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-' || c == '+'
}

/// A unit of measure: a scale factor and offset relative to the SI base units, and its
/// dimensional signature.
///
#[derive(Clone, Debug)]
pub struct Unit {
    name: String,
    factor: f64,
    offset: f64,
    dims: Dimensionality,
}

impl Unit {
    /// Parse a unit expression.
    ///
    /// Fails with `Error::UndefinedUnit` if any term is not in the registry, and with
    /// `Error::OffsetUnit` if an offset unit such as `degC` is combined with other terms.
    ///
    pub fn parse(expr: &str) -> Result<Unit> {
        let text = expr.trim();
        let normalized = text.replace("**", "^");
        let chars: Vec<char> = normalized.chars().collect();
        let undefined = || Error::UndefinedUnit(expr.to_string());

        let mut factor = 1.0;
        let mut dims = Dimensionality::DIMENSIONLESS;
        let mut offset = 0.0;
        let mut terms = 0;
        let mut simple = true;
        let mut invert = false;

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() || c == '*' || c == '·' {
                i += 1;
            } else if c == '/' {
                invert = true;
                i += 1;
            } else if is_number_start(c) {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    let exponent_sign = (c == '-' || c == '+') && matches!(chars[i - 1], 'e' | 'E');
                    if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let number: String = chars[start..i].iter().collect();
                let number: f64 = number.parse().map_err(|_| undefined())?;
                if number != 1.0 {
                    simple = false;
                }
                factor *= if invert { 1.0 / number } else { number };
                invert = false;
            } else if is_name_char(c) {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();

                if i < chars.len() && chars[i] == '^' {
                    i += 1;
                }
                let exp_start = i;
                if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let exponent: i32 = if exp_start == i {
                    1
                } else {
                    let exponent: String = chars[exp_start..i].iter().collect();
                    exponent.parse().map_err(|_| undefined())?
                };
                let exponent = if invert {
                    exponent.checked_neg().ok_or_else(undefined)?
                } else {
                    exponent
                };
                let exponent = i8::try_from(exponent).map_err(|_| undefined())?;
                invert = false;

                let (term_factor, term_offset, term_dims) = lookup(&name).ok_or_else(undefined)?;
                if exponent != 1 {
                    simple = false;
                }
                if term_offset != 0.0 {
                    offset = term_offset;
                }
                factor *= term_factor.powi(exponent.into());
                dims = dims.times(term_dims, exponent).ok_or_else(undefined)?;
                terms += 1;
            } else {
                return Err(undefined());
            }
        }

        if offset != 0.0 && (terms > 1 || !simple) {
            return Err(Error::OffsetUnit(text.to_string()));
        }

        let name = if text.is_empty() {
            String::from("dimensionless")
        } else {
            text.to_string()
        };

        Ok(Unit {
            name,
            factor,
            offset,
            dims,
        })
    }

    pub fn dimensionless() -> Unit {
        Unit {
            name: String::from("dimensionless"),
            factor: 1.0,
            offset: 0.0,
            dims: Dimensionality::DIMENSIONLESS,
        }
    }

    /// The expression this unit was parsed from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dims
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Convert a magnitude expressed in this unit into `to`.
    ///
    pub fn convert(&self, value: f64, to: &Unit) -> Result<f64> {
        if !self.is_compatible(to) {
            return Err(Error::Dimensionality {
                from: self.name.clone(),
                from_dims: self.dims,
                to: to.name.clone(),
                to_dims: to.dims,
            });
        }

        let base = value * self.factor + self.offset;
        Ok((base - to.offset) / to.factor)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.factor == other.factor && self.offset == other.offset
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Dimensional signature of a unit expression.
///
pub fn dimensionality(expr: &str) -> Result<Dimensionality> {
    Ok(Unit::parse(expr)?.dimensionality())
}

/// A magnitude paired with a unit.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Shorthand for `Quantity::new(magnitude, Unit::parse(unit)?)`.
    pub fn parse(magnitude: f64, unit: &str) -> Result<Self> {
        Ok(Self::new(magnitude, Unit::parse(unit)?))
    }

    pub fn to(&self, unit: &Unit) -> Result<Quantity> {
        let magnitude = self.unit.convert(self.magnitude, unit)?;
        Ok(Quantity::new(magnitude, unit.clone()))
    }
}

impl Mul<&Unit> for f64 {
    type Output = Quantity;

    fn mul(self, unit: &Unit) -> Quantity {
        Quantity::new(self, unit.clone())
    }
}

impl Mul<Unit> for f64 {
    type Output = Quantity;

    fn mul(self, unit: Unit) -> Quantity {
        Quantity::new(self, unit)
    }
}

/// An array of values sharing one unit.
///
#[derive(Clone, Debug)]
pub struct UnitArray {
    pub values: ArrayD<f64>,
    pub unit: Unit,
}

impl UnitArray {
    pub fn new(values: ArrayD<f64>, unit: Unit) -> Self {
        Self { values, unit }
    }

    pub fn to(&self, unit: &Unit) -> Result<UnitArray> {
        // Fail on incompatible units even for empty arrays.
        self.unit.convert(0.0, unit)?;

        let values = self
            .values
            .mapv(|value| (value * self.unit.factor + self.unit.offset - unit.offset) / unit.factor);

        Ok(UnitArray::new(values, unit.clone()))
    }

    /// Multiply by a quantity, combining the units.
    ///
    /// Used to turn scan angles in radians into distances.
    ///
    pub fn scale(&self, by: &Quantity) -> Result<UnitArray> {
        let name = format!("{} * {}", self.unit.name, by.unit.name);
        let dims = self
            .unit
            .dims
            .times(by.unit.dims, 1)
            .ok_or_else(|| Error::UndefinedUnit(name.clone()))?;
        let unit = Unit {
            name,
            factor: self.unit.factor * by.unit.factor,
            offset: 0.0,
            dims,
        };

        Ok(UnitArray::new(self.values.mapv(|value| value * by.magnitude), unit))
    }
}
