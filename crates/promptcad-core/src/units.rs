//! Length units and conversion to canonical millimeters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Cm,
    M,
    In,
    Ft,
    Yd,
}

impl Unit {
    pub const ALL: [Unit; 6] = [Unit::Mm, Unit::Cm, Unit::M, Unit::In, Unit::Ft, Unit::Yd];

    pub const fn millimeters_per_unit(self) -> f64 {
        match self {
            Unit::Mm => 1.0,
            Unit::Cm => 10.0,
            Unit::M => 1000.0,
            Unit::In => 25.4,
            Unit::Ft => 304.8,
            Unit::Yd => 914.4,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::M => "m",
            Unit::In => "in",
            Unit::Ft => "ft",
            Unit::Yd => "yd",
        }
    }

    /// Resolves a unit token as written in prose: symbols, singular and plural
    /// names, and the inch/foot marks. Case-insensitive.
    pub fn from_token(token: &str) -> Option<Unit> {
        let unit = match token.to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Unit::Mm,
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Unit::Cm,
            "m" | "meter" | "meters" | "metre" | "metres" => Unit::M,
            "in" | "inch" | "inches" | "\"" => Unit::In,
            "ft" | "foot" | "feet" | "'" => Unit::Ft,
            "yd" | "yard" | "yards" => Unit::Yd,
            _ => return None,
        };
        Some(unit)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported unit '{0}' (expected mm, cm, m, in, ft or yd)")]
pub struct UnknownUnit(pub String);

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Unit::from_token(value.trim()).ok_or_else(|| UnknownUnit(value.to_string()))
    }
}

#[inline]
pub fn to_millimeters(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Mm => value,
        _ => value * unit.millimeters_per_unit(),
    }
}

#[inline]
pub fn from_millimeters(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Mm => value,
        _ => value / unit.millimeters_per_unit(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Unit, from_millimeters, to_millimeters};

    fn any_unit() -> impl Strategy<Value = Unit> {
        prop::sample::select(Unit::ALL.to_vec())
    }

    #[test]
    fn conversion_table_matches_definitions() {
        assert_eq!(to_millimeters(3.0, Unit::Mm), 3.0);
        assert_eq!(to_millimeters(3.0, Unit::Cm), 30.0);
        assert_eq!(to_millimeters(3.0, Unit::M), 3000.0);
        assert!((to_millimeters(1.0, Unit::In) - 25.4).abs() < 1e-12);
        assert!((to_millimeters(1.0, Unit::Ft) - 304.8).abs() < 1e-12);
        assert!((to_millimeters(1.0, Unit::Yd) - 914.4).abs() < 1e-12);
    }

    #[test]
    fn tokens_resolve_case_insensitively() {
        assert_eq!(Unit::from_token("MM"), Some(Unit::Mm));
        assert_eq!(Unit::from_token("Centimetres"), Some(Unit::Cm));
        assert_eq!(Unit::from_token("feet"), Some(Unit::Ft));
        assert_eq!(Unit::from_token("\""), Some(Unit::In));
        assert_eq!(Unit::from_token("km"), None);
    }

    #[test]
    fn parse_and_display_agree() {
        for unit in Unit::ALL {
            assert_eq!(unit.to_string().parse::<Unit>(), Ok(unit));
        }
        let err = "parsec".parse::<Unit>().expect_err("parsec is not a unit");
        assert!(err.to_string().contains("parsec"));
    }

    proptest! {
        #[test]
        fn conversion_is_monotonic(unit in any_unit(), a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(to_millimeters(lo, unit) <= to_millimeters(hi, unit));
        }

        #[test]
        fn inverse_round_trips(unit in any_unit(), x in -1.0e6f64..1.0e6) {
            let back = to_millimeters(from_millimeters(x, unit), unit);
            prop_assert!((back - x).abs() <= 1e-9 * x.abs().max(1.0));
        }
    }
}
