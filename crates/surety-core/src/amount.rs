use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Elementary units per display unit of the native asset.
pub const ELEMENTARY_PER_UNIT: u128 = 1_000_000_000_000_000_000;

const DISPLAY_SCALE: u32 = 18;

/// Fixed-point amount of the native asset, held in elementary units.
///
/// Serialized as a decimal string of elementary units so consumers without
/// 128-bit integers do not lose precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Largest amount that still renders as a display `Decimal` (96-bit mantissa).
    pub const MAX_DISPLAYABLE: Amount = Amount((1 << 96) - 1);

    pub const fn from_elementary(value: u128) -> Self {
        Self(value)
    }

    /// Whole display units. Panics on overflow, so only use it for constants.
    pub const fn units(units: u128) -> Self {
        Self(units * ELEMENTARY_PER_UNIT)
    }

    pub const fn elementary(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// `self * numerator / denominator`, rounding down.
    pub fn scale(self, numerator: u128, denominator: u128) -> Option<Amount> {
        if denominator == 0 {
            return None;
        }
        self.0
            .checked_mul(numerator)
            .map(|value| Amount(value / denominator))
    }

    /// Value in display units, `None` when it does not fit a `Decimal`.
    pub fn to_display(self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, DISPLAY_SCALE)
            .ok()
            .map(|value| value.normalize())
    }

    /// Converts display units into elementary units. Negative values and
    /// values finer than one elementary unit are rejected.
    pub fn from_display(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        if value.scale() > DISPLAY_SCALE {
            return None;
        }

        let mut scaled = value;
        scaled.rescale(DISPLAY_SCALE);
        if scaled.scale() != DISPLAY_SCALE {
            return None;
        }

        u128::try_from(scaled.mantissa()).ok().map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_display() {
            Some(display) => write!(f, "{display}"),
            None => write!(f, "{}e-18", self.0),
        }
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Self)
    }
}

impl TryFrom<String> for Amount {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trip_for_fractional_units() {
        let half = Decimal::new(15, 1);
        let amount = Amount::from_display(half).unwrap();
        assert_eq!(amount.elementary(), 1_500_000_000_000_000_000);
        assert_eq!(amount.to_display(), Some(half));
        assert_eq!(amount.to_string(), "1.5");
    }

    #[test]
    fn largest_displayable_amount_renders() {
        assert!(Amount::MAX_DISPLAYABLE.to_display().is_some());
        let beyond = Amount::MAX_DISPLAYABLE
            .checked_add(Amount::from_elementary(1))
            .unwrap();
        assert_eq!(beyond.to_display(), None);
    }

    #[test]
    fn rejects_negative_and_over_precise_values() {
        assert_eq!(Amount::from_display(Decimal::new(-1, 0)), None);
        assert_eq!(Amount::from_display(Decimal::new(1, 19)), None);
        assert_eq!(Amount::from_display(Decimal::ZERO), Some(Amount::ZERO));
    }

    #[test]
    fn scale_rounds_down() {
        let paid = Amount::from_elementary(3);
        assert_eq!(paid.scale(3, 2), Some(Amount::from_elementary(4)));
        assert_eq!(Amount::units(1).scale(3, 2), Some(Amount::from_elementary(1_500_000_000_000_000_000)));
        assert_eq!(paid.scale(1, 0), None);
    }

    #[test]
    fn serializes_as_elementary_string() {
        let json = serde_json::to_string(&Amount::units(2)).unwrap();
        assert_eq!(json, "\"2000000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::units(2));
    }
}
