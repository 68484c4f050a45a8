use serde_with::{DeserializeFromStr, SerializeDisplay};

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

/// Represents an amount of money in Japanese yen.
///
/// Yen has no minor unit, so the amount is stored as a whole number. Export
/// files sometimes carry thousands separators, a currency sign, or a trailing
/// `.0` left over from a spreadsheet; [`FromStr`] accepts all of these and
/// rounds any fractional amount to the nearest yen (ties to even).
///
/// The [`Display`] implementation prints the bare integer, which is also the
/// text form used when comparing ledger keys.
#[derive(
    Clone, Copy, Default, DeserializeFromStr, SerializeDisplay, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
pub struct Yen(i64);

impl Yen {
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Debug for Yen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "¥{}", self.0)
    }
}

impl Display for Yen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Yen {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s.trim().replace([',', '¥', '￥', '円'], "");
        if let Ok(amount) = digits.parse::<i64>() {
            return Ok(Self(amount));
        }
        let amount: f64 = digits.parse()?;
        anyhow::ensure!(amount.is_finite(), "not a finite amount: {s:?}");
        #[allow(clippy::cast_possible_truncation)]
        let rounded = amount.round_ties_even() as i64;
        Ok(Self(rounded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_accepts_export_formatting() {
        assert_eq!(Yen::from_str("1,100").unwrap(), Yen::new(1100));
        assert_eq!(Yen::from_str("¥2,200").unwrap(), Yen::new(2200));
        assert_eq!(Yen::from_str("-550").unwrap(), Yen::new(-550));
        assert_eq!(Yen::from_str("3300.0").unwrap(), Yen::new(3300));
    }

    #[test]
    fn from_str_fn_rounds_fractional_amounts_to_even() {
        assert_eq!(Yen::from_str("1000.4").unwrap(), Yen::new(1000));
        assert_eq!(Yen::from_str("1000.5").unwrap(), Yen::new(1000));
        assert_eq!(Yen::from_str("1001.5").unwrap(), Yen::new(1002));
    }

    #[test]
    fn from_str_fn_rejects_text() {
        assert!(Yen::from_str("free").is_err());
        assert!(Yen::from_str("").is_err());
    }

    #[test]
    fn display_is_the_bare_amount() {
        assert_eq!(Yen::new(-1100).to_string(), "-1100");
    }
}
