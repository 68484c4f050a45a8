use regex::Regex;

use std::{fmt::Display, path::Path, str::FromStr, sync::OnceLock};

use crate::error::{Error, Result};

/// A calendar month, the unit every ledger row and report column is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Returns the numeric range key `year * 100 + month`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn key(self) -> i64 {
        self.year as i64 * 100 + self.month as i64
    }

    /// Returns the report column label, e.g. `24/05` for May 2024.
    #[must_use]
    pub fn label(self) -> String {
        format!("{:02}/{:02}", self.year.rem_euclid(100), self.month)
    }

    fn checked(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `2024-05`, `2024/5` or `202405`.
impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (year, month) = match s.split_once(['-', '/']) {
            Some(parts) => parts,
            None if s.len() == 6 && s.is_ascii() => s.split_at(4),
            None => return Err(Error::InvalidPeriod(s.to_string())),
        };
        match (year.parse::<i32>(), month.parse::<u32>()) {
            (Ok(year), Ok(month)) => {
                Self::checked(year, month).ok_or_else(|| Error::InvalidPeriod(s.to_string()))
            }
            _ => Err(Error::InvalidPeriod(s.to_string())),
        }
    }
}

fn web_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})\s*(?:年|[-_.])\s*(\d{1,2})(?:月|\D|$)").expect("invalid web name regex")
    })
}

fn store_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:(?i:export)|データ出力)(\d{4})(\d{2})").expect("invalid store name regex")
    })
}

/// Extracts the sales month from a WEB export's file name.
///
/// The base name must contain a four-digit year followed by a one- or
/// two-digit month, such as `2024年5月売上.csv` or `sales_2024-05.csv`.
///
/// # Errors
///
/// Returns [`Error::MissingPeriod`] if no such token is present.
pub fn web_period(path: impl AsRef<Path>) -> Result<YearMonth> {
    period_from_name(path.as_ref(), web_name_re(), "YYYY年M月")
}

/// Extracts the sales month from a store export's file name, which must
/// contain `exportYYYYMM`.
///
/// # Errors
///
/// Returns [`Error::MissingPeriod`] if no such token is present.
pub fn store_period(path: impl AsRef<Path>) -> Result<YearMonth> {
    period_from_name(path.as_ref(), store_name_re(), "exportYYYYMM")
}

fn period_from_name(path: &Path, re: &Regex, expected: &'static str) -> Result<YearMonth> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    re.captures_iter(&name)
        .find_map(|caps| YearMonth::checked(caps[1].parse().ok()?, caps[2].parse().ok()?))
        .ok_or_else(|| Error::MissingPeriod {
            file: path.display().to_string(),
            expected,
        })
}
