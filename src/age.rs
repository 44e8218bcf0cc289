//! Child ages in CHILDES notation
//!
//! TalkBank XML stores participant ages as ISO-8601-like durations
//! (`P2Y3M10D`). Some corpora leave the age out, but still name each session
//! file after it (`020310.xml` for 2;03.10).

use atoi::FromRadix10Checked;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Days past which an age is rounded up to the next month
const ROUND_UP_DAYS: u32 = 15;

#[derive(Debug, Error, PartialEq)]
pub enum AgeError {
    #[error("Malformed age: {0}")]
    Malformed(String),
}

/// An age in years, months and days
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Age {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl Age {
    pub fn new(years: u32, months: u32, days: u32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    /// Parse a duration such as `P2Y3M10D`, `P2Y3M` or `P1Y`
    pub fn parse(s: &str) -> Result<Self, AgeError> {
        let malformed = || AgeError::Malformed(s.to_string());
        let bytes = s.trim().as_bytes();
        let mut rest = bytes.strip_prefix(b"P").ok_or_else(malformed)?;
        if rest.is_empty() {
            return Err(malformed());
        }

        let mut age = Age::new(0, 0, 0);
        // Units must appear in Y, M, D order
        let mut last_unit = 0;
        while !rest.is_empty() {
            let (value, used) = u32::from_radix_10_checked(rest);
            let value = value.ok_or_else(malformed)?;
            if used == 0 || used == rest.len() {
                return Err(malformed());
            }
            let unit = match rest[used] {
                b'Y' => 1,
                b'M' => 2,
                b'D' => 3,
                _ => return Err(malformed()),
            };
            if unit <= last_unit {
                return Err(malformed());
            }
            match unit {
                1 => age.years = value,
                2 => age.months = value,
                _ => age.days = value,
            }
            last_unit = unit;
            rest = &rest[used + 1..];
        }

        if age.checked_months().is_none() {
            return Err(malformed());
        }
        Ok(age)
    }

    /// Read an age from a `YYMMDD` file stem such as `020310.xml`
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        // Strip a second extension (`020310.xml.gz`)
        let stem = stem.split('.').next()?.as_bytes();
        if stem.len() != 6 || !stem.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let field = |range: std::ops::Range<usize>| atoi::atoi::<u32>(&stem[range]);
        Some(Age::new(field(0..2)?, field(2..4)?, field(4..6)?))
    }

    /// Age in whole months, rounding up after mid-month.
    ///
    /// Saturates for ages too large to count in months, which
    /// [`Age::parse`] never returns.
    pub fn in_months(&self) -> u32 {
        self.checked_months().unwrap_or(u32::MAX)
    }

    fn checked_months(&self) -> Option<u32> {
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        if self.days > ROUND_UP_DAYS {
            months.checked_add(1)
        } else {
            Some(months)
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{:02}.{:02}", self.years, self.months, self.days)
    }
}
