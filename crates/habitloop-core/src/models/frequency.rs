use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How often a habit is expected: `numerator` occurrences within any
/// window of `denominator` days.
///
/// Construction enforces `1 <= numerator <= denominator`, with the
/// window capped at [`Frequency::MAX_DENOMINATOR`] days, so the engine
/// never sees an invalid ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    numerator: u32,
    denominator: u32,
}

impl Frequency {
    pub const DAILY: Frequency = Frequency { numerator: 1, denominator: 1 };
    pub const WEEKLY: Frequency = Frequency { numerator: 1, denominator: 7 };
    pub const TWO_TIMES_PER_WEEK: Frequency = Frequency { numerator: 2, denominator: 7 };
    pub const THREE_TIMES_PER_WEEK: Frequency = Frequency { numerator: 3, denominator: 7 };

    /// Longest supported window, ten years.
    pub const MAX_DENOMINATOR: i64 = 3650;

    /// Create a frequency, rejecting anything outside
    /// `1 <= n <= d <= MAX_DENOMINATOR`.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, ValidationError> {
        if numerator < 1 || denominator < 1 || numerator > denominator || denominator > Self::MAX_DENOMINATOR {
            return Err(ValidationError::InvalidFrequency { numerator, denominator });
        }
        Ok(Self {
            numerator: numerator as u32,
            denominator: denominator as u32,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn to_f64(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    pub fn is_daily(&self) -> bool {
        self.numerator == self.denominator
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::DAILY
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedFrequency(s.to_string());
        let (num, den) = s.trim().split_once('/').ok_or_else(malformed)?;
        let num = num.trim().parse::<i64>().map_err(|_| malformed())?;
        let den = den.trim().parse::<i64>().map_err(|_| malformed())?;
        Self::new(num, den)
    }
}

impl TryFrom<String> for Frequency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_ratios() {
        assert!(Frequency::new(0, 1).is_err());
        assert!(Frequency::new(1, 0).is_err());
        assert!(Frequency::new(3, 2).is_err());
        assert!(Frequency::new(-1, 7).is_err());
        assert_eq!(
            Frequency::new(4, 3),
            Err(ValidationError::InvalidFrequency { numerator: 4, denominator: 3 })
        );
    }

    #[test]
    fn rejects_windows_longer_than_supported() {
        assert!(Frequency::new(1, Frequency::MAX_DENOMINATOR).is_ok());
        assert_eq!(
            Frequency::new(1, 200_000_000),
            Err(ValidationError::InvalidFrequency { numerator: 1, denominator: 200_000_000 })
        );
        assert!("1/4294967295".parse::<Frequency>().is_err());
    }

    #[test]
    fn accepts_valid_ratios() {
        let f = Frequency::new(2, 7).unwrap();
        assert_eq!(f, Frequency::TWO_TIMES_PER_WEEK);
        assert_eq!(f.numerator(), 2);
        assert_eq!(f.denominator(), 7);
        assert!(Frequency::new(5, 5).unwrap().is_daily());
    }

    #[test]
    fn parses_and_displays() {
        let f: Frequency = " 3 / 7 ".parse().unwrap();
        assert_eq!(f, Frequency::THREE_TIMES_PER_WEEK);
        assert_eq!(f.to_string(), "3/7");
        assert!("weekly".parse::<Frequency>().is_err());
        assert!("8/7".parse::<Frequency>().is_err());
    }

    #[test]
    fn serde_uses_ratio_string() {
        let json = serde_json::to_string(&Frequency::WEEKLY).unwrap();
        assert_eq!(json, "\"1/7\"");
        let back: Frequency = serde_json::from_str("\"1/1\"").unwrap();
        assert_eq!(back, Frequency::DAILY);
        assert!(serde_json::from_str::<Frequency>("\"0/1\"").is_err());
    }
}
