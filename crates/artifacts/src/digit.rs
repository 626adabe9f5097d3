use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the ten category tags, `0` through `9`.
///
/// Serializes as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

/// Value that is not a digit class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a digit class: {0}")]
pub struct InvalidDigit(pub String);

impl Digit {
    pub const COUNT: usize = 10;

    /// All classes in ascending order.
    pub fn all() -> impl Iterator<Item = Digit> {
        (0..Self::COUNT as u8).map(Digit)
    }

    pub fn new(value: u8) -> Option<Self> {
        (value < Self::COUNT as u8).then_some(Digit(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = InvalidDigit;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Digit::new(value).ok_or_else(|| InvalidDigit(value.to_string()))
    }
}

impl TryFrom<i64> for Digit {
    type Error = InvalidDigit;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Digit::new)
            .ok_or_else(|| InvalidDigit(value.to_string()))
    }
}

impl From<Digit> for u8 {
    fn from(value: Digit) -> Self {
        value.0
    }
}

impl FromStr for Digit {
    type Err = InvalidDigit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => Ok(Digit(c as u8 - b'0')),
            _ => Err(InvalidDigit(s.to_string())),
        }
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
