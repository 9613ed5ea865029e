// ABOUTME: Dataset inflation factor applied per source file on every node.
// ABOUTME: A multiplier of m yields m - 1 extra entries; one means no inflation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultiplierError {
    #[error("multiplier must be at least 1")]
    Zero,

    #[error("invalid multiplier: '{0}'")]
    Invalid(String),
}

/// Inflation factor, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Multiplier(u32);

impl Multiplier {
    pub const ONE: Multiplier = Multiplier(1);

    pub fn new(value: u32) -> Result<Self, MultiplierError> {
        if value == 0 {
            return Err(MultiplierError::Zero);
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Number of extra entries this multiplier produces.
    pub fn extra(&self) -> usize {
        (self.0.max(1) - 1) as usize
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Multiplier {
    type Error = MultiplierError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Multiplier> for u32 {
    fn from(value: Multiplier) -> Self {
        value.0
    }
}

impl FromStr for Multiplier {
    type Err = MultiplierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u32>()
            .map_err(|_| MultiplierError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_means_no_extra_entries() {
        assert_eq!(Multiplier::ONE.extra(), 0);
        assert_eq!(Multiplier::default(), Multiplier::ONE);
    }

    #[test]
    fn extra_is_value_minus_one() {
        assert_eq!(Multiplier::new(4).unwrap().extra(), 3);
    }

    #[test]
    fn zero_is_rejected() {
        assert_eq!(Multiplier::new(0), Err(MultiplierError::Zero));
        assert_eq!("0".parse::<Multiplier>(), Err(MultiplierError::Zero));
    }

    #[test]
    fn parses_from_text() {
        assert_eq!("3".parse::<Multiplier>().unwrap().get(), 3);
        assert!(matches!(
            "three".parse::<Multiplier>(),
            Err(MultiplierError::Invalid(_))
        ));
    }
}
