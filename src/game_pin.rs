//! Game pin generation and management
//!
//! This module provides functionality for generating and managing the
//! 6-digit numeric pins that identify live game sessions. Pins are short
//! enough to be typed from a phone and are only required to be unique
//! among concurrently active sessions; a pin may be reused once the
//! session that held it is gone.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Minimum value for generated game pins (inclusive)
const MIN_VALUE: u32 = 100_000;
/// Maximum value for generated game pins (exclusive)
const MAX_VALUE: u32 = 1_000_000;

/// Error returned when parsing a game pin from a string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsePinError {
    /// The string is not a valid decimal number
    #[error(transparent)]
    Invalid(#[from] ParseIntError),
    /// The value is outside the 6-digit pin range
    #[error("pin out of range")]
    OutOfRange,
}

/// A 6-digit numeric identifier for a live game session
///
/// Pins are generated uniformly at random in `[100000, 999999]` and
/// displayed as a fixed-width decimal string so they can be shared
/// verbally or shown on a host screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GamePin(u32);

impl GamePin {
    /// Creates a new random game pin
    pub fn new() -> Self {
        Self(fastrand::u32(MIN_VALUE..MAX_VALUE))
    }

    /// Creates a random game pin that satisfies the given availability check
    ///
    /// The check receives each candidate pin and returns `true` if it is not
    /// currently in use by an active session. Uniqueness is only required
    /// among active sessions, so retrying until the check passes is enough.
    pub fn new_where<F: Fn(GamePin) -> bool>(is_free: F) -> Self {
        loop {
            let pin = Self::new();
            if is_free(pin) {
                return pin;
            }
        }
    }
}

impl Default for GamePin {
    /// Creates a new random game pin (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GamePin {
    /// Formats the pin as a fixed-width 6-digit decimal number
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

impl Serialize for GamePin {
    /// Serializes the pin as a 6-digit decimal string
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GamePin {
    /// Deserializes a pin from its decimal string form
    fn deserialize<D>(deserializer: D) -> Result<GamePin, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        GamePin::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

impl FromStr for GamePin {
    type Err = ParsePinError;

    /// Parses a pin from a decimal string representation
    ///
    /// # Errors
    ///
    /// Returns a [`ParsePinError`] if the string is not a valid decimal
    /// number or falls outside the 6-digit range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = u32::from_str(s)?;
        if !(MIN_VALUE..MAX_VALUE).contains(&value) {
            return Err(ParsePinError::OutOfRange);
        }
        Ok(Self(value))
    }
}
