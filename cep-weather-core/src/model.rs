use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TypedError;

/// ASCII digits only: `\d` in the regex crate would also accept other Unicode digits.
static POSTAL_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}-?[0-9]{3}$").expect("postal code pattern is valid"));

pub const INVALID_POSTAL_CODE: &str = "invalid zipcode";

/// A Brazilian zip code (CEP): five digits, an optional hyphen, three digits.
///
/// The original input is kept as given, hyphen included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Validate `raw` against the postal code format.
    ///
    /// Fails with `422 invalid zipcode` on anything that is not a full match.
    pub fn parse(raw: &str) -> Result<Self, TypedError> {
        if POSTAL_CODE_PATTERN.is_match(raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(TypedError::unprocessable(INVALID_POSTAL_CODE))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PostalCode {
    type Err = TypedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for PostalCode {
    type Error = TypedError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Non-empty city name resolved from a zip code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityName(String);

impl CityName {
    /// Returns `None` for an empty string.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() { None } else { Some(Self(name)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current temperature in the three supported scales, each rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureResult {
    #[serde(rename = "temp_C")]
    pub celsius: f64,
    #[serde(rename = "temp_F")]
    pub fahrenheit: f64,
    #[serde(rename = "temp_K")]
    pub kelvin: f64,
}
