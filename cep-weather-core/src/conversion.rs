//! Celsius conversions and decimal rounding.

use crate::model::TemperatureResult;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Uses a 273 offset rather than 273.15; existing clients depend on these values.
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.0
}

/// Round half away from zero to `decimal_places`.
pub fn round_to_decimal_places(value: f64, decimal_places: u32) -> f64 {
    let factor = 10f64.powi(decimal_places as i32);
    (value * factor).round() / factor
}

/// Build the three-scale result from a Celsius reading, one decimal each.
pub fn to_temperature_result(celsius: f64) -> TemperatureResult {
    TemperatureResult {
        celsius: round_to_decimal_places(celsius, 1),
        fahrenheit: round_to_decimal_places(celsius_to_fahrenheit(celsius), 1),
        kelvin: round_to_decimal_places(celsius_to_kelvin(celsius), 1),
    }
}
