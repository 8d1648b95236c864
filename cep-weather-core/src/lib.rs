//! Core library for the `cep-weather` service.
//!
//! This crate defines:
//! - Postal code validation and the shared domain models
//! - Address and weather gateways over an injectable HTTP transport
//! - The lookup use case chaining them, plus unit conversion
//!
//! It is used by `cep-weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod conversion;
pub mod error;
pub mod gateway;
pub mod model;
pub mod transport;
pub mod usecase;

pub use config::Config;
pub use error::TypedError;
pub use gateway::{AddressGateway, Gateways, WeatherGateway, gateways_from_config};
pub use model::{CityName, PostalCode, TemperatureResult};
pub use transport::{HttpDoer, RequestContext};
pub use usecase::GetTemperatureByPostalCode;
