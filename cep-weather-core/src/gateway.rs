use crate::{
    Config, TypedError,
    gateway::{viacep::ViaCepClient, weatherapi::WeatherApiClient},
    model::{CityName, PostalCode},
    transport::{HttpDoer, RequestContext, ReqwestDoer, TransportError, endpoint::EndpointError},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod viacep;
pub mod weatherapi;

/// Resolves a postal code to the name of its city.
#[async_trait]
pub trait AddressGateway: Send + Sync + Debug {
    /// On success the city is non-empty for well-behaved implementations; the
    /// use case still checks it.
    async fn resolve_city(
        &self,
        ctx: &RequestContext,
        postal_code: &PostalCode,
    ) -> Result<String, TypedError>;
}

/// Resolves a city name to its current temperature in Celsius.
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn resolve_temperature(
        &self,
        ctx: &RequestContext,
        city: &CityName,
    ) -> Result<f64, TypedError>;
}

/// Both gateways, sharing one outbound client.
#[derive(Debug, Clone)]
pub struct Gateways {
    pub address: Arc<dyn AddressGateway>,
    pub weather: Arc<dyn WeatherGateway>,
}

/// Construct the production gateways from config.
pub fn gateways_from_config(config: &Config) -> Result<Gateways, TransportError> {
    let http: Arc<dyn HttpDoer> = Arc::new(ReqwestDoer::with_timeout(Some(config.http.timeout()))?);

    Ok(Gateways {
        address: Arc::new(ViaCepClient::new(&config.address_api, Arc::clone(&http))),
        weather: Arc::new(WeatherApiClient::new(&config.weather_api, http)),
    })
}

pub(crate) fn endpoint_failure(err: EndpointError) -> TypedError {
    TypedError::internal(format!("error building endpoint: {err}"))
}

pub(crate) fn send_failure(err: TransportError) -> TypedError {
    TypedError::internal(format!("error sending request: {err}"))
}
