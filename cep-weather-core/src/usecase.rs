use std::sync::Arc;

use crate::{
    conversion::to_temperature_result,
    error::TypedError,
    gateway::{AddressGateway, Gateways, WeatherGateway},
    model::{CityName, PostalCode, TemperatureResult},
    transport::RequestContext,
};

/// Postal code → city → current temperature in C/F/K.
///
/// Stops at the first failure and returns it unchanged; nothing is retried.
#[derive(Debug, Clone)]
pub struct GetTemperatureByPostalCode {
    address: Arc<dyn AddressGateway>,
    weather: Arc<dyn WeatherGateway>,
}

impl GetTemperatureByPostalCode {
    pub fn new(address: Arc<dyn AddressGateway>, weather: Arc<dyn WeatherGateway>) -> Self {
        Self { address, weather }
    }

    pub fn from_gateways(gateways: Gateways) -> Self {
        Self::new(gateways.address, gateways.weather)
    }

    #[tracing::instrument(name = "get_temperature", skip_all, fields(postal_code = %postal_code))]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        postal_code: &PostalCode,
    ) -> Result<TemperatureResult, TypedError> {
        let result = self.lookup(ctx, postal_code).await;

        match &result {
            Ok(temperature) => tracing::info!(
                temp_c = temperature.celsius,
                temp_f = temperature.fahrenheit,
                temp_k = temperature.kelvin,
                "temperature resolved"
            ),
            Err(err) => tracing::warn!(status_code = err.status_code, error = %err, "lookup failed"),
        }

        result
    }

    async fn lookup(
        &self,
        ctx: &RequestContext,
        postal_code: &PostalCode,
    ) -> Result<TemperatureResult, TypedError> {
        let city = self.address.resolve_city(ctx, postal_code).await?;

        let city = CityName::new(city).ok_or_else(|| {
            TypedError::internal("city field is empty in response from via cep service")
        })?;
        tracing::debug!(%city, "city resolved");

        let celsius = self.weather.resolve_temperature(ctx, &city).await?;

        Ok(to_temperature_result(celsius))
    }
}
