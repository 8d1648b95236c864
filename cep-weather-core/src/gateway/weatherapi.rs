use async_trait::async_trait;
use reqwest::{Method, Request, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::WeatherApiConfig,
    error::TypedError,
    gateway::{WeatherGateway, endpoint_failure, send_failure},
    model::CityName,
    transport::{
        HttpDoer, RequestContext,
        endpoint::{Endpoint, EndpointError},
    },
};

/// Weather gateway for WeatherAPI.com-compatible APIs.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    base_url: String,
    path: String,
    api_key: String,
    http: Arc<dyn HttpDoer>,
}

impl WeatherApiClient {
    pub fn new(config: &WeatherApiConfig, http: Arc<dyn HttpDoer>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            path: config.path.clone(),
            api_key: config.api_key.clone(),
            http,
        }
    }

    fn url_for(&self, city: &CityName) -> Result<Url, EndpointError> {
        Ok(Endpoint::new(&self.base_url)?
            .path(&self.path)
            .query("key", &self.api_key)
            .query("q", city.as_str())
            .query("aqi", "no")
            .build())
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaError,
}

/// Map a non-200 response onto an error that keeps the upstream status.
fn upstream_failure(status: StatusCode, body: &[u8]) -> TypedError {
    match serde_json::from_slice::<WaErrorResponse>(body) {
        Ok(WaErrorResponse { error }) if !error.message.is_empty() => TypedError::new(
            status,
            format!("Error code: {}. Description: {}", error.code, error.message),
        ),
        _ => TypedError::new(
            status,
            format!("unexpected error from weather api: {}", String::from_utf8_lossy(body)),
        ),
    }
}

#[async_trait]
impl WeatherGateway for WeatherApiClient {
    async fn resolve_temperature(
        &self,
        ctx: &RequestContext,
        city: &CityName,
    ) -> Result<f64, TypedError> {
        let url = self.url_for(city).map_err(endpoint_failure)?;
        // The query carries the API key.
        tracing::debug!(host = url.host_str().unwrap_or_default(), path = url.path(), %city, "requesting weather");

        let res = ctx
            .execute(self.http.as_ref(), Request::new(Method::GET, url))
            .await
            .map_err(send_failure)?;

        let body = res
            .body()
            .map_err(|e| TypedError::internal(format!("error reading response: {e}")))?;

        if res.status() != StatusCode::OK {
            return Err(upstream_failure(res.status(), body));
        }

        let weather: WaResponse = serde_json::from_slice(body)
            .map_err(|e| TypedError::internal(format!("error unmarshalling response: {e}")))?;

        tracing::debug!(location = %weather.location.name, temp_c = weather.current.temp_c, "weather resolved");

        Ok(weather.current.temp_c)
    }
}
