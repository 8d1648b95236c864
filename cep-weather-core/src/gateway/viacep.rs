use async_trait::async_trait;
use reqwest::{Method, Request, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::AddressApiConfig,
    error::TypedError,
    gateway::{AddressGateway, endpoint_failure, send_failure},
    model::{INVALID_POSTAL_CODE, PostalCode},
    transport::{
        HttpDoer, RequestContext,
        endpoint::{Endpoint, EndpointError, interpolate_path},
    },
};

/// Address gateway for ViaCEP-compatible APIs.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    base_url: String,
    path_template: String,
    http: Arc<dyn HttpDoer>,
}

impl ViaCepClient {
    pub fn new(config: &AddressApiConfig, http: Arc<dyn HttpDoer>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            path_template: config.path_template.clone(),
            http,
        }
    }

    fn url_for(&self, postal_code: &PostalCode) -> Result<Url, EndpointError> {
        let path = interpolate_path(&self.path_template, postal_code.as_str())?;
        Ok(Endpoint::new(&self.base_url)?.path(&path).build())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepAddress {
    cep: Option<String>,
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    erro: Option<serde_json::Value>,
}

impl ViaCepAddress {
    /// ViaCEP flags unknown codes with `"erro": "true"`; newer deployments send a boolean.
    fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::String(flag)) => flag == "true",
            Some(serde_json::Value::Bool(flag)) => *flag,
            _ => false,
        }
    }
}

#[async_trait]
impl AddressGateway for ViaCepClient {
    async fn resolve_city(
        &self,
        ctx: &RequestContext,
        postal_code: &PostalCode,
    ) -> Result<String, TypedError> {
        let url = self.url_for(postal_code).map_err(endpoint_failure)?;
        tracing::debug!(%url, "requesting address");

        let res = ctx
            .execute(self.http.as_ref(), Request::new(Method::GET, url))
            .await
            .map_err(send_failure)?;

        match res.status() {
            StatusCode::OK => {}
            StatusCode::BAD_REQUEST => return Err(TypedError::unprocessable(INVALID_POSTAL_CODE)),
            status => {
                return Err(TypedError::internal(format!(
                    "error reading response. Status code not OK: Status code returned {}",
                    status.as_u16()
                )));
            }
        }

        let body = res
            .body()
            .map_err(|e| TypedError::internal(format!("error reading response: {e}")))?;

        let address: ViaCepAddress = serde_json::from_slice(body)
            .map_err(|e| TypedError::internal(format!("error unmarshalling response: {e}")))?;

        if address.is_not_found() {
            return Err(TypedError::not_found("can not find zipcode"));
        }

        let Some(city) = address.localidade.filter(|city| !city.is_empty()) else {
            return Err(TypedError::internal("city is empty in response"));
        };

        tracing::debug!(
            cep = ?address.cep,
            street = ?address.logradouro,
            neighborhood = ?address.bairro,
            state = ?address.uf,
            %city,
            "address resolved"
        );

        Ok(city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{
        ReqwestDoer, TransportError,
        stub::{HangingDoer, StubDoer},
    };
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> AddressApiConfig {
        AddressApiConfig {
            base_url: base_url.to_string(),
            path_template: "/ws/{zip_code}/json".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> ViaCepClient {
        let http = Arc::new(ReqwestDoer::with_timeout(None).unwrap());
        ViaCepClient::new(&config(&server.uri()), http)
    }

    fn postal_code(raw: &str) -> PostalCode {
        PostalCode::parse(raw).unwrap()
    }

    async fn mock_response(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/ws/90010000/json"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resolves_city() {
        let server = MockServer::start().await;
        mock_response(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "cep": "90010-000",
                "logradouro": "Rua dos Andradas",
                "bairro": "Centro Histórico",
                "localidade": "Porto Alegre",
                "uf": "RS"
            })),
        )
        .await;

        let city = client_for(&server)
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .expect("city should resolve");

        assert_eq!(city, "Porto Alegre");
    }

    #[tokio::test]
    async fn keeps_hyphen_in_request_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/90010-000/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "localidade": "Porto Alegre" })))
            .expect(1)
            .mount(&server)
            .await;

        let city = client_for(&server)
            .resolve_city(&RequestContext::new(), &postal_code("90010-000"))
            .await
            .unwrap();

        assert_eq!(city, "Porto Alegre");
    }

    #[tokio::test]
    async fn upstream_bad_request_is_invalid_zipcode() {
        let server = MockServer::start().await;
        mock_response(&server, ResponseTemplate::new(400).set_body_string("<html>Bad Request</html>"))
            .await;

        let err = client_for(&server)
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap_err();

        assert_eq!(err, TypedError::unprocessable("invalid zipcode"));
    }

    #[tokio::test]
    async fn other_statuses_are_internal_with_code() {
        let server = MockServer::start().await;
        mock_response(&server, ResponseTemplate::new(503)).await;

        let err = client_for(&server)
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code, 500);
        assert!(err.message.contains("503"), "{}", err.message);
    }

    #[tokio::test]
    async fn invalid_json_is_internal() {
        let server = MockServer::start().await;
        mock_response(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = client_for(&server)
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code, 500);
        assert!(err.message.starts_with("error unmarshalling response:"), "{}", err.message);
    }

    #[tokio::test]
    async fn error_flag_is_not_found() {
        for flag in [json!("true"), json!(true)] {
            let server = MockServer::start().await;
            mock_response(&server, ResponseTemplate::new(200).set_body_json(json!({ "erro": flag })))
                .await;

            let err = client_for(&server)
                .resolve_city(&RequestContext::new(), &postal_code("90010000"))
                .await
                .unwrap_err();

            assert_eq!(err, TypedError::not_found("can not find zipcode"));
        }
    }

    #[tokio::test]
    async fn empty_city_is_internal() {
        for city in [json!(""), serde_json::Value::Null] {
            let server = MockServer::start().await;
            mock_response(
                &server,
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "cep": "90010-000", "localidade": city })),
            )
            .await;

            let err = client_for(&server)
                .resolve_city(&RequestContext::new(), &postal_code("90010000"))
                .await
                .unwrap_err();

            assert_eq!(err, TypedError::internal("city is empty in response"), "localidade = {city}");
        }
    }

    #[tokio::test]
    async fn null_address_fields_still_resolve_city() {
        let server = MockServer::start().await;
        mock_response(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "cep": "90010-000",
                "logradouro": null,
                "bairro": null,
                "localidade": "Porto Alegre",
                "uf": null,
                "erro": null
            })),
        )
        .await;

        let city = client_for(&server)
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap();

        assert_eq!(city, "Porto Alegre");
    }

    #[tokio::test]
    async fn invalid_base_url_fails_before_sending() {
        let http = Arc::new(StubDoer::new(|| Ok(crate::transport::HttpResponse::new(StatusCode::OK, "{}"))));
        let client = ViaCepClient::new(&config("://invalid-url"), http.clone());

        let err = client
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code, 500);
        assert!(err.message.starts_with("error building endpoint:"), "{}", err.message);
        assert!(http.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_internal() {
        let http = Arc::new(StubDoer::new(|| Err(TransportError::Other("http failure".into()))));
        let client = ViaCepClient::new(&config("http://localhost"), http);

        let err = client
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap_err();

        assert_eq!(err, TypedError::internal("error sending request: http failure"));
    }

    #[tokio::test]
    async fn body_read_failure_is_internal() {
        let http = Arc::new(StubDoer::new(|| {
            Ok(crate::transport::HttpResponse::with_body_error(StatusCode::OK, "simulated read error"))
        }));
        let client = ViaCepClient::new(&config("http://localhost"), http);

        let err = client
            .resolve_city(&RequestContext::new(), &postal_code("90010000"))
            .await
            .unwrap_err();

        assert_eq!(err, TypedError::internal("error reading response: simulated read error"));
    }

    #[tokio::test]
    async fn cancelled_context_aborts_call() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let client = ViaCepClient::new(&config("http://localhost"), Arc::new(HangingDoer));

        let code = postal_code("90010000");
        let call = client.resolve_city(&ctx, &code);
        token.cancel();

        let err = tokio::time::timeout(Duration::from_secs(5), call)
            .await
            .expect("cancellation should not block")
            .unwrap_err();

        assert_eq!(err, TypedError::internal("error sending request: context canceled"));
    }
}
