//! [`Transport`] backed by `reqwest`.

use async_trait::async_trait;
use carelink_core::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError};
use tracing::debug;
use url::Url;

use crate::config::ApiSettings;

pub struct ReqwestTransport {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport with the configured timeouts and user agent.
    ///
    /// Exceeding either timeout surfaces as [`TransportError::Timeout`].
    pub fn new(settings: &ApiSettings) -> Result<Self, TransportError> {
        let base_url = settings
            .base_url()
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", settings.base_url)))?;
        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.connect_timeout())
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `path` to the base URL, keeping any path prefix the base has.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else {
        TransportError::Io(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.endpoint_url(&request.path)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self
            .http_client
            .request(to_reqwest_method(request.method), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) | RequestBody::Multipart { bytes, .. } => builder.body(bytes),
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;

        debug!(status, bytes = body.len(), "Received response");
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> ReqwestTransport {
        let settings = ApiSettings {
            base_url: base.into(),
            ..ApiSettings::default()
        };
        ReqwestTransport::new(&settings).unwrap()
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let t = transport("https://clinic.example/api/");
        assert_eq!(
            t.endpoint_url("/patients").unwrap().as_str(),
            "https://clinic.example/api/patients"
        );
        let t = transport("https://clinic.example/api");
        assert_eq!(
            t.endpoint_url("inquiries/42/status").unwrap().as_str(),
            "https://clinic.example/api/inquiries/42/status"
        );
    }

    #[test]
    fn test_endpoint_url_keeps_encoded_id_in_path() {
        let t = transport("https://clinic.example/api");
        let url = t.endpoint_url("/patients/p%3Fx%3D1/status").unwrap();
        assert_eq!(url.path(), "/api/patients/p%3Fx%3D1/status");
        assert_eq!(url.query(), None);

        let url = t.endpoint_url("/patients/..%2Fauth%2Flogout").unwrap();
        assert_eq!(url.path(), "/api/patients/..%2Fauth%2Flogout");
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = ApiSettings {
            base_url: "::nope".into(),
            ..ApiSettings::default()
        };
        assert!(matches!(
            ReqwestTransport::new(&settings),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
