//! Request executor.
//!
//! Every request to the backend goes through [`RequestExecutor`]: it attaches
//! the bearer token, sends the request through the [`Transport`], and folds
//! the outcome into an [`ApiError`]. A 401 on an authenticated request ends
//! the session unless refresh-and-retry is enabled and succeeds.

use std::collections::BTreeMap;
use std::sync::Arc;

use carelink_auth::SessionManager;
use carelink_core::{
    ApiError, ApiResult, Envelope, HttpRequest, HttpResponse, Method, Page, RequestBody, Transport,
    error_message_from_body,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::upload::{FileUpload, encode_multipart, new_boundary};

const JSON: &str = "application/json";

pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    refresh_on_unauthorized: bool,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionManager>) -> Self {
        Self {
            transport,
            session,
            refresh_on_unauthorized: false,
        }
    }

    /// Refresh the token and retry once when an authenticated request is
    /// rejected with 401, instead of ending the session straight away.
    pub fn with_refresh_on_unauthorized(mut self, enabled: bool) -> Self {
        self.refresh_on_unauthorized = enabled;
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Send one request and return the raw 2xx response.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        requires_auth: bool,
    ) -> ApiResult<HttpResponse> {
        self.execute_request(HttpRequest::new(method, path).with_body(body), requires_auth)
            .await
    }

    /// Like [`execute`](Self::execute) for a prebuilt request (query string,
    /// extra headers).
    pub async fn execute_request(
        &self,
        request: HttpRequest,
        requires_auth: bool,
    ) -> ApiResult<HttpResponse> {
        self.dispatch(request, requires_auth, false).await
    }

    /// GET an endpoint and unwrap its envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(Method::Get, path, RequestBody::Empty, true).await?;
        decode_data(&response)
    }

    /// GET one page of a list endpoint.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Page<T>> {
        let mut request = HttpRequest::new(Method::Get, path);
        for (key, value) in query {
            request = request.with_query(*key, value);
        }
        let response = self.execute_request(request, true).await?;
        Page::from_envelope(Envelope::<Vec<T>>::decode(&response.body)?)
    }

    /// Send a JSON body and unwrap the envelope of the reply.
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        requires_auth: bool,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::invalid_request(format!("Failed to encode request: {e}")))?;
        let response = self
            .execute(method, path, RequestBody::Json(bytes), requires_auth)
            .await?;
        decode_data(&response)
    }

    /// Send a request whose reply carries no payload worth decoding.
    ///
    /// An envelope with `success: false` is still reported as an error.
    pub async fn execute_unit(
        &self,
        method: Method,
        path: &str,
        requires_auth: bool,
    ) -> ApiResult<()> {
        let response = self
            .execute(method, path, RequestBody::Empty, requires_auth)
            .await?;
        if response.body.is_empty() {
            return Ok(());
        }
        match serde_json::from_slice::<Envelope<serde_json::Value>>(&response.body) {
            Ok(envelope) if !envelope.success => {
                let message = envelope
                    .server_message()
                    .unwrap_or_else(|| "The server rejected the request".to_string());
                Err(ApiError::unknown(message))
            }
            _ => Ok(()),
        }
    }

    /// Upload a file as `multipart/form-data` together with plain fields.
    ///
    /// Shares status classification with JSON requests except that 413 is
    /// reported as [`ApiError::PayloadTooLarge`].
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: &FileUpload,
        fields: &BTreeMap<String, String>,
    ) -> ApiResult<T> {
        let body = encode_multipart(&new_boundary(), file, fields);
        debug!(
            path,
            file_name = %file.file_name,
            bytes = file.bytes.len(),
            "Uploading file"
        );
        let request = HttpRequest::new(Method::Post, path).with_body(body);
        let response = self.dispatch(request, true, true).await?;
        decode_data(&response)
    }

    async fn dispatch(
        &self,
        mut request: HttpRequest,
        requires_auth: bool,
        upload: bool,
    ) -> ApiResult<HttpResponse> {
        request.set_header("Accept", JSON);
        match &request.body {
            RequestBody::Multipart { boundary, .. } => {
                let content_type = format!("multipart/form-data; boundary={boundary}");
                request.set_header("Content-Type", content_type);
            }
            _ => request.set_header("Content-Type", JSON),
        }

        let token = if requires_auth {
            self.session.access_token()
        } else {
            None
        };
        let response = self.send(request.clone(), token.as_deref()).await?;
        if response.is_success() {
            return Ok(response);
        }

        if response.status == 401 && requires_auth {
            return self.handle_unauthorized(request, token, response, upload).await;
        }

        Err(classify(&response, upload))
    }

    async fn handle_unauthorized(
        &self,
        request: HttpRequest,
        stale_token: Option<String>,
        response: HttpResponse,
        upload: bool,
    ) -> ApiResult<HttpResponse> {
        let mut response = response;

        if self.refresh_on_unauthorized
            && self.session.refresh_after(stale_token.as_deref()).await
        {
            debug!(path = %request.path, "Retrying after token refresh");
            let token = self.session.access_token();
            response = self.send(request, token.as_deref()).await?;
            if response.is_success() {
                return Ok(response);
            }
            if response.status != 401 {
                return Err(classify(&response, upload));
            }
        }

        if self.session.clear_session() {
            warn!("Request was unauthorized, session cleared");
        }
        Err(classify(&response, upload))
    }

    async fn send(&self, mut request: HttpRequest, token: Option<&str>) -> ApiResult<HttpResponse> {
        if let Some(token) = token {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
        debug!(method = %request.method, path = %request.path, "Executing request");
        let response = self.transport.send(request).await?;
        debug!(status = response.status, "Request completed");
        Ok(response)
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("refresh_on_unauthorized", &self.refresh_on_unauthorized)
            .finish_non_exhaustive()
    }
}

fn classify(response: &HttpResponse, upload: bool) -> ApiError {
    ApiError::from_status(response.status, error_message_from_body(&response.body), upload)
}

fn decode_data<T: DeserializeOwned>(response: &HttpResponse) -> ApiResult<T> {
    Envelope::<T>::decode(&response.body)?.into_data()
}
