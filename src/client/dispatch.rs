//! Request dispatch
//!
//! One HTTP exchange per call: build the request, race it against the
//! caller's cancellation token, translate provider failures into
//! [`ApiError`], and decode the success body.

use super::Client;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::Method;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json";

impl Client {
    /// GET `endpoint` and decode the body into `T`
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.execute(self.request(Method::GET, endpoint), cancel).await?;
        decode_body(&response.body)
    }

    /// POST `options` (if any) to `endpoint` and decode the body into `T`.
    ///
    /// `None`, or options that serialize to `null`, send no body: the API
    /// rejects a literal `null`.
    pub async fn post<T, O>(
        &self,
        endpoint: &str,
        options: Option<&O>,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        O: Serialize + ?Sized,
    {
        let request = with_body(self.request(Method::POST, endpoint), options)?;
        let response = self.execute(request, cancel).await?;
        decode_body(&response.body)
    }

    /// PUT `options` (if any) to `endpoint` and decode the body into `T`
    pub async fn put<T, O>(
        &self,
        endpoint: &str,
        options: Option<&O>,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        O: Serialize + ?Sized,
    {
        let request = with_body(self.request(Method::PUT, endpoint), options)?;
        let response = self.execute(request, cancel).await?;
        decode_body(&response.body)
    }

    /// DELETE `endpoint`, ignoring any success body
    pub async fn delete(&self, endpoint: &str, cancel: &CancellationToken) -> Result<()> {
        self.execute(self.request(Method::DELETE, endpoint), cancel)
            .await
            .map(|_| ())
    }

    /// Base request with the JSON headers every call carries
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> HttpRequest {
        HttpRequest::new(method, endpoint)
            .header("Accept", JSON_CONTENT_TYPE)
            .header("Content-Type", JSON_CONTENT_TYPE)
    }

    /// Send a request through the client's transport
    pub(crate) async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        send_checked(self.transport.as_ref(), request, cancel).await
    }
}

/// Send a request through `transport`.
///
/// Transport errors come back untouched; status >= 400 becomes
/// [`Error::Api`]. A fired token aborts the in-flight exchange.
pub(crate) async fn send_checked(
    transport: &dyn Transport,
    request: HttpRequest,
    cancel: &CancellationToken,
) -> Result<HttpResponse> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let method = request.method;
    let path = request.path.clone();

    let response = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        result = transport.send(request) => result?,
    };

    debug!("{} {} -> {}", method, path, response.status);

    if response.is_error() {
        return Err(ApiError::from_response(response.status, &response.body).into());
    }

    Ok(response)
}

fn with_body<O: Serialize + ?Sized>(request: HttpRequest, options: Option<&O>) -> Result<HttpRequest> {
    match encode_body(options)? {
        Some(body) => Ok(request.body(body)),
        None => Ok(request),
    }
}

/// Serialize request options, mapping `None` and JSON `null` to no body
pub(crate) fn encode_body<O: Serialize + ?Sized>(options: Option<&O>) -> Result<Option<Bytes>> {
    let Some(options) = options else {
        return Ok(None);
    };

    let value = serde_json::to_value(options).map_err(|e| Error::encode(e.to_string()))?;
    if value.is_null() {
        return Ok(None);
    }

    let body = serde_json::to_vec(&value).map_err(|e| Error::encode(e.to_string()))?;
    Ok(Some(Bytes::from(body)))
}

/// Decode a success body; an empty body decodes as JSON `null`
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| Error::decode(e.to_string()))
}
