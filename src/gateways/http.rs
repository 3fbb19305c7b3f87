use crate::gateways::{GatewayError, GatewayResult};
use crate::models::ImportFile;
use anyhow::Context;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("accessdesk/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build upstream HTTP client")
}

/// Appends `segments` to `base`, each one percent-encoded as exactly one path segment.
///
/// Empty and dot segments never name an upstream entity and are refused.
pub(crate) fn segment_url(base: &str, segments: &[&str], operation: &str) -> GatewayResult<Url> {
    if let Some(segment) = segments
        .iter()
        .find(|it| matches!(**it, "" | "." | ".."))
    {
        return Err(GatewayError::NotFound(format!(
            "Invalid identifier '{segment}' for {operation}"
        )));
    }
    let mut url = Url::parse(base).map_err(|err| GatewayError::decode(operation, err))?;
    url.path_segments_mut()
        .map_err(|_| GatewayError::decode(operation, format!("'{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends the request and turns transport failures and non-2xx answers into [`GatewayError`].
pub(crate) async fn send(request: RequestBuilder, operation: &str) -> GatewayResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|err| GatewayError::transport(operation, err))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, body = %body, "{operation} rejected");
    let message = remote_message(&body);
    Err(match (status, message) {
        (StatusCode::NOT_FOUND, Some(message)) => GatewayError::NotFound(message),
        (StatusCode::NOT_FOUND, None) => {
            GatewayError::NotFound(format!("Unknown error for {operation}"))
        }
        (status, Some(message)) => GatewayError::Remote {
            status: status.as_u16(),
            message,
        },
        (status, None) => GatewayError::unknown(operation, status.as_u16()),
    })
}

pub(crate) async fn read_json<T>(request: RequestBuilder, operation: &str) -> GatewayResult<T>
where
    T: DeserializeOwned,
{
    let response = send(request, operation).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|err| GatewayError::transport(operation, err))?;
    serde_json::from_slice(&bytes).map_err(|err| GatewayError::decode(operation, err))
}

pub(crate) async fn expect_ok(request: RequestBuilder, operation: &str) -> GatewayResult<()> {
    send(request, operation).await.map(|_| ())
}

pub(crate) fn multipart_form(file: ImportFile) -> GatewayResult<reqwest::multipart::Form> {
    let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
    if let Some(content_type) = file.content_type {
        part = part
            .mime_str(&content_type)
            .map_err(|err| GatewayError::decode("import file", err))?;
    }
    Ok(reqwest::multipart::Form::new().part("file", part))
}

/// Extracts the human readable message of an error body, if the backend sent one.
fn remote_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|it| it.as_str()))
        .map(str::trim)
        .find(|it| !it.is_empty())
        .map(str::to_string)
}
