use super::endpoints::Endpoint;
use crate::error::{ElectroCarsError, Result};
use crate::logging::StructuredLogger;

pub const APP_ID_HEADER: &str = "x-app-id";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Longest response body quoted in logs
const MAX_LOGGED_BODY: usize = 512;

pub fn user_agent() -> String {
    format!("electrocars/{}", env!("APP_VERSION"))
}

pub fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent())
        .build()
        .map_err(|e| ElectroCarsError::network(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a send result into a response, the "no result" sentinel, or an error.
///
/// Timeouts are reported like a non-2xx answer; other transport failures
/// propagate to the caller.
pub fn settle(
    logger: &StructuredLogger,
    endpoint: Endpoint,
    sent: reqwest::Result<reqwest::Response>,
) -> Result<Option<reqwest::Response>> {
    match sent {
        Ok(resp) => Ok(Some(resp)),
        Err(e) if e.is_timeout() => {
            logger.warn(&format!("Request to {} timed out", endpoint));
            Ok(None)
        }
        Err(e) => {
            logger.error(&format!("Request to {} failed: {}", endpoint, e));
            Err(ElectroCarsError::network(format!("{}: {}", endpoint, e)))
        }
    }
}

/// Decode a JSON body; a timeout while reading it is settled like one
/// during the send
pub async fn read_json<T: serde::de::DeserializeOwned>(
    logger: &StructuredLogger,
    endpoint: Endpoint,
    resp: reqwest::Response,
) -> Result<Option<T>> {
    match resp.json::<T>().await {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.is_timeout() => {
            logger.warn(&format!("Reading response from {} timed out", endpoint));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Log a non-success response together with (a prefix of) its body
pub async fn log_failure(logger: &StructuredLogger, endpoint: Endpoint, resp: reqwest::Response) {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let body = if body.chars().count() > MAX_LOGGED_BODY {
        let cut: String = body.chars().take(MAX_LOGGED_BODY).collect();
        format!("{}...", cut)
    } else {
        body
    };
    logger.error(&format!("{} failed with {}: {}", endpoint, status, body));
}

/// Value of the refresh-token cookie set by a response, if any
pub fn refresh_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.cookies()
        .find(|c| c.name() == REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
