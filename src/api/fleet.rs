//! Authenticated fleet operations
//!
//! Each call goes through [`FleetClient::send_authorized`], which retries
//! at most [`MAX_REAUTH_RETRIES`] time(s) after refreshing a rejected
//! access token.

use super::auth::AuthClient;
use super::endpoints::{Endpoint, rejects_credential};
use super::transport;
use super::types::{Car, CarsEnvelope, CommandDescriptor, CommandsEnvelope};
use crate::config::ApiConfig;
use crate::error::Result;
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use serde_json::json;
use std::sync::Arc;

/// Retries allowed after a successful re-authentication
pub const MAX_REAUTH_RETRIES: u32 = 1;

pub struct FleetClient {
    auth: Arc<AuthClient>,
    fleet_base: String,
    page_limit: u32,
    logger: crate::logging::StructuredLogger,
}

impl FleetClient {
    pub fn new(auth: Arc<AuthClient>, config: &ApiConfig) -> Self {
        Self {
            auth,
            fleet_base: config.fleet_base.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            logger: get_logger("fleet"),
        }
    }

    /// All cars visible to the account (`result.items`)
    pub async fn list_cars(&self) -> Result<Option<Vec<Car>>> {
        let url = format!("{}/car", self.fleet_base);
        let limit = self.page_limit.to_string();
        let resp = self
            .send_authorized(Endpoint::ListCars, |http| {
                http.get(&url).query(&[
                    ("limit", limit.as_str()),
                    ("offset", "0"),
                    ("filter", "[]"),
                ])
            })
            .await?;
        let Some(resp) = resp else {
            return Ok(None);
        };

        let Some(envelope) =
            transport::read_json::<CarsEnvelope>(&self.logger, Endpoint::ListCars, resp).await?
        else {
            return Ok(None);
        };

        let mut cars = Vec::with_capacity(envelope.result.items.len());
        for item in envelope.result.items {
            match serde_json::from_value::<Car>(item) {
                Ok(car) => cars.push(car),
                Err(e) => self
                    .logger
                    .warn(&format!("Skipping malformed car record: {}", e)),
            }
        }
        self.logger.debug(&format!("Fetched {} car(s)", cars.len()));
        Ok(Some(cars))
    }

    /// Commands the telematics unit `device_id` currently offers
    pub async fn list_commands(&self, device_id: &str) -> Result<Option<Vec<CommandDescriptor>>> {
        let url = self.commands_url(device_id);
        let resp = self
            .send_authorized(Endpoint::ListCommands, |http| http.get(&url))
            .await?;
        let Some(resp) = resp else {
            return Ok(None);
        };

        let envelope =
            transport::read_json::<CommandsEnvelope>(&self.logger, Endpoint::ListCommands, resp)
                .await?;
        Ok(envelope.map(|e| e.result))
    }

    /// Ask the vehicle to perform `command`.
    ///
    /// This changes physical state (locks, climate, ...), so apart from the
    /// single retry after re-authentication it is never repeated.
    pub async fn send_command(&self, device_id: &str, command: i64) -> Result<bool> {
        let url = self.commands_url(device_id);
        let body = json!({ "command": command });
        let resp = self
            .send_authorized(Endpoint::SendCommand, |http| http.post(&url).json(&body))
            .await?;
        if resp.is_none() {
            return Ok(false);
        }

        get_logger_with_context(
            LogContext::new("fleet").with_field("device", device_id.trim().to_string()),
        )
        .info(&format!("Command {} sent successfully", command));
        Ok(true)
    }

    fn commands_url(&self, device_id: &str) -> String {
        format!(
            "{}/telematics/devices/{}/commands",
            self.fleet_base,
            device_id.trim()
        )
    }

    /// Send a bearer-authenticated request built by `build`.
    ///
    /// A response the endpoint table classifies as "credential rejected"
    /// triggers one refresh and one retry; a second rejection ends the call
    /// with `None`.
    async fn send_authorized<F>(
        &self,
        endpoint: Endpoint,
        build: F,
    ) -> Result<Option<reqwest::Response>>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        if !self.auth.has_credentials() {
            self.logger
                .warn(&format!("Skipping {}: not logged in", endpoint));
            return Ok(None);
        }

        let http = self.auth.http()?;
        let mut retries = 0;
        loop {
            let token = self.auth.access_token();
            let sent = build(http)
                .bearer_auth(token.as_deref().unwrap_or_default())
                .send()
                .await;
            let Some(resp) = transport::settle(&self.logger, endpoint, sent)? else {
                return Ok(None);
            };

            let status = resp.status();
            if status.is_success() {
                return Ok(Some(resp));
            }

            if !rejects_credential(endpoint, status) {
                transport::log_failure(&self.logger, endpoint, resp).await;
                return Ok(None);
            }

            if retries >= MAX_REAUTH_RETRIES {
                self.logger.error(&format!(
                    "{} still rejected ({}) after re-authentication, giving up",
                    endpoint, status
                ));
                return Ok(None);
            }

            self.logger.warn(&format!(
                "Access token rejected by {} ({}), trying to refresh",
                endpoint, status
            ));
            if !self.auth.refresh_after_rejection(token.as_deref()).await? {
                self.logger
                    .error(&format!("{} failed: could not refresh access token", endpoint));
                return Ok(None);
            }
            retries += 1;
        }
    }
}
