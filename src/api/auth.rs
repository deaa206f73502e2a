//! Authentication against the fleet gateway
//!
//! Login is a two step SMS flow (`request_code`, then `exchange_code`).
//! The resulting access token lives only in memory; the refresh token is
//! handed to the host's [`CredentialSink`] every time the gateway rotates it.

use super::endpoints::Endpoint;
use super::transport::{self, APP_ID_HEADER, REFRESH_COOKIE};
use super::types::TokenBody;
use crate::config::ApiConfig;
use crate::credentials::{CredentialSink, StoredCredential};
use crate::error::{ElectroCarsError, Result};
use crate::logging::get_logger;
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Where the login flow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    CodeSent,
    Authenticated,
}

/// Credential triple as exposed to the login UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub phone: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credential {
    /// The part the host is allowed to persist
    pub fn to_stored(&self) -> StoredCredential {
        StoredCredential::new(self.phone.clone(), self.refresh_token.clone())
    }
}

#[derive(Debug, Default)]
struct TokenState {
    phone: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    code_sent: bool,
}

/// Owns the HTTP session and the access/refresh token pair
pub struct AuthClient {
    config: ApiConfig,
    http: OnceCell<reqwest::Client>,
    tokens: Mutex<TokenState>,
    /// Serializes every refresh so concurrent rejections refresh once
    refresh_lock: tokio::sync::Mutex<()>,
    sink: Option<Arc<dyn CredentialSink>>,
    /// Feeds the single writer task, started on the first rotation
    persist_tx: OnceCell<mpsc::UnboundedSender<StoredCredential>>,
    logger: crate::logging::StructuredLogger,
}

impl AuthClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: OnceCell::new(),
            tokens: Mutex::new(TokenState::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
            sink: None,
            persist_tx: OnceCell::new(),
            logger: get_logger("auth"),
        }
    }

    /// Attach the callback that persists rotated refresh tokens
    pub fn with_credential_sink(mut self, sink: Arc<dyn CredentialSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Shared HTTP session, created on first use
    pub fn http(&self) -> Result<&reqwest::Client> {
        self.http
            .get_or_try_init(|| transport::build_http_client(self.config.request_timeout()))
    }

    fn tokens(&self) -> MutexGuard<'_, TokenState> {
        self.tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed phone and refresh token from the host store
    pub fn restore(&self, stored: &StoredCredential) {
        let mut tokens = self.tokens();
        tokens.phone = stored.phone.clone();
        tokens.refresh_token = stored.refresh_token.clone().filter(|t| !t.trim().is_empty());
        tokens.access_token = None;
        tokens.code_sent = false;
    }

    /// Obtain the first access token after a restart
    pub async fn initialize(&self) -> Result<bool> {
        if self.access_token().is_some() {
            return Ok(true);
        }
        if self.refresh_token().is_none() {
            self.logger
                .info("No refresh token stored, waiting for SMS login");
            return Ok(false);
        }
        self.refresh().await
    }

    pub fn state(&self) -> AuthState {
        let tokens = self.tokens();
        if tokens.access_token.is_some() || tokens.refresh_token.is_some() {
            AuthState::Authenticated
        } else if tokens.code_sent {
            AuthState::CodeSent
        } else {
            AuthState::Unauthenticated
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens().refresh_token.clone()
    }

    pub fn phone(&self) -> Option<String> {
        self.tokens().phone.clone()
    }

    /// Whether an authenticated request can be attempted at all
    pub fn has_credentials(&self) -> bool {
        let tokens = self.tokens();
        tokens.access_token.is_some() || tokens.refresh_token.is_some()
    }

    /// Ask the gateway to text a verification code to `phone`
    pub async fn request_code(&self, phone: &str) -> Result<bool> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(ElectroCarsError::validation("phone", "Phone number is empty"));
        }

        let sent = self
            .http()?
            .post(format!("{}/send-code", self.config.auth_base))
            .header(APP_ID_HEADER, &self.config.app_id)
            .json(&json!({ "phone_number": phone }))
            .send()
            .await;
        let Some(resp) = transport::settle(&self.logger, Endpoint::SendCode, sent)? else {
            return Ok(false);
        };

        if resp.status() != StatusCode::OK {
            transport::log_failure(&self.logger, Endpoint::SendCode, resp).await;
            return Ok(false);
        }

        {
            let mut tokens = self.tokens();
            tokens.phone = Some(phone.to_string());
            tokens.code_sent = true;
        }
        self.logger.debug(&format!("SMS code sent to {}", phone));
        Ok(true)
    }

    /// Trade the SMS code for a token pair.
    ///
    /// Returns `None` unless both the access token (body) and the refresh
    /// token (cookie) are present; nothing is stored in that case.
    pub async fn exchange_code(&self, code: &str) -> Result<Option<Credential>> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ElectroCarsError::validation("code", "Verification code is empty"));
        }
        let Some(phone) = self.phone() else {
            return Err(ElectroCarsError::auth(
                "No phone number pending, request a code first",
            ));
        };

        let sent = self
            .http()?
            .post(format!("{}/token/sms", self.config.auth_base))
            .header(APP_ID_HEADER, &self.config.app_id)
            .json(&json!({ "phone_number": phone, "code": code }))
            .send()
            .await;
        let Some(resp) = transport::settle(&self.logger, Endpoint::TokenSms, sent)? else {
            return Ok(None);
        };

        if !matches!(resp.status(), StatusCode::OK | StatusCode::CREATED) {
            transport::log_failure(&self.logger, Endpoint::TokenSms, resp).await;
            return Ok(None);
        }

        let refresh_token = transport::refresh_cookie(&resp);
        let Some(body) =
            transport::read_json::<TokenBody>(&self.logger, Endpoint::TokenSms, resp).await?
        else {
            return Ok(None);
        };

        let Some(access_token) = body.access_token.filter(|t| !t.is_empty()) else {
            self.logger.error("Login response is missing access_token");
            return Ok(None);
        };
        let Some(refresh_token) = refresh_token else {
            self.logger.error(&format!(
                "Missing {} in login response cookies",
                REFRESH_COOKIE
            ));
            return Ok(None);
        };

        {
            let mut tokens = self.tokens();
            tokens.access_token = Some(access_token.clone());
            tokens.refresh_token = Some(refresh_token.clone());
            tokens.code_sent = false;
        }
        self.logger
            .info(&format!("Login successful for {}", phone));

        Ok(Some(Credential {
            phone: Some(phone),
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        }))
    }

    /// Mint a new access token from the stored refresh token
    pub async fn refresh(&self) -> Result<bool> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh after `rejected` was refused by the API.
    ///
    /// When another task already replaced the token while this one waited
    /// for the lock, the new token is reused and no request is made.
    pub(crate) async fn refresh_after_rejection(&self, rejected: Option<&str>) -> Result<bool> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.access_token()
            && Some(current.as_str()) != rejected
        {
            self.logger
                .debug("Access token already refreshed by a concurrent request");
            return Ok(true);
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<bool> {
        let Some(refresh_token) = self.refresh_token() else {
            self.logger
                .warn("Cannot refresh access token: no refresh token stored");
            return Ok(false);
        };

        let sent = self
            .http()?
            .post(format!("{}/refresh", self.config.auth_base))
            .header(APP_ID_HEADER, &self.config.app_id)
            .header(COOKIE, format!("{}={}", REFRESH_COOKIE, refresh_token))
            .send()
            .await;
        let Some(resp) = transport::settle(&self.logger, Endpoint::Refresh, sent)? else {
            return Ok(false);
        };

        if resp.status() != StatusCode::OK {
            transport::log_failure(&self.logger, Endpoint::Refresh, resp).await;
            return Ok(false);
        }

        let rotated = transport::refresh_cookie(&resp);
        let Some(body) =
            transport::read_json::<TokenBody>(&self.logger, Endpoint::Refresh, resp).await?
        else {
            return Ok(false);
        };
        let Some(access_token) = body.access_token.filter(|t| !t.is_empty()) else {
            self.logger
                .error("Refresh response is missing access_token");
            return Ok(false);
        };

        let persisted = {
            let mut tokens = self.tokens();
            tokens.access_token = Some(access_token);
            match rotated {
                Some(new_refresh) => {
                    tokens.refresh_token = Some(new_refresh.clone());
                    Some(StoredCredential::new(tokens.phone.clone(), Some(new_refresh)))
                }
                None => None,
            }
        };

        match persisted {
            Some(credential) => self.persist(credential),
            None => self
                .logger
                .warn("Refresh response did not include a new refresh_token"),
        }

        self.logger.info("Access token refreshed");
        Ok(true)
    }

    /// Hand a rotated credential to the host without waiting for it.
    ///
    /// Writes go through one queue in rotation order, so a slow write can
    /// never land after a newer one.
    fn persist(&self, credential: StoredCredential) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let tx = self
            .persist_tx
            .get_or_init(|| spawn_credential_writer(sink, self.logger.clone()));
        if tx.send(credential).is_err() {
            self.logger
                .error("Credential writer is gone, rotated refresh token not persisted");
        }
    }
}

fn spawn_credential_writer(
    sink: Arc<dyn CredentialSink>,
    logger: crate::logging::StructuredLogger,
) -> mpsc::UnboundedSender<StoredCredential> {
    let (tx, mut rx) = mpsc::unbounded_channel::<StoredCredential>();
    tokio::spawn(async move {
        while let Some(mut credential) = rx.recv().await {
            // Only the newest queued rotation matters
            while let Ok(newer) = rx.try_recv() {
                credential = newer;
            }
            let sink = sink.clone();
            let written = tokio::task::spawn_blocking(move || sink.store(&credential)).await;
            match written {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    logger.error(&format!("Failed to persist rotated refresh token: {}", e))
                }
                Err(e) => logger.error(&format!("Credential writer task failed: {}", e)),
            }
        }
    });
    tx
}
