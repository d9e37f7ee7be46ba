use std::time::Duration;

use super::api;
use super::types::SendRequest;

use crate::client::{Client, ClientFuture, RawResult};
use crate::config::TransportOptions;
use crate::errors::{Error, Result};

/// reqwest-backed client for the Mailjet API
#[derive(Clone, Debug)]
pub struct MailjetClient {
    api_key: String,
    api_secret: String,
    base_url: String,
    client: reqwest::Client,
}

impl MailjetClient {
    pub fn from_options(options: &TransportOptions) -> Result<Self> {
        let timeout = options.timeout_secs.unwrap_or(api::MAILJET_REQUEST_TIMEOUT);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .user_agent(concat!("mailjet-transport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            api_key: options.auth.api_key.clone(),
            api_secret: options.auth.api_secret.clone(),
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| api::MAILJET_BASE_API.to_string()),
            client,
        })
    }
}

impl Client for MailjetClient {
    fn post<'a>(
        &'a self,
        method: &'a str,
        version: &'a str,
        payload: &'a SendRequest,
    ) -> ClientFuture<'a, RawResult> {
        Box::pin(async move {
            let url = api::build_endpoint_url(&self.base_url, version, method)?;

            log::debug!("POST {} ({} message(s))", url, payload.messages.len());

            let resp = self
                .client
                .post(url)
                .basic_auth(&self.api_key, Some(&self.api_secret))
                .json(payload)
                .send()
                .await?;

            let status = resp.status();
            let text = resp.text().await?;

            // Map response into an error if applicable
            api::map_status(status, text)
        })
    }
}
