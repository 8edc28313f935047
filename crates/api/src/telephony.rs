use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::TelephonyConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedCall {
    pub call_sid: String,
    pub status: String,
}

/// Places an outbound call that starts at the entry route.
#[async_trait]
pub trait CallOriginator: Send + Sync {
    async fn originate(&self) -> Result<PlacedCall>;
}

#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
    status: String,
}

#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: Client,
    config: TelephonyConfig,
}

impl TwilioClient {
    pub fn new(config: TelephonyConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, config })
    }

    /// Joins below the configured base, keeping any path prefix it carries.
    fn calls_endpoint(&self) -> Result<url::Url> {
        let mut base = self.config.api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(&format!(
            "2010-04-01/Accounts/{}/Calls.json",
            self.config.account_sid
        ))
        .context("failed to build calls endpoint")
    }
}

#[async_trait]
impl CallOriginator for TwilioClient {
    async fn originate(&self) -> Result<PlacedCall> {
        let endpoint = self.calls_endpoint()?;

        let response = self
            .http
            .post(endpoint)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", self.config.callee_number.as_str()),
                ("From", self.config.caller_number.as_str()),
                ("Url", self.config.callback_url.as_str()),
            ])
            .send()
            .await
            .context("call origination request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "call origination rejected with status {}: {}",
                status.as_u16(),
                body
            );
        }

        let call = response
            .json::<CallResource>()
            .await
            .context("failed to parse call origination response")?;

        info!(call_sid = %call.sid, status = %call.status, "outbound call placed");

        Ok(PlacedCall {
            call_sid: call.sid,
            status: call.status,
        })
    }
}
