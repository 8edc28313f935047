use std::env;
use std::fmt;
use std::path::PathBuf;

use ivr_core::{DemoIdentifiers, Route};
use thiserror::Error;
use url::Url;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_TELEPHONY_API_BASE: &str = "https://api.twilio.com";

const TELEPHONY_KEYS: [&str; 5] = [
    "IVR_ACCOUNT_SID",
    "IVR_AUTH_TOKEN",
    "IVR_CALLER_NUMBER",
    "IVR_CALLEE_NUMBER",
    "IVR_PUBLIC_BASE_URL",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("telephony configuration is incomplete, missing: {0}")]
    IncompleteTelephony(String),

    #[error("invalid url in {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    JsonFile(PathBuf),
    Sqlite(String),
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonFile(path) => write!(f, "json:{}", path.display()),
            Self::Sqlite(url) => write!(f, "{}", url),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelephonyConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub caller_number: String,
    pub callee_number: String,
    /// Entry route the provider fetches once the outbound call connects.
    pub callback_url: Url,
    pub api_base: Url,
}

impl fmt::Debug for TelephonyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelephonyConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("caller_number", &self.caller_number)
            .field("callee_number", &self.callee_number)
            .field("callback_url", &self.callback_url.as_str())
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub record_source: RecordSource,
    pub demo_ids: DemoIdentifiers,
    pub api_key: Option<String>,
    pub telephony: Option<TelephonyConfig>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let record_source = match (read("IVR_DATABASE_URL"), read("IVR_RECORDS_PATH")) {
            (Some(database_url), _) => RecordSource::Sqlite(database_url),
            (None, Some(path)) => RecordSource::JsonFile(PathBuf::from(path)),
            (None, None) => return Err(ConfigError::MissingRequired("IVR_RECORDS_PATH")),
        };

        let defaults = DemoIdentifiers::default();
        let demo_ids = DemoIdentifiers {
            pnr: read("IVR_DEMO_PNR").unwrap_or(defaults.pnr),
            train_number: read("IVR_DEMO_TRAIN").unwrap_or(defaults.train_number),
        };

        let present: Vec<(&'static str, String)> = TELEPHONY_KEYS
            .iter()
            .filter_map(|key| read(*key).map(|value| (*key, value)))
            .collect();

        let telephony = if present.is_empty() {
            None
        } else if present.len() < TELEPHONY_KEYS.len() {
            let missing = TELEPHONY_KEYS
                .iter()
                .filter(|key| !present.iter().any(|(name, _)| name == *key))
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ConfigError::IncompleteTelephony(missing));
        } else {
            let value = |key: &str| {
                present
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            };
            let api_base = read("IVR_TELEPHONY_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEPHONY_API_BASE.to_string());

            Some(TelephonyConfig {
                account_sid: value("IVR_ACCOUNT_SID"),
                auth_token: value("IVR_AUTH_TOKEN"),
                caller_number: value("IVR_CALLER_NUMBER"),
                callee_number: value("IVR_CALLEE_NUMBER"),
                callback_url: entry_callback_url(&value("IVR_PUBLIC_BASE_URL"))?,
                api_base: parse_url("IVR_TELEPHONY_API_BASE", &api_base)?,
            })
        };

        Ok(Self {
            bind: read("IVR_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            record_source,
            demo_ids,
            api_key: read("IVR_API_KEY"),
            telephony,
        })
    }
}

fn entry_callback_url(public_base: &str) -> Result<Url, ConfigError> {
    let joined = format!("{}{}", public_base.trim_end_matches('/'), Route::Voice.path());
    parse_url("IVR_PUBLIC_BASE_URL", &joined)
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        }),
    }
}
