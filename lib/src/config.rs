use serde::Deserialize;

use crate::errors::Result;

pub const DEFAULT_PATH: &str = "/etc/mailjet/transport.toml";
const ENV_PREFIX: &str = "MAILJET";

/// API credentials
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Auth {
    #[serde(rename = "apiKey", alias = "apikey", alias = "api_key")]
    pub api_key: String,
    #[serde(rename = "apiSecret", alias = "apisecret", alias = "api_secret")]
    pub api_secret: String,
}

/// Options a transport is constructed with
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TransportOptions {
    pub auth: Auth,
    #[serde(
        rename = "SandboxMode",
        alias = "sandboxmode",
        alias = "sandbox_mode",
        default
    )]
    pub sandbox_mode: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TransportOptions {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            auth: Auth {
                api_key: api_key.into(),
                api_secret: api_secret.into(),
            },
            ..Default::default()
        }
    }

    pub fn with_sandbox_mode(mut self, sandbox_mode: bool) -> Self {
        self.sandbox_mode = sandbox_mode;
        self
    }
}

/// Loads transport options from a TOML file and merges them with any
/// environment variables prefixed with MAILJET_.
///
/// Nested keys use a double underscore, e.g. `MAILJET_AUTH__API_KEY`.
/// A missing file is not an error; missing credentials are.
///
/// See `resources/transport.toml` for a sample config file.
pub fn load_options(path: Option<&str>) -> Result<TransportOptions> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path.unwrap_or(DEFAULT_PATH)).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let options = settings.try_deserialize::<TransportOptions>()?;

    log::debug!(
        "Loaded transport options (sandbox mode: {})",
        options.sandbox_mode
    );

    Ok(options)
}
