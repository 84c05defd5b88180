//! Service configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, Source};
use narwhal_http_client::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};

use crate::auth::Headers;
use crate::error::Error;
use crate::key_path::KeyPath;

/// Prefix of environment variables overriding file settings,
/// e.g. `NARWHAL__BASE_URL`
pub const ENV_PREFIX: &str = "NARWHAL";

/// Settings of one [`crate::HttpService`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Prefix for relative endpoints
    pub base_url: Option<String>,
    /// Default key path of success payloads
    pub value_key_path: Option<KeyPath>,
    /// Default key path of error payloads
    pub error_key_path: Option<KeyPath>,
    /// Headers sent with every request
    pub default_headers: Headers,
    /// Total timeout per request, in seconds
    pub timeout_secs: Option<u64>,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Only proxy hosts matching this pattern
    pub proxy_host_pattern: Option<String>,
}

impl ServiceConfig {
    /// Load from a config file, then apply environment overrides
    ///
    /// The file format follows the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::load(File::from(path.as_ref()).required(true))
    }

    /// Load from TOML text, then apply environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, Error> {
        Self::load(File::from_str(toml, FileFormat::Toml))
    }

    fn load<S>(source: S) -> Result<Self, Error>
    where
        S: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            // use defaults
            .add_source(Config::try_from(&Self::default())?)
            // override with file contents
            .add_source(source)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Transport honouring the TLS, timeout and proxy settings
    pub fn http_client(&self) -> Result<HttpClient, Error> {
        let mut builder =
            HttpClient::builder().danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(proxy) = &self.proxy {
            let proxy = url::Url::parse(proxy)
                .map_err(|e| HttpError::Proxy(format!("Invalid proxy URL: {}", e)))?;
            builder = match &self.proxy_host_pattern {
                Some(pattern) => builder.proxy_with_matcher(proxy, pattern)?,
                None => builder.proxy(proxy),
            };
        }

        Ok(builder.build()?)
    }
}
