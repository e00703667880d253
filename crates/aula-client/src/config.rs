//! Client configuration sourced from the environment or built explicitly.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// API base URL used when `AULA_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
/// Transport timeout used when `AULA_HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_API_URL: &str = "AULA_API_URL";
const ENV_TIMEOUT: &str = "AULA_HTTP_TIMEOUT_SECS";
const ENV_REFRESH_POLICY: &str = "AULA_REFRESH_POLICY";

/// Errors raised while assembling a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL could not be parsed or cannot carry a path.
    #[error("invalid API base URL")]
    InvalidUrl {
        /// Offending value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// Timeout was not a positive number of seconds.
    #[error("invalid HTTP timeout")]
    InvalidTimeout {
        /// Offending value.
        value: String,
    },
    /// Refresh policy label was not recognised.
    #[error("invalid refresh policy")]
    InvalidRefreshPolicy {
        /// Offending value.
        value: String,
    },
    /// Request id cannot be sent as a header value.
    #[error("invalid request id")]
    InvalidRequestId {
        /// Offending value.
        value: String,
    },
}

/// How concurrent requests that hit a 401 coordinate token refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Every failing request runs its own refresh exchange.
    #[default]
    PerRequest,
    /// Exchanges are serialised; late callers reuse a token refreshed by an
    /// earlier caller.
    Shared,
}

impl RefreshPolicy {
    /// Configuration label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerRequest => "per-request",
            Self::Shared => "shared",
        }
    }
}

impl Display for RefreshPolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RefreshPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per-request" | "per_request" => Ok(Self::PerRequest),
            "shared" => Ok(Self::Shared),
            _ => Err(ConfigError::InvalidRefreshPolicy {
                value: value.to_string(),
            }),
        }
    }
}

/// Settings for [`crate::AulaClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root; resource paths are appended to its path.
    pub base_url: Url,
    /// Transport timeout applied to every request.
    pub timeout: Duration,
    /// Refresh coordination strategy.
    pub refresh_policy: RefreshPolicy,
    /// Value sent as `x-request-id` on every request.
    pub request_id: Option<String>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            refresh_policy: RefreshPolicy::PerRequest,
            request_id: None,
        }
    }

    /// Read `AULA_API_URL`, `AULA_HTTP_TIMEOUT_SECS` and `AULA_REFRESH_POLICY`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL)
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| parse_base_url(DEFAULT_API_URL), |raw| parse_base_url(&raw))?;

        let timeout = match lookup(ENV_TIMEOUT) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let refresh_policy = match lookup(ENV_REFRESH_POLICY) {
            Some(raw) => raw.parse()?,
            None => RefreshPolicy::default(),
        };

        Ok(Self {
            base_url,
            timeout,
            refresh_policy,
            request_id: None,
        })
    }

    /// Replace the transport timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the refresh policy.
    #[must_use]
    pub const fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Tag every request with the given `x-request-id`.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Parse an API base URL, normalising away a trailing slash.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUrl`] when the input is not an absolute
/// http(s) URL.
pub fn parse_base_url(input: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        value: input.to_string(),
        reason,
    };
    let mut url = Url::parse(input.trim()).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".to_string()));
    }
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidTimeout {
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() -> Result<(), ConfigError> {
        let config = ClientConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_policy, RefreshPolicy::PerRequest);
        Ok(())
    }

    #[test]
    fn environment_overrides_are_honoured() -> Result<(), ConfigError> {
        let config = ClientConfig::from_lookup(lookup(&[
            ("AULA_API_URL", "https://aula.example.org/api/"),
            ("AULA_HTTP_TIMEOUT_SECS", "30"),
            ("AULA_REFRESH_POLICY", "Shared"),
        ]))?;
        assert_eq!(config.base_url.path(), "/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.refresh_policy, RefreshPolicy::Shared);
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("AULA_HTTP_TIMEOUT_SECS", "0")])),
            Err(ConfigError::InvalidTimeout { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("AULA_REFRESH_POLICY", "eager")])),
            Err(ConfigError::InvalidRefreshPolicy { .. })
        ));
        assert!(matches!(
            parse_base_url("mailto:someone@example.org"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn refresh_policy_labels_round_trip() {
        for policy in [RefreshPolicy::PerRequest, RefreshPolicy::Shared] {
            assert_eq!(policy.as_str().parse::<RefreshPolicy>().ok(), Some(policy));
        }
    }
}
