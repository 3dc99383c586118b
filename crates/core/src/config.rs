// Upstream credentials and endpoint settings

use crate::error::{HotSearchError, HotSearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default upstream endpoint serving the hot-search list.
pub const DEFAULT_ENDPOINT: &str = "https://cn.apihz.cn/api/xinwen/baidu.php";

/// Fixed per-request timeout for the upstream call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed user agent sent to the upstream.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const MIN_ID_LEN: usize = 3;
const MIN_KEY_LEN: usize = 8;
const PLACEHOLDER_IDS: &[&str] = &["your_user_id", "your-user-id", "example_id"];
const PLACEHOLDER_KEYS: &[&str] = &["your_api_key", "your-api-key", "example_key"];

/// Validated `{id, key}` pair appended to every upstream request.
///
/// The only way to obtain one is [`Credentials::new`], so holding a value
/// means validation already passed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    id: String,
    key: String,
}

impl Credentials {
    /// Trim and validate a raw credential pair.
    pub fn new(id: &str, key: &str) -> HotSearchResult<Self> {
        let id = id.trim();
        let key = key.trim();

        if id.is_empty() {
            return Err(HotSearchError::ConfigInvalid(
                "api.id must be a non-empty string".to_string(),
            ));
        }
        if key.is_empty() {
            return Err(HotSearchError::ConfigInvalid(
                "api.key must be a non-empty string".to_string(),
            ));
        }
        if PLACEHOLDER_IDS.contains(&id) {
            return Err(HotSearchError::ConfigInvalid(format!(
                "api.id `{}` is a placeholder, set your real user id",
                id
            )));
        }
        if PLACEHOLDER_KEYS.contains(&key) {
            return Err(HotSearchError::ConfigInvalid(
                "api.key is a placeholder, set your real api key".to_string(),
            ));
        }
        if id.chars().count() < MIN_ID_LEN {
            return Err(HotSearchError::ConfigInvalid(format!(
                "api.id must be at least {} characters",
                MIN_ID_LEN
            )));
        }
        if key.chars().count() < MIN_KEY_LEN {
            return Err(HotSearchError::ConfigInvalid(format!(
                "api.key must be at least {} characters",
                MIN_KEY_LEN
            )));
        }

        Ok(Self {
            id: id.to_string(),
            key: key.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loggable form, e.g. `abc***` / `abcd***`.
    pub fn masked(&self) -> String {
        let id: String = self.id.chars().take(MIN_ID_LEN).collect();
        let key: String = self.key.chars().take(4).collect();
        format!("id={}***, key={}***", id, key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Upstream endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,
}

fn default_endpoint() -> Url {
    // The constant is a valid absolute URL
    Url::parse(DEFAULT_ENDPOINT).unwrap()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credentials_are_trimmed() {
        let creds = Credentials::new("  user42 ", "\tsecret-key-123\n").unwrap();
        assert_eq!(creds.id(), "user42");
        assert_eq!(creds.key(), "secret-key-123");
    }

    #[test]
    fn test_rejects_short_values() {
        assert!(matches!(
            Credentials::new("ab", "long-enough-key"),
            Err(HotSearchError::ConfigInvalid(_))
        ));
        assert!(matches!(
            Credentials::new("user42", "short"),
            Err(HotSearchError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_placeholder_values() {
        for (id, key) in [
            ("", "secret-key-123"),
            ("user42", "   "),
            ("your_user_id", "secret-key-123"),
            ("example_id", "secret-key-123"),
            ("user42", "your-api-key"),
            ("user42", "example_key"),
        ] {
            let err = Credentials::new(id, key).unwrap_err();
            assert!(
                matches!(err, HotSearchError::ConfigInvalid(_)),
                "{id:?}/{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_key_never_leaks() {
        let creds = Credentials::new("user42", "secret-key-123").unwrap();

        assert!(!format!("{:?}", creds).contains("secret-key-123"));
        assert_eq!(creds.masked(), "id=use***, key=secr***");
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(UpstreamConfig::default().endpoint.as_str(), DEFAULT_ENDPOINT);
    }
}
