use hotsearch_core::{
    ContentFetcher, Credentials, FieldMap, HotSearchError, HotSearchResult, TrendTable,
    UpstreamConfig,
};
use hotsearch_mcp::Dispatcher;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Environment variables holding the credential pair, newest name first.
const ID_VARS: &[&str] = &["HOT_CONTENT_API_ID", "BAIDU_API_ID"];
const KEY_VARS: &[&str] = &["HOT_CONTENT_API_KEY", "BAIDU_API_KEY"];

/// Interval between SSE heartbeat events.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Where the credentials were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File(PathBuf),
}

/// Resolved and validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub credentials: Credentials,
    pub source: CredentialSource,
    pub upstream: UpstreamConfig,
    pub fields: FieldMap,
    pub trends: TrendTable,
}

/// On-disk JSON layout.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default, alias = "baidu_api")]
    api: Option<ApiSection>,

    #[serde(default)]
    upstream: UpstreamConfig,

    #[serde(default)]
    fields: FieldMap,

    #[serde(default)]
    trends: TrendTable,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    #[serde(default)]
    id: String,
    #[serde(default)]
    key: String,
}

impl ServerConfig {
    /// Load configuration from the process environment and `config_path`.
    pub fn load(config_path: &Path) -> HotSearchResult<Self> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// Environment credentials win over the file's `api` block. The file is
    /// optional when the environment supplies both values; its `upstream`,
    /// `fields` and `trends` sections apply either way.
    pub fn load_with_env(
        config_path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> HotSearchResult<Self> {
        let file = if config_path.exists() {
            let content = std::fs::read_to_string(config_path).map_err(|e| {
                HotSearchError::ConfigInvalid(format!(
                    "failed to read {}: {}",
                    config_path.display(),
                    e
                ))
            })?;
            let file: ConfigFile = serde_json::from_str(&content).map_err(|e| {
                HotSearchError::ConfigInvalid(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?;
            Some(file)
        } else {
            None
        };

        let env_credentials = first_set(&env, ID_VARS).zip(first_set(&env, KEY_VARS));

        let (credentials, source) = match (env_credentials, &file) {
            (Some((id, key)), _) => (Credentials::new(&id, &key)?, CredentialSource::Environment),
            (None, Some(ConfigFile { api: Some(api), .. })) => (
                Credentials::new(&api.id, &api.key)?,
                CredentialSource::File(config_path.to_path_buf()),
            ),
            (None, Some(_)) => {
                return Err(HotSearchError::ConfigInvalid(format!(
                    "{} has no `api` block with id and key",
                    config_path.display()
                )))
            }
            (None, None) => {
                return Err(HotSearchError::ConfigInvalid(format!(
                    "config file {} does not exist and {} / {} are not set",
                    config_path.display(),
                    ID_VARS[0],
                    KEY_VARS[0]
                )))
            }
        };

        let file = file.unwrap_or_default();
        Ok(Self {
            credentials,
            source,
            upstream: file.upstream,
            fields: file.fields,
            trends: file.trends,
        })
    }

    /// Build the process-wide fetcher from this configuration.
    pub fn build_fetcher(&self) -> HotSearchResult<ContentFetcher> {
        ContentFetcher::builder(self.credentials.clone())
            .endpoint(self.upstream.endpoint.clone())
            .fields(self.fields.clone())
            .trends(self.trends.clone())
            .build()
    }
}

fn first_set(env: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env(name))
        .find(|value| !value.trim().is_empty())
}

/// Application state shared across HTTP handlers
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Cancelled once on shutdown; ends every open event stream
    pub shutdown: CancellationToken,
    pub heartbeat_interval: Duration,
    /// Event streams currently open
    pub open_streams: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, shutdown: CancellationToken) -> Self {
        Self {
            dispatcher,
            shutdown,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rejected(result: HotSearchResult<ServerConfig>) -> bool {
        matches!(result, Err(HotSearchError::ConfigInvalid(_)))
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hotsearch-{}-{}", name, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_environment_wins_over_file() {
        let path = temp_config("env", r#"{"api": {"id": "file-user", "key": "file-key-123"}}"#);
        let env = env_of(&[
            ("HOT_CONTENT_API_ID", "env-user"),
            ("HOT_CONTENT_API_KEY", "env-key-1234"),
        ]);

        let config = ServerConfig::load_with_env(&path, env).unwrap();
        assert_eq!(config.credentials.id(), "env-user");
        assert_eq!(config.source, CredentialSource::Environment);
    }

    #[test]
    fn test_legacy_names_are_accepted() {
        let env = env_of(&[("BAIDU_API_ID", "old-user"), ("BAIDU_API_KEY", "old-key-1234")]);
        let config = ServerConfig::load_with_env(Path::new("/nonexistent/config.json"), env).unwrap();
        assert_eq!(config.credentials.id(), "old-user");

        let path = temp_config("legacy", r#"{"baidu_api": {"id": "file-user", "key": "file-key-123"}}"#);
        let config = ServerConfig::load_with_env(&path, env_of(&[])).unwrap();
        assert_eq!(config.credentials.key(), "file-key-123");
        assert_eq!(config.source, CredentialSource::File(path));
    }

    #[test]
    fn test_partial_environment_falls_back_to_file() {
        let path = temp_config("partial", r#"{"api": {"id": "file-user", "key": "file-key-123"}}"#);
        let env = env_of(&[("HOT_CONTENT_API_ID", "env-user")]);

        let config = ServerConfig::load_with_env(&path, env).unwrap();
        assert_eq!(config.credentials.id(), "file-user");
    }

    #[test]
    fn test_file_sections_override_defaults() {
        let path = temp_config(
            "sections",
            r#"{
                "api": {"id": "file-user", "key": "file-key-123"},
                "upstream": {"endpoint": "http://localhost:9999/hot"},
                "fields": {"title": ["headline"]},
                "trends": {"unknown": "?"}
            }"#,
        );

        let config = ServerConfig::load_with_env(&path, env_of(&[])).unwrap();
        assert_eq!(config.upstream.endpoint.as_str(), "http://localhost:9999/hot");
        assert_eq!(config.fields.title, vec!["headline".to_string()]);
        assert_eq!(config.trends.unknown, "?");
        assert!(config.build_fetcher().is_ok());
    }

    #[test]
    fn test_invalid_configurations_are_rejected() {
        let missing = ServerConfig::load_with_env(Path::new("/nonexistent/config.json"), env_of(&[]));
        assert!(rejected(missing));

        let malformed = temp_config("malformed", "{not json");
        assert!(rejected(ServerConfig::load_with_env(&malformed, env_of(&[]))));

        let no_api = temp_config("noapi", "{}");
        assert!(rejected(ServerConfig::load_with_env(&no_api, env_of(&[]))));

        let placeholder = temp_config(
            "placeholder",
            r#"{"api": {"id": "your_user_id", "key": "your_api_key"}}"#,
        );
        assert!(rejected(ServerConfig::load_with_env(&placeholder, env_of(&[]))));
    }
}
