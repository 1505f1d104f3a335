use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub credentials: CredentialConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Per-backend tables, handed verbatim to the backend's `initialize`.
    #[serde(default)]
    pub backends: Option<toml::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            backend: default_backend(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialConfig {
    #[serde(default = "default_env_var")]
    pub env_var: Option<String>,

    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            env_var: default_env_var(),
            store_path: default_store_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_voice")]
    pub default_voice: String,

    #[serde(default = "default_style")]
    pub default_style: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_voice: default_voice(),
            default_style: default_style(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VideoConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    #[serde(default)]
    pub max_attempts: Option<u32>,

    #[serde(default = "default_video_prompt")]
    pub default_prompt: String,
}

impl VideoConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: None,
            max_attempts: None,
            default_prompt: default_video_prompt(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "gemini".to_string()
}

fn default_env_var() -> Option<String> {
    Some("GEMINI_API_KEY".to_string())
}

fn default_store_path() -> String {
    ".promocast/api-key".to_string()
}

fn default_voice() -> String {
    "Kore".to_string()
}

fn default_style() -> String {
    "affiliate-friendly".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_video_prompt() -> String {
    "animate this image".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid");
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        }
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// The `[backends.<name>]` table, or an empty table when none is configured.
    pub fn backend_table(&self, name: &str) -> toml::Value {
        self.backends
            .as_ref()
            .and_then(|b| b.get(name))
            .cloned()
            .unwrap_or_else(|| toml::Value::Table(Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse_valid_toml() {
        let toml_str = r#"
[general]
log_level = "debug"
backend = "null"

[credentials]
env_var = "MY_KEY"
store_path = "/tmp/promocast/key"

[speech]
default_voice = "Puck"
default_style = "urgent"

[video]
poll_interval_secs = 5
max_wait_secs = 600
max_attempts = 40
default_prompt = "make it move"

[output]
dir = "out"

[backends.gemini]
base_url = "http://localhost:8080"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.backend, "null");
        assert_eq!(config.credentials.env_var.as_deref(), Some("MY_KEY"));
        assert_eq!(config.credentials.store_path, "/tmp/promocast/key");
        assert_eq!(config.speech.default_voice, "Puck");
        assert_eq!(config.speech.default_style, "urgent");
        assert_eq!(config.video.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.video.max_wait(), Some(Duration::from_secs(600)));
        assert_eq!(config.video.max_attempts, Some(40));
        assert_eq!(config.video.default_prompt, "make it move");
        assert_eq!(config.output.dir, "out");
        assert_eq!(
            config.backend_table("gemini").get("base_url").unwrap().as_str(),
            Some("http://localhost:8080")
        );
    }

    #[test]
    fn test_config_default_values() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.backend, "gemini");
        assert_eq!(config.credentials.env_var.as_deref(), Some("GEMINI_API_KEY"));
        assert_eq!(config.credentials.store_path, ".promocast/api-key");
        assert_eq!(config.speech.default_voice, "Kore");
        assert_eq!(config.speech.default_style, "affiliate-friendly");
        assert_eq!(config.video.poll_interval(), Duration::from_secs(10));
        assert!(config.video.max_wait().is_none());
        assert!(config.video.max_attempts.is_none());
        assert_eq!(config.video.default_prompt, "animate this image");
        assert_eq!(config.output.dir, ".");
        assert!(config.backends.is_none());
    }

    #[test]
    fn test_config_missing_backend_table_is_empty() {
        let config = AppConfig::from_toml_str("").unwrap();
        let table = config.backend_table("gemini");
        assert!(table.as_table().unwrap().is_empty());
    }

    #[test]
    fn test_config_env_var_interpolation() {
        std::env::set_var("PROMOCAST_TEST_LEVEL", "trace");
        let toml_str = r#"
[general]
log_level = "${PROMOCAST_TEST_LEVEL}"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "trace");
        std::env::remove_var("PROMOCAST_TEST_LEVEL");
    }

    #[test]
    fn test_config_missing_env_var_error() {
        let toml_str = r#"
[backends.gemini]
base_url = "${DEFINITELY_DOES_NOT_EXIST_12345}"
"#;
        let err = AppConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let result = AppConfig::from_toml_str("this is not valid toml [[[");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = std::env::temp_dir().join("promocast_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "warn"

[video]
max_attempts = 3
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.video.max_attempts, Some(3));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_load_from_file_not_found() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read config file"));
    }

    #[test]
    fn test_config_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/promocast.toml")).unwrap();
        assert_eq!(config.general.backend, "gemini");
    }
}
