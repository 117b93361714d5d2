use super::*;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_provider, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub scryfall: ScryfallSection,
    pub limits: LimitsSection,
    pub bot: BotSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScryfallSection {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub min_request_interval_secs: Option<f64>,
    pub request_timeout_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsSection {
    pub cooldown_secs: Option<f64>,
    pub dedup_window_secs: Option<f64>,
    pub max_batch_requests: Option<usize>,
    pub max_concurrent_resolvers: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotSection {
    pub command_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MTG_SCRYFALL_BASE_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url(&self) -> &str {
        self.scryfall.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn user_agent(&self) -> &str {
        self.scryfall.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    fn command_prefix(&self) -> &str {
        self.bot.command_prefix.as_deref().unwrap_or(DEFAULT_COMMAND_PREFIX)
    }

    fn min_request_interval_secs(&self) -> f64 {
        self.scryfall
            .min_request_interval_secs
            .unwrap_or(DEFAULT_MIN_REQUEST_INTERVAL_SECS)
    }

    fn request_timeout_secs(&self) -> f64 {
        self.scryfall
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    fn cooldown_secs(&self) -> f64 {
        self.limits.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS)
    }

    fn dedup_window_secs(&self) -> f64 {
        self.limits.dedup_window_secs.unwrap_or(DEFAULT_DEDUP_WINDOW_SECS)
    }

    fn max_batch_requests(&self) -> usize {
        self.limits
            .max_batch_requests
            .unwrap_or(DEFAULT_MAX_BATCH_REQUESTS)
    }

    fn max_concurrent_resolvers(&self) -> usize {
        self.limits
            .max_concurrent_resolvers
            .unwrap_or(DEFAULT_MAX_CONCURRENT_RESOLVERS)
    }

    fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    fn json_logging(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[scryfall]
base_url = "http://localhost:9000"
user_agent = "TestBot/1.0"
min_request_interval_secs = 0.2
request_timeout_secs = 5.0

[limits]
cooldown_secs = 3.0
dedup_window_secs = 1.5
max_batch_requests = 4
max_concurrent_resolvers = 2

[bot]
command_prefix = "?"

[logging]
level = "debug"
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.user_agent(), "TestBot/1.0");
        assert_eq!(config.min_request_interval_secs(), 0.2);
        assert_eq!(config.request_timeout_secs(), 5.0);
        assert_eq!(config.cooldown_secs(), 3.0);
        assert_eq!(config.dedup_window_secs(), 1.5);
        assert_eq!(config.max_batch_requests(), 4);
        assert_eq!(config.max_concurrent_resolvers(), 2);
        assert_eq!(config.command_prefix(), "?");
        assert_eq!(config.log_level(), "debug");
        assert!(config.json_logging());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.base_url(), "https://api.scryfall.com");
        assert_eq!(config.command_prefix(), "!");
        assert_eq!(config.cooldown_secs(), 2.0);
        assert_eq!(config.dedup_window_secs(), 2.5);
        assert_eq!(config.max_concurrent_resolvers(), 4);
        assert!(!config.json_logging());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MTG_TEST_SCRYFALL_URL", "https://mirror.example.com");

        let toml_content = r#"
[scryfall]
base_url = "${MTG_TEST_SCRYFALL_URL}"
user_agent = "${MTG_TEST_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.base_url(), "https://mirror.example.com");
        assert_eq!(config.user_agent(), "${MTG_TEST_UNSET_VARIABLE}");

        std::env::remove_var("MTG_TEST_SCRYFALL_URL");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[scryfall]
base_url = "invalid-url"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[limits]\nmax_batch_requests = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[logging]\nlevel = \"chatty\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[limits\ncooldown_secs = ").unwrap_err();
        assert!(matches!(err, BotError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[bot]\ncommand_prefix = \"mtg!\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.command_prefix(), "mtg!");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TomlConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, BotError::IoError(_)));
    }
}
