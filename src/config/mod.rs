pub mod toml_config;

pub use crate::adapters::scryfall::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

pub const DEFAULT_COMMAND_PREFIX: &str = "!";
/// 10 calls per second.
pub const DEFAULT_MIN_REQUEST_INTERVAL_SECS: f64 = 0.1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_COOLDOWN_SECS: f64 = 2.0;
pub const DEFAULT_DEDUP_WINDOW_SECS: f64 = 2.5;
pub const DEFAULT_MAX_BATCH_REQUESTS: usize = 10;
pub const DEFAULT_MAX_CONCURRENT_RESOLVERS: usize = 4;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use crate::domain::ports::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_provider, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "mtg-card-bot")]
    #[command(about = "Magic: The Gathering card lookups backed by Scryfall")]
    pub struct CliConfig {
        /// Load settings from a TOML file instead of flags
        #[arg(short, long, env = "MTG_CONFIG_FILE")]
        pub config: Option<String>,

        /// Resolve these messages and exit instead of reading stdin
        #[arg(short, long)]
        pub query: Vec<String>,

        /// Requester id used for console messages
        #[arg(long, default_value = "console")]
        pub requester: String,

        #[arg(long, env = "MTG_SCRYFALL_BASE_URL", default_value = DEFAULT_BASE_URL)]
        pub base_url: String,

        #[arg(long, env = "MTG_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
        pub user_agent: String,

        #[arg(long, env = "MTG_COMMAND_PREFIX", default_value = DEFAULT_COMMAND_PREFIX)]
        pub command_prefix: String,

        #[arg(long, env = "MTG_MIN_REQUEST_INTERVAL", default_value_t = DEFAULT_MIN_REQUEST_INTERVAL_SECS)]
        pub min_request_interval_secs: f64,

        #[arg(long, env = "MTG_REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
        pub request_timeout_secs: f64,

        #[arg(long, env = "MTG_COMMAND_COOLDOWN", default_value_t = DEFAULT_COOLDOWN_SECS)]
        pub cooldown_secs: f64,

        #[arg(long, env = "MTG_DEDUP_WINDOW", default_value_t = DEFAULT_DEDUP_WINDOW_SECS)]
        pub dedup_window_secs: f64,

        #[arg(long, env = "MTG_MAX_BATCH", default_value_t = DEFAULT_MAX_BATCH_REQUESTS)]
        pub max_batch_requests: usize,

        #[arg(long, env = "MTG_MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT_RESOLVERS)]
        pub max_concurrent_resolvers: usize,

        #[arg(long, env = "MTG_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
        pub log_level: String,

        /// Emit JSON log lines
        #[arg(long, env = "MTG_JSON_LOGGING")]
        pub json_logging: bool,
    }

    impl ConfigProvider for CliConfig {
        fn base_url(&self) -> &str {
            &self.base_url
        }

        fn user_agent(&self) -> &str {
            &self.user_agent
        }

        fn command_prefix(&self) -> &str {
            &self.command_prefix
        }

        fn min_request_interval_secs(&self) -> f64 {
            self.min_request_interval_secs
        }

        fn request_timeout_secs(&self) -> f64 {
            self.request_timeout_secs
        }

        fn cooldown_secs(&self) -> f64 {
            self.cooldown_secs
        }

        fn dedup_window_secs(&self) -> f64 {
            self.dedup_window_secs
        }

        fn max_batch_requests(&self) -> usize {
            self.max_batch_requests
        }

        fn max_concurrent_resolvers(&self) -> usize {
            self.max_concurrent_resolvers
        }

        fn log_level(&self) -> &str {
            &self.log_level
        }

        fn json_logging(&self) -> bool {
            self.json_logging
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_provider(self)
        }
    }

}

#[cfg(feature = "cli")]
pub use cli::CliConfig;
