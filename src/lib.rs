pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::scryfall::ScryfallTransport;
pub use config::toml_config::TomlConfig;
pub use self::core::{engine::LookupEngine, parser::QueryParser, rate_gate::RateGate};
pub use domain::model::{MessageResolution, ParsedRequest, RawMessage, ResolutionOutcome};
pub use utils::error::{BotError, Result};
