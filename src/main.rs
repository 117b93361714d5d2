use clap::Parser;
use mtg_card_bot::app::console::ConsoleAdapter;
use mtg_card_bot::core::ConfigProvider;
use mtg_card_bot::utils::error::ErrorSeverity;
use mtg_card_bot::utils::logger;
use mtg_card_bot::utils::validation::validate_provider;
use mtg_card_bot::{BotError, CliConfig, LookupEngine, RateGate, ScryfallTransport, TomlConfig};
use std::sync::Arc;
use tokio::io::BufReader;

fn exit_with(e: &BotError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 有指定 TOML 檔就以檔案為準
    let config: Box<dyn ConfigProvider> = match &cli.config {
        Some(path) => Box::new(TomlConfig::from_file(path).unwrap_or_else(|e| exit_with(&e))),
        None => Box::new(cli.clone()),
    };

    if let Err(e) = validate_provider(&*config) {
        exit_with(&e);
    }

    logger::init_logger(config.log_level(), config.json_logging());
    tracing::info!(
        base_url = config.base_url(),
        min_interval_secs = config.min_request_interval_secs(),
        cooldown_secs = config.cooldown_secs(),
        "Starting MTG card bot"
    );

    let gate = Arc::new(RateGate::from_secs_f64(config.min_request_interval_secs()));
    let transport = match ScryfallTransport::from_config(&*config, gate) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            tracing::error!("❌ Failed to build HTTP client: {}", e);
            exit_with(&e);
        }
    };
    let engine = LookupEngine::from_config(transport, &*config);
    let console = ConsoleAdapter::new(engine, cli.requester.clone());

    if !cli.query.is_empty() {
        // 多個 --query 視為同一則訊息的批次
        let message = cli.query.join("; ");
        for block in console.handle_line(&message).await {
            println!("{}\n", block);
        }
        return Ok(());
    }

    console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
