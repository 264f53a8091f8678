use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, bail},
    clap::{Parser, Subcommand},
    secrecy::ExposeSecret,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    tubewatch_config::{SeedSubscription, Severity, TubewatchConfig, ValidationResult},
    tubewatch_telegram::TelegramDispatcher,
    tubewatch_watcher::{SubscribeOutcome, SubscriptionRegistry, WatcherConfig, WatcherService},
    tubewatch_youtube::YoutubeLookup,
};

#[derive(Parser)]
#[command(
    name = "tubewatch",
    about = "tubewatch — Telegram notifications for new YouTube uploads",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "TUBEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between poll cycles (overrides config value).
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Seconds to wait before the first poll cycle (overrides config value).
    #[arg(long, global = true)]
    warmup: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot and the poller (default when no subcommand is provided).
    Run,
    /// Load the configuration, report problems and exit.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<TubewatchConfig> {
    let mut config = match &cli.config {
        Some(path) => tubewatch_config::load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => tubewatch_config::discover_and_load(),
    };
    tubewatch_config::apply_env_overrides(&mut config);
    apply_cli_overrides(cli, &mut config);
    Ok(config)
}

fn apply_cli_overrides(cli: &Cli, config: &mut TubewatchConfig) {
    if let Some(secs) = cli.poll_interval {
        config.poller.poll_interval_seconds = secs;
    }
    if let Some(secs) = cli.warmup {
        config.poller.warmup_seconds = secs;
    }
}

fn print_diagnostics(result: &ValidationResult) {
    for diag in &result.diagnostics {
        eprintln!("{}: {}: {}", diag.severity, diag.path, diag.message);
    }
}

/// Register the configured seeds and return how many were new. Blank
/// entries are skipped.
fn seed_subscriptions(registry: &SubscriptionRegistry, seeds: &[SeedSubscription]) -> usize {
    seeds
        .iter()
        .filter(|s| !s.conversation.trim().is_empty() && !s.channel.trim().is_empty())
        .filter(|s| {
            registry.subscribe(s.conversation.as_str(), s.channel.as_str())
                == SubscribeOutcome::Added
        })
        .count()
}

async fn run(config: TubewatchConfig) -> anyhow::Result<()> {
    let validation = tubewatch_config::validate(&config);
    for diag in &validation.diagnostics {
        match diag.severity {
            Severity::Error => tracing::error!(path = %diag.path, "{}", diag.message),
            Severity::Warning => warn!(path = %diag.path, "{}", diag.message),
        }
    }
    if validation.has_errors() {
        bail!("invalid configuration, run `tubewatch check-config` for details");
    }

    let registry = Arc::new(SubscriptionRegistry::new());
    let seeded = seed_subscriptions(&registry, &config.subscriptions);

    let lookup = Arc::new(YoutubeLookup::new(&config.youtube)?);
    let bot = tubewatch_telegram::build_bot(config.telegram.token.expose_secret())?;
    let dispatcher = Arc::new(TelegramDispatcher::new(bot.clone()));

    let watcher = WatcherService::new(
        Arc::clone(&registry),
        lookup,
        dispatcher,
        WatcherConfig::from(&config.poller),
    );

    let polling = tubewatch_telegram::start_polling(bot, Arc::clone(&registry)).await?;
    watcher.start().await?;
    info!(seeded, "tubewatch running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    polling.cancel();
    watcher.stop().await;

    let status = watcher.status().await;
    info!(
        cycles = status.cycles_completed,
        conversations = status.conversations,
        channels = status.channels_tracked,
        "tubewatch stopped"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "tubewatch starting");

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::CheckConfig) => {
            let result = tubewatch_config::validate(&config);
            print_diagnostics(&result);
            if result.has_errors() {
                bail!("configuration has errors");
            }
            eprintln!("configuration OK");
            Ok(())
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_poller_config() {
        let cli = Cli::try_parse_from([
            "tubewatch",
            "--poll-interval",
            "15",
            "--warmup",
            "0",
            "run",
        ])
        .unwrap();
        let mut config = TubewatchConfig::default();
        apply_cli_overrides(&cli, &mut config);
        assert_eq!(config.poller.poll_interval_seconds, 15);
        assert_eq!(config.poller.warmup_seconds, 0);
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn seeding_counts_only_registered_pairs() {
        let seed = |conversation: &str, channel: &str| SeedSubscription {
            conversation: conversation.into(),
            channel: channel.into(),
        };
        let registry = SubscriptionRegistry::new();
        let seeded = seed_subscriptions(&registry, &[
            seed("42", "UC1"),
            seed("  ", "UC2"),
            seed("42", ""),
            seed("42", "UC1"),
            seed("7", "UC1"),
        ]);
        assert_eq!(seeded, 2);
        assert_eq!(registry.conversation_count(), 2);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["tubewatch", "check-config"]).unwrap();
        let mut config = TubewatchConfig::default();
        apply_cli_overrides(&cli, &mut config);
        assert_eq!(config.poller, tubewatch_config::PollerConfig::default());
    }
}
