use std::sync::Arc;

use anyhow::Context;
use teloxide::types::ChatId;
use teloxide::Bot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, EngineCommand, EngineState, Notifier};
use engine::{Engine, ExchangeMarketData, TradingConfig};
use telegram_ctrl::{start_bot, BotDeps, DisabledNotifier, TelegramNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid environment configuration")?;
    let trading = TradingConfig::load(&cfg.trading_config_path)?;
    info!(
        strategy = %trading.strategy.name,
        markets = ?trading.qualified_markets(),
        interval_minutes = trading.analysis_interval_minutes,
        "CycleBot starting"
    );

    // ── Market data ───────────────────────────────────────────────────────────
    let provider = Arc::new(
        ExchangeMarketData::from_urls(&cfg.upbit_api_url, &cfg.binance_api_url)
            .context("failed to build exchange clients")?,
    );

    // ── Notifications ─────────────────────────────────────────────────────────
    let (notifier, bot): (Arc<dyn Notifier>, Option<(Bot, i64)>) = match cfg.telegram() {
        Some((token, chat_id)) => {
            let bot = Bot::new(token);
            (
                Arc::new(TelegramNotifier::new(bot.clone(), chat_id)),
                Some((bot, chat_id)),
            )
        }
        None => {
            info!("Telegram not configured, reports go to the log only");
            (Arc::new(DisabledNotifier), None)
        }
    };

    let strategy_name = trading.strategy.name.clone();
    let interval_minutes = trading.analysis_interval_minutes;

    // ── Engine ────────────────────────────────────────────────────────────────
    let (engine, handle) = Engine::new(trading, provider, notifier.clone());
    let mut engine_task = tokio::spawn(engine.run());

    let started = handle.wait_started().await != EngineState::Stopped;
    if started {
        let text = format!(
            "🚀 <b>CycleBot started</b>\nStrategy: {}\nMarkets: {}\nInterval: {} min",
            strategy_name,
            handle.markets().await.join(", "),
            interval_minutes
        );
        if let Err(e) = notifier.notify(&text).await {
            warn!(error = %e, "Failed to send start notification");
        }
    }

    // ── Query API ─────────────────────────────────────────────────────────────
    let api_state = api::AppState { engine: handle.clone() };
    let port = cfg.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "Query API stopped");
        }
    });

    // ── Telegram commands ─────────────────────────────────────────────────────
    if let Some((bot, chat_id)) = bot {
        let deps = BotDeps {
            engine: handle.clone(),
            allowed_chat: ChatId(chat_id),
        };
        tokio::spawn(start_bot(bot, deps));
    }

    info!("All subsystems started. Waiting for shutdown signal.");
    let outcome = tokio::select! {
        res = &mut engine_task => res,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received, stopping engine");
            handle.send(EngineCommand::Stop).await;
            engine_task.await
        }
    };

    if started {
        if let Err(e) = notifier.notify("🛑 <b>CycleBot stopped</b>").await {
            warn!(error = %e, "Failed to send stop notification");
        }
    }

    match outcome.context("engine task panicked")? {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => Err(e).context("engine failed"),
    }
}
