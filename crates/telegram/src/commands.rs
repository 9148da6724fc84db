use std::sync::Arc;

use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    types::ParseMode,
    utils::command::BotCommands,
};
use tracing::{info, warn};

use common::EngineCommand;
use engine::EngineHandle;

use crate::report::{format_positions, format_signal_summary, format_status};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub engine: EngineHandle,
    /// Only this chat may issue commands.
    pub allowed_chat: ChatId,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "CycleBot commands:")]
pub enum Command {
    #[command(description = "Show this help")]
    Help,
    #[command(description = "Show engine state and cycle counters")]
    Status,
    #[command(description = "Show the latest signal per market")]
    Signals,
    #[command(description = "Show open paper positions")]
    Positions,
    #[command(description = "Run an analysis cycle now")]
    Run,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(bot: Bot, deps: BotDeps) {
    let deps = Arc::new(deps);

    info!(chat_id = deps.allowed_chat.0, "Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(handle_help))
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::Signals].endpoint(handle_signals))
        .branch(case![Command::Positions].endpoint(handle_positions))
        .branch(case![Command::Run].endpoint(handle_run));

    Update::filter_message()
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from any chat but the configured one.
async fn auth_filter(msg: Message, deps: Arc<BotDeps>) -> bool {
    let allowed = msg.chat.id == deps.allowed_chat;
    if !allowed {
        warn!(chat_id = msg.chat.id.0, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn reply_html(bot: &Bot, msg: &Message, text: String) -> HandlerResult {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let engine = &deps.engine;
    let stats = engine.stats();
    let text = format_status(
        engine.state().await,
        &engine.markets().await,
        stats.cycles_started,
        stats.cycles_skipped,
        engine.positions().await.len(),
    );
    reply_html(&bot, &msg, text).await
}

async fn handle_signals(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let signals = deps.engine.latest_signals().await;
    reply_html(&bot, &msg, format_signal_summary(&signals)).await
}

async fn handle_positions(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let positions = deps.engine.positions().await;
    reply_html(&bot, &msg, format_positions(&positions)).await
}

async fn handle_run(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    info!("Manual cycle requested via Telegram");
    deps.engine.send(EngineCommand::RunNow).await;
    bot.send_message(
        msg.chat.id,
        "Cycle requested. It is skipped if one is already running.",
    )
    .await?;
    Ok(())
}
