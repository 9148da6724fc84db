pub mod commands;
pub mod notifier;
pub mod report;

pub use commands::{start_bot, BotDeps, Command};
pub use notifier::{DisabledNotifier, TelegramNotifier};
