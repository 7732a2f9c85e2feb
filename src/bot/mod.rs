pub mod commands;
pub mod constants;
pub mod handlers;

use std::sync::Arc;

use teloxide::dispatching::{ UpdateFilterExt, UpdateHandler };
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::services::TrackingService;

#[derive(Clone)]
pub struct BotState {
    pub tracking_service: Arc<TrackingService>,
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .filter_command::<commands::Command>()
        .endpoint(handlers::handle_command_dispatch)
}

pub async fn run_bot(bot: Bot, tracking_service: Arc<TrackingService>) {
    tracing::info!("Starting Telegram bot...");

    // Set bot commands for slash menu
    if let Err(e) = bot.set_my_commands(commands::Command::bot_commands()).await {
        tracing::warn!("Failed to set bot commands: {}", e);
    } else {
        tracing::info!("Bot commands registered successfully");
    }

    let state = Arc::new(BotState { tracking_service });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .build()
        .dispatch().await;
}
