use std::sync::Arc;

use sea_orm::prelude::Decimal;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use uuid::Uuid;

use crate::bot::{ commands::Command, BotState };
use crate::error::AppError;
use crate::models::{ parse_threshold, Subscriber };
use crate::scraper::ProductRef;
use crate::services::TrackedProductResponse;

use super::constants::messages;

// Handler for dispatcher-based command handling
pub async fn handle_command_dispatch(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    handle_command(bot, msg, cmd, state).await?;
    Ok(())
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>
) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    match cmd {
        Command::Start => handle_start(bot, msg, state).await,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
            Ok(())
        }
        Command::Subscribe => handle_subscribe(bot, msg, state).await,
        Command::Track(args) => handle_track(bot, msg, args, chat_id, state).await,
        Command::List => handle_list(bot, msg, chat_id, state).await,
        Command::Threshold(args) => handle_threshold(bot, msg, args, chat_id, state).await,
        Command::Untrack(args) => handle_untrack(bot, msg, args, chat_id, state).await,
    }
}

fn subscriber_from(msg: &Message) -> Subscriber {
    let (name, username) = match msg.from.as_ref() {
        Some(user) => (user.full_name(), user.username.clone().unwrap_or_default()),
        None => (String::new(), String::new()),
    };

    Subscriber {
        chat_id: msg.chat.id.0,
        name,
        username,
    }
}

/// Text shown to the user when an operation fails.
fn describe_error(e: &AppError) -> String {
    match e {
        AppError::InvalidInput(m) | AppError::InvalidThreshold(m) => format!("❌ {}", m),
        AppError::NotFound(m) => format!("❌ Not found: {}", m),
        AppError::Scrape(_) | AppError::ScrapeTimeout(_) => {
            "⚠️ Could not read the product page right now. Please try again later.".to_string()
        }
        _ => "⚠️ Something went wrong. Please try again later.".to_string(),
    }
}

/// `<url|sku> [threshold]`
pub fn parse_track_args(args: &str) -> Result<(ProductRef, Option<Decimal>), AppError> {
    let mut parts = args.split_whitespace();
    let target = parts.next().ok_or_else(|| AppError::InvalidInput("missing product".to_string()))?;
    let target = ProductRef::parse(target)?;

    let rest: Vec<&str> = parts.collect();
    let threshold = if rest.is_empty() { None } else { Some(parse_threshold(&rest.join(" "))?) };

    Ok((target, threshold))
}

/// `<product_id> <price>`
pub fn parse_threshold_args(args: &str) -> Result<(Uuid, Decimal), AppError> {
    let mut parts = args.split_whitespace();
    let product_id = parse_product_id(parts.next().unwrap_or_default())?;

    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return Err(AppError::InvalidThreshold("missing price".to_string()));
    }
    Ok((product_id, parse_threshold(&rest.join(" "))?))
}

fn parse_product_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidInput("invalid product ID format".to_string()))
}

pub fn format_tracked(product: &TrackedProductResponse) -> String {
    let name = if product.name.is_empty() { product.url.as_str() } else { product.name.as_str() };
    let price = product.price.as_deref().unwrap_or("unknown");
    let marker = if product.state.is_notified() { "🔔" } else { "👀" };

    format!(
        "{marker} {name}\n\
        Price: {price}\n\
        Tracking price: {threshold}\n\
        ID: {id}",
        marker = marker,
        name = name,
        price = price,
        threshold = product.tracking_price,
        id = product.product_id
    )
}

async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if let Err(e) = state.tracking_service.register_subscriber(subscriber_from(&msg)).await {
        tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to register subscriber");
    }

    bot.send_message(msg.chat.id, messages::WELCOME).await?;
    Ok(())
}

async fn handle_subscribe(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let reply = match state.tracking_service.register_subscriber(subscriber_from(&msg)).await {
        Ok(_) => "✅ You are subscribed to price notifications.".to_string(),
        Err(e) => describe_error(&e),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_track(
    bot: Bot,
    msg: Message,
    args: String,
    chat_id: i64,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if args.trim().is_empty() {
        bot.send_message(msg.chat.id, messages::TRACK_USAGE).await?;
        return Ok(());
    }

    let (target, threshold) = match parse_track_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            bot.send_message(msg.chat.id, describe_error(&e)).await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "🔎 Checking the product page...").await?;

    let reply = match state.tracking_service.start_tracking(chat_id, target, threshold).await {
        Ok(product) => format!("✅ Now tracking\n\n{}", format_tracked(&product)),
        Err(e) => {
            tracing::warn!(chat_id, error = %e, "track command failed");
            describe_error(&e)
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_list(bot: Bot, msg: Message, chat_id: i64, state: Arc<BotState>) -> ResponseResult<()> {
    let reply = match state.tracking_service.tracked_products(chat_id).await {
        Ok(products) if products.is_empty() => messages::NOTHING_TRACKED.to_string(),
        Ok(products) => {
            let body: Vec<String> = products.iter().map(format_tracked).collect();
            format!("📋 Your tracked products:\n\n{}", body.join("\n\n"))
        }
        Err(e) => describe_error(&e),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_threshold(
    bot: Bot,
    msg: Message,
    args: String,
    chat_id: i64,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if args.trim().is_empty() {
        bot.send_message(msg.chat.id, messages::THRESHOLD_USAGE).await?;
        return Ok(());
    }

    let reply = match parse_threshold_args(&args) {
        Ok((product_id, threshold)) => {
            match state.tracking_service.update_threshold(chat_id, product_id, threshold).await {
                Ok(product) => format!("✅ Threshold updated\n\n{}", format_tracked(&product)),
                Err(e) => describe_error(&e),
            }
        }
        Err(e) => describe_error(&e),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_untrack(
    bot: Bot,
    msg: Message,
    args: String,
    chat_id: i64,
    state: Arc<BotState>
) -> ResponseResult<()> {
    if args.trim().is_empty() {
        bot.send_message(msg.chat.id, messages::UNTRACK_USAGE).await?;
        return Ok(());
    }

    let reply = match parse_product_id(&args) {
        Ok(product_id) => {
            match state.tracking_service.stop_tracking(chat_id, product_id).await {
                Ok(()) => "🗑 Stopped tracking.".to_string(),
                Err(e) => describe_error(&e),
            }
        }
        Err(e) => describe_error(&e),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
