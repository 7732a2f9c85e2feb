use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Price Tracker Bot Commands:")]
pub enum Command {
    #[command(description = "Start the bot and register for notifications")]
    Start,

    #[command(description = "Show this help")]
    Help,

    #[command(description = "Register or refresh your profile")]
    Subscribe,

    #[command(
        description = "Track a product - Usage: /track <product url or sku> [threshold]"
    )] Track(String),

    #[command(description = "List your tracked products")]
    List,

    #[command(
        description = "Change a threshold - Usage: /threshold <product_id> <price>"
    )] Threshold(String),

    #[command(description = "Stop tracking - Usage: /untrack <product_id>")] Untrack(String),
}
