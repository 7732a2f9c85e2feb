pub mod messages {
    pub const WELCOME: &str =
        "👋 Welcome to Price Tracker!\n\n\
        Send /track <product url or sku> [threshold] and I will message you \
        when the price drops to your threshold or below.\n\n\
        Without a threshold I watch for a 10% drop from the current price.\n\
        Use /help to see every command.";

    pub const TRACK_USAGE: &str =
        "❌ Usage: /track <product url or sku> [threshold]\n\n\
        Examples:\n\
        • /track https://www.ozon.ru/product/kettle-123456\n\
        • /track 123456 1999";

    pub const THRESHOLD_USAGE: &str =
        "❌ Usage: /threshold <product_id> <price>\n\nFind product ids with /list.";

    pub const UNTRACK_USAGE: &str = "❌ Usage: /untrack <product_id>\n\nFind product ids with /list.";

    pub const NOTHING_TRACKED: &str = "📭 You are not tracking anything yet. Try /track.";
}
