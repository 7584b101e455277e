//! Bot commands, canned replies and message chunking.

use trendpost_config::SourcesConfig;

/// Telegram rejects longer messages.
pub const MAX_MESSAGE_CHARS: usize = 4000;

const PUBLISH_WORDS: &[&str] = &["опубликуй", "publish", "пост"];
const PUBLISH_REMINDER_WORDS: &[&str] = &["опубликуй", "publish"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Trends,
    Create,
    /// `/analyze <topic>`; `None` when the topic is missing
    Analyze(Option<String>),
    Sources,
    Reset,
    Unknown(String),
    /// Anything that is not a command goes to the agent as is
    Text(String),
}

impl BotCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return BotCommand::Text(input.to_string());
        };

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        // "/trends@MyBot" in group chats
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        match name.as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "trends" => BotCommand::Trends,
            "create" => BotCommand::Create,
            "analyze" => BotCommand::Analyze((!args.is_empty()).then(|| args.to_string())),
            "sources" => BotCommand::Sources,
            "reset" => BotCommand::Reset,
            _ => BotCommand::Unknown(name),
        }
    }
}

fn mode_line(dry_run: bool) -> &'static str {
    if dry_run {
        "TEST MODE: LinkedIn publishing is off, I show posts for you to copy"
    } else {
        "LIVE MODE: LinkedIn publishing is on"
    }
}

pub fn welcome_text(name: Option<&str>, dry_run: bool) -> String {
    let greeting = match name {
        Some(name) if !name.trim().is_empty() => format!("👋 Hi, {name}!"),
        _ => "👋 Hi!".to_string(),
    };
    let publish_line = if dry_run {
        "Show ready-made posts for you to copy"
    } else {
        "Publish posts to LinkedIn"
    };
    format!(
        "{greeting}\n\n\
         I'm a LinkedIn content agent for product managers.\n\n\
         {mode}\n\n\
         🎯 What I can do:\n\
         ✅ Monitor current trends from Mind the Product, Reddit and Hacker News\n\
         ✅ Write posts for a PM audience\n\
         ✅ Show what the product community is talking about\n\
         ✅ {publish_line}\n\n\
         📝 Commands:\n\
         /trends - current trends\n\
         /create - write a post on a hot topic\n\
         /analyze <topic> - check how timely a topic is\n\
         /sources - data sources\n\
         /help - help\n\n\
         💬 Or just write what you need:\n\
         \"Find a hot topic and write a post\"\n\
         \"What are PMs discussing this week?\"",
        mode = mode_line(dry_run),
    )
}

pub fn help_text(dry_run: bool) -> String {
    format!(
        "🤖 Commands:\n\n\
         /start - start over\n\
         /trends - current product trends\n\
         /create - write a post\n\
         /analyze <topic> - check how timely a topic is\n\
         /sources - data sources\n\
         /reset - clear the conversation history\n\
         /help - this help\n\n\
         📝 Example requests:\n\
         \"What is r/ProductManagement discussing?\"\n\
         \"Write a post about AI in product discovery\"\n\
         \"Top 3 PM trends of the week\"\n\
         \"How timely is retention metrics as a topic?\"\n\n\
         {}",
        mode_line(dry_run)
    )
}

/// Configured feeds and communities.
pub fn sources_text(config: &SourcesConfig) -> String {
    let mut text = String::from("📡 Trend sources:\n\n📰 RSS feed categories:\n");
    for (category, feeds) in &config.feeds {
        let marker = if *category == config.product_feed_category { " (product)" } else { "" };
        text.push_str(&format!("✅ {category}{marker}: {} feeds\n", feeds.len()));
    }
    text.push_str("\n💬 Reddit communities:\n");
    for community in &config.subreddits {
        text.push_str(&format!("✅ r/{community}\n"));
    }
    text.push_str(
        "\n🔥 Hacker News:\n✅ Top tech and product discussions\n\n\
         🌐 Web search:\n✅ The assistant's built-in search for current news",
    );
    text
}

pub const ANALYZE_USAGE: &str = "❓ Tell me which topic to analyze.\nExample: /analyze AI in product discovery";
pub const RESET_REPLY: &str = "🔄 Conversation history cleared.\nStarting from a clean slate.";
pub const TRENDS_STATUS: &str = "🔍 Looking for current PM trends... This can take a minute.";

pub fn unknown_command_text(name: &str) -> String {
    format!("Unknown command /{name}. /help lists what I can do.")
}

pub fn denied_text(sender_id: &str) -> String {
    format!("❌ You do not have access to this bot.\nYour ID: {sender_id}\nContact the administrator.")
}

pub fn create_status(dry_run: bool) -> &'static str {
    if dry_run {
        "✍️ Writing a post on a hot topic...\n🧪 Test mode: I'll show the post for manual copying\n⏱️ Takes 1-2 minutes."
    } else {
        "✍️ Writing a post on a hot topic...\n⏱️ Takes 1-2 minutes."
    }
}

pub fn analyze_status(topic: &str) -> String {
    format!("🔍 Checking how timely '{topic}' is...")
}

pub const CREATE_DRY_RUN_FOLLOW_UP: &str = "📋 DONE!\n\
     Copy the post above and publish it on LinkedIn yourself.\n\n\
     💡 To turn on publishing, set LINKEDIN_ACCESS_TOKEN to a real access token.";

pub const PUBLISH_REMINDER: &str = "💡 Reminder: you are in test mode.\nCopy posts and publish them manually.";

/// What the agent is asked for each command that runs a turn.
pub fn agent_prompt(command: &BotCommand, dry_run: bool) -> Option<String> {
    match command {
        BotCommand::Trends => Some(
            "Show the top 5 most relevant trends for product managers right now. \
             Use get_product_trends and describe each trend briefly."
                .into(),
        ),
        BotCommand::Create if dry_run => Some(
            "Find the most relevant and discussed topic for product managers. \
             Write an engaging post for a PM audience with practical advice. \
             Show the finished post ready to copy into LinkedIn. \
             Do NOT call create_linkedin_post, I am in test mode."
                .into(),
        ),
        BotCommand::Create => Some(
            "Find the most relevant and discussed topic for product managers. \
             Write an engaging post for a PM audience with practical advice. \
             Show me the post for confirmation before publishing."
                .into(),
        ),
        BotCommand::Analyze(Some(topic)) => Some(format!(
            "Check how relevant the topic '{topic}' is for product managers right now. \
             Use web search and the product sources. Give a score and a recommendation."
        )),
        BotCommand::Text(text) => Some(with_dry_run_note(text, dry_run)),
        _ => None,
    }
}

fn mentions(text: &str, words: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    words.iter().any(|w| lowered.contains(w))
}

/// In test mode, ask the agent not to publish when the text talks about posting.
pub fn with_dry_run_note(text: &str, dry_run: bool) -> String {
    if dry_run && mentions(text, PUBLISH_WORDS) {
        format!("{text}\n\n(I am in test mode: do NOT call create_linkedin_post, just show the finished post)")
    } else {
        text.to_string()
    }
}

pub fn wants_publish_reminder(text: &str, dry_run: bool) -> bool {
    dry_run && mentions(text, PUBLISH_REMINDER_WORDS)
}

pub fn error_text(error: &str) -> String {
    format!(
        "❌ Something went wrong: {error}\n\n\
         Try:\n\
         ✅ rephrasing the request\n\
         ✅ /reset to clear the conversation\n\
         ✅ contacting the administrator"
    )
}

/// Split `text` into pieces of at most `max_chars` characters, on char
/// boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
