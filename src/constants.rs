// === Slack ===
pub const SLACK_API_BASE: &str = "https://slack.com/api";
pub const SLACK_PAGE_SIZE: u32 = 200;

/// Subtypes that carry no conversational content (joins, topic changes, pins...).
pub const SYSTEM_SUBTYPES: &[&str] = &[
    "channel_join",
    "channel_leave",
    "channel_topic",
    "channel_purpose",
    "channel_name",
    "channel_archive",
    "channel_unarchive",
    "group_join",
    "group_leave",
    "bot_add",
    "bot_remove",
    "pinned_item",
    "unpinned_item",
];

// === HTTP Timeouts ===
pub const HTTP_TIMEOUT_SECS: u64 = 30;
pub const FILE_TIMEOUT_SECS: u64 = 10;
pub const LLM_TIMEOUT_SECS: u64 = 120;

// === Chunking ===
pub const DEFAULT_CHUNK_SIZE: usize = 12_000;
pub const DEFAULT_MAX_TOTAL_CHARS: usize = 200_000;
pub const CHUNK_SEPARATOR: &str = "\n\n";

// === Map-Reduce ===
pub const DEFAULT_CONTEXT_BUDGET: usize = 24_000;
pub const DEFAULT_REDUCE_GROUP_SIZE: usize = 3;
pub const DEFAULT_MAX_REDUCE_LEVELS: u32 = 8;
pub const DEFAULT_MAP_WORKERS: usize = 1;

// === Files ===
pub const MAX_FILE_CHARS: usize = 20_000;

// === Bedrock ===
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_MAX_TOKENS: u32 = 4_096;
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

// === Structured mode ===
pub const DEFAULT_MIN_ACTION_CONFIDENCE: f64 = 0.5;

/// Truncate a string to at most `max_chars` characters without splitting a char.
pub fn truncate_safe(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Length in chars, the unit every size budget is expressed in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
