// Surface-level tweet metrics: lengths, emoji, hashtags, mentions.
//
// These sit alongside the style score in reports and the `score` command
// output. Like the style heuristics they are pure and deterministic.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Character-level and token-level measurements of one tweet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetMetrics {
    pub emoji_count: usize,
    pub character_count: usize,
    pub word_count: usize,
    pub hashtag_count: usize,
    pub mention_count: usize,
}

/// X/Twitter's per-post character limit.
pub const TWEET_CHAR_LIMIT: usize = 280;

impl TweetMetrics {
    /// Whether the text fits in a single post.
    pub fn fits_in_tweet(&self) -> bool {
        self.character_count <= TWEET_CHAR_LIMIT
    }
}

/// Measure a text's surface metrics.
pub fn analyze(text: &str) -> TweetMetrics {
    // The patterns are fixed and known-valid, so compilation can't fail.
    let hashtag = Regex::new(r"#\w+").unwrap();
    let mention = Regex::new(r"@\w+").unwrap();

    TweetMetrics {
        emoji_count: text.chars().filter(|c| is_emoji(*c)).count(),
        character_count: text.chars().count(),
        word_count: text.split_whitespace().count(),
        hashtag_count: hashtag.find_iter(text).count(),
        mention_count: mention.find_iter(text).count(),
    }
}

/// Rough emoji detection over the common Unicode emoji blocks.
fn is_emoji(c: char) -> bool {
    matches!(c,
        '\u{1F300}'..='\u{1F5FF}'   // symbols & pictographs
        | '\u{1F600}'..='\u{1F64F}' // emoticons
        | '\u{1F680}'..='\u{1F6FF}' // transport & map symbols
        | '\u{1F900}'..='\u{1F9FF}' // supplemental symbols
        | '\u{1F1E6}'..='\u{1F1FF}' // regional indicator flags
        | '\u{2600}'..='\u{27BF}'   // misc symbols & dingbats
    )
}
