// Prompt construction for the thread pipeline.
//
// Prompts are plain format strings. Keeping them here (instead of inline
// in the pipeline) makes the generation steps readable and gives the
// fallback texts one home. Every builder takes the current date so the
// model can reference what's timely.

use std::fmt;

/// Which side of the argument a continuation batch argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    Supporting,
    Opposing,
}

impl Perspective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Perspective::Supporting => "supporting",
            Perspective::Opposing => "opposing",
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many continuation tweets a single thread-prompt call asks for.
pub const TWEETS_PER_CONTINUATION: usize = 2;

/// Opening tweet: controversial enough to set up both sides.
pub fn hook(topic: &str, current_date: &str) -> String {
    format!(
        "Create an attention-grabbing first tweet about {topic}.\n\
         Make it controversial but not extreme, setting up for both supporting and opposing views.\n\
         Use peak Twitter language, max sass, and current slang. Include relevant emojis.\n\
         Make it provocative, spicy, and memorable. Under 280 characters.\n\
         Mix memes, dark humor, and actual insights.\n\
         Use current formats like \"POV:\", \"NOT THE\", \"it's giving\".\n\
         Today's date is {current_date}, so make it timely and relevant."
    )
}

/// Continuation tweets arguing one perspective off the hook.
pub fn continuation(topic: &str, hook: &str, perspective: Perspective, current_date: &str) -> String {
    format!(
        "Generate {TWEETS_PER_CONTINUATION} {perspective} tweets continuing from this hook about {topic}:\n\
         \"{hook}\"\n\n\
         Make the thread:\n\
         1. Peak Twitter energy (bestie, periodt, slay, etc.)\n\
         2. Spicy takes backed by well-reasoned arguments\n\
         3. Current meme formats and callbacks\n\
         4. Each tweet under 280 characters, heavy emoji and slang usage\n\
         5. Reference current events where relevant (today is {current_date})\n\n\
         Maintain the {perspective} perspective while acknowledging counterpoints.\n\
         Format as a list of {TWEETS_PER_CONTINUATION} tweets, separated by newlines."
    )
}

/// A quotable pushback against one earlier tweet.
pub fn counterpoint(topic: &str, previous_tweet: &str, current_date: &str) -> String {
    format!(
        "Create a spicy counterpoint tweet to this take about {topic}:\n\
         \"{previous_tweet}\"\n\n\
         Challenge the point while staying respectful. Use Twitter language,\n\
         current slang, emojis, and meme formats. Keep it under 280 characters\n\
         and make it quotable. Reference current events if relevant (today is {current_date})."
    )
}

/// Balanced closing tweet with a call for engagement.
pub fn finale(topic: &str, current_date: &str) -> String {
    format!(
        "Create a balanced concluding tweet about {topic}.\n\
         Acknowledge multiple perspectives while adding your own spicy take.\n\
         Make it memorable and quotable, with peak Twitter energy, current slang,\n\
         and relevant emojis. Under 280 characters. End with a call for engagement.\n\
         Reference that today is {current_date} if relevant."
    )
}

/// Rewrite a tweet to raise its Twitter-native score.
pub fn enhance(tweet: &str) -> String {
    format!(
        "Make this tweet absolutely unhinged (in a good way).\n\
         Max out the sass, add current memes, and make it extremely online.\n\
         Keep the core message but make it Twitter native:\n\
         {tweet}"
    )
}

/// Derive an image-generation prompt from a tweet.
pub fn image_prompt(tweet: &str) -> String {
    format!(
        "Create an engaging and highly shareable social media image prompt based on this tweet:\n\
         \"{tweet}\"\n\n\
         Make the description visually striking, capture the tweet's message,\n\
         and work well as a Twitter/X image. Provocative but not offensive.\n\
         Write a detailed image generation prompt only, no explanations."
    )
}

/// Professional caption for a standalone post.
pub fn caption(text: &str) -> String {
    format!(
        "Create a professional caption for a social media post about the following text.\n\
         Include relevant hashtags and emojis:\n\n\
         {text}\n\n\
         The caption should be engaging, professional, and no more than 280 characters."
    )
}

/// Campaign action plan covering the whole thread.
pub fn action_plan(topic: &str, tweets: &str, schedule: &str, current_date: &str) -> String {
    format!(
        "Create a comprehensive action plan for a viral Twitter thread campaign about \"{topic}\".\n\n\
         Thread content:\n{tweets}\n\n\
         Posting schedule:\n{schedule}\n\n\
         Today's date: {current_date}\n\n\
         Include: a catchy campaign name, the strategic objective, target audience\n\
         analysis, engagement tactics per tweet, hashtag and account-tagging\n\
         recommendations, follow-up content ideas, metrics to track, and contingency\n\
         plans for negative engagement. Format as a professional action plan."
    )
}

// --- Deterministic fallbacks (used when generation exhausts retries) ---

/// Fallback tweet/caption when text generation is unavailable.
pub fn fallback_tweet(topic: &str) -> String {
    format!("Check out the latest on {topic}! #trending")
}

/// Fallback counterpoint keeping the thread's back-and-forth shape.
pub fn fallback_counterpoint(topic: &str) -> String {
    format!("Counterpoint: there's a whole other side to {topic} worth hearing out. 👀")
}

/// Fallback image prompt derived from the tweet itself.
pub fn fallback_image_prompt(tweet: &str) -> String {
    let preview: String = tweet.chars().take(50).collect();
    format!("Social media image about {preview}...")
}

/// Fallback action plan when generation is unavailable.
pub fn fallback_action_plan(topic: &str) -> String {
    format!(
        "Action plan unavailable — post the thread about {topic} on the generated \
         schedule and track engagement manually."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_inputs() {
        let p = hook("rust memes", "June 5, 2026");
        assert!(p.contains("rust memes"));
        assert!(p.contains("June 5, 2026"));

        let c = continuation("rust memes", "the hook", Perspective::Opposing, "June 5, 2026");
        assert!(c.contains("opposing"));
        assert!(c.contains("the hook"));
    }

    #[test]
    fn test_fallbacks_are_deterministic() {
        assert_eq!(fallback_tweet("ai"), fallback_tweet("ai"));
        assert_eq!(
            fallback_image_prompt("short tweet"),
            "Social media image about short tweet..."
        );
    }

    #[test]
    fn test_fallback_image_prompt_truncates_long_tweets() {
        let long = "x".repeat(200);
        let p = fallback_image_prompt(&long);
        assert!(p.len() < 100);
    }

    #[test]
    fn test_perspective_display() {
        assert_eq!(Perspective::Supporting.to_string(), "supporting");
        assert_eq!(Perspective::Opposing.as_str(), "opposing");
    }
}
