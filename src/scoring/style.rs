// Style and virality heuristics for candidate tweets.
//
// Each category counts how many of its fixed keyword/phrase list members
// appear as substrings of the lowercased text, then normalizes by word
// count so short punchy tweets aren't penalized. A category maxes out
// once its hit density reaches half the word count.
//
// Everything here is pure arithmetic over strings: no I/O, no randomness.
// Identical input always produces identical output, so the pipeline can
// re-score a tweet after enhancement and compare.

use std::fmt;

use serde::{Deserialize, Serialize};

// Fixed keyword/phrase lists. All members are lowercase because matching
// happens against the lowercased text.

const SASS_WORDS: &[&str] = &[
    "bestie",
    "literally",
    "imagine",
    "apparently",
    "supposedly",
    "girlie",
];

const MEME_PHRASES: &[&str] = &[
    "ngl", "fr fr", "iykyk", "lowkey", "highkey", "based", "chad", "w", "l", "no cap", "bussin",
];

const ENGAGEMENT_WORDS: &[&str] = &[
    "ratio",
    "hot take",
    "thread",
    "debate me",
    "fight me",
    "thoughts?",
    "disagree?",
];

const DARK_HUMOR_WORDS: &[&str] = &["oof", "rip", "dead", "crying", "screaming", "help"];

const INTERNET_SLANG: &[&str] = &[
    "ngl", "fr", "tbh", "imo", "idk", "nvm", "dm", "rt", "fyi", "aka",
];

const ARGUMENT_STARTERS: &[&str] = &[
    "respectfully",
    "with peace and love",
    "no offense but",
    "hot take",
];

const VIRAL_FORMATS: &[&str] = &["pov:", "not the", "it's giving", "the way that", "y'all"];

const CONTEMPORARY_SLANG: &[&str] = &[
    "slay",
    "periodt",
    "ate",
    "understood the assignment",
    "main character",
];

const PERSPECTIVE_MARKERS: &[&str] = &[
    "unpopular opinion",
    "hot take",
    "controversial but",
    "hear me out",
    "plot twist",
];

/// Density scale: `count / word_count * 200` caps a category at 100 once
/// hits reach 50% of the word count.
const DENSITY_SCALE: f64 = 200.0;

/// Base score above which the matching style tag is emitted.
const TAG_THRESHOLD: f64 = 70.0;

/// Weight applied to the raw viral-format count inside the native composite.
const VIRAL_FORMAT_WEIGHT: f64 = 20.0;

/// Categorical tags derived from the base scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    ExtraSassy,
    MemeLord,
    Edgy,
    EngagementBait,
    ExtremelyOnline,
    BalancedTake,
}

impl StyleTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleTag::ExtraSassy => "extra_sassy",
            StyleTag::MemeLord => "meme_lord",
            StyleTag::Edgy => "edgy",
            StyleTag::EngagementBait => "engagement_bait",
            StyleTag::ExtremelyOnline => "extremely_online",
            StyleTag::BalancedTake => "balanced_take",
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full style/virality profile of one piece of text.
///
/// Base scores and composites are on a 0–100 scale; `viral_format_count`
/// is a raw hit count (it is small and is weighted inside the native
/// composite instead of being density-normalized).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleScore {
    pub sass_level: f64,
    pub meme_density: f64,
    pub engagement_potential: f64,
    pub dark_humor_score: f64,
    pub slang_usage: f64,
    pub argument_strength: f64,
    pub viral_format_count: u32,
    pub contemporary_score: f64,
    pub perspective_balance: f64,
    /// Mean of sass, meme, and engagement scores.
    pub clout_factor: f64,
    /// How "native" the text reads: slang + contemporary slang + weighted
    /// viral formats. The pipeline enhances tweets below 70 here.
    pub twitter_native_score: f64,
    /// Mean of argument, dark humor, and sass scores.
    pub ratio_potential: f64,
    pub style_tags: Vec<StyleTag>,
}

/// Score a text for style and virality.
///
/// Pure and deterministic. Whitespace-only input yields all-zero base
/// scores (the word count is floored at 1, so there is no division by
/// zero).
pub fn analyze(text: &str) -> StyleScore {
    let lower = text.to_lowercase();
    let word_count = lower.split_whitespace().count().max(1);

    let density = |terms: &[&str]| -> f64 {
        let hits = presence_count(&lower, terms);
        ((hits as f64 / word_count as f64) * DENSITY_SCALE).min(100.0)
    };

    let sass_level = density(SASS_WORDS);
    let meme_density = density(MEME_PHRASES);
    let engagement_potential = density(ENGAGEMENT_WORDS);
    let dark_humor_score = density(DARK_HUMOR_WORDS);
    let slang_usage = density(INTERNET_SLANG);
    let argument_strength = density(ARGUMENT_STARTERS);
    let contemporary_score = density(CONTEMPORARY_SLANG);
    let perspective_balance = density(PERSPECTIVE_MARKERS);
    let viral_format_count = presence_count(&lower, VIRAL_FORMATS) as u32;

    let clout_factor = ((sass_level + meme_density + engagement_potential) / 3.0).min(100.0);
    let twitter_native_score = ((slang_usage
        + contemporary_score
        + f64::from(viral_format_count) * VIRAL_FORMAT_WEIGHT)
        / 3.0)
        .min(100.0);
    let ratio_potential = ((argument_strength + dark_humor_score + sass_level) / 3.0).min(100.0);

    let mut style_tags = Vec::new();
    if sass_level > TAG_THRESHOLD {
        style_tags.push(StyleTag::ExtraSassy);
    }
    if meme_density > TAG_THRESHOLD {
        style_tags.push(StyleTag::MemeLord);
    }
    if dark_humor_score > TAG_THRESHOLD {
        style_tags.push(StyleTag::Edgy);
    }
    if engagement_potential > TAG_THRESHOLD {
        style_tags.push(StyleTag::EngagementBait);
    }
    if contemporary_score > TAG_THRESHOLD {
        style_tags.push(StyleTag::ExtremelyOnline);
    }
    if perspective_balance > TAG_THRESHOLD {
        style_tags.push(StyleTag::BalancedTake);
    }

    StyleScore {
        sass_level,
        meme_density,
        engagement_potential,
        dark_humor_score,
        slang_usage,
        argument_strength,
        viral_format_count,
        contemporary_score,
        perspective_balance,
        clout_factor,
        twitter_native_score,
        ratio_potential,
        style_tags,
    }
}

/// Count how many list members occur as substrings of the lowercased text.
/// Each member counts at most once regardless of repetition.
fn presence_count(lower: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| lower.contains(**term)).count()
}
