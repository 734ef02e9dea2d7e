// Unit tests for the style scorer and surface metrics.
//
// Exercises the public scoring API the way the pipeline uses it:
// range guarantees, degenerate inputs, tag thresholds, and determinism.

use ember::scoring::metrics;
use ember::scoring::style::{analyze, StyleTag};

fn base_scores(score: &ember::scoring::style::StyleScore) -> Vec<f64> {
    vec![
        score.sass_level,
        score.meme_density,
        score.engagement_potential,
        score.dark_humor_score,
        score.slang_usage,
        score.argument_strength,
        score.contemporary_score,
        score.perspective_balance,
    ]
}

// ============================================================
// Range guarantees
// ============================================================

#[test]
fn all_scores_within_bounds_across_inputs() {
    let samples = [
        "",
        "   ",
        "one",
        "ngl this is bussin fr fr no cap periodt",
        "POV: NOT THE DISCOURSE AGAIN Y'ALL 😭😭",
        "hot take hot take hot take hot take",
        "respectfully, with peace and love, no offense but this ain't it",
        "oof rip dead crying screaming help oof rip dead",
        "a perfectly ordinary sentence with no internet culture in it",
        "slay slay slay slay slay slay slay slay slay slay",
    ];

    for text in samples {
        let score = analyze(text);
        for value in base_scores(&score) {
            assert!(
                (0.0..=100.0).contains(&value),
                "base score {value} out of range for {text:?}"
            );
        }
        for composite in [
            score.clout_factor,
            score.twitter_native_score,
            score.ratio_potential,
        ] {
            assert!(
                (0.0..=100.0).contains(&composite),
                "composite {composite} out of range for {text:?}"
            );
        }
    }
}

#[test]
fn empty_and_whitespace_score_zero() {
    for text in ["", " ", "\n\t  \n"] {
        let score = analyze(text);
        assert!(base_scores(&score).iter().all(|v| *v == 0.0));
        assert_eq!(score.viral_format_count, 0);
        assert_eq!(score.clout_factor, 0.0);
        assert_eq!(score.twitter_native_score, 0.0);
        assert_eq!(score.ratio_potential, 0.0);
        assert!(score.style_tags.is_empty());
    }
}

// ============================================================
// Known samples
// ============================================================

#[test]
fn meme_sample_hits_expected_categories() {
    let score = analyze("ngl this is bussin fr fr no cap periodt");
    assert!(score.meme_density > 0.0);
    assert!(score.slang_usage > 0.0);
    assert!(score.contemporary_score > 0.0);
    assert_eq!(score.argument_strength, 0.0);
}

#[test]
fn contemporary_saturation_emits_extremely_online() {
    let score = analyze("slay periodt ate slay periodt");
    assert!(score.contemporary_score > 70.0);
    assert!(score.style_tags.contains(&StyleTag::ExtremelyOnline));
}

#[test]
fn engagement_bait_tag() {
    let score = analyze("ratio + hot take + debate me");
    assert!(score.engagement_potential > 70.0);
    assert!(score.style_tags.contains(&StyleTag::EngagementBait));
}

#[test]
fn tags_absent_below_threshold() {
    // One contemporary hit diluted across many words stays under 70
    let score = analyze("today we will discuss whether the main character of this novel was right");
    assert!(score.contemporary_score <= 70.0);
    assert!(!score.style_tags.contains(&StyleTag::ExtremelyOnline));
}

// ============================================================
// Determinism
// ============================================================

#[test]
fn rescoring_is_identical() {
    let text = "POV: bestie really said 'debate me' and logged off 💀 no cap";
    let first = analyze(text);
    let second = analyze(text);
    assert_eq!(base_scores(&first), base_scores(&second));
    assert_eq!(first.viral_format_count, second.viral_format_count);
    assert_eq!(first.style_tags, second.style_tags);
}

#[test]
fn score_serializes_round_trip() {
    let score = analyze("ngl lowkey based, no cap");
    let json = serde_json::to_string(&score).unwrap();
    let back: ember::scoring::style::StyleScore = serde_json::from_str(&json).unwrap();
    assert_eq!(back.meme_density, score.meme_density);
    assert_eq!(back.style_tags, score.style_tags);
    // Tags serialize as their snake_case names
    if score.style_tags.is_empty() {
        assert!(json.contains("\"style_tags\":[]"));
    }
}

// ============================================================
// Surface metrics
// ============================================================

#[test]
fn metrics_count_surface_features() {
    let m = metrics::analyze("Deploy day 🚀 shipping threads @ember_app #buildinpublic #rustlang");
    assert_eq!(m.emoji_count, 1);
    assert_eq!(m.hashtag_count, 2);
    assert_eq!(m.mention_count, 1);
    assert!(m.fits_in_tweet());
}

#[test]
fn metrics_empty_input() {
    let m = metrics::analyze("");
    assert_eq!(m.character_count, 0);
    assert_eq!(m.word_count, 0);
    assert_eq!(m.emoji_count, 0);
}
