// Colored terminal output for threads, scores, and insights.
//
// This module owns all terminal-specific formatting: colors, tables,
// section headers. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::insights::TopicInsights;
use crate::output::preview;
use crate::pipeline::thread::ThreadData;
use crate::schedule::ScheduledPost;
use crate::scoring::metrics::TweetMetrics;
use crate::scoring::style::StyleScore;

/// Display a generated thread with per-tweet style tags.
pub fn display_thread(thread: &ThreadData) {
    println!(
        "\n{}",
        format!(
            "=== Thread: {} ({} tweets, {}) ===",
            thread.topic,
            thread.tweets.len(),
            thread.generated_at
        )
        .bold()
    );

    for (i, tweet) in thread.tweets.iter().enumerate() {
        println!("\n{}", format!("-- Tweet {} --", i + 1).bold());
        println!("{}", tweet.content);

        let tags: Vec<&str> = tweet.style.style_tags.iter().map(|t| t.as_str()).collect();
        let native = format!("native {:.0}", tweet.style.twitter_native_score);
        let clout = format!("clout {:.0}", tweet.style.clout_factor);
        if tags.is_empty() {
            println!("  {}", format!("[{native}, {clout}]").dimmed());
        } else {
            println!(
                "  {}",
                format!("[{native}, {clout}] {}", tags.join(" ")).dimmed()
            );
        }

        if tweet.image.is_some() {
            println!("  {}", "(image attached)".dimmed());
        }
    }

    if !thread.schedule.is_empty() {
        display_schedule(&thread.schedule);
    }
    if !thread.insights.is_empty() {
        display_insights(&thread.insights);
    }

    println!("\n{}", "=== Action Plan ===".bold());
    println!("{}", thread.action_plan);
}

/// Display the style score and surface metrics for one text.
pub fn display_style_score(text: &str, score: &StyleScore, metrics: &TweetMetrics) {
    println!("\n{}", "=== Style Score ===".bold());
    println!("  {}", preview(text, 100).dimmed());
    println!();

    let rows = [
        ("Sass", score.sass_level),
        ("Meme density", score.meme_density),
        ("Engagement", score.engagement_potential),
        ("Dark humor", score.dark_humor_score),
        ("Slang", score.slang_usage),
        ("Argument", score.argument_strength),
        ("Contemporary", score.contemporary_score),
        ("Perspective", score.perspective_balance),
    ];
    for (label, value) in rows {
        println!("  {label:<14} {}", score_bar(value));
    }
    println!("  {:<14} {}", "Viral formats", score.viral_format_count);

    println!();
    println!("  {:<14} {:>5.1}", "Clout".bold(), score.clout_factor);
    println!(
        "  {:<14} {:>5.1}",
        "Native".bold(),
        score.twitter_native_score
    );
    println!(
        "  {:<14} {:>5.1}",
        "Ratio bait".bold(),
        score.ratio_potential
    );

    if !score.style_tags.is_empty() {
        let tags: Vec<&str> = score.style_tags.iter().map(|t| t.as_str()).collect();
        println!("\n  Tags: {}", tags.join(" ").yellow());
    }

    println!(
        "\n  {} chars, {} words, {} emoji, {} hashtags, {} mentions{}",
        metrics.character_count,
        metrics.word_count,
        metrics.emoji_count,
        metrics.hashtag_count,
        metrics.mention_count,
        if metrics.fits_in_tweet() {
            String::new()
        } else {
            format!(" {}", "(over 280!)".red())
        }
    );
}

/// Display topic insights as bulleted sections.
pub fn display_insights(insights: &TopicInsights) {
    println!("\n{}", "=== Topic Insights ===".bold());

    if !insights.top_news.is_empty() {
        println!("\n  {}", "News".bold());
        for item in &insights.top_news {
            let mut line = item.title.clone();
            if !item.source.is_empty() {
                line.push_str(&format!(" — {}", item.source));
            }
            if !item.date.is_empty() {
                line.push_str(&format!(" ({})", item.date));
            }
            println!("  - {line}");
        }
    }

    if !insights.related_questions.is_empty() {
        println!("\n  {}", "People also ask".bold());
        for q in &insights.related_questions {
            println!("  - {}", q.question);
            if !q.snippet.is_empty() {
                println!("    {}", preview(&q.snippet, 120).dimmed());
            }
        }
    }

    if !insights.related_searches.is_empty() {
        println!("\n  {}", "Related searches".bold());
        println!("  {}", insights.related_searches.join(", "));
    }
}

/// Display a posting schedule as a numbered list.
pub fn display_schedule(schedule: &[ScheduledPost]) {
    println!("\n{}", "=== Posting Schedule ===".bold());
    for post in schedule {
        println!("  {:>2}. {}", post.tweet_number, post.scheduled_time);
    }
}

/// Render a 0-100 value as a small bar with the number alongside.
fn score_bar(value: f64) -> String {
    let filled = (value / 10.0).round() as usize;
    let bar: String = "█".repeat(filled.min(10)) + &"░".repeat(10usize.saturating_sub(filled));
    format!("{bar} {value:>5.1}")
}
