// Markdown campaign report writer.
//
// Produces a single self-contained report: the thread, per-tweet style
// tags, generated images (inlined as data URIs), the posting schedule,
// topic insights, and the action plan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::thread::ThreadData;

/// Write the campaign report for a thread. Returns the path written.
pub fn generate_report(thread: &ThreadData, path: &str) -> Result<String> {
    let report = render(thread);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
        }
    }

    fs::write(path, report).with_context(|| format!("Failed to write report to {path}"))?;

    Ok(path.to_string())
}

/// Render the report body.
fn render(thread: &ThreadData) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Thread Campaign: {}\n\n", thread.topic));
    out.push_str(&format!("Generated on {}.\n\n", thread.generated_at));

    out.push_str("## Thread\n\n");
    for (i, tweet) in thread.tweets.iter().enumerate() {
        out.push_str(&format!("### Tweet {}\n\n", i + 1));
        out.push_str(&format!("{}\n\n", tweet.content));

        if !tweet.style.style_tags.is_empty() {
            let tags: Vec<&str> = tweet.style.style_tags.iter().map(|t| t.as_str()).collect();
            out.push_str(&format!("Tags: `{}`\n\n", tags.join("`, `")));
        }
        out.push_str(&format!(
            "Scores: native {:.0}, clout {:.0}, ratio {:.0}\n\n",
            tweet.style.twitter_native_score, tweet.style.clout_factor, tweet.style.ratio_potential
        ));

        if let Some(image) = &tweet.image {
            out.push_str(&format!(
                "![Tweet {} image](data:image/png;base64,{image})\n\n",
                i + 1
            ));
        }
    }

    if !thread.schedule.is_empty() {
        out.push_str("## Posting Schedule\n\n");
        out.push_str("| # | Slot |\n|---|------|\n");
        for post in &thread.schedule {
            out.push_str(&format!("| {} | {} |\n", post.tweet_number, post.scheduled_time));
        }
        out.push('\n');
    }

    if !thread.insights.is_empty() {
        out.push_str("## Topic Insights\n\n");

        if !thread.insights.top_news.is_empty() {
            out.push_str("### News\n\n");
            for item in &thread.insights.top_news {
                out.push_str(&format!("- {} — {} ({})\n", item.title, item.source, item.date));
            }
            out.push('\n');
        }

        if !thread.insights.related_questions.is_empty() {
            out.push_str("### People Also Ask\n\n");
            for q in &thread.insights.related_questions {
                out.push_str(&format!("- **{}** {}\n", q.question, q.snippet));
            }
            out.push('\n');
        }

        if !thread.insights.related_searches.is_empty() {
            out.push_str("### Related Searches\n\n");
            out.push_str(&format!("{}\n\n", thread.insights.related_searches.join(", ")));
        }
    }

    out.push_str("## Action Plan\n\n");
    out.push_str(&thread.action_plan);
    out.push('\n');

    out
}
