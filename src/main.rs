use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use ember::config::Config;
use ember::gemini::client::GeminiClient;
use ember::gemini::retry::{self, RetryPolicy};
use ember::gemini::{prompts, traits::TextGenerator};
use ember::insights::SerpClient;
use ember::output;
use ember::pipeline::thread::{ThreadGenerator, ThreadOptions};
use ember::scoring::{metrics, style};
use ember::{keys, schedule};

/// Ember: viral thread generation for X/Twitter.
///
/// Generates complete threads — hook, dueling perspectives, counterpoints,
/// finale — tuned by a style/virality scorer, with images, topic insights,
/// a posting schedule, and a campaign action plan.
#[derive(Parser)]
#[command(name = "ember", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a complete viral thread about a topic
    Generate {
        /// The topic to thread about
        topic: String,

        /// Maximum tweets in the thread (default: 5)
        #[arg(long, default_value = "5")]
        tweets: usize,

        /// Number of generation calls to run in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Skip image generation
        #[arg(long)]
        no_images: bool,

        /// Where to write the markdown report
        #[arg(long, default_value = "output/ember-thread.md")]
        out: String,
    },

    /// Style-score a text locally (no API calls)
    Score {
        /// The text to score
        text: Vec<String>,
    },

    /// Generate a single caption for a text
    Caption {
        /// What the caption should be about
        text: String,
    },

    /// Look up topic insights (news, questions, related searches)
    Insights {
        /// The topic to search
        topic: String,
    },

    /// Preview a posting schedule without generating anything
    Schedule {
        /// Number of tweets to schedule (default: 5)
        #[arg(long, default_value = "5")]
        tweets: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ember=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            topic,
            tweets,
            concurrency,
            no_images,
            out,
        } => {
            let config = Config::load()?;
            config.require_gemini()?;

            let pool = Arc::new(config.key_pool());
            println!(
                "Generating thread about {} ({} keys in rotation)...",
                topic.bold(),
                pool.len()
            );

            let client = Arc::new(GeminiClient::new(
                &config.gemini_api_url,
                &config.gemini_text_model,
                &config.gemini_image_model,
            )?);

            // Insights are optional — skip quietly when no key is set
            let insights = if config.serp_api_key.is_empty() {
                None
            } else {
                Some(SerpClient::new(
                    &config.serp_api_url,
                    config.serp_api_key.clone(),
                )?)
            };

            let options = ThreadOptions {
                thread_count: tweets,
                concurrency,
                with_images: !no_images,
                ..ThreadOptions::default()
            };
            let generator =
                ThreadGenerator::new(pool, client.clone(), client, insights).with_options(options);

            let thread = generator.generate(&topic).await;

            output::terminal::display_thread(&thread);

            let path = output::markdown::generate_report(&thread, &out)?;
            println!("\n{}", format!("Markdown report saved to: {path}").bold());
        }

        Commands::Score { text } => {
            let text = text.join(" ");
            if text.trim().is_empty() {
                anyhow::bail!("Nothing to score. Usage: ember score <text>");
            }

            let score = style::analyze(&text);
            let surface = metrics::analyze(&text);
            output::terminal::display_style_score(&text, &score, &surface);
        }

        Commands::Caption { text } => {
            let config = Config::load()?;
            config.require_gemini()?;

            let pool = config.key_pool();
            let client = GeminiClient::new(
                &config.gemini_api_url,
                &config.gemini_text_model,
                &config.gemini_image_model,
            )?;

            let prompt = prompts::caption(&text);
            let caption = retry::generate_or_fallback(
                &pool,
                &RetryPolicy::default(),
                |key: keys::ApiKey| {
                    let client = &client;
                    let prompt = &prompt;
                    async move { client.generate(prompt, &key).await }
                },
                || prompts::fallback_tweet(&text),
            )
            .await;

            println!("\n{}", caption.trim());

            let score = style::analyze(&caption);
            if !score.style_tags.is_empty() {
                let tags: Vec<&str> = score.style_tags.iter().map(|t| t.as_str()).collect();
                println!("  {}", format!("Tags: {}", tags.join(" ")).dimmed());
            }
        }

        Commands::Insights { topic } => {
            let config = Config::load()?;
            config.require_serp()?;

            let client = SerpClient::new(&config.serp_api_url, config.serp_api_key.clone())?;

            println!("Looking up insights for {}...", topic.bold());
            let insights = client.search(&topic).await?;

            if insights.is_empty() {
                println!("No insights found for this topic.");
            } else {
                output::terminal::display_insights(&insights);
            }
        }

        Commands::Schedule { tweets } => {
            let schedule = schedule::build_schedule(tweets);
            output::terminal::display_schedule(&schedule);
        }
    }

    Ok(())
}
