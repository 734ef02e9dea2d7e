// Thread pipeline — assembles a complete viral thread.
//
// The flow mirrors how a ghostwriter would work: hook first, then two
// continuation batches arguing each side, counterpoints against a random
// subset of those, a finale, and a pass that punches up anything that
// reads too corporate. Image prompts and images come last. Every
// generation step degrades to a deterministic fallback, so the pipeline
// always returns a full ThreadData.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::gemini::prompts::{self, Perspective};
use crate::gemini::retry::{self, RetryPolicy};
use crate::gemini::traits::{ImageGenerator, TextGenerator};
use crate::insights::{SerpClient, TopicInsights};
use crate::keys::KeyPool;
use crate::schedule::{self, ScheduledPost};
use crate::scoring::style::{self, StyleScore};

use super::tasks;

/// Transition lines occasionally spliced in when the thread flips sides.
const TRANSITIONS: &[&str] = &[
    "Now here's where it gets spicy... ",
    "BUT WAIT bestie, consider this... ",
    "Plot twist incoming... ",
    "Hot take loading... ",
    "Unpopular opinion time... ",
    "Let's flip the script real quick... ",
    "Tea time besties... ",
    "The discourse™ continues... ",
    "Meanwhile, in another timeline... ",
    "Prepare for a reality check... ",
];

/// Native score below which a tweet goes through enhancement.
const NATIVE_SCORE_TARGET: f64 = 70.0;

/// 1x1 transparent PNG, base64-encoded. Fills the image slot when image
/// generation falls back, so downstream consumers always get valid PNG data.
pub const PLACEHOLDER_IMAGE_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct ThreadOptions {
    /// Maximum tweets in the final thread.
    pub thread_count: usize,
    /// Fan-out width for counterpoint and image generation.
    pub concurrency: usize,
    /// Whether to generate images at all.
    pub with_images: bool,
    /// Probability a continuation tweet receives a counterpoint.
    pub counterpoint_odds: f64,
    /// Probability a transition line lands before a tweet.
    pub transition_odds: f64,
    /// Probability a tweet gets an image.
    pub image_odds: f64,
}

impl Default for ThreadOptions {
    fn default() -> Self {
        Self {
            thread_count: 5,
            concurrency: 4,
            with_images: true,
            counterpoint_odds: 0.3,
            transition_odds: 0.3,
            image_odds: 0.5,
        }
    }
}

/// One tweet of the assembled thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadTweet {
    pub content: String,
    pub style: StyleScore,
    pub image_prompt: Option<String>,
    /// Base64 PNG payload when an image was generated (the placeholder
    /// when generation fell back; None when this tweet got no image).
    pub image: Option<String>,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadData {
    pub topic: String,
    pub generated_at: String,
    pub tweets: Vec<ThreadTweet>,
    pub schedule: Vec<ScheduledPost>,
    pub insights: TopicInsights,
    pub action_plan: String,
}

/// Orchestrates generation clients, the key pool, and the scorer into
/// complete threads.
pub struct ThreadGenerator {
    pool: Arc<KeyPool>,
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    insights: Option<SerpClient>,
    policy: RetryPolicy,
    pub options: ThreadOptions,
}

impl ThreadGenerator {
    pub fn new(
        pool: Arc<KeyPool>,
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        insights: Option<SerpClient>,
    ) -> Self {
        Self {
            pool,
            text,
            image,
            insights,
            policy: RetryPolicy::default(),
            options: ThreadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ThreadOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the full pipeline for one topic.
    pub async fn generate(&self, topic: &str) -> ThreadData {
        let date = Local::now().format("%B %d, %Y").to_string();
        info!(topic = topic, date = %date, "Generating viral thread");

        let hook = self
            .text_or(prompts::hook(topic, &date), prompts::fallback_tweet(topic))
            .await;
        let hook = self.optimize_tweet(&hook).await;

        let supporting = self
            .continuation(topic, &hook, Perspective::Supporting, &date)
            .await;
        let opposing = self
            .continuation(topic, &hook, Perspective::Opposing, &date)
            .await;

        // Counterpoints fan out over every continuation tweet
        let continuation_tweets: Vec<String> = supporting
            .iter()
            .chain(opposing.iter())
            .cloned()
            .collect();
        let counterpoints = self
            .counterpoints(topic, &continuation_tweets, &date)
            .await;

        let finale = self
            .text_or(prompts::finale(topic, &date), prompts::fallback_tweet(topic))
            .await;
        let finale = self.optimize_tweet(&finale).await;

        // Assemble: hook, interleaved middle with transitions, finale.
        // The cap applies to the assembled list, so an oversized middle
        // can push the finale off the end.
        let mut contents = {
            let mut rng = rand::thread_rng();
            let mut middle = interleave_with_transitions(
                &supporting,
                &opposing,
                self.options.transition_odds,
                &mut rng,
            );
            splice_counterpoints(
                &mut middle,
                counterpoints,
                self.options.transition_odds,
                &mut rng,
            );
            let mut all = vec![hook];
            all.extend(middle);
            all.push(finale);
            all
        };
        contents.truncate(self.options.thread_count.max(1));

        // Optimize every tweet and derive its image prompt
        let slots = tasks::run(
            contents,
            self.options.concurrency,
            |_, tweet| async move {
                let optimized = self.optimize_tweet(&tweet).await;
                let image_prompt = self
                    .text_or(
                        prompts::image_prompt(&optimized),
                        prompts::fallback_image_prompt(&optimized),
                    )
                    .await;
                Ok::<_, anyhow::Error>((optimized, image_prompt))
            },
            |_, tweet| (tweet.clone(), prompts::fallback_image_prompt(tweet)),
        )
        .await;

        let mut tweets: Vec<ThreadTweet> = slots
            .into_iter()
            .map(|slot| {
                let (content, image_prompt) = slot.value;
                let style = style::analyze(&content);
                ThreadTweet {
                    content,
                    style,
                    image_prompt: Some(image_prompt),
                    image: None,
                }
            })
            .collect();

        if self.options.with_images {
            let jobs: Vec<(usize, String)> = {
                let mut rng = rand::thread_rng();
                tweets
                    .iter()
                    .enumerate()
                    .filter(|_| rng.gen_bool(self.options.image_odds))
                    .filter_map(|(i, t)| t.image_prompt.clone().map(|p| (i, p)))
                    .collect()
            };
            for (index, image) in self.images(jobs).await {
                if let Some(tweet) = tweets.get_mut(index) {
                    tweet.image = image;
                }
            }
        }

        // Insights are garnish — degrade to empty when the search fails
        let insights = match &self.insights {
            Some(client) => match client.search(topic).await {
                Ok(insights) => insights,
                Err(err) => {
                    warn!(error = %err, "Insights lookup failed, continuing without");
                    TopicInsights::default()
                }
            },
            None => TopicInsights::default(),
        };

        let schedule = schedule::build_schedule(tweets.len());
        let action_plan = self.action_plan(topic, &tweets, &schedule, &date).await;

        ThreadData {
            topic: topic.to_string(),
            generated_at: date,
            tweets,
            schedule,
            insights,
            action_plan,
        }
    }

    /// Score a tweet and, when it reads too corporate, ask the model to
    /// punch it up. The enhanced version is kept only when its native
    /// score actually improves.
    pub async fn optimize_tweet(&self, tweet: &str) -> String {
        let before = style::analyze(tweet);
        if before.twitter_native_score >= NATIVE_SCORE_TARGET {
            return tweet.to_string();
        }

        let enhanced = self
            .text_or(prompts::enhance(tweet), tweet.to_string())
            .await;

        let after = style::analyze(&enhanced);
        if after.twitter_native_score > before.twitter_native_score {
            info!(
                before = before.twitter_native_score,
                after = after.twitter_native_score,
                "Tweet enhanced"
            );
            enhanced
        } else {
            tweet.to_string()
        }
    }

    /// One retried text-generation call with a deterministic fallback.
    async fn text_or(&self, prompt: String, fallback: String) -> String {
        retry::generate_or_fallback(
            &self.pool,
            &self.policy,
            |key| {
                let client = &self.text;
                let prompt = &prompt;
                async move { client.generate(prompt, &key).await }
            },
            move || fallback,
        )
        .await
        .trim()
        .to_string()
    }

    /// Generate one perspective's continuation tweets off the hook.
    async fn continuation(
        &self,
        topic: &str,
        hook: &str,
        perspective: Perspective,
        date: &str,
    ) -> Vec<String> {
        let raw = self
            .text_or(
                prompts::continuation(topic, hook, perspective, date),
                prompts::fallback_tweet(topic),
            )
            .await;

        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(prompts::TWEETS_PER_CONTINUATION)
            .map(String::from)
            .collect()
    }

    /// Generate counterpoints against a random subset of the thread.
    async fn counterpoints(
        &self,
        topic: &str,
        continuation_tweets: &[String],
        date: &str,
    ) -> Vec<String> {
        let candidates: Vec<String> = {
            let mut rng = rand::thread_rng();
            continuation_tweets
                .iter()
                .filter(|_| rng.gen_bool(self.options.counterpoint_odds))
                .cloned()
                .collect()
        };
        if candidates.is_empty() {
            return Vec::new();
        }

        let pb = progress_bar(candidates.len() as u64, "Counterpoints");
        let slots = tasks::run(
            candidates,
            self.options.concurrency,
            |_, previous| {
                let pb = &pb;
                async move {
                    let prompt = prompts::counterpoint(topic, &previous, date);
                    let text =
                        retry::generate_with_retry(&self.pool, &self.policy, |key| {
                            let client = &self.text;
                            let prompt = &prompt;
                            async move { client.generate(prompt, &key).await }
                        })
                        .await?;
                    let optimized = self.optimize_tweet(text.trim()).await;
                    pb.inc(1);
                    Ok(optimized)
                }
            },
            |_, _| {
                pb.inc(1);
                prompts::fallback_counterpoint(topic)
            },
        )
        .await;
        pb.finish_and_clear();

        slots.into_iter().map(|slot| slot.value).collect()
    }

    /// Generate images for the selected (tweet index, image prompt) jobs.
    async fn images(&self, jobs: Vec<(usize, String)>) -> Vec<(usize, Option<String>)> {
        if jobs.is_empty() {
            return Vec::new();
        }

        let pb = progress_bar(jobs.len() as u64, "Images");
        let slots = tasks::run(
            jobs,
            self.options.concurrency,
            |_, (index, prompt)| {
                let pb = &pb;
                async move {
                    let bytes =
                        retry::generate_with_retry(&self.pool, &self.policy, |key| {
                            let client = &self.image;
                            let prompt = &prompt;
                            async move { client.generate_image(prompt, &key).await }
                        })
                        .await?;
                    pb.inc(1);
                    Ok((index, bytes.map(|b| BASE64.encode(b))))
                }
            },
            |_, &(index, _)| {
                pb.inc(1);
                (index, Some(PLACEHOLDER_IMAGE_B64.to_string()))
            },
        )
        .await;
        pb.finish_and_clear();

        slots.into_iter().map(|slot| slot.value).collect()
    }

    /// Ask for a campaign action plan covering the assembled thread.
    async fn action_plan(
        &self,
        topic: &str,
        tweets: &[ThreadTweet],
        schedule: &[ScheduledPost],
        date: &str,
    ) -> String {
        let tweets_text = tweets
            .iter()
            .enumerate()
            .map(|(i, t)| format!("Tweet {}: {}", i + 1, t.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        let schedule_text = schedule
            .iter()
            .map(|s| format!("Tweet {}: {}", s.tweet_number, s.scheduled_time))
            .collect::<Vec<_>>()
            .join("\n");

        self.text_or(
            prompts::action_plan(topic, &tweets_text, &schedule_text, date),
            prompts::fallback_action_plan(topic),
        )
        .await
    }
}

/// Interleave supporting and opposing tweets, occasionally dropping a
/// transition line in before one. Pairs beyond the shorter side are
/// dropped, matching the zip.
fn interleave_with_transitions(
    supporting: &[String],
    opposing: &[String],
    transition_odds: f64,
    rng: &mut impl Rng,
) -> Vec<String> {
    let mut middle = Vec::new();
    for (s, o) in supporting.iter().zip(opposing.iter()) {
        if rng.gen_bool(transition_odds) {
            middle.push(random_transition(rng));
        }
        middle.push(s.clone());
        if rng.gen_bool(transition_odds) {
            middle.push(random_transition(rng));
        }
        middle.push(o.clone());
    }
    middle
}

/// Insert counterpoints at random positions, each optionally preceded by
/// a transition line.
fn splice_counterpoints(
    middle: &mut Vec<String>,
    counterpoints: Vec<String>,
    transition_odds: f64,
    rng: &mut impl Rng,
) {
    for counterpoint in counterpoints {
        let position = rng.gen_range(0..=middle.len());
        if rng.gen_bool(transition_odds) {
            middle.insert(position, random_transition(rng));
        }
        middle.insert(position, counterpoint);
    }
}

fn random_transition(rng: &mut impl Rng) -> String {
    TRANSITIONS[rng.gen_range(0..TRANSITIONS.len())].to_string()
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {msg} [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );
    pb.set_message(label.to_string());
    pb
}
