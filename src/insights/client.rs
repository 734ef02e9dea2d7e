// HTTP client for the SerpAPI Google search endpoint.
//
// Pulls news headlines, related questions, and related searches for a
// topic, reshaped into the small TopicInsights record the pipeline and
// reports consume. Insights are garnish: callers degrade to an empty
// TopicInsights when the search fails rather than aborting a thread.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default SerpAPI endpoint.
pub const DEFAULT_SERP_API_URL: &str = "https://serpapi.com";

/// How many news items to keep.
const MAX_NEWS: usize = 5;
/// How many related questions to keep.
const MAX_QUESTIONS: usize = 5;
/// How many related searches to keep.
const MAX_SEARCHES: usize = 8;

/// Search-derived context for a topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicInsights {
    pub top_news: Vec<NewsItem>,
    pub related_questions: Vec<RelatedQuestion>,
    pub related_searches: Vec<String>,
}

impl TopicInsights {
    pub fn is_empty(&self) -> bool {
        self.top_news.is_empty()
            && self.related_questions.is_empty()
            && self.related_searches.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedQuestion {
    pub question: String,
    pub snippet: String,
}

/// Client for the SerpAPI search endpoint.
pub struct SerpClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SerpClient {
    /// Create a client pointing at the given base URL.
    ///
    /// Pass a different URL for testing against a local stub.
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ember/0.1 (thread-studio)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Search a topic and reshape the response into TopicInsights.
    pub async fn search(&self, query: &str) -> Result<TopicInsights> {
        let url = format!("{}/search", self.base_url);

        debug!(query = query, "SerpAPI search");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("q", query),
                ("location", "United States"),
                ("num", "10"),
                ("hl", "en"),
                ("engine", "google"),
            ])
            .send()
            .await
            .context("SerpAPI request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("SerpAPI returned {status}: {body}");
        }

        let raw: SearchResponse = response
            .json()
            .await
            .context("Failed to parse SerpAPI response")?;

        Ok(reshape(raw))
    }
}

/// Reduce the sprawling search payload to the fields reports care about.
fn reshape(raw: SearchResponse) -> TopicInsights {
    TopicInsights {
        top_news: raw
            .news_results
            .into_iter()
            .take(MAX_NEWS)
            .map(|n| NewsItem {
                title: n.title.unwrap_or_default(),
                source: n.source.unwrap_or_default(),
                date: n.date.unwrap_or_default(),
            })
            .collect(),
        related_questions: raw
            .related_questions
            .into_iter()
            .take(MAX_QUESTIONS)
            .map(|q| RelatedQuestion {
                question: q.question.unwrap_or_default(),
                snippet: q.snippet.unwrap_or_default(),
            })
            .collect(),
        related_searches: raw
            .related_searches
            .into_iter()
            .filter_map(|s| s.query)
            .take(MAX_SEARCHES)
            .collect(),
    }
}

// --- SerpAPI response types (only the slices we read) ---

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Vec<RawNews>,
    #[serde(default)]
    related_questions: Vec<RawQuestion>,
    #[serde(default)]
    related_searches: Vec<RawSearch>,
}

#[derive(Deserialize)]
struct RawNews {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Deserialize)]
struct RawSearch {
    #[serde(default)]
    query: Option<String>,
}
