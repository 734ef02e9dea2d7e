// Topic insights — web search context for a thread topic.

pub mod client;

pub use client::{NewsItem, RelatedQuestion, SerpClient, TopicInsights};
