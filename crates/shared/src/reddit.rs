use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SourceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Origin, Story};
use crate::normalize::{normalize_story_html, normalize_story_text};

/// Prefix that keeps external ids apart from user-submitted ones
pub const STORY_ID_PREFIX: &str = "reddit_";

/// Anything that can hand the aggregator a fresh batch of external stories
#[async_trait]
pub trait ExternalSource: Send + Sync {
    async fn fetch_external(&self) -> ServiceResult<Vec<Story>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub selftext_html: Option<String>,
    pub subreddit: String,
    #[serde(default)]
    pub ups: i64,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

/// Decode a `top.json` listing into its posts
pub fn parse_listing(body: &str) -> Result<Vec<Post>> {
    let listing: Listing =
        serde_json::from_str(body).context("Failed to parse Reddit listing")?;
    Ok(listing.data.children.into_iter().map(|c| c.data).collect())
}

/// Drop posts too short to narrate and map the rest into stories
pub fn posts_to_stories(posts: Vec<Post>, config: &SourceConfig) -> Vec<Story> {
    posts
        .into_iter()
        .filter(|post| {
            !post.selftext.trim().is_empty() && post.selftext.chars().count() >= config.min_length
        })
        .map(|post| post_to_story(post, config.max_text_length))
        // A body of nothing but entities or markup normalizes away
        .filter(|story| !story.text.is_empty())
        .collect()
}

fn post_to_story(post: Post, max_text_length: usize) -> Story {
    let text = match post.selftext_html.as_deref() {
        Some(html) if !html.trim().is_empty() => normalize_story_html(html, max_text_length),
        _ => normalize_story_text(&post.selftext, max_text_length),
    };

    Story {
        id: format!("{}{}", STORY_ID_PREFIX, post.id),
        title: post.title.trim().to_string(),
        text,
        origin: Origin::External {
            category: post.subreddit,
        },
        popularity: Some(post.ups.max(0) as u64),
        submitted_at: None,
    }
}

/// Fold per-category results into one batch.
///
/// A failed category is skipped. The whole call fails only when every
/// category failed or the source sent back no posts at all.
pub fn merge_category_results(
    results: Vec<(String, Result<Vec<Post>>)>,
    config: &SourceConfig,
) -> ServiceResult<Vec<Story>> {
    let mut posts = Vec::new();
    let mut failures = Vec::new();

    for (category, result) in results {
        match result {
            Ok(batch) => {
                debug!("r/{} returned {} posts", category, batch.len());
                posts.extend(batch);
            }
            Err(e) => {
                warn!("Failed to fetch r/{}: {:#}", category, e);
                failures.push(format!("r/{}: {}", category, e));
            }
        }
    }

    if posts.is_empty() {
        let reason = if failures.is_empty() {
            "source returned no posts".to_string()
        } else {
            failures.join("; ")
        };
        return Err(ServiceError::SourceUnavailable(reason));
    }

    let fetched = posts.len();
    let stories = posts_to_stories(posts, config);
    info!(
        "Kept {}/{} external posts long enough to narrate",
        stories.len(),
        fetched
    );
    Ok(stories)
}

pub struct RedditClient {
    client: Client,
    config: SourceConfig,
}

impl RedditClient {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn listing_url(&self, category: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .with_context(|| format!("Invalid source URL: {}", self.config.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Source URL cannot be a base: {}", self.config.base_url))?
            .pop_if_empty()
            .extend(["r", category, "top.json"]);
        url.query_pairs_mut()
            .append_pair("limit", &self.config.top_limit.to_string())
            .append_pair("t", &self.config.time_window);
        Ok(url)
    }

    pub async fn fetch_top(&self, category: &str) -> Result<Vec<Post>> {
        let url = self.listing_url(category)?;
        info!("Fetching posts from r/{}...", category);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch r/{}", category))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Reddit API returned error: {} - {}", status, error_text);
        }

        let body = response
            .text()
            .await
            .context("Failed to read Reddit response body")?;

        parse_listing(&body)
    }
}

#[async_trait]
impl ExternalSource for RedditClient {
    async fn fetch_external(&self) -> ServiceResult<Vec<Story>> {
        let categories = self.config.categories.clone();
        let concurrency = categories.len().max(1);

        // `buffered` keeps results in category order
        let results: Vec<(String, Result<Vec<Post>>)> = stream::iter(categories)
            .map(|category| async move {
                let result = self.fetch_top(&category).await;
                (category, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

        merge_category_results(results, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, body: &str, ups: i64) -> Post {
        Post {
            id: id.to_string(),
            title: format!("Title {}", id),
            selftext: body.to_string(),
            selftext_html: None,
            subreddit: "tifu".to_string(),
            ups,
        }
    }

    fn long_body() -> String {
        "This happened last week and I still think about it. ".repeat(3)
    }

    #[test]
    fn parses_listing_children() {
        let body = r#"{"kind":"Listing","data":{"after":null,"children":[
            {"kind":"t3","data":{"id":"abc","title":"TIFU","selftext":"text","subreddit":"tifu","ups":12}},
            {"kind":"t3","data":{"id":"def","title":"AITA","subreddit":"AmItheAsshole"}}
        ]}}"#;
        let posts = parse_listing(body).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].ups, 12);
        assert_eq!(posts[1].selftext, "");
        assert_eq!(posts[1].ups, 0);
    }

    #[test]
    fn malformed_listing_is_an_error() {
        assert!(parse_listing("<html>rate limited</html>").is_err());
        assert!(parse_listing(r#"{"data":{}}"#).is_err());
    }

    #[test]
    fn short_and_empty_bodies_are_dropped() {
        let config = SourceConfig::default();
        let posts = vec![
            post("a", &long_body(), 5),
            post("b", "", 9),
            post("c", "too short", 9),
            post("d", &"x".repeat(100), 0),
        ];
        let stories = posts_to_stories(posts, &config);
        let ids: Vec<_> = stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["reddit_a", "reddit_d"]);
    }

    #[test]
    fn bodies_that_normalize_to_nothing_are_dropped() {
        let config = SourceConfig::default();
        let posts = vec![
            post("zw", &"&#x200B;\n\n".repeat(15), 4),
            post("marks", &"** __ ~~\n\n".repeat(15), 4),
            post("real", &long_body(), 4),
        ];
        let stories = posts_to_stories(posts, &config);
        let ids: Vec<_> = stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["reddit_real"]);
        assert!(stories.iter().all(|s| !s.text.is_empty()));
    }

    #[test]
    fn length_counts_the_raw_body() {
        let config = SourceConfig::default();
        // 98 visible chars padded by surrounding whitespace to 100
        let body = format!(" {} ", "y".repeat(98));
        let stories = posts_to_stories(vec![post("pad", &body, 0)], &config);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].text, "y".repeat(98));
    }

    #[test]
    fn stories_carry_prefix_category_and_popularity() {
        let config = SourceConfig::default();
        let stories = posts_to_stories(vec![post("xyz", &long_body(), 42)], &config);
        let story = &stories[0];
        assert_eq!(story.id, "reddit_xyz");
        assert_eq!(story.origin.label(), "tifu");
        assert!(!story.origin.is_user_submitted());
        assert_eq!(story.popularity, Some(42));
        assert!(story.submitted_at.is_none());
    }

    #[test]
    fn negative_score_seeds_zero() {
        let config = SourceConfig::default();
        let stories = posts_to_stories(vec![post("neg", &long_body(), -3)], &config);
        assert_eq!(stories[0].seed_likes(), 0);
    }

    #[test]
    fn one_failed_category_does_not_sink_the_rest() {
        let config = SourceConfig::default();
        let results = vec![
            ("tifu".to_string(), Ok(vec![post("a", &long_body(), 1)])),
            ("AmItheAsshole".to_string(), Err(anyhow::anyhow!("timed out"))),
            ("TrueOffMyChest".to_string(), Ok(vec![post("b", &long_body(), 2)])),
        ];
        let stories = merge_category_results(results, &config).unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, "reddit_a");
        assert_eq!(stories[1].id, "reddit_b");
    }

    #[test]
    fn every_category_failing_is_unavailable() {
        let config = SourceConfig::default();
        let results = vec![
            ("tifu".to_string(), Err(anyhow::anyhow!("503"))),
            ("AmItheAsshole".to_string(), Err(anyhow::anyhow!("503"))),
        ];
        let err = merge_category_results(results, &config).unwrap_err();
        assert!(matches!(err, ServiceError::SourceUnavailable(_)));
    }

    #[test]
    fn filtered_to_nothing_is_not_a_failure() {
        let config = SourceConfig::default();
        let results = vec![("tifu".to_string(), Ok(vec![post("a", "short", 1)]))];
        let stories = merge_category_results(results, &config).unwrap();
        assert!(stories.is_empty());
    }

    #[test]
    fn no_posts_at_all_is_unavailable() {
        let config = SourceConfig::default();
        let results = vec![("tifu".to_string(), Ok(Vec::new()))];
        assert!(merge_category_results(results, &config).is_err());
    }

    fn listing_json(id: &str, category: &str, ups: i64) -> Vec<u8> {
        serde_json::json!({
            "kind": "Listing",
            "data": { "children": [ { "kind": "t3", "data": {
                "id": id,
                "title": format!("Title {}", id),
                "selftext": "This happened last week and I still think about it. ".repeat(3),
                "subreddit": category,
                "ups": ups,
            } } ] }
        })
        .to_string()
        .into_bytes()
    }

    fn client_for(base_url: String, categories: &[&str]) -> RedditClient {
        RedditClient::new(SourceConfig {
            base_url,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            timeout_secs: 5,
            ..SourceConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn failing_category_is_skipped_over_http() {
        let base_url = crate::test_server::serve(|target| match target {
            "/r/first/top.json?limit=30&t=week" => (200, listing_json("a", "first", 5)),
            "/r/second/top.json?limit=30&t=week" => (503, b"busy".to_vec()),
            "/r/third/top.json?limit=30&t=week" => (200, listing_json("c", "third", 1)),
            _ => (404, Vec::new()),
        })
        .await;
        let client = client_for(base_url, &["first", "second", "third"]);

        let stories = client.fetch_external().await.unwrap();

        let ids: Vec<_> = stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["reddit_a", "reddit_c"]);
        assert_eq!(stories[0].origin.label(), "first");
        assert_eq!(stories[0].popularity, Some(5));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base_url = crate::test_server::serve(|_| (429, b"slow down".to_vec())).await;
        let client = client_for(base_url, &["tifu"]);

        let err = client.fetch_top("tifu").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn every_category_down_over_http_is_unavailable() {
        let base_url = crate::test_server::serve(|target| {
            if target.starts_with("/r/broken/") {
                (200, b"<html>not json</html>".to_vec())
            } else {
                (500, Vec::new())
            }
        })
        .await;
        let client = client_for(base_url, &["broken", "down"]);

        let err = client.fetch_external().await.unwrap_err();
        assert!(matches!(err, ServiceError::SourceUnavailable(_)));
    }

    #[test]
    fn listing_url_has_window_and_limit() {
        let client = RedditClient::new(SourceConfig::default()).unwrap();
        let url = client.listing_url("tifu").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.reddit.com/r/tifu/top.json?limit=30&t=week"
        );
    }
}
