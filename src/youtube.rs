//! YouTube Data API v3, first page of every listing only.

use chrono::{DateTime, Utc};
use err_derive::Error;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use std::time::Duration;

use log::*;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page the search and videos endpoints hand out.
const MAX_PAGE: usize = 50;
/// Comment threads are requested a full page at a time and cut locally.
const COMMENT_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error(display = "Request failed: {}", _0)]
    Http(#[error(source)] reqwest::Error),
    #[error(display = "API error {}: {}", code, message)]
    Api { code: u16, message: String },
    #[error(display = "Unreadable response: {}", _0)]
    Decode(#[error(source)] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoStats {
    pub id: String,
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub published_at: DateTime<Utc>,
}

pub trait CommentSource {
    fn search_videos(&self, query: &str, limit: usize) -> Result<Vec<String>, YoutubeError>;

    fn find_channel(&self, name: &str) -> Result<Option<String>, YoutubeError>;

    fn channel_videos(&self, channel_id: &str, limit: usize) -> Result<Vec<String>, YoutubeError>;

    fn comments(&self, video_id: &str, limit: usize) -> Result<Vec<String>, YoutubeError>;

    fn video_stats(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, YoutubeError>;
}

/// Comments of every video in order. A video whose comments cannot be
/// fetched (disabled, quota, network) contributes none.
pub fn collect_comments(source: &dyn CommentSource, video_ids: &[String], per_video: usize) -> Vec<String> {
    let mut all = vec![];
    for id in video_ids {
        match source.comments(id, per_video) {
            Ok(mut comments) => {
                debug!("{} comments from {}", comments.len(), id);
                all.append(&mut comments);
            }
            Err(e) => warn!("Skipping comments of {}: {}", id, e),
        }
    }
    all
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: String,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    published_at: DateTime<Utc>,
}

/// Counts arrive as decimal strings and vanish when the owner hides them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    view_count: Option<String>,
    #[serde(default)]
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

fn count(value: &Option<String>) -> u64 {
    value.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0)
}

impl From<VideoItem> for VideoStats {
    fn from(item: VideoItem) -> Self {
        Self {
            views: count(&item.statistics.view_count),
            likes: count(&item.statistics.like_count),
            id: item.id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
        }
    }
}

fn video_ids(listing: Listing<SearchItem>) -> Vec<String> {
    listing.items.into_iter().filter_map(|item| item.id.video_id).collect()
}

fn channel_id(listing: Listing<SearchItem>) -> Option<String> {
    listing.items.into_iter().find_map(|item| item.id.channel_id)
}

fn comment_texts(listing: Listing<CommentThread>, limit: usize) -> Vec<String> {
    listing
        .items
        .into_iter()
        .map(|thread| thread.snippet.top_level_comment.snippet.text_display)
        .take(limit)
        .collect()
}

pub struct YouTube {
    client: Client,
    api_key: String,
}

impl YouTube {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, YoutubeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, YoutubeError> {
        let url = format!("{}/{}", BASE_URL, endpoint);
        trace!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(YoutubeError::Api {
                code: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl CommentSource for YouTube {
    fn search_videos(&self, query: &str, limit: usize) -> Result<Vec<String>, YoutubeError> {
        let listing = self.get(
            "search",
            &[
                ("part", "snippet".into()),
                ("type", "video".into()),
                ("q", query.to_string()),
                ("maxResults", limit.min(MAX_PAGE).to_string()),
            ],
        )?;
        Ok(video_ids(listing))
    }

    fn find_channel(&self, name: &str) -> Result<Option<String>, YoutubeError> {
        let listing = self.get(
            "search",
            &[
                ("part", "snippet".into()),
                ("type", "channel".into()),
                ("q", name.to_string()),
                ("maxResults", "1".into()),
            ],
        )?;
        Ok(channel_id(listing))
    }

    fn channel_videos(&self, channel_id: &str, limit: usize) -> Result<Vec<String>, YoutubeError> {
        let listing = self.get(
            "search",
            &[
                ("part", "snippet".into()),
                ("type", "video".into()),
                ("channelId", channel_id.to_string()),
                ("order", "date".into()),
                ("maxResults", limit.min(MAX_PAGE).to_string()),
            ],
        )?;
        Ok(video_ids(listing))
    }

    fn comments(&self, video_id: &str, limit: usize) -> Result<Vec<String>, YoutubeError> {
        let listing = self.get(
            "commentThreads",
            &[
                ("part", "snippet".into()),
                ("videoId", video_id.to_string()),
                ("maxResults", COMMENT_PAGE.to_string()),
                ("textFormat", "plainText".into()),
            ],
        )?;
        Ok(comment_texts(listing, limit))
    }

    fn video_stats(&self, video_ids: &[String]) -> Result<Vec<VideoStats>, YoutubeError> {
        if video_ids.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<&str> = video_ids.iter().take(MAX_PAGE).map(String::as_str).collect();
        let listing: Listing<VideoItem> = self.get(
            "videos",
            &[("part", "snippet,statistics".into()), ("id", ids.join(","))],
        )?;
        Ok(listing.items.into_iter().map(VideoStats::from).collect())
    }
}
