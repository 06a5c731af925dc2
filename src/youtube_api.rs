use std::time::Duration;

use crate::error::AnalysisError;
use crate::models::ChannelInfo;
use crate::uploaders::ChannelLookup;

use serde_json::Value;
use ureq::Agent;
use url::Url;

const YOUTUBE_CHANNELS_API: &str = "https://www.googleapis.com/youtube/v3/channels";

/// Maximum number of channel IDs per API request (YouTube API limit).
const BATCH_SIZE: usize = 50;

/// Channel lookup backed by the YouTube Data API v3.
pub struct YouTubeChannels {
    api_key: Option<String>,
    agent: Agent,
    base_url: String,
}

impl YouTubeChannels {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self::with_base_url(api_key, timeout, YOUTUBE_CHANNELS_API)
    }

    pub fn with_base_url(api_key: Option<String>, timeout: Duration, base_url: &str) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            api_key,
            agent,
            base_url: base_url.to_string(),
        }
    }
}

impl ChannelLookup for YouTubeChannels {
    /// Sends one `channels.list` request for up to 50 ids.
    fn lookup_channels(&self, ids: &[String]) -> Result<Vec<ChannelInfo>, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalysisError::ExternalLookup("no YouTube Data API key configured".to_string())
        })?;

        if ids.len() > BATCH_SIZE {
            log::warn!(
                "Channel lookup limited to {BATCH_SIZE} of {} ids",
                ids.len()
            );
        }
        let id_param = ids
            .iter()
            .take(BATCH_SIZE)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let url = Url::parse_with_params(
            &self.base_url,
            &[("part", "snippet"), ("id", id_param.as_str()), ("key", api_key)],
        )
        .map_err(|e| AnalysisError::ExternalLookup(format!("invalid request url: {e}")))?;

        log::info!("Looking up {} channels", ids.len().min(BATCH_SIZE));

        // ureq 3.x returns Err for non-2xx status codes
        let mut response = match self.agent.get(url.as_str()).call() {
            Ok(resp) => resp,
            Err(ureq::Error::StatusCode(403)) => {
                return Err(AnalysisError::ExternalLookup(
                    "YouTube API returned 403 Forbidden. Check your API key \
                     and ensure the YouTube Data API v3 is enabled."
                        .to_string(),
                ));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(AnalysisError::ExternalLookup(format!(
                    "YouTube API returned HTTP {code}"
                )));
            }
            Err(e) => {
                return Err(AnalysisError::ExternalLookup(format!(
                    "failed to reach YouTube Data API: {e}"
                )));
            }
        };

        let body: Value = response.body_mut().read_json().map_err(|e| {
            AnalysisError::ExternalLookup(format!("failed to parse YouTube API response: {e}"))
        })?;

        parse_channels(&body)
    }
}

/// Extracts channel display metadata from a `channels.list` response.
/// The API leaves out `items` entirely when no id matched.
pub fn parse_channels(body: &Value) -> Result<Vec<ChannelInfo>, AnalysisError> {
    let items = match &body["items"] {
        Value::Null => return Ok(vec![]),
        Value::Array(items) => items,
        _ => {
            return Err(AnalysisError::ExternalLookup(
                "unexpected API response: 'items' is not an array".to_string(),
            ));
        }
    };

    let channels = items
        .iter()
        .filter_map(|item| {
            let id = item["id"].as_str().filter(|id| !id.is_empty())?;
            let snippet = &item["snippet"];

            let display_name = snippet["title"]
                .as_str()
                .unwrap_or("Unknown Channel")
                .to_string();

            let thumbnail_url = snippet["thumbnails"]["medium"]["url"]
                .as_str()
                .or_else(|| snippet["thumbnails"]["default"]["url"].as_str())
                .unwrap_or_default()
                .to_string();

            Some(ChannelInfo {
                id: id.to_string(),
                display_name,
                thumbnail_url,
            })
        })
        .collect();

    Ok(channels)
}
