use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "YOUTUBE_DATA_API_KEY";

const DEFAULT_DOWNLOADER: &str = "yt-dlp";
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// One watched video, normalized from a downloader `.info.json` file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub title: String,
    pub webpage_url: String,
    pub upload_date: NaiveDate,
    pub duration: u64,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub description: Option<String>,
    pub channel_id: String,
    pub uploader: String,
    pub height: Option<u32>,
}

/// Variable-length fields stripped from a record before normalization.
/// Stored at the same position as the record they came from.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SideFields {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub thumbnails: Vec<String>,
    pub formats: Vec<String>,
}

/// Shape of a raw downloader metadata file. Only the fields we use are read.
#[derive(Deserialize, Debug)]
pub struct RawVideoInfo {
    pub title: String,
    pub webpage_url: String,
    pub upload_date: String,
    #[serde(deserialize_with = "whole_seconds")]
    pub duration: u64,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "text_only")]
    pub description: Option<String>,
    pub channel_id: String,
    pub uploader: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub thumbnails: Option<Vec<RawThumbnail>>,
    #[serde(default)]
    pub formats: Option<Vec<RawFormat>>,
}

#[derive(Deserialize, Debug)]
pub struct RawThumbnail {
    pub url: String,
}

#[derive(Deserialize, Debug)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: Option<String>,
}

impl RawVideoInfo {
    /// Splits the raw file into the tabular record and its side fields.
    /// Fails only when `upload_date` is not a `YYYYMMDD` date.
    pub fn into_parts(self) -> Result<(VideoRecord, SideFields), chrono::ParseError> {
        let upload_date = NaiveDate::parse_from_str(&self.upload_date, "%Y%m%d")?;

        let side = SideFields {
            tags: self.tags.unwrap_or_default(),
            categories: self.categories.unwrap_or_default(),
            thumbnails: self
                .thumbnails
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.url)
                .collect(),
            formats: self
                .formats
                .unwrap_or_default()
                .into_iter()
                .filter_map(|f| f.format_id)
                .collect(),
        };

        let record = VideoRecord {
            title: self.title,
            webpage_url: self.webpage_url,
            upload_date,
            duration: self.duration,
            view_count: self.view_count,
            like_count: self.like_count,
            description: self.description,
            channel_id: self.channel_id,
            uploader: self.uploader,
            height: self.height,
        };

        Ok((record, side))
    }
}

/// Durations come as integers from most extractors and as floats from some.
fn whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(secs) = value.as_u64() {
        return Ok(secs);
    }
    match value.as_f64() {
        Some(secs) if secs >= 0.0 => Ok(secs.round() as u64),
        _ => Err(serde::de::Error::custom(format!(
            "invalid duration: {value}"
        ))),
    }
}

/// Keeps a description only if it is actually text.
fn text_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Display metadata returned by the channel lookup service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub display_name: String,
    pub thumbnail_url: String,
}

/// A top-N channel enriched with its display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct UploaderSummary {
    pub display_name: String,
    pub channel_id: String,
    pub thumbnail_url: String,
    pub watch_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub youtube_api_key: Option<String>,
    pub downloader: Option<String>,
    pub lookup_timeout_secs: Option<u64>,
}

impl Config {
    /// The environment variable takes precedence over the stored key.
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.youtube_api_key.clone())
    }

    pub fn downloader(&self) -> &str {
        self.downloader.as_deref().unwrap_or(DEFAULT_DOWNLOADER)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(
            self.lookup_timeout_secs
                .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_json(extra: &str) -> String {
        format!(
            r#"{{
                "title": "A video",
                "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "upload_date": "20091025",
                "channel_id": "UC123",
                "uploader": "Someone"{extra}
            }}"#
        )
    }

    #[test]
    fn raw_info_splits_side_fields() {
        let json = raw_json(
            r#",
            "duration": 213,
            "view_count": 1000,
            "height": 1080,
            "description": "hello",
            "tags": ["music", "80s"],
            "categories": ["Music"],
            "thumbnails": [{"url": "https://i.ytimg.com/a.jpg", "id": "0"}],
            "formats": [{"format_id": "18"}, {"ext": "mp4"}]"#,
        );
        let raw: RawVideoInfo = serde_json::from_str(&json).unwrap();
        let (record, side) = raw.into_parts().unwrap();

        assert_eq!(record.upload_date, NaiveDate::from_ymd_opt(2009, 10, 25).unwrap());
        assert_eq!(record.duration, 213);
        assert_eq!(record.view_count, Some(1000));
        assert_eq!(record.like_count, None);
        assert_eq!(record.height, Some(1080));
        assert_eq!(side.tags, vec!["music", "80s"]);
        assert_eq!(side.thumbnails, vec!["https://i.ytimg.com/a.jpg"]);
        assert_eq!(side.formats, vec!["18"]);
    }

    #[test]
    fn float_duration_is_rounded() {
        let raw: RawVideoInfo =
            serde_json::from_str(&raw_json(r#", "duration": 59.6"#)).unwrap();
        assert_eq!(raw.duration, 60);
    }

    #[test]
    fn non_text_description_is_absent() {
        let raw: RawVideoInfo = serde_json::from_str(&raw_json(
            r#", "duration": 1, "description": 42"#,
        ))
        .unwrap();
        assert_eq!(raw.description, None);

        let raw: RawVideoInfo = serde_json::from_str(&raw_json(
            r#", "duration": 1, "description": null"#,
        ))
        .unwrap();
        assert_eq!(raw.description, None);
    }

    #[test]
    fn missing_duration_is_rejected() {
        assert!(serde_json::from_str::<RawVideoInfo>(&raw_json("")).is_err());
    }

    #[test]
    fn bad_upload_date_is_rejected() {
        let json = raw_json(r#", "duration": 1"#).replace("20091025", "2009-10-25");
        let raw: RawVideoInfo = serde_json::from_str(&json).unwrap();
        assert!(raw.into_parts().is_err());
    }

    #[test]
    fn config_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.downloader(), "yt-dlp");
        assert_eq!(cfg.lookup_timeout(), Duration::from_secs(10));
    }
}
