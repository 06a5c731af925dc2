use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use url::Url;

/// Location of the watch history inside an unzipped Google Takeout folder.
const WATCH_HISTORY: &str = "YouTube and YouTube Music/history/watch-history.html";

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());

/// YouTube IDs are exactly 11 characters,
/// containing A-Z, a-z, 0-9, - (hyphen), and _ (underscore).
static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

pub fn watch_history_path(takeout: &Path) -> PathBuf {
    takeout.join(WATCH_HISTORY)
}

/// Reads the Takeout watch history and returns one canonical watch URL per
/// entry, newest first as exported. Re-watches stay as separate entries.
pub fn read_watch_urls(takeout: &Path) -> Result<Vec<String>> {
    let path = watch_history_path(takeout);
    if !path.is_file() {
        bail!(
            "\"{}\" is not a file. Did you download your YouTube data?",
            path.display()
        );
    }

    let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let html = String::from_utf8_lossy(&bytes);
    Ok(extract_watch_urls(&html))
}

pub fn extract_watch_urls(html: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
        .filter(|href| href.contains("www.youtube.com/watch"))
        .filter_map(|href| match extract_video_id(&href) {
            Ok(id) => Some(build_canonical_url(&id)),
            Err(e) => {
                log::debug!("Skipping link {href}: {e}");
                None
            }
        })
        .collect()
}

pub fn write_url_list(path: &Path, urls: &[String]) -> Result<()> {
    fs::write(path, urls.join("\n"))
        .with_context(|| format!("failed to write url list: {}", path.display()))
}

/// Reads the `v` query parameter of a watch link.
pub fn extract_video_id(href: &str) -> Result<String> {
    let parsed = Url::parse(href.trim()).map_err(|_| anyhow!("Invalid URL format"))?;

    let id = parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| anyhow!("Could not find 'v' parameter in YouTube URL"))?;

    if is_valid_id_format(&id) {
        Ok(id)
    } else {
        Err(anyhow!("Extracted ID '{}' is invalid", id))
    }
}

pub fn build_canonical_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

fn is_valid_id_format(id: &str) -> bool {
    VIDEO_ID_RE.is_match(id)
}
