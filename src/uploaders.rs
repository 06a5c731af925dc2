use std::collections::{HashMap, HashSet};

use crate::error::AnalysisError;
use crate::models::{ChannelInfo, UploaderSummary, VideoRecord};
use crate::stats;

/// How many channels are enriched through the lookup service.
pub const TOP_UPLOADER_LIMIT: usize = 15;

/// Resolves channel ids to display metadata in one batched request.
///
/// Implementations may return fewer channels than requested, in any order.
pub trait ChannelLookup {
    fn lookup_channels(&self, ids: &[String]) -> Result<Vec<ChannelInfo>, AnalysisError>;
}

pub struct UploaderStats {
    pub top_uploaders: Vec<UploaderSummary>,
    pub most_played_artist: String,
    pub most_played_watchtime: String,
}

/// Runs the whole uploader roll-up. A failing lookup only empties
/// `top_uploaders`; the most played artist comes from local data.
pub fn aggregate(
    records: &[VideoRecord],
    lookup: &dyn ChannelLookup,
) -> Result<UploaderStats, AnalysisError> {
    let top_uploaders = top_uploaders(records, lookup, TOP_UPLOADER_LIMIT);
    let artist = most_played_artist(records)?;
    let watch_secs = uploader_watch_seconds(records, artist);

    Ok(UploaderStats {
        top_uploaders,
        most_played_artist: artist.to_string(),
        most_played_watchtime: stats::format_duration_long(watch_secs),
    })
}

/// Counts keys, keeping first-seen order so that a stable sort breaks ties
/// in favor of the key seen first.
fn count_first_seen<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts
}

/// Channel ids ranked by how many watched videos they uploaded.
pub fn rank_channels(records: &[VideoRecord], limit: usize) -> Vec<(&str, usize)> {
    let mut counts = count_first_seen(records.iter().map(|r| r.channel_id.as_str()));
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// The top `limit` channels enriched with display names and thumbnails.
/// Channels the lookup does not return are left out.
pub fn top_uploaders(
    records: &[VideoRecord],
    lookup: &dyn ChannelLookup,
    limit: usize,
) -> Vec<UploaderSummary> {
    let ranked = rank_channels(records, limit);
    if ranked.is_empty() {
        return vec![];
    }

    let ids: Vec<String> = ranked.iter().map(|(id, _)| id.to_string()).collect();
    let channels = match lookup.lookup_channels(&ids) {
        Ok(channels) => channels,
        Err(e) => {
            log::warn!("{e}; top uploaders will be empty");
            return vec![];
        }
    };

    let positions: HashMap<&str, (usize, usize)> = ranked
        .iter()
        .enumerate()
        .map(|(pos, (id, count))| (*id, (pos, *count)))
        .collect();

    let mut seen = HashSet::new();
    let mut summaries: Vec<(usize, UploaderSummary)> = channels
        .into_iter()
        .filter_map(|channel| {
            let &(pos, count) = positions.get(channel.id.as_str())?;
            if !seen.insert(pos) {
                return None;
            }
            Some((
                pos,
                UploaderSummary {
                    display_name: channel.display_name,
                    channel_id: channel.id,
                    thumbnail_url: channel.thumbnail_url,
                    watch_count: count,
                },
            ))
        })
        .collect();

    summaries.sort_by(|a, b| b.1.watch_count.cmp(&a.1.watch_count).then(a.0.cmp(&b.0)));
    summaries.into_iter().map(|(_, s)| s).collect()
}

/// The uploader display name that appears most often; ties go to the name
/// seen first.
///
/// This groups by display name, not channel id, so two channels sharing a
/// name are counted together.
pub fn most_played_artist(records: &[VideoRecord]) -> Result<&str, AnalysisError> {
    let counts = count_first_seen(records.iter().map(|r| r.uploader.as_str()));
    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name)
        .ok_or_else(|| AnalysisError::insufficient("most played artist"))
}

/// Total seconds watched of videos whose uploader display name is `uploader`.
pub fn uploader_watch_seconds(records: &[VideoRecord], uploader: &str) -> u64 {
    records
        .iter()
        .filter(|r| r.uploader == uploader)
        .map(|r| r.duration)
        .sum()
}
