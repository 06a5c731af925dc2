use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::AnalysisError;
use crate::models::{SideFields, VideoRecord};

use chrono::Datelike;
use rand::SeedableRng;
use rand::rngs::StdRng;
use unicode_segmentation::UnicodeSegmentation;

/// Videos below this many views are candidates for the least-viewed sample.
pub const LOW_VIEW_THRESHOLD: u64 = 100;

/// Fixed seed so the least-viewed sample is identical across runs.
const SAMPLE_SEED: u64 = 0;

const DECILES: usize = 10;

pub const FUNNY_KEYWORD: &str = "funny";

/// Title shown when no description mentions the keyword at all.
pub const NO_FUNNY_MATCH: &str = "You dont like funny videos?";

// ---------------------------------------------------------------------------
// Duration formatting
// ---------------------------------------------------------------------------

/// A "year" here is 52 weeks.
const INTERVALS: [(&str, u64); 6] = [
    ("years", 31_449_600),
    ("weeks", 604_800),
    ("days", 86_400),
    ("hours", 3_600),
    ("minutes", 60),
    ("seconds", 1),
];

/// Formats seconds as "1 week, 2 days, 1 hour, 5 seconds". Zero units are
/// skipped, so zero seconds formats as an empty string.
pub fn format_duration_long(total_secs: u64) -> String {
    let mut remaining = total_secs;
    let mut parts = Vec::new();

    for (name, size) in INTERVALS {
        let value = remaining / size;
        if value > 0 {
            remaining -= value * size;
            let name = if value == 1 {
                name.trim_end_matches('s')
            } else {
                name
            };
            parts.push(format!("{value} {name}"));
        }
    }

    parts.join(", ")
}

pub fn total_watch_seconds(records: &[VideoRecord]) -> u64 {
    records.iter().map(|r| r.duration).sum()
}

// ---------------------------------------------------------------------------
// Extremes
// ---------------------------------------------------------------------------

/// Highest key wins; ties keep the earliest item.
fn first_max<T, K: Ord>(items: impl IntoIterator<Item = (T, K)>) -> Option<(T, K)> {
    let mut best: Option<(T, K)> = None;
    for (item, key) in items {
        if best.as_ref().is_none_or(|(_, k)| key > *k) {
            best = Some((item, key));
        }
    }
    best
}

/// Lowest key wins; ties keep the earliest item.
fn first_min<T, K: Ord>(items: impl IntoIterator<Item = (T, K)>) -> Option<(T, K)> {
    let mut best: Option<(T, K)> = None;
    for (item, key) in items {
        if best.as_ref().is_none_or(|(_, k)| key < *k) {
            best = Some((item, key));
        }
    }
    best
}

pub fn most_viewed(records: &[VideoRecord]) -> Result<&VideoRecord, AnalysisError> {
    first_max(records.iter().filter_map(|r| r.view_count.map(|v| (r, v))))
        .map(|(r, _)| r)
        .ok_or_else(|| AnalysisError::insufficient("most viewed video"))
}

/// A reproducible sample of up to `k` videos with fewer than 100 views,
/// in sampled order.
pub fn least_viewed_sample(records: &[VideoRecord], k: usize) -> Vec<&VideoRecord> {
    let low: Vec<&VideoRecord> = records
        .iter()
        .filter(|r| r.view_count.is_some_and(|v| v < LOW_VIEW_THRESHOLD))
        .collect();

    let amount = low.len().min(k);
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    rand::seq::index::sample(&mut rng, low.len(), amount)
        .iter()
        .map(|i| low[i])
        .collect()
}

/// Most and least liked video inside one view-count decile.
#[derive(Debug, Clone, Copy)]
pub struct DecilePick<'a> {
    pub decile: usize,
    pub best: &'a VideoRecord,
    pub worst: &'a VideoRecord,
}

/// Splits videos into equal-frequency view-count buckets and picks the most
/// and least liked video of each.
///
/// Bucket edges are linearly interpolated quantiles; duplicate edges are
/// merged, so heavily tied data yields fewer than ten buckets. Buckets are
/// right-closed with the lowest edge included. Videos without a view count
/// are not bucketed, and buckets where no video has a like count are skipped.
pub fn decile_extremes(records: &[VideoRecord]) -> Result<Vec<DecilePick<'_>>, AnalysisError> {
    let viewed: Vec<(&VideoRecord, u64)> = records
        .iter()
        .filter_map(|r| r.view_count.map(|v| (r, v)))
        .collect();

    if viewed.is_empty() {
        return Err(AnalysisError::insufficient("view-count deciles"));
    }

    let mut sorted: Vec<f64> = viewed.iter().map(|(_, v)| *v as f64).collect();
    sorted.sort_by(f64::total_cmp);
    let edges = quantile_edges(&sorted, DECILES);
    let bins = edges.len().saturating_sub(1).max(1);

    let mut buckets: Vec<Vec<&VideoRecord>> = vec![Vec::new(); bins];
    for (record, views) in &viewed {
        let bin = if edges.len() < 2 {
            0
        } else {
            edges[1..]
                .partition_point(|&edge| edge < *views as f64)
                .min(bins - 1)
        };
        buckets[bin].push(*record);
    }

    let picks = buckets
        .iter()
        .enumerate()
        .filter_map(|(decile, bucket)| {
            let liked = || bucket.iter().filter_map(|r| r.like_count.map(|l| (*r, l)));
            let (best, _) = first_max(liked())?;
            let (worst, _) = first_min(liked())?;
            Some(DecilePick {
                decile,
                best,
                worst,
            })
        })
        .collect();

    Ok(picks)
}

fn quantile_edges(sorted: &[f64], bins: usize) -> Vec<f64> {
    let last = (sorted.len() - 1) as f64;
    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| {
            let pos = last * i as f64 / bins as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        })
        .collect();
    edges.dedup();
    edges
}

/// The last `n` videos of the history, which the export lists oldest-last.
pub fn oldest_videos(records: &[VideoRecord], n: usize) -> &[VideoRecord] {
    &records[records.len().saturating_sub(n)..]
}

pub fn oldest_upload(records: &[VideoRecord]) -> Result<&VideoRecord, AnalysisError> {
    first_min(records.iter().map(|r| (r, r.upload_date)))
        .map(|(r, _)| r)
        .ok_or_else(|| AnalysisError::insufficient("oldest upload"))
}

/// Returns (HD, UHD) counts. HD is 720p through 1080p inclusive.
pub fn resolution_counts(records: &[VideoRecord]) -> (usize, usize) {
    let heights = records.iter().filter_map(|r| r.height);
    heights.fold((0, 0), |(hd, uhd), h| match h {
        720..=1080 => (hd + 1, uhd),
        1081.. => (hd, uhd + 1),
        _ => (hd, uhd),
    })
}

// ---------------------------------------------------------------------------
// Description scanning
// ---------------------------------------------------------------------------

/// Number of distinct emoji in `text`. Each grapheme cluster is one
/// candidate, so flags, joined sequences and skin-tone variants count as
/// single emoji of their own.
pub fn emoji_variety(text: &str) -> usize {
    text.graphemes(true)
        .filter(|g| is_emoji(g))
        .collect::<HashSet<_>>()
        .len()
}

fn is_emoji(grapheme: &str) -> bool {
    if emojis::get(grapheme).is_some() {
        return true;
    }
    // Retry without skin-tone modifiers and variation selectors
    let base: String = grapheme
        .chars()
        .filter(|c| !matches!(c, '\u{1F3FB}'..='\u{1F3FF}' | '\u{FE0F}'))
        .collect();
    !base.is_empty() && base != grapheme && emojis::get(&base).is_some()
}

/// The video whose description uses the most distinct emoji. Videos without
/// a text description are not considered.
pub fn most_emoji_variety(records: &[VideoRecord]) -> Result<&VideoRecord, AnalysisError> {
    let scored = records
        .iter()
        .filter_map(|r| r.description.as_deref().map(|d| (r, emoji_variety(d))));

    first_max(scored)
        .map(|(r, _)| r)
        .ok_or_else(|| AnalysisError::insufficient("emoji variety"))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunniestResult<'a> {
    Found { record: &'a VideoRecord, count: usize },
    NoneFound,
}

impl FunniestResult<'_> {
    pub fn title(&self) -> &str {
        match self {
            Self::Found { record, .. } => &record.title,
            Self::NoneFound => NO_FUNNY_MATCH,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Found { count, .. } => *count,
            Self::NoneFound => 0,
        }
    }
}

/// Finds the description with the most case-insensitive occurrences of
/// `keyword`. No occurrence anywhere is reported as `NoneFound`.
pub fn funniest<'a>(
    records: &'a [VideoRecord],
    keyword: &str,
) -> Result<FunniestResult<'a>, AnalysisError> {
    let keyword = keyword.to_lowercase();
    let counts = records.iter().filter_map(|r| {
        r.description
            .as_deref()
            .map(|d| (r, d.to_lowercase().matches(keyword.as_str()).count()))
    });

    match first_max(counts) {
        None => Err(AnalysisError::insufficient("keyword occurrences")),
        Some((_, 0)) => Ok(FunniestResult::NoneFound),
        Some((record, count)) => Ok(FunniestResult::Found { record, count }),
    }
}

// ---------------------------------------------------------------------------
// Visual aggregates
// ---------------------------------------------------------------------------

/// Tag counts across the whole history, most frequent first.
pub fn tag_frequencies(side_fields: &[SideFields], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for side in side_fields {
        for tag in &side.tags {
            let normalized = tag.trim().to_lowercase();
            if !normalized.is_empty() {
                *counts.entry(normalized).or_default() += 1;
            }
        }
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

/// Number of watched videos per upload year, oldest year first.
pub fn uploads_by_year(records: &[VideoRecord]) -> Vec<(i32, usize)> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.upload_date.year()).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Upper bounds (exclusive) of the watch-length chart buckets, in seconds.
const DURATION_BUCKETS: [(&str, u64); 6] = [
    ("< 1 min", 60),
    ("1-5 min", 300),
    ("5-10 min", 600),
    ("10-20 min", 1_200),
    ("20-60 min", 3_600),
    ("1 h+", u64::MAX),
];

const VIEW_BUCKETS: [(&str, u64); 7] = [
    ("< 100", 100),
    ("100-1K", 1_000),
    ("1K-10K", 10_000),
    ("10K-100K", 100_000),
    ("100K-1M", 1_000_000),
    ("1M-10M", 10_000_000),
    ("10M+", u64::MAX),
];

/// Number of watched videos per length bucket. Every bucket is listed,
/// including empty ones.
pub fn duration_distribution(records: &[VideoRecord]) -> Vec<(&'static str, usize)> {
    bucket_counts(records.iter().map(|r| r.duration), &DURATION_BUCKETS)
}

/// Number of watched videos per view-count bucket. Videos without a view
/// count are left out.
pub fn view_distribution(records: &[VideoRecord]) -> Vec<(&'static str, usize)> {
    bucket_counts(records.iter().filter_map(|r| r.view_count), &VIEW_BUCKETS)
}

fn bucket_counts(
    values: impl Iterator<Item = u64>,
    buckets: &[(&'static str, u64)],
) -> Vec<(&'static str, usize)> {
    let mut counts = vec![0; buckets.len()];
    for value in values {
        let i = buckets
            .iter()
            .position(|(_, upper)| value < *upper)
            .unwrap_or(buckets.len() - 1);
        counts[i] += 1;
    }
    buckets
        .iter()
        .zip(counts)
        .map(|((label, _), n)| (*label, n))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use chrono::NaiveDate;

    pub(crate) fn make_record(title: &str, views: Option<u64>, likes: Option<u64>) -> VideoRecord {
        VideoRecord {
            title: title.to_string(),
            webpage_url: format!("https://www.youtube.com/watch?v={title}"),
            upload_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            duration: 60,
            view_count: views,
            like_count: likes,
            description: None,
            channel_id: format!("UC_{title}"),
            uploader: title.to_string(),
            height: None,
        }
    }

    fn with_description(title: &str, description: Option<&str>) -> VideoRecord {
        VideoRecord {
            description: description.map(String::from),
            ..make_record(title, Some(1), Some(1))
        }
    }

    // -- format_duration_long --

    #[test]
    fn format_duration_zero_is_empty() {
        assert_eq!(format_duration_long(0), "");
    }

    #[test]
    fn format_duration_singular_units() {
        assert_eq!(format_duration_long(1), "1 second");
        assert_eq!(format_duration_long(61), "1 minute, 1 second");
        assert_eq!(format_duration_long(31_449_600), "1 year");
    }

    #[test]
    fn format_duration_plural_and_skipped_units() {
        // 2 weeks + 3 hours + 2 seconds
        assert_eq!(
            format_duration_long(2 * 604_800 + 3 * 3_600 + 2),
            "2 weeks, 3 hours, 2 seconds"
        );
    }

    // -- extremes --

    #[test]
    fn most_viewed_picks_max_and_first_on_tie() {
        let records = vec![
            make_record("a", Some(5), None),
            make_record("b", None, None),
            make_record("c", Some(9), None),
            make_record("d", Some(9), None),
        ];
        let top = most_viewed(&records).unwrap();
        assert_eq!(top.title, "c");
        assert!(
            records
                .iter()
                .filter_map(|r| r.view_count)
                .all(|v| v <= top.view_count.unwrap())
        );
    }

    #[test]
    fn most_viewed_without_views_is_insufficient() {
        let records = vec![make_record("a", None, None)];
        assert!(matches!(
            most_viewed(&records),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(most_viewed(&[]).is_err());
    }

    #[test]
    fn least_viewed_sample_is_deterministic_and_bounded() {
        let records: Vec<VideoRecord> = (0..40)
            .map(|i| make_record(&format!("v{i}"), Some(i * 5), None))
            .collect();

        let first = least_viewed_sample(&records, 10);
        let second = least_viewed_sample(&records, 10);

        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.view_count.unwrap() < LOW_VIEW_THRESHOLD));

        let titles: HashSet<&str> = first.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles.len(), 10);
    }

    #[test]
    fn least_viewed_sample_takes_all_when_few() {
        let records = vec![
            make_record("low", Some(3), None),
            make_record("high", Some(1_000), None),
            make_record("unknown", None, None),
        ];
        let sample = least_viewed_sample(&records, 10);
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].title, "low");
    }

    #[test]
    fn decile_extremes_bucket_invariants() {
        let records: Vec<VideoRecord> = (0..100)
            .map(|i| make_record(&format!("v{i}"), Some(i * 10), Some((i * 37) % 101)))
            .collect();

        let picks = decile_extremes(&records).unwrap();
        assert_eq!(picks.len(), 10);
        for pick in &picks {
            assert!(pick.best.like_count >= pick.worst.like_count);
        }
        // First bucket holds the ten least viewed videos
        assert!(picks[0].best.view_count.unwrap() <= 90);
        assert!(picks[9].worst.view_count.unwrap() >= 900);
    }

    #[test]
    fn decile_extremes_with_ties_degrades() {
        let records: Vec<VideoRecord> = (0..20)
            .map(|i| make_record(&format!("v{i}"), Some(if i < 15 { 7 } else { 500 }), Some(i)))
            .collect();

        let picks = decile_extremes(&records).unwrap();
        assert!(!picks.is_empty());
        assert!(picks.len() < 10);
        for pick in &picks {
            assert!(pick.best.like_count >= pick.worst.like_count);
        }
    }

    #[test]
    fn decile_extremes_single_record() {
        let records = vec![make_record("only", Some(42), Some(3))];
        let picks = decile_extremes(&records).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].best.title, "only");
        assert_eq!(picks[0].worst.title, "only");
    }

    #[test]
    fn decile_extremes_ignores_missing_views() {
        let records = vec![
            make_record("none", None, Some(1_000)),
            make_record("a", Some(1), Some(1)),
            make_record("b", Some(2), Some(2)),
        ];
        let picks = decile_extremes(&records).unwrap();
        assert!(picks.iter().all(|p| p.best.title != "none"));
        assert!(decile_extremes(&records[..1]).is_err());
    }

    #[test]
    fn oldest_videos_is_tail() {
        let records: Vec<VideoRecord> = (0..15)
            .map(|i| make_record(&format!("v{i}"), None, None))
            .collect();
        let oldest = oldest_videos(&records, 10);
        assert_eq!(oldest.len(), 10);
        assert_eq!(oldest[0].title, "v5");
        assert_eq!(oldest_videos(&records[..3], 10).len(), 3);
    }

    #[test]
    fn oldest_upload_by_date() {
        let mut records = vec![make_record("new", None, None), make_record("old", None, None)];
        records[1].upload_date = NaiveDate::from_ymd_opt(2006, 5, 1).unwrap();
        assert_eq!(oldest_upload(&records).unwrap().title, "old");
    }

    #[test]
    fn resolution_counts_boundaries() {
        let records: Vec<VideoRecord> = [480, 720, 1080, 1081, 2160]
            .into_iter()
            .map(|h| VideoRecord {
                height: Some(h),
                ..make_record(&h.to_string(), None, None)
            })
            .chain(std::iter::once(make_record("unknown", None, None)))
            .collect();
        assert_eq!(resolution_counts(&records), (2, 2));
    }

    // -- description scanning --

    #[test]
    fn emoji_variety_counts_distinct() {
        assert_eq!(emoji_variety("no emoji here"), 0);
        assert_eq!(emoji_variety("\u{1F600}\u{1F600}\u{1F600}"), 1);
        assert_eq!(emoji_variety("fire \u{1F525} rocket \u{1F680} fire \u{1F525}"), 2);
    }

    #[test]
    fn emoji_variety_counts_whole_sequences() {
        // Flags are pairs of regional indicators
        assert_eq!(emoji_variety("\u{1F1FA}\u{1F1F8} \u{1F1EF}\u{1F1F5}"), 2);
        // Family joined with zero-width joiners
        assert_eq!(
            emoji_variety("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}"),
            1
        );
        // Thumbs up with and without a skin tone
        assert_eq!(emoji_variety("\u{1F44D} \u{1F44D}\u{1F3FD}"), 2);
        assert_eq!(emoji_variety("plain text, 123!"), 0);
    }

    #[test]
    fn most_emoji_variety_counts_flags() {
        let records = vec![
            with_description("smile", Some("\u{1F600}")),
            with_description("flags", Some("\u{1F1FA}\u{1F1F8} \u{1F1EF}\u{1F1F5}")),
        ];
        assert_eq!(most_emoji_variety(&records).unwrap().title, "flags");
    }

    #[test]
    fn most_emoji_variety_skips_missing_descriptions() {
        let records = vec![
            with_description("none", None),
            with_description("repeat", Some("\u{1F600}\u{1F600}\u{1F600}\u{1F600}")),
            with_description("varied", Some("\u{1F600} \u{1F525} \u{1F680}")),
            with_description("tie", Some("\u{1F680}\u{1F525}\u{1F600}")),
        ];
        assert_eq!(most_emoji_variety(&records).unwrap().title, "varied");
        assert!(most_emoji_variety(&records[..1]).is_err());
    }

    #[test]
    fn funniest_counts_case_insensitive() {
        let records = vec![
            with_description("first", Some("this is funny FUNNY")),
            with_description("second", Some("boring")),
            with_description("third", None),
        ];
        let result = funniest(&records, FUNNY_KEYWORD).unwrap();
        match result {
            FunniestResult::Found { record, count } => {
                assert_eq!(record.title, "first");
                assert_eq!(count, 2);
            }
            FunniestResult::NoneFound => panic!("expected a match"),
        }
    }

    #[test]
    fn funniest_without_matches_is_placeholder() {
        let records = vec![
            with_description("a", Some("serious content")),
            with_description("b", None),
        ];
        let result = funniest(&records, FUNNY_KEYWORD).unwrap();
        assert_eq!(result, FunniestResult::NoneFound);
        assert_eq!(result.title(), NO_FUNNY_MATCH);
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn funniest_without_descriptions_is_insufficient() {
        let records = vec![with_description("a", None)];
        assert!(funniest(&records, FUNNY_KEYWORD).is_err());
    }

    // -- visual aggregates --

    #[test]
    fn tag_frequencies_normalizes_and_ranks() {
        let side = vec![
            SideFields {
                tags: vec!["Rust".into(), "music".into(), " ".into()],
                ..Default::default()
            },
            SideFields {
                tags: vec!["rust".into()],
                ..Default::default()
            },
        ];
        let tags = tag_frequencies(&side, 10);
        assert_eq!(tags, vec![("rust".to_string(), 2), ("music".to_string(), 1)]);
        assert_eq!(tag_frequencies(&side, 1).len(), 1);
    }

    #[test]
    fn uploads_by_year_is_sorted() {
        let mut records = vec![make_record("a", None, None), make_record("b", None, None)];
        records[0].upload_date = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
        assert_eq!(uploads_by_year(&records), vec![(2015, 1), (2020, 1)]);
    }

    #[test]
    fn duration_distribution_buckets_by_length() {
        let records: Vec<VideoRecord> = [0, 59, 60, 299, 600, 3_599, 3_600, 36_000]
            .into_iter()
            .map(|secs| VideoRecord {
                duration: secs,
                ..make_record("v", None, None)
            })
            .collect();
        assert_eq!(
            duration_distribution(&records),
            vec![
                ("< 1 min", 2),
                ("1-5 min", 2),
                ("5-10 min", 0),
                ("10-20 min", 1),
                ("20-60 min", 1),
                ("1 h+", 2),
            ]
        );
    }

    #[test]
    fn view_distribution_skips_unknown_counts() {
        let records = vec![
            make_record("a", Some(5), None),
            make_record("b", Some(1_000), None),
            make_record("c", Some(2_500_000_000), None),
            make_record("d", None, None),
        ];
        let dist = view_distribution(&records);
        assert_eq!(dist.len(), 7);
        assert_eq!(dist[0], ("< 100", 1));
        assert_eq!(dist[2], ("1K-10K", 1));
        assert_eq!(dist[6], ("10M+", 1));
        assert_eq!(dist.iter().map(|(_, n)| n).sum::<usize>(), 3);
    }
}
