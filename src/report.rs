use crate::error::AnalysisError;
use crate::models::{UploaderSummary, VideoRecord};
use crate::stats::{self, DecilePick, FunniestResult};
use crate::store::RecordStore;
use crate::uploaders::{self, ChannelLookup};

pub const OLDEST_VIDEO_COUNT: usize = 10;
pub const LEAST_VIEWED_COUNT: usize = 10;
pub const TAG_CLOUD_SIZE: usize = 100;

/// Everything shown for one run, borrowed from the record store it was
/// computed from.
pub struct Report<'a> {
    pub video_count: usize,
    pub formatted_time: String,

    pub most_viewed: &'a VideoRecord,
    pub least_viewed: Vec<&'a VideoRecord>,
    pub deciles: Vec<DecilePick<'a>>,

    pub most_emojis: &'a VideoRecord,
    pub funniest: FunniestResult<'a>,

    pub oldest_videos: &'a [VideoRecord],
    pub oldest_upload: &'a VideoRecord,

    pub hd: usize,
    pub uhd: usize,

    pub top_uploaders: Vec<UploaderSummary>,
    pub most_played_artist: String,
    pub most_played_watchtime: String,

    pub top_tags: Vec<(String, usize)>,
    pub uploads_by_year: Vec<(i32, usize)>,
    pub duration_distribution: Vec<(&'static str, usize)>,
    pub view_distribution: Vec<(&'static str, usize)>,
}

impl<'a> Report<'a> {
    /// Computes every section in order. Apart from the channel lookup, which
    /// degrades on its own, the first failing section aborts the report.
    pub fn assemble(
        store: &'a RecordStore,
        lookup: &dyn ChannelLookup,
    ) -> Result<Self, AnalysisError> {
        let records = store.records.as_slice();
        log::info!("Computing report over {} videos", records.len());

        let total_seconds = stats::total_watch_seconds(records);
        let formatted_time = stats::format_duration_long(total_seconds);

        let most_viewed = stats::most_viewed(records)?;
        let least_viewed = stats::least_viewed_sample(records, LEAST_VIEWED_COUNT);
        let deciles = stats::decile_extremes(records)?;

        let most_emojis = stats::most_emoji_variety(records)?;
        let funniest = stats::funniest(records, stats::FUNNY_KEYWORD)?;

        let oldest_videos = stats::oldest_videos(records, OLDEST_VIDEO_COUNT);
        let oldest_upload = stats::oldest_upload(records)?;

        let (hd, uhd) = stats::resolution_counts(records);

        let uploader_stats = uploaders::aggregate(records, lookup)?;

        Ok(Self {
            video_count: records.len(),
            formatted_time,
            most_viewed,
            least_viewed,
            deciles,
            most_emojis,
            funniest,
            oldest_videos,
            oldest_upload,
            hd,
            uhd,
            top_uploaders: uploader_stats.top_uploaders,
            most_played_artist: uploader_stats.most_played_artist,
            most_played_watchtime: uploader_stats.most_played_watchtime,
            top_tags: stats::tag_frequencies(&store.side_fields, TAG_CLOUD_SIZE),
            uploads_by_year: stats::uploads_by_year(records),
            duration_distribution: stats::duration_distribution(records),
            view_distribution: stats::view_distribution(records),
        })
    }
}
