//! YouTube client built on `rusty_ytdl`.

use std::time::Duration;

use rusty_ytdl::Video;
use rusty_ytdl::search::{SearchOptions, SearchResult, SearchType, YouTube};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while resolving a video.
#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error("no results found for query")]
    NoResults,

    #[error("search failed: {0}")]
    Search(#[source] rusty_ytdl::VideoError),

    #[error("failed to get video info: {0}")]
    VideoInfo(#[source] rusty_ytdl::VideoError),

    #[error("no audio stream available")]
    NoAudio,
}

/// A resolved video with its best audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub id: String,
    pub title: String,
    pub duration: Duration,
    pub stream_url: String,
}

/// The parts of a stream format that matter for picking audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub has_audio: bool,
    pub has_video: bool,
    pub bitrate: u64,
    pub url: String,
}

/// Returns true if `text` is a YouTube link rather than a search query.
#[must_use]
pub fn is_youtube_url(text: &str) -> bool {
    text.contains("youtube.com") || text.contains("youtu.be")
}

/// Picks the stream URL to hand out.
///
/// Audio-only formats win over muxed ones; within a group the highest bitrate
/// wins. Formats without audio or without a URL are never picked.
#[must_use]
pub fn pick_audio(formats: &[AudioFormat]) -> Option<&str> {
    formats
        .iter()
        .filter(|f| f.has_audio && !f.url.is_empty())
        .max_by_key(|f| (!f.has_video, f.bitrate))
        .map(|f| f.url.as_str())
}

/// Looks up videos and their audio streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct YoutubeClient;

impl YoutubeClient {
    /// Creates a new client.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves a link or a search query to an [`AudioTrack`].
    ///
    /// A query is searched and the first video result is used.
    pub async fn resolve_audio(&self, query: &str) -> Result<AudioTrack, YoutubeError> {
        let url = if is_youtube_url(query) {
            query.to_owned()
        } else {
            self.search_first(query).await?
        };

        debug!("Fetching video info for {}", url);
        let video = Video::new(url.as_str()).map_err(YoutubeError::VideoInfo)?;
        let info = video.get_info().await.map_err(YoutubeError::VideoInfo)?;

        let formats: Vec<AudioFormat> = info
            .formats
            .iter()
            .map(|f| AudioFormat {
                has_audio: f.has_audio,
                has_video: f.has_video,
                bitrate: f.bitrate,
                url: f.url.clone(),
            })
            .collect();

        let stream_url = pick_audio(&formats).ok_or(YoutubeError::NoAudio)?.to_owned();
        let details = info.video_details;
        let seconds = details.length_seconds.parse::<u64>().unwrap_or_else(|_| {
            warn!("Unparseable video length: {:?}", details.length_seconds);
            0
        });

        Ok(AudioTrack {
            id: details.video_id,
            title: details.title,
            duration: Duration::from_secs(seconds),
            stream_url,
        })
    }

    async fn search_first(&self, query: &str) -> Result<String, YoutubeError> {
        let youtube = YouTube::new().map_err(YoutubeError::Search)?;
        let options = SearchOptions {
            limit: 1,
            search_type: SearchType::Video,
            ..Default::default()
        };

        let results = youtube
            .search(query, Some(&options))
            .await
            .map_err(YoutubeError::Search)?;

        results
            .into_iter()
            .find_map(|result| match result {
                SearchResult::Video(video) => {
                    Some(format!("https://www.youtube.com/watch?v={}", video.id))
                }
                _ => None,
            })
            .ok_or(YoutubeError::NoResults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(has_audio: bool, has_video: bool, bitrate: u64, url: &str) -> AudioFormat {
        AudioFormat {
            has_audio,
            has_video,
            bitrate,
            url: url.to_owned(),
        }
    }

    #[test]
    fn test_is_youtube_url() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_youtube_url("never gonna give you up"));
    }

    #[test]
    fn test_pick_audio_prefers_audio_only() {
        let formats = vec![
            format(true, true, 900_000, "muxed"),
            format(true, false, 128_000, "audio-low"),
            format(true, false, 160_000, "audio-high"),
            format(false, true, 2_000_000, "video"),
        ];
        assert_eq!(pick_audio(&formats), Some("audio-high"));
    }

    #[test]
    fn test_pick_audio_falls_back_to_muxed() {
        let formats = vec![
            format(false, true, 2_000_000, "video"),
            format(true, true, 500_000, "muxed"),
        ];
        assert_eq!(pick_audio(&formats), Some("muxed"));
    }

    #[test]
    fn test_pick_audio_none() {
        assert_eq!(pick_audio(&[]), None);
        assert_eq!(pick_audio(&[format(false, true, 1, "video")]), None);
        assert_eq!(pick_audio(&[format(true, false, 1, "")]), None);
    }
}
