//! YouTube lookup for `/yt`.
//!
//! Resolves a search query or a video link to the video's details and a
//! direct audio stream URL.

mod client;

pub use client::{AudioFormat, AudioTrack, YoutubeClient, YoutubeError, is_youtube_url, pick_audio};
