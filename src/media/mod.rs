//! Capture sources published by the streamer
//!
//! Sources are descriptions handed to ffmpeg: RTSP demuxing, PulseAudio
//! capture and noise suppression all happen inside the ffmpeg process.

mod ffmpeg;
mod source;

pub use ffmpeg::{parse_major_version, FfmpegPusher, PusherArgs};
pub use source::{
    AudioSource, MediaSource, RtspTimeoutOption, TrackKind, VideoSource, NOISE_SUPPRESSION_ARGS,
    RTSP_RECONNECT_INTERVAL,
};
