//! Recording requests
//!
//! A recording request names the room, the moment the request arrived and
//! the MP4 file the platform should write.

use crate::platform::CompositeRecording;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// File name timestamp, e.g. `20240101_100000`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Source of "now" for naming recordings
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// One start-recording call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRequest {
    pub room_name: String,
    pub timestamp: NaiveDateTime,
    pub file_path: PathBuf,
}

impl RecordingRequest {
    /// `{dir}/{room}-{YYYYMMDD_HHMMSS}.mp4`
    pub fn new(recordings_dir: &Path, room_name: &str, timestamp: NaiveDateTime) -> Self {
        let file_name = format!("{}.mp4", file_stem(room_name, timestamp));

        Self {
            room_name: room_name.to_string(),
            timestamp,
            file_path: recordings_dir.join(file_name),
        }
    }

    /// Mixed audio and video of every participant
    pub fn composite(&self, layout: &str) -> CompositeRecording {
        CompositeRecording {
            room_name: self.room_name.clone(),
            file_path: self.file_path.clone(),
            layout: layout.to_string(),
            audio: true,
            video: true,
        }
    }
}

pub fn file_stem(room_name: &str, timestamp: NaiveDateTime) -> String {
    format!("{}-{}", room_name, timestamp.format(TIMESTAMP_FORMAT))
}

/// Room names end up in file names, so they may not climb out of the
/// recordings directory.
pub fn is_safe_room_name(room_name: &str) -> bool {
    !room_name.contains(['/', '\\']) && room_name != "." && room_name != ".."
}
