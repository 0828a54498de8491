use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{GifbeatError, GifbeatResult};
use crate::session::export::ExportOpts;

/// Playback pacing for one export.
///
/// `total_duration_secs` usually comes from decoding the accompanying audio track; the frame
/// duration and offset usually come from aligning the loop to that track's tempo.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlaybackParams {
    /// Seconds each source frame is shown, uniform across frames.
    pub frame_duration_secs: f64,
    /// Rotation applied to the looping frame index. May be negative.
    #[serde(default)]
    pub offset: i64,
    /// Output video frame rate.
    pub output_fps: Fps,
    /// Length of the output timeline in seconds.
    pub total_duration_secs: f64,
}

impl PlaybackParams {
    /// Check the parameters an export relies on.
    pub fn validate(&self) -> GifbeatResult<()> {
        if !(self.frame_duration_secs.is_finite() && self.frame_duration_secs > 0.0) {
            return Err(GifbeatError::validation(format!(
                "frame_duration_secs must be finite and > 0, got {}",
                self.frame_duration_secs
            )));
        }
        if !(self.total_duration_secs.is_finite() && self.total_duration_secs > 0.0) {
            return Err(GifbeatError::validation(format!(
                "total_duration_secs must be finite and > 0, got {}",
                self.total_duration_secs
            )));
        }
        Fps::new(self.output_fps.num, self.output_fps.den)?;
        Ok(())
    }

    /// Presentation duration of every output sample.
    pub fn seconds_per_output_frame(&self) -> f64 {
        self.output_fps.frame_duration_secs()
    }

    /// `ceil(total_duration_secs * fps)`.
    pub fn total_output_frames(&self) -> u64 {
        self.output_fps.secs_to_frames_ceil(self.total_duration_secs)
    }

    /// Playback time of output sample `i`, capped at the total duration.
    pub fn timestamp_secs(&self, i: u64) -> f64 {
        (i as f64 * self.seconds_per_output_frame()).min(self.total_duration_secs)
    }
}

/// Everything an export needs besides the decoded frames, loadable from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportSettings {
    /// Output canvas size; normally the source animation's logical screen size.
    pub canvas: Canvas,
    /// Timeline pacing.
    pub playback: PlaybackParams,
    /// Execution options.
    #[serde(default)]
    pub opts: ExportOpts,
}

impl ExportSettings {
    /// Parse settings from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> GifbeatResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| GifbeatError::serde(format!("parse export settings JSON: {e}")))
    }

    /// Parse settings from a JSON string.
    pub fn from_json_str(s: &str) -> GifbeatResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| GifbeatError::serde(format!("parse export settings JSON: {e}")))
    }

    /// Parse settings from a JSON file on disk.
    ///
    /// IO failures surface as [`GifbeatError::Other`] with the path attached.
    pub fn from_path(path: impl AsRef<Path>) -> GifbeatResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open export settings '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> GifbeatResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GifbeatError::serde(format!("serialize export settings: {e}")))
    }

    /// Validate canvas and playback parameters.
    pub fn validate(&self) -> GifbeatResult<()> {
        self.canvas.validate()?;
        self.playback.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/settings.rs"]
mod tests;
