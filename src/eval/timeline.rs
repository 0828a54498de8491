use crate::foundation::error::{GifbeatError, GifbeatResult};

/// Uniform-cadence looping timeline over the source frames.
///
/// Every source frame is shown for the same `frame_duration_secs`, whatever per-frame delay the
/// source declares. `offset` rotates the loop's starting frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timeline {
    frame_duration_secs: f64,
    offset: i64,
    frame_count: usize,
}

impl Timeline {
    /// Validate and build a timeline.
    pub fn new(frame_duration_secs: f64, offset: i64, frame_count: usize) -> GifbeatResult<Self> {
        if !(frame_duration_secs.is_finite() && frame_duration_secs > 0.0) {
            return Err(GifbeatError::validation(format!(
                "frame duration must be finite and > 0, got {frame_duration_secs}"
            )));
        }
        if frame_count == 0 {
            return Err(GifbeatError::EmptySource);
        }
        Ok(Self {
            frame_duration_secs,
            offset,
            frame_count,
        })
    }

    /// Source frame shown at playback time `t` (seconds).
    ///
    /// `(floor(t / frame_duration) + offset) mod frame_count`, normalized into `[0, frame_count)`.
    pub fn map(&self, t: f64) -> usize {
        // `as` saturates out-of-range floats and maps NaN to 0.
        let step = (t / self.frame_duration_secs).floor() as i64;
        let idx = (i128::from(step) + i128::from(self.offset)).rem_euclid(self.frame_count as i128);
        idx as usize
    }

    /// Seconds each source frame is displayed.
    pub fn frame_duration_secs(&self) -> f64 {
        self.frame_duration_secs
    }

    /// Loop rotation.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Number of source frames in one loop.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Length of one full loop in seconds.
    pub fn period_secs(&self) -> f64 {
        self.frame_duration_secs * self.frame_count as f64
    }
}

/// One-shot form of [`Timeline::map`].
pub fn map_time(
    t: f64,
    frame_duration_secs: f64,
    offset: i64,
    frame_count: usize,
) -> GifbeatResult<usize> {
    Ok(Timeline::new(frame_duration_secs, offset, frame_count)?.map(t))
}

#[cfg(test)]
#[path = "../../tests/unit/eval/timeline.rs"]
mod tests;
