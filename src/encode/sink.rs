use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::GifbeatResult;
use crate::foundation::math::micros_to_secs;
use crate::render::buffer::FrameRGBA;

/// One reconstructed output frame, tagged for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Output sample index.
    pub index: FrameIndex,
    /// Source frame that was reconstructed for this sample.
    pub source_index: usize,
    /// Presentation timestamp in microseconds.
    pub timestamp_us: u64,
    /// Presentation duration in microseconds.
    pub duration_us: u64,
    /// Reconstructed pixels.
    pub frame: FrameRGBA,
}

impl Sample {
    /// Presentation timestamp in seconds.
    pub fn timestamp_secs(&self) -> f64 {
        micros_to_secs(self.timestamp_us)
    }

    /// Presentation duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        micros_to_secs(self.duration_us)
    }
}

/// Configuration provided to a [`SampleSink`] before the first sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Number of samples a complete export delivers.
    pub total_samples: u64,
}

/// Encoder-side contract for consuming samples.
///
/// Ordering contract: `push_sample` is called in strictly increasing timestamp order. `end` is
/// called only after the last sample of a complete export; a failed or cancelled export calls
/// `abort` instead, and the sink should discard what it has produced.
pub trait SampleSink: Send {
    /// Called once before any samples are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> GifbeatResult<()>;
    /// Accept one sample. An error aborts the export.
    fn push_sample(&mut self, sample: &Sample) -> GifbeatResult<()>;
    /// Called once after the last sample is pushed.
    fn end(&mut self) -> GifbeatResult<()>;
    /// Called instead of `end` when the export stops early.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Samples in timeline order.
    pub(crate) samples: Vec<Sample>,
    finished: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Take ownership of the captured samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    /// `true` once `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl SampleSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> GifbeatResult<()> {
        self.cfg = Some(cfg);
        self.samples.clear();
        self.finished = false;
        Ok(())
    }

    fn push_sample(&mut self, sample: &Sample) -> GifbeatResult<()> {
        self.samples.push(sample.clone());
        Ok(())
    }

    fn end(&mut self) -> GifbeatResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.samples.clear();
    }
}

/// Sink that folds every sample into a streaming xxh3 digest.
///
/// Two exports produce the same digest exactly when they deliver identical timestamps, durations
/// and pixels, without keeping any frame in memory.
pub struct HashingSink {
    hasher: xxhash_rust::xxh3::Xxh3,
    samples: u64,
    digest: Option<u64>,
}

impl HashingSink {
    /// Create a new hashing sink.
    pub fn new() -> Self {
        Self {
            hasher: xxhash_rust::xxh3::Xxh3::new(),
            samples: 0,
            digest: None,
        }
    }

    /// Final digest, available after a complete export.
    pub fn digest(&self) -> Option<u64> {
        self.digest
    }

    /// Samples folded in so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl Default for HashingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HashingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingSink")
            .field("samples", &self.samples)
            .field("digest", &self.digest)
            .finish()
    }
}

impl SampleSink for HashingSink {
    fn begin(&mut self, cfg: SinkConfig) -> GifbeatResult<()> {
        self.hasher.reset();
        self.hasher.update(&cfg.width.to_le_bytes());
        self.hasher.update(&cfg.height.to_le_bytes());
        self.samples = 0;
        self.digest = None;
        Ok(())
    }

    fn push_sample(&mut self, sample: &Sample) -> GifbeatResult<()> {
        self.hasher.update(&sample.timestamp_us.to_le_bytes());
        self.hasher.update(&sample.duration_us.to_le_bytes());
        self.hasher.update(&sample.frame.data);
        self.samples += 1;
        Ok(())
    }

    fn end(&mut self) -> GifbeatResult<()> {
        self.digest = Some(self.hasher.digest());
        Ok(())
    }

    fn abort(&mut self) {
        self.digest = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
