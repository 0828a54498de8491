use std::path::{Path, PathBuf};

use gifbeat::{GifbeatError, GifbeatResult, Sample, SampleSink, SinkConfig};

/// Writes each sample as `frame_000000.png`, `frame_000001.png`, ... under one directory.
///
/// `abort` removes the files written so far.
pub struct PngSequenceSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl SampleSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> GifbeatResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            GifbeatError::encoder(format!("create output dir '{}': {e}", self.dir.display()))
        })?;
        self.written.clear();
        tracing::debug!(
            dir = %self.dir.display(),
            samples = cfg.total_samples,
            "png sequence started"
        );
        Ok(())
    }

    fn push_sample(&mut self, sample: &Sample) -> GifbeatResult<()> {
        let path = self.path_for(sample.index.0);
        write_png(&path, &sample.frame)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> GifbeatResult<()> {
        Ok(())
    }

    fn abort(&mut self) {
        for path in self.written.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output");
            }
        }
    }
}

pub fn write_png(path: &Path, frame: &gifbeat::FrameRGBA) -> GifbeatResult<()> {
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| GifbeatError::encoder(format!("write png '{}': {e}", path.display())))
}
