use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use crate::assets::patch::SourceFrame;
use crate::assets::store::PatchStore;
use crate::encode::sink::{Sample, SampleSink, SinkConfig};
use crate::eval::timeline::Timeline;
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{GifbeatError, GifbeatResult};
use crate::foundation::math::secs_to_micros;
use crate::render::reconstruct::Reconstructor;
use crate::session::settings::{ExportSettings, PlaybackParams};

/// Options controlling how an export executes. They never change its output.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportOpts {
    /// Validate and prepare source patches on the rayon pool.
    pub parallel_patch_prep: bool,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            parallel_patch_prep: true,
        }
    }
}

/// Export counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Samples a complete export delivers.
    pub samples_total: u64,
    /// Samples the sink accepted.
    pub samples_emitted: u64,
    /// Source patches composited.
    pub reconstructions: u64,
    /// Snapshot restores performed by restore-previous frames.
    pub restores: u64,
    /// Rectangles cleared by restore-background frames.
    pub clears: u64,
}

/// How an export ended when it did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Every sample was produced and the sink finished.
    Completed(ExportStats),
    /// The cancel flag was raised; the sink was told to discard its partial output.
    Cancelled(ExportStats),
}

impl ExportOutcome {
    /// Counters regardless of how the export ended.
    pub fn stats(&self) -> ExportStats {
        match self {
            Self::Completed(s) | Self::Cancelled(s) => *s,
        }
    }

    /// `true` for [`ExportOutcome::Completed`].
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Receiver of export progress in `[0, 1]`, non-decreasing, ending at `1.0` on completion.
pub trait Progress {
    /// Report the fraction of samples delivered so far.
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> Progress for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Progress receiver that ignores every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

/// One export: decoded frames + canvas + pacing, ready to stream samples into a sink.
///
/// Construction front-loads all validation (patch sizes, placements, pacing), so a run only fails
/// when the sink does.
#[derive(Clone, Debug)]
pub struct ExportSession {
    store: PatchStore,
    canvas: Canvas,
    playback: PlaybackParams,
    timeline: Timeline,
    opts: ExportOpts,
}

impl ExportSession {
    /// Build a session from decoded frames.
    #[tracing::instrument(skip(frames), fields(frames = frames.len()))]
    pub fn new(
        frames: Vec<SourceFrame>,
        canvas: Canvas,
        playback: PlaybackParams,
        opts: ExportOpts,
    ) -> GifbeatResult<Self> {
        canvas.validate()?;
        playback.validate()?;
        let store = PatchStore::build(frames, opts.parallel_patch_prep)?;
        Self::from_store(store, canvas, playback, opts)
    }

    /// Build a session from decoded frames and loaded settings.
    pub fn from_settings(frames: Vec<SourceFrame>, settings: &ExportSettings) -> GifbeatResult<Self> {
        Self::new(
            frames,
            settings.canvas,
            settings.playback,
            settings.opts.clone(),
        )
    }

    /// Build a session around an already prepared store.
    pub fn from_store(
        store: PatchStore,
        canvas: Canvas,
        playback: PlaybackParams,
        opts: ExportOpts,
    ) -> GifbeatResult<Self> {
        canvas.validate()?;
        playback.validate()?;
        if store.is_empty() {
            return Err(GifbeatError::EmptySource);
        }
        store.check_bounds(canvas)?;
        let timeline = Timeline::new(playback.frame_duration_secs, playback.offset, store.len())?;
        if playback.total_output_frames() == 0 {
            return Err(GifbeatError::validation(
                "export must produce at least one sample",
            ));
        }
        Ok(Self {
            store,
            canvas,
            playback,
            timeline,
            opts,
        })
    }

    /// Prepared source patches.
    pub fn store(&self) -> &PatchStore {
        &self.store
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Playback pacing.
    pub fn playback(&self) -> &PlaybackParams {
        &self.playback
    }

    /// Source-frame timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Execution options the session was built with.
    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    /// Samples a complete run delivers.
    pub fn total_samples(&self) -> u64 {
        self.playback.total_output_frames()
    }

    /// Stream every sample into `sink`, in timestamp order.
    ///
    /// The generation loop runs on the calling thread and owns the canonical buffer; the sink runs
    /// on one scoped worker. Each sample is handed over and acknowledged before progress is
    /// reported and the next sample is reconstructed, so the loop never runs ahead of the sink.
    /// `cancel` is polled before each sample. A sink error aborts the run and is returned as
    /// [`GifbeatError::EncoderRejected`]; no partial result survives.
    #[tracing::instrument(skip_all, fields(samples = self.total_samples()))]
    pub fn run(
        &self,
        sink: &mut dyn SampleSink,
        progress: &mut dyn Progress,
        cancel: &AtomicBool,
    ) -> GifbeatResult<ExportOutcome> {
        let total = self.total_samples();
        let cfg = SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.playback.output_fps,
            total_samples: total,
        };
        let mut recon = Reconstructor::new(self.canvas)?;

        let (end, emitted) = std::thread::scope(|scope| -> GifbeatResult<(ProduceEnd, u64)> {
            let (tx, rx) = mpsc::sync_channel::<SinkMsg>(0);
            let (ack_tx, ack_rx) = mpsc::sync_channel::<bool>(1);
            let enc = scope.spawn(move || drive_sink(sink, cfg, rx, ack_tx));

            let produced = self.produce(&mut recon, &tx, &ack_rx, progress, cancel);
            drop(tx);

            let enc_res = enc
                .join()
                .map_err(|_| GifbeatError::encoder("encoder worker panicked"))?;

            match (produced, enc_res) {
                (Err(e), _) => Err(e),
                (Ok(_), Err(e)) => {
                    tracing::warn!(error = %e, "export aborted by sink");
                    Err(e)
                }
                (Ok((ProduceEnd::SinkGone, _)), Ok(())) => Err(GifbeatError::encoder(
                    "encoder worker stopped accepting samples",
                )),
                (Ok(done), Ok(())) => Ok(done),
            }
        })?;

        let r = recon.stats();
        let stats = ExportStats {
            samples_total: total,
            samples_emitted: emitted,
            reconstructions: r.reconstructions,
            restores: r.restores,
            clears: r.clears,
        };
        match end {
            ProduceEnd::Cancelled => {
                tracing::info!(emitted, total, "export cancelled");
                Ok(ExportOutcome::Cancelled(stats))
            }
            _ => {
                tracing::info!(
                    samples = total,
                    restores = stats.restores,
                    clears = stats.clears,
                    "export completed"
                );
                Ok(ExportOutcome::Completed(stats))
            }
        }
    }

    /// Reproduce output sample `index` exactly as [`Self::run`] would deliver it.
    ///
    /// The reconstructor has no random access, so this replays steps `0..=index` on fresh state.
    #[tracing::instrument(skip(self))]
    pub fn render_sample_at(&self, index: FrameIndex) -> GifbeatResult<Sample> {
        let total = self.total_samples();
        if index.0 >= total {
            return Err(GifbeatError::validation(format!(
                "sample {} is outside the export ({total} samples)",
                index.0
            )));
        }
        let mut recon = Reconstructor::new(self.canvas)?;
        for i in 0..index.0 {
            self.advance(&mut recon, i)?;
        }
        self.step(&mut recon, index.0)
    }

    fn produce(
        &self,
        recon: &mut Reconstructor,
        tx: &mpsc::SyncSender<SinkMsg>,
        acks: &mpsc::Receiver<bool>,
        progress: &mut dyn Progress,
        cancel: &AtomicBool,
    ) -> GifbeatResult<(ProduceEnd, u64)> {
        let total = self.total_samples();
        let mut emitted = 0u64;
        for i in 0..total {
            if cancel.load(Ordering::Relaxed) {
                return Ok((ProduceEnd::Cancelled, emitted));
            }
            let sample = self.step(recon, i)?;
            if tx.send(SinkMsg::Sample(sample)).is_err() {
                return Ok((ProduceEnd::SinkGone, emitted));
            }
            if acks.recv() != Ok(true) {
                return Ok((ProduceEnd::SinkGone, emitted));
            }
            emitted += 1;
            progress.report(emitted as f64 / total as f64);
        }
        if tx.send(SinkMsg::Finish).is_err() {
            return Ok((ProduceEnd::SinkGone, emitted));
        }
        Ok((ProduceEnd::Completed, emitted))
    }

    /// Reconstruct the source frame for output sample `i`; returns `(source_index, t)`.
    fn advance(&self, recon: &mut Reconstructor, i: u64) -> GifbeatResult<(usize, f64)> {
        let t = self.playback.timestamp_secs(i);
        let src = self.timeline.map(t);
        recon.reconstruct(&self.store, src)?;
        Ok((src, t))
    }

    fn step(&self, recon: &mut Reconstructor, i: u64) -> GifbeatResult<Sample> {
        let (src, t) = self.advance(recon, i)?;
        Ok(Sample {
            index: FrameIndex(i),
            source_index: src,
            timestamp_us: secs_to_micros(t),
            duration_us: secs_to_micros(self.playback.seconds_per_output_frame()),
            frame: recon.buffer().to_frame(),
        })
    }
}

#[derive(Debug)]
enum SinkMsg {
    Sample(Sample),
    Finish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProduceEnd {
    Completed,
    Cancelled,
    SinkGone,
}

/// Encoder worker: feeds the sink until `Finish` (then `end`) or until the producer hangs up
/// (then `abort`). Every `push_sample` outcome is acknowledged on `acks`.
fn drive_sink(
    sink: &mut dyn SampleSink,
    cfg: SinkConfig,
    rx: mpsc::Receiver<SinkMsg>,
    acks: mpsc::SyncSender<bool>,
) -> GifbeatResult<()> {
    match feed_sink(sink, cfg, &rx, &acks) {
        Ok(true) => Ok(()),
        Ok(false) => {
            sink.abort();
            Ok(())
        }
        Err(e) => {
            sink.abort();
            Err(as_encoder_error(e))
        }
    }
}

fn feed_sink(
    sink: &mut dyn SampleSink,
    cfg: SinkConfig,
    rx: &mpsc::Receiver<SinkMsg>,
    acks: &mpsc::SyncSender<bool>,
) -> GifbeatResult<bool> {
    sink.begin(cfg)?;
    for msg in rx.iter() {
        match msg {
            SinkMsg::Sample(sample) => {
                let pushed = sink.push_sample(&sample);
                // The producer blocks on this before reconstructing the next sample.
                let _ = acks.send(pushed.is_ok());
                pushed?;
            }
            SinkMsg::Finish => {
                sink.end()?;
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn as_encoder_error(e: GifbeatError) -> GifbeatError {
    match e {
        GifbeatError::EncoderRejected(_) => e,
        other => GifbeatError::encoder(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/export.rs"]
mod tests;
