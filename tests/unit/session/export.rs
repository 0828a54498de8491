use std::sync::atomic::{AtomicBool, Ordering};

use super::*;
use crate::assets::patch::PatchRect;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::Fps;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn solid(rect: PatchRect, px: [u8; 4], disposal: u8) -> SourceFrame {
    SourceFrame::new(px.repeat(rect.pixel_count() as usize), rect, disposal)
}

fn playback(total: f64, fps: u32) -> PlaybackParams {
    PlaybackParams {
        frame_duration_secs: 0.1,
        offset: 0,
        output_fps: Fps::new(fps, 1).unwrap(),
        total_duration_secs: total,
    }
}

fn two_frame_session(total: f64, fps: u32) -> ExportSession {
    ExportSession::new(
        vec![
            solid(PatchRect::new(0, 0, 1, 1), RED, 0),
            solid(PatchRect::new(1, 0, 1, 1), BLUE, 0),
        ],
        Canvas::new(2, 1).unwrap(),
        playback(total, fps),
        ExportOpts::default(),
    )
    .unwrap()
}

#[derive(Default)]
struct FailingSink {
    accept: usize,
    pushed: usize,
    ended: bool,
    aborted: bool,
}

impl SampleSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> GifbeatResult<()> {
        Ok(())
    }

    fn push_sample(&mut self, _sample: &Sample) -> GifbeatResult<()> {
        if self.pushed == self.accept {
            return Err(GifbeatError::validation("disk full"));
        }
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> GifbeatResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[test]
fn default_opts_prepare_patches_in_parallel() {
    assert!(ExportOpts::default().parallel_patch_prep);
}

#[test]
fn run_delivers_every_sample_in_order() {
    let session = two_frame_session(0.3, 10);
    let mut sink = InMemorySink::new();
    let out = session
        .run(&mut sink, &mut NoProgress, &AtomicBool::new(false))
        .unwrap();

    assert!(out.is_completed());
    assert!(sink.is_finished());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.total_samples), (2, 1, 3));

    let samples = sink.samples();
    assert_eq!(samples.len(), 3);
    let sources: Vec<usize> = samples.iter().map(|s| s.source_index).collect();
    assert_eq!(sources, vec![0, 1, 0]);
    let stamps: Vec<u64> = samples.iter().map(|s| s.timestamp_us).collect();
    assert_eq!(stamps, vec![0, 100_000, 200_000]);
    assert!(samples.iter().all(|s| s.duration_us == 100_000));

    // Frame 1 overpaints in place, so the third sample still shows both patches.
    assert_eq!(samples[0].frame.data, [RED, [0; 4]].concat());
    assert_eq!(samples[2].frame.data, [RED, BLUE].concat());

    let stats = out.stats();
    assert_eq!(stats.samples_total, 3);
    assert_eq!(stats.samples_emitted, 3);
    assert_eq!(stats.reconstructions, 3);
}

#[test]
fn progress_is_monotonic_and_ends_at_one() {
    let session = two_frame_session(1.0, 30);
    let mut seen = Vec::new();
    let mut progress = |f: f64| seen.push(f);
    session
        .run(
            &mut InMemorySink::new(),
            &mut progress,
            &AtomicBool::new(false),
        )
        .unwrap();

    assert_eq!(seen.len(), 30);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn raised_cancel_flag_stops_before_the_first_sample() {
    let session = two_frame_session(1.0, 30);
    let mut sink = InMemorySink::new();
    let out = session
        .run(&mut sink, &mut NoProgress, &AtomicBool::new(true))
        .unwrap();

    assert_eq!(out, ExportOutcome::Cancelled(ExportStats {
        samples_total: 30,
        ..ExportStats::default()
    }));
    assert!(!sink.is_finished());
    assert!(sink.samples().is_empty());
}

#[test]
fn sink_rejection_aborts_without_end() {
    let session = two_frame_session(1.0, 30);
    let mut sink = FailingSink {
        accept: 4,
        ..FailingSink::default()
    };
    let err = session
        .run(&mut sink, &mut NoProgress, &AtomicBool::new(false))
        .unwrap_err();

    assert!(matches!(err, GifbeatError::EncoderRejected(_)), "{err}");
    assert!(err.to_string().contains("disk full"));
    assert_eq!(sink.pushed, 4);
    assert!(sink.aborted);
    assert!(!sink.ended);
}

#[test]
fn progress_counts_only_samples_the_sink_accepted() {
    let session = two_frame_session(1.0, 30);
    let mut sink = FailingSink {
        accept: 22,
        ..FailingSink::default()
    };
    let mut seen = Vec::new();
    let mut progress = |f: f64| seen.push(f);
    let err = session
        .run(&mut sink, &mut progress, &AtomicBool::new(false))
        .unwrap_err();

    assert!(matches!(err, GifbeatError::EncoderRejected(_)), "{err}");
    assert_eq!(sink.pushed, 22);
    assert_eq!(seen.len(), sink.pushed);
    let max = seen.iter().copied().fold(0.0, f64::max);
    assert_eq!(max, sink.pushed as f64 / 30.0);
}

/// Raises the cancel flag from inside `push_sample` once `after` samples were accepted.
struct CancelInside<'a> {
    flag: &'a AtomicBool,
    after: usize,
    seen: usize,
}

impl SampleSink for CancelInside<'_> {
    fn begin(&mut self, _cfg: SinkConfig) -> GifbeatResult<()> {
        Ok(())
    }

    fn push_sample(&mut self, _sample: &Sample) -> GifbeatResult<()> {
        self.seen += 1;
        if self.seen == self.after {
            self.flag.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    fn end(&mut self) -> GifbeatResult<()> {
        Ok(())
    }
}

#[test]
fn next_sample_is_not_reconstructed_before_the_sink_accepts() {
    let session = two_frame_session(1.0, 30);
    let flag = AtomicBool::new(false);
    let mut sink = CancelInside {
        flag: &flag,
        after: 7,
        seen: 0,
    };
    let out = session.run(&mut sink, &mut NoProgress, &flag).unwrap();

    let ExportOutcome::Cancelled(stats) = out else {
        panic!("expected cancellation, got {out:?}");
    };
    assert_eq!(sink.seen, 7);
    assert_eq!(stats.samples_emitted, 7);
    assert_eq!(stats.reconstructions, 7);
}

#[test]
fn sequential_patch_prep_produces_identical_output() {
    let frames = vec![
        solid(PatchRect::new(0, 0, 2, 1), RED, 3),
        solid(PatchRect::new(1, 0, 1, 1), BLUE, 2),
    ];
    let canvas = Canvas::new(2, 1).unwrap();
    let run = |opts: ExportOpts| {
        let session = ExportSession::new(frames.clone(), canvas, playback(0.7, 20), opts).unwrap();
        let mut sink = InMemorySink::new();
        session
            .run(&mut sink, &mut NoProgress, &AtomicBool::new(false))
            .unwrap();
        sink.into_samples()
    };

    let parallel = run(ExportOpts::default());
    let sequential = run(ExportOpts {
        parallel_patch_prep: false,
    });
    assert_eq!(parallel.len(), 14);
    assert_eq!(parallel, sequential);
}

#[test]
fn render_sample_at_matches_the_streamed_sample() {
    let frames = vec![
        solid(PatchRect::new(0, 0, 2, 1), RED, 3),
        solid(PatchRect::new(1, 0, 1, 1), BLUE, 2),
        solid(PatchRect::new(0, 0, 1, 1), [0, 255, 0, 128], 0),
    ];
    let session = ExportSession::new(
        frames,
        Canvas::new(2, 1).unwrap(),
        PlaybackParams {
            offset: 1,
            ..playback(1.0, 24)
        },
        ExportOpts::default(),
    )
    .unwrap();
    let mut sink = InMemorySink::new();
    session
        .run(&mut sink, &mut NoProgress, &AtomicBool::new(false))
        .unwrap();

    for i in [0u64, 1, 7, 13, 23] {
        let replayed = session.render_sample_at(FrameIndex(i)).unwrap();
        assert_eq!(replayed, sink.samples()[i as usize], "sample {i}");
    }
    assert!(session.render_sample_at(FrameIndex(24)).is_err());
}

#[test]
fn construction_rejects_bad_inputs() {
    let canvas = Canvas::new(2, 1).unwrap();
    let ok = || vec![solid(PatchRect::new(0, 0, 1, 1), RED, 0)];

    let err = ExportSession::new(Vec::new(), canvas, playback(1.0, 30), ExportOpts::default())
        .unwrap_err();
    assert!(matches!(err, GifbeatError::EmptySource));

    let err = ExportSession::new(
        vec![solid(PatchRect::new(0, 0, 1, 1), RED, 0), solid(PatchRect::new(1, 0, 2, 1), RED, 0)],
        canvas,
        playback(1.0, 30),
        ExportOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GifbeatError::BoundsViolation { frame: Some(1), .. }), "{err}");

    let mut bad = playback(1.0, 30);
    bad.frame_duration_secs = -1.0;
    assert!(ExportSession::new(ok(), canvas, bad, ExportOpts::default()).is_err());

    let mut bad = playback(1.0, 30);
    bad.total_duration_secs = f64::NAN;
    assert!(ExportSession::new(ok(), canvas, bad, ExportOpts::default()).is_err());
}

#[test]
fn settings_build_a_session() {
    let settings = ExportSettings {
        canvas: Canvas::new(2, 1).unwrap(),
        playback: playback(0.5, 10),
        opts: ExportOpts::default(),
    };
    let session = ExportSession::from_settings(
        vec![solid(PatchRect::new(0, 0, 1, 1), RED, 0)],
        &settings,
    )
    .unwrap();
    assert_eq!(session.total_samples(), 5);
    assert_eq!(session.canvas(), settings.canvas);
    assert_eq!(session.timeline().frame_count(), 1);
}
