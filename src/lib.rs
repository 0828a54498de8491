//! gifbeat turns a delta-encoded animated image into a stream of fully resolved RGBA frames paced
//! by an unrelated timeline (usually an audio track), looping the animation with a tempo-aligned
//! offset.
//!
//! The public API is session-oriented:
//!
//! - Hand decoded [`SourceFrame`]s, a [`Canvas`] and [`PlaybackParams`] to an [`ExportSession`]
//! - Stream every [`Sample`] into a [`SampleSink`] with [`ExportSession::run`]
//! - Or reproduce a single sample with [`ExportSession::render_sample_at`]
//!
//! The lower layers ([`PatchStore`], [`Reconstructor`], [`blend_patch`], [`Timeline`]) are exposed
//! for callers that drive reconstruction themselves.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod effects;
mod eval;
mod foundation;
mod render;
mod session;

/// Sample sinks consumed by an export.
pub mod encode;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{GifbeatError, GifbeatResult};

pub use crate::assets::patch::{Disposal, PatchRect, SourceFrame};
pub use crate::assets::store::{Patch, PatchStore};
pub use crate::effects::composite::{Rgba8, blend_patch, blend_pixel};
pub use crate::encode::sink::{HashingSink, InMemorySink, Sample, SampleSink, SinkConfig};
pub use crate::eval::timeline::{Timeline, map_time};
pub use crate::render::buffer::{DisposalSnapshot, FrameBuffer, FrameRGBA};
pub use crate::render::reconstruct::{ReconstructStats, Reconstructor};
pub use crate::session::export::{
    ExportOpts, ExportOutcome, ExportSession, ExportStats, NoProgress, Progress,
};
pub use crate::session::settings::{ExportSettings, PlaybackParams};
