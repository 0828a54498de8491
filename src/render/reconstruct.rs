use crate::assets::patch::Disposal;
use crate::assets::store::{Patch, PatchStore};
use crate::effects::composite::{blend_patch, check_placement};
use crate::foundation::core::Canvas;
use crate::foundation::error::GifbeatResult;
use crate::render::buffer::{DisposalSnapshot, FrameBuffer};

/// Counters describing the work a [`Reconstructor`] has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconstructStats {
    /// Patches composited.
    pub reconstructions: u64,
    /// Restore-previous frames that rolled the buffer back to a snapshot.
    pub restores: u64,
    /// Restore-background frames that cleared their rectangle.
    pub clears: u64,
}

/// Disposal-aware state machine turning source patches into full frames.
///
/// All state lives in the canonical [`FrameBuffer`] and at most one [`DisposalSnapshot`]. There is
/// no notion of a current position: each call applies the requested source frame to whatever is on
/// screen. Callers must request indices once per playback step, in increasing time order (looping
/// included), or the output diverges.
#[derive(Clone, Debug)]
pub struct Reconstructor {
    buffer: FrameBuffer,
    snapshot: Option<DisposalSnapshot>,
    stats: ReconstructStats,
}

impl Reconstructor {
    /// Start from a transparent black canvas with no snapshot.
    pub fn new(canvas: Canvas) -> GifbeatResult<Self> {
        Ok(Self {
            buffer: FrameBuffer::new(canvas)?,
            snapshot: None,
            stats: ReconstructStats::default(),
        })
    }

    /// Return to the initial state: transparent canvas, no snapshot, zeroed counters.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.snapshot = None;
        self.stats = ReconstructStats::default();
    }

    /// Apply source frame `index` from `store` and return the resulting on-screen buffer.
    pub fn reconstruct(&mut self, store: &PatchStore, index: usize) -> GifbeatResult<&FrameBuffer> {
        let patch = store.patch(index)?;
        self.apply(patch).map_err(|e| e.with_frame(index))?;
        Ok(&self.buffer)
    }

    /// Apply one patch: dispose according to its rule, then composite it.
    ///
    /// The placement is checked first, so a failing call leaves the buffer untouched.
    pub fn apply(&mut self, patch: &Patch) -> GifbeatResult<()> {
        let rect = patch.rect();
        let canvas = self.buffer.canvas();
        check_placement(rect, canvas)?;

        match patch.disposal() {
            Disposal::RestorePrevious => {
                if let Some(snap) = &self.snapshot {
                    self.buffer.restore(snap)?;
                    self.stats.restores += 1;
                }
                self.buffer.capture_into(&mut self.snapshot);
            }
            Disposal::RestoreBackground => {
                self.buffer
                    .clear_region(rect.left, rect.top, rect.width, rect.height);
                self.stats.clears += 1;
            }
            Disposal::None => {}
        }

        blend_patch(self.buffer.as_bytes_mut(), canvas, patch.rgba(), rect)?;
        self.stats.reconstructions += 1;
        Ok(())
    }

    /// The canonical buffer as of the last completed step.
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// The snapshot a future restore-previous frame would roll back to.
    pub fn snapshot(&self) -> Option<&DisposalSnapshot> {
        self.snapshot.as_ref()
    }

    /// Work counters since construction or the last [`Self::reset`].
    pub fn stats(&self) -> ReconstructStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/reconstruct.rs"]
mod tests;
