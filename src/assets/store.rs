use rayon::prelude::*;

use crate::{
    assets::patch::{Disposal, PatchRect, SourceFrame},
    effects::composite::check_placement,
    foundation::core::Canvas,
    foundation::error::{GifbeatError, GifbeatResult},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Render-ready patch: validated pixels plus normalized disposal.
pub struct Patch {
    rect: PatchRect,
    disposal: Disposal,
    rgba: Vec<u8>,
}

impl Patch {
    /// Placement within the canvas.
    pub fn rect(&self) -> PatchRect {
        self.rect
    }

    /// Normalized disposal rule.
    pub fn disposal(&self) -> Disposal {
        self.disposal
    }

    /// Straight-alpha RGBA8 bytes, exactly `rect.width * rect.height * 4` long.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Read-only cache of render-ready patches, indexed by source frame.
///
/// Built once per export. Lookups never copy or re-validate pixel data, so the same source frame
/// can be requested any number of times while the timeline loops.
#[derive(Clone, Debug, Default)]
pub struct PatchStore {
    patches: Vec<Patch>,
}

impl PatchStore {
    /// Take ownership of decoded frames and prepare them in parallel.
    pub fn new(frames: Vec<SourceFrame>) -> GifbeatResult<Self> {
        Self::build(frames, true)
    }

    /// Prepare patches from borrowed frames, copying each patch buffer once.
    pub fn from_slice(frames: &[SourceFrame]) -> GifbeatResult<Self> {
        Self::build(frames.to_vec(), true)
    }

    /// Prepare patches, optionally spreading validation across the rayon pool.
    ///
    /// Fails with [`GifbeatError::EmptySource`] for an empty list and with
    /// [`GifbeatError::MalformedFrame`] for the lowest-indexed inconsistent frame.
    #[tracing::instrument(skip(frames), fields(frames = frames.len()))]
    pub fn build(frames: Vec<SourceFrame>, parallel: bool) -> GifbeatResult<Self> {
        if frames.is_empty() {
            return Err(GifbeatError::EmptySource);
        }

        // Collect per-frame results first so the reported error does not depend on scheduling.
        let prepared: Vec<GifbeatResult<Patch>> = if parallel {
            frames
                .into_par_iter()
                .enumerate()
                .map(|(i, f)| prepare_patch(i, f))
                .collect()
        } else {
            frames
                .into_iter()
                .enumerate()
                .map(|(i, f)| prepare_patch(i, f))
                .collect()
        };

        let patches = prepared.into_iter().collect::<GifbeatResult<Vec<_>>>()?;
        Ok(Self { patches })
    }

    /// Number of source frames.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// `true` when the store holds no frames. Never the case for a store built by [`Self::build`].
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Borrow the patch for source frame `index`.
    pub fn get(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    /// Borrow the patch for source frame `index`, failing when it does not exist.
    pub fn patch(&self, index: usize) -> GifbeatResult<&Patch> {
        self.patches.get(index).ok_or_else(|| {
            GifbeatError::invariant(format!(
                "source frame {index} requested from a store of {} frames",
                self.patches.len()
            ))
        })
    }

    /// Iterate patches in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter()
    }

    /// Report the first patch whose placement does not fit inside `canvas`.
    pub fn check_bounds(&self, canvas: Canvas) -> GifbeatResult<()> {
        for (i, p) in self.patches.iter().enumerate() {
            check_placement(p.rect, canvas).map_err(|e| e.with_frame(i))?;
        }
        Ok(())
    }
}

fn prepare_patch(index: usize, frame: SourceFrame) -> GifbeatResult<Patch> {
    let SourceFrame {
        patch,
        rect,
        disposal,
    } = frame;

    if rect.width == 0 || rect.height == 0 {
        return Err(GifbeatError::malformed(
            index,
            format!("patch must be non-empty, got {}x{}", rect.width, rect.height),
        ));
    }

    let expected = rect.pixel_count().checked_mul(4).ok_or_else(|| {
        GifbeatError::malformed(index, "patch byte size overflows u64")
    })?;
    if patch.len() as u64 != expected {
        return Err(GifbeatError::malformed(
            index,
            format!(
                "patch has {} bytes, {}x{} RGBA needs {expected}",
                patch.len(),
                rect.width,
                rect.height
            ),
        ));
    }

    if !Disposal::is_defined_code(disposal) {
        tracing::debug!(index, code = disposal, "unknown disposal code treated as none");
    }

    Ok(Patch {
        rect,
        disposal: Disposal::from_code(disposal),
        rgba: patch,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
