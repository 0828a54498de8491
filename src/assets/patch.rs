/// Placement of a patch within the full canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatchRect {
    /// Left edge (column of the first patch pixel).
    pub left: u32,
    /// Top edge (row of the first patch pixel).
    pub top: u32,
    /// Patch width in pixels.
    pub width: u32,
    /// Patch height in pixels.
    pub height: u32,
}

impl PatchRect {
    /// Build a rectangle from its four components.
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge, widened so it cannot overflow.
    pub fn right(self) -> u64 {
        u64::from(self.left) + u64::from(self.width)
    }

    /// Exclusive bottom edge, widened so it cannot overflow.
    pub fn bottom(self) -> u64 {
        u64::from(self.top) + u64::from(self.height)
    }
}

/// What happens to the canvas around a frame, as understood by the reconstructor.
///
/// Raw GIF codes are normalized at the [`PatchStore`](crate::PatchStore) boundary: `2` and `3`
/// map to their variants, everything else (unspecified `0`, do-not-dispose `1`, unknown values)
/// becomes [`Disposal::None`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Disposal {
    /// Leave the canvas as-is; the next frame overpaints in place.
    #[default]
    None,
    /// Clear the frame rectangle to transparent black.
    RestoreBackground,
    /// Snapshot the canvas before drawing; restore it on the next restore-previous frame.
    RestorePrevious,
}

impl Disposal {
    /// GIF graphic-control-extension code for "restore to background".
    pub const CODE_RESTORE_BACKGROUND: u8 = 2;
    /// GIF graphic-control-extension code for "restore to previous".
    pub const CODE_RESTORE_PREVIOUS: u8 = 3;

    /// Normalize a raw disposal code.
    pub fn from_code(code: u8) -> Self {
        match code {
            Self::CODE_RESTORE_BACKGROUND => Self::RestoreBackground,
            Self::CODE_RESTORE_PREVIOUS => Self::RestorePrevious,
            _ => Self::None,
        }
    }

    /// `true` for codes defined by the GIF format (`0..=3`).
    pub fn is_defined_code(code: u8) -> bool {
        code <= Self::CODE_RESTORE_PREVIOUS
    }
}

/// One decoded unit of the source animation, as produced by an external decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFrame {
    /// Straight-alpha RGBA8 patch pixels, row-major, `rect.width * rect.height * 4` bytes.
    pub patch: Vec<u8>,
    /// Placement within the canvas.
    pub rect: PatchRect,
    /// Raw disposal code as declared by the source format.
    pub disposal: u8,
}

impl SourceFrame {
    /// Bundle a decoded patch with its placement and raw disposal code.
    pub fn new(patch: Vec<u8>, rect: PatchRect, disposal: u8) -> Self {
        Self {
            patch,
            rect,
            disposal,
        }
    }
}
