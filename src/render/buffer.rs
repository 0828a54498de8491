use crate::foundation::core::Canvas;
use crate::foundation::error::{GifbeatError, GifbeatResult};

/// A fully reconstructed frame as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Read the pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Copy of the canonical buffer taken before drawing a restore-previous frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisposalSnapshot {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DisposalSnapshot {
    /// Captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Dimensions of the buffer the snapshot was taken from.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// The full-canvas accumulator holding what is currently on screen.
///
/// Starts fully transparent. Only the reconstructor mutates it between samples.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a transparent black buffer covering `canvas`.
    pub fn new(canvas: Canvas) -> GifbeatResult<Self> {
        canvas.validate()?;
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.rgba_len()],
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Buffer dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Borrow the RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutably borrow the RGBA8 bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Reset every pixel to transparent black.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Overwrite every byte from `snapshot`. Sizes must match.
    pub fn restore(&mut self, snapshot: &DisposalSnapshot) -> GifbeatResult<()> {
        if snapshot.width != self.width
            || snapshot.height != self.height
            || snapshot.data.len() != self.data.len()
        {
            return Err(GifbeatError::invariant(format!(
                "snapshot {}x{} cannot restore a {}x{} frame buffer",
                snapshot.width, snapshot.height, self.width, self.height
            )));
        }
        self.data.copy_from_slice(&snapshot.data);
        Ok(())
    }

    /// Capture the current bytes into `slot`, reusing its allocation when one exists.
    pub fn capture_into(&self, slot: &mut Option<DisposalSnapshot>) {
        match slot {
            Some(snap) if snap.data.len() == self.data.len() => {
                snap.width = self.width;
                snap.height = self.height;
                snap.data.copy_from_slice(&self.data);
            }
            _ => {
                *slot = Some(DisposalSnapshot {
                    width: self.width,
                    height: self.height,
                    data: self.data.clone(),
                });
            }
        }
    }

    /// Set every pixel in the rectangle to `(0,0,0,0)`.
    ///
    /// The rectangle is clamped to the buffer; parts (or all) of it outside are ignored.
    pub fn clear_region(&mut self, left: u32, top: u32, width: u32, height: u32) {
        let x0 = (left as usize).min(self.width as usize);
        let y0 = (top as usize).min(self.height as usize);
        let x1 = (left as usize)
            .saturating_add(width as usize)
            .min(self.width as usize);
        let y1 = (top as usize)
            .saturating_add(height as usize)
            .min(self.height as usize);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = (self.width as usize) * 4;
        for row in self.data.chunks_exact_mut(stride).take(y1).skip(y0) {
            row[x0 * 4..x1 * 4].fill(0);
        }
    }

    /// Copy the current contents into an owned frame.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/buffer.rs"]
mod tests;
