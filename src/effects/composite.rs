use crate::assets::patch::PatchRect;
use crate::foundation::core::Canvas;
use crate::foundation::error::{GifbeatError, GifbeatResult};
use crate::foundation::math::clamp_round_u8;

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Composite one source pixel over one destination pixel.
///
/// - `src.a == 0`: destination unchanged.
/// - `src.a == 255`: source copied verbatim.
/// - otherwise: `rgb = src * a + dst * (1 - a)` with `a = src.a / 255`, and `alpha = max(src.a, dst.a)`.
pub fn blend_pixel(dst: Rgba8, src: Rgba8) -> Rgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        _ => blend_general(dst, src),
    }
}

pub(crate) fn blend_general(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let a = f64::from(src[3]) / 255.0;
    let inv = 1.0 - a;
    [
        clamp_round_u8(f64::from(src[0]) * a + f64::from(dst[0]) * inv),
        clamp_round_u8(f64::from(src[1]) * a + f64::from(dst[1]) * inv),
        clamp_round_u8(f64::from(src[2]) * a + f64::from(dst[2]) * inv),
        src[3].max(dst[3]),
    ]
}

/// Blend a patch onto a full-canvas buffer at `(rect.left, rect.top)`.
///
/// `dst` must hold `dst_size` RGBA8 pixels and `src` exactly `rect.width * rect.height` pixels.
/// A placement that would leave `dst_size` fails with [`GifbeatError::BoundsViolation`] before any
/// pixel is written. No allocation happens here.
pub fn blend_patch(
    dst: &mut [u8],
    dst_size: Canvas,
    src: &[u8],
    rect: PatchRect,
) -> GifbeatResult<()> {
    if dst.len() != dst_size.rgba_len() {
        return Err(GifbeatError::invariant(format!(
            "blend target has {} bytes, {}x{} RGBA needs {}",
            dst.len(),
            dst_size.width,
            dst_size.height,
            dst_size.rgba_len()
        )));
    }
    let src_len = rect.pixel_count().saturating_mul(4);
    if src.len() as u64 != src_len {
        return Err(GifbeatError::invariant(format!(
            "patch has {} bytes, {}x{} RGBA needs {src_len}",
            src.len(),
            rect.width,
            rect.height
        )));
    }
    check_placement(rect, dst_size)?;
    if src.is_empty() {
        return Ok(());
    }

    let dst_stride = dst_size.width as usize * 4;
    let src_stride = rect.width as usize * 4;
    let x0 = rect.left as usize * 4;

    let dst_rows = dst
        .chunks_exact_mut(dst_stride)
        .skip(rect.top as usize)
        .take(rect.height as usize);
    for (dst_row, src_row) in dst_rows.zip(src.chunks_exact(src_stride)) {
        let dst_span = &mut dst_row[x0..x0 + src_stride];
        for (d, s) in dst_span.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            match s[3] {
                0 => {}
                255 => d.copy_from_slice(s),
                _ => {
                    let out = blend_general([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                    d.copy_from_slice(&out);
                }
            }
        }
    }

    Ok(())
}

/// Fail with [`GifbeatError::BoundsViolation`] when `rect` does not fit inside `canvas`.
pub(crate) fn check_placement(rect: PatchRect, canvas: Canvas) -> GifbeatResult<()> {
    if rect.right() > u64::from(canvas.width) || rect.bottom() > u64::from(canvas.height) {
        return Err(GifbeatError::BoundsViolation {
            frame: None,
            x: u64::from(rect.left)..rect.right(),
            y: u64::from(rect.top)..rect.bottom(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
