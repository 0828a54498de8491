use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

/// A decoded animation: logical screen size plus one patch per frame.
pub struct DecodedGif {
    pub canvas: gifbeat::Canvas,
    pub frames: Vec<gifbeat::SourceFrame>,
}

/// Decode every frame of a GIF into RGBA patches with their placement and raw disposal code.
///
/// Compositing is left to the engine; the decoder only expands palette indices (transparent index
/// becomes alpha 0).
pub fn read_gif(path: &Path) -> anyhow::Result<DecodedGif> {
    let file = File::open(path).with_context(|| format!("open gif '{}'", path.display()))?;

    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = opts
        .read_info(BufReader::new(file))
        .with_context(|| format!("read gif header '{}'", path.display()))?;

    let canvas = gifbeat::Canvas::new(u32::from(decoder.width()), u32::from(decoder.height()))?;

    let mut frames = Vec::new();
    while let Some(frame) = decoder
        .read_next_frame()
        .with_context(|| format!("decode frame {} of '{}'", frames.len(), path.display()))?
    {
        let rect = gifbeat::PatchRect::new(
            u32::from(frame.left),
            u32::from(frame.top),
            u32::from(frame.width),
            u32::from(frame.height),
        );
        frames.push(gifbeat::SourceFrame::new(
            frame.buffer.to_vec(),
            rect,
            frame.dispose as u8,
        ));
    }

    tracing::debug!(
        width = canvas.width,
        height = canvas.height,
        frames = frames.len(),
        "decoded gif"
    );
    Ok(DecodedGif { canvas, frames })
}
