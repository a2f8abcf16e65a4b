use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

/// Name of a screenshot taken at `time`, relative to the working directory.
#[must_use]
pub fn file_name(time: SystemTime) -> PathBuf {
    let seconds = time
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs());
    PathBuf::from(format!("screenshot-{seconds}.png"))
}

/// Converts RGBA float pixels to RGBA8, top row first.
///
/// Row 0 of the traced image is the bottom of the view.
#[must_use]
pub fn to_rgba8(pixels: &[[f32; 4]], width: u32) -> Vec<u8> {
    let width = width as usize;
    if width == 0 {
        return Vec::new();
    }

    pixels
        .chunks_exact(width)
        .rev()
        .flatten()
        .flat_map(|pixel| pixel.map(to_unorm8))
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_unorm8(value: f32) -> u8 {
    // NaN maps to 0
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes RGBA float pixels as an 8-bit PNG.
pub fn save(path: &Path, pixels: &[[f32; 4]], [width, height]: [u32; 2]) -> crate::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&to_rgba8(pixels, width))?;
    writer.finish()?;

    tracing::info!("Screenshot saved to {}", path.display());

    Ok(())
}
