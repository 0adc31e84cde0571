//! Lossless-ish image shrinking for PNG and JPEG assets.
//!
//! The source is re-encoded in memory; the mirrored output is replaced only
//! when the re-encoded bytes are smaller. Sources are never written.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};

use crate::compiler::{StageError, StageKind, write_output};

const JPEG_QUALITY: u8 = 75;

/// What happened to one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shrink {
    /// Output replaced with the smaller encoding.
    Smaller { before: u64, after: u64 },
    /// Re-encoding did not help; output left as copied.
    Kept,
}

/// Whether `path` is an image the shrinker handles.
pub fn is_shrinkable(path: &Path) -> bool {
    matches!(
        ImageFormat::from_path(path),
        Ok(ImageFormat::Png | ImageFormat::Jpeg)
    )
}

/// Re-encode `src`, writing to `dest` only if smaller than the source.
pub fn shrink_image(src: &Path, dest: &Path) -> Result<Shrink, StageError> {
    let original = fs::read(src).map_err(|e| StageError::io(src, e))?;
    let format = ImageFormat::from_path(src)
        .map_err(|e| StageError::compile(StageKind::Asset, src, e.to_string()))?;
    let img = image::load_from_memory_with_format(&original, format)
        .map_err(|e| StageError::compile(StageKind::Asset, src, e.to_string()))?;

    let encoded = encode(&img, format)
        .map_err(|e| StageError::compile(StageKind::Asset, src, e.to_string()))?;

    if encoded.len() >= original.len() {
        return Ok(Shrink::Kept);
    }

    write_output(dest, &encoded)?;
    Ok(Shrink::Smaller {
        before: original.len() as u64,
        after: encoded.len() as u64,
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?;
        }
        _ => {
            img.write_with_encoder(PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                FilterType::Adaptive,
            ))?;
        }
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn gradient() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, 128])
        }))
    }

    #[test]
    fn test_is_shrinkable() {
        assert!(is_shrinkable(Path::new("a/logo.png")));
        assert!(is_shrinkable(Path::new("photo.JPG")));
        assert!(is_shrinkable(Path::new("photo.jpeg")));
        assert!(!is_shrinkable(Path::new("icon.svg")));
        assert!(!is_shrinkable(Path::new("font.woff2")));
    }

    #[test]
    fn test_shrink_fast_png() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.png");
        let dest = dir.path().join("out/src.png");

        // Fast compression without filtering leaves room to shrink
        let mut raw = Vec::new();
        gradient()
            .write_with_encoder(PngEncoder::new_with_quality(
                &mut raw,
                CompressionType::Fast,
                FilterType::NoFilter,
            ))
            .unwrap();
        fs::write(&src, &raw).unwrap();

        let outcome = shrink_image(&src, &dest).unwrap();
        let Shrink::Smaller { before, after } = outcome else {
            panic!("expected a smaller encoding");
        };
        assert!(after < before);
        assert_eq!(fs::read(&src).unwrap(), raw);
        assert_eq!(fs::metadata(&dest).unwrap().len(), after);
    }

    #[test]
    fn test_never_writes_larger() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("tiny.jpg");
        let dest = dir.path().join("out/tiny.jpg");

        // Already at low quality: re-encoding at 75 cannot win
        let mut raw = Vec::new();
        gradient()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut raw, 10))
            .unwrap();
        fs::write(&src, &raw).unwrap();

        assert_eq!(shrink_image(&src, &dest).unwrap(), Shrink::Kept);
        assert!(!dest.exists());
    }

    #[test]
    fn test_corrupt_image_is_an_error() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("broken.png");
        fs::write(&src, b"not a png").unwrap();
        assert!(shrink_image(&src, &dir.path().join("out.png")).is_err());
    }
}
