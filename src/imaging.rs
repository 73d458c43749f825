//! Image transcoding — pure Rust, zero external dependencies.
//!
//! One operation: load a product image, downscale it to fit the bounding box
//! if it is oversized, and re-encode it in the target format next to the
//! original. Everything is statically linked via the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::ImageReader` (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at quality 85 |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest edge allowed in the converted output, in pixels.
pub const MAX_DIMENSION: u32 = 1200;

/// Encoding quality for lossy target formats (1-100).
pub const ENCODE_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {0}: {1}")]
    Decode(PathBuf, image::ImageError),
    #[error("failed to encode {0}: {1}")]
    Encode(PathBuf, image::ImageError),
    #[error("unsupported target format: {0}")]
    UnsupportedFormat(String),
}

/// Target formats the pure-Rust encoders can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetFormat {
    Jpeg,
    Png,
    WebP,
}

impl TargetFormat {
    fn parse(format: &str) -> Result<Self, TranscodeError> {
        match format.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(TranscodeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Convert one image file to the target format.
///
/// The output path is the source path with its extension replaced, so the
/// converted file lands in the same directory as the original. The original
/// is never deleted. Returns the output path.
pub fn transcode(source: &Path, target_format: &str) -> Result<PathBuf, TranscodeError> {
    let format = TargetFormat::parse(target_format)?;
    let output = source.with_extension(target_format);

    // Decode fully before creating the output file: on case-insensitive
    // filesystems the destination may be the same file as the source.
    let img = ImageReader::open(source)?
        .decode()
        .map_err(|e| TranscodeError::Decode(source.to_path_buf(), e))?;

    let img = shrink_to_fit(img, MAX_DIMENSION);
    save(&img, &output, format)?;

    Ok(output)
}

/// Downscale to fit within `max_edge` × `max_edge`, preserving aspect ratio.
/// Images already inside the box are returned untouched — never upscaled.
fn shrink_to_fit(img: DynamicImage, max_edge: u32) -> DynamicImage {
    if img.width() <= max_edge && img.height() <= max_edge {
        return img;
    }
    img.resize(max_edge, max_edge, FilterType::Lanczos3)
}

/// Encode `img` to `path` in the requested format.
fn save(img: &DynamicImage, path: &Path, format: TargetFormat) -> Result<(), TranscodeError> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let result = match format {
        // JPEG has no alpha channel; flatten before encoding.
        TargetFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(writer, ENCODE_QUALITY)),
        TargetFormat::Png => img.write_with_encoder(PngEncoder::new(writer)),
        // The pure-Rust WebP encoder is lossless-only; RGBA is the widest
        // sample layout it accepts.
        TargetFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(writer)),
    };

    result.map_err(|e| TranscodeError::Encode(path.to_path_buf(), e))
}
