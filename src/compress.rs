//! Image Compression
//!
//! Shrinks photos before upload: images larger than the bounds are scaled
//! down with their aspect ratio kept and re-encoded (JPEG at the configured
//! quality, PNG stays PNG). Compression never fails the caller: non-image
//! input and anything that cannot be decoded come back unchanged.

use crate::camera::decode_data_url;
use crate::constants::{COMPRESS_DEFAULT_QUALITY, COMPRESS_MAX_HEIGHT, COMPRESS_MAX_WIDTH};
use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Compression settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressOptions {
    /// JPEG quality in `0.0..=1.0`
    pub quality: f32,
    pub max_width: u32,
    pub max_height: u32,
    /// Keep the original when re-encoding without resizing made it larger
    pub strict: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            quality: COMPRESS_DEFAULT_QUALITY,
            max_width: COMPRESS_MAX_WIDTH,
            max_height: COMPRESS_MAX_HEIGHT,
            strict: true,
        }
    }
}

impl CompressOptions {
    fn jpeg_quality(&self) -> u8 {
        let quality = if self.quality.is_finite() {
            self.quality.clamp(0.01, 1.0)
        } else {
            COMPRESS_DEFAULT_QUALITY
        };
        (quality * 100.0).round() as u8
    }
}

/// An in-memory file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    /// MIME type, e.g. `image/jpeg`
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Compress one file; returns it unchanged when it is not an image or fails
pub fn compress_image(file: ImageFile, options: &CompressOptions) -> ImageFile {
    if !file.is_image() {
        return file;
    }

    match encode(&file, options) {
        Ok(Some((mime, bytes))) => {
            tracing::debug!(
                "compressed {}: {:.2}KB -> {:.2}KB",
                file.name,
                file.bytes.len() as f64 / 1024.0,
                bytes.len() as f64 / 1024.0
            );
            ImageFile {
                name: file.name,
                mime,
                bytes,
            }
        }
        Ok(None) => file,
        Err(e) => {
            tracing::warn!("image compression failed for {}: {e}", file.name);
            file
        }
    }
}

/// Compress every file, keeping order
pub fn compress_images(files: Vec<ImageFile>, options: &CompressOptions) -> Vec<ImageFile> {
    files
        .into_iter()
        .map(|file| compress_image(file, options))
        .collect()
}

/// Compress a base64 data URL such as a camera capture
///
/// Only a malformed data URL is an error.
pub fn compress_data_url(data_url: &str, options: &CompressOptions) -> Result<String> {
    let (mime, bytes) = decode_data_url(data_url)?;
    let file = compress_image(ImageFile::new("capture", mime, bytes), options);
    Ok(format!(
        "data:{};base64,{}",
        file.mime,
        STANDARD.encode(&file.bytes)
    ))
}

/// `Ok(None)` keeps the original
fn encode(file: &ImageFile, options: &CompressOptions) -> Result<Option<(String, Vec<u8>)>> {
    let format = image::guess_format(&file.bytes)?;
    let decoded = image::load_from_memory_with_format(&file.bytes, format)?;

    let (width, height) = decoded.dimensions();
    let resized = width > options.max_width || height > options.max_height;
    let output = if resized {
        decoded.resize(options.max_width, options.max_height, FilterType::Triangle)
    } else {
        decoded
    };

    let mut bytes = Vec::new();
    let mime = if format == ImageFormat::Png {
        output.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        "image/png"
    } else {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(output.to_rgb8());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(
            &mut bytes,
            options.jpeg_quality(),
        ))?;
        "image/jpeg"
    };

    if options.strict && !resized && bytes.len() >= file.bytes.len() {
        return Ok(None);
    }
    Ok(Some((mime.to_string(), bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode");
        bytes
    }

    fn dimensions(file: &ImageFile) -> (u32, u32) {
        image::load_from_memory(&file.bytes).expect("decode").dimensions()
    }

    #[test]
    fn test_non_image_passthrough() {
        let file = ImageFile::new("report.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        assert_eq!(compress_image(file.clone(), &CompressOptions::default()), file);
    }

    #[test]
    fn test_undecodable_image_returns_original() {
        let file = ImageFile::new("broken.jpg", "image/jpeg", vec![0xff, 0xd8, 0x00, 0x01]);
        assert_eq!(compress_image(file.clone(), &CompressOptions::default()), file);
    }

    #[test]
    fn test_downscale_keeps_aspect_ratio() {
        let tall = ImageFile::new("tall.jpg", "image/jpeg", encoded(1000, 2000, ImageFormat::Jpeg));
        let wide = ImageFile::new("wide.png", "image/png", encoded(1600, 1200, ImageFormat::Png));

        let out = compress_images(vec![tall, wide], &CompressOptions::default());
        assert_eq!(out[0].name, "tall.jpg");
        assert_eq!(out[0].mime, "image/jpeg");
        assert_eq!(dimensions(&out[0]), (400, 800));
        assert_eq!(out[1].mime, "image/png");
        assert_eq!(dimensions(&out[1]), (800, 600));
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let small = ImageFile::new("small.jpg", "image/jpeg", encoded(200, 100, ImageFormat::Jpeg));
        let options = CompressOptions {
            quality: 0.3,
            ..Default::default()
        };

        let out = compress_image(small, &options);
        assert_eq!(dimensions(&out), (200, 100));
    }

    #[test]
    fn test_data_url_round_trip() {
        let bytes = encoded(1200, 900, ImageFormat::Jpeg);
        let url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes));

        let compressed = compress_data_url(&url, &CompressOptions::default()).expect("compress");
        let (mime, out) = decode_data_url(&compressed).expect("decode");
        assert_eq!(mime, "image/jpeg");
        assert!(out.len() < bytes.len());
        assert_eq!(image::load_from_memory(&out).expect("image").dimensions(), (800, 600));

        assert!(compress_data_url("not a url", &CompressOptions::default()).is_err());
    }
}
