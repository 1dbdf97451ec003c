// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Frame encoders: PNG, JPEG, BMP, TGA.
//!
//! The configured compression level (0..=100) maps per format: PNG picks a
//! zlib tier from `level * 9 / 100`, JPEG quality is `100 - level`, BMP and
//! TGA are always uncompressed. PNG frames carry the project text chunks.

use image::{ExtendedColorType, ImageEncoder};
use strum_macros::{Display, EnumIter, EnumString};

use super::rasterizer::Frame;

const PNG_TEXT_AUTHOR: &str = "termcamng";
const PNG_TEXT_URL: &str = "https://github.com/folkertvanheusden/termcamng";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
    Tga,
}

impl ImageFormat {
    /// Format for a `frame.<ext>` path component, e.g. `frame.png`.
    #[must_use]
    pub fn from_frame_extension(ext: &str) -> Option<ImageFormat> {
        match ext {
            "png" => Some(ImageFormat::Png),
            "jpeg" => Some(ImageFormat::Jpeg),
            "bmp" => Some(ImageFormat::Bmp),
            "tga" => Some(ImageFormat::Tga),
            _ => None,
        }
    }

    /// Format for a `stream.m<ext>` path component, e.g. `stream.mjpeg`.
    #[must_use]
    pub fn from_stream_extension(ext: &str) -> Option<ImageFormat> {
        ext.strip_prefix('m').and_then(Self::from_frame_extension)
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tga => "image/tga",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("{format} encoding failed: {source}")]
    Image {
        format: ImageFormat,
        source: image::ImageError,
    },
}

/// Encode one frame. `compression` is the config's 0..=100 level.
pub fn encode(format: ImageFormat, frame: &Frame, compression: u8) -> Result<Vec<u8>, EncodeError> {
    let width = frame.width as u32;
    let height = frame.height as u32;
    let mut out = Vec::new();

    match format {
        ImageFormat::Png => {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(png_compression(compression));
            encoder.add_text_chunk("Author".to_string(), PNG_TEXT_AUTHOR.to_string())?;
            encoder.add_text_chunk("URL".to_string(), PNG_TEXT_URL.to_string())?;
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&frame.rgb)?;
            writer.finish()?;
        }
        ImageFormat::Jpeg => {
            let quality = 100u8.saturating_sub(compression).max(1);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
                .write_image(&frame.rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|source| EncodeError::Image { format, source })?;
        }
        ImageFormat::Bmp => {
            image::codecs::bmp::BmpEncoder::new(&mut out)
                .write_image(&frame.rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|source| EncodeError::Image { format, source })?;
        }
        ImageFormat::Tga => {
            image::codecs::tga::TgaEncoder::new(&mut out)
                .write_image(&frame.rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|source| EncodeError::Image { format, source })?;
        }
    }

    Ok(out)
}

/// `level * 9 / 100` zlib mapping, folded onto the tiers the png crate
/// exposes: 0..=2 fast, 3..=6 default, 7..=9 best.
fn png_compression(level: u8) -> png::Compression {
    match u16::from(level.min(100)) * 9 / 100 {
        0..=2 => png::Compression::Fast,
        3..=6 => png::Compression::Default,
        _ => png::Compression::Best,
    }
}
