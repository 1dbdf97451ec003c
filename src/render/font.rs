// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Font faces and the glyph cache.
//!
//! Faces are tried in the configured order; face 0 supplies the cell
//! metrics and wins whenever it carries the glyph, later faces are
//! fallbacks. Rasterized glyphs are grayscale coverage bitmaps cached for
//! the life of the process, keyed by `(face, glyph index, italic)`; italic
//! is part of the key because italics are synthesized by shearing the
//! upright bitmap. All cache fills (the only font-kernel calls after
//! startup) happen under the cache mutex, which therefore also serializes
//! the kernel.
//!
//! There is no eviction: an 80x25 session touches at most a few thousand
//! glyphs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fontdue::{Font, FontSettings};

/// Shear factor for synthesized italics, `0x5000 / 0x10000` (~17.4 deg).
const ITALIC_SHEAR: f32 = 0.3125;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum FontError {
    #[error("no font files configured")]
    NoFonts,

    #[error("cannot read font file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse font file {path}: {reason}")]
    Parse { path: PathBuf, reason: &'static str },
}

/// One rasterized glyph: coverage rows plus the bearing needed to place it
/// relative to the cell origin and baseline.
#[derive(Debug, Clone)]
pub struct CachedGlyph {
    pub width: usize,
    pub height: usize,
    /// Horizontal bearing (can be negative for overhanging glyphs).
    pub xmin: i32,
    /// Vertical offset of the bitmap bottom relative to the baseline.
    pub ymin: i32,
    /// `width * height` coverage values, row-major, 0..=255.
    pub coverage: Vec<u8>,
}

type GlyphKey = (usize, u16, bool);

pub struct FontSet {
    faces: Vec<Font>,
    /// Glyph pixel size == cell height.
    px: f32,
    cell_width: usize,
    cell_height: usize,
    /// Baseline distance from the cell top.
    ascent: i32,
    cache: Mutex<HashMap<GlyphKey, Arc<CachedGlyph>>>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("faces", &self.faces.len())
            .field("cell_width", &self.cell_width)
            .field("cell_height", &self.cell_height)
            .finish_non_exhaustive()
    }
}

impl FontSet {
    /// Load the configured faces. Face 0 must cover ASCII; its widest
    /// advance over the printable ASCII range becomes the cell width.
    pub fn load(font_files: &[PathBuf], font_height: usize) -> Result<FontSet, FontError> {
        if font_files.is_empty() {
            return Err(FontError::NoFonts);
        }

        let mut faces = Vec::with_capacity(font_files.len());
        for path in font_files {
            let data = std::fs::read(path).map_err(|source| FontError::Io {
                path: path.clone(),
                source,
            })?;
            let face =
                Font::from_bytes(data, FontSettings::default()).map_err(|reason| {
                    FontError::Parse {
                        path: path.clone(),
                        reason,
                    }
                })?;
            faces.push(face);
        }

        let px = font_height as f32;
        let primary = &faces[0];

        let mut cell_width = 1usize;
        for c in '\u{20}'..'\u{7f}' {
            let index = primary.lookup_glyph_index(c);
            if index != 0 {
                let metrics = primary.metrics_indexed(index, px);
                cell_width = cell_width.max(metrics.advance_width.ceil() as usize);
            }
        }

        let ascent = primary
            .horizontal_line_metrics(px)
            .map_or_else(|| (px * 0.8).round() as i32, |m| m.ascent.round() as i32);

        tracing::info!(
            faces = faces.len(),
            cell_width,
            cell_height = font_height,
            ascent,
            "font set loaded"
        );

        Ok(FontSet {
            faces,
            px,
            cell_width,
            cell_height: font_height.max(1),
            ascent,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// A faceless set for pipelines that never hit a real glyph (every
    /// lookup misses and takes the noise path). Keeps the rasterizer and
    /// encoders testable without font files on disk.
    #[cfg(test)]
    #[must_use]
    pub fn empty_for_tests(cell_width: usize, cell_height: usize) -> FontSet {
        FontSet {
            faces: Vec::new(),
            px: cell_height as f32,
            cell_width,
            cell_height,
            ascent: cell_height as i32 - 2,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn cell_width(&self) -> usize { self.cell_width }

    #[must_use]
    pub fn cell_height(&self) -> usize { self.cell_height }

    #[must_use]
    pub fn ascent(&self) -> i32 { self.ascent }

    /// Look up (and on a miss, rasterize) the glyph for `ch`. Returns
    /// `None` when no face carries the character, in which case the caller
    /// paints its debug pattern.
    #[must_use]
    pub fn glyph(&self, ch: char, italic: bool) -> Option<Arc<CachedGlyph>> {
        let (face_index, glyph_index) = self.find_face(ch)?;

        let key: GlyphKey = (face_index, glyph_index, italic);
        let mut cache = self.cache.lock().expect("glyph cache lock poisoned");
        if let Some(glyph) = cache.get(&key) {
            return Some(glyph.clone());
        }

        let (metrics, coverage) = self.faces[face_index].rasterize_indexed(glyph_index, self.px);
        let mut glyph = CachedGlyph {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            coverage,
        };
        if italic {
            glyph = shear(&glyph);
        }

        let glyph = Arc::new(glyph);
        cache.insert(key, glyph.clone());
        Some(glyph)
    }

    fn find_face(&self, ch: char) -> Option<(usize, u16)> {
        for (face_index, face) in self.faces.iter().enumerate() {
            let glyph_index = face.lookup_glyph_index(ch);
            if glyph_index != 0 {
                return Some((face_index, glyph_index));
            }
        }
        None
    }

    #[cfg(test)]
    pub fn cached_glyph_count(&self) -> usize {
        self.cache.lock().expect("glyph cache lock poisoned").len()
    }
}

/// Synthesize an italic by shifting each row right proportionally to its
/// distance from the bitmap bottom.
fn shear(upright: &CachedGlyph) -> CachedGlyph {
    if upright.height == 0 || upright.width == 0 {
        return upright.clone();
    }

    let max_shift = ((upright.height - 1) as f32 * ITALIC_SHEAR).ceil() as usize;
    let width = upright.width + max_shift;
    let mut coverage = vec![0u8; width * upright.height];

    for y in 0..upright.height {
        let from_bottom = upright.height - 1 - y;
        let shift = (from_bottom as f32 * ITALIC_SHEAR).round() as usize;
        let src = &upright.coverage[y * upright.width..(y + 1) * upright.width];
        let dst = &mut coverage[y * width + shift..y * width + shift + upright.width];
        dst.copy_from_slice(src);
    }

    CachedGlyph {
        width,
        height: upright.height,
        xmin: upright.xmin,
        ymin: upright.ymin,
        coverage,
    }
}
