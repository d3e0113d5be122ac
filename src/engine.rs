//! The script rasterization engine.
//!
//! This module turns parsed ASS scripts into coverage-mask fragments. It is
//! organised around three handles with distinct lifetimes, mirroring how the
//! renderer drives it:
//!
//! - [`Library`]: process-scoped. Owns the font database and the loaded
//!   font faces. Created once, lazily, on the first text-cue prerender.
//! - [`Renderer`]: sized to the current output resolution and pixel aspect
//!   ratio, and holding the script-level style overrides derived from
//!   [`RenderParams`].
//! - [`Track`]: per-cue and ephemeral. Holds one parsed script; it is built
//!   fresh when a new cue arrives and discarded wholesale afterwards.
//!
//! Rasterization produces an ordered list of [`ImageFragment`] values, each
//! a rectangle of per-pixel coverage plus one straight-alpha RGBA colour.
//! The engine never fails at render time: missing fonts, empty scripts, and
//! events with no visible glyphs all yield fewer (or zero) fragments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fontdb::{Database, Family, Query, Style as FaceStyle, Weight};
use fontdue::{Font, FontSettings};

use crate::bounding_box::BoundingBox;
use crate::params::RenderParams;
use crate::script::{self, Script};

/// One rasterized glyph run.
///
/// `coverage` holds `width * height` opacity bytes (0 = untouched, 255 =
/// fully covered); `color` is the straight-alpha RGBA fill applied through
/// the mask. Fragments composite over each other in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFragment {
    /// Left edge in overlay coordinates.
    pub x: i32,
    /// Top edge in overlay coordinates.
    pub y: i32,
    /// Mask width in pixels.
    pub width: u32,
    /// Mask height in pixels.
    pub height: u32,
    /// Row-major per-pixel coverage, `width * height` bytes.
    pub coverage: Vec<u8>,
    /// Straight-alpha RGBA fill colour.
    pub color: [u8; 4],
}

impl ImageFragment {
    /// Overlay-space rectangle covered by this fragment.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }
}

/// Font face cache key: resolved per (family, weight, slant) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// Process-scoped font library.
///
/// Wraps a [`fontdb::Database`] and caches loaded [`fontdue::Font`] faces.
/// Construction fails only when no usable font face exists at all; in that
/// case the text pipeline degrades to empty output for the process lifetime.
pub struct Library {
    database: Database,
    faces: HashMap<FontKey, Option<Arc<Font>>>,
}

impl Library {
    /// Initialise the library from system fonts.
    ///
    /// Consults the external font directory resolver first (see
    /// [`resolve_font_config_dir`]); its failure is silently tolerated.
    /// `extra_font_dir` adds one caller-supplied directory on top.
    ///
    /// Returns `None` when the resulting database contains no faces.
    pub fn init(extra_font_dir: Option<&Path>) -> Option<Self> {
        let mut database = Database::new();
        database.load_system_fonts();
        if let Some(dir) = resolve_font_config_dir() {
            log::debug!("Loading fonts from configured directory {}", dir.display());
            database.load_fonts_dir(&dir);
        }
        if let Some(dir) = extra_font_dir {
            database.load_fonts_dir(dir);
        }
        Self::with_database(database)
    }

    /// Initialise the library from a prepared font database.
    ///
    /// Returns `None` when the database contains no faces.
    pub fn with_database(database: Database) -> Option<Self> {
        if database.is_empty() {
            log::warn!("No font faces available, text rendering disabled");
            return None;
        }
        log::debug!("Font library initialised with {} faces", database.len());
        Some(Library {
            database,
            faces: HashMap::new(),
        })
    }

    /// Resolve and load the font face for a family and weight/slant pair.
    ///
    /// Generic CSS-style family names map to the database's generic
    /// families; unknown names fall back to sans-serif. Faces that fail to
    /// parse are negatively cached so the lookup cost is paid once.
    pub(crate) fn face_for(&mut self, family: &str, bold: bool, italic: bool) -> Option<Arc<Font>> {
        let key = FontKey {
            family: family.to_ascii_lowercase(),
            bold,
            italic,
        };
        if let Some(cached) = self.faces.get(&key) {
            return cached.clone();
        }

        let families = [named_family(family), Family::SansSerif];
        let query = Query {
            families: &families,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            style: if italic {
                FaceStyle::Italic
            } else {
                FaceStyle::Normal
            },
            ..Query::default()
        };

        let face = self.database.query(&query).and_then(|id| {
            self.database.with_face_data(id, |data, index| {
                Font::from_bytes(
                    data,
                    FontSettings {
                        collection_index: index,
                        ..FontSettings::default()
                    },
                )
                .ok()
                .map(Arc::new)
            })?
        });

        if face.is_none() {
            log::debug!("No usable face for family {family:?} (bold={bold}, italic={italic})");
        }
        self.faces.insert(key, face.clone());
        face
    }
}

/// Map a script font name to a database family query.
fn named_family(family: &str) -> Family<'_> {
    if family.eq_ignore_ascii_case("sans-serif") || family.eq_ignore_ascii_case("sans") {
        Family::SansSerif
    } else if family.eq_ignore_ascii_case("serif") {
        Family::Serif
    } else if family.eq_ignore_ascii_case("monospace") || family.eq_ignore_ascii_case("mono") {
        Family::Monospace
    } else {
        Family::Name(family)
    }
}

/// Locate an additional font directory from the environment.
///
/// This is the crate's stand-in for an external font configuration
/// resolver: `SUBRENDER_FONT_DIR` may point at a directory of font files.
/// Absence or a dangling path is not an error, system fonts are used alone.
pub fn resolve_font_config_dir() -> Option<PathBuf> {
    std::env::var_os("SUBRENDER_FONT_DIR")
        .map(PathBuf::from)
        .filter(|path| path.is_dir())
}

/// Script-level style overrides derived from [`RenderParams`].
#[derive(Debug, Clone, PartialEq, Default)]
struct StyleOverrides {
    font: Option<String>,
    font_size: Option<f32>,
    scale: f32,
    color: Option<[u8; 3]>,
    vertical_offset: f32,
}

impl From<&RenderParams> for StyleOverrides {
    fn from(params: &RenderParams) -> Self {
        StyleOverrides {
            font: params.font.clone(),
            font_size: params.font_size,
            scale: params.scale as f32,
            color: params.color,
            vertical_offset: params.vertical_offset as f32,
        }
    }
}

/// A per-cue track: one parsed script ready for rasterization.
#[derive(Debug, Clone, Default)]
pub struct Track {
    script: Script,
}

impl Track {
    /// Parse an ASS script into a track.
    pub fn from_ass(source: &str) -> Self {
        Track {
            script: script::parse(source),
        }
    }

    /// Wrap plain text into a generated script and parse it.
    pub fn from_plain_text(text: &str) -> Self {
        Track {
            script: script::parse(&script::wrap_plain_text(text)),
        }
    }

    /// The parsed script.
    pub fn script(&self) -> &Script {
        &self.script
    }
}

/// Rasterization context sized to one output geometry.
///
/// Holds the output frame size, the pixel aspect ratio, and the current
/// style overrides. Rasterizing is a pure function of those plus the track
/// and timestamp, so repeating a call yields identical fragments.
pub struct Renderer {
    width: u32,
    height: u32,
    pixel_aspect: f32,
    overrides: StyleOverrides,
}

impl Renderer {
    /// Create a rasterization context for the given output geometry.
    pub fn new(width: u32, height: u32, pixel_aspect: f32) -> Self {
        Renderer {
            width,
            height,
            pixel_aspect: if pixel_aspect > 0.0 { pixel_aspect } else { 1.0 },
            overrides: StyleOverrides {
                scale: 1.0,
                ..StyleOverrides::default()
            },
        }
    }

    /// Output frame size in pixels.
    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Output pixel aspect ratio.
    pub fn pixel_aspect(&self) -> f32 {
        self.pixel_aspect
    }

    /// Resize the output frame.
    pub fn set_frame_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Change the output pixel aspect ratio.
    pub fn set_pixel_aspect(&mut self, pixel_aspect: f32) {
        self.pixel_aspect = if pixel_aspect > 0.0 { pixel_aspect } else { 1.0 };
    }

    /// Apply presentation parameters as script-level style overrides.
    pub fn set_style_parameters(&mut self, params: &RenderParams) {
        self.overrides = StyleOverrides::from(params);
        if !(self.overrides.scale.is_finite() && self.overrides.scale > 0.0) {
            self.overrides.scale = 1.0;
        }
    }

    /// Rasterize the track at `timestamp` into coverage fragments.
    ///
    /// Produces one fragment per laid-out line, in event declaration order
    /// (so later events composite over earlier ones). Events without a
    /// usable font or without visible glyphs contribute nothing.
    pub fn rasterize(
        &self,
        library: &mut Library,
        track: &Track,
        timestamp: Duration,
    ) -> Vec<ImageFragment> {
        let script = track.script();
        let scale_x = self.width as f32 / script.play_res_x;
        let scale_y = self.height as f32 / script.play_res_y;
        // Non-square pixels: shrink horizontal advances so the text keeps a
        // square physical aspect on the target surface.
        let h_scale = 1.0 / self.pixel_aspect;

        let mut fragments = Vec::new();
        // Simultaneous events at the same edge stack away from it instead
        // of overlapping.
        let mut bottom_stack = 0.0f32;
        let mut top_stack = 0.0f32;

        for event in script.events_at(timestamp) {
            let Some(style) = script.style(&event.style) else {
                continue;
            };

            let text = script::strip_override_tags(&event.text);
            if text.trim().is_empty() {
                continue;
            }

            let family = self.overrides.font.as_deref().unwrap_or(&style.font_name);
            let Some(font) = library.face_for(family, style.bold, style.italic) else {
                continue;
            };

            let size = self.overrides.font_size.unwrap_or(style.font_size);
            let pixel_size = (size * scale_y * self.overrides.scale).max(1.0);

            let mut color = style.primary_colour;
            if let Some([red, green, blue]) = self.overrides.color {
                color = [red, green, blue, style.primary_colour[3]];
            }

            let line_metrics = font.horizontal_line_metrics(pixel_size);
            let line_height = line_metrics
                .map(|m| m.new_line_size)
                .unwrap_or(pixel_size * 1.2);
            let ascent = line_metrics.map(|m| m.ascent).unwrap_or(pixel_size * 0.8);

            let pick = |event_margin: f32, style_margin: f32| {
                if event_margin > 0.0 {
                    event_margin
                } else {
                    style_margin
                }
            };
            let margin_left = pick(event.margin_left, style.margin_left) * scale_x;
            let margin_right = pick(event.margin_right, style.margin_right) * scale_x;
            let margin_vertical = pick(event.margin_vertical, style.margin_vertical) * scale_y;

            let lines = script::split_lines(&text);
            let total_height = line_height * lines.len() as f32;

            let mut block_top = match style.alignment {
                1..=3 => self.height as f32 - margin_vertical - total_height - bottom_stack,
                7..=9 => margin_vertical + top_stack,
                _ => (self.height as f32 - total_height) / 2.0,
            };
            block_top -= self.overrides.vertical_offset * self.height as f32 / 2.0;

            for (index, line) in lines.iter().enumerate() {
                let line_width = measure_line(&font, line, pixel_size, h_scale);
                let origin_x = match style.alignment % 3 {
                    1 => margin_left,
                    0 => self.width as f32 - margin_right - line_width,
                    _ => (self.width as f32 - line_width) / 2.0,
                };
                let baseline = block_top + index as f32 * line_height + ascent;
                if let Some(fragment) =
                    rasterize_line(&font, line, pixel_size, h_scale, origin_x, baseline, color)
                {
                    fragments.push(fragment);
                }
            }

            match style.alignment {
                1..=3 => bottom_stack += total_height,
                7..=9 => top_stack += total_height,
                _ => {}
            }
        }

        fragments
    }
}

/// Advance width of a laid-out line in output pixels.
fn measure_line(font: &Font, line: &str, pixel_size: f32, h_scale: f32) -> f32 {
    line.chars()
        .map(|ch| font.metrics(ch, pixel_size).advance_width * h_scale)
        .sum()
}

/// Rasterize one line of text into a single coverage fragment.
///
/// Glyph masks are merged with a per-pixel maximum so overlapping bearings
/// do not double-darken. Returns `None` when the line has no visible ink
/// (whitespace-only lines).
fn rasterize_line(
    font: &Font,
    line: &str,
    pixel_size: f32,
    h_scale: f32,
    origin_x: f32,
    baseline: f32,
    color: [u8; 4],
) -> Option<ImageFragment> {
    struct PlacedGlyph {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        bitmap: Vec<u8>,
    }

    let mut placed = Vec::new();
    let mut pen_x = origin_x;
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;

    for ch in line.chars() {
        let (metrics, bitmap) = font.rasterize(ch, pixel_size);
        if metrics.width > 0 && metrics.height > 0 {
            let glyph_x = (pen_x + metrics.xmin as f32 * h_scale).round() as i32;
            let glyph_y = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i32;
            min_x = min_x.min(glyph_x);
            min_y = min_y.min(glyph_y);
            max_x = max_x.max(glyph_x + metrics.width as i32);
            max_y = max_y.max(glyph_y + metrics.height as i32);
            placed.push(PlacedGlyph {
                x: glyph_x,
                y: glyph_y,
                width: metrics.width,
                height: metrics.height,
                bitmap,
            });
        }
        pen_x += metrics.advance_width * h_scale;
    }

    if placed.is_empty() {
        return None;
    }

    let width = (max_x - min_x) as u32;
    let height = (max_y - min_y) as u32;
    let mut coverage = vec![0u8; (width * height) as usize];

    for glyph in &placed {
        let offset_x = (glyph.x - min_x) as usize;
        let offset_y = (glyph.y - min_y) as usize;
        for row in 0..glyph.height {
            let source_row = row * glyph.width;
            let target_row = (offset_y + row) * width as usize + offset_x;
            for column in 0..glyph.width {
                let target = &mut coverage[target_row + column];
                *target = (*target).max(glyph.bitmap[source_row + column]);
            }
        }
    }

    Some(ImageFragment {
        x: min_x,
        y: min_y,
        width,
        height,
        coverage,
        color,
    })
}
