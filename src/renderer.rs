//! Core [`SubtitleRenderer`] implementation.
//!
//! `SubtitleRenderer` is the main entry point of the crate. It presents one
//! two-phase contract over two internal pipelines: script-described cues go
//! through the rasterization engine ([`crate::engine`]), bitmap cues are
//! positioned and blended directly. To draw a subtitle:
//!
//! 1. Call [`render_to_display_size`](SubtitleRenderer::render_to_display_size)
//!    to decide whether the overlay should have display size or video frame
//!    size.
//! 2. Call [`prerender`](SubtitleRenderer::prerender) to obtain the bounding
//!    box the subtitle will occupy inside that overlay.
//! 3. Clear the overlay region and allocate a BGRA32 buffer with the
//!    bounding box dimensions.
//! 4. Call [`render`](SubtitleRenderer::render) to draw the subtitle into
//!    the buffer.
//!
//! The renderer is single-threaded and stateful: a `render` call is only
//! valid immediately after a `prerender` call for the same cue, parameters,
//! and geometry. The caller must serialize all calls on one thread.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;

use crate::blend::{self, BYTES_PER_PIXEL};
use crate::bounding_box::BoundingBox;
use crate::cue::{CuePayload, PalettedImage, ScriptFormat, SubtitleCue};
use crate::engine::{ImageFragment, Library, Renderer as EngineRenderer, Track};
use crate::params::RenderParams;

/// Output prepared by the most recent prerender call.
#[derive(Debug)]
enum PreparedContent {
    /// Fragments retained from the text pipeline.
    Text { fragments: Vec<ImageFragment> },
    /// Rectangles retained from the bitmap pipeline.
    Bitmap { images: Vec<PalettedImage> },
}

#[derive(Debug)]
struct Prepared {
    bounding_box: BoundingBox,
    content: PreparedContent,
}

/// Renders subtitle cues into caller-owned BGRA32 buffers.
///
/// One instance per process is the intended model (a single active video
/// stream); the rasterization engine handles it owns are process-lifetime
/// and initialised lazily on the first text cue.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use subrender::{RenderParams, SubtitleCue, SubtitleRenderer};
///
/// let mut renderer = SubtitleRenderer::new();
/// let cue = SubtitleCue::plain_text("Hello");
/// let params = RenderParams::default();
///
/// let bbox = renderer.prerender(&cue, Duration::from_secs(1), &params, 1280, 720, 1.0);
/// let mut buffer = vec![0u8; bbox.area() as usize * 4];
/// renderer.render(&mut buffer);
/// ```
pub struct SubtitleRenderer {
    /// Whether engine initialisation has been attempted (one-shot).
    engine_attempted: bool,
    /// The font library; `None` after a failed initialisation.
    library: Option<Library>,
    /// Rasterization context, rebuilt to match the current geometry.
    raster: Option<EngineRenderer>,
    /// Per-cue track, rebuilt whenever a different script arrives.
    track: Option<Track>,
    /// Identity of the script loaded into `track`.
    loaded_script: Option<u64>,
    /// Last applied presentation parameters, for redundant-styling skips.
    applied_params: Option<RenderParams>,
    /// Extra font directory handed to the library at initialisation.
    font_dir: Option<PathBuf>,
    /// Injected font database, consumed at initialisation (tests).
    injected_database: Option<fontdb::Database>,
    /// State retained between prerender and render.
    prepared: Option<Prepared>,
}

impl Default for SubtitleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtitleRenderer {
    /// Create a renderer that resolves fonts from the system.
    pub fn new() -> Self {
        SubtitleRenderer {
            engine_attempted: false,
            library: None,
            raster: None,
            track: None,
            loaded_script: None,
            applied_params: None,
            font_dir: None,
            injected_database: None,
            prepared: None,
        }
    }

    /// Create a renderer that additionally loads fonts from `font_dir`.
    pub fn with_font_dir<P: Into<PathBuf>>(font_dir: P) -> Self {
        SubtitleRenderer {
            font_dir: Some(font_dir.into()),
            ..Self::new()
        }
    }

    /// Create a renderer over a prepared font database.
    ///
    /// An empty database makes engine initialisation fail, which is the
    /// supported way to exercise the degraded text path in tests.
    pub fn with_font_database(database: fontdb::Database) -> Self {
        SubtitleRenderer {
            injected_database: Some(database),
            ..Self::new()
        }
    }

    /// Returns `true` if the cue should be rendered at display resolution.
    ///
    /// Returns `false` for cues authored at a fixed pixel size in video
    /// frame coordinates, which must scale with the video instead. This is
    /// a declared property of the cue, not derived from its content.
    pub fn render_to_display_size(&self, cue: &SubtitleCue) -> bool {
        !cue.video_frame_coordinates
    }

    /// Returns `true` once engine initialisation has been attempted and
    /// succeeded. Before the first text-cue prerender this is `false`.
    pub fn engine_available(&self) -> bool {
        self.library.is_some()
    }

    /// Prerender a cue: compute the bounding box it will occupy.
    ///
    /// The box is relative to a `width x height` overlay and already
    /// clipped to it. A zero-area box means the following [`render`]
    /// call will not write any pixels (empty cue, or the rasterization
    /// engine is unavailable).
    ///
    /// The produced state is consumed by the next [`render`] call;
    /// `params` must not change between the two.
    ///
    /// [`render`]: SubtitleRenderer::render
    pub fn prerender(
        &mut self,
        cue: &SubtitleCue,
        timestamp: Duration,
        params: &RenderParams,
        width: u32,
        height: u32,
        pixel_aspect_ratio: f32,
    ) -> BoundingBox {
        match &cue.payload {
            CuePayload::Text { format, script } => self.prerender_text(
                *format,
                script,
                timestamp,
                params,
                width,
                height,
                pixel_aspect_ratio,
            ),
            CuePayload::Bitmap { images } => self.prerender_bitmap(images, width, height),
        }
    }

    /// Render the prerendered cue into a BGRA32 buffer.
    ///
    /// The buffer must have exactly the dimensions of the bounding box
    /// returned by the immediately preceding [`prerender`] call, 4 bytes
    /// per pixel. Pixels are blended with the straight-alpha "over"
    /// operator; fragments never write outside the buffer.
    ///
    /// Calling this without a matching prerender, or with a wrong-sized
    /// buffer, violates the contract: debug builds assert, release builds
    /// leave the buffer untouched.
    ///
    /// [`prerender`]: SubtitleRenderer::prerender
    pub fn render(&mut self, buffer: &mut [u8]) {
        debug_assert!(
            self.prepared.is_some(),
            "render() called without a preceding prerender()"
        );
        let Some(prepared) = &self.prepared else {
            return;
        };
        let bounding_box = prepared.bounding_box;
        debug_assert_eq!(
            buffer.len(),
            bounding_box.area() as usize * BYTES_PER_PIXEL,
            "buffer size does not match the prerendered bounding box"
        );
        if buffer.len() < bounding_box.area() as usize * BYTES_PER_PIXEL {
            return;
        }

        match &prepared.content {
            PreparedContent::Text { fragments } => {
                for fragment in fragments {
                    blend::blend_mask(
                        buffer,
                        bounding_box.width,
                        bounding_box.height,
                        fragment.x - bounding_box.x,
                        fragment.y - bounding_box.y,
                        &fragment.coverage,
                        fragment.width,
                        fragment.height,
                        fragment.color,
                    );
                }
            }
            PreparedContent::Bitmap { images } => {
                for image in images {
                    blend_paletted_image(buffer, &bounding_box, image);
                }
            }
        }
    }

    /// Text pipeline prerender: rasterize the script into fragments and
    /// compute their union bounding box.
    #[allow(clippy::too_many_arguments)]
    fn prerender_text(
        &mut self,
        format: ScriptFormat,
        script: &str,
        timestamp: Duration,
        params: &RenderParams,
        width: u32,
        height: u32,
        pixel_aspect_ratio: f32,
    ) -> BoundingBox {
        self.ensure_engine();
        let Some(library) = self.library.as_mut() else {
            // Engine unavailable: degrade to empty output, not an error.
            self.prepared = Some(Prepared {
                bounding_box: BoundingBox::empty(),
                content: PreparedContent::Text {
                    fragments: Vec::new(),
                },
            });
            return BoundingBox::empty();
        };

        let raster = self
            .raster
            .get_or_insert_with(|| EngineRenderer::new(width, height, pixel_aspect_ratio));
        if raster.frame_size() != (width, height) {
            raster.set_frame_size(width, height);
        }
        if raster.pixel_aspect() != pixel_aspect_ratio {
            raster.set_pixel_aspect(pixel_aspect_ratio);
        }

        // Re-style only when the snapshot actually changed.
        if self.applied_params.as_ref() != Some(params) {
            raster.set_style_parameters(params);
            self.applied_params = Some(params.clone());
        }

        // Reload the track only when a different script arrives.
        let script_id = script_identity(format, script);
        if self.loaded_script != Some(script_id) {
            self.track = None;
            self.loaded_script = Some(script_id);
        }
        let track = self.track.get_or_insert_with(|| match format {
            ScriptFormat::Ass => Track::from_ass(script),
            ScriptFormat::PlainText => Track::from_plain_text(script),
        });

        let fragments = raster.rasterize(library, track, timestamp);
        let bounding_box = fragments
            .iter()
            .fold(BoundingBox::empty(), |acc, fragment| {
                acc.union(&fragment.bounds())
            })
            .clip(width, height);

        log::debug!(
            "Text prerender at {timestamp:?}: {} fragment(s), bbox {bounding_box:?}",
            fragments.len()
        );

        self.prepared = Some(Prepared {
            bounding_box,
            content: PreparedContent::Text { fragments },
        });
        bounding_box
    }

    /// Bitmap pipeline prerender: union of the declared rectangles.
    fn prerender_bitmap(
        &mut self,
        images: &[PalettedImage],
        width: u32,
        height: u32,
    ) -> BoundingBox {
        let bounding_box = images
            .iter()
            .filter(|image| !image.is_empty())
            .fold(BoundingBox::empty(), |acc, image| {
                acc.union(&BoundingBox::new(
                    image.x,
                    image.y,
                    image.width,
                    image.height,
                ))
            })
            .clip(width, height);

        log::debug!(
            "Bitmap prerender: {} rectangle(s), bbox {bounding_box:?}",
            images.len()
        );

        self.prepared = Some(Prepared {
            bounding_box,
            content: PreparedContent::Bitmap {
                images: images.to_vec(),
            },
        });
        bounding_box
    }

    /// One-shot lazy engine initialisation.
    fn ensure_engine(&mut self) {
        if self.engine_attempted {
            return;
        }
        self.engine_attempted = true;
        self.library = match self.injected_database.take() {
            Some(database) => Library::with_database(database),
            None => Library::init(self.font_dir.as_deref()),
        };
        if self.library.is_none() {
            log::warn!("Rasterization engine unavailable, text subtitles will not be drawn");
        }
    }
}

/// Identity of a script payload, used to skip redundant track rebuilds.
fn script_identity(format: ScriptFormat, script: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    (format == ScriptFormat::Ass).hash(&mut hasher);
    script.hash(&mut hasher);
    hasher.finish()
}

/// Blend one paletted rectangle into the bounding-box buffer.
fn blend_paletted_image(buffer: &mut [u8], bounding_box: &BoundingBox, image: &PalettedImage) {
    let origin_x = image.x - bounding_box.x;
    let origin_y = image.y - bounding_box.y;

    let x0 = origin_x.max(0);
    let y0 = origin_y.max(0);
    let x1 = (origin_x + image.width as i32).min(bounding_box.width as i32);
    let y1 = (origin_y + image.height as i32).min(bounding_box.height as i32);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    for y in y0..y1 {
        let source_row = ((y - origin_y) as usize) * image.width as usize;
        let buffer_row = (y as usize) * bounding_box.width as usize;
        for x in x0..x1 {
            let Some(index) = image.data.get(source_row + (x - origin_x) as usize) else {
                continue;
            };
            let Some(&[red, green, blue, alpha]) = image.palette.get(*index as usize) else {
                // Out-of-palette indices are treated as transparent.
                continue;
            };
            if alpha == 0 {
                continue;
            }
            let offset = (buffer_row + x as usize) * BYTES_PER_PIXEL;
            blend::blend_pixel(
                &mut buffer[offset..offset + BYTES_PER_PIXEL],
                blue,
                green,
                red,
                alpha,
            );
        }
    }
}
