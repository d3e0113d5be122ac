//! Subtitle cue model.
//!
//! A [`SubtitleCue`] is one subtitle unit handed to the renderer: either a
//! script-described payload (ASS markup or plain text) rasterized by the
//! engine, or one or more pre-rasterized paletted bitmap rectangles blended
//! at their native size. The variant is a declared property of the cue and
//! is switched on exactly once, at the renderer's dispatch layer.

/// Format of a script-described cue payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    /// Advanced SubStation Alpha markup (full script with sections).
    Ass,
    /// Unstyled text. Wrapped into a minimal ASS script with a default
    /// style before it reaches the rasterization engine.
    PlainText,
}

/// One pre-rasterized paletted subtitle rectangle.
///
/// Pixel data is a row-major array of palette indices; the palette maps each
/// index to a straight-alpha RGBA colour. Rectangles are positioned and
/// blended at native size, no resampling is performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedImage {
    /// Horizontal position of the left edge on the target overlay.
    pub x: i32,
    /// Vertical position of the top edge on the target overlay.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA palette entries.
    pub palette: Vec<[u8; 4]>,
    /// Row-major palette indices, `width * height` entries.
    pub data: Vec<u8>,
}

impl PalettedImage {
    /// Returns `true` when the rectangle covers no pixels or carries no data.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Payload of a [`SubtitleCue`]: script-described or pre-rasterized.
#[derive(Debug, Clone, PartialEq)]
pub enum CuePayload {
    /// Script-described subtitle rendered by the rasterization engine.
    Text {
        /// Script format of `script`.
        format: ScriptFormat,
        /// Raw markup or text payload.
        script: String,
    },
    /// Pre-rasterized bitmap subtitle.
    Bitmap {
        /// Rectangles blended in declaration order.
        images: Vec<PalettedImage>,
    },
}

/// One subtitle cue to display.
///
/// Carries the payload plus the coordinate-space hint that decides whether
/// the cue renders at display resolution or at video frame resolution (see
/// [`SubtitleRenderer::render_to_display_size`](crate::SubtitleRenderer::render_to_display_size)).
///
/// # Example
///
/// ```
/// use subrender::SubtitleCue;
///
/// let cue = SubtitleCue::plain_text("Hello, world!");
/// assert!(!cue.video_frame_coordinates);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// The cue content.
    pub payload: CuePayload,
    /// `true` when the payload was authored at a fixed pixel size in video
    /// frame coordinates (typical for DVD/PGS bitmaps), so it should scale
    /// with the video rather than stay at display resolution.
    pub video_frame_coordinates: bool,
}

impl SubtitleCue {
    /// Create a cue from a complete ASS script.
    pub fn ass<S: Into<String>>(script: S) -> Self {
        SubtitleCue {
            payload: CuePayload::Text {
                format: ScriptFormat::Ass,
                script: script.into(),
            },
            video_frame_coordinates: false,
        }
    }

    /// Create a cue from unstyled text.
    pub fn plain_text<S: Into<String>>(text: S) -> Self {
        SubtitleCue {
            payload: CuePayload::Text {
                format: ScriptFormat::PlainText,
                script: text.into(),
            },
            video_frame_coordinates: false,
        }
    }

    /// Create a bitmap cue from paletted rectangles.
    ///
    /// Bitmap cues are authored at a fixed pixel size, so
    /// `video_frame_coordinates` defaults to `true`.
    pub fn bitmap(images: Vec<PalettedImage>) -> Self {
        SubtitleCue {
            payload: CuePayload::Bitmap { images },
            video_frame_coordinates: true,
        }
    }

    /// Returns `true` for script-described cues.
    pub fn is_text(&self) -> bool {
        matches!(self.payload, CuePayload::Text { .. })
    }

    /// Returns `true` for bitmap cues.
    pub fn is_bitmap(&self) -> bool {
        matches!(self.payload, CuePayload::Bitmap { .. })
    }
}
