//! Presentation parameters.
//!
//! [`RenderParams`] is an immutable snapshot of the user-facing subtitle
//! display settings. The caller recomputes it whenever a setting changes and
//! passes it into every prerender call; the text pipeline compares it
//! against the last applied snapshot and only re-styles the engine when it
//! actually differs.

/// User-facing subtitle presentation settings.
///
/// All fields are overrides on top of what the subtitle script declares;
/// `None` (or the neutral value) keeps the author's styling. Parameters must
/// not change between a prerender call and its matching render call.
///
/// # Example
///
/// ```
/// use subrender::RenderParams;
///
/// let params = RenderParams {
///     scale: 1.5,
///     color: Some([255, 255, 0]),
///     ..RenderParams::default()
/// };
/// assert_ne!(params, RenderParams::default());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Font family override. `None` keeps the script's font.
    pub font: Option<String>,
    /// Font size override in script (play resolution) units.
    pub font_size: Option<f32>,
    /// Font scale multiplier applied after size resolution. `1.0` is neutral.
    pub scale: f64,
    /// Primary colour override as RGB. Alpha is kept from the script style.
    pub color: Option<[u8; 3]>,
    /// Vertical position bias in `-1.0..=1.0`. `0.0` keeps the author
    /// position; positive values move subtitles towards the top of the
    /// overlay, negative towards the bottom, by up to half the overlay
    /// height.
    pub vertical_offset: f64,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            font: None,
            font_size: None,
            scale: 1.0,
            color: None,
            vertical_offset: 0.0,
        }
    }
}
