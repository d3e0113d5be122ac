//! # subrender
//!
//! Render subtitle overlays (ASS/text scripts and pre-rasterized paletted
//! bitmaps) into BGRA32 pixel buffers that a video player composites over
//! decoded frames.
//!
//! `subrender` reconciles two structurally different subtitle
//! representations under one two-phase contract: script-described cues are
//! rasterized into coverage-mask fragments by a font-backed engine (powered
//! by [`fontdb`](https://crates.io/crates/fontdb) and
//! [`fontdue`](https://crates.io/crates/fontdue)), bitmap cues are blended
//! at native size from their palettes. Either way, a `prerender` call first
//! reports the minimal bounding box the subtitle will touch, so the caller
//! clears and uploads only that region instead of the full frame.
//!
//! ## Quick Start
//!
//! ### Render a plain-text cue
//!
//! ```
//! use std::time::Duration;
//!
//! use subrender::{Overlay, RenderParams, SubtitleCue, SubtitleRenderer};
//!
//! let mut renderer = SubtitleRenderer::new();
//! let cue = SubtitleCue::plain_text("Hello, world!");
//! let params = RenderParams::default();
//!
//! let bbox = renderer.prerender(&cue, Duration::from_secs(1), &params, 1920, 1080, 1.0);
//! let mut overlay = Overlay::for_bounding_box(bbox);
//! renderer.render(overlay.data_mut());
//! ```
//!
//! ### Render an ASS script
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use subrender::{Overlay, RenderParams, SubtitleCue, SubtitleRenderer};
//!
//! let script = std::fs::read_to_string("episode.ass").unwrap();
//! let cue = SubtitleCue::ass(script);
//!
//! let mut renderer = SubtitleRenderer::new();
//! let bbox = renderer.prerender(
//!     &cue,
//!     Duration::from_secs(42),
//!     &RenderParams::default(),
//!     1920,
//!     1080,
//!     1.0,
//! );
//! let mut overlay = Overlay::for_bounding_box(bbox);
//! renderer.render(overlay.data_mut());
//! overlay.to_rgba_image().save("subtitle.png").unwrap();
//! ```
//!
//! ### Render a bitmap cue
//!
//! ```
//! use std::time::Duration;
//!
//! use subrender::{PalettedImage, RenderParams, SubtitleCue, SubtitleRenderer};
//!
//! let image = PalettedImage {
//!     x: 100,
//!     y: 400,
//!     width: 2,
//!     height: 1,
//!     palette: vec![[0, 0, 0, 0], [255, 255, 255, 255]],
//!     data: vec![1, 0],
//! };
//! let cue = SubtitleCue::bitmap(vec![image]);
//!
//! let mut renderer = SubtitleRenderer::new();
//! // Bitmap cues render at video frame resolution.
//! assert!(!renderer.render_to_display_size(&cue));
//!
//! let bbox = renderer.prerender(&cue, Duration::ZERO, &RenderParams::default(), 720, 576, 1.0);
//! assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (100, 400, 2, 1));
//! ```
//!
//! ## Contract
//!
//! 1. [`SubtitleRenderer::render_to_display_size`] decides whether the
//!    overlay has display size or video frame size.
//! 2. [`SubtitleRenderer::prerender`] returns the [`BoundingBox`] the cue
//!    occupies inside that overlay.
//! 3. The caller clears the overlay and allocates a BGRA32 buffer with the
//!    bounding box dimensions.
//! 4. [`SubtitleRenderer::render`] blends the subtitle into the buffer
//!    (straight alpha, 8 bits per channel).
//!
//! A render call is only valid immediately after a prerender call for the
//! same cue, parameters, and geometry. The renderer is not thread-safe:
//! callers serialize all calls, typically on one compositing thread.
//!
//! ## Degradation
//!
//! Failure never propagates from the render path: if no usable font exists
//! the text pipeline yields empty output for the process lifetime, and
//! malformed or empty scripts simply produce zero fragments.

pub mod blend;
pub mod bounding_box;
pub mod cue;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod params;
pub mod renderer;
pub mod script;

pub use bounding_box::BoundingBox;
pub use cue::{CuePayload, PalettedImage, ScriptFormat, SubtitleCue};
pub use engine::{ImageFragment, Library, Track};
pub use error::SubRenderError;
pub use overlay::Overlay;
pub use params::RenderParams;
pub use renderer::SubtitleRenderer;
