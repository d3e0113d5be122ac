//! Text pipeline integration tests.
//!
//! Tests that rasterize real glyphs depend on system fonts being present;
//! they skip early when the environment has none, while the degradation
//! tests force that situation deliberately.

use std::time::Duration;

use subrender::{Overlay, RenderParams, SubtitleCue, SubtitleRenderer};

const SAMPLE_SCRIPT: &str = "\
[Script Info]
ScriptType: v4.00+
PlayResX: 640
PlayResY: 480

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, Bold, Italic, Alignment, MarginL, MarginR, MarginV
Style: Default,sans-serif,24,&H00FFFFFF,0,0,2,10,10,20

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:05.00,Default,,0,0,0,,Hello, world!
";

/// Returns a renderer, or `None` when the host has no usable fonts.
fn renderer_with_fonts() -> Option<SubtitleRenderer> {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::plain_text("probe");
    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(1),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    if bbox.is_empty() {
        return None;
    }
    Some(renderer)
}

#[test]
fn text_cues_render_at_display_size() {
    let renderer = SubtitleRenderer::new();
    assert!(renderer.render_to_display_size(&SubtitleCue::ass(SAMPLE_SCRIPT)));
    assert!(renderer.render_to_display_size(&SubtitleCue::plain_text("hi")));
}

#[test]
fn empty_script_yields_empty_box_and_untouched_buffer() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::plain_text("");

    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(1),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(bbox.is_empty());

    let mut buffer = vec![0u8; bbox.area() as usize * 4];
    renderer.render(&mut buffer);
    assert!(buffer.iter().all(|&b| b == 0));
}

#[test]
fn whitespace_only_script_yields_empty_box() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::plain_text("   \n \t ");

    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(1),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(bbox.is_empty());
}

#[test]
fn ass_cue_outside_its_event_window_is_empty() {
    let Some(mut renderer) = renderer_with_fonts() else {
        return;
    };
    let cue = SubtitleCue::ass(SAMPLE_SCRIPT);

    // The only dialogue event runs from 1s to 5s.
    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(10),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(bbox.is_empty());
}

#[test]
fn ass_cue_inside_its_event_window_produces_output() {
    let Some(mut renderer) = renderer_with_fonts() else {
        return;
    };
    let cue = SubtitleCue::ass(SAMPLE_SCRIPT);

    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(2),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(!bbox.is_empty());
    // Clipped to the overlay.
    assert!(bbox.x >= 0 && bbox.y >= 0);
    assert!(bbox.right() <= 640 && bbox.bottom() <= 480);

    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());
    assert!(
        overlay.data().iter().any(|&b| b != 0),
        "rendered glyphs should touch at least one pixel"
    );
}

#[test]
fn prerender_is_idempotent_for_text() {
    let Some(mut renderer) = renderer_with_fonts() else {
        return;
    };
    let cue = SubtitleCue::ass(SAMPLE_SCRIPT);
    let params = RenderParams::default();

    let first_bbox = renderer.prerender(&cue, Duration::from_secs(2), &params, 640, 480, 1.0);
    let mut first = Overlay::for_bounding_box(first_bbox);
    renderer.render(first.data_mut());

    let second_bbox = renderer.prerender(&cue, Duration::from_secs(2), &params, 640, 480, 1.0);
    let mut second = Overlay::for_bounding_box(second_bbox);
    renderer.render(second.data_mut());

    assert_eq!(first_bbox, second_bbox);
    assert_eq!(first.data(), second.data());
}

#[test]
fn forced_engine_failure_degrades_to_empty_output() {
    // An empty font database makes initialisation fail; the renderer must
    // keep answering calls without crashing for the rest of its life.
    let mut renderer = SubtitleRenderer::with_font_database(fontdb::Database::new());
    let cue = SubtitleCue::ass(SAMPLE_SCRIPT);

    assert!(renderer.render_to_display_size(&cue));

    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(2),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(bbox.is_empty());
    assert_eq!(bbox.area(), 0);
    assert!(!renderer.engine_available());

    let mut buffer = Vec::new();
    renderer.render(&mut buffer);

    // Still degraded on the next call: init is one-shot, no retry.
    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(3),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(bbox.is_empty());
}

#[test]
fn geometry_change_forces_rerasterization() {
    let Some(mut renderer) = renderer_with_fonts() else {
        return;
    };
    let cue = SubtitleCue::ass(SAMPLE_SCRIPT);
    let params = RenderParams::default();

    let small = renderer.prerender(&cue, Duration::from_secs(2), &params, 320, 240, 1.0);
    let large = renderer.prerender(&cue, Duration::from_secs(2), &params, 1280, 960, 1.0);

    assert!(!small.is_empty() && !large.is_empty());
    // Same script at 4x the resolution must rasterize larger glyphs.
    assert!(large.width > small.width);
    assert!(large.height > small.height);
}

#[test]
fn scale_parameter_changes_glyph_size() {
    let Some(mut renderer) = renderer_with_fonts() else {
        return;
    };
    let cue = SubtitleCue::ass(SAMPLE_SCRIPT);

    let normal = renderer.prerender(
        &cue,
        Duration::from_secs(2),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    let doubled = renderer.prerender(
        &cue,
        Duration::from_secs(2),
        &RenderParams {
            scale: 2.0,
            ..RenderParams::default()
        },
        640,
        480,
        1.0,
    );

    assert!(doubled.width > normal.width);
    assert!(doubled.height > normal.height);
}

#[test]
fn colour_override_recolours_the_output() {
    let Some(mut renderer) = renderer_with_fonts() else {
        return;
    };
    let cue = SubtitleCue::plain_text("Hello");
    let params = RenderParams {
        color: Some([255, 0, 0]),
        ..RenderParams::default()
    };

    let bbox = renderer.prerender(&cue, Duration::from_secs(1), &params, 640, 480, 1.0);
    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());

    // Every painted pixel must be pure red: in BGRA the blue and green
    // channels stay zero wherever alpha is non-zero.
    let mut painted = 0usize;
    for pixel in overlay.data().chunks_exact(4) {
        if pixel[3] > 0 {
            painted += 1;
            assert_eq!(pixel[0], 0, "blue channel must stay empty");
            assert_eq!(pixel[1], 0, "green channel must stay empty");
            assert!(pixel[2] > 0, "red channel must carry the ink");
        }
    }
    assert!(painted > 0);
}

#[test]
fn render_with_empty_prerender_touches_nothing() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::plain_text("");

    let bbox = renderer.prerender(
        &cue,
        Duration::from_secs(1),
        &RenderParams::default(),
        640,
        480,
        1.0,
    );
    assert!(bbox.is_empty());

    // A caller-cleared buffer stays fully transparent.
    let mut buffer = vec![0u8; bbox.area() as usize * 4];
    renderer.render(&mut buffer);
    assert!(buffer.iter().all(|&b| b == 0));
}
