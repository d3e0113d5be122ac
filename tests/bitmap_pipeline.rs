//! Bitmap pipeline integration tests.
//!
//! Bitmap cues carry pre-rasterized paletted rectangles; the pipeline must
//! report their exact union as the bounding box and blend palette samples
//! in declaration order without ever writing outside the buffer.

use std::time::Duration;

use subrender::{
    BoundingBox, Overlay, PalettedImage, RenderParams, SubtitleCue, SubtitleRenderer,
};

fn solid_image(x: i32, y: i32, width: u32, height: u32, colour: [u8; 4]) -> PalettedImage {
    PalettedImage {
        x,
        y,
        width,
        height,
        palette: vec![[0, 0, 0, 0], colour],
        data: vec![1; (width * height) as usize],
    }
}

#[test]
fn bitmap_cues_render_at_video_frame_resolution() {
    let renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![solid_image(0, 0, 4, 4, [255, 0, 0, 255])]);
    assert!(!renderer.render_to_display_size(&cue));

    let text = SubtitleCue::plain_text("hi");
    assert!(renderer.render_to_display_size(&text));
}

#[test]
fn bounding_box_is_the_exact_union_of_rectangles() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![
        solid_image(10, 10, 20, 5, [255, 0, 0, 255]),
        solid_image(40, 30, 8, 8, [0, 255, 0, 255]),
    ]);

    let bbox = renderer.prerender(
        &cue,
        Duration::ZERO,
        &RenderParams::default(),
        720,
        576,
        1.0,
    );

    // Union spans from (10, 10) to (48, 38), no over- or under-estimation.
    assert_eq!(bbox, BoundingBox::new(10, 10, 38, 28));
}

#[test]
fn opaque_red_rectangle_fills_its_bounding_box() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![solid_image(10, 10, 20, 5, [255, 0, 0, 255])]);

    let bbox = renderer.prerender(
        &cue,
        Duration::ZERO,
        &RenderParams::default(),
        720,
        576,
        1.0,
    );
    assert_eq!(bbox, BoundingBox::new(10, 10, 20, 5));

    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());

    // Stored as BGRA: opaque red is [0, 0, 255, 255].
    for pixel in overlay.data().chunks_exact(4) {
        assert_eq!(pixel, &[0, 0, 255, 255]);
    }
}

#[test]
fn rectangles_blend_in_declaration_order() {
    // A white opaque rectangle, then a half-alpha black one on top of it.
    let white = solid_image(0, 0, 2, 2, [255, 255, 255, 255]);
    let black = solid_image(0, 0, 2, 2, [0, 0, 0, 128]);

    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![white, black]);
    let bbox = renderer.prerender(
        &cue,
        Duration::ZERO,
        &RenderParams::default(),
        100,
        100,
        1.0,
    );
    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());

    for pixel in overlay.data().chunks_exact(4) {
        assert_eq!(&pixel[..3], &[127, 127, 127], "expected 50% gray");
        assert_eq!(pixel[3], 255);
    }
}

#[test]
fn transparent_palette_entries_leave_pixels_untouched() {
    // Checkerboard of palette indices 0 (transparent) and 1 (opaque blue).
    let image = PalettedImage {
        x: 0,
        y: 0,
        width: 2,
        height: 2,
        palette: vec![[0, 0, 0, 0], [0, 0, 255, 255]],
        data: vec![1, 0, 0, 1],
    };

    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![image]);
    let bbox = renderer.prerender(
        &cue,
        Duration::ZERO,
        &RenderParams::default(),
        100,
        100,
        1.0,
    );
    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());

    let pixels: Vec<&[u8]> = overlay.data().chunks_exact(4).collect();
    assert_eq!(pixels[0], &[255, 0, 0, 255]); // blue in BGRA
    assert_eq!(pixels[1], &[0, 0, 0, 0]);
    assert_eq!(pixels[2], &[0, 0, 0, 0]);
    assert_eq!(pixels[3], &[255, 0, 0, 255]);
}

#[test]
fn out_of_palette_indices_are_transparent() {
    let image = PalettedImage {
        x: 0,
        y: 0,
        width: 2,
        height: 1,
        palette: vec![[255, 255, 255, 255]],
        data: vec![0, 9], // index 9 has no palette entry
    };

    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![image]);
    let bbox = renderer.prerender(
        &cue,
        Duration::ZERO,
        &RenderParams::default(),
        100,
        100,
        1.0,
    );
    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());

    assert_eq!(&overlay.data()[..4], &[255, 255, 255, 255]);
    assert_eq!(&overlay.data()[4..], &[0, 0, 0, 0]);
}

#[test]
fn bounding_box_is_clipped_to_the_overlay() {
    let mut renderer = SubtitleRenderer::new();
    // Rectangle hangs off the right and bottom edges of a 100x50 overlay.
    let cue = SubtitleCue::bitmap(vec![solid_image(90, 40, 30, 30, [255, 0, 0, 255])]);

    let bbox = renderer.prerender(&cue, Duration::ZERO, &RenderParams::default(), 100, 50, 1.0);
    assert_eq!(bbox, BoundingBox::new(90, 40, 10, 10));

    // Render must stay within the clipped buffer.
    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());
    for pixel in overlay.data().chunks_exact(4) {
        assert_eq!(pixel, &[0, 0, 255, 255]);
    }
}

#[test]
fn fully_offscreen_rectangle_yields_an_empty_box() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![solid_image(-50, -50, 10, 10, [255, 0, 0, 255])]);

    let bbox = renderer.prerender(&cue, Duration::ZERO, &RenderParams::default(), 100, 50, 1.0);
    assert!(bbox.is_empty());

    let mut buffer = Vec::new();
    renderer.render(&mut buffer); // must be a no-op, not a panic
}

#[test]
fn empty_rectangle_list_yields_an_empty_box() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(Vec::new());

    let bbox = renderer.prerender(&cue, Duration::ZERO, &RenderParams::default(), 100, 50, 1.0);
    assert!(bbox.is_empty());
    assert_eq!(bbox.area(), 0);
}

#[test]
fn prerender_is_idempotent_for_bitmaps() {
    let mut renderer = SubtitleRenderer::new();
    let cue = SubtitleCue::bitmap(vec![
        solid_image(5, 5, 10, 10, [1, 2, 3, 200]),
        solid_image(12, 8, 6, 3, [4, 5, 6, 90]),
    ]);
    let params = RenderParams::default();

    let first_bbox = renderer.prerender(&cue, Duration::ZERO, &params, 64, 64, 1.0);
    let mut first = Overlay::for_bounding_box(first_bbox);
    renderer.render(first.data_mut());

    let second_bbox = renderer.prerender(&cue, Duration::ZERO, &params, 64, 64, 1.0);
    let mut second = Overlay::for_bounding_box(second_bbox);
    renderer.render(second.data_mut());

    assert_eq!(first_bbox, second_bbox);
    assert_eq!(first.data(), second.data());
}
