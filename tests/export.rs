//! Overlay export tests.
//!
//! A rendered overlay must survive a PNG round trip: saving the RGBA
//! conversion to disk and loading it back yields the same pixels.

use std::time::Duration;

use subrender::{Overlay, PalettedImage, RenderParams, SubtitleCue, SubtitleRenderer};

#[test]
fn rendered_overlay_survives_a_png_round_trip() {
    let image = PalettedImage {
        x: 4,
        y: 2,
        width: 3,
        height: 2,
        palette: vec![[0, 0, 0, 0], [255, 0, 0, 255], [0, 0, 255, 128]],
        data: vec![1, 0, 2, 2, 1, 0],
    };
    let cue = SubtitleCue::bitmap(vec![image]);

    let mut renderer = SubtitleRenderer::new();
    let bbox = renderer.prerender(&cue, Duration::ZERO, &RenderParams::default(), 64, 32, 1.0);
    let mut overlay = Overlay::for_bounding_box(bbox);
    renderer.render(overlay.data_mut());

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("overlay.png");
    overlay.to_rgba_image().save(&path).expect("save PNG");

    let reloaded = image::open(&path).expect("reload PNG").to_rgba8();
    assert_eq!(reloaded.dimensions(), (bbox.width, bbox.height));
    assert_eq!(reloaded.as_raw(), overlay.to_rgba_image().as_raw());

    // Spot-check: top-left pixel is the opaque red palette entry.
    assert_eq!(reloaded.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn empty_overlay_exports_nothing_but_does_not_crash() {
    let overlay = Overlay::for_bounding_box(subrender::BoundingBox::empty());
    assert!(overlay.data().is_empty());

    let image = overlay.to_rgba_image();
    assert_eq!(image.dimensions(), (0, 0));
}
