// Packing invariants for the vertical-stack atlas.

use cardwall_core::{derive_blurred, pack, AtlasError, CardImage};
use image::{Rgba, RgbaImage};

fn card(width: u32, height: u32, color: [u8; 4]) -> CardImage {
    CardImage {
        pixels: RgbaImage::from_pixel(width, height, Rgba(color)),
    }
}

#[test]
fn packs_three_cards_into_expected_geometry() {
    // three 300px-wide cards of heights 100, 150, 200
    let atlas = pack(&[
        card(300, 100, [255, 0, 0, 255]),
        card(300, 150, [0, 255, 0, 255]),
        card(300, 200, [0, 0, 255, 255]),
    ])
    .unwrap();

    assert_eq!(atlas.width, 300);
    assert_eq!(atlas.height, 450);
    assert_eq!(atlas.entries.len(), 3);

    let uv0 = atlas.entries[0].uv;
    let uv1 = atlas.entries[1].uv;
    let uv2 = atlas.entries[2].uv;
    assert!((uv0.y_start - 1.0).abs() < 1e-4);
    assert!((uv0.y_end - (1.0 - 100.0 / 450.0)).abs() < 1e-4);
    assert!((uv1.y_start - uv0.y_end).abs() < 1e-4);
    assert!((uv1.y_end - (1.0 - 250.0 / 450.0)).abs() < 1e-4);
    assert!((uv2.y_start - uv1.y_end).abs() < 1e-4);
    assert!(uv2.y_end.abs() < 1e-4);
    for e in &atlas.entries {
        assert!((e.uv.x_start).abs() < 1e-4);
        assert!((e.uv.x_end - 1.0).abs() < 1e-4);
    }
}

#[test]
fn uv_spans_match_entry_fractions() {
    let images = [
        card(300, 100, [1, 2, 3, 255]),
        card(220, 150, [4, 5, 6, 255]),
        card(260, 200, [7, 8, 9, 255]),
    ];
    let atlas = pack(&images).unwrap();

    assert_eq!(atlas.width, 300); // widest input
    assert_eq!(atlas.height, 450); // sum of heights
    for (img, entry) in images.iter().zip(&atlas.entries) {
        let dy = entry.uv.y_start - entry.uv.y_end;
        assert!((dy - img.height() as f32 / 450.0).abs() < 1e-5);
        assert!((entry.uv.x_end - img.width() as f32 / 300.0).abs() < 1e-5);
        assert!((entry.aspect_ratio - img.width() as f32 / img.height() as f32).abs() < 1e-5);
    }
}

#[test]
fn entries_keep_input_order_and_pixels() {
    let red = [255, 0, 0, 255];
    let green = [0, 255, 0, 255];
    let atlas = pack(&[card(4, 2, red), card(4, 3, green)]).unwrap();

    // first card occupies rows 0..2, second rows 2..5
    assert_eq!(atlas.pixels.get_pixel(0, 0).0, red);
    assert_eq!(atlas.pixels.get_pixel(3, 1).0, red);
    assert_eq!(atlas.pixels.get_pixel(0, 2).0, green);
    assert_eq!(atlas.pixels.get_pixel(3, 4).0, green);
}

#[test]
fn empty_input_is_rejected() {
    assert!(matches!(pack(&[]), Err(AtlasError::EmptyInput)));
}

#[test]
fn blurred_variant_shares_the_uv_table() {
    let atlas = pack(&[
        card(32, 16, [255, 255, 255, 255]),
        card(32, 16, [0, 0, 0, 255]),
    ])
    .unwrap();
    let blurred = derive_blurred(&atlas, 4.0);

    assert_eq!(blurred.width, atlas.width);
    assert_eq!(blurred.height, atlas.height);
    assert_eq!(blurred.entries.len(), atlas.entries.len());
    for (a, b) in atlas.entries.iter().zip(&blurred.entries) {
        assert_eq!(a.uv, b.uv);
        assert_eq!((a.width, a.height), (b.width, b.height));
    }
    // the white/black boundary must actually have been softened
    assert_ne!(atlas.pixels.as_raw(), blurred.pixels.as_raw());
}
