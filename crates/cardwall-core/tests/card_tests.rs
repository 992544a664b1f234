// Card rasterization: wrap math, pattern determinism, raster primitives.
// Tests needing a real font look for a system TTF and bail out quietly when
// the environment has none.

use cardwall_core::{
    draw_pattern, fill_axis_line, fill_dot, stroke_border, text_block_top, wrap_lines,
    CardError, CardPainter, CardStyle, PatternStyle,
};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn wrap_commits_a_line_on_overflow() {
    // fixed-width fake metric: 10px per char
    let measure = |s: &str| s.chars().count() as f32 * 10.0;
    let lines = wrap_lines("aaa bbb ccc", 70.0, measure);
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    assert_eq!(lines, vec!["aaa bbb", "ccc"]);
}

#[test]
fn wrap_gives_an_overlong_word_its_own_line() {
    let measure = |s: &str| s.chars().count() as f32 * 10.0;
    let lines = wrap_lines("abcdefghij kl", 50.0, measure);
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    assert_eq!(lines, vec!["abcdefghij", "kl"]);
}

#[test]
fn wrap_of_empty_text_is_empty() {
    let measure = |s: &str| s.chars().count() as f32 * 10.0;
    assert!(wrap_lines("", 100.0, measure).is_empty());
    assert!(wrap_lines("   ", 100.0, measure).is_empty());
}

#[test]
fn block_centering_matches_the_layout_formula() {
    // 3 lines at font 20, gap 8: total = 2*28 + 20 = 76; top = 100 - 38
    assert!((text_block_top(3, 20.0, 8.0, 200.0) - 62.0).abs() < 1e-5);
    // single line centers the glyph box itself
    assert!((text_block_top(1, 20.0, 8.0, 200.0) - 90.0).abs() < 1e-5);
}

#[test]
fn pattern_is_deterministic_for_a_seed() {
    let style = PatternStyle::default();
    let mut a = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
    let mut b = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
    draw_pattern(&mut a, &style, &mut StdRng::seed_from_u64(9));
    draw_pattern(&mut b, &style, &mut StdRng::seed_from_u64(9));
    assert_eq!(a.as_raw(), b.as_raw());

    let mut c = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
    draw_pattern(&mut c, &style, &mut StdRng::seed_from_u64(10));
    assert_ne!(a.as_raw(), c.as_raw());
}

#[test]
fn primitives_clip_at_the_edges() {
    let mut img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
    let ink = Rgba([255, 255, 255, 255]);
    fill_axis_line(&mut img, 60, 60, 40, true, 2, ink);
    fill_axis_line(&mut img, 2, 2, -40, false, 2, ink);
    fill_dot(&mut img, 0.0, 0.0, 3.0, ink);
    assert_eq!(*img.get_pixel(62, 60), ink);
    assert_eq!(*img.get_pixel(0, 0), ink);
}

#[test]
fn border_stroke_frames_the_card() {
    let mut img = RgbaImage::from_pixel(32, 24, Rgba([0, 0, 0, 255]));
    let ink = Rgba([200, 200, 200, 255]);
    stroke_border(&mut img, 2, ink);
    assert_eq!(*img.get_pixel(0, 0), ink);
    assert_eq!(*img.get_pixel(31, 23), ink);
    assert_eq!(*img.get_pixel(15, 1), ink);
    assert_eq!(*img.get_pixel(15, 12), Rgba([0, 0, 0, 255]));
}

fn system_font() -> Option<Vec<u8>> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
}

#[test]
fn empty_text_still_produces_a_card() {
    let Some(bytes) = system_font() else {
        eprintln!("no system font available, skipping");
        return;
    };
    let painter = CardPainter::from_font_bytes(&bytes).unwrap();
    let style = CardStyle::default();
    let card = painter
        .generate("", &style, &mut StdRng::seed_from_u64(5))
        .unwrap();
    assert_eq!(card.width(), style.width);
    assert_eq!(card.height(), style.height);
}

#[test]
fn text_changes_the_card_center() {
    let Some(bytes) = system_font() else {
        eprintln!("no system font available, skipping");
        return;
    };
    let painter = CardPainter::from_font_bytes(&bytes).unwrap();
    let style = CardStyle::default();
    let blank = painter
        .generate("", &style, &mut StdRng::seed_from_u64(5))
        .unwrap();
    let written = painter
        .generate("hello wall", &style, &mut StdRng::seed_from_u64(5))
        .unwrap();
    assert_ne!(blank.pixels.as_raw(), written.pixels.as_raw());
}

#[test]
fn overflowing_text_is_reported() {
    let Some(bytes) = system_font() else {
        eprintln!("no system font available, skipping");
        return;
    };
    let painter = CardPainter::from_font_bytes(&bytes).unwrap();
    let style = CardStyle {
        width: 100,
        height: 60,
        padding: 10.0,
        font_size: 24.0,
        line_gap: 8.0,
        ..CardStyle::default()
    };
    let long = "one two three four five six seven eight nine ten";
    let result = painter.generate(long, &style, &mut StdRng::seed_from_u64(5));
    assert!(matches!(result, Err(CardError::TextOverflow { .. })));
}

#[test]
fn zero_sized_style_is_rejected() {
    let Some(bytes) = system_font() else {
        eprintln!("no system font available, skipping");
        return;
    };
    let painter = CardPainter::from_font_bytes(&bytes).unwrap();
    let style = CardStyle {
        width: 0,
        ..CardStyle::default()
    };
    assert!(matches!(
        painter.generate("x", &style, &mut StdRng::seed_from_u64(5)),
        Err(CardError::InvalidDimensions { .. })
    ));
}
