// Facade behavior: initialization pipeline, per-card isolation, tick safety.

use cardwall_core::{
    rasterize_cards, CardError, CardField, CardImage, FieldConfig, TextureHandle, TextureUploader,
    UploadError,
};
use glam::Vec2;
use image::{Rgba, RgbaImage};

struct RecordingUploader {
    uploads: Vec<(u32, u32)>,
}

impl RecordingUploader {
    fn new() -> Self {
        Self { uploads: Vec::new() }
    }
}

impl TextureUploader for RecordingUploader {
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle, UploadError> {
        assert_eq!(rgba.len(), width as usize * height as usize * 4);
        let handle = TextureHandle(self.uploads.len() as u64);
        self.uploads.push((width, height));
        Ok(handle)
    }
}

fn card(width: u32, height: u32) -> CardImage {
    CardImage {
        pixels: RgbaImage::from_pixel(width, height, Rgba([20, 20, 40, 255])),
    }
}

fn field() -> CardField {
    let config = FieldConfig {
        instance_count: 10,
        ..FieldConfig::default()
    };
    CardField::new(config, Vec2::new(20.0, 15.0), Vec2::new(800.0, 600.0))
}

#[test]
fn initialize_with_images_populates_the_field() {
    let mut f = field();
    let mut uploader = RecordingUploader::new();
    f.initialize_with_images(vec![card(300, 100), card(300, 150), card(300, 200)], &mut uploader)
        .unwrap();

    // sharp atlas plus blurred variant
    assert_eq!(uploader.uploads, vec![(300, 450), (300, 450)]);
    assert_eq!(f.instances().len(), 10);
    assert_eq!(f.atlas_handle(), Some(TextureHandle(0)));
    assert_eq!(f.blurred_handle(), Some(TextureHandle(1)));

    let snap = f.tick(0.016);
    assert_eq!(snap.atlas, Some(TextureHandle(0)));
    assert_eq!(snap.blurred_atlas, Some(TextureHandle(1)));
    assert_eq!(snap.instance_count, 10);
}

#[test]
fn zero_surviving_cards_leaves_an_empty_field() {
    let mut f = field();
    let mut uploader = RecordingUploader::new();
    f.initialize_with_images(Vec::new(), &mut uploader).unwrap();

    assert!(uploader.uploads.is_empty());
    assert!(f.instances().is_empty());
    let snap = f.tick(0.016);
    assert_eq!(snap.atlas, None);
    assert_eq!(snap.instance_count, 0);
}

#[test]
fn tick_is_safe_before_initialization() {
    let mut f = field();
    let snap = f.tick(0.016);
    assert_eq!(snap.atlas, None);
    assert_eq!(snap.blurred_atlas, None);
    assert_eq!(snap.instance_count, 0);
    assert!(snap.time > 0.0, "the interaction loop runs without an atlas");
}

#[test]
fn generation_failures_are_skipped_not_fatal() {
    let texts = vec!["ok".to_string(), "bad".to_string(), "fine".to_string()];
    let images = rasterize_cards(&texts, |t| {
        if t == "bad" {
            Err(CardError::InvalidDimensions { width: 0, height: 0 })
        } else {
            Ok(card(300, 100))
        }
    });
    assert_eq!(images.len(), 2);
}

#[test]
fn active_drag_freezes_the_field_clock() {
    let mut f = field();
    f.controller_mut().on_pointer_down(0, 1.0, 1.0);
    let t1 = f.tick(0.016).time;
    let t2 = f.tick(0.016).time;
    assert_eq!(t1, t2);

    f.controller_mut().on_pointer_up();
    let t3 = f.tick(0.016).time;
    assert!(t3 > t2);
}

#[test]
fn injected_hover_tester_modulates_scroll_ease() {
    let mut hovered = field();
    hovered.set_hit_tester(Box::new(|_, _| true));
    hovered.controller_mut().scroll.target = 10.0;
    let slow = hovered.tick(0.016).scroll_offset;

    let mut idle = field();
    idle.controller_mut().scroll.target = 10.0;
    let fast = idle.tick(0.016).scroll_offset;

    assert!((slow - 0.2).abs() < 1e-5);
    assert!((fast - 1.2).abs() < 1e-5);
    assert!(slow < fast);
}
