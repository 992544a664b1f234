//! Facade tying the pipeline together: card generation, atlas packing,
//! texture upload, instance layout, and the per-frame interaction tick.

use glam::Vec2;
use rand::prelude::*;
use thiserror::Error;

use crate::atlas::{self, Atlas, AtlasError};
use crate::camera::Camera;
use crate::card::{CardError, CardImage, CardPainter, CardStyle};
use crate::constants::{DEFAULT_BLUR_SIGMA, DEFAULT_INSTANCE_COUNT, DEFAULT_SEED};
use crate::frame::{FrameParams, FrameUpdater};
use crate::instances::{build_instances, FieldBounds, InstanceBuffers, InstanceError};
use crate::interaction::InteractionController;

/// Opaque GPU texture reference issued by the host's uploader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("texture upload failed: {0}")]
    Backend(String),
}

/// Host-provided capability that turns a raw RGBA raster into a GPU-usable
/// handle. The core never sees the GPU API behind it.
pub trait TextureUploader {
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle, UploadError>;
}

#[derive(Debug, Error)]
pub enum FieldError {
    /// Terminal for this initialize call; the host may retry with a fresh
    /// text source.
    #[error("card text source unavailable: {0}")]
    DataLoad(String),
    #[error(transparent)]
    Atlas(#[from] AtlasError),
    #[error(transparent)]
    Instances(#[from] InstanceError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub instance_count: usize,
    pub card_style: CardStyle,
    pub bounds: FieldBounds,
    pub blur_sigma: f32,
    pub seed: u64,
    pub frame: FrameParams,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            instance_count: DEFAULT_INSTANCE_COUNT,
            card_style: CardStyle::default(),
            bounds: FieldBounds::default(),
            blur_sigma: DEFAULT_BLUR_SIGMA,
            seed: DEFAULT_SEED,
            frame: FrameParams::default(),
        }
    }
}

pub type HitTester = Box<dyn Fn(Vec2, &Camera) -> bool>;

/// Everything the renderer needs from one tick. Texture handles stay `None`
/// until initialization has completed, so a tick before the atlas is ready
/// is always safe.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSnapshot {
    pub time: f32,
    pub drag: Vec2,
    pub scroll_offset: f32,
    pub scroll_velocity: f32,
    pub atlas: Option<TextureHandle>,
    pub blurred_atlas: Option<TextureHandle>,
    pub instance_count: u32,
}

/// Run `gen` for every text entry, skipping entries that fail. A single
/// malformed card must not blank the whole gallery.
pub fn rasterize_cards(
    texts: &[String],
    mut gen: impl FnMut(&str) -> Result<CardImage, CardError>,
) -> Vec<CardImage> {
    let mut images = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        match gen(text) {
            Ok(img) => images.push(img),
            Err(e) => log::warn!("card {i} skipped: {e}"),
        }
    }
    images
}

// Independent deterministic rng streams derived from one seed.
fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

pub struct CardField {
    config: FieldConfig,
    controller: InteractionController,
    updater: FrameUpdater,
    camera: Camera,
    atlas: Option<Atlas>,
    blurred: Option<Atlas>,
    instances: InstanceBuffers,
    atlas_handle: Option<TextureHandle>,
    blurred_handle: Option<TextureHandle>,
    hit_tester: Option<HitTester>,
}

impl CardField {
    pub fn new(config: FieldConfig, viewport_world: Vec2, viewport_px: Vec2) -> Self {
        let camera = Camera {
            aspect: viewport_px.x / viewport_px.y.max(1.0),
            ..Camera::default()
        };
        Self {
            controller: InteractionController::new(viewport_world, viewport_px),
            updater: FrameUpdater::new(config.frame),
            camera,
            atlas: None,
            blurred: None,
            instances: InstanceBuffers::default(),
            atlas_handle: None,
            blurred_handle: None,
            hit_tester: None,
            config,
        }
    }

    /// Full pipeline: rasterize every text entry (skip-and-continue on
    /// per-card failures), then pack, blur, upload and lay out instances.
    pub fn initialize(
        &mut self,
        texts: &[String],
        painter: &CardPainter,
        uploader: &mut dyn TextureUploader,
    ) -> Result<(), FieldError> {
        let style = self.config.card_style.clone();
        let mut rng = stream_rng(self.config.seed, 0);
        let images = rasterize_cards(texts, |t| painter.generate(t, &style, &mut rng));
        self.initialize_with_images(images, uploader)
    }

    /// Lower half of `initialize`, fed with pre-rasterized cards. Zero
    /// surviving images completes with an empty field instead of erroring:
    /// the interaction loop keeps running over zero visible cards.
    pub fn initialize_with_images(
        &mut self,
        images: Vec<CardImage>,
        uploader: &mut dyn TextureUploader,
    ) -> Result<(), FieldError> {
        if images.is_empty() {
            log::warn!("no cards survived generation; field stays empty");
            self.atlas = None;
            self.blurred = None;
            self.instances = InstanceBuffers::default();
            self.atlas_handle = None;
            self.blurred_handle = None;
            return Ok(());
        }

        let atlas = atlas::pack(&images)?;
        let blurred = atlas::derive_blurred(&atlas, self.config.blur_sigma);
        self.atlas_handle =
            Some(uploader.upload(atlas.width, atlas.height, atlas.pixels.as_raw())?);
        self.blurred_handle =
            Some(uploader.upload(blurred.width, blurred.height, blurred.pixels.as_raw())?);

        let mut rng = stream_rng(self.config.seed, 1);
        self.instances =
            build_instances(&atlas, self.config.instance_count, &self.config.bounds, &mut rng)?;
        log::info!(
            "card field ready: {} cards packed into {}x{}, {} instances",
            atlas.entries.len(),
            atlas.width,
            atlas.height,
            self.instances.len()
        );
        self.atlas = Some(atlas);
        self.blurred = Some(blurred);
        Ok(())
    }

    /// Inject the hover capability. The tester receives the last pointer
    /// position in viewport pixels plus the field's camera.
    pub fn set_hit_tester(&mut self, tester: HitTester) {
        self.hit_tester = Some(tester);
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn atlas(&self) -> Option<&Atlas> {
        self.atlas.as_ref()
    }

    pub fn blurred_atlas(&self) -> Option<&Atlas> {
        self.blurred.as_ref()
    }

    pub fn instances(&self) -> &InstanceBuffers {
        &self.instances
    }

    pub fn atlas_handle(&self) -> Option<TextureHandle> {
        self.atlas_handle
    }

    pub fn blurred_handle(&self) -> Option<TextureHandle> {
        self.blurred_handle
    }

    /// Advance one render tick. Safe to call before `initialize`; the
    /// snapshot simply carries no texture handles and zero instances.
    pub fn tick(&mut self, dt: f32) -> UniformSnapshot {
        let hover = match &self.hit_tester {
            Some(test) => test(self.controller.pointer(), &self.camera),
            None => false,
        };
        let motion =
            self.updater.tick(dt, &mut self.controller.drag, &mut self.controller.scroll, hover);
        UniformSnapshot {
            time: motion.time,
            drag: motion.drag,
            scroll_offset: motion.scroll_offset,
            scroll_velocity: motion.scroll_velocity,
            atlas: self.atlas_handle,
            blurred_atlas: self.blurred_handle,
            instance_count: self.instances.len() as u32,
        }
    }
}
