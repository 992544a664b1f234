// Shared tuning constants used by the core state machines and the native
// frontend.

// Per-tick exponential smoothing factors
pub const DRAG_DAMPING: f32 = 0.1; // drag settle rate
pub const SCROLL_EASE: f32 = 0.12; // scroll ease, pointer away from the field
pub const SCROLL_EASE_HOVER: f32 = 0.02; // scroll ease while hovering a card
pub const SCROLL_VELOCITY_DECAY: f32 = 0.835; // transient wheel velocity falloff
pub const TIME_SCALE: f32 = 1.0;

// Instance field
pub const INSTANCE_SPEED_MIN: f32 = 0.5;
pub const INSTANCE_SPEED_MAX: f32 = 1.0;
pub const DEFAULT_INSTANCE_COUNT: usize = 120;
pub const DEFAULT_FIELD_MAX_X: f32 = 14.0;
pub const DEFAULT_FIELD_MAX_Y: f32 = 10.0;
pub const DEFAULT_FIELD_Z_NEAR: f32 = -2.0;
pub const DEFAULT_FIELD_Z_FAR: f32 = -24.0;

// World-space half extent of one card quad, used by the shader and the
// hover hit test alike
pub const CARD_HALF_EXTENT: [f32; 2] = [0.9, 0.55];

// Card raster defaults
pub const DEFAULT_CARD_WIDTH: u32 = 512;
pub const DEFAULT_CARD_HEIGHT: u32 = 320;
pub const DEFAULT_BLUR_SIGMA: f32 = 12.0;

// Interaction
pub const DRAG_SENSITIVITY: f32 = 1.0;
pub const WHEEL_PIXELS_PER_LINE: f32 = 40.0;
pub const WHEEL_PIXELS_PER_PAGE: f32 = 800.0;

// Camera
pub const CAMERA_Z: f32 = 6.0;

pub const DEFAULT_SEED: u64 = 42;
