//! Pointer and wheel input state machine.
//!
//! Event handlers only move *targets*; the per-frame smoothing toward those
//! targets lives in [`crate::frame::FrameUpdater`]. All handlers run on the
//! host's single input-dispatch thread.

use glam::Vec2;

use crate::constants::{DRAG_SENSITIVITY, WHEEL_PIXELS_PER_LINE, WHEEL_PIXELS_PER_PAGE};

#[derive(Clone, Copy, Debug, Default)]
pub struct DragState {
    pub active: bool,
    pub anchor: Vec2,
    pub last_sample: Vec2,
    /// World-space pan offset the field is easing toward.
    pub target: Vec2,
    /// Smoothed value forwarded to the renderer.
    pub current: Vec2,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollState {
    pub target: f32,
    pub current: f32,
    /// Impulse from recent wheel input; decays geometrically each tick.
    pub transient_velocity: f32,
}

/// Platform wheel delta, normalized to logical pixels internally.
#[derive(Clone, Copy, Debug)]
pub enum WheelDelta {
    Pixels(f32),
    Lines(f32),
    Pages(f32),
}

impl WheelDelta {
    pub fn to_pixels(self) -> f32 {
        match self {
            WheelDelta::Pixels(px) => px,
            WheelDelta::Lines(n) => n * WHEEL_PIXELS_PER_LINE,
            WheelDelta::Pages(n) => n * WHEEL_PIXELS_PER_PAGE,
        }
    }
}

pub struct InteractionController {
    pub drag: DragState,
    pub scroll: ScrollState,
    pointer: Vec2,
    active_pointer: Option<u64>,
    viewport_world: Vec2,
    viewport_px: Vec2,
    sensitivity: f32,
}

impl InteractionController {
    pub fn new(viewport_world: Vec2, viewport_px: Vec2) -> Self {
        Self {
            drag: DragState::default(),
            scroll: ScrollState::default(),
            pointer: Vec2::ZERO,
            active_pointer: None,
            viewport_world,
            viewport_px,
            sensitivity: DRAG_SENSITIVITY,
        }
    }

    pub fn set_viewport(&mut self, viewport_world: Vec2, viewport_px: Vec2) {
        self.viewport_world = viewport_world;
        self.viewport_px = viewport_px;
    }

    /// Last observed pointer position in viewport pixels.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.active
    }

    fn world_per_pixel(&self) -> Vec2 {
        Vec2::new(
            self.viewport_world.x / self.viewport_px.x.max(1.0),
            self.viewport_world.y / self.viewport_px.y.max(1.0),
        ) * self.sensitivity
    }

    /// Begin a drag gesture. The first pointer to press claims capture;
    /// further pointer ids are ignored until release.
    pub fn on_pointer_down(&mut self, pointer_id: u64, x: f32, y: f32) {
        if self.active_pointer.is_some() {
            log::debug!("pointer {pointer_id} ignored, capture already claimed");
            return;
        }
        self.active_pointer = Some(pointer_id);
        self.pointer = Vec2::new(x, y);
        self.drag.active = true;
        self.drag.anchor = self.pointer;
        self.drag.last_sample = self.pointer;
    }

    /// Track the pointer; while a drag is active, accumulate the world-space
    /// delta into the drag target. Dragging right pans the content left, so
    /// the x contribution is sign-inverted.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        let pos = Vec2::new(x, y);
        self.pointer = pos;
        if !self.drag.active {
            return;
        }
        let delta = pos - self.drag.last_sample;
        self.drag.last_sample = pos;
        let wpp = self.world_per_pixel();
        self.drag.target.x -= delta.x * wpp.x;
        self.drag.target.y += delta.y * wpp.y;
    }

    /// End the gesture. `drag.current` keeps settling toward the last
    /// target; nothing snaps.
    pub fn on_pointer_up(&mut self) {
        self.drag.active = false;
        self.active_pointer = None;
    }

    /// Accumulate a normalized wheel step into both the scroll target and
    /// the transient velocity signal.
    pub fn on_wheel(&mut self, delta: WheelDelta) {
        let px = delta.to_pixels();
        let world = px * self.viewport_world.y / self.viewport_px.y.max(1.0);
        self.scroll.target += world;
        self.scroll.transient_velocity += world;
    }
}
