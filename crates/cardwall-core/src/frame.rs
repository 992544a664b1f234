//! Per-tick smoothing of the interaction state.
//!
//! `current += (target - current) * factor` once per render tick. While a
//! drag gesture is in progress only the drag value advances; elapsed time
//! and scroll are frozen until release.

use glam::Vec2;

use crate::constants::{
    DRAG_DAMPING, SCROLL_EASE, SCROLL_EASE_HOVER, SCROLL_VELOCITY_DECAY, TIME_SCALE,
};
use crate::interaction::{DragState, ScrollState};

#[derive(Clone, Copy, Debug)]
pub struct FrameParams {
    pub drag_damping: f32,
    pub scroll_ease: f32,
    pub hover_ease: f32,
    pub velocity_decay: f32,
    pub time_scale: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            drag_damping: DRAG_DAMPING,
            scroll_ease: SCROLL_EASE,
            hover_ease: SCROLL_EASE_HOVER,
            velocity_decay: SCROLL_VELOCITY_DECAY,
            time_scale: TIME_SCALE,
        }
    }
}

/// Smoothed values for one frame, forwarded to the renderer as uniforms.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameMotion {
    pub time: f32,
    pub drag: Vec2,
    pub scroll_offset: f32,
    pub scroll_velocity: f32,
}

#[derive(Debug)]
pub struct FrameUpdater {
    params: FrameParams,
    elapsed: f32,
}

impl Default for FrameUpdater {
    fn default() -> Self {
        Self::new(FrameParams::default())
    }
}

impl FrameUpdater {
    pub fn new(params: FrameParams) -> Self {
        Self { params, elapsed: 0.0 }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn tick(
        &mut self,
        dt: f32,
        drag: &mut DragState,
        scroll: &mut ScrollState,
        hover: bool,
    ) -> FrameMotion {
        if drag.active {
            // mid-gesture: time and scroll stay frozen
            drag.current += (drag.target - drag.current) * self.params.drag_damping;
            return self.motion(drag, scroll);
        }

        self.elapsed += dt * self.params.time_scale;
        drag.current += (drag.target - drag.current) * self.params.drag_damping;
        let ease = if hover { self.params.hover_ease } else { self.params.scroll_ease };
        scroll.current += (scroll.target - scroll.current) * ease;
        scroll.transient_velocity *= self.params.velocity_decay;
        self.motion(drag, scroll)
    }

    fn motion(&self, drag: &DragState, scroll: &ScrollState) -> FrameMotion {
        FrameMotion {
            time: self.elapsed,
            drag: drag.current,
            scroll_offset: scroll.current,
            scroll_velocity: scroll.transient_velocity,
        }
    }
}
