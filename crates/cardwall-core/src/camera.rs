//! Camera description and picking helpers backing the hover capability.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::constants::CAMERA_Z;
use crate::instances::{animated_position, FieldBounds, InstanceBuffers};

/// Right-handed camera with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_Z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 16.0 / 9.0,
            fovy_radians: std::f32::consts::FRAC_PI_4,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl Camera {
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Visible world-space extent of the `z = plane_z` plane.
    pub fn world_size_at(&self, plane_z: f32) -> Vec2 {
        let dist = (self.eye.z - plane_z).abs();
        let h = 2.0 * (self.fovy_radians * 0.5).tan() * dist;
        Vec2::new(h * self.aspect, h)
    }
}

/// World-space ray through the given viewport pixel.
pub fn screen_to_world_ray(camera: &Camera, pixel: Vec2, viewport_px: Vec2) -> (Vec3, Vec3) {
    let ndc_x = (2.0 * pixel.x / viewport_px.x.max(1.0)) - 1.0;
    let ndc_y = 1.0 - (2.0 * pixel.y / viewport_px.y.max(1.0));
    let inv = camera.view_proj().inverse();
    let p_far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
    let p1: Vec3 = p_far.truncate() / p_far.w;
    let ro = camera.eye;
    let rd = (p1 - ro).normalize();
    (ro, rd)
}

/// Intersect a ray with an axis-aligned quad lying in the `z = center.z`
/// plane. Returns the ray parameter on hit.
#[inline]
pub fn ray_quad(ro: Vec3, rd: Vec3, center: Vec3, half_extent: Vec2) -> Option<f32> {
    if rd.z.abs() <= 1e-6 {
        return None;
    }
    let t = (center.z - ro.z) / rd.z;
    if t < 0.0 {
        return None;
    }
    let hit = ro + rd * t;
    ((hit.x - center.x).abs() <= half_extent.x && (hit.y - center.y).abs() <= half_extent.y)
        .then_some(t)
}

/// Whether the ray touches any card of the field at its animated position.
/// This is the default hover tester a host can inject into
/// [`crate::field::CardField::set_hit_tester`].
pub fn hit_test_field(
    ro: Vec3,
    rd: Vec3,
    buffers: &InstanceBuffers,
    time: f32,
    scroll: f32,
    drag: Vec2,
    bounds: &FieldBounds,
    half_extent: Vec2,
) -> bool {
    buffers.instances.iter().any(|inst| {
        let center = animated_position(inst, time, scroll, bounds) + Vec3::new(drag.x, drag.y, 0.0);
        ray_quad(ro, rd, center, half_extent).is_some()
    })
}
