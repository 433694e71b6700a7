//! Perspective camera and damped orbit controls.
//!
//! The controls keep the camera on a sphere around `target`. Input never moves
//! the camera directly: it accumulates into pending rotation/pan deltas, and
//! `update` applies a `damping` fraction of them per frame, decaying the rest.

use crate::math::{Ray, Vec3};
use std::f32::consts::{PI, TAU};

pub(crate) const FOV_DEG: f32 = 75.0;
pub(crate) const NEAR: f32 = 0.1;
pub(crate) const FAR: f32 = 1000.0;
pub(crate) const START_POSITION: Vec3 = Vec3::new(0.0, 0.0, 100.0);

pub(crate) const DAMPING: f32 = 0.05;
/// Radius factor per wheel notch.
pub(crate) const ZOOM_SCALE: f32 = 0.95;
pub(crate) const MIN_DISTANCE: f32 = 6.0;
pub(crate) const MAX_DISTANCE: f32 = 900.0;
const POLAR_EPS: f32 = 1e-3;
/// Deltas below this are treated as settled.
const SETTLE_EPS: f32 = 1e-5;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Camera {
    pub(crate) position: Vec3,
    pub(crate) target: Vec3,
    pub(crate) fov_deg: f32,
    pub(crate) aspect: f32,
    pub(crate) near: f32,
    pub(crate) far: f32,
}

/// Orthonormal camera frame, cached per frame for the per-pixel passes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct View {
    pub(crate) eye: Vec3,
    pub(crate) forward: Vec3,
    pub(crate) right: Vec3,
    pub(crate) up: Vec3,
    tan_half: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub(crate) fn new(position: Vec3) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            fov_deg: FOV_DEG,
            aspect: 1.0,
            near: NEAR,
            far: FAR,
        }
    }

    pub(crate) fn set_aspect(&mut self, w: u32, h: u32) {
        if w > 0 && h > 0 {
            self.aspect = w as f32 / h as f32;
        }
    }

    pub(crate) fn view(&self) -> View {
        let forward = self.target.sub(self.position).norm();
        let mut right = forward.cross(Vec3::Y);
        if right.len() < 1e-6 {
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        let right = right.norm();
        let up = right.cross(forward);
        View {
            eye: self.position,
            forward,
            right,
            up,
            tan_half: (self.fov_deg.to_radians() * 0.5).tan(),
            aspect: self.aspect,
            near: self.near,
            far: self.far,
        }
    }
}

impl View {
    /// World ray through normalized device coordinates (x right, y up, both -1..1).
    pub(crate) fn ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let dir = self
            .forward
            .add(self.right.scale(ndc_x * self.tan_half * self.aspect))
            .add(self.up.scale(ndc_y * self.tan_half))
            .norm();
        Ray { origin: self.eye, dir }
    }

    /// View-space depth of a point at distance `t` along `ray`.
    pub(crate) fn depth(&self, ray: &Ray, t: f32) -> f32 {
        t * ray.dir.dot(self.forward)
    }

    pub(crate) fn in_range(&self, depth: f32) -> bool {
        depth >= self.near && depth <= self.far
    }

    /// Projects a world point to NDC plus view depth, or None when clipped.
    pub(crate) fn project(&self, p: Vec3) -> Option<(f32, f32, f32)> {
        let v = p.sub(self.eye);
        let z = v.dot(self.forward);
        if !self.in_range(z) {
            return None;
        }
        let x = v.dot(self.right) / (z * self.tan_half * self.aspect);
        let y = v.dot(self.up) / (z * self.tan_half);
        if x.abs() > 1.0 || y.abs() > 1.0 {
            return None;
        }
        Some((x, y, z))
    }

    /// On-canvas diameter of a distance-attenuated point sprite of nominal `size` pixels.
    pub(crate) fn point_size(&self, size: f32, depth: f32, h: u32) -> f32 {
        size * (h as f32 * 0.5) / depth.max(1e-6)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.len();
        if radius < 1e-6 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }
}

pub(crate) struct OrbitControls {
    pub(crate) camera: Camera,
    home: Vec3,
    delta_theta: f32,
    delta_phi: f32,
    pan: Vec3,
    scale: f32,
    pub(crate) damping: f32,
}

impl OrbitControls {
    pub(crate) fn new(camera: Camera) -> Self {
        Self {
            home: camera.position,
            camera,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan: Vec3::ZERO,
            scale: 1.0,
            damping: DAMPING,
        }
    }

    /// Drag rotation in canvas pixels; a full canvas height turns the camera once.
    pub(crate) fn rotate(&mut self, dx: f32, dy: f32, canvas_h: u32) {
        let h = canvas_h.max(1) as f32;
        self.delta_theta -= TAU * dx / h;
        self.delta_phi -= TAU * dy / h;
    }

    /// Drag pan in canvas pixels; the target point follows the pointer.
    pub(crate) fn pan(&mut self, dx: f32, dy: f32, canvas_h: u32) {
        let h = canvas_h.max(1) as f32;
        let view = self.camera.view();
        let dist = self.camera.position.sub(self.camera.target).len()
            * (self.camera.fov_deg.to_radians() * 0.5).tan();
        let left = view.right.scale(-2.0 * dx * dist / h);
        let up = view.up.scale(2.0 * dy * dist / h);
        self.pan = self.pan.add(left).add(up);
    }

    /// Positive notches move closer.
    pub(crate) fn dolly(&mut self, notches: i32) {
        if notches > 0 {
            self.scale *= ZOOM_SCALE.powi(notches);
        } else if notches < 0 {
            self.scale /= ZOOM_SCALE.powi(-notches);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.camera.position = self.home;
        self.camera.target = Vec3::ZERO;
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan = Vec3::ZERO;
        self.scale = 1.0;
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.delta_theta.abs() < SETTLE_EPS
            && self.delta_phi.abs() < SETTLE_EPS
            && self.pan.len() < SETTLE_EPS
            && (self.scale - 1.0).abs() < SETTLE_EPS
    }

    /// Applies one frame of pending motion.
    pub(crate) fn update(&mut self) {
        let cam = &mut self.camera;
        let mut sph = Spherical::from_offset(cam.position.sub(cam.target));

        sph.theta += self.delta_theta * self.damping;
        sph.phi += self.delta_phi * self.damping;
        sph.phi = sph.phi.clamp(POLAR_EPS, PI - POLAR_EPS);
        sph.radius = (sph.radius * self.scale).clamp(MIN_DISTANCE, MAX_DISTANCE);

        cam.target = cam.target.add(self.pan.scale(self.damping));
        cam.position = cam.target.add(sph.to_offset());

        let keep = 1.0 - self.damping;
        self.delta_theta *= keep;
        self.delta_phi *= keep;
        self.pan = self.pan.scale(keep);
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        let mut cam = Camera::new(START_POSITION);
        cam.set_aspect(200, 100);
        OrbitControls::new(cam)
    }

    #[test]
    fn start_view_looks_down_negative_z() {
        let c = controls();
        let v = c.camera.view();
        assert!((v.forward.z + 1.0).abs() < 1e-6);
        assert!((v.up.y - 1.0).abs() < 1e-6);
        let center = v.ray(0.0, 0.0);
        assert!((center.dir.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn projection_inverts_ray() {
        let c = controls();
        let v = c.camera.view();
        let ray = v.ray(0.4, -0.3);
        let (x, y, z) = v.project(ray.at(50.0)).unwrap();
        assert!((x - 0.4).abs() < 1e-4);
        assert!((y + 0.3).abs() < 1e-4);
        assert!(z > 0.0);
        assert!(v.project(Vec3::new(0.0, 0.0, 200.0)).is_none());
        assert!(v.project(Vec3::new(0.0, 0.0, -1000.0)).is_none());
    }

    #[test]
    fn damped_rotation_converges_to_full_delta() {
        let mut c = controls();
        c.rotate(-25.0, 0.0, 100);
        let expected = TAU * 0.25;
        for _ in 0..600 {
            c.update();
        }
        assert!(c.is_settled());
        let p = c.camera.position;
        assert!((p.x.atan2(p.z) - expected).abs() < 1e-3);
        assert!((p.len() - 100.0).abs() < 1e-2);
    }

    #[test]
    fn first_update_applies_only_damping_fraction() {
        let mut c = controls();
        c.rotate(-10.0, 0.0, 100);
        c.update();
        let p = c.camera.position;
        let theta = p.x.atan2(p.z);
        assert!((theta - TAU * 0.1 * DAMPING).abs() < 1e-4);
        assert!(!c.is_settled());
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut c = controls();
        c.rotate(0.0, 10_000.0, 100);
        for _ in 0..400 {
            c.update();
        }
        let p = c.camera.position;
        assert!(p.y > 0.0);
        assert!(p.x.is_finite() && p.z.is_finite());
        let v = c.camera.view();
        assert!(v.right.len() > 0.99);
    }

    #[test]
    fn dolly_is_immediate_and_bounded() {
        let mut c = controls();
        c.dolly(1);
        c.update();
        assert!((c.camera.position.len() - 95.0).abs() < 1e-3);
        c.dolly(500);
        c.update();
        assert!((c.camera.position.len() - MIN_DISTANCE).abs() < 1e-3);
        c.dolly(-500);
        c.update();
        assert!((c.camera.position.len() - MAX_DISTANCE).abs() < 1e-2);
    }

    #[test]
    fn pan_moves_target_with_camera() {
        let mut c = controls();
        c.pan(10.0, 0.0, 100);
        for _ in 0..600 {
            c.update();
        }
        // dragging right slides the target toward -x
        assert!(c.camera.target.x < -1.0);
        let off = c.camera.position.sub(c.camera.target);
        assert!((off.len() - 100.0).abs() < 1e-2);
        c.reset();
        assert_eq!(c.camera.target, Vec3::ZERO);
        assert_eq!(c.camera.position, START_POSITION);
    }
}
