//! Pointer picking: cell under the mouse to a world ray, then the nearest
//! planet that ray touches.

use crate::camera::View;
use crate::catalog::SUN_RADIUS;
use crate::math::{ray_annulus, ray_sphere, Ray, Vec3};
use crate::scene::Scene;

pub(crate) struct Raycaster {
    pub(crate) ray: Ray,
}

impl Raycaster {
    /// Ray through normalized device coordinates of the current view.
    pub(crate) fn from_camera(ndc: (f32, f32), view: &View) -> Self {
        Self { ray: view.ray(ndc.0, ndc.1) }
    }

    /// Ray through the center of viewport cell (`col`, `row`), or None when
    /// the cell lies outside a `view_w` x `view_h` viewport.
    pub(crate) fn from_cell(col: u16, row: u16, view_w: u16, view_h: u16, view: &View) -> Option<Self> {
        if col >= view_w || row >= view_h {
            return None;
        }
        Some(Self::from_camera(cell_ndc(col, row, view_w, view_h), view))
    }

    /// Index of the nearest planet hit. Rings count as their planet; the sun
    /// is never returned but hides whatever is behind it.
    pub(crate) fn pick_planet(&self, scene: &Scene, view: &View) -> Option<usize> {
        let ray = &self.ray;
        let mut best: Option<(f32, usize)> = None;
        let mut consider = |t: f32, i: usize| {
            if view.in_range(view.depth(ray, t)) && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, i));
            }
        };

        for (i, p) in scene.planets.iter().enumerate() {
            if let Some(t) = ray_sphere(ray, p.pos, p.spec.radius) {
                consider(t, i);
            }
            if let Some(ring) = p.ring() {
                if let Some((t, _)) = ray_annulus(ray, p.pos, ring.inner, ring.outer) {
                    consider(t, i);
                }
            }
        }

        let (t, i) = best?;
        match ray_sphere(ray, Vec3::ZERO, SUN_RADIUS) {
            Some(sun) if sun < t => None,
            _ => Some(i),
        }
    }
}

pub(crate) fn cell_ndc(col: u16, row: u16, view_w: u16, view_h: u16) -> (f32, f32) {
    let x = (col as f32 + 0.5) / view_w.max(1) as f32 * 2.0 - 1.0;
    let y = 1.0 - (row as f32 + 0.5) / view_h.max(1) as f32 * 2.0;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::catalog::default_planets;
    use rand::{rngs::StdRng, SeedableRng};

    fn scene_on_x_axis() -> Scene {
        let mut rng = StdRng::seed_from_u64(1);
        let mut scene = Scene::new(&default_planets(), &mut rng);
        for p in &mut scene.planets {
            p.angle = 0.0;
            p.pos = Vec3::new(p.spec.distance, 0.0, 0.0);
        }
        scene
    }

    fn view_from(eye: Vec3, target: Vec3) -> View {
        let mut cam = Camera::new(eye);
        cam.target = target;
        cam.set_aspect(160, 96);
        cam.view()
    }

    #[test]
    fn center_of_viewport_maps_to_origin() {
        let (x, y) = cell_ndc(5, 2, 11, 5);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        let (x, y) = cell_ndc(0, 0, 10, 10);
        assert!(x < 0.0 && y > 0.0);
    }

    #[test]
    fn picks_planet_under_center_ray() {
        let scene = scene_on_x_axis();
        let earth = Vec3::new(20.0, 0.0, 0.0);
        let view = view_from(Vec3::new(20.0, 0.0, 30.0), earth);
        let hit = Raycaster::from_camera((0.0, 0.0), &view).pick_planet(&scene, &view);
        assert_eq!(hit.map(|i| scene.planets[i].name()), Some("Earth"));
    }

    #[test]
    fn saturn_ring_counts_as_saturn() {
        let scene = scene_on_x_axis();
        // look straight down at the ring, beside the planet body
        let spot = Vec3::new(45.0 + 4.5, 0.0, 0.0);
        let eye = spot.add(Vec3::new(0.0, 30.0, 0.01));
        let view = view_from(eye, spot);
        let hit = Raycaster::from_camera((0.0, 0.0), &view).pick_planet(&scene, &view);
        assert_eq!(hit.map(|i| scene.planets[i].name()), Some("Saturn"));
    }

    #[test]
    fn sun_hides_planets_and_is_not_picked() {
        let scene = scene_on_x_axis();
        let view = view_from(Vec3::new(-30.0, 0.0, 0.0), Vec3::ZERO);
        let hit = Raycaster::from_camera((0.0, 0.0), &view).pick_planet(&scene, &view);
        assert_eq!(hit, None);
    }

    #[test]
    fn empty_space_picks_nothing() {
        let scene = scene_on_x_axis();
        let view = view_from(Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO);
        let r = Raycaster::from_camera((0.0, 0.95), &view);
        assert_eq!(r.pick_planet(&scene, &view), None);
        assert!(Raycaster::from_cell(40, 3, 40, 10, &view).is_none());
    }
}
