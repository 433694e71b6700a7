//! Scene pass: casts one ray per canvas pixel into the solar system and
//! writes linear HDR color plus view depth into a [`Frame`].

use crate::camera::View;
use crate::catalog::{SUN_COLOR, SUN_RADIUS};
use crate::math::{clamp01, ray_annulus, ray_sphere, Lin, Rgb, Vec3};
use crate::scene::{Planet, Scene};
use crate::surface::{planet_albedo, ring_sample};

const AMBIENT: Rgb = Rgb::hex(0x444444);
const LIGHT_COLOR: Rgb = Rgb::hex(0xffffee);
const LIGHT_INTENSITY: f32 = 2.0;
const LIGHT_RANGE: f32 = 1000.0;
const LIGHT_DECAY: f32 = 2.0;
const SHININESS: f32 = 10.0;
const SPECULAR: Rgb = Rgb::hex(0x111111);

/// Nominal star sprite size in pixels before distance attenuation.
const STAR_SIZE: f32 = 2.0;

pub(crate) struct Frame {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) color: Vec<Lin>,
    pub(crate) depth: Vec<f32>,
}

impl Frame {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        let n = (w as usize) * (h as usize);
        Self {
            w,
            h,
            color: vec![Lin::BLACK; n],
            depth: vec![f32::INFINITY; n],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: u32, y: u32) -> Lin {
        self.color[self.idx(x, y)]
    }
    pub(crate) fn clear(&mut self) {
        self.color.fill(Lin::BLACK);
        self.depth.fill(f32::INFINITY);
    }
    /// NDC of a pixel center.
    pub(crate) fn ndc(&self, x: u32, y: u32) -> (f32, f32) {
        let nx = (x as f32 + 0.5) / self.w.max(1) as f32 * 2.0 - 1.0;
        let ny = 1.0 - (y as f32 + 0.5) / self.h.max(1) as f32 * 2.0;
        (nx, ny)
    }
}

/// Light constants resolved to linear space once per frame.
struct Lighting {
    ambient: Lin,
    light: Lin,
    specular: Lin,
}

impl Lighting {
    fn new() -> Self {
        Self {
            ambient: AMBIENT.linear(),
            light: LIGHT_COLOR.linear().scale(LIGHT_INTENSITY),
            specular: SPECULAR.linear(),
        }
    }
}

fn distance_attenuation(d: f32) -> f32 {
    clamp01(1.0 - d / LIGHT_RANGE).powf(LIGHT_DECAY)
}

/// Blinn-Phong shading of a planet surface point lit by the sun at the origin.
fn shade_planet(planet: &Planet, p: Vec3, eye: Vec3, lit: &Lighting) -> Lin {
    let n = p.sub(planet.pos).scale(1.0 / planet.spec.radius);
    let albedo = planet_albedo(&planet.spec.surface, n.rot_y(-planet.spin));

    let to_light = Vec3::ZERO.sub(p);
    let d = to_light.len();
    let l = to_light.norm();
    let v = eye.sub(p).norm();
    let h = l.add(v).norm();

    let n_dot_l = n.dot(l).max(0.0);
    let irradiance = lit.light.scale(n_dot_l * distance_attenuation(d));

    let diffuse = albedo.mul(lit.ambient.add(irradiance));
    let d_blinn = (SHININESS * 0.5 + 1.0) * n.dot(h).max(0.0).powf(SHININESS);
    let spec = lit.specular.scale(0.25 * d_blinn).mul(irradiance);
    diffuse.add(spec)
}

#[derive(Clone, Copy)]
enum Hit {
    Sun,
    Planet(usize),
}

/// Traces every pixel of `frame` and splats the starfield behind the geometry.
pub(crate) fn render_scene(frame: &mut Frame, scene: &Scene, view: &View) {
    frame.clear();
    let lit = Lighting::new();
    let sun = SUN_COLOR.linear();

    for y in 0..frame.h {
        for x in 0..frame.w {
            let (nx, ny) = frame.ndc(x, y);
            let ray = view.ray(nx, ny);

            let mut best_t = f32::INFINITY;
            let mut hit = None;
            if let Some(t) = ray_sphere(&ray, Vec3::ZERO, SUN_RADIUS) {
                best_t = t;
                hit = Some(Hit::Sun);
            }
            for (i, p) in scene.planets.iter().enumerate() {
                if let Some(t) = ray_sphere(&ray, p.pos, p.spec.radius) {
                    if t < best_t {
                        best_t = t;
                        hit = Some(Hit::Planet(i));
                    }
                }
            }
            if hit.is_some() && !view.in_range(view.depth(&ray, best_t)) {
                hit = None;
                best_t = f32::INFINITY;
            }

            let mut color = match hit {
                Some(Hit::Sun) => sun,
                Some(Hit::Planet(i)) => shade_planet(&scene.planets[i], ray.at(best_t), view.eye, &lit),
                None => Lin::BLACK,
            };
            let mut depth = if hit.is_some() { view.depth(&ray, best_t) } else { f32::INFINITY };

            // translucent rings over whatever lies behind them
            for p in &scene.planets {
                let Some(ring) = p.ring() else { continue };
                let Some((t, r)) = ray_annulus(&ray, p.pos, ring.inner, ring.outer) else {
                    continue;
                };
                let rd = view.depth(&ray, t);
                if t >= best_t || !view.in_range(rd) {
                    continue;
                }
                let (rc, alpha) = ring_sample(&ring, r);
                if alpha <= 0.0 {
                    continue;
                }
                color = color.mix(rc, alpha);
                depth = depth.min(rd);
            }

            let i = frame.idx(x, y);
            frame.color[i] = color;
            frame.depth[i] = depth;
        }
    }

    splat_stars(frame, scene, view);
}

fn splat_stars(frame: &mut Frame, scene: &Scene, view: &View) {
    for star in &scene.stars.stars {
        let Some((nx, ny, z)) = view.project(scene.stars.world(star)) else { continue };
        let px = ((nx + 1.0) * 0.5 * frame.w as f32) as u32;
        let py = ((1.0 - ny) * 0.5 * frame.h as f32) as u32;
        if px >= frame.w || py >= frame.h {
            continue;
        }
        let i = frame.idx(px, py);
        if frame.depth[i] <= z {
            continue;
        }
        // sub-pixel sprites keep a floor so they survive glyph dithering
        let cover = view.point_size(STAR_SIZE, z, frame.h).clamp(0.35, 1.0);
        let add = Lin::new(1.0, 1.0, 1.0).scale(cover * star.brightness);
        frame.color[i] = frame.color[i].add(add);
    }
}
