use crate::catalog::{PlanetSpec, RingSpec, SPIN_PER_TICK};
use crate::math::Vec3;
use chrono::{Duration, Local, NaiveDateTime};
use rand::{rngs::StdRng, Rng};
use std::f32::consts::TAU;

pub(crate) const SPEED_MIN: f32 = 0.0;
pub(crate) const SPEED_MAX: f32 = 0.1;
pub(crate) const SPEED_STEP: f32 = 0.0005;

pub(crate) const STAR_COUNT: usize = 1000;
pub(crate) const STAR_SPREAD: f32 = 2000.0;
/// Starfield rotation per client pixel of pointer offset.
pub(crate) const STAR_POINTER_GAIN: f32 = 0.00005;

/// Simulation ticks per real second; speeds are expressed per tick.
pub(crate) const TICKS_PER_SEC: u32 = 60;

/// Calendar days per tick, chosen so Earth's default orbit spans one year.
const DAYS_PER_TICK: f64 = 365.25 / (std::f64::consts::TAU / 0.01);

#[derive(Clone, Debug)]
pub(crate) struct Planet {
    pub(crate) spec: PlanetSpec,
    pub(crate) speed: f32,
    pub(crate) angle: f32,
    pub(crate) spin: f32,
    pub(crate) pos: Vec3,
}

impl Planet {
    fn new(spec: PlanetSpec, angle: f32) -> Self {
        let mut p = Self {
            spec,
            speed: spec.speed,
            angle,
            spin: 0.0,
            pos: Vec3::ZERO,
        };
        p.place();
        p
    }

    fn place(&mut self) {
        let (s, c) = self.angle.sin_cos();
        self.pos = Vec3::new(c * self.spec.distance, 0.0, s * self.spec.distance);
    }

    fn advance(&mut self) {
        self.angle = (self.angle + self.speed).rem_euclid(TAU);
        self.spin = (self.spin + SPIN_PER_TICK).rem_euclid(TAU);
        self.place();
    }

    pub(crate) fn name(&self) -> &'static str {
        self.spec.name
    }

    pub(crate) fn ring(&self) -> Option<RingSpec> {
        self.spec.ring
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Star {
    pub(crate) pos: Vec3,
    pub(crate) brightness: f32,
}

pub(crate) struct Starfield {
    pub(crate) stars: Vec<Star>,
    pub(crate) rot_x: f32,
    pub(crate) rot_y: f32,
}

impl Starfield {
    fn build(rng: &mut StdRng) -> Self {
        let mut stars = Vec::with_capacity(STAR_COUNT);
        for _ in 0..STAR_COUNT {
            let mut axis = || (rng.gen::<f32>() - 0.5) * STAR_SPREAD;
            let pos = Vec3::new(axis(), axis(), axis());
            stars.push(Star { pos, brightness: rng.gen_range(0.55..1.0) });
        }
        Self { stars, rot_x: 0.0, rot_y: 0.0 }
    }

    /// Tilt the whole field from the pointer position in client pixels.
    pub(crate) fn track_pointer(&mut self, px: f32, py: f32) {
        self.rot_x = py * STAR_POINTER_GAIN;
        self.rot_y = px * STAR_POINTER_GAIN;
    }

    /// World position of a star after the field's rotation (Euler XYZ).
    pub(crate) fn world(&self, star: &Star) -> Vec3 {
        star.pos.rot_y(self.rot_y).rot_x(self.rot_x)
    }
}

pub(crate) struct Scene {
    pub(crate) planets: Vec<Planet>,
    pub(crate) stars: Starfield,
    pub(crate) ticks: u64,
    start: NaiveDateTime,
}

impl Scene {
    pub(crate) fn new(specs: &[PlanetSpec], rng: &mut StdRng) -> Self {
        let planets = specs
            .iter()
            .map(|s| Planet::new(*s, rng.gen_range(0.0..TAU)))
            .collect();
        let stars = Starfield::build(rng);
        Self {
            planets,
            stars,
            ticks: 0,
            start: Local::now().naive_local(),
        }
    }

    /// One animation step: every planet moves along its orbit and spins.
    pub(crate) fn tick(&mut self) {
        for p in &mut self.planets {
            p.advance();
        }
        self.ticks += 1;
    }

    /// Sets a planet's speed, clamped to the slider range. Returns the applied value.
    pub(crate) fn set_speed(&mut self, idx: usize, speed: f32) -> Option<f32> {
        let p = self.planets.get_mut(idx)?;
        let v = if speed.is_finite() { speed.clamp(SPEED_MIN, SPEED_MAX) } else { p.speed };
        p.speed = v;
        Some(v)
    }

    pub(crate) fn nudge_speed(&mut self, idx: usize, steps: i32) -> Option<f32> {
        let cur = self.planets.get(idx)?.speed;
        let v = snap_to_step(cur + steps as f32 * SPEED_STEP);
        self.set_speed(idx, v)
    }

    pub(crate) fn reset_speeds(&mut self) {
        for p in &mut self.planets {
            p.speed = p.spec.speed;
        }
    }

    pub(crate) fn sim_date(&self) -> NaiveDateTime {
        let ms = (self.ticks as f64 * DAYS_PER_TICK * 86_400_000.0) as i64;
        self.start + Duration::milliseconds(ms)
    }
}

pub(crate) fn snap_to_step(v: f32) -> f32 {
    (v / SPEED_STEP).round() * SPEED_STEP
}
