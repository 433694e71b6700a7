use crate::math::Rgb;

pub(crate) const SUN_RADIUS: f32 = 5.0;
pub(crate) const SUN_COLOR: Rgb = Rgb::hex(0xffffee);

/// Spin applied to every planet per simulation tick (rad).
pub(crate) const SPIN_PER_TICK: f32 = 0.01;

/// Procedural stand-in for a planet's texture map.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SurfaceStyle {
    pub(crate) base: Rgb,
    pub(crate) accent: Rgb,
    pub(crate) ocean: Rgb,
    pub(crate) seed: u32,
    pub(crate) roughness: f32,
    pub(crate) bands: f32,
    pub(crate) clouds: f32,
    pub(crate) ice: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RingSpec {
    pub(crate) inner: f32,
    pub(crate) outer: f32,
    pub(crate) base: Rgb,
    pub(crate) accent: Rgb,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PlanetSpec {
    pub(crate) name: &'static str,
    pub(crate) color: Rgb,
    pub(crate) radius: f32,
    pub(crate) distance: f32,
    /// Orbital angle advanced per simulation tick (rad).
    pub(crate) speed: f32,
    pub(crate) surface: SurfaceStyle,
    pub(crate) ring: Option<RingSpec>,
}

pub(crate) fn default_planets() -> Vec<PlanetSpec> {
    vec![
        PlanetSpec {
            name: "Mercury",
            color: Rgb::hex(0xaaaaaa),
            radius: 0.8,
            distance: 10.0,
            speed: 0.04,
            surface: SurfaceStyle {
                base: Rgb { r: 140, g: 140, b: 150 },
                accent: Rgb { r: 220, g: 220, b: 235 },
                ocean: Rgb { r: 70, g: 68, b: 72 },
                seed: 0xA1B2_C3D4,
                roughness: 0.92,
                bands: 0.05,
                clouds: 0.0,
                ice: 0.0,
            },
            ring: None,
        },
        PlanetSpec {
            name: "Venus",
            color: Rgb::hex(0xffcc66),
            radius: 1.2,
            distance: 15.0,
            speed: 0.015,
            surface: SurfaceStyle {
                base: Rgb { r: 235, g: 180, b: 90 },
                accent: Rgb { r: 255, g: 235, b: 170 },
                ocean: Rgb { r: 150, g: 95, b: 40 },
                seed: 0x1122_3344,
                roughness: 0.55,
                bands: 0.85,
                clouds: 0.78,
                ice: 0.0,
            },
            ring: None,
        },
        PlanetSpec {
            name: "Earth",
            color: Rgb::hex(0x3366ff),
            radius: 1.3,
            distance: 20.0,
            speed: 0.01,
            surface: SurfaceStyle {
                base: Rgb { r: 65, g: 150, b: 80 },
                accent: Rgb { r: 200, g: 190, b: 140 },
                ocean: Rgb { r: 20, g: 60, b: 150 },
                seed: 0x1337_BEEF,
                roughness: 0.70,
                bands: 0.15,
                clouds: 0.65,
                ice: 0.25,
            },
            ring: None,
        },
        PlanetSpec {
            name: "Mars",
            color: Rgb::hex(0xff3300),
            radius: 1.1,
            distance: 25.0,
            speed: 0.008,
            surface: SurfaceStyle {
                base: Rgb { r: 210, g: 90, b: 45 },
                accent: Rgb { r: 255, g: 160, b: 90 },
                ocean: Rgb { r: 120, g: 45, b: 25 },
                seed: 0xD0C0_B0A0,
                roughness: 0.86,
                bands: 0.10,
                clouds: 0.05,
                ice: 0.12,
            },
            ring: None,
        },
        PlanetSpec {
            name: "Jupiter",
            color: Rgb::hex(0xff9966),
            radius: 2.5,
            distance: 35.0,
            speed: 0.002,
            surface: SurfaceStyle {
                base: Rgb { r: 190, g: 140, b: 95 },
                accent: Rgb { r: 255, g: 220, b: 180 },
                ocean: Rgb { r: 150, g: 90, b: 60 },
                seed: 0xCAFE_BABE,
                roughness: 0.45,
                bands: 0.98,
                clouds: 0.35,
                ice: 0.0,
            },
            ring: None,
        },
        PlanetSpec {
            name: "Saturn",
            color: Rgb::hex(0xffffcc),
            radius: 2.2,
            distance: 45.0,
            speed: 0.0018,
            surface: SurfaceStyle {
                base: Rgb { r: 200, g: 170, b: 120 },
                accent: Rgb { r: 255, g: 230, b: 180 },
                ocean: Rgb { r: 170, g: 140, b: 95 },
                seed: 0xB16B_00B5,
                roughness: 0.35,
                bands: 0.90,
                clouds: 0.30,
                ice: 0.0,
            },
            ring: Some(RingSpec {
                inner: 3.0,
                outer: 5.5,
                base: Rgb { r: 150, g: 130, b: 100 },
                accent: Rgb { r: 240, g: 220, b: 180 },
            }),
        },
        PlanetSpec {
            name: "Uranus",
            color: Rgb::hex(0x66ffff),
            radius: 1.9,
            distance: 55.0,
            speed: 0.0012,
            surface: SurfaceStyle {
                base: Rgb { r: 120, g: 200, b: 210 },
                accent: Rgb { r: 200, g: 250, b: 245 },
                ocean: Rgb { r: 90, g: 170, b: 190 },
                seed: 0x55AA_11EE,
                roughness: 0.30,
                bands: 0.25,
                clouds: 0.18,
                ice: 0.10,
            },
            ring: None,
        },
        PlanetSpec {
            name: "Neptune",
            color: Rgb::hex(0x3333ff),
            radius: 1.8,
            distance: 65.0,
            speed: 0.001,
            surface: SurfaceStyle {
                base: Rgb { r: 70, g: 110, b: 210 },
                accent: Rgb { r: 160, g: 200, b: 255 },
                ocean: Rgb { r: 40, g: 60, b: 160 },
                seed: 0x3C5A_9DFF,
                roughness: 0.40,
                bands: 0.20,
                clouds: 0.25,
                ice: 0.05,
            },
            ring: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_planets_ordered_outward() {
        let planets = default_planets();
        assert_eq!(planets.len(), 8);
        for pair in planets.windows(2) {
            assert!(pair[0].distance < pair[1].distance);
            assert!(pair[0].distance - pair[0].radius > SUN_RADIUS);
        }
    }

    #[test]
    fn only_saturn_is_ringed() {
        let ringed: Vec<_> = default_planets().into_iter().filter(|p| p.ring.is_some()).collect();
        assert_eq!(ringed.len(), 1);
        assert_eq!(ringed[0].name, "Saturn");
        let ring = ringed[0].ring.unwrap();
        assert!(ring.inner > ringed[0].radius && ring.outer > ring.inner);
    }
}
