use crate::catalog::{RingSpec, SurfaceStyle};
use crate::math::{clamp01, lerp, smoothstep, Lin, Vec3};

// -------------------- Procedural noise (value noise + fbm) --------------------
fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn hash3(ix: i32, iy: i32, iz: i32, seed: u32) -> u32 {
    let mut h = seed ^ 0x9e37_79b9;
    h ^= (ix as u32).wrapping_mul(0x85eb_ca6b);
    h = hash_u32(h);
    h ^= (iy as u32).wrapping_mul(0xc2b2_ae35);
    h = hash_u32(h);
    h ^= (iz as u32).wrapping_mul(0x27d4_eb2f);
    hash_u32(h)
}

fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn value_noise_3d(p: Vec3, seed: u32) -> f32 {
    let (ix, iy, iz) = (p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32);
    let sx = fade(p.x - ix as f32);
    let sy = fade(p.y - iy as f32);
    let sz = fade(p.z - iz as f32);

    let v = |dx: i32, dy: i32, dz: i32| -> f32 {
        hash3(ix + dx, iy + dy, iz + dz, seed) as f32 / u32::MAX as f32
    };

    let x00 = lerp(v(0, 0, 0), v(1, 0, 0), sx);
    let x10 = lerp(v(0, 1, 0), v(1, 1, 0), sx);
    let x01 = lerp(v(0, 0, 1), v(1, 0, 1), sx);
    let x11 = lerp(v(0, 1, 1), v(1, 1, 1), sx);
    lerp(lerp(x00, x10, sy), lerp(x01, x11, sy), sz)
}

pub(crate) fn fbm_3d(p: Vec3, seed: u32, octaves: usize) -> f32 {
    let mut amp = 0.55;
    let mut freq = 1.0;
    let mut sum = 0.0;
    let mut norm = 0.0;
    for o in 0..octaves {
        let s = seed.wrapping_add((o as u32).wrapping_mul(0x9e37_79b9));
        let n = value_noise_3d(p.scale(freq), s);
        sum += (n * 2.0 - 1.0) * amp;
        norm += amp;
        amp *= 0.52;
        freq *= 2.03;
    }
    clamp01(0.5 + 0.5 * (sum / f32::max(norm, 1e-6)))
}

// -------------------- Planet surfaces --------------------

/// Surface albedo at a point given by its unit normal in the planet's own
/// (spun) frame. Linear color.
pub(crate) fn planet_albedo(style: &SurfaceStyle, n: Vec3) -> Lin {
    let lat = n.y.clamp(-1.0, 1.0).asin();

    let banding = 0.5 + 0.5 * (lat * (3.0 + style.bands * 9.0)).sin();
    let n0 = fbm_3d(n.scale(2.6).add(Vec3::new(0.7, 0.2, -0.4)), style.seed, 5);
    let n1 = fbm_3d(
        Vec3::new(n.x * 0.8, lat * 2.4, n.z * 0.8).add(Vec3::new(7.1, -3.4, 1.7)),
        style.seed.wrapping_add(0xBADC_0FFE),
        4,
    );
    let rough = lerp(n0, n1, style.roughness);
    let land = clamp01((rough - 0.48) * 2.2);

    let base = style.base.linear();
    let accent = style.accent.linear();
    let ocean = style.ocean.linear();

    let mut col = if land > 0.45 {
        let t = clamp01(0.25 + 0.75 * land) * (0.65 + 0.35 * banding);
        base.mix(accent, t)
    } else {
        let t = clamp01(0.35 + 0.65 * (0.60 * banding + 0.40 * (1.0 - rough)));
        ocean.mix(base, t * 0.25)
    };

    // banded giants: stripe toward the accent regardless of terrain
    if style.bands > 0.5 {
        col = col.mix(accent, (banding - 0.5).max(0.0) * style.bands * 0.6);
    }

    let cnoise = fbm_3d(n.scale(3.1).add(Vec3::new(2.0, 5.3, -1.1)), style.seed.wrapping_add(0x1357_9BDF), 5);
    let clouds = clamp01((cnoise - 0.56) * 2.7) * style.clouds;
    col = col.mix(Lin::new(0.9, 0.9, 0.9), clouds * 0.8);

    let cap = clamp01((lat.abs() - (1.36 - style.ice * 0.5)) * 6.0) * style.ice;
    if cap > 0.01 {
        col = col.mix(Lin::new(0.95, 0.95, 1.0), clamp01(cap * 2.0));
    }
    col
}

// -------------------- Rings --------------------

/// Ring color and opacity at radial distance `r` from the planet center.
/// The profile depends on radius only, so the ring looks the same from any angle.
pub(crate) fn ring_sample(ring: &RingSpec, r: f32) -> (Lin, f32) {
    let u = clamp01((r - ring.inner) / (ring.outer - ring.inner).max(1e-6));

    // C ring, B ring, Cassini division, A ring, outer fade
    let c_ring = 0.25 * (1.0 - smoothstep(0.18, 0.22, u));
    let b_ring = 0.85 * smoothstep(0.18, 0.22, u) * (1.0 - smoothstep(0.54, 0.56, u));
    let a_ring = 0.60 * smoothstep(0.61, 0.63, u) * (1.0 - smoothstep(0.90, 1.0, u));
    let grain = 0.75 + 0.25 * (u * 140.0).sin() * (u * 37.0).cos();
    let alpha = clamp01((c_ring + b_ring + a_ring) * grain);

    let col = ring.base.linear().mix(ring.accent.linear(), clamp01(0.3 + 0.7 * b_ring / 0.85));
    (col, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_planets;

    #[test]
    fn fbm_is_normalized_and_deterministic() {
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * -0.11, 3.0);
            let a = fbm_3d(p, 42, 5);
            assert!((0.0..=1.0).contains(&a));
            assert_eq!(a, fbm_3d(p, 42, 5));
        }
    }

    #[test]
    fn albedo_stays_in_gamut() {
        for spec in default_planets() {
            for i in 0..64 {
                let a = i as f32 * 0.41;
                let n = Vec3::new(a.cos(), (a * 0.7).sin() * 0.9, a.sin()).norm();
                let c = planet_albedo(&spec.surface, n);
                assert!(c.max_channel() <= 1.0 + 1e-4, "{}", spec.name);
                assert!(c.r >= 0.0 && c.g >= 0.0 && c.b >= 0.0);
            }
        }
    }

    #[test]
    fn ring_has_cassini_gap() {
        let ring = default_planets()[5].ring.unwrap();
        let span = ring.outer - ring.inner;
        let (_, b) = ring_sample(&ring, ring.inner + span * 0.40);
        let (_, gap) = ring_sample(&ring, ring.inner + span * 0.585);
        let (_, a) = ring_sample(&ring, ring.inner + span * 0.75);
        assert!(b > 0.5);
        assert!(gap < 0.05);
        assert!(a > gap);
    }
}
