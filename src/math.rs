use crossterm::style::Color;

// -------------------- Scalars --------------------
pub(crate) fn clamp01(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
pub(crate) fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let t = clamp01((x - e0) / (e1 - e0).max(1e-6));
    t * t * (3.0 - 2.0 * t)
}

// -------------------- Vectors --------------------
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec3 {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
}

impl Vec3 {
    pub(crate) const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub(crate) const Y: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub(crate) const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
    pub(crate) fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
    pub(crate) fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
    pub(crate) fn scale(self, k: f32) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }
    pub(crate) fn dot(self, o: Vec3) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }
    pub(crate) fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }
    pub(crate) fn len(self) -> f32 {
        self.dot(self).sqrt()
    }
    pub(crate) fn norm(self) -> Vec3 {
        self.scale(1.0 / self.len().max(1e-6))
    }
    pub(crate) fn rot_x(self, ang: f32) -> Vec3 {
        let (s, c) = ang.sin_cos();
        Vec3::new(self.x, c * self.y - s * self.z, s * self.y + c * self.z)
    }
    pub(crate) fn rot_y(self, ang: f32) -> Vec3 {
        let (s, c) = ang.sin_cos();
        Vec3::new(c * self.x + s * self.z, self.y, -s * self.x + c * self.z)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Ray {
    pub(crate) origin: Vec3,
    /// Unit length.
    pub(crate) dir: Vec3,
}

impl Ray {
    pub(crate) fn at(&self, t: f32) -> Vec3 {
        self.origin.add(self.dir.scale(t))
    }
}

/// Nearest positive hit distance of `ray` against a sphere, if any.
pub(crate) fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin.sub(center);
    let b = oc.dot(ray.dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = -b - sq;
    if t0 > 0.0 {
        return Some(t0);
    }
    let t1 = -b + sq;
    if t1 > 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// Hit of `ray` against a flat annulus in the horizontal plane through `center`.
/// Returns the hit distance and the radial distance of the hit from the center.
pub(crate) fn ray_annulus(ray: &Ray, center: Vec3, inner: f32, outer: f32) -> Option<(f32, f32)> {
    if ray.dir.y.abs() < 1e-6 {
        return None;
    }
    let t = (center.y - ray.origin.y) / ray.dir.y;
    if t <= 0.0 {
        return None;
    }
    let p = ray.at(t).sub(center);
    let r = (p.x * p.x + p.z * p.z).sqrt();
    if r < inner || r > outer {
        return None;
    }
    Some((t, r))
}

// -------------------- Color --------------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn hex(v: u32) -> Self {
        Self {
            r: ((v >> 16) & 0xff) as u8,
            g: ((v >> 8) & 0xff) as u8,
            b: (v & 0xff) as u8,
        }
    }
    pub(crate) fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
    pub(crate) fn linear(self) -> Lin {
        Lin {
            r: srgb_to_linear(self.r as f32 / 255.0),
            g: srgb_to_linear(self.g as f32 / 255.0),
            b: srgb_to_linear(self.b as f32 / 255.0),
        }
    }
}

/// Linear-light color, unbounded above (HDR).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Lin {
    pub(crate) r: f32,
    pub(crate) g: f32,
    pub(crate) b: f32,
}

impl Lin {
    pub(crate) const BLACK: Lin = Lin { r: 0.0, g: 0.0, b: 0.0 };

    pub(crate) const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
    pub(crate) fn add(self, o: Lin) -> Lin {
        Lin::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
    pub(crate) fn mul(self, o: Lin) -> Lin {
        Lin::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
    pub(crate) fn scale(self, k: f32) -> Lin {
        Lin::new(self.r * k, self.g * k, self.b * k)
    }
    pub(crate) fn mix(self, o: Lin, t: f32) -> Lin {
        Lin::new(lerp(self.r, o.r, t), lerp(self.g, o.g, t), lerp(self.b, o.b, t))
    }
    /// Rec. 709 luma, same weights as the bloom high pass.
    pub(crate) fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
    pub(crate) fn max_channel(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }
    pub(crate) fn to_srgb(self) -> Rgb {
        let enc = |c: f32| (linear_to_srgb(clamp01(c)) * 255.0 + 0.5) as u8;
        Rgb { r: enc(self.r), g: enc(self.g), b: enc(self.b) }
    }
}

pub(crate) fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
pub(crate) fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_hit_from_outside_takes_near_side() {
        let ray = Ray { origin: Vec3::new(0.0, 0.0, 10.0), dir: Vec3::new(0.0, 0.0, -1.0) };
        let t = ray_sphere(&ray, Vec3::ZERO, 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_miss_and_behind() {
        let ray = Ray { origin: Vec3::new(0.0, 5.0, 10.0), dir: Vec3::new(0.0, 0.0, -1.0) };
        assert!(ray_sphere(&ray, Vec3::ZERO, 2.0).is_none());

        let away = Ray { origin: Vec3::new(0.0, 0.0, 10.0), dir: Vec3::new(0.0, 0.0, 1.0) };
        assert!(ray_sphere(&away, Vec3::ZERO, 2.0).is_none());
    }

    #[test]
    fn annulus_reports_radius_and_rejects_hole() {
        let down = Vec3::new(0.0, -1.0, 0.0);
        let ray = Ray { origin: Vec3::new(4.0, 10.0, 0.0), dir: down };
        let (t, r) = ray_annulus(&ray, Vec3::ZERO, 3.0, 5.5).unwrap();
        assert!((t - 10.0).abs() < 1e-5);
        assert!((r - 4.0).abs() < 1e-5);

        let hole = Ray { origin: Vec3::new(1.0, 10.0, 0.0), dir: down };
        assert!(ray_annulus(&hole, Vec3::ZERO, 3.0, 5.5).is_none());

        let edge_on = Ray { origin: Vec3::new(-20.0, 0.0, 0.0), dir: Vec3::new(1.0, 0.0, 0.0) };
        assert!(ray_annulus(&edge_on, Vec3::ZERO, 3.0, 5.5).is_none());
    }

    #[test]
    fn srgb_round_trip_is_stable_on_endpoints() {
        let white = Rgb::hex(0xffffff).linear();
        assert!((white.r - 1.0).abs() < 1e-5);
        assert_eq!(white.to_srgb(), Rgb::hex(0xffffff));
        assert_eq!(Lin::BLACK.to_srgb(), Rgb::hex(0x000000));
        let mid = Rgb::hex(0x808080);
        assert_eq!(mid.linear().to_srgb(), mid);
    }

    #[test]
    fn rotations_preserve_length() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!((v.rot_x(0.7).len() - v.len()).abs() < 1e-5);
        assert!((v.rot_y(-1.3).len() - v.len()).abs() < 1e-5);
        let q = Vec3::new(1.0, 0.0, 0.0).rot_y(std::f32::consts::FRAC_PI_2);
        assert!((q.z + 1.0).abs() < 1e-5);
    }
}
