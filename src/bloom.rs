//! Mip-chain bloom: luminance high pass, five progressively half-sized
//! gaussian blurs, weighted additive composite.

use crate::math::{lerp, smoothstep, Lin};
use crate::shade::Frame;

const MIPS: usize = 5;
const KERNEL_RADII: [usize; MIPS] = [3, 5, 7, 9, 11];
const MIP_FACTORS: [f32; MIPS] = [1.0, 0.8, 0.6, 0.4, 0.2];
const SMOOTH_WIDTH: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BloomParams {
    pub(crate) threshold: f32,
    pub(crate) strength: f32,
    pub(crate) radius: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self { threshold: 0.0, strength: 2.0, radius: 1.0 }
    }
}

struct Plane {
    w: usize,
    h: usize,
    px: Vec<Lin>,
}

impl Plane {
    fn new(w: usize, h: usize) -> Self {
        Self { w, h, px: vec![Lin::BLACK; w * h] }
    }
    fn at(&self, x: usize, y: usize) -> Lin {
        self.px[y * self.w + x]
    }

    /// 2x2 box reduction; odd edges fold into the last texel.
    fn half(&self) -> Plane {
        let w = (self.w / 2).max(1);
        let h = (self.h / 2).max(1);
        let mut out = Plane::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let mut sum = Lin::BLACK;
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let sx = (x * 2 + dx).min(self.w - 1);
                    let sy = (y * 2 + dy).min(self.h - 1);
                    sum = sum.add(self.at(sx, sy));
                }
                out.px[y * w + x] = sum.scale(0.25);
            }
        }
        out
    }

    fn blur(&self, radius: usize) -> Plane {
        let weights = gaussian_weights(radius);
        let horiz = self.convolve(&weights, true);
        horiz.convolve(&weights, false)
    }

    fn convolve(&self, weights: &[f32], horizontal: bool) -> Plane {
        let mut out = Plane::new(self.w, self.h);
        for y in 0..self.h {
            for x in 0..self.w {
                let mut sum = self.at(x, y).scale(weights[0]);
                for (i, wgt) in weights.iter().enumerate().skip(1) {
                    let (a, b) = if horizontal {
                        (self.at(x.saturating_sub(i), y), self.at((x + i).min(self.w - 1), y))
                    } else {
                        (self.at(x, y.saturating_sub(i)), self.at(x, (y + i).min(self.h - 1)))
                    };
                    sum = sum.add(a.add(b).scale(*wgt));
                }
                out.px[y * self.w + x] = sum;
            }
        }
        out
    }

    /// Bilinear sample at the center of full-resolution pixel (x, y).
    fn sample_up(&self, x: u32, y: u32, full_w: u32, full_h: u32) -> Lin {
        let u = ((x as f32 + 0.5) / full_w as f32 * self.w as f32 - 0.5).max(0.0);
        let v = ((y as f32 + 0.5) / full_h as f32 * self.h as f32 - 0.5).max(0.0);
        let x0 = (u as usize).min(self.w - 1);
        let y0 = (v as usize).min(self.h - 1);
        let x1 = (x0 + 1).min(self.w - 1);
        let y1 = (y0 + 1).min(self.h - 1);
        let fx = u - x0 as f32;
        let fy = v - y0 as f32;
        let top = self.at(x0, y0).mix(self.at(x1, y0), fx.min(1.0));
        let bot = self.at(x0, y1).mix(self.at(x1, y1), fx.min(1.0));
        top.mix(bot, fy.min(1.0))
    }
}

/// One-sided normalized gaussian taps, sigma equal to the kernel radius.
fn gaussian_weights(radius: usize) -> Vec<f32> {
    let sigma = radius as f32;
    let mut w: Vec<f32> = (0..radius)
        .map(|i| 0.398_94 * (-0.5 * (i * i) as f32 / (sigma * sigma)).exp() / sigma)
        .collect();
    let total = w[0] + 2.0 * w[1..].iter().sum::<f32>();
    for v in &mut w {
        *v /= total;
    }
    w
}

fn mip_factor(i: usize, radius: f32) -> f32 {
    let f = MIP_FACTORS[i];
    lerp(f, 1.2 - f, radius)
}

/// Adds bloom to `frame` in place.
pub(crate) fn apply(frame: &mut Frame, params: &BloomParams) {
    if frame.w == 0 || frame.h == 0 || params.strength <= 0.0 {
        return;
    }
    let (w, h) = (frame.w as usize, frame.h as usize);

    let mut bright = Plane::new(w, h);
    for (dst, src) in bright.px.iter_mut().zip(frame.color.iter()) {
        let a = smoothstep(params.threshold, params.threshold + SMOOTH_WIDTH, src.luminance());
        *dst = src.scale(a);
    }

    let mut levels: Vec<Plane> = Vec::with_capacity(MIPS);
    for radius in KERNEL_RADII {
        let next = levels.last().unwrap_or(&bright).half().blur(radius);
        levels.push(next);
    }

    for y in 0..frame.h {
        for x in 0..frame.w {
            let mut glow = Lin::BLACK;
            for (i, level) in levels.iter().enumerate() {
                glow = glow.add(level.sample_up(x, y, frame.w, frame.h).scale(mip_factor(i, params.radius)));
            }
            let idx = frame.idx(x, y);
            frame.color[idx] = frame.color[idx].add(glow.scale(params.strength));
        }
    }
}
