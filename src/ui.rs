//! Control panel, speed sliders, pause button and hover tooltip, drawn as
//! cells over the rendered viewport, plus hit testing for mouse input.

use crate::scene::{snap_to_step, Scene, SPEED_MAX, SPEED_MIN};
use crate::term::{Cell, CellBuffer, GlyphMode};
use crossterm::style::Color;

const PANEL_W: u16 = 34;
const STATUS_H: u16 = 7;
const NAME_W: u16 = 8;
const VALUE_W: u16 = 7;

const BG: Color = Color::Black;
const FG: Color = Color::Rgb { r: 220, g: 220, b: 220 };
const DIM: Color = Color::Rgb { r: 130, g: 135, b: 150 };
const EDGE: Color = Color::Rgb { r: 80, g: 95, b: 120 };
const ACTIVE: Color = Color::Rgb { r: 255, g: 220, b: 120 };

const HELP: [&str; 7] = [
    "Drag: rotate | R-drag: pan",
    "Wheel or +/-: zoom",
    "W/A/S/D orbit | I/J/K/L pan",
    "Up/Down or 1-8: pick planet",
    "Left/Right: speed (Shift x10)",
    "Space: pause | 0: reset speeds",
    "B bloom | G glyphs | C camera",
];

/// Per-frame view state the panel reflects.
pub(crate) struct UiState<'a> {
    pub(crate) paused: bool,
    pub(crate) selected: usize,
    pub(crate) hover: Option<usize>,
    pub(crate) glyphs: GlyphMode,
    pub(crate) bloom: bool,
    pub(crate) date: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Panel {
    pub(crate) x: u16,
    pub(crate) w: u16,
    pub(crate) slider_y0: u16,
    pub(crate) sliders: u16,
    pub(crate) track_x: u16,
    pub(crate) track_w: u16,
    pub(crate) button_x: u16,
    pub(crate) button_y: u16,
    pub(crate) button_w: u16,
    pub(crate) help_y: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    /// Width of the 3D viewport in cells; it always spans all rows.
    pub(crate) view_w: u16,
    pub(crate) panel: Option<Panel>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum UiHit {
    Viewport,
    Slider { index: usize, value: f32 },
    PauseButton,
    Panel,
}

impl Layout {
    pub(crate) fn new(cols: u16, rows: u16, show_panel: bool, sliders: usize) -> Self {
        let pw = PANEL_W.min(cols / 2);
        if !show_panel || pw < 24 {
            return Self { cols, rows, view_w: cols, panel: None };
        }
        let x = cols - pw;
        let inner = x + 2;
        let slider_y0 = STATUS_H + 2;
        let sliders = sliders as u16;
        let track_x = inner + NAME_W + 1;
        let track_w = pw.saturating_sub(4 + NAME_W + 1 + VALUE_W).max(3);
        let button_y = slider_y0 + sliders + 1;
        Self {
            cols,
            rows,
            view_w: x,
            panel: Some(Panel {
                x,
                w: pw,
                slider_y0,
                sliders,
                track_x,
                track_w,
                button_x: inner,
                button_y,
                button_w: 10,
                help_y: button_y + 2,
            }),
        }
    }

    pub(crate) fn hit(&self, x: u16, y: u16) -> UiHit {
        let Some(p) = self.panel else { return UiHit::Viewport };
        if x < p.x {
            return UiHit::Viewport;
        }
        if y == p.button_y && x >= p.button_x && x < p.button_x + p.button_w {
            return UiHit::PauseButton;
        }
        if y >= p.slider_y0 && y < p.slider_y0 + p.sliders {
            if let Some(value) = p.track_value(x) {
                return UiHit::Slider { index: (y - p.slider_y0) as usize, value };
            }
        }
        UiHit::Panel
    }
}

impl Panel {
    /// Slider value under column `x`, or None off the track.
    pub(crate) fn track_value(&self, x: u16) -> Option<f32> {
        if x < self.track_x || x >= self.track_x + self.track_w {
            return None;
        }
        Some(self.value_at(x))
    }

    /// Value for column `x`, clamped onto the track. Used while dragging.
    pub(crate) fn value_at(&self, x: u16) -> f32 {
        let col = x.clamp(self.track_x, self.track_x + self.track_w - 1) - self.track_x;
        let frac = col as f32 / (self.track_w - 1).max(1) as f32;
        snap_to_step(SPEED_MIN + frac * (SPEED_MAX - SPEED_MIN))
    }

    fn knob_col(&self, value: f32) -> u16 {
        let frac = ((value - SPEED_MIN) / (SPEED_MAX - SPEED_MIN)).clamp(0.0, 1.0);
        self.track_x + (frac * (self.track_w - 1) as f32).round() as u16
    }
}

// -------------------- Cell drawing --------------------
pub(crate) fn write_str(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    let mut xi = x;
    for ch in s.chars() {
        if xi >= buf.w {
            break;
        }
        buf.set(xi, y, Cell { ch, fg, bg, bold: false });
        xi += 1;
    }
}

fn write_bold(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    let mut xi = x;
    for ch in s.chars() {
        buf.set(xi, y, Cell { ch, fg, bg: BG, bold: true });
        xi += 1;
    }
}

fn box_draw(buf: &mut CellBuffer, x0: u16, y0: u16, bw: u16, bh: u16, fg: Color) {
    if bw < 2 || bh < 2 {
        return;
    }
    let x1 = x0.saturating_add(bw - 1);
    let y1 = y0.saturating_add(bh - 1);
    let c = |ch| Cell { ch, fg, bg: BG, bold: false };

    for x in x0 + 1..x1 {
        buf.set(x, y0, c('─'));
        buf.set(x, y1, c('─'));
    }
    for y in y0 + 1..y1 {
        buf.set(x0, y, c('│'));
        buf.set(x1, y, c('│'));
    }
    buf.set(x0, y0, c('┌'));
    buf.set(x1, y0, c('┐'));
    buf.set(x0, y1, c('└'));
    buf.set(x1, y1, c('┘'));
}

fn fill(buf: &mut CellBuffer, x0: u16, y0: u16, w: u16, h: u16) {
    for y in y0..y0.saturating_add(h) {
        for x in x0..x0.saturating_add(w) {
            buf.set(x, y, Cell { bg: BG, ..Cell::default() });
        }
    }
}

// -------------------- Panel --------------------
pub(crate) fn draw_panel(buf: &mut CellBuffer, layout: &Layout, scene: &Scene, st: &UiState) {
    let Some(p) = layout.panel else {
        write_str(buf, 1, layout.rows.saturating_sub(1), "H: panel", DIM, BG);
        return;
    };
    fill(buf, p.x, 0, p.w, layout.rows);
    box_draw(buf, p.x, 0, p.w, STATUS_H, EDGE);
    box_draw(buf, p.x, STATUS_H, p.w, layout.rows.saturating_sub(STATUS_H), EDGE);

    let tx = p.x + 2;
    write_bold(buf, tx, 1, "Solar System", FG);
    let (state, state_fg) = if st.paused { ("paused", ACTIVE) } else { ("running", DIM) };
    write_str(buf, tx, 2, "State: ", DIM, BG);
    write_str(buf, tx + 7, 2, state, state_fg, BG);
    write_str(buf, tx, 3, &format!("Date: {}", st.date), DIM, BG);
    write_str(
        buf,
        tx,
        4,
        &format!("Glyphs: {} | bloom {}", st.glyphs.label(), if st.bloom { "on" } else { "off" }),
        DIM,
        BG,
    );
    let hover = st.hover.and_then(|i| scene.planets.get(i)).map(|pl| pl.name()).unwrap_or("-");
    write_str(buf, tx, 5, &format!("Hover: {}", hover), DIM, BG);

    write_bold(buf, tx, STATUS_H + 1, "Orbital speed (rad/tick)", FG);
    for (i, planet) in scene.planets.iter().enumerate().take(p.sliders as usize) {
        let y = p.slider_y0 + i as u16;
        let selected = i == st.selected;
        let name_fg = if selected { planet.spec.color.to_color() } else { DIM };
        buf.set(tx - 1, y, Cell { ch: if selected { '▸' } else { ' ' }, fg: ACTIVE, bg: BG, bold: false });
        write_str(buf, tx, y, planet.name(), name_fg, BG);

        let knob = p.knob_col(planet.speed);
        for x in p.track_x..p.track_x + p.track_w {
            let (ch, fg) = if x == knob {
                ('●', if selected { ACTIVE } else { FG })
            } else if x < knob {
                ('━', planet.spec.color.to_color())
            } else {
                ('─', EDGE)
            };
            buf.set(x, y, Cell { ch, fg, bg: BG, bold: false });
        }
        write_str(buf, p.track_x + p.track_w + 1, y, &format!("{:.4}", planet.speed), FG, BG);
    }

    let label = if st.paused { "[ Resume ]" } else { "[ Pause  ]" };
    write_bold(buf, p.button_x, p.button_y, label, if st.paused { ACTIVE } else { FG });

    let bottom = layout.rows.saturating_sub(1);
    if p.help_y < bottom {
        write_bold(buf, tx, p.help_y, "Keys", FG);
    }
    for (i, line) in HELP.iter().enumerate() {
        let y = p.help_y + 1 + i as u16;
        if y >= bottom {
            break;
        }
        write_str(buf, tx, y, line, DIM, BG);
    }
    if p.help_y + 1 + HELP.len() as u16 + 1 < bottom {
        write_str(buf, tx, bottom - 1, "H hide panel | Q quit", DIM, BG);
    }
}

/// One-line boxed label just below-right of the pointer, kept inside the viewport.
pub(crate) fn draw_tooltip(buf: &mut CellBuffer, layout: &Layout, mx: u16, my: u16, text: &str, accent: Color) {
    let bw = text.chars().count() as u16 + 4;
    let bh = 3;
    if bw > layout.view_w || bh > layout.rows {
        return;
    }
    let x = (mx + 2).min(layout.view_w - bw);
    let y = if my + 1 + bh <= layout.rows { my + 1 } else { my.saturating_sub(bh) };
    fill(buf, x, y, bw, bh);
    box_draw(buf, x, y, bw, bh, EDGE);
    write_bold(buf, x + 2, y + 1, text, accent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_planets;
    use rand::{rngs::StdRng, SeedableRng};

    fn layout() -> Layout {
        Layout::new(120, 40, true, 8)
    }

    #[test]
    fn panel_sits_on_the_right() {
        let l = layout();
        let p = l.panel.unwrap();
        assert_eq!(p.x, 120 - PANEL_W);
        assert_eq!(l.view_w, p.x);
        assert_eq!(l.hit(0, 0), UiHit::Viewport);
        assert_eq!(l.hit(p.x - 1, 20), UiHit::Viewport);
        assert_eq!(l.hit(p.x + 1, 1), UiHit::Panel);
    }

    #[test]
    fn hidden_or_cramped_panel_gives_full_viewport() {
        assert_eq!(Layout::new(120, 40, false, 8).view_w, 120);
        assert!(Layout::new(40, 20, true, 8).panel.is_none());
    }

    #[test]
    fn slider_track_maps_ends_to_range() {
        let l = layout();
        let p = l.panel.unwrap();
        let y = p.slider_y0 + 3;
        assert_eq!(l.hit(p.track_x, y), UiHit::Slider { index: 3, value: SPEED_MIN });
        match l.hit(p.track_x + p.track_w - 1, y) {
            UiHit::Slider { index, value } => {
                assert_eq!(index, 3);
                assert!((value - SPEED_MAX).abs() < 1e-6);
            }
            other => panic!("{other:?}"),
        }
        // name column is not part of the track
        assert_eq!(l.hit(p.track_x - 2, y), UiHit::Panel);
        // dragging past the end clamps
        assert!((p.value_at(p.x + p.w + 5) - SPEED_MAX).abs() < 1e-6);
    }

    #[test]
    fn pause_button_is_clickable() {
        let l = layout();
        let p = l.panel.unwrap();
        assert_eq!(l.hit(p.button_x, p.button_y), UiHit::PauseButton);
        assert_eq!(l.hit(p.button_x + p.button_w, p.button_y), UiHit::Panel);
    }

    #[test]
    fn panel_draws_names_and_knobs() {
        let mut rng = StdRng::seed_from_u64(3);
        let scene = Scene::new(&default_planets(), &mut rng);
        let l = layout();
        let p = l.panel.unwrap();
        let mut buf = CellBuffer::new(l.cols, l.rows);
        let st = UiState {
            paused: true,
            selected: 2,
            hover: Some(5),
            glyphs: GlyphMode::Braille,
            bloom: true,
            date: "2026-01-01",
        };
        draw_panel(&mut buf, &l, &scene, &st);

        let row: String = (p.x..l.cols).map(|x| buf.get(x, p.slider_y0 + 2).unwrap().ch).collect();
        assert!(row.contains("Earth"));
        assert!(row.contains('▸'));
        assert!(row.contains("0.0100"));
        let knob_x = p.knob_col(0.01);
        assert_eq!(buf.get(knob_x, p.slider_y0 + 2).unwrap().ch, '●');

        let status: String = (p.x..l.cols).map(|x| buf.get(x, 5).unwrap().ch).collect();
        assert!(status.contains("Hover: Saturn"));
        let button: String = (p.button_x..p.button_x + 10).map(|x| buf.get(x, p.button_y).unwrap().ch).collect();
        assert_eq!(button, "[ Resume ]");
    }

    #[test]
    fn tooltip_stays_on_screen() {
        let l = layout();
        let mut buf = CellBuffer::new(l.cols, l.rows);
        draw_tooltip(&mut buf, &l, l.view_w - 1, l.rows - 1, "Neptune", Color::Blue);
        let text_y = l.rows - 1 - 3 + 1;
        let row: String = (0..l.view_w).map(|x| buf.get(x, text_y).unwrap().ch).collect();
        assert!(row.contains("Neptune"));
        // nothing spilled into the panel
        let p = l.panel.unwrap();
        assert_ne!(buf.get(p.x, text_y).unwrap().ch, '│');
    }
}
