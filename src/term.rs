use crate::math::{Lin, Rgb};
use crate::shade::Frame;
use clap::ValueEnum;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor, Attribute},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell { bg, ..Cell::default() };
        }
    }
}

/// How canvas pixels are packed into terminal cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum GlyphMode {
    /// 2x4 dots per cell, one color per cell.
    #[default]
    Braille,
    /// Upper-half block, two colors per cell.
    HalfBlock,
}

impl GlyphMode {
    /// Canvas pixels per cell as (columns, rows).
    pub(crate) fn subpixels(self) -> (u32, u32) {
        match self {
            GlyphMode::Braille => (2, 4),
            GlyphMode::HalfBlock => (1, 2),
        }
    }
    pub(crate) fn toggled(self) -> Self {
        match self {
            GlyphMode::Braille => GlyphMode::HalfBlock,
            GlyphMode::HalfBlock => GlyphMode::Braille,
        }
    }
    pub(crate) fn label(self) -> &'static str {
        match self {
            GlyphMode::Braille => "braille",
            GlyphMode::HalfBlock => "half-block",
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        let setup = execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )
        .and_then(|_| terminal::size());
        let (cols, rows) = match setup {
            Ok(size) => size,
            Err(e) => {
                restore();
                return Err(e.into());
            }
        };
        let mut t = Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        };
        t.invalidate();
        Ok(t)
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        restore();
        Ok(())
    }

    /// Forces the next `present` to repaint every cell.
    pub(crate) fn invalidate(&mut self) {
        for c in &mut self.prev.cells {
            c.ch = '\0';
        }
    }

    pub(crate) fn resize(&mut self, c: u16, r: u16) -> anyhow::Result<bool> {
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.invalidate();
        execute!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        self.resize(c, r)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if c.bold != last_bold {
                    let attr = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Leaves raw mode and the alternate screen. Safe to call more than once,
/// including from the panic hook.
pub(crate) fn restore() {
    let mut out = io::stdout();
    let _ = execute!(
        out,
        DisableMouseCapture,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
}

/* -----------------------------
   Framebuffer -> glyphs
------------------------------ */

fn bayer_2x4_threshold(ix: u32, iy: u32) -> f32 {
    const M: [[u8; 2]; 4] = [[0, 4], [6, 2], [1, 5], [7, 3]];
    let v = M[(iy & 3) as usize][(ix & 1) as usize] as f32;
    (v + 0.5) / 8.0
}

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Perceived brightness of a linear pixel after display encoding.
fn display_luma(c: Lin) -> f32 {
    let s = c.to_srgb();
    (0.2126 * s.r as f32 + 0.7152 * s.g as f32 + 0.0722 * s.b as f32) / 255.0
}

/// Writes `frame` into the `cols` x `rows` block of `out` starting at (x0, y0).
/// The frame must be `cols * sx` by `rows * sy` pixels for the mode's subpixel grid.
pub(crate) fn frame_to_cells(frame: &Frame, out: &mut CellBuffer, x0: u16, y0: u16, mode: GlyphMode) {
    let (sx, sy) = mode.subpixels();
    let cols = frame.w / sx;
    let rows = frame.h / sy;
    let bg = Color::Black;

    for cy in 0..rows {
        for cx in 0..cols {
            let cell = match mode {
                GlyphMode::Braille => braille_cell(frame, cx * 2, cy * 4),
                GlyphMode::HalfBlock => {
                    let top = frame.get(cx, cy * 2).to_srgb();
                    let bot = frame.get(cx, cy * 2 + 1).to_srgb();
                    if top == Rgb::hex(0) && bot == Rgb::hex(0) {
                        Cell { bg, ..Cell::default() }
                    } else {
                        Cell { ch: '▀', fg: top.to_color(), bg: bot.to_color(), bold: false }
                    }
                }
            };
            out.set(x0 + cx as u16, y0 + cy as u16, cell);
        }
    }
}

fn braille_cell(frame: &Frame, px0: u32, py0: u32) -> Cell {
    let mut mask: u8 = 0;
    let mut sum = Lin::BLACK;
    let mut lit = 0u32;

    for dy in 0..4 {
        for dx in 0..2 {
            let (x, y) = (px0 + dx, py0 + dy);
            let c = frame.get(x, y);
            if display_luma(c) > bayer_2x4_threshold(x, y) {
                mask |= braille_bit(dx, dy);
                sum = sum.add(Lin::new(c.r.min(1.0), c.g.min(1.0), c.b.min(1.0)));
                lit += 1;
            }
        }
    }

    if lit == 0 {
        return Cell::default();
    }
    // dot density carries brightness, so push the dot color toward full intensity
    let avg = sum.scale(1.0 / lit as f32);
    let boost = (1.0 / avg.max_channel().max(1e-3)).min(1.6);
    Cell {
        ch: char::from_u32(0x2800 + mask as u32).unwrap_or(' '),
        fg: avg.scale(boost).to_srgb().to_color(),
        bg: Color::Black,
        bold: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(w: u32, h: u32, c: Lin) -> Frame {
        let mut f = Frame::new(w, h);
        f.color.fill(c);
        f
    }

    #[test]
    fn braille_white_is_full_block_of_dots() {
        let f = uniform(4, 8, Lin::new(1.0, 1.0, 1.0));
        let mut buf = CellBuffer::new(2, 2);
        frame_to_cells(&f, &mut buf, 0, 0, GlyphMode::Braille);
        for c in &buf.cells {
            assert_eq!(c.ch, '⣿');
            assert_eq!(c.fg, Color::Rgb { r: 255, g: 255, b: 255 });
        }
    }

    #[test]
    fn braille_black_is_blank() {
        let f = Frame::new(4, 8);
        let mut buf = CellBuffer::new(2, 2);
        frame_to_cells(&f, &mut buf, 0, 0, GlyphMode::Braille);
        assert!(buf.cells.iter().all(|c| c.ch == ' '));
    }

    #[test]
    fn braille_mid_gray_lights_about_half_the_dots() {
        let gray = Rgb::hex(0x808080).linear();
        let f = uniform(2, 4, gray);
        let mut buf = CellBuffer::new(1, 1);
        frame_to_cells(&f, &mut buf, 0, 0, GlyphMode::Braille);
        let dots = (buf.cells[0].ch as u32 - 0x2800).count_ones();
        assert_eq!(dots, 4);
    }

    #[test]
    fn half_block_carries_two_colors() {
        let mut f = Frame::new(1, 2);
        f.color[0] = Rgb::hex(0xff0000).linear();
        f.color[1] = Rgb::hex(0x0000ff).linear();
        let mut buf = CellBuffer::new(3, 3);
        frame_to_cells(&f, &mut buf, 2, 1, GlyphMode::HalfBlock);
        let c = buf.get(2, 1).unwrap();
        assert_eq!(c.ch, '▀');
        assert_eq!(c.fg, Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(c.bg, Color::Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(buf.get(0, 0).unwrap(), Cell::default());
    }

    #[test]
    fn glyph_mode_toggles_and_parses() {
        assert_eq!(GlyphMode::Braille.toggled(), GlyphMode::HalfBlock);
        let m: GlyphMode = serde_json::from_str("\"half-block\"").unwrap();
        assert_eq!(m, GlyphMode::HalfBlock);
        assert_eq!(GlyphMode::from_str("braille", true).unwrap(), GlyphMode::Braille);
    }
}
