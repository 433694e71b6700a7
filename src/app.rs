use crate::bloom;
use crate::camera::{Camera, OrbitControls, START_POSITION};
use crate::catalog::default_planets;
use crate::config::{load_settings, project_paths, save_settings_atomic, Cli, Paths, Settings, SettingsStore};
use crate::input::{collect_input_nonblocking, map_event, Action, DragButton};
use crate::logging;
use crate::raycast::Raycaster;
use crate::scene::{Scene, TICKS_PER_SEC};
use crate::shade::{render_scene, Frame};
use crate::term::{self, frame_to_cells, Terminal};
use crate::ui::{draw_panel, draw_tooltip, Layout, UiHit, UiState};
use crossterm::style::Color;
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Nominal client pixels per cell, for pointer-driven starfield tilt.
const CELL_PX_W: f32 = 8.0;
const CELL_PX_H: f32 = 16.0;

/// Longest stretch of real time simulated in one frame after a stall.
const MAX_CATCH_UP: Duration = Duration::from_millis(250);

/// Fixed-step accumulator turning real frame time into simulation ticks.
struct SimClock {
    step: Duration,
    accum: Duration,
}

impl SimClock {
    fn new(ticks_per_sec: u32) -> Self {
        Self {
            step: Duration::from_nanos(1_000_000_000 / ticks_per_sec.max(1) as u64),
            accum: Duration::ZERO,
        }
    }

    /// Ticks due after `real_dt`. Paused time is dropped, not banked.
    fn advance(&mut self, real_dt: Duration, paused: bool) -> u32 {
        if paused {
            self.accum = Duration::ZERO;
            return 0;
        }
        self.accum = self.accum.saturating_add(real_dt).min(MAX_CATCH_UP);
        let mut ticks = 0;
        while self.accum >= self.step {
            self.accum -= self.step;
            ticks += 1;
        }
        ticks
    }
}

/// What a mouse press on the layout asks for.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PressOutcome {
    Drag(Drag),
    TogglePause,
    Nothing,
}

/// Routes a press at (`col`, `row`). Slider presses select the row and set
/// its speed immediately.
fn press_at(
    scene: &mut Scene,
    layout: &Layout,
    selected: &mut usize,
    (col, row): (u16, u16),
    button: DragButton,
) -> PressOutcome {
    match layout.hit(col, row) {
        UiHit::Viewport => PressOutcome::Drag(Drag::Camera { button, last: (col, row) }),
        UiHit::Slider { index, value } => {
            *selected = index;
            set_speed_logged(scene, index, value);
            PressOutcome::Drag(Drag::Slider(index))
        }
        UiHit::PauseButton => PressOutcome::TogglePause,
        UiHit::Panel => PressOutcome::Nothing,
    }
}

/// Slider drag: the knob follows the pointer column, clamped to the track.
fn drag_slider(scene: &mut Scene, layout: &Layout, index: usize, col: u16) -> Option<f32> {
    let panel = layout.panel?;
    set_speed_logged(scene, index, panel.value_at(col))
}

fn set_speed_logged(scene: &mut Scene, index: usize, value: f32) -> Option<f32> {
    let v = scene.set_speed(index, value)?;
    debug!(planet = scene.planets[index].name(), speed = v, "speed changed");
    Some(v)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Camera { button: DragButton, last: (u16, u16) },
    Slider(usize),
}

pub(crate) struct App {
    settings: SettingsStore,
    paths: Paths,
    save_on_exit: bool,
    scene: Scene,
    controls: OrbitControls,
    term: Terminal,
    frame: Frame,
    layout: Layout,
    paused: bool,
    selected: usize,
    hover: Option<usize>,
    pointer: Option<(u16, u16)>,
    drag: Option<Drag>,
    should_quit: bool,
    dirty: bool,
}

impl App {
    fn init(settings: SettingsStore, paths: Paths, save_on_exit: bool) -> anyhow::Result<Self> {
        let seed = settings.current.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let scene = Scene::new(&default_planets(), &mut rng);
        info!(
            seed,
            fps = settings.current.clamped_fps(),
            glyphs = settings.current.glyphs.label(),
            bloom = settings.current.bloom,
            "starting"
        );

        let term = Terminal::begin()?;
        let layout = Layout::new(term.cols, term.rows, settings.current.show_panel, scene.planets.len());
        let mut app = Self {
            settings,
            paths,
            save_on_exit,
            scene,
            controls: OrbitControls::new(Camera::new(START_POSITION)),
            term,
            frame: Frame::new(0, 0),
            layout,
            paused: false,
            selected: 0,
            hover: None,
            pointer: None,
            drag: None,
            should_quit: false,
            dirty: true,
        };
        app.relayout();
        Ok(app)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.current.clamped_fps() as f32);
        let mut clock = SimClock::new(TICKS_PER_SEC);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();
            if self.term.resize_if_needed()? {
                self.relayout();
            }

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in &events {
                if let Some(action) = map_event(ev) {
                    self.apply(action)?;
                }
                if self.should_quit {
                    break;
                }
            }
            self.dirty |= !events.is_empty();

            // sim fixed-step
            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            for _ in 0..clock.advance(real_dt, self.paused) {
                self.scene.tick();
            }
            self.dirty |= !self.paused;

            // camera
            if !self.controls.is_settled() {
                self.dirty = true;
            }
            self.controls.update();

            if self.dirty {
                self.update_hover();
                self.render_frame()?;
                self.dirty = false;
            }

            // frame cap
            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    /// Re-derives the panel layout and pixel canvas from the terminal size.
    fn relayout(&mut self) {
        self.layout = Layout::new(
            self.term.cols,
            self.term.rows,
            self.settings.current.show_panel,
            self.scene.planets.len(),
        );
        let (sx, sy) = self.settings.current.glyphs.subpixels();
        let w = self.layout.view_w as u32 * sx;
        let h = self.layout.rows as u32 * sy;
        if self.frame.w != w || self.frame.h != h {
            self.frame = Frame::new(w, h);
        }
        self.controls.camera.set_aspect(w, h);
        self.dirty = true;
    }

    fn apply(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePause => self.toggle_pause(),
            Action::TogglePanel => {
                self.settings.toggle_panel();
                self.relayout();
            }
            Action::ToggleBloom => {
                let bloom = self.settings.toggle_bloom();
                debug!(bloom, "bloom toggled");
            }
            Action::ToggleGlyphs => {
                let glyphs = self.settings.toggle_glyphs();
                debug!(glyphs = glyphs.label(), "glyph mode changed");
                self.relayout();
            }
            Action::ResetCamera => self.controls.reset(),
            Action::ResetSpeeds => {
                self.scene.reset_speeds();
                debug!("speeds reset");
            }
            Action::Select(i) => {
                if i < self.scene.planets.len() {
                    self.selected = i;
                }
            }
            Action::SelectStep(d) => {
                let n = self.scene.planets.len().max(1) as i32;
                self.selected = (self.selected as i32 + d).rem_euclid(n) as usize;
            }
            Action::Nudge(steps) => {
                if let Some(v) = self.scene.nudge_speed(self.selected, steps) {
                    debug!(planet = self.scene.planets[self.selected].name(), speed = v, "speed changed");
                }
            }
            Action::Orbit(dx, dy) => self.controls.rotate(dx, dy, self.frame.h),
            Action::Pan(dx, dy) => self.controls.pan(dx, dy, self.frame.h),
            Action::Zoom(n) => self.controls.dolly(n),
            Action::Hover(col, row) => self.track_pointer(col, row),
            Action::Press { col, row, button } => {
                self.track_pointer(col, row);
                self.press(col, row, button);
            }
            Action::Drag { col, row } => {
                self.track_pointer(col, row);
                self.drag_to(col, row);
            }
            Action::Release => self.drag = None,
            Action::Resize(c, r) => {
                if self.term.resize(c, r)? {
                    info!(cols = c, rows = r, "terminal resized");
                    self.relayout();
                }
            }
        }
        Ok(())
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!(paused = self.paused, "pause toggled");
    }

    fn track_pointer(&mut self, col: u16, row: u16) {
        self.pointer = Some((col, row));
        self.scene
            .stars
            .track_pointer(col as f32 * CELL_PX_W, row as f32 * CELL_PX_H);
    }

    fn press(&mut self, col: u16, row: u16, button: DragButton) {
        match press_at(&mut self.scene, &self.layout, &mut self.selected, (col, row), button) {
            PressOutcome::Drag(d) => self.drag = Some(d),
            PressOutcome::TogglePause => self.toggle_pause(),
            PressOutcome::Nothing => {}
        }
    }

    fn drag_to(&mut self, col: u16, row: u16) {
        match self.drag {
            Some(Drag::Camera { button, last }) => {
                let (sx, sy) = self.settings.current.glyphs.subpixels();
                let dx = (col as f32 - last.0 as f32) * sx as f32;
                let dy = (row as f32 - last.1 as f32) * sy as f32;
                match button {
                    DragButton::Rotate => self.controls.rotate(dx, dy, self.frame.h),
                    DragButton::Pan => self.controls.pan(dx, dy, self.frame.h),
                }
                self.drag = Some(Drag::Camera { button, last: (col, row) });
            }
            Some(Drag::Slider(index)) => {
                drag_slider(&mut self.scene, &self.layout, index, col);
            }
            None => {}
        }
    }

    fn update_hover(&mut self) {
        let view = self.controls.camera.view();
        self.hover = self.pointer.and_then(|(col, row)| {
            if self.layout.hit(col, row) != UiHit::Viewport {
                return None;
            }
            Raycaster::from_cell(col, row, self.layout.view_w, self.layout.rows, &view)?
                .pick_planet(&self.scene, &view)
        });
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.term.cur.clear(Color::Black);

        let view = self.controls.camera.view();
        render_scene(&mut self.frame, &self.scene, &view);
        if self.settings.current.bloom {
            bloom::apply(&mut self.frame, &self.settings.current.bloom_params());
        }
        frame_to_cells(&self.frame, &mut self.term.cur, 0, 0, self.settings.current.glyphs);

        let date = self.scene.sim_date().format("%Y-%m-%d").to_string();
        let st = UiState {
            paused: self.paused,
            selected: self.selected,
            hover: self.hover,
            glyphs: self.settings.current.glyphs,
            bloom: self.settings.current.bloom,
            date: &date,
        };
        draw_panel(&mut self.term.cur, &self.layout, &self.scene, &st);

        if let (Some(i), Some((mx, my))) = (self.hover, self.pointer) {
            let planet = &self.scene.planets[i];
            draw_tooltip(
                &mut self.term.cur,
                &self.layout,
                mx,
                my,
                planet.name(),
                planet.spec.color.to_color(),
            );
        }

        self.term.present()
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        let ended = self.term.end();
        let save = if self.save_on_exit {
            Some((self.paths.settings_path.as_path(), self.settings.to_save()))
        } else {
            None
        };
        finish(ended, save)
    }
}

/// Writes settings back after terminal teardown, whether or not teardown
/// succeeded. A save failure wins over a teardown failure.
fn finish(ended: anyhow::Result<()>, save: Option<(&Path, &Settings)>) -> anyhow::Result<()> {
    if let Err(e) = &ended {
        warn!(error = %e, "terminal teardown failed");
    }
    if let Some((path, settings)) = save {
        if let Err(e) = save_settings_atomic(path, settings) {
            warn!(path = %path.display(), error = %e, "saving settings failed");
            return Err(e);
        }
    }
    info!("shutdown");
    ended
}

pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = project_paths()?;
    let (file_settings, load_err) = load_settings(&paths.settings_path);
    let settings = SettingsStore::new(file_settings, &cli);
    logging::init(settings.current.log_file.as_deref())?;
    if let Some(e) = load_err {
        warn!(path = %paths.settings_path.display(), error = %e, "ignoring corrupt settings file");
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        term::restore();
        default_hook(info);
    }));

    let mut app = App::init(settings, paths, !cli.no_save)?;
    let result = app.run();
    if let Err(e) = &result {
        warn!(error = %e, "frame loop failed");
    }
    let ended = app.shutdown();
    result?;
    ended
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SPEED_MAX, SPEED_MIN};

    fn scene() -> Scene {
        let mut rng = StdRng::seed_from_u64(11);
        Scene::new(&default_planets(), &mut rng)
    }

    #[test]
    fn paused_clock_yields_no_ticks() {
        let mut clock = SimClock::new(TICKS_PER_SEC);
        assert_eq!(clock.advance(Duration::from_millis(100), true), 0);
        // time spent paused is not replayed on resume
        assert_eq!(clock.advance(Duration::ZERO, false), 0);
    }

    #[test]
    fn stall_is_capped_at_catch_up_window() {
        let mut clock = SimClock::new(TICKS_PER_SEC);
        assert_eq!(clock.advance(Duration::from_millis(250), false), 15);
        let mut clock = SimClock::new(TICKS_PER_SEC);
        assert_eq!(clock.advance(Duration::from_secs(5), false), 15);
    }

    #[test]
    fn fractional_step_carries_over() {
        let mut clock = SimClock::new(TICKS_PER_SEC);
        assert_eq!(clock.advance(Duration::from_millis(25), false), 1);
        assert_eq!(clock.advance(Duration::from_millis(10), false), 1);
        assert_eq!(clock.advance(Duration::from_millis(5), false), 0);
    }

    #[test]
    fn slider_press_and_drag_set_orbital_speed() {
        let mut s = scene();
        let layout = Layout::new(120, 40, true, s.planets.len());
        let p = layout.panel.unwrap();
        let mut selected = 0;

        let row = p.slider_y0 + 4;
        let out = press_at(&mut s, &layout, &mut selected, (p.track_x + p.track_w - 1, row), DragButton::Rotate);
        assert_eq!(out, PressOutcome::Drag(Drag::Slider(4)));
        assert_eq!(selected, 4);
        assert!((s.planets[4].speed - SPEED_MAX).abs() < 1e-6);

        // dragging off the left end of the track clamps to the minimum
        assert_eq!(drag_slider(&mut s, &layout, 4, 0), Some(SPEED_MIN));
        assert_eq!(s.planets[4].speed, SPEED_MIN);
        assert!((s.planets[3].speed - s.planets[3].spec.speed).abs() < 1e-9);
    }

    #[test]
    fn settings_are_saved_even_if_teardown_fails() {
        let dir = std::env::temp_dir().join(format!("solarscope-finish-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        let _ = std::fs::remove_file(&path);

        let s = Settings { show_panel: false, ..Settings::default() };
        let res = finish(Err(anyhow::anyhow!("tty gone")), Some((&path, &s)));
        assert!(res.is_err());
        assert_eq!(crate::config::load_settings(&path).0, s);

        let missing = dir.join("no-such-dir").join("settings.json");
        assert!(finish(Ok(()), Some((&missing, &s))).is_err());
        assert!(finish(Ok(()), None).is_ok());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn press_routes_viewport_and_pause_button() {
        let mut s = scene();
        let layout = Layout::new(120, 40, true, s.planets.len());
        let p = layout.panel.unwrap();
        let mut selected = 2;

        let out = press_at(&mut s, &layout, &mut selected, (5, 5), DragButton::Pan);
        assert_eq!(out, PressOutcome::Drag(Drag::Camera { button: DragButton::Pan, last: (5, 5) }));
        let out = press_at(&mut s, &layout, &mut selected, (p.button_x, p.button_y), DragButton::Rotate);
        assert_eq!(out, PressOutcome::TogglePause);
        assert_eq!(selected, 2);
    }
}
