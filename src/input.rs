use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Keyboard orbit step, in canvas pixels of equivalent drag.
pub(crate) const KEY_ORBIT_PX: f32 = 6.0;
pub(crate) const KEY_PAN_PX: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    TogglePanel,
    ToggleBloom,
    ToggleGlyphs,
    ResetCamera,
    ResetSpeeds,
    Select(usize),
    SelectStep(i32),
    Nudge(i32),
    Orbit(f32, f32),
    Pan(f32, f32),
    Zoom(i32),
    /// Pointer moved to a cell, no buttons held.
    Hover(u16, u16),
    Press { col: u16, row: u16, button: DragButton },
    Drag { col: u16, row: u16 },
    Release,
    Resize(u16, u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DragButton {
    Rotate,
    Pan,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        out.push(event::read()?);
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: &Event) -> Option<Action> {
    match ev {
        Event::Key(k) => map_key(k),
        Event::Mouse(m) => map_mouse(m),
        Event::Resize(c, r) => Some(Action::Resize(*c, *r)),
        _ => None,
    }
}

fn map_key(k: &KeyEvent) -> Option<Action> {
    if !(k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat) {
        return None;
    }
    let shift = k.modifiers.contains(KeyModifiers::SHIFT);
    let step = if shift { 10 } else { 1 };

    if k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(Action::Quit);
    }

    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::TogglePause),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::TogglePanel),
        KeyCode::Char('b') | KeyCode::Char('B') => Some(Action::ToggleBloom),
        KeyCode::Char('g') | KeyCode::Char('G') => Some(Action::ToggleGlyphs),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::ResetCamera),
        KeyCode::Char('0') => Some(Action::ResetSpeeds),
        KeyCode::Char(d @ '1'..='9') => Some(Action::Select(d as usize - '1' as usize)),

        KeyCode::Up => Some(Action::SelectStep(-1)),
        KeyCode::Down | KeyCode::Tab => Some(Action::SelectStep(1)),
        KeyCode::BackTab => Some(Action::SelectStep(-1)),
        KeyCode::Left => Some(Action::Nudge(-step)),
        KeyCode::Right => Some(Action::Nudge(step)),
        KeyCode::Char('[') => Some(Action::Nudge(-1)),
        KeyCode::Char(']') => Some(Action::Nudge(1)),

        KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::Orbit(-KEY_ORBIT_PX, 0.0)),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::Orbit(KEY_ORBIT_PX, 0.0)),
        KeyCode::Char('w') | KeyCode::Char('W') => Some(Action::Orbit(0.0, -KEY_ORBIT_PX)),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::Orbit(0.0, KEY_ORBIT_PX)),
        KeyCode::Char('i') | KeyCode::Char('I') => Some(Action::Pan(0.0, KEY_PAN_PX)),
        KeyCode::Char('k') | KeyCode::Char('K') => Some(Action::Pan(0.0, -KEY_PAN_PX)),
        KeyCode::Char('j') | KeyCode::Char('J') => Some(Action::Pan(KEY_PAN_PX, 0.0)),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::Pan(-KEY_PAN_PX, 0.0)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Zoom(1)),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::Zoom(-1)),
        _ => None,
    }
}

fn map_mouse(m: &MouseEvent) -> Option<Action> {
    let (col, row) = (m.column, m.row);
    match m.kind {
        MouseEventKind::Moved => Some(Action::Hover(col, row)),
        MouseEventKind::Down(MouseButton::Left) => {
            let button = if m.modifiers.contains(KeyModifiers::SHIFT) { DragButton::Pan } else { DragButton::Rotate };
            Some(Action::Press { col, row, button })
        }
        MouseEventKind::Down(MouseButton::Right) | MouseEventKind::Down(MouseButton::Middle) => {
            Some(Action::Press { col, row, button: DragButton::Pan })
        }
        MouseEventKind::Drag(_) => Some(Action::Drag { col, row }),
        MouseEventKind::Up(_) => Some(Action::Release),
        MouseEventKind::ScrollUp => Some(Action::Zoom(1)),
        MouseEventKind::ScrollDown => Some(Action::Zoom(-1)),
        _ => None,
    }
}
