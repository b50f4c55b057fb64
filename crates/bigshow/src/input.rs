//! Translates raw input into presentation actions.
//!
//! Routing is pure: egui events are first reduced to [`InputEvent`]s, then
//! [`InputRouter::route`] decides what they mean in the current mode.

use eframe::egui;

use crate::presentation::Mode;

/// Minimum horizontal travel for a touch to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Space,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// A primary click on the stage, possibly on a hyperlink.
    Click { on_link: bool },
    TouchStart { x: f32 },
    TouchEnd { x: f32 },
    /// The position token was changed outside the application.
    LocationChanged(Option<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    Reverse,
    /// Forward, wrapping to the first slide after the last.
    ForwardWrapping,
    Print,
    Talk,
    Jump,
    OpenPresenter,
    Locate(usize),
    ToggleFullscreen,
    Quit,
    ClosePresenter,
    ToggleNotes,
}

/// Holds the in-progress touch, if any.
#[derive(Debug, Default)]
pub struct InputRouter {
    touch_start: Option<f32>,
    /// Set when a touch ended in a swipe this frame. The click egui
    /// synthesises from the same touch is dropped.
    swiped: bool,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input to the primary window.
    pub fn route(&mut self, mode: Mode, event: InputEvent) -> Option<Action> {
        let talking = mode == Mode::Talk;
        match event {
            InputEvent::Key(key) => match key {
                Key::Left | Key::Up | Key::PageUp if talking => Some(Action::Reverse),
                Key::Right | Key::Down | Key::PageDown if talking => Some(Action::Forward),
                Key::Char(c) => command_key(c),
                _ => None,
            },
            InputEvent::Click { on_link } => {
                if std::mem::take(&mut self.swiped) {
                    return None;
                }
                (talking && !on_link).then_some(Action::ForwardWrapping)
            }
            InputEvent::TouchStart { x } => {
                self.swiped = false;
                if talking {
                    self.touch_start = Some(x);
                }
                None
            }
            InputEvent::TouchEnd { x } => {
                let start = self.touch_start.take()?;
                let distance = x - start;
                if distance.abs() < SWIPE_THRESHOLD {
                    return None;
                }
                self.swiped = true;
                if distance < 0.0 {
                    Some(Action::Forward)
                } else {
                    Some(Action::Reverse)
                }
            }
            InputEvent::LocationChanged(token) => token.map(Action::Locate),
        }
    }

    /// Forget per-frame gesture state. Called once all of a frame's events,
    /// stage clicks included, have been routed.
    pub fn end_frame(&mut self) {
        self.swiped = false;
    }

    /// Input to the presenter window. Navigation works regardless of mode.
    pub fn route_presenter(&self, event: InputEvent) -> Option<Action> {
        match event {
            InputEvent::Key(Key::Left | Key::Up | Key::PageUp) => Some(Action::Reverse),
            InputEvent::Key(Key::Right | Key::Down | Key::PageDown | Key::Space) => {
                Some(Action::Forward)
            }
            InputEvent::Key(Key::Escape) => Some(Action::ClosePresenter),
            InputEvent::Key(Key::Char('n')) => Some(Action::ToggleNotes),
            InputEvent::Click { on_link: false } => Some(Action::Forward),
            _ => None,
        }
    }
}

fn command_key(c: char) -> Option<Action> {
    match c {
        'p' => Some(Action::Print),
        't' => Some(Action::Talk),
        'j' => Some(Action::Jump),
        'r' => Some(Action::OpenPresenter),
        'f' => Some(Action::ToggleFullscreen),
        'q' => Some(Action::Quit),
        _ => None,
    }
}

/// Reduce this frame's egui events to router events. Pointer clicks are
/// reported separately by the widgets that own the hit areas.
pub fn collect(input: &egui::InputState) -> Vec<InputEvent> {
    let mut events = Vec::new();
    for event in &input.events {
        match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } if !modifiers.ctrl && !modifiers.command && !modifiers.alt => {
                if let Some(key) = translate_key(*key) {
                    events.push(InputEvent::Key(key));
                }
            }
            egui::Event::Touch { phase, pos, .. } => match phase {
                egui::TouchPhase::Start => events.push(InputEvent::TouchStart { x: pos.x }),
                egui::TouchPhase::End => events.push(InputEvent::TouchEnd { x: pos.x }),
                _ => {}
            },
            _ => {}
        }
    }
    events
}

fn translate_key(key: egui::Key) -> Option<Key> {
    let key = match key {
        egui::Key::ArrowLeft => Key::Left,
        egui::Key::ArrowRight => Key::Right,
        egui::Key::ArrowUp => Key::Up,
        egui::Key::ArrowDown => Key::Down,
        egui::Key::PageUp => Key::PageUp,
        egui::Key::PageDown => Key::PageDown,
        egui::Key::Space => Key::Space,
        egui::Key::Escape => Key::Escape,
        egui::Key::N => Key::Char('n'),
        egui::Key::P => Key::Char('p'),
        egui::Key::T => Key::Char('t'),
        egui::Key::J => Key::Char('j'),
        egui::Key::R => Key::Char('r'),
        egui::Key::F => Key::Char('f'),
        egui::Key::Q => Key::Char('q'),
        _ => return None,
    };
    Some(key)
}
