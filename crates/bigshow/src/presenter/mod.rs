//! The presenter view: a second window mirroring the talk with current and
//! next previews, timers and speaker notes.
//!
//! The primary window talks to the session only through [`PresenterChannel::refresh`];
//! the presenter window talks back only through [`PresenterCommand`]s.

pub mod timers;
pub mod view;

use std::cell::Cell;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::appearance::Appearance;
use crate::error::PresenterError;
use timers::{TICK_PERIOD, Ticker};

pub const NO_NOTES: &str = "No speaker notes for this slide";
pub const END_OF_PRESENTATION: &str = "End of presentation";

/// How notes that do not fit the notes panel are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotesDisplay {
    /// Shrink the text until it fits.
    #[default]
    Fit,
    Scroll,
}

impl NotesDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotesDisplay::Fit => "fit",
            NotesDisplay::Scroll => "scroll",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            NotesDisplay::Fit => NotesDisplay::Scroll,
            NotesDisplay::Scroll => NotesDisplay::Fit,
        }
    }
}

impl FromStr for NotesDisplay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fit" => Ok(NotesDisplay::Fit),
            "scroll" => Ok(NotesDisplay::Scroll),
            _ => Err(format!("invalid notes display: {s}. Must be 'fit' or 'scroll'.")),
        }
    }
}

/// Requests from the presenter window to the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterCommand {
    Forward,
    Reverse,
    Close,
    ToggleNotes,
}

/// Liveness of a native window. The window marks itself closed; the
/// session notices on its next tick.
#[derive(Debug, Clone, Default)]
pub struct WindowHandle {
    closed: Rc<Cell<bool>>,
}

impl WindowHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.set(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Creates and focuses native windows.
pub trait WindowSystem {
    fn open(&mut self) -> Result<WindowHandle, PresenterError>;
    fn focus(&mut self, window: &WindowHandle);
}

/// Everything the presenter shows, as of the last refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresenterView {
    pub current: Option<usize>,
    pub next: Option<usize>,
    pub total: usize,
    pub notes: Vec<String>,
    /// The primary window's page appearance; previews use it.
    pub appearance: Appearance,
    /// The primary window's talk box; previews are fitted to it.
    pub talk_box: (f32, f32),
}

impl PresenterView {
    pub fn slide_label(&self) -> String {
        match self.current {
            Some(i) => format!("Slide {} / {}", i + 1, self.total),
            None => format!("Slide - / {}", self.total),
        }
    }

    /// Notes as plain text paragraphs, or the fallback line.
    pub fn notes_text(&self) -> String {
        if self.notes.is_empty() {
            NO_NOTES.to_string()
        } else {
            self.notes.join("\n\n")
        }
    }
}

/// Notes font size, recomputed one frame after a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NotesFit {
    pub font_size: Option<f32>,
    settle: Option<u8>,
    panel: Option<(f32, f32)>,
}

impl NotesFit {
    const SETTLE_FRAMES: u8 = 1;

    fn invalidate(&mut self) {
        self.settle = Some(Self::SETTLE_FRAMES);
    }

    /// Called once per presenter frame. True when the fit should be
    /// recomputed now.
    pub fn frame(&mut self) -> bool {
        match self.settle {
            Some(0) => {
                self.settle = None;
                true
            }
            Some(n) => {
                self.settle = Some(n - 1);
                false
            }
            None => false,
        }
    }

    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Advance one frame for a notes panel of `panel` size. True when the
    /// size has to be searched again.
    pub fn needs_fit(&mut self, panel: (f32, f32)) -> bool {
        let settled = self.frame();
        let resized = self.panel != Some(panel);
        self.panel = Some(panel);
        settled || resized || self.font_size.is_none()
    }
}

#[derive(Debug)]
pub struct PresenterSession {
    pub window: WindowHandle,
    pub started: Instant,
    ticker: Ticker,
    pub elapsed: String,
    pub clock: String,
    pub notes_fit: NotesFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    Focused,
}

pub struct PresenterChannel {
    session: Option<PresenterSession>,
    notes_display: NotesDisplay,
    view: PresenterView,
    commands: Sender<PresenterCommand>,
    inbox: Receiver<PresenterCommand>,
}

impl PresenterChannel {
    pub fn new(notes_display: NotesDisplay) -> Self {
        let (commands, inbox) = mpsc::channel();
        Self {
            session: None,
            notes_display,
            view: PresenterView::default(),
            commands,
            inbox,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&PresenterSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut PresenterSession> {
        self.session.as_mut()
    }

    pub fn view(&self) -> &PresenterView {
        &self.view
    }

    pub fn notes_display(&self) -> NotesDisplay {
        self.notes_display
    }

    pub fn toggle_notes_display(&mut self) {
        self.notes_display = self.notes_display.toggled();
        if let Some(session) = &mut self.session {
            session.notes_fit.invalidate();
        }
    }

    /// Open the presenter window, or focus it if one is already live.
    /// A denied window leaves everything as it was.
    pub fn open(
        &mut self,
        windows: &mut dyn WindowSystem,
        now: Instant,
        view: PresenterView,
    ) -> Result<OpenOutcome, PresenterError> {
        if let Some(session) = &self.session {
            if !session.window.is_closed() {
                windows.focus(&session.window);
                return Ok(OpenOutcome::Focused);
            }
        }

        let window = windows.open()?;
        log::info!("presenter view opened");
        self.session = Some(PresenterSession {
            window,
            started: now,
            ticker: Ticker::starting_at(now, TICK_PERIOD),
            elapsed: timers::elapsed_label(std::time::Duration::ZERO),
            clock: timers::clock_label(chrono::Local::now()),
            notes_fit: NotesFit::default(),
        });
        self.refresh(view);
        Ok(OpenOutcome::Opened)
    }

    /// Periodic poll: tear a closed session down, otherwise update timers.
    pub fn tick(&mut self, now: Instant) {
        let Some(session) = &mut self.session else {
            return;
        };
        if !session.ticker.due(now) {
            return;
        }
        if session.window.is_closed() {
            log::debug!("presenter window closed; ending session");
            self.session = None;
            return;
        }
        session.elapsed = timers::elapsed_label(now.saturating_duration_since(session.started));
        session.clock = timers::clock_label(chrono::Local::now());
    }

    /// Ask the window to go away. The session itself ends on the next tick.
    pub fn request_close(&mut self) {
        if let Some(session) = &self.session {
            session.window.close();
        }
    }

    /// Re-render the presenter content. No-op without a live session.
    pub fn refresh(&mut self, view: PresenterView) {
        let Some(session) = &mut self.session else {
            return;
        };
        session.notes_fit.invalidate();
        self.view = view;
    }

    /// The next instant the channel needs a frame for.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().map(|s| s.ticker.deadline())
    }

    pub fn sender(&self) -> Sender<PresenterCommand> {
        self.commands.clone()
    }

    /// Commands the presenter window sent since the last call.
    pub fn drain(&self) -> Vec<PresenterCommand> {
        self.inbox.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeWindows {
        deny: bool,
        opened: Vec<WindowHandle>,
        focused: usize,
    }

    impl WindowSystem for FakeWindows {
        fn open(&mut self) -> Result<WindowHandle, PresenterError> {
            if self.deny {
                return Err(PresenterError::WindowDenied);
            }
            let handle = WindowHandle::new();
            self.opened.push(handle.clone());
            Ok(handle)
        }

        fn focus(&mut self, _window: &WindowHandle) {
            self.focused += 1;
        }
    }

    fn view(current: usize) -> PresenterView {
        PresenterView {
            current: Some(current),
            next: Some(current + 1),
            total: 3,
            notes: vec!["remember".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_second_open_only_focuses() {
        let now = Instant::now();
        let mut windows = FakeWindows::default();
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        assert_eq!(channel.open(&mut windows, now, view(0)), Ok(OpenOutcome::Opened));
        assert_eq!(channel.open(&mut windows, now, view(0)), Ok(OpenOutcome::Focused));
        assert_eq!(windows.opened.len(), 1);
        assert_eq!(windows.focused, 1);
    }

    #[test]
    fn test_denied_window_changes_nothing() {
        let now = Instant::now();
        let mut windows = FakeWindows {
            deny: true,
            ..Default::default()
        };
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        assert_eq!(
            channel.open(&mut windows, now, view(0)),
            Err(PresenterError::WindowDenied)
        );
        assert!(!channel.is_open());
        assert_eq!(channel.view(), &PresenterView::default());
    }

    #[test]
    fn test_close_is_detected_by_tick() {
        let t0 = Instant::now();
        let mut windows = FakeWindows::default();
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        channel.open(&mut windows, t0, view(0)).unwrap();

        windows.opened[0].close();
        assert!(channel.is_open());
        channel.tick(t0 + Duration::from_millis(500));
        assert!(channel.is_open());
        channel.tick(t0 + Duration::from_secs(1));
        assert!(!channel.is_open());
        assert_eq!(channel.next_deadline(), None);
    }

    #[test]
    fn test_open_close_open_keeps_one_session() {
        let t0 = Instant::now();
        let mut windows = FakeWindows::default();
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        channel.open(&mut windows, t0, view(0)).unwrap();
        windows.opened[0].close();

        let t1 = t0 + Duration::from_millis(300);
        assert_eq!(channel.open(&mut windows, t1, view(1)), Ok(OpenOutcome::Opened));
        assert_eq!(windows.opened.len(), 2);
        assert_eq!(channel.session().map(|s| s.started), Some(t1));
        assert!(!channel.session().unwrap().window.is_closed());

        channel.tick(t1 + Duration::from_secs(1));
        assert!(channel.is_open());
    }

    #[test]
    fn test_requested_close_ends_on_tick() {
        let t0 = Instant::now();
        let mut windows = FakeWindows::default();
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        channel.open(&mut windows, t0, view(0)).unwrap();
        channel.request_close();
        assert!(windows.opened[0].is_closed());
        channel.tick(t0 + Duration::from_secs(1));
        assert!(!channel.is_open());
    }

    #[test]
    fn test_tick_updates_elapsed() {
        let t0 = Instant::now();
        let mut windows = FakeWindows::default();
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        channel.open(&mut windows, t0, view(0)).unwrap();
        channel.tick(t0 + Duration::from_secs(75));
        assert_eq!(channel.session().unwrap().elapsed, "01:15");
        assert_eq!(channel.session().unwrap().clock.len(), 5);
    }

    #[test]
    fn test_refresh_without_session_is_noop() {
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        channel.refresh(view(2));
        assert_eq!(channel.view(), &PresenterView::default());
    }

    #[test]
    fn test_refresh_settles_notes_fit_after_one_frame() {
        let t0 = Instant::now();
        let mut windows = FakeWindows::default();
        let mut channel = PresenterChannel::new(NotesDisplay::Fit);
        channel.open(&mut windows, t0, view(0)).unwrap();
        channel.refresh(view(1));
        assert_eq!(channel.view().current, Some(1));

        let fit = &mut channel.session.as_mut().unwrap().notes_fit;
        assert!(fit.is_settling());
        assert!(!fit.frame());
        assert!(fit.frame());
        assert!(!fit.is_settling());
        assert!(!fit.frame());
    }

    #[test]
    fn test_notes_fit_recomputes_on_resize() {
        let mut fit = NotesFit::default();
        assert!(fit.needs_fit((400.0, 200.0)));
        fit.font_size = Some(18.0);
        assert!(!fit.needs_fit((400.0, 200.0)));
        assert!(fit.needs_fit((400.0, 240.0)));
        fit.invalidate();
        assert!(!fit.needs_fit((400.0, 240.0)));
        assert!(fit.needs_fit((400.0, 240.0)));
    }

    #[test]
    fn test_labels() {
        let mut v = view(0);
        assert_eq!(v.slide_label(), "Slide 1 / 3");
        assert_eq!(v.notes_text(), "remember");
        v.notes.clear();
        assert_eq!(v.notes_text(), NO_NOTES);
    }

    #[test]
    fn test_commands_flow_through_channel() {
        let mut channel = PresenterChannel::new(NotesDisplay::Scroll);
        let sender = channel.sender();
        sender.send(PresenterCommand::Forward).unwrap();
        sender.send(PresenterCommand::ToggleNotes).unwrap();
        assert_eq!(
            channel.drain(),
            vec![PresenterCommand::Forward, PresenterCommand::ToggleNotes]
        );
        assert!(channel.drain().is_empty());
        channel.toggle_notes_display();
        assert_eq!(channel.notes_display(), NotesDisplay::Fit);
    }

    #[test]
    fn test_notes_display_from_str() {
        assert_eq!("scroll".parse::<NotesDisplay>(), Ok(NotesDisplay::Scroll));
        assert!("shrink".parse::<NotesDisplay>().is_err());
    }
}
