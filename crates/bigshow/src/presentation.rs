use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::appearance::Appearance;
use crate::parser::Deck;

/// Print pages and jump thumbnails are fitted at fixed sizes.
pub const PRINT_BOX: (f32, f32) = (512.0, 320.0);
pub const JUMP_BOX: (f32, f32) = (192.0, 120.0);

pub const DEFAULT_ASPECT_RATIO: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Talk,
    Print,
    Jump,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Talk => "talk",
            Mode::Print => "print",
            Mode::Jump => "jump",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "talk" => Ok(Mode::Talk),
            "print" => Ok(Mode::Print),
            "jump" => Ok(Mode::Jump),
            _ => Err(format!("invalid mode: {s}. Must be 'talk', 'print', or 'jump'.")),
        }
    }
}

/// Width to height ratio the talk-mode slide box is held to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AspectRatio {
    Fixed(f32),
    Free,
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Fixed(DEFAULT_ASPECT_RATIO)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "false" | "none" | "off" => Ok(AspectRatio::Free),
            other => match other.parse::<f32>() {
                Ok(ratio) if ratio.is_finite() && ratio > 0.0 => Ok(AspectRatio::Fixed(ratio)),
                _ => Err(format!(
                    "invalid aspect ratio: {s}. Must be a positive number or 'false'."
                )),
            },
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Fixed(ratio) => write!(f, "{ratio}"),
            AspectRatio::Free => f.write_str("false"),
        }
    }
}

impl AspectRatio {
    /// Shrink a viewport to the ratio, rounding the reduced side up.
    pub fn apply(&self, width: f32, height: f32) -> (f32, f32) {
        match *self {
            AspectRatio::Free => (width, height),
            AspectRatio::Fixed(_) if width <= 0.0 || height <= 0.0 => (width, height),
            AspectRatio::Fixed(ratio) => {
                if width / height > ratio {
                    ((height * ratio).ceil(), height)
                } else {
                    (width, (width / ratio).ceil())
                }
            }
        }
    }
}

/// A slide placed on the stage at a target size with its resolved page
/// appearance. The renderer fits and draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub slide: usize,
    pub width: f32,
    pub height: f32,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintPage {
    pub placement: Placement,
    /// Shown under the page; empty when the slide has no notes.
    pub notes: Vec<String>,
}

/// What is visible, and how.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Talk(Option<Placement>),
    Print(Vec<PrintPage>),
    Jump(Vec<Placement>),
}

/// Side effects of a transition for the application to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write the position token.
    Location(usize),
    /// Set the primary window title.
    Title(String),
    /// Re-render the presenter view if one is open.
    RefreshPresenter,
}

/// The single pending auto-advance deadline.
#[derive(Debug, Default)]
pub struct AutoAdvance {
    deadline: Option<Instant>,
}

impl AutoAdvance {
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn arm(&mut self, at: Instant) {
        self.deadline = Some(at);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clear and report the deadline if it has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Mode state machine: owns the mode, the current index and the stage.
#[derive(Debug)]
pub struct Presentation {
    deck: Arc<Deck>,
    mode: Mode,
    current: Option<usize>,
    baseline: Appearance,
    appearance: Appearance,
    stage: Stage,
    viewport: (f32, f32),
    aspect: AspectRatio,
    auto_advance: AutoAdvance,
    token: Option<usize>,
}

impl Presentation {
    pub fn new(deck: Arc<Deck>, baseline: Appearance, aspect: AspectRatio) -> Self {
        Self {
            deck,
            mode: Mode::Talk,
            current: None,
            appearance: baseline.clone(),
            baseline,
            stage: Stage::Talk(None),
            viewport: (0.0, 0.0),
            aspect,
            auto_advance: AutoAdvance::default(),
            token: None,
        }
    }

    pub fn deck(&self) -> &Arc<Deck> {
        &self.deck
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The page-wide appearance currently applied to the window.
    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn baseline(&self) -> &Appearance {
        &self.baseline
    }

    pub fn auto_advance_deadline(&self) -> Option<Instant> {
        self.auto_advance.deadline()
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// The talk-mode slide box for the current viewport.
    pub fn talk_box(&self) -> (f32, f32) {
        self.aspect.apply(self.viewport.0, self.viewport.1)
    }

    /// Record the primary window size and re-target the talk slide.
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.viewport == (width, height) {
            return;
        }
        self.viewport = (width, height);
        let (w, h) = self.talk_box();
        if let Stage::Talk(Some(placement)) = &mut self.stage {
            placement.width = w;
            placement.height = h;
        }
    }

    /// Navigate to slide `n`, clamped into range. Unless forced, going to the
    /// current slide does nothing.
    pub fn go(&mut self, n: isize, force: bool, now: Instant) -> Vec<Effect> {
        let Some(last) = self.len().checked_sub(1) else {
            return Vec::new();
        };
        let n = n.clamp(0, last as isize) as usize;
        if !force && self.current == Some(n) {
            return Vec::new();
        }
        self.current = Some(n);

        let Some(slide) = self.deck.slide(n) else {
            return Vec::new();
        };
        if !slide.notes.is_empty() {
            log::debug!("notes for slide {}: {:?}", n + 1, slide.notes);
        }

        if self.mode == Mode::Talk {
            let (width, height) = self.talk_box();
            let appearance = self.baseline.with_overrides(slide);
            self.appearance = appearance.clone();
            self.stage = Stage::Talk(Some(Placement {
                slide: n,
                width,
                height,
                appearance,
            }));
        }

        self.auto_advance.cancel();
        if let Some(delay) = slide.auto_advance() {
            self.auto_advance.arm(now + delay);
        }

        let mut effects = Vec::new();
        if self.token != Some(n) {
            self.token = Some(n);
            effects.push(Effect::Location(n));
        }
        effects.push(Effect::Title(slide.text_content()));
        effects.push(Effect::RefreshPresenter);
        effects
    }

    pub fn forward(&mut self, now: Instant) -> Vec<Effect> {
        self.go(self.position() + 1, false, now)
    }

    pub fn reverse(&mut self, now: Instant) -> Vec<Effect> {
        self.go(self.position() - 1, false, now)
    }

    /// Pointer navigation: past the last slide wraps to the first.
    pub fn forward_wrapping(&mut self, now: Instant) -> Vec<Effect> {
        let len = self.len() as isize;
        if len == 0 {
            return Vec::new();
        }
        self.go((self.position() + 1).rem_euclid(len), false, now)
    }

    /// Fire the auto-advance deadline if it is due.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        if self.auto_advance.take_due(now) {
            log::debug!("auto-advancing from slide {:?}", self.current);
            self.forward(now)
        } else {
            Vec::new()
        }
    }

    /// The position token changed outside the application.
    pub fn location_changed(&mut self, token: Option<usize>, now: Instant) -> Vec<Effect> {
        let Some(n) = token else {
            return Vec::new();
        };
        self.token = Some(n);
        if self.mode == Mode::Talk {
            self.go(n as isize, false, now)
        } else {
            Vec::new()
        }
    }

    /// Back to single-slide presenting at `n`.
    pub fn talk(&mut self, n: isize, now: Instant) -> Vec<Effect> {
        if self.mode == Mode::Talk {
            return Vec::new();
        }
        self.mode = Mode::Talk;
        self.stage = Stage::Talk(None);
        self.go(n, true, now)
    }

    /// Leave print or jump at the current slide.
    pub fn resume_talk(&mut self, now: Instant) -> Vec<Effect> {
        self.talk(self.position(), now)
    }

    /// Choose a slide from print pages or jump thumbnails.
    pub fn activate(&mut self, index: usize, now: Instant) -> Vec<Effect> {
        self.talk(index as isize, now)
    }

    /// Lay every slide out as a print page followed by its notes.
    pub fn print(&mut self) -> Vec<Effect> {
        if self.mode == Mode::Print {
            return Vec::new();
        }
        self.mode = Mode::Print;
        self.appearance = self.baseline.clone();
        let (width, height) = PRINT_BOX;
        let pages = self
            .deck
            .slides
            .iter()
            .map(|slide| PrintPage {
                placement: Placement {
                    slide: slide.index,
                    width,
                    height,
                    appearance: self.baseline.with_overrides(slide),
                },
                notes: slide.notes.clone(),
            })
            .collect();
        self.stage = Stage::Print(pages);
        Vec::new()
    }

    /// Show every slide as an activatable thumbnail.
    pub fn jump(&mut self) -> Vec<Effect> {
        if self.mode == Mode::Jump {
            return Vec::new();
        }
        self.mode = Mode::Jump;
        self.appearance = self.baseline.clone();
        let (width, height) = JUMP_BOX;
        let thumbs = self
            .deck
            .slides
            .iter()
            .map(|slide| Placement {
                slide: slide.index,
                width,
                height,
                appearance: self.baseline.with_overrides(slide),
            })
            .collect();
        self.stage = Stage::Jump(thumbs);
        Vec::new()
    }

    /// Swap in a re-read deck, keeping the mode and the position (clamped).
    pub fn replace_deck(&mut self, deck: Arc<Deck>, now: Instant) -> Vec<Effect> {
        self.deck = deck;
        self.auto_advance.cancel();
        self.token = None;
        self.current = match self.len().checked_sub(1) {
            Some(last) => self.current.map(|c| c.min(last)),
            None => None,
        };

        let mode = self.mode;
        self.mode = Mode::Talk;
        self.stage = Stage::Talk(None);
        match mode {
            Mode::Talk => match self.current {
                Some(n) => self.go(n as isize, true, now),
                None => Vec::new(),
            },
            Mode::Print => {
                self.print();
                vec![Effect::RefreshPresenter]
            }
            Mode::Jump => {
                self.jump();
                vec![Effect::RefreshPresenter]
            }
        }
    }

    fn position(&self) -> isize {
        self.current.map_or(-1, |c| c as isize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use std::time::Duration;

    fn deck(content: &str) -> Arc<Deck> {
        Arc::new(parser::build(content))
    }

    fn three() -> Presentation {
        let mut p = Presentation::new(
            deck("# One\n---\nTwo <notes>say two</notes>\n---\nThree"),
            Appearance::new("dark", ""),
            AspectRatio::default(),
        );
        p.resize(1600.0, 1000.0);
        p
    }

    fn talk_slide(p: &Presentation) -> Option<usize> {
        match p.stage() {
            Stage::Talk(placement) => placement.as_ref().map(|pl| pl.slide),
            _ => None,
        }
    }

    #[test]
    fn test_go_clamps() {
        let now = Instant::now();
        let mut p = three();
        p.go(-5, false, now);
        assert_eq!(p.current(), Some(0));
        p.go(10, false, now);
        assert_eq!(p.current(), Some(2));
        assert_eq!(talk_slide(&p), Some(2));
    }

    #[test]
    fn test_go_is_idempotent_unless_forced() {
        let now = Instant::now();
        let mut p = three();
        assert!(!p.go(1, false, now).is_empty());
        assert!(p.go(1, false, now).is_empty());
        let forced = p.go(1, true, now);
        assert!(forced.contains(&Effect::RefreshPresenter));
        assert!(!forced.iter().any(|e| matches!(e, Effect::Location(_))));
    }

    #[test]
    fn test_go_effects() {
        let now = Instant::now();
        let mut p = three();
        let effects = p.go(0, false, now);
        assert_eq!(
            effects,
            vec![
                Effect::Location(0),
                Effect::Title("One".to_string()),
                Effect::RefreshPresenter,
            ]
        );
    }

    #[test]
    fn test_empty_deck_navigation_is_noop() {
        let now = Instant::now();
        let mut p = Presentation::new(deck(""), Appearance::default(), AspectRatio::Free);
        assert!(p.go(0, true, now).is_empty());
        assert!(p.forward(now).is_empty());
        assert!(p.forward_wrapping(now).is_empty());
        assert_eq!(p.current(), None);
    }

    #[test]
    fn test_keyboard_clamps_click_wraps() {
        let now = Instant::now();
        let mut p = three();
        p.go(2, false, now);
        assert!(p.forward(now).is_empty());
        assert_eq!(p.current(), Some(2));
        p.forward_wrapping(now);
        assert_eq!(p.current(), Some(0));
        p.reverse(now);
        assert_eq!(p.current(), Some(0));
    }

    #[test]
    fn test_first_forward_starts_at_zero() {
        let now = Instant::now();
        let mut p = three();
        p.forward(now);
        assert_eq!(p.current(), Some(0));
    }

    #[test]
    fn test_print_round_trip_restores_slide() {
        let now = Instant::now();
        let mut p = three();
        p.go(1, false, now);
        p.print();
        assert_eq!(p.mode(), Mode::Print);
        match p.stage() {
            Stage::Print(pages) => {
                assert_eq!(pages.len(), 3);
                assert_eq!(pages[0].placement.width, 512.0);
                assert!(pages[0].notes.is_empty());
                assert_eq!(pages[1].notes, vec!["say two".to_string()]);
            }
            other => panic!("expected print stage, got {other:?}"),
        }
        p.resume_talk(now);
        assert_eq!(p.mode(), Mode::Talk);
        assert_eq!(p.current(), Some(1));
        assert_eq!(talk_slide(&p), Some(1));
    }

    #[test]
    fn test_jump_round_trip_and_activate() {
        let now = Instant::now();
        let mut p = three();
        p.go(1, false, now);
        p.jump();
        match p.stage() {
            Stage::Jump(thumbs) => {
                assert_eq!(thumbs.len(), 3);
                assert_eq!((thumbs[2].width, thumbs[2].height), JUMP_BOX);
            }
            other => panic!("expected jump stage, got {other:?}"),
        }
        p.resume_talk(now);
        assert_eq!(talk_slide(&p), Some(1));

        p.jump();
        p.activate(2, now);
        assert_eq!(p.mode(), Mode::Talk);
        assert_eq!(p.current(), Some(2));
    }

    #[test]
    fn test_reentering_mode_is_noop() {
        let now = Instant::now();
        let mut p = three();
        p.go(0, false, now);
        assert!(p.talk(2, now).is_empty());
        assert_eq!(p.current(), Some(0));
        p.print();
        let before = p.stage().clone();
        p.print();
        assert_eq!(p.stage(), &before);
    }

    #[test]
    fn test_print_and_jump_reset_appearance() {
        let now = Instant::now();
        let mut p = Presentation::new(
            deck("[.body-class: white]\nA\n---\nB"),
            Appearance::new("dark", ""),
            AspectRatio::default(),
        );
        p.go(0, false, now);
        assert_eq!(p.appearance().classes().next(), Some("white"));
        p.print();
        assert_eq!(p.appearance(), p.baseline());
        match p.stage() {
            Stage::Print(pages) => {
                assert_eq!(pages[0].placement.appearance.classes().next(), Some("white"));
                assert_eq!(&pages[1].placement.appearance, p.baseline());
            }
            other => panic!("expected print stage, got {other:?}"),
        }
    }

    #[test]
    fn test_auto_advance_fires_once() {
        let t0 = Instant::now();
        let mut p = Presentation::new(
            deck("A\n---\n[.time-to-next: 5]\nB\n---\nC"),
            Appearance::default(),
            AspectRatio::default(),
        );
        p.go(0, false, t0);
        assert_eq!(p.auto_advance_deadline(), None);
        p.go(1, false, t0);
        assert_eq!(p.auto_advance_deadline(), Some(t0 + Duration::from_secs(5)));

        assert!(p.tick(t0 + Duration::from_millis(4900)).is_empty());
        assert_eq!(p.current(), Some(1));

        assert!(!p.tick(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(p.current(), Some(2));
        assert_eq!(p.auto_advance_deadline(), None);

        assert!(p.tick(t0 + Duration::from_secs(60)).is_empty());
        assert_eq!(p.current(), Some(2));
    }

    #[test]
    fn test_navigation_cancels_auto_advance() {
        let t0 = Instant::now();
        let mut p = Presentation::new(
            deck("A\n---\n[.time-to-next: 5]\nB\n---\nC"),
            Appearance::default(),
            AspectRatio::default(),
        );
        p.go(1, false, t0);
        p.go(0, false, t0 + Duration::from_secs(1));
        assert_eq!(p.auto_advance_deadline(), None);
        assert!(p.tick(t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(p.current(), Some(0));
    }

    #[test]
    fn test_location_change_only_navigates_in_talk() {
        let now = Instant::now();
        let mut p = three();
        p.go(0, false, now);
        let effects = p.location_changed(Some(2), now);
        assert_eq!(p.current(), Some(2));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Location(_))));

        p.jump();
        assert!(p.location_changed(Some(0), now).is_empty());
        assert_eq!(p.current(), Some(2));
        assert!(p.location_changed(None, now).is_empty());
    }

    #[test]
    fn test_aspect_ratio_apply() {
        let ar = AspectRatio::Fixed(1.6);
        assert_eq!(ar.apply(1920.0, 1080.0), (1728.0, 1080.0));
        assert_eq!(ar.apply(1000.0, 1000.0), (1000.0, 625.0));
        assert_eq!(AspectRatio::Free.apply(1000.0, 1000.0), (1000.0, 1000.0));
    }

    #[test]
    fn test_aspect_ratio_parse() {
        assert_eq!("false".parse::<AspectRatio>(), Ok(AspectRatio::Free));
        assert_eq!("2".parse::<AspectRatio>(), Ok(AspectRatio::Fixed(2.0)));
        assert!("-1".parse::<AspectRatio>().is_err());
        assert!("wide".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_resize_retargets_talk_slide() {
        let now = Instant::now();
        let mut p = three();
        p.go(0, false, now);
        p.resize(1000.0, 1000.0);
        match p.stage() {
            Stage::Talk(Some(placement)) => {
                assert_eq!((placement.width, placement.height), (1000.0, 625.0));
            }
            other => panic!("expected talk stage, got {other:?}"),
        }
    }

    #[test]
    fn test_replace_deck_clamps_position() {
        let now = Instant::now();
        let mut p = three();
        p.go(2, false, now);
        let effects = p.replace_deck(deck("# Only\n---\nSecond"), now);
        assert_eq!(p.current(), Some(1));
        assert_eq!(talk_slide(&p), Some(1));
        assert!(effects.contains(&Effect::Location(1)));

        p.jump();
        p.replace_deck(deck("# Just one"), now);
        assert_eq!(p.mode(), Mode::Jump);
        assert_eq!(p.current(), Some(0));
        assert!(matches!(p.stage(), Stage::Jump(thumbs) if thumbs.len() == 1));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("jump".parse::<Mode>(), Ok(Mode::Jump));
        assert!("slides".parse::<Mode>().is_err());
        assert_eq!(Mode::Print.to_string(), "print");
    }
}
