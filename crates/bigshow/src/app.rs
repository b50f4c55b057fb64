use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::appearance::Appearance;
use crate::cli::PresentArgs;
use crate::commands;
use crate::config::Config;
use crate::error::Error;
use crate::input::{self, Action, InputEvent, InputRouter};
use crate::location::PositionFile;
use crate::parser::Deck;
use crate::presentation::{AspectRatio, Effect, Mode, Placement, Presentation, Stage};
use crate::presenter::view::{self as presenter_view, EguiWindows};
use crate::presenter::{
    NotesDisplay, OpenOutcome, PresenterChannel, PresenterCommand, PresenterView,
};
use crate::render::SlideRenderer;
use crate::render::layout::LinkArea;
use crate::render::text::plain_job;
use crate::theme::Theme;
use crate::watch::{Change, FileWatcher};

const TOAST_SECONDS: f32 = 1.5;
const TOAST_FADE_START: f32 = 1.0;
const PAGE_GAP: f32 = 24.0;
const NOTES_FONT: f32 = 14.0;

/// Everything decided before the window opens.
#[derive(Debug)]
struct Settings {
    theme: Theme,
    aspect: AspectRatio,
    title: String,
    mode: Mode,
    notes_display: NotesDisplay,
    start_slide: usize,
    presenter: bool,
}

impl Settings {
    /// CLI flags win over the deck's frontmatter, which wins over the config.
    fn resolve(
        args: &PresentArgs,
        deck: &Deck,
        config: &Config,
        file: &Path,
        token: Option<usize>,
    ) -> anyhow::Result<Self> {
        let theme_name = args
            .theme
            .as_deref()
            .or(deck.meta.theme.as_deref())
            .or(config.theme())
            .unwrap_or("dark");
        let theme = Theme::from_name(theme_name).ok_or_else(|| Error::InvalidValue {
            key: "theme".to_string(),
            value: theme_name.to_string(),
            expected: "Must be 'dark', 'light', or 'white'.".to_string(),
        })?;

        let deck_aspect = deck.meta.aspect_ratio.as_deref().and_then(|raw| {
            let parsed = raw.parse().ok();
            if parsed.is_none() {
                log::warn!("ignoring aspect ratio {raw:?} in the deck");
            }
            parsed
        });
        let aspect = args
            .aspect_ratio
            .or(deck_aspect)
            .or_else(|| config.aspect_ratio())
            .unwrap_or_default();

        let title = args
            .title
            .clone()
            .or_else(|| deck.meta.title.clone())
            .unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "bigshow".to_string())
            });

        let mode = args
            .mode
            .map(Mode::from)
            .or_else(|| config.start_mode())
            .unwrap_or_default();

        let last = deck.len().saturating_sub(1);
        let start_slide = match args.slide {
            Some(n) => n.saturating_sub(1),
            None => token.unwrap_or(0),
        }
        .min(last);

        Ok(Self {
            theme,
            aspect,
            title,
            mode,
            notes_display: config.notes_display().unwrap_or_default(),
            start_slide,
            presenter: args.presenter,
        })
    }
}

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        if elapsed < TOAST_FADE_START {
            1.0
        } else if elapsed < TOAST_SECONDS {
            1.0 - (elapsed - TOAST_FADE_START) / (TOAST_SECONDS - TOAST_FADE_START)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= TOAST_SECONDS
    }
}

/// A click on the stage, resolved after drawing.
enum StageClick {
    Route(InputEvent),
    Activate(usize),
    OpenUrl(String),
}

struct PresentationApp {
    file: PathBuf,
    title: String,
    presentation: Presentation,
    renderer: SlideRenderer,
    router: InputRouter,
    presenter: PresenterChannel,
    position: Option<PositionFile>,
    watcher: Option<FileWatcher>,
    /// Applied on the first frame, once the window size is known.
    start: Option<(usize, Mode, bool)>,
    links: Vec<LinkArea>,
    toast: Option<Toast>,
    /// A blocking notice; input is ignored while it is shown.
    notice: Option<String>,
}

impl PresentationApp {
    fn new(
        ctx: &egui::Context,
        file: PathBuf,
        deck: Deck,
        settings: Settings,
        position: Option<PositionFile>,
        watch_deck: bool,
    ) -> Self {
        let base_path = file.parent().unwrap_or(Path::new(".")).to_path_buf();
        let presentation =
            Presentation::new(Arc::new(deck), Appearance::default(), settings.aspect);

        let mut watched = Vec::new();
        if watch_deck {
            watched.push((file.clone(), Change::Deck));
        }
        if let Some(position) = &position {
            watched.push((position.path().to_path_buf(), Change::Position));
        }
        let watcher = if watched.is_empty() {
            None
        } else {
            let waker = ctx.clone();
            match FileWatcher::start(&watched, move || waker.request_repaint()) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    log::warn!("{e}");
                    None
                }
            }
        };

        Self {
            file,
            title: settings.title,
            presentation,
            renderer: SlideRenderer::new(base_path, settings.theme),
            router: InputRouter::new(),
            presenter: PresenterChannel::new(settings.notes_display),
            position,
            watcher,
            start: Some((settings.start_slide, settings.mode, settings.presenter)),
            links: Vec::new(),
            toast: None,
            notice: None,
        }
    }

    fn perform(&mut self, ctx: &egui::Context, action: Action, now: Instant) -> Vec<Effect> {
        match action {
            Action::Forward => self.presentation.forward(now),
            Action::Reverse => self.presentation.reverse(now),
            Action::ForwardWrapping => self.presentation.forward_wrapping(now),
            Action::Locate(n) => self.presentation.location_changed(Some(n), now),
            Action::Talk => self.presentation.resume_talk(now),
            Action::Print | Action::Jump => {
                let (effects, label) = if action == Action::Print {
                    (self.presentation.print(), "Print view (T to return)")
                } else {
                    (self.presentation.jump(), "Jump view (click a slide)")
                };
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.title.clone()));
                self.toast = Some(Toast::new(label));
                effects
            }
            Action::OpenPresenter => {
                self.open_presenter(ctx, now);
                Vec::new()
            }
            Action::ToggleFullscreen => {
                let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
                Vec::new()
            }
            Action::Quit => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                Vec::new()
            }
            Action::ClosePresenter => {
                self.presenter.request_close();
                Vec::new()
            }
            Action::ToggleNotes => {
                self.presenter.toggle_notes_display();
                Vec::new()
            }
        }
    }

    fn open_presenter(&mut self, ctx: &egui::Context, now: Instant) {
        let view = presenter_view_of(&self.presentation);
        let mut windows = EguiWindows::new(ctx);
        match self.presenter.open(&mut windows, now, view) {
            Ok(OpenOutcome::Opened) => self.toast = Some(Toast::new("Presenter view opened")),
            Ok(OpenOutcome::Focused) => log::debug!("presenter view focused"),
            Err(e) => {
                log::warn!("{e}");
                self.notice = Some(e.to_string());
            }
        }
    }

    fn apply(&mut self, ctx: &egui::Context, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Location(n) => {
                    if let Some(position) = &self.position {
                        if let Err(e) = position.write(n) {
                            log::warn!("{e}");
                        }
                    }
                }
                Effect::Title(text) => {
                    let title = if text.is_empty() {
                        self.title.clone()
                    } else {
                        text
                    };
                    ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));
                }
                Effect::RefreshPresenter => {
                    self.presenter.refresh(presenter_view_of(&self.presentation));
                }
            }
        }
    }

    /// File changes noticed by the watcher thread since the last frame.
    fn poll_watcher(&mut self, ctx: &egui::Context, now: Instant) -> Vec<Effect> {
        let Some(watcher) = &self.watcher else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        for change in watcher.drain() {
            match change {
                Change::Deck => effects.extend(self.reload(now)),
                Change::Position => {
                    let token = self.position.as_ref().and_then(PositionFile::read);
                    let event = InputEvent::LocationChanged(token);
                    if let Some(action) = self.router.route(self.presentation.mode(), event) {
                        effects.extend(self.perform(ctx, action, now));
                    }
                }
            }
        }
        effects
    }

    fn reload(&mut self, now: Instant) -> Vec<Effect> {
        match commands::load_deck(&self.file) {
            Ok(deck) => {
                log::info!("reloaded {} ({} slides)", self.file.display(), deck.len());
                self.renderer.clear();
                self.toast = Some(Toast::new("Reloaded"));
                self.presentation.replace_deck(Arc::new(deck), now)
            }
            Err(e) => {
                log::warn!("keeping the previous deck: {e:#}");
                Vec::new()
            }
        }
    }

    fn start(&mut self, ctx: &egui::Context, now: Instant) -> Vec<Effect> {
        let Some((slide, mode, presenter)) = self.start.take() else {
            return Vec::new();
        };
        let mut effects = self.presentation.go(slide as isize, true, now);
        match mode {
            Mode::Talk => {}
            Mode::Print => effects.extend(self.presentation.print()),
            Mode::Jump => effects.extend(self.presentation.jump()),
        }
        if presenter {
            self.open_presenter(ctx, now);
        }
        effects
    }

    fn draw_stage(&mut self, ui: &mut egui::Ui) -> Vec<StageClick> {
        let rect = ui.max_rect();
        let mut clicks = Vec::new();
        match self.presentation.stage() {
            Stage::Talk(placement) => {
                let response = ui.interact(rect, ui.id().with("talk-stage"), egui::Sense::click());
                let theme = self.renderer.page_theme(self.presentation.appearance());
                ui.painter().rect_filled(rect, 0.0, theme.background);
                self.links.clear();
                if let Some(placement) = placement {
                    if let Some(slide) = self.presentation.deck().slide(placement.slide) {
                        let slide_rect = egui::Rect::from_center_size(
                            rect.center(),
                            egui::vec2(placement.width, placement.height),
                        );
                        self.links = self.renderer.draw(
                            ui.painter(),
                            slide,
                            &placement.appearance,
                            slide_rect,
                        );
                    }
                }
                if response.clicked() {
                    let link = response.interact_pointer_pos().and_then(|pos| {
                        self.links.iter().find(|l| l.rect.contains(pos)).map(|l| l.url.clone())
                    });
                    clicks.push(StageClick::Route(InputEvent::Click {
                        on_link: link.is_some(),
                    }));
                    if let Some(url) = link {
                        clicks.push(StageClick::OpenUrl(url));
                    }
                }
            }
            Stage::Print(pages) => {
                let theme = self.renderer.page_theme(self.presentation.appearance());
                ui.painter().rect_filled(rect, 0.0, theme.background);
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(PAGE_GAP);
                            for page in pages {
                                if self.placed(ui, &page.placement, &theme) {
                                    clicks.push(StageClick::Activate(page.placement.slide));
                                }
                                if !page.notes.is_empty() {
                                    let text = page.notes.join("\n\n");
                                    let width = page.placement.width;
                                    let job = plain_job(&text, NOTES_FONT, theme.muted, width);
                                    let galley = ui.painter().layout_job(job);
                                    let (notes_rect, _) = ui.allocate_exact_size(
                                        egui::vec2(page.placement.width, galley.size().y),
                                        egui::Sense::hover(),
                                    );
                                    ui.painter().galley(notes_rect.min, galley, theme.muted);
                                }
                                ui.add_space(PAGE_GAP);
                            }
                        });
                    });
            }
            Stage::Jump(thumbs) => {
                let theme = self.renderer.page_theme(self.presentation.appearance());
                ui.painter().rect_filled(rect, 0.0, theme.background);
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.add_space(PAGE_GAP / 2.0);
                        ui.horizontal_wrapped(|ui| {
                            ui.spacing_mut().item_spacing = egui::Vec2::splat(PAGE_GAP / 2.0);
                            for thumb in thumbs {
                                if self.placed(ui, thumb, &theme) {
                                    clicks.push(StageClick::Activate(thumb.slide));
                                }
                            }
                        });
                    });
            }
        }
        clicks
    }

    /// Draw a print page or thumbnail. True when it was clicked.
    fn placed(&self, ui: &mut egui::Ui, placement: &Placement, chrome: &Theme) -> bool {
        let size = egui::vec2(placement.width, placement.height);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
        if !ui.is_rect_visible(rect) {
            return response.clicked();
        }
        if let Some(slide) = self.presentation.deck().slide(placement.slide) {
            self.renderer.draw(ui.painter(), slide, &placement.appearance, rect);
        }
        let stroke = if response.hovered() {
            egui::Stroke::new(2.0, chrome.accent)
        } else {
            egui::Stroke::new(1.0, Theme::with_opacity(chrome.muted, 0.5))
        };
        ui.painter().rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Outside);
        response.clicked()
    }

    fn draw_toast(&self, ui: &egui::Ui, rect: egui::Rect) {
        let Some(toast) = &self.toast else {
            return;
        };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }
        let theme = self.renderer.theme();
        let toast_color = Theme::with_opacity(theme.foreground, opacity * 0.9);
        let toast_bg = Theme::with_opacity(theme.code_background, opacity * 0.9);
        let galley = ui.painter().layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(20.0),
            toast_color,
        );
        let padding = 16.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.bottom() - 80.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        ui.painter().rect_filled(toast_rect, 8.0, toast_bg);
        let text_pos = egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding);
        ui.painter().galley(text_pos, galley, toast_color);
        ui.ctx().request_repaint();
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = self.notice.clone() else {
            return;
        };
        let mut dismissed = false;
        let modal = egui::Modal::new(egui::Id::new("bigshow-notice")).show(ctx, |ui| {
            ui.set_width(380.0);
            ui.heading("Presenter view unavailable");
            ui.add_space(8.0);
            ui.label(message);
            ui.add_space(12.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
        if dismissed || modal.should_close() {
            self.notice = None;
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.presentation.auto_advance_deadline(),
            self.presenter.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }
}

impl eframe::App for PresentationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.frame(ctx);
    }
}

impl PresentationApp {
    fn frame(&mut self, ctx: &egui::Context) {
        let now = Instant::now();

        let area = ctx.available_rect();
        let before = self.presentation.talk_box();
        self.presentation.resize(area.width(), area.height());
        let mut effects = self.start(ctx, now);
        if self.presentation.talk_box() != before {
            effects.push(Effect::RefreshPresenter);
        }

        effects.extend(self.poll_watcher(ctx, now));

        for command in self.presenter.drain() {
            let action = match command {
                PresenterCommand::Forward => Action::Forward,
                PresenterCommand::Reverse => Action::Reverse,
                PresenterCommand::Close => Action::ClosePresenter,
                PresenterCommand::ToggleNotes => Action::ToggleNotes,
            };
            effects.extend(self.perform(ctx, action, now));
        }

        // Viewport commands are sent outside the input closure.
        let events = ctx.input(input::collect);
        if self.notice.is_none() {
            for event in events {
                if let Some(action) = self.router.route(self.presentation.mode(), event) {
                    effects.extend(self.perform(ctx, action, now));
                }
            }
        }

        effects.extend(self.presentation.tick(now));
        self.presenter.tick(now);
        self.apply(ctx, effects);

        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        let bg = self.renderer.page_theme(self.presentation.appearance()).background;
        let clicks = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let clicks = self.draw_stage(ui);
                self.draw_toast(ui, ui.max_rect());
                clicks
            })
            .inner;

        if self.notice.is_none() {
            let mut effects = Vec::new();
            for click in clicks {
                match click {
                    StageClick::Route(event) => {
                        if let Some(action) = self.router.route(self.presentation.mode(), event) {
                            effects.extend(self.perform(ctx, action, now));
                        }
                    }
                    StageClick::Activate(index) => {
                        effects.extend(self.presentation.activate(index, now));
                    }
                    StageClick::OpenUrl(url) => {
                        log::debug!("opening {url}");
                        ctx.open_url(egui::OpenUrl::new_tab(url));
                    }
                }
            }
            self.apply(ctx, effects);
        }
        self.router.end_frame();

        presenter_view::show(
            ctx,
            &mut self.presenter,
            self.presentation.deck(),
            &self.renderer,
            &self.router,
        );
        self.show_notice(ctx);

        if let Some(deadline) = self.next_deadline() {
            let wait = deadline.saturating_duration_since(Instant::now());
            ctx.request_repaint_after(wait.max(Duration::from_millis(1)));
        }
    }
}

/// What the presenter window shows for the primary's current state.
fn presenter_view_of(presentation: &Presentation) -> PresenterView {
    let total = presentation.len();
    let current = presentation.current();
    let next = current.map(|c| c + 1).filter(|n| *n < total);
    let notes = current
        .and_then(|c| presentation.deck().slide(c))
        .map(|s| s.notes.clone())
        .unwrap_or_default();
    PresenterView {
        current,
        next,
        total,
        notes,
        appearance: presentation.appearance().clone(),
        talk_box: presentation.talk_box(),
    }
}

pub fn run(file: PathBuf, args: PresentArgs) -> anyhow::Result<()> {
    let deck = commands::load_deck(&file)?;
    let config = Config::load_or_default();

    let position = match &args.position_file {
        Some(path) => Some(PositionFile::new(path)),
        None => match PositionFile::for_deck(&file) {
            Ok(position) => Some(position),
            Err(e) => {
                log::warn!("{e}; slide position will not be kept");
                None
            }
        },
    };
    if let Some(parent) = position.as_ref().and_then(|p| p.path().parent()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::warn!("cannot create {}: {e}", parent.display());
        }
    }
    let token = position.as_ref().and_then(PositionFile::read);

    let settings = Settings::resolve(&args, &deck, &config, &file, token)?;
    log::debug!("starting with {settings:?}");

    let title = settings.title.clone();
    let viewport = if args.windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let watch_deck = args.watch;
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            Ok(Box::new(PresentationApp::new(
                &cc.egui_ctx,
                file,
                deck,
                settings,
                position,
                watch_deck,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
