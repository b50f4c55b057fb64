//! The presenter window, drawn as an egui immediate viewport.

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, UiBuilder, vec2};

use super::{
    END_OF_PRESENTATION, NotesDisplay, PresenterChannel, PresenterCommand, PresenterView,
    WindowHandle, WindowSystem,
};
use crate::error::PresenterError;
use crate::fit::{self, Extent, Frame};
use crate::input::{self, Action, InputEvent, InputRouter};
use crate::parser::Deck;
use crate::render::SlideRenderer;
use crate::render::text::plain_job;
use crate::theme::Theme;

const TITLE: &str = "bigshow presenter";
const BAR_HEIGHT: f32 = 44.0;
const LABEL_HEIGHT: f32 = 22.0;
const MARGIN: f32 = 16.0;
/// Share of the height below the timer bar given to the previews.
const PREVIEW_SHARE: f32 = 0.6;
/// Share of the preview row given to the current slide.
const CURRENT_SHARE: f32 = 0.6;
/// Largest size the notes fit may pick.
pub const NOTES_MAX_FONT: f32 = 32.0;
const NOTES_SCROLL_FONT: f32 = 20.0;

pub fn viewport_id() -> egui::ViewportId {
    egui::ViewportId::from_hash_of("bigshow-presenter")
}

/// Native windows backed by egui viewports.
pub struct EguiWindows<'a> {
    ctx: &'a egui::Context,
}

impl<'a> EguiWindows<'a> {
    pub fn new(ctx: &'a egui::Context) -> Self {
        Self { ctx }
    }
}

impl WindowSystem for EguiWindows<'_> {
    fn open(&mut self) -> Result<WindowHandle, PresenterError> {
        if self.ctx.embed_viewports() {
            log::warn!("secondary viewports are embedded on this platform");
            return Err(PresenterError::WindowDenied);
        }
        Ok(WindowHandle::new())
    }

    fn focus(&mut self, _window: &WindowHandle) {
        self.ctx
            .send_viewport_cmd_to(viewport_id(), egui::ViewportCommand::Focus);
    }
}

/// Draw this frame of the presenter window, if a session is live.
pub fn show(
    ctx: &egui::Context,
    channel: &mut PresenterChannel,
    deck: &Deck,
    renderer: &SlideRenderer,
    router: &InputRouter,
) {
    let notes_display = channel.notes_display();
    let sender = channel.sender();
    let view = channel.view().clone();
    let Some(session) = channel.session_mut() else {
        return;
    };
    if session.window.is_closed() {
        return;
    }

    let builder = egui::ViewportBuilder::default()
        .with_title(TITLE)
        .with_inner_size([1100.0, 700.0]);

    ctx.show_viewport_immediate(viewport_id(), builder, |ctx, _class| {
        if ctx.input(|i| i.viewport().close_requested()) {
            session.window.close();
            return;
        }

        let mut commands: Vec<PresenterCommand> = ctx
            .input(input::collect)
            .into_iter()
            .filter_map(|event| router.route_presenter(event))
            .filter_map(command_for)
            .collect();

        let chrome = renderer.theme();
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(chrome.background).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let background =
                    ui.interact(rect, ui.id().with("presenter-stage"), Sense::click());

                let bar = Rect::from_min_size(rect.min, vec2(rect.width(), BAR_HEIGHT));
                draw_timer_bar(
                    ui.painter(),
                    chrome,
                    bar,
                    &session.elapsed,
                    &view.slide_label(),
                    &session.clock,
                );

                let body = Rect::from_min_max(
                    egui::pos2(rect.left() + MARGIN, bar.bottom() + MARGIN),
                    egui::pos2(rect.right() - MARGIN, rect.bottom() - MARGIN),
                );
                let preview_row = Rect::from_min_size(
                    body.min,
                    vec2(body.width(), (body.height() - MARGIN) * PREVIEW_SHARE),
                );
                let current_w = (preview_row.width() - MARGIN) * CURRENT_SHARE;
                let current_pane = Rect::from_min_size(
                    preview_row.min,
                    vec2(current_w, preview_row.height()),
                );
                let next_pane = Rect::from_min_max(
                    egui::pos2(current_pane.right() + MARGIN, preview_row.top()),
                    preview_row.max,
                );

                let previews = Previews {
                    painter: ui.painter(),
                    chrome,
                    deck,
                    renderer,
                    view: &view,
                };
                let current_rect = previews.draw(current_pane, "Current", view.current);
                let next_rect = previews.draw(next_pane, "Next", view.next);

                let notes_pane = Rect::from_min_max(
                    egui::pos2(body.left(), preview_row.bottom() + MARGIN),
                    body.max,
                );
                let hint = match notes_display {
                    NotesDisplay::Fit => "Notes (N: scroll)",
                    NotesDisplay::Scroll => "Notes (N: fit)",
                };
                let notes_rect = labelled(ui.painter(), chrome, notes_pane, hint);
                ui.painter().rect_filled(notes_rect, 4.0, chrome.code_background);

                let text = view.notes_text();
                let color = if view.notes.is_empty() {
                    chrome.muted
                } else {
                    chrome.foreground
                };
                match notes_display {
                    NotesDisplay::Fit => {
                        let panel = (notes_rect.width(), notes_rect.height());
                        if session.notes_fit.needs_fit(panel) {
                            let size = fit_notes(
                                ui.painter(),
                                &text,
                                notes_rect.width(),
                                notes_rect.height(),
                            );
                            log::trace!("notes fitted at {size}px");
                            session.notes_fit.font_size = Some(size);
                        }
                        if session.notes_fit.is_settling() {
                            ctx.request_repaint();
                        }
                        let size = session.notes_fit.font_size.unwrap_or(NOTES_SCROLL_FONT);
                        let frame = Frame::new(notes_rect.width(), notes_rect.height(), false);
                        let job = plain_job(&text, size, color, frame.content_width());
                        let galley = ui.painter().layout_job(job);
                        ui.painter().with_clip_rect(notes_rect).galley(
                            notes_rect.min + vec2(frame.padding, frame.padding),
                            galley,
                            color,
                        );
                    }
                    NotesDisplay::Scroll => {
                        let inner = notes_rect.shrink(MARGIN / 2.0);
                        ui.scope_builder(UiBuilder::new().max_rect(inner), |ui| {
                            egui::ScrollArea::vertical()
                                .auto_shrink([false, false])
                                .show(ui, |ui| {
                                    ui.label(
                                        egui::RichText::new(text)
                                            .size(NOTES_SCROLL_FONT)
                                            .color(color),
                                    );
                                });
                        });
                    }
                }

                if background.clicked() {
                    let on_preview = background.interact_pointer_pos().is_some_and(|pos| {
                        current_rect.is_some_and(|r| r.contains(pos))
                            || next_rect.is_some_and(|r| r.contains(pos))
                    });
                    if !on_preview {
                        let click = InputEvent::Click { on_link: false };
                        commands.extend(router.route_presenter(click).and_then(command_for));
                    }
                }
            });

        for command in commands {
            if sender.send(command).is_err() {
                log::debug!("presenter command dropped: {command:?}");
            }
        }
    });
}

fn command_for(action: Action) -> Option<PresenterCommand> {
    match action {
        Action::Forward => Some(PresenterCommand::Forward),
        Action::Reverse => Some(PresenterCommand::Reverse),
        Action::ClosePresenter => Some(PresenterCommand::Close),
        Action::ToggleNotes => Some(PresenterCommand::ToggleNotes),
        _ => None,
    }
}

fn draw_timer_bar(
    painter: &egui::Painter,
    chrome: &Theme,
    bar: Rect,
    elapsed: &str,
    slide: &str,
    clock: &str,
) {
    painter.rect_filled(bar, 0.0, chrome.code_background);
    let font = FontId::monospace(22.0);
    let y = bar.center().y;
    painter.text(
        egui::pos2(bar.left() + MARGIN, y),
        Align2::LEFT_CENTER,
        elapsed,
        font.clone(),
        chrome.accent,
    );
    painter.text(bar.center(), Align2::CENTER_CENTER, slide, font.clone(), chrome.foreground);
    painter.text(
        egui::pos2(bar.right() - MARGIN, y),
        Align2::RIGHT_CENTER,
        clock,
        font,
        chrome.foreground,
    );
}

/// Paint a pane caption and return the area below it.
fn labelled(painter: &egui::Painter, chrome: &Theme, pane: Rect, label: &str) -> Rect {
    painter.text(
        pane.min,
        Align2::LEFT_TOP,
        label,
        FontId::proportional(15.0),
        chrome.muted,
    );
    Rect::from_min_max(pane.min + vec2(0.0, LABEL_HEIGHT), pane.max)
}

struct Previews<'a> {
    painter: &'a egui::Painter,
    chrome: &'a Theme,
    deck: &'a Deck,
    renderer: &'a SlideRenderer,
    view: &'a PresenterView,
}

impl Previews<'_> {
    /// Draw one preview pane. Returns the slide's on-screen rect, if one was drawn.
    fn draw(&self, pane: Rect, label: &str, index: Option<usize>) -> Option<Rect> {
        let painter = self.painter;
        let chrome = self.chrome;
        let area = labelled(painter, chrome, pane, label);
        let Some(slide) = index.and_then(|i| self.deck.slide(i)) else {
            painter.rect_filled(area, 4.0, chrome.code_background);
            painter.text(
                area.center(),
                Align2::CENTER_CENTER,
                END_OF_PRESENTATION,
                FontId::proportional(20.0),
                chrome.muted,
            );
            return None;
        };

        let reference = self.view.talk_box;
        let rect = contain(area, reference)?;
        self.renderer
            .draw_scaled(painter, slide, &self.view.appearance, reference, rect);
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(1.0, chrome.muted),
            egui::StrokeKind::Outside,
        );
        Some(rect)
    }
}

/// The largest rect with `reference`'s aspect ratio centred in `area`.
fn contain(area: Rect, reference: (f32, f32)) -> Option<Rect> {
    let (w, h) = reference;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let factor = (area.width() / w).min(area.height() / h);
    Some(Rect::from_center_size(area.center(), vec2(w * factor, h * factor)))
}

/// Font size at which `text` fits a `width` x `height` notes panel.
pub fn fit_notes(painter: &egui::Painter, text: &str, width: f32, height: f32) -> f32 {
    let mut measure = |size: f32, frame: &Frame| {
        let job = plain_job(text, size, Color32::WHITE, frame.content_width());
        let galley = painter.layout_job(job);
        let size = galley.size();
        Extent {
            scroll_width: (size.x + 2.0 * frame.padding).max(frame.width),
            height: size.y + 2.0 * frame.padding,
            inner_overflow: false,
        }
    };
    fit::fit(&mut measure, width, height, false)
        .font_size
        .min(NOTES_MAX_FONT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{Context, LayerId, RawInput};

    fn with_painter(f: impl FnOnce(&egui::Painter)) {
        let ctx = Context::default();
        let mut f = Some(f);
        let _ = ctx.run(RawInput::default(), |ctx| {
            if let Some(f) = f.take() {
                f(&ctx.layer_painter(LayerId::background()));
            }
        });
    }

    #[test]
    fn test_short_notes_use_the_cap() {
        with_painter(|painter| {
            assert_eq!(fit_notes(painter, "Smile.", 600.0, 200.0), NOTES_MAX_FONT);
        });
    }

    #[test]
    fn test_long_notes_shrink() {
        with_painter(|painter| {
            let long = "Remember to pause here and ask the audience a question. ".repeat(20);
            let size = fit_notes(painter, &long, 600.0, 200.0);
            assert!(size < NOTES_MAX_FONT);
            assert!(size > 0.0);
        });
    }

    #[test]
    fn test_contain_keeps_aspect() {
        let area = Rect::from_min_size(egui::pos2(0.0, 0.0), vec2(400.0, 400.0));
        let rect = contain(area, (1600.0, 1000.0)).unwrap();
        assert_eq!(rect.width(), 400.0);
        assert_eq!(rect.height(), 250.0);
        assert_eq!(rect.center(), area.center());
        assert!(contain(area, (0.0, 0.0)).is_none());
    }

    #[test]
    fn test_only_navigation_reaches_the_primary() {
        assert_eq!(command_for(Action::Forward), Some(PresenterCommand::Forward));
        assert_eq!(command_for(Action::ClosePresenter), Some(PresenterCommand::Close));
        assert_eq!(command_for(Action::Print), None);
    }
}
