pub mod fit_cache;
pub mod image_cache;
pub mod layout;
pub mod syntax;
pub mod text;

use std::cell::RefCell;
use std::path::PathBuf;

use eframe::egui::{self, Rect, vec2};

use crate::appearance::Appearance;
use crate::fit::{self, Fit};
use crate::parser::Slide;
use crate::theme::Theme;

use fit_cache::FitCache;
use image_cache::ImageCache;
use layout::{LayoutEngine, LinkArea, SlideMeasurer};
use syntax::SyntaxHighlighter;

/// Draws slides: fits them to their target box (cached), lays them out at
/// the fitted size and paints them with the page theme.
pub struct SlideRenderer {
    theme: Theme,
    images: ImageCache,
    syntax: SyntaxHighlighter,
    fits: RefCell<FitCache>,
}

impl SlideRenderer {
    pub fn new(base_path: PathBuf, theme: Theme) -> Self {
        Self {
            theme,
            images: ImageCache::new(base_path),
            syntax: SyntaxHighlighter::new(),
            fits: RefCell::new(FitCache::default()),
        }
    }

    /// The theme pages fall back to when no class names one.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn page_theme(&self, appearance: &Appearance) -> Theme {
        Theme::resolve(appearance, &self.theme)
    }

    /// The fit of a slide in a `width` x `height` box.
    pub fn fit(&self, painter: &egui::Painter, slide: &Slide, width: f32, height: f32) -> Fit {
        self.fits
            .borrow_mut()
            .get_or_insert_with(slide.index, width, height, || {
                let mut measurer = SlideMeasurer {
                    painter,
                    slide,
                    theme: &self.theme,
                    syntax: &self.syntax,
                    images: &self.images,
                };
                let result = fit::fit(&mut measurer, width, height, slide.is_grid());
                log::debug!(
                    "slide {} fitted to {width}x{height} at {}px",
                    slide.index + 1,
                    result.font_size
                );
                result
            })
    }

    /// Fit the slide to `rect` and paint it there with its page background.
    pub fn draw(
        &self,
        painter: &egui::Painter,
        slide: &Slide,
        appearance: &Appearance,
        rect: Rect,
    ) -> Vec<LinkArea> {
        let fit = self.fit(painter, slide, rect.width(), rect.height());
        self.paint(painter, slide, appearance, rect.min, &fit)
    }

    /// Draw a slide as it looks in a `reference` box, scaled down into
    /// `rect`. Previews share the primary window's fit.
    pub fn draw_scaled(
        &self,
        painter: &egui::Painter,
        slide: &Slide,
        appearance: &Appearance,
        reference: (f32, f32),
        rect: Rect,
    ) {
        let (ref_w, ref_h) = reference;
        if ref_w <= 0.0 || ref_h <= 0.0 {
            return;
        }
        let factor = (rect.width() / ref_w).min(rect.height() / ref_h);
        let fit = self.fit(painter, slide, ref_w, ref_h).scaled(factor);
        let size = vec2(fit.frame.width, fit.frame.height);
        let origin = rect.center() - size / 2.0;
        self.paint(painter, slide, appearance, origin, &fit);
    }

    fn paint(
        &self,
        painter: &egui::Painter,
        slide: &Slide,
        appearance: &Appearance,
        origin: egui::Pos2,
        fit: &Fit,
    ) -> Vec<LinkArea> {
        let theme = self.page_theme(appearance);
        let frame = &fit.frame;
        let rect = Rect::from_min_size(origin, vec2(frame.width, frame.height));
        painter.rect_filled(rect, 0.0, theme.background);

        let engine = LayoutEngine {
            painter,
            theme: &theme,
            syntax: &self.syntax,
            images: &self.images,
            font_size: fit.font_size,
        };
        let layout = engine.slide(slide, frame);
        let content_origin = origin + vec2(frame.padding, frame.padding);
        layout.paint(&painter.with_clip_rect(rect), content_origin, theme.foreground)
    }

    /// Forget fits, textures and highlights, e.g. after the deck changed.
    pub fn clear(&self) {
        self.fits.borrow_mut().clear();
        self.images.clear();
        self.syntax.clear();
    }
}
