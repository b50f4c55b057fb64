//! Places a slide's blocks at a candidate font size.
//!
//! The same layout serves measuring and painting: the fit search reads the
//! extent, the painter walks the shapes. Positions are relative to the
//! top-left corner of the content box (inside the padding).

use std::sync::Arc;

use eframe::egui::{self, Color32, Pos2, Rect, Stroke, TextureId, Vec2, pos2, vec2};

use super::image_cache::ImageCache;
use super::syntax::SyntaxHighlighter;
use super::text::{self, Ink};
use crate::appearance::TextAlign;
use crate::fit::{Extent, Frame, Measure};
use crate::parser::{Block, GridLayout, Inline, ListItem, Slide, SlideBody};
use crate::theme::Theme;

/// Image height per em of the slide's font size, before capping.
const IMAGE_EM: f32 = 3.0;

/// Share of the content height an image may take when it shares its box
/// with other blocks.
const SHARED_IMAGE_CAP: f32 = 0.75;

#[derive(Clone)]
pub enum Shape {
    Text {
        galley: Arc<egui::Galley>,
        link: Option<String>,
    },
    Fill {
        size: Vec2,
        color: Color32,
        radius: f32,
    },
    Rule {
        width: f32,
        stroke: Stroke,
    },
    Image {
        size: Vec2,
        texture: TextureId,
    },
}

#[derive(Clone)]
pub struct Placed {
    pub offset: Vec2,
    pub shape: Shape,
}

/// A clickable hyperlink in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkArea {
    pub rect: Rect,
    pub url: String,
}

/// The laid-out content of a block list or a whole slide.
#[derive(Clone, Default)]
pub struct SlideLayout {
    pub shapes: Vec<Placed>,
    pub content_height: f32,
    /// Narrowest width the content can take without overflowing.
    pub min_width: f32,
    pub inner_overflow: bool,
    /// Drawn width of a fixed-width block, used to align it.
    natural_width: Option<f32>,
}

impl SlideLayout {
    pub fn extent(&self, frame: &Frame) -> Extent {
        Extent {
            scroll_width: (self.min_width + 2.0 * frame.padding).max(frame.width),
            height: self.content_height + 2.0 * frame.padding,
            inner_overflow: self.inner_overflow,
        }
    }

    fn push(&mut self, offset: Vec2, shape: Shape) {
        self.shapes.push(Placed { offset, shape });
    }

    fn push_width(&mut self, width: f32) {
        self.natural_width = Some(width);
    }

    /// Append another layout shifted by `offset`.
    fn absorb(&mut self, other: SlideLayout, offset: Vec2) {
        self.shapes.extend(other.shapes.into_iter().map(|p| Placed {
            offset: p.offset + offset,
            shape: p.shape,
        }));
        self.inner_overflow |= other.inner_overflow;
    }

    /// Paint at `origin` (the content box's top-left corner). Returns the
    /// hyperlink areas.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, fallback: Color32) -> Vec<LinkArea> {
        let mut links = Vec::new();
        for placed in &self.shapes {
            let at = origin + placed.offset;
            match &placed.shape {
                Shape::Text { galley, link } => {
                    if let Some(url) = link {
                        links.push(LinkArea {
                            rect: galley.rect.translate(at.to_vec2()),
                            url: url.clone(),
                        });
                    }
                    painter.galley(at, Arc::clone(galley), fallback);
                }
                Shape::Fill { size, color, radius } => {
                    painter.rect_filled(Rect::from_min_size(at, *size), *radius, *color);
                }
                Shape::Rule { width, stroke } => {
                    painter.line_segment([at, at + vec2(*width, 0.0)], *stroke);
                }
                Shape::Image { size, texture } => {
                    let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                    painter.image(*texture, Rect::from_min_size(at, *size), uv, Color32::WHITE);
                }
            }
        }
        links
    }
}

/// Lays slides out for one theme at one font size.
pub struct LayoutEngine<'a> {
    pub painter: &'a egui::Painter,
    pub theme: &'a Theme,
    pub syntax: &'a SyntaxHighlighter,
    pub images: &'a ImageCache,
    pub font_size: f32,
}

impl LayoutEngine<'_> {
    /// Lay a slide out inside `frame`. Flow content is centred vertically in
    /// the content box; grid content fills it.
    pub fn slide(&self, slide: &Slide, frame: &Frame) -> SlideLayout {
        let width = frame.content_width();
        let box_height = (frame.height - 2.0 * frame.padding).max(0.0);
        match &slide.body {
            SlideBody::Flow(blocks) => {
                let mut layout = self.blocks(blocks, width, box_height);
                let slack = (box_height - layout.content_height).max(0.0) / 2.0;
                if slack > 0.0 {
                    for placed in &mut layout.shapes {
                        placed.offset.y += slack;
                    }
                }
                layout
            }
            SlideBody::Grid { layout, cells } => {
                self.grid(layout, cells, width, frame.grid_height.unwrap_or(box_height))
            }
        }
    }

    fn grid(&self, grid: &GridLayout, cells: &[Vec<Block>], width: f32, height: f32) -> SlideLayout {
        let columns = grid.column_fractions();
        let rows = grid.row_fractions(cells.len());
        let mut out = SlideLayout {
            content_height: height,
            ..Default::default()
        };

        let mut y = 0.0;
        let mut cell_iter = cells.iter();
        'rows: for row in &rows {
            let cell_h = row * height;
            let mut x = 0.0;
            for column in &columns {
                let Some(cell) = cell_iter.next() else {
                    break 'rows;
                };
                let cell_w = column * width;
                let mut layout = self.blocks(cell, cell_w, cell_h);
                if layout.content_height > cell_h || layout.min_width > cell_w {
                    log::trace!(
                        "grid cell overflows at {}px: {}x{} in {cell_w}x{cell_h}",
                        self.font_size,
                        layout.min_width,
                        layout.content_height
                    );
                    layout.inner_overflow = true;
                }
                let slack = (cell_h - layout.content_height).max(0.0) / 2.0;
                out.absorb(layout, vec2(x, y + slack));
                x += cell_w;
            }
            y += cell_h;
        }
        if cell_iter.next().is_some() {
            log::trace!("grid has more cells than tracks; extra cells are not shown");
        }
        out
    }

    /// Stack blocks vertically in a box `width` wide. `box_height` only caps
    /// image sizes.
    pub fn blocks(&self, blocks: &[Block], width: f32, box_height: f32) -> SlideLayout {
        let gap = self.theme.gap_em * self.font_size;
        let shared = blocks.iter().any(|b| !matches!(b, Block::Image { .. }));
        let image_cap = if shared && blocks.len() > 1 {
            box_height * SHARED_IMAGE_CAP
        } else {
            box_height
        };

        let mut out = SlideLayout::default();
        let mut y = 0.0;
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                y += gap;
            }
            let layout = self.block(block, width, image_cap);
            out.min_width = out.min_width.max(layout.min_width);
            let height = layout.content_height;
            out.absorb(layout, vec2(0.0, y));
            y += height;
        }
        out.content_height = y;
        out
    }

    fn block(&self, block: &Block, width: f32, image_cap: f32) -> SlideLayout {
        let theme = self.theme;
        let em = self.font_size;
        match block {
            Block::Heading { level, inlines } => {
                self.text_block(inlines, theme.heading_em(*level) * em, theme.heading_color, width, false)
            }
            Block::Paragraph { inlines } => {
                self.text_block(inlines, theme.body_em * em, theme.foreground, width, false)
            }
            Block::BlockQuote { inlines } => self.quote(inlines, width),
            Block::List { ordered, start, items } => {
                let list = self.list(items, *ordered, *start, 0, width);
                self.aligned(list, width)
            }
            Block::CodeBlock { language, code } => {
                let code = self.code(code, language.as_deref(), width);
                self.aligned(code, width)
            }
            Block::Table { headers, rows } => {
                let table = self.table(headers, rows, width);
                self.aligned(table, width)
            }
            Block::Image { alt, path } => {
                let image = self.image(alt, path, width, image_cap);
                self.aligned(image, width)
            }
            Block::HorizontalRule => {
                let size = theme.body_em * em;
                let mut out = SlideLayout {
                    content_height: size * 0.5,
                    ..Default::default()
                };
                out.push(
                    vec2(0.0, size * 0.25),
                    Shape::Rule {
                        width,
                        stroke: Stroke::new((size / 20.0).max(1.0), Theme::with_opacity(theme.muted, 0.6)),
                    },
                );
                out
            }
        }
    }

    /// A wrapped run of inline text. The galley hangs from an anchor chosen
    /// by the theme's alignment.
    fn text_block(
        &self,
        inlines: &[Inline],
        size: f32,
        color: Color32,
        width: f32,
        italic: bool,
    ) -> SlideLayout {
        let ink = Ink {
            text: color,
            link: self.theme.accent,
        };
        let mut job = text::inlines_to_job(inlines, size, ink, width, self.theme.align);
        if italic {
            for section in &mut job.sections {
                section.format.italics = true;
            }
        }
        let min_width = text::min_content_width(self.painter, &job);
        let galley = self.painter.layout_job(job);
        let anchor = match self.theme.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => width / 2.0,
            TextAlign::Right => width,
        };
        let mut out = SlideLayout {
            content_height: galley.rect.height(),
            min_width,
            ..Default::default()
        };
        out.push(
            vec2(anchor, 0.0),
            Shape::Text {
                galley,
                link: text::first_link(inlines).map(str::to_string),
            },
        );
        out
    }

    fn quote(&self, inlines: &[Inline], width: f32) -> SlideLayout {
        let size = self.theme.body_em * self.font_size;
        let bar = (size * 0.12).max(1.0);
        let indent = bar + size * 0.5;
        let body = self.text_block(inlines, size, self.theme.foreground, (width - indent).max(0.0), true);

        let mut out = SlideLayout {
            content_height: body.content_height,
            min_width: body.min_width + indent,
            ..Default::default()
        };
        out.push(
            Vec2::ZERO,
            Shape::Fill {
                size: vec2(bar, body.content_height),
                color: self.theme.accent,
                radius: bar / 2.0,
            },
        );
        out.absorb(body, vec2(indent, 0.0));
        out
    }

    fn list(&self, items: &[ListItem], ordered: bool, start: usize, depth: usize, width: f32) -> SlideLayout {
        let size = self.theme.body_em * self.font_size;
        let marker_width = size * 1.4;
        let spacing = size * 0.2;
        let ink = Ink {
            text: self.theme.foreground,
            link: self.theme.accent,
        };

        let mut out = SlideLayout::default();
        let mut natural = 0.0f32;
        let mut y = 0.0;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                y += spacing;
            }
            let marker = if ordered {
                format!("{}.", start + i)
            } else if depth == 0 {
                "\u{2022}".to_string()
            } else {
                "\u{2013}".to_string()
            };
            let marker = self
                .painter
                .layout_no_wrap(marker, egui::FontId::proportional(size), self.theme.muted);

            let text_width = (width - marker_width).max(0.0);
            let job = text::inlines_to_job(&item.inlines, size, ink, text_width, TextAlign::Left);
            out.min_width = out.min_width.max(text::min_content_width(self.painter, &job) + marker_width);
            let galley = self.painter.layout_job(job);
            let row_height = galley.rect.height().max(marker.rect.height());
            natural = natural.max(marker_width + galley.rect.width());

            out.push(vec2(0.0, y), Shape::Text { galley: marker, link: None });
            out.push(
                vec2(marker_width, y),
                Shape::Text {
                    galley,
                    link: text::first_link(&item.inlines).map(str::to_string),
                },
            );
            y += row_height;

            if !item.children.is_empty() {
                y += spacing;
                let children = self.list(&item.children, ordered, 1, depth + 1, text_width);
                out.min_width = out.min_width.max(children.min_width + marker_width);
                let child_height = children.content_height;
                natural = natural.max(marker_width + children.natural_width.unwrap_or(0.0));
                out.absorb(children, vec2(marker_width, y));
                y += child_height;
            }
        }
        out.content_height = y;
        out.push_width(natural);
        out
    }

    fn code(&self, code: &str, language: Option<&str>, width: f32) -> SlideLayout {
        let size = self.theme.code_em * self.font_size;
        let padding = size * 0.6;
        let job = self.syntax.job(code, language, self.theme, size);
        let galley = self.painter.layout_job(job);
        let natural = galley.rect.width() + 2.0 * padding;
        let box_width = natural.min(width);
        let height = galley.rect.height() + 2.0 * padding;

        let mut out = SlideLayout {
            content_height: height,
            inner_overflow: natural > width,
            ..Default::default()
        };
        out.push(
            Vec2::ZERO,
            Shape::Fill {
                size: vec2(box_width, height),
                color: self.theme.code_background,
                radius: padding * 0.5,
            },
        );
        out.push(vec2(padding, padding), Shape::Text { galley, link: None });
        out.push_width(box_width);
        out
    }

    fn table(&self, headers: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>], width: f32) -> SlideLayout {
        let size = self.theme.body_em * self.font_size * 0.85;
        let cell_padding = size * 0.4;
        let columns = headers.len().max(rows.iter().map(Vec::len).max().unwrap_or(0)).max(1);
        let col_width = width / columns as f32;
        let text_width = (col_width - 2.0 * cell_padding).max(0.0);

        let mut out = SlideLayout::default();
        let mut column_min = vec![0.0f32; columns];
        let mut y = 0.0;

        let all_rows = std::iter::once((headers, true)).chain(rows.iter().map(|r| (r.as_slice(), false)));
        for (row_index, (cells, is_header)) in all_rows.enumerate() {
            if is_header && cells.is_empty() {
                continue;
            }
            let color = if is_header { self.theme.heading_color } else { self.theme.foreground };
            let ink = Ink {
                text: color,
                link: self.theme.accent,
            };
            let mut row_height = 0.0f32;
            for (col, cell) in cells.iter().enumerate().take(columns) {
                let mut job = text::inlines_to_job(cell, size, ink, text_width, TextAlign::Left);
                if is_header {
                    for section in &mut job.sections {
                        section.format.font_id.size *= 1.05;
                    }
                }
                column_min[col] = column_min[col].max(text::min_content_width(self.painter, &job));
                let galley = self.painter.layout_job(job);
                row_height = row_height.max(galley.rect.height());
                out.push(
                    vec2(col as f32 * col_width + cell_padding, y + cell_padding),
                    Shape::Text {
                        galley,
                        link: text::first_link(cell).map(str::to_string),
                    },
                );
            }
            y += row_height + 2.0 * cell_padding;
            if row_index == 0 && is_header {
                out.push(
                    vec2(0.0, y),
                    Shape::Rule {
                        width,
                        stroke: Stroke::new((size / 16.0).max(1.0), self.theme.accent),
                    },
                );
            }
        }

        out.min_width = column_min.iter().map(|w| w + 2.0 * cell_padding).sum();
        out.content_height = y;
        out.push_width(width);
        out
    }

    fn image(&self, alt: &str, path: &str, width: f32, cap: f32) -> SlideLayout {
        let mut out = SlideLayout::default();
        let target_height = (IMAGE_EM * self.font_size).min(cap).max(0.0);

        if let Some(texture) = self.images.get_or_load(self.painter.ctx(), path) {
            let tex = texture.size_vec2();
            if tex.x > 0.0 && tex.y > 0.0 {
                let mut size = vec2(tex.x * target_height / tex.y, target_height);
                if size.x > width {
                    size = vec2(width, tex.y * width / tex.x);
                }
                out.content_height = size.y;
                out.push(Vec2::ZERO, Shape::Image { size, texture: texture.id() });
                out.push_width(size.x);
                return out;
            }
        }

        // Placeholder: a muted box with the alt text.
        let size = self.theme.body_em * self.font_size;
        let label = if alt.is_empty() { format!("[{path}]") } else { format!("[{alt}]") };
        let galley = self.painter.layout(
            label,
            egui::FontId::proportional(size * 0.6),
            self.theme.muted,
            width,
        );
        let height = (size * 2.0).min(target_height).max(galley.rect.height());
        out.content_height = height;
        out.push(
            Vec2::ZERO,
            Shape::Fill {
                size: vec2(width, height),
                color: self.theme.code_background,
                radius: size * 0.2,
            },
        );
        out.push(
            vec2((width - galley.rect.width()) / 2.0, (height - galley.rect.height()) / 2.0),
            Shape::Text { galley, link: None },
        );
        out.push_width(width);
        out
    }

    /// Shift a fixed-width block inside `width` according to the alignment.
    fn aligned(&self, mut layout: SlideLayout, width: f32) -> SlideLayout {
        let natural = layout.natural_width.take().unwrap_or(width);
        let shift = match self.theme.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (width - natural).max(0.0) / 2.0,
            TextAlign::Right => (width - natural).max(0.0),
        };
        if shift > 0.0 {
            for placed in &mut layout.shapes {
                placed.offset.x += shift;
            }
        }
        layout
    }
}

/// Fit measurement for one slide: lays it out at each candidate size.
pub struct SlideMeasurer<'a> {
    pub painter: &'a egui::Painter,
    pub slide: &'a Slide,
    pub theme: &'a Theme,
    pub syntax: &'a SyntaxHighlighter,
    pub images: &'a ImageCache,
}

impl Measure for SlideMeasurer<'_> {
    fn measure(&mut self, font_size: f32, frame: &Frame) -> Extent {
        let engine = LayoutEngine {
            painter: self.painter,
            theme: self.theme,
            syntax: self.syntax,
            images: self.images,
            font_size,
        };
        engine.slide(self.slide, frame).extent(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit;
    use crate::parser;
    use std::path::PathBuf;

    fn with_painter(f: impl FnOnce(&egui::Painter)) {
        let ctx = egui::Context::default();
        let mut f = Some(f);
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            if let Some(f) = f.take() {
                let painter = ctx.layer_painter(egui::LayerId::background());
                f(&painter);
            }
        });
    }

    fn fit_slide(painter: &egui::Painter, source: &str, width: f32, height: f32) -> (fit::Fit, Extent) {
        let deck = parser::build(source);
        let slide = &deck.slides[0];
        let theme = Theme::dark();
        let syntax = SyntaxHighlighter::new();
        let images = ImageCache::new(PathBuf::from("."));
        let mut measurer = SlideMeasurer {
            painter,
            slide,
            theme: &theme,
            syntax: &syntax,
            images: &images,
        };
        let result = fit::fit(&mut measurer, width, height, slide.is_grid());
        let extent = measurer.measure(result.font_size, &result.frame);
        (result, extent)
    }

    #[test]
    fn test_fitted_headline_fits() {
        with_painter(|painter| {
            let (result, extent) = fit_slide(painter, "# Hello", 800.0, 500.0);
            assert!(result.font_size > fit::STEPS[3]);
            assert!(result.font_size <= 500.0);
            assert!(extent.fits(&result.frame));
        });
    }

    #[test]
    fn test_longer_text_gets_smaller_type() {
        with_painter(|painter| {
            let (short, _) = fit_slide(painter, "# Hi", 800.0, 500.0);
            let (long, _) = fit_slide(
                painter,
                "# A considerably longer headline that has to wrap over several lines",
                800.0,
                500.0,
            );
            assert!(long.font_size < short.font_size);
        });
    }

    #[test]
    fn test_wide_code_overflows_its_box() {
        with_painter(|painter| {
            let source = format!("```\n{}\n```", "x".repeat(200));
            let deck = parser::build(&source);
            let theme = Theme::dark();
            let syntax = SyntaxHighlighter::new();
            let images = ImageCache::new(PathBuf::from("."));
            let engine = LayoutEngine {
                painter,
                theme: &theme,
                syntax: &syntax,
                images: &images,
                font_size: 100.0,
            };
            let frame = Frame::new(800.0, 500.0, false);
            assert!(engine.slide(&deck.slides[0], &frame).inner_overflow);

            let (result, extent) = fit_slide(painter, &source, 800.0, 500.0);
            assert!(extent.fits(&result.frame));
        });
    }

    #[test]
    fn test_grid_cells_overflow_independently() {
        with_painter(|painter| {
            let source = "<!-- slide\nlayout: 50-50\n-->\nLeft\n\nRight";
            let deck = parser::build(source);
            let theme = Theme::dark();
            let syntax = SyntaxHighlighter::new();
            let images = ImageCache::new(PathBuf::from("."));
            let frame = Frame::new(800.0, 500.0, true);
            let at = |font_size| {
                LayoutEngine {
                    painter,
                    theme: &theme,
                    syntax: &syntax,
                    images: &images,
                    font_size,
                }
                .slide(&deck.slides[0], &frame)
                .extent(&frame)
            };
            let small = at(10.0);
            assert!(small.fits(&frame));
            assert_eq!(small.height, frame.height);
            assert!(at(500.0).inner_overflow);
        });
    }

    #[test]
    fn test_paint_reports_links() {
        with_painter(|painter| {
            let deck = parser::build("Read [the docs](https://example.com)");
            let theme = Theme::light();
            let syntax = SyntaxHighlighter::new();
            let images = ImageCache::new(PathBuf::from("."));
            let engine = LayoutEngine {
                painter,
                theme: &theme,
                syntax: &syntax,
                images: &images,
                font_size: 40.0,
            };
            let frame = Frame::new(800.0, 500.0, false);
            let layout = engine.slide(&deck.slides[0], &frame);
            let links = layout.paint(painter, pos2(10.0, 10.0), theme.foreground);
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].url, "https://example.com");
            assert!(links[0].rect.width() > 0.0);
        });
    }
}
