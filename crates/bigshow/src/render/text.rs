use eframe::egui::{self, Color32, FontFamily, FontId, Stroke};
use eframe::egui::text::{LayoutJob, TextFormat};

use crate::appearance::TextAlign;
use crate::parser::Inline;

/// Colours a run of inlines is drawn with.
#[derive(Debug, Clone, Copy)]
pub struct Ink {
    pub text: Color32,
    pub link: Color32,
}

/// Create a LayoutJob from inline elements, wrapped at `max_width`.
pub fn inlines_to_job(
    inlines: &[Inline],
    font_size: f32,
    ink: Ink,
    max_width: f32,
    align: TextAlign,
) -> LayoutJob {
    let mut job = LayoutJob::default();
    job.wrap.max_width = max_width;
    job.halign = halign(align);
    append_inlines(&mut job, inlines, font_size, ink, false, false);
    job
}

/// A job for literal text. Notes and labels are never interpreted as markup.
pub fn plain_job(text: &str, font_size: f32, color: Color32, max_width: f32) -> LayoutJob {
    let mut job = LayoutJob::default();
    job.wrap.max_width = max_width;
    job.append(
        text,
        0.0,
        TextFormat {
            font_id: FontId::proportional(font_size),
            color,
            ..Default::default()
        },
    );
    job
}

fn append_inlines(
    job: &mut LayoutJob,
    inlines: &[Inline],
    font_size: f32,
    ink: Ink,
    bold: bool,
    italic: bool,
) {
    for inline in inlines {
        match inline {
            Inline::Text(s) => {
                let size = if bold { font_size * 1.05 } else { font_size };
                let format = TextFormat {
                    font_id: FontId::new(size, FontFamily::Proportional),
                    color: ink.text,
                    italics: italic,
                    ..Default::default()
                };
                job.append(s, 0.0, format);
            }
            Inline::Bold(children) => {
                append_inlines(job, children, font_size, ink, true, italic);
            }
            Inline::Italic(children) => {
                append_inlines(job, children, font_size, ink, bold, true);
            }
            Inline::Strikethrough(children) => {
                let mut inner_job = LayoutJob::default();
                append_inlines(&mut inner_job, children, font_size, ink, bold, italic);
                for section in &inner_job.sections {
                    let mut format = section.format.clone();
                    format.strikethrough = Stroke::new(stroke_width(font_size), format.color);
                    job.append(&inner_job.text[section.byte_range.clone()], 0.0, format);
                }
            }
            Inline::Code(s) => {
                let format = TextFormat {
                    font_id: FontId::new(font_size * 0.85, FontFamily::Monospace),
                    color: ink.text,
                    background: Color32::from_rgba_unmultiplied(128, 128, 128, 30),
                    ..Default::default()
                };
                job.append(s, 0.0, format);
            }
            Inline::Link { text, .. } => {
                let mut inner_job = LayoutJob::default();
                let link_ink = Ink {
                    text: ink.link,
                    link: ink.link,
                };
                append_inlines(&mut inner_job, text, font_size, link_ink, bold, italic);
                for section in &inner_job.sections {
                    let mut format = section.format.clone();
                    format.underline = Stroke::new(stroke_width(font_size), ink.link);
                    job.append(&inner_job.text[section.byte_range.clone()], 0.0, format);
                }
            }
        }
    }
}

fn stroke_width(font_size: f32) -> f32 {
    (font_size / 16.0).max(1.0)
}

fn halign(align: TextAlign) -> egui::Align {
    match align {
        TextAlign::Left => egui::Align::LEFT,
        TextAlign::Center => egui::Align::Center,
        TextAlign::Right => egui::Align::RIGHT,
    }
}

/// First link target among the inlines, if any.
pub fn first_link(inlines: &[Inline]) -> Option<&str> {
    inlines.iter().find_map(|inline| match inline {
        Inline::Link { url, .. } => Some(url.as_str()),
        Inline::Bold(children) | Inline::Italic(children) | Inline::Strikethrough(children) => {
            first_link(children)
        }
        _ => None,
    })
}

/// Width of the widest unbreakable word in the job: the narrowest the text
/// can wrap to. Whitespace becomes line breaks, which keeps section byte
/// ranges intact.
pub fn min_content_width(painter: &egui::Painter, job: &LayoutJob) -> f32 {
    let mut words = job.clone();
    words.text = words
        .text
        .chars()
        .map(|c| if c == ' ' || c == '\t' { '\n' } else { c })
        .collect();
    words.wrap.max_width = f32::INFINITY;
    words.halign = egui::Align::LEFT;
    painter.layout_job(words).rect.width()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::inline;

    fn ink() -> Ink {
        Ink {
            text: Color32::WHITE,
            link: Color32::LIGHT_BLUE,
        }
    }

    #[test]
    fn test_job_text_concatenates_inlines() {
        let job = inlines_to_job(
            &inline::parse("**Big** ideas in `code` and [links](https://x.y)"),
            20.0,
            ink(),
            500.0,
            TextAlign::Left,
        );
        assert_eq!(job.text, "Big ideas in code and links");
        assert_eq!(job.wrap.max_width, 500.0);
    }

    #[test]
    fn test_link_sections_are_underlined() {
        let job = inlines_to_job(&inline::parse("see [docs](d.html)"), 20.0, ink(), 100.0, TextAlign::Left);
        let last = job.sections.last().unwrap();
        assert_eq!(last.format.color, Color32::LIGHT_BLUE);
        assert!(last.format.underline.width > 0.0);
    }

    #[test]
    fn test_first_link_finds_nested() {
        let inlines = inline::parse("a **[b](u)** c");
        assert_eq!(first_link(&inlines), Some("u"));
        assert_eq!(first_link(&inline::parse("plain")), None);
    }

    #[test]
    fn test_center_alignment() {
        let job = inlines_to_job(&inline::parse("x"), 10.0, ink(), 100.0, TextAlign::Center);
        assert_eq!(job.halign, egui::Align::Center);
    }
}
