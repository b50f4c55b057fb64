use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use eframe::egui::text::{LayoutJob, TextFormat};
use eframe::egui::{Color32, FontId};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::theme::Theme;

/// A highlighted run of code. `None` means the theme's code colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub color: Option<Color32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    code: String,
    language: Option<String>,
    theme: &'static str,
}

/// Highlights fenced code once per (code, language, theme). Decoration
/// only: the spans carry colours, never metrics.
pub struct SyntaxHighlighter {
    syntaxes: SyntaxSet,
    themes: ThemeSet,
    cache: RefCell<HashMap<Key, Rc<Vec<Span>>>>,
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            themes: ThemeSet::load_defaults(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn spans(&self, code: &str, language: Option<&str>, theme: &'static str) -> Rc<Vec<Span>> {
        let key = Key {
            code: code.to_string(),
            language: language.map(str::to_string),
            theme,
        };
        if let Some(spans) = self.cache.borrow().get(&key) {
            return Rc::clone(spans);
        }
        let spans = Rc::new(self.highlight(code, language, theme));
        self.cache.borrow_mut().insert(key, Rc::clone(&spans));
        spans
    }

    fn highlight(&self, code: &str, language: Option<&str>, theme_name: &str) -> Vec<Span> {
        let plain = || {
            vec![Span {
                color: None,
                text: code.to_string(),
            }]
        };
        let Some(theme) = self.themes.themes.get(theme_name) else {
            log::warn!("syntax theme {theme_name} is not available");
            return plain();
        };
        let syntax = language
            .and_then(|lang| self.syntaxes.find_syntax_by_token(lang))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut spans = Vec::new();
        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntaxes) {
                Ok(regions) => spans.extend(regions.into_iter().map(|(style, text)| Span {
                    color: Some(Color32::from_rgb(
                        style.foreground.r,
                        style.foreground.g,
                        style.foreground.b,
                    )),
                    text: text.to_string(),
                })),
                Err(e) => {
                    log::debug!("highlighting failed, using plain text: {e}");
                    spans.push(Span {
                        color: None,
                        text: line.to_string(),
                    });
                }
            }
        }
        spans
    }

    /// A non-wrapping job for a code block at `font_size`.
    pub fn job(&self, code: &str, language: Option<&str>, theme: &Theme, font_size: f32) -> LayoutJob {
        let mut job = LayoutJob::default();
        job.wrap.max_width = f32::INFINITY;
        let code = code.strip_suffix('\n').unwrap_or(code);
        for span in self.spans(code, language, theme.syntect_theme_name()).iter() {
            job.append(
                &span.text,
                0.0,
                TextFormat {
                    font_id: FontId::monospace(font_size),
                    color: span.color.unwrap_or(theme.code_foreground),
                    ..Default::default()
                },
            );
        }
        job
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
