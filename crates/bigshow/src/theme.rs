use eframe::egui::Color32;

use crate::appearance::{Appearance, TextAlign};

pub const THEME_NAMES: &[&str] = &["dark", "light", "white"];

/// Colours and relative type scale for slides. Sizes are in em, multiplied by
/// the fitted font size at layout time.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub foreground: Color32,
    pub heading_color: Color32,
    pub accent: Color32,
    pub muted: Color32,
    pub code_background: Color32,
    pub code_foreground: Color32,
    pub align: TextAlign,
    pub h1_em: f32,
    pub h2_em: f32,
    pub h3_em: f32,
    pub body_em: f32,
    pub code_em: f32,
    /// Vertical gap between blocks.
    pub gap_em: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(0x00, 0x00, 0x00),
            foreground: Color32::from_rgb(0xF0, 0xF0, 0xF0),
            heading_color: Color32::WHITE,
            accent: Color32::from_rgb(0x5C, 0xB8, 0xFF),
            muted: Color32::from_rgb(0x88, 0x88, 0x88),
            code_background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            code_foreground: Color32::from_rgb(0xD4, 0xD4, 0xD4),
            ..Self::scale()
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::from_rgb(0xF4, 0xF1, 0xEA),
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            heading_color: Color32::from_rgb(0x16, 0x21, 0x3E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            muted: Color32::from_rgb(0x70, 0x70, 0x70),
            code_background: Color32::from_rgb(0xE8, 0xE4, 0xDA),
            code_foreground: Color32::from_rgb(0x33, 0x33, 0x33),
            ..Self::scale()
        }
    }

    pub fn white() -> Self {
        Self {
            name: "white".to_string(),
            background: Color32::WHITE,
            foreground: Color32::BLACK,
            heading_color: Color32::BLACK,
            accent: Color32::from_rgb(0x1A, 0x6B, 0xB5),
            muted: Color32::from_rgb(0x80, 0x80, 0x80),
            code_background: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            code_foreground: Color32::from_rgb(0x22, 0x22, 0x22),
            ..Self::scale()
        }
    }

    /// The shared type scale; colours are overwritten by each theme.
    fn scale() -> Self {
        Self {
            name: String::new(),
            background: Color32::BLACK,
            foreground: Color32::WHITE,
            heading_color: Color32::WHITE,
            accent: Color32::WHITE,
            muted: Color32::GRAY,
            code_background: Color32::BLACK,
            code_foreground: Color32::WHITE,
            align: TextAlign::Left,
            h1_em: 1.0,
            h2_em: 0.8,
            h3_em: 0.65,
            body_em: 0.55,
            code_em: 0.45,
            gap_em: 0.25,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "white" => Some(Self::white()),
            _ => None,
        }
    }

    /// Theme for a page: the first theme-named class wins, then style
    /// declarations override colours and alignment in order.
    pub fn resolve(appearance: &Appearance, fallback: &Theme) -> Self {
        let mut theme = appearance
            .classes()
            .find_map(Self::from_name)
            .unwrap_or_else(|| fallback.clone());

        let style = appearance.style();
        if let Some(bg) = style.background {
            theme.background = bg;
            theme.code_background = Self::shade(bg);
        }
        if let Some(fg) = style.color {
            theme.foreground = fg;
            theme.heading_color = fg;
            theme.code_foreground = fg;
        }
        if let Some(align) = style.align {
            theme.align = align;
        }
        theme
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }

    pub fn heading_em(&self, level: u8) -> f32 {
        match level {
            1 => self.h1_em,
            2 => self.h2_em,
            3 => self.h3_em,
            _ => self.body_em,
        }
    }

    pub fn is_dark(&self) -> bool {
        let bg = self.background;
        (bg.r() as u32 + bg.g() as u32 + bg.b() as u32) < 3 * 128
    }

    /// Return the syntect theme name that matches this presentation theme.
    pub fn syntect_theme_name(&self) -> &'static str {
        if self.is_dark() {
            "base16-ocean.dark"
        } else {
            "InspiredGitHub"
        }
    }

    fn shade(bg: Color32) -> Color32 {
        let shift = |c: u8| if c > 127 { c.saturating_sub(16) } else { c.saturating_add(24) };
        Color32::from_rgb(shift(bg.r()), shift(bg.g()), shift(bg.b()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        for name in THEME_NAMES {
            assert_eq!(Theme::from_name(name).map(|t| t.name), Some(name.to_string()));
        }
        assert!(Theme::from_name("neon").is_none());
    }

    #[test]
    fn test_resolve_class_switches_theme() {
        let appearance = Appearance::new("white dark", "");
        let theme = Theme::resolve(&appearance, &Theme::dark());
        assert_eq!(theme.name, "white");
    }

    #[test]
    fn test_resolve_style_overrides_colours() {
        let appearance = Appearance::new("", "background: #102030; color: white; text-align: center");
        let theme = Theme::resolve(&appearance, &Theme::light());
        assert_eq!(theme.name, "light");
        assert_eq!(theme.background, Color32::from_rgb(0x10, 0x20, 0x30));
        assert_eq!(theme.foreground, Color32::WHITE);
        assert_eq!(theme.align, TextAlign::Center);
        assert!(theme.is_dark());
    }

    #[test]
    fn test_syntect_theme_follows_background() {
        assert_eq!(Theme::dark().syntect_theme_name(), "base16-ocean.dark");
        assert_eq!(Theme::white().syntect_theme_name(), "InspiredGitHub");
    }
}
