use eframe::egui::Color32;

use crate::parser::Slide;

/// Page-wide class list and inline style, the native stand-in for a document
/// body's `class` and `style` attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    class: String,
    style: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// The declarations of an inline style that slides can use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyStyle {
    pub background: Option<Color32>,
    pub color: Option<Color32>,
    pub align: Option<TextAlign>,
}

impl Appearance {
    pub fn new(class: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            style: style.into(),
        }
    }

    /// The slide's overrides layered on this baseline. Slide classes come
    /// first so they take precedence; slide style declarations come last so
    /// they win.
    pub fn with_overrides(&self, slide: &Slide) -> Self {
        let class = match slide.body_class.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{extra} {}", self.class),
            _ => self.class.clone(),
        };
        let style = match slide.body_style.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{}; {extra}", self.style),
            _ => self.style.clone(),
        };
        Self { class, style }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class.split_whitespace()
    }

    pub fn style(&self) -> BodyStyle {
        BodyStyle::parse(&self.style)
    }
}

impl BodyStyle {
    /// Parse `property: value` declarations separated by `;`. Unknown
    /// properties and unparseable values are skipped.
    pub fn parse(style: &str) -> Self {
        let mut out = Self::default();
        for declaration in style.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match property.trim().to_ascii_lowercase().as_str() {
                "background" | "background-color" => {
                    if let Some(color) = parse_color(value) {
                        out.background = Some(color);
                    }
                }
                "color" => {
                    if let Some(color) = parse_color(value) {
                        out.color = Some(color);
                    }
                }
                "text-align" => {
                    out.align = match value {
                        "left" | "start" => Some(TextAlign::Left),
                        "center" => Some(TextAlign::Center),
                        "right" | "end" => Some(TextAlign::Right),
                        _ => out.align,
                    }
                }
                other => log::debug!("ignoring style property {other}"),
            }
        }
        out
    }
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or a basic colour name. For
/// shorthand `background` values the first token that parses wins.
pub fn parse_color(value: &str) -> Option<Color32> {
    let value = value.trim().to_ascii_lowercase();

    if let Some(args) = value.strip_prefix("rgb(").and_then(|v| v.strip_suffix(')')) {
        let parts: Vec<u8> = args
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        return match parts[..] {
            [r, g, b] => Some(Color32::from_rgb(r, g, b)),
            _ => None,
        };
    }

    value.split_whitespace().find_map(single_color)
}

fn single_color(token: &str) -> Option<Color32> {
    if let Some(hex) = token.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        return match digits[..] {
            [r, g, b] => Some(Color32::from_rgb(r * 17, g * 17, b * 17)),
            [r1, r2, g1, g2, b1, b2] => Some(Color32::from_rgb(
                r1 * 16 + r2,
                g1 * 16 + g2,
                b1 * 16 + b2,
            )),
            _ => None,
        };
    }

    let color = match token {
        "black" => Color32::BLACK,
        "white" => Color32::WHITE,
        "red" => Color32::from_rgb(0xFF, 0x00, 0x00),
        "green" => Color32::from_rgb(0x00, 0x80, 0x00),
        "blue" => Color32::from_rgb(0x00, 0x00, 0xFF),
        "yellow" => Color32::from_rgb(0xFF, 0xFF, 0x00),
        "orange" => Color32::from_rgb(0xFF, 0xA5, 0x00),
        "purple" => Color32::from_rgb(0x80, 0x00, 0x80),
        "navy" => Color32::from_rgb(0x00, 0x00, 0x80),
        "teal" => Color32::from_rgb(0x00, 0x80, 0x80),
        "gray" | "grey" => Color32::from_rgb(0x80, 0x80, 0x80),
        "silver" => Color32::from_rgb(0xC0, 0xC0, 0xC0),
        "pink" => Color32::from_rgb(0xFF, 0xC0, 0xCB),
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn test_parse_colors() {
        assert_eq!(parse_color("#fff"), Some(Color32::WHITE));
        assert_eq!(parse_color("#336699"), Some(Color32::from_rgb(0x33, 0x66, 0x99)));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Color32::from_rgb(1, 2, 3)));
        assert_eq!(parse_color("Navy"), Some(Color32::from_rgb(0, 0, 0x80)));
        assert_eq!(parse_color("url(x.png) no-repeat #000"), Some(Color32::BLACK));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_later_declarations_win() {
        let style = BodyStyle::parse("color: red; background: black; color: blue");
        assert_eq!(style.color, Some(Color32::from_rgb(0, 0, 0xFF)));
        assert_eq!(style.background, Some(Color32::BLACK));
    }

    #[test]
    fn test_overrides_layer_on_baseline() {
        let deck = parser::build("[.body-class: white]\n[.body-style: color: red]\nHi");
        let baseline = Appearance::new("dark", "background: #000");
        let page = baseline.with_overrides(&deck.slides[0]);
        assert_eq!(page.classes().collect::<Vec<_>>(), vec!["white", "dark"]);
        let style = page.style();
        assert_eq!(style.background, Some(Color32::BLACK));
        assert_eq!(style.color, Some(Color32::from_rgb(0xFF, 0, 0)));
    }

    #[test]
    fn test_no_overrides_is_baseline() {
        let deck = parser::build("Plain");
        let baseline = Appearance::new("light", "");
        assert_eq!(baseline.with_overrides(&deck.slides[0]), baseline);
    }
}
