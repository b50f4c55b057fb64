use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static SLIDE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--\s*slide\s+(.*?)\s*-->").expect("valid regex"));

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[\.([\w-]+):[ \t]*([^\]\n]+)\][ \t]*$").expect("valid regex")
});

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid regex"));

/// Words DeckSet accepts in an image's alt text to position or scale it.
const IMAGE_MODIFIERS: &[&str] = &["left", "right", "fit", "filled", "inline", "original"];

/// Per-slide settings from a `<!-- slide ... -->` block or DeckSet directives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SlideMeta {
    pub layout: Option<String>,
    pub class: Option<String>,
    pub body_style: Option<String>,
    pub body_class: Option<String>,
    pub time_to_next: Option<f32>,
}

impl SlideMeta {
    fn set(&mut self, key: &str, value: &str) {
        let value = value.trim().to_string();
        match key {
            "layout" => self.layout = Some(value),
            "class" => self.class = Some(value),
            "body-style" => self.body_style = Some(value),
            "body-class" => self.body_class = Some(value),
            "time-to-next" => match value.parse::<f32>() {
                Ok(secs) => self.time_to_next = Some(secs),
                Err(_) => log::warn!("ignoring time-to-next directive {value:?}"),
            },
            _ => log::debug!("ignoring slide directive [.{key}]"),
        }
    }
}

/// Pull slide metadata out of a raw slide.
///
/// Order matters: the YAML comment first, then DeckSet `[.key: value]` lines
/// (which win on conflict), then image modifiers, which only pick a layout
/// when none was set. Returns the metadata and the slide with all of it
/// removed.
pub fn extract(raw: &str) -> (SlideMeta, String) {
    let mut meta = SlideMeta::default();
    let mut content = raw.to_string();

    if let Some(caps) = SLIDE_COMMENT.captures(&content) {
        let yaml = caps.get(1).map_or("", |m| m.as_str());
        match serde_yaml::from_str::<SlideMeta>(yaml) {
            Ok(parsed) => meta = parsed,
            Err(e) => log::warn!("ignoring malformed slide metadata: {e}"),
        }
        content = SLIDE_COMMENT.replace_all(&content, "").into_owned();
    }

    for caps in DIRECTIVE.captures_iter(&content) {
        meta.set(&caps[1].to_ascii_lowercase(), &caps[2]);
    }
    content = DIRECTIVE.replace_all(&content, "").into_owned();

    let content = normalize_images(&content, &mut meta);
    (meta, content)
}

/// Strip DeckSet modifiers from image alt text. A `left` or `right` image
/// puts the slide on a two-column grid unless a layout is already set.
fn normalize_images(content: &str, meta: &mut SlideMeta) -> String {
    let mut sided = false;
    let out = IMAGE.replace_all(content, |caps: &regex::Captures| {
        let mut alt_words = Vec::new();
        for word in caps[1].split_whitespace() {
            let lower = word.to_ascii_lowercase();
            if lower == "left" || lower == "right" {
                sided = true;
            }
            if !is_modifier(&lower) {
                alt_words.push(word);
            }
        }
        format!("![{}]({})", alt_words.join(" "), &caps[2])
    });
    let out = out.into_owned();

    if sided && meta.layout.is_none() {
        meta.layout = Some("50-50".to_string());
    }
    out
}

fn is_modifier(word: &str) -> bool {
    IMAGE_MODIFIERS.contains(&word) || word.ends_with('%')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_comment() {
        let raw = "<!-- slide\nlayout: 75-25\nbody-class: light\ntime-to-next: 4\n-->\n# Hi";
        let (meta, content) = extract(raw);
        assert_eq!(meta.layout.as_deref(), Some("75-25"));
        assert_eq!(meta.body_class.as_deref(), Some("light"));
        assert_eq!(meta.time_to_next, Some(4.0));
        assert_eq!(content.trim(), "# Hi");
    }

    #[test]
    fn test_directive_overrides_comment() {
        let raw = "<!-- slide\nlayout: 75-25\n-->\n[.layout: grid-3x2]\nText";
        let (meta, content) = extract(raw);
        assert_eq!(meta.layout.as_deref(), Some("grid-3x2"));
        assert_eq!(content.trim(), "Text");
    }

    #[test]
    fn test_directive_value_may_contain_colons() {
        let (meta, _) = extract("[.body-style: color: red; background: black]\nx");
        assert_eq!(
            meta.body_style.as_deref(),
            Some("color: red; background: black")
        );
    }

    #[test]
    fn test_inline_bracket_text_is_not_a_directive() {
        let (meta, content) = extract("See [.note: this] inline");
        assert_eq!(meta, SlideMeta::default());
        assert!(content.contains("[.note: this]"));
    }

    #[test]
    fn test_side_image_implies_two_columns() {
        let (meta, content) = extract("![left fit](photo.jpg)\n\nCaption");
        assert_eq!(meta.layout.as_deref(), Some("50-50"));
        assert!(content.starts_with("![](photo.jpg)"));
    }

    #[test]
    fn test_side_image_keeps_explicit_layout() {
        let (meta, _) = extract("[.layout: 75-25]\n![right](a.png)\n\nText");
        assert_eq!(meta.layout.as_deref(), Some("75-25"));
    }

    #[test]
    fn test_plain_alt_text_survives() {
        let (meta, content) = extract("![A sunset 50%](s.png)");
        assert_eq!(meta.layout, None);
        assert_eq!(content, "![A sunset](s.png)");
    }
}
