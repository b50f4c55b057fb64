use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::DeckMeta;
use super::splitter::is_horizontal_rule;

static PRESENTATION_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<!--\s*presentation\s+(.*?)\s*-->").expect("valid regex")
});

static GLOBAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w-]+):\s*(.+?)\s*$").expect("valid regex"));

/// DeckSet global keys. Only these are accepted as leading `key: value`
/// lines, so a deck that opens with "Agenda: today" keeps its first line.
const GLOBAL_KEYS: &[&str] = &[
    "title",
    "theme",
    "aspect-ratio",
    "time-to-next",
    "autoscale",
    "build-lists",
    "footer",
    "slidenumbers",
    "slidecount",
    "slide-transition",
    "slide-dividers",
    "presenter-notes",
    "code-language",
    "fit-header",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawMeta {
    title: Option<String>,
    theme: Option<String>,
    aspect_ratio: Option<serde_yaml::Value>,
    time_to_next: Option<f32>,
}

impl From<RawMeta> for DeckMeta {
    fn from(raw: RawMeta) -> Self {
        let aspect_ratio = raw.aspect_ratio.and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        });
        DeckMeta {
            title: raw.title,
            theme: raw.theme,
            aspect_ratio,
            time_to_next: raw.time_to_next,
        }
    }
}

/// Extract presentation metadata from the top of a deck.
///
/// Two forms are understood: a `<!-- presentation ... -->` comment holding
/// YAML, or DeckSet-style `key: value` lines before the first blank line.
/// Returns `(metadata, remaining_body)`. Malformed metadata is logged and
/// ignored.
pub fn extract(content: &str) -> (DeckMeta, String) {
    if let Some(caps) = PRESENTATION_COMMENT.captures(content) {
        let yaml = caps.get(1).map_or("", |m| m.as_str());
        let meta = match serde_yaml::from_str::<RawMeta>(yaml) {
            Ok(raw) => raw.into(),
            Err(e) => {
                log::warn!("ignoring malformed presentation metadata: {e}");
                DeckMeta::default()
            }
        };
        let body = PRESENTATION_COMMENT.replace(content, "").into_owned();
        return (meta, body);
    }

    extract_global_lines(content)
}

fn extract_global_lines(content: &str) -> (DeckMeta, String) {
    let lines: Vec<&str> = content.lines().collect();
    let mut meta = DeckMeta::default();
    let mut consumed = 0;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if consumed > 0 {
                break;
            }
            continue;
        }
        if is_horizontal_rule(trimmed) {
            break;
        }
        let Some(caps) = GLOBAL_LINE.captures(trimmed) else {
            break;
        };
        let key = caps[1].to_ascii_lowercase();
        if !GLOBAL_KEYS.contains(&key.as_str()) {
            break;
        }
        let value = caps[2].to_string();
        match key.as_str() {
            "title" => meta.title = Some(value),
            "theme" => meta.theme = Some(value),
            "aspect-ratio" => meta.aspect_ratio = Some(value),
            "time-to-next" => match value.parse::<f32>() {
                Ok(secs) => meta.time_to_next = Some(secs),
                Err(_) => log::warn!("ignoring time-to-next value {value:?}"),
            },
            _ => log::debug!("ignoring deck setting {key}"),
        }
        consumed = i + 1;
    }

    if consumed == 0 {
        return (meta, content.to_string());
    }
    (meta, lines[consumed..].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_comment() {
        let content = "<!-- presentation\ntitle: My Talk\ntime-to-next: 2.5\n-->\n# Hello";
        let (meta, body) = extract(content);
        assert_eq!(meta.title.as_deref(), Some("My Talk"));
        assert_eq!(meta.time_to_next, Some(2.5));
        assert_eq!(body.trim(), "# Hello");
    }

    #[test]
    fn test_numeric_aspect_ratio() {
        let content = "<!-- presentation\naspect-ratio: 1.78\n-->\nx";
        let (meta, _) = extract(content);
        assert_eq!(meta.aspect_ratio.as_deref(), Some("1.78"));
    }

    #[test]
    fn test_malformed_comment_is_ignored() {
        let content = "<!-- presentation\ntitle: [unclosed\n-->\nBody";
        let (meta, body) = extract(content);
        assert_eq!(meta, DeckMeta::default());
        assert_eq!(body.trim(), "Body");
    }

    #[test]
    fn test_deckset_global_lines() {
        let content = "theme: white\nslidenumbers: true\n\n# First";
        let (meta, body) = extract(content);
        assert_eq!(meta.theme.as_deref(), Some("white"));
        assert_eq!(body.trim(), "# First");
    }

    #[test]
    fn test_unknown_leading_key_is_content() {
        let content = "Agenda: today\n\nMore";
        let (meta, body) = extract(content);
        assert_eq!(meta, DeckMeta::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_no_metadata() {
        let (meta, body) = extract("# Plain deck");
        assert_eq!(meta, DeckMeta::default());
        assert_eq!(body, "# Plain deck");
    }
}
