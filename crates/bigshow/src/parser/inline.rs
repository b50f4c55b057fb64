use super::Inline;

/// Parse inline markdown: emphasis, strong, strikethrough, code spans,
/// links and autolinks. Inline images collapse to their alt text.
pub fn parse(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let prev = text[..i].chars().next_back();

        if let Some(escaped) = rest.strip_prefix('\\').and_then(|r| r.chars().next()) {
            if escaped.is_ascii_punctuation() {
                buf.push(escaped);
                i += 1 + escaped.len_utf8();
                continue;
            }
        }

        if rest.starts_with('`') {
            let ticks = rest.chars().take_while(|&c| c == '`').count();
            let fence = &rest[..ticks];
            if let Some(end) = rest[ticks..].find(fence) {
                flush(&mut buf, &mut out);
                let code = rest[ticks..ticks + end].trim();
                out.push(Inline::Code(code.to_string()));
                i += ticks + end + ticks;
                continue;
            }
        }

        if let Some((inline, used)) = emphasis(rest, prev) {
            flush(&mut buf, &mut out);
            out.push(inline);
            i += used;
            continue;
        }

        if let Some(after_bang) = rest.strip_prefix('!') {
            if let Some((label, _url, used)) = link_parts(after_bang) {
                buf.push_str(label);
                i += 1 + used;
                continue;
            }
        }

        if let Some((label, url, used)) = link_parts(rest) {
            flush(&mut buf, &mut out);
            out.push(Inline::Link {
                text: parse(label),
                url: url.to_string(),
            });
            i += used;
            continue;
        }

        if let Some((url, used)) = autolink(rest) {
            flush(&mut buf, &mut out);
            out.push(Inline::Link {
                text: vec![Inline::Text(url.to_string())],
                url: url.to_string(),
            });
            i += used;
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        buf.push(c);
        i += c.len_utf8();
    }

    flush(&mut buf, &mut out);
    out
}

/// Concatenate the visible text of inline elements.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(s) | Inline::Code(s) => out.push_str(s),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Strikethrough(children)
            | Inline::Link { text: children, .. } => out.push_str(&plain_text(children)),
        }
    }
    out
}

fn flush(buf: &mut String, out: &mut Vec<Inline>) {
    if !buf.is_empty() {
        out.push(Inline::Text(std::mem::take(buf)));
    }
}

fn emphasis(rest: &str, prev: Option<char>) -> Option<(Inline, usize)> {
    const DELIMS: [&str; 5] = ["**", "__", "~~", "*", "_"];

    for delim in DELIMS {
        let Some(after) = rest.strip_prefix(delim) else {
            continue;
        };
        // Opening delimiter must hug its content; `_` must not sit inside a word.
        if after.starts_with(char::is_whitespace) || after.is_empty() {
            continue;
        }
        if delim.starts_with('_') && prev.is_some_and(char::is_alphanumeric) {
            continue;
        }
        if delim.len() == 1 && after.starts_with(delim) {
            continue;
        }
        let Some(end) = closing(after, delim) else {
            continue;
        };
        let inner = parse(&after[..end]);
        let inline = match delim {
            "**" | "__" => Inline::Bold(inner),
            "~~" => Inline::Strikethrough(inner),
            _ => Inline::Italic(inner),
        };
        return Some((inline, delim.len() * 2 + end));
    }
    None
}

/// Byte offset of the delimiter closing a span whose content starts `s`.
fn closing(s: &str, delim: &str) -> Option<usize> {
    let mut search = 0;
    while let Some(pos) = s[search..].find(delim) {
        let at = search + pos;
        let hugs = at > 0 && !s[..at].ends_with(char::is_whitespace);
        let after = &s[at + delim.len()..];
        if delim.len() == 1 && after.starts_with(delim) {
            search = at + 2 * delim.len();
            continue;
        }
        let word_inside =
            delim.starts_with('_') && after.chars().next().is_some_and(char::is_alphanumeric);
        if hugs && !word_inside {
            return Some(at);
        }
        search = at + delim.len();
    }
    None
}

/// Parse `[label](url "title")`, returning label, url and bytes consumed.
fn link_parts(rest: &str) -> Option<(&str, &str, usize)> {
    let inner = rest.strip_prefix('[')?;
    let mut depth = 0usize;
    let mut label_end = None;
    for (idx, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => {
                label_end = Some(idx);
                break;
            }
            ']' => depth -= 1,
            _ => {}
        }
    }
    let label_end = label_end?;
    let after = inner[label_end + 1..].strip_prefix('(')?;
    let close = after.find(')')?;
    let target = after[..close].trim();
    let url = target.split_whitespace().next().unwrap_or("");
    let used = 1 + label_end + 1 + 1 + close + 1;
    Some((&inner[..label_end], url, used))
}

fn autolink(rest: &str) -> Option<(&str, usize)> {
    let inner = rest.strip_prefix('<')?;
    let end = inner.find('>')?;
    let url = &inner[..end];
    if (url.starts_with("http://") || url.starts_with("https://") || url.starts_with("mailto:"))
        && !url.contains(char::is_whitespace)
    {
        Some((url, end + 2))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_plain() {
        assert_eq!(parse("just words"), vec![text("just words")]);
    }

    #[test]
    fn test_bold_and_italic() {
        let parsed = parse("a **bold** and *soft* word");
        assert_eq!(
            parsed,
            vec![
                text("a "),
                Inline::Bold(vec![text("bold")]),
                text(" and "),
                Inline::Italic(vec![text("soft")]),
                text(" word"),
            ]
        );
    }

    #[test]
    fn test_nested_emphasis() {
        let parsed = parse("*a **b** c*");
        assert_eq!(
            parsed,
            vec![Inline::Italic(vec![
                text("a "),
                Inline::Bold(vec![text("b")]),
                text(" c"),
            ])]
        );
    }

    #[test]
    fn test_snake_case_is_not_italic() {
        assert_eq!(parse("snake_case_name"), vec![text("snake_case_name")]);
    }

    #[test]
    fn test_lone_star_is_text() {
        assert_eq!(parse("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
    }

    #[test]
    fn test_code_span_is_literal() {
        assert_eq!(
            parse("run `a *b*` now"),
            vec![text("run "), Inline::Code("a *b*".to_string()), text(" now")]
        );
    }

    #[test]
    fn test_link_with_title() {
        let parsed = parse("see [the docs](https://x.io \"Docs\")!");
        assert_eq!(
            parsed,
            vec![
                text("see "),
                Inline::Link {
                    text: vec![text("the docs")],
                    url: "https://x.io".to_string(),
                },
                text("!"),
            ]
        );
    }

    #[test]
    fn test_autolink() {
        let parsed = parse("<https://example.com>");
        assert!(matches!(&parsed[0], Inline::Link { url, .. } if url == "https://example.com"));
    }

    #[test]
    fn test_inline_image_becomes_alt() {
        assert_eq!(parse("logo ![Acme](a.png) here"), vec![text("logo Acme here")]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(parse(r"\*not italic\*"), vec![text("*not italic*")]);
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(
            parse("~~gone~~"),
            vec![Inline::Strikethrough(vec![text("gone")])]
        );
    }

    #[test]
    fn test_plain_text() {
        let parsed = parse("**Big** [idea](u) `x`");
        assert_eq!(plain_text(&parsed), "Big idea x");
    }
}
