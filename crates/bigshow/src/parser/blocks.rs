use std::sync::LazyLock;

use regex::Regex;

use super::splitter::Fences;
use super::{Block, ListItem, inline};

static SOLE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[([^\]]*)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)$"#).expect("valid regex")
});

static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?$").expect("valid regex")
});

/// Parse slide markdown into blocks.
pub fn parse(content: &str) -> Vec<Block> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if trimmed.is_empty() {
            i += 1;
            continue;
        }

        if is_fence(trimmed) {
            blocks.push(parse_code(&lines, &mut i));
            continue;
        }

        if let Some(block) = heading(trimmed) {
            blocks.push(block);
            i += 1;
            continue;
        }

        if is_thematic_break(trimmed) {
            blocks.push(Block::HorizontalRule);
            i += 1;
            continue;
        }

        if trimmed.starts_with('>') {
            blocks.push(parse_quote(&lines, &mut i));
            continue;
        }

        if is_table_start(&lines, i) {
            blocks.push(parse_table(&lines, &mut i));
            continue;
        }

        if let Some(marker) = list_marker(line) {
            blocks.push(parse_list(&lines, &mut i, marker));
            continue;
        }

        parse_paragraph(&lines, &mut i, &mut blocks);
    }

    blocks
}

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn heading(trimmed: &str) -> Option<Block> {
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim_end();
    Some(Block::Heading {
        level: level as u8,
        inlines: inline::parse(text),
    })
}

fn is_thematic_break(trimmed: &str) -> bool {
    ['*', '_', '-'].iter().any(|&mark| {
        trimmed.chars().filter(|&c| c == mark).count() >= 3
            && trimmed.chars().all(|c| c == mark || c == ' ')
    })
}

fn parse_code(lines: &[&str], i: &mut usize) -> Block {
    let opening = lines[*i].trim();
    let language = opening
        .trim_start_matches(['`', '~'])
        .split_whitespace()
        .next()
        .map(str::to_string);

    let mut fences = Fences::default();
    fences.feed(lines[*i]);
    *i += 1;

    let mut code = Vec::new();
    while *i < lines.len() {
        let line = lines[*i];
        *i += 1;
        fences.feed(line);
        if !fences.is_open() {
            break;
        }
        code.push(line);
    }

    Block::CodeBlock {
        language,
        code: code.join("\n"),
    }
}

fn parse_quote(lines: &[&str], i: &mut usize) -> Block {
    let mut parts = Vec::new();
    while *i < lines.len() {
        let trimmed = lines[*i].trim();
        let Some(rest) = trimmed.strip_prefix('>') else {
            break;
        };
        parts.push(rest.trim());
        *i += 1;
    }
    Block::BlockQuote {
        inlines: inline::parse(&join_soft(&parts)),
    }
}

fn is_table_start(lines: &[&str], i: usize) -> bool {
    lines[i].contains('|')
        && lines
            .get(i + 1)
            .is_some_and(|next| next.contains('-') && TABLE_SEPARATOR.is_match(next.trim()))
}

fn table_cells(line: &str) -> Vec<Vec<super::Inline>> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed
        .split('|')
        .map(|cell| inline::parse(cell.trim()))
        .collect()
}

fn parse_table(lines: &[&str], i: &mut usize) -> Block {
    let headers = table_cells(lines[*i]);
    *i += 2;
    let mut rows = Vec::new();
    while *i < lines.len() {
        let line = lines[*i];
        if line.trim().is_empty() || !line.contains('|') {
            break;
        }
        let mut row = table_cells(line);
        row.resize(headers.len(), Vec::new());
        rows.push(row);
        *i += 1;
    }
    Block::Table { headers, rows }
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    indent: usize,
    ordered: bool,
    number: usize,
    content_start: usize,
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn list_marker(line: &str) -> Option<Marker> {
    let indent = indent_width(line);
    let leading = line.len() - line.trim_start().len();
    let rest = &line[leading..];

    if is_thematic_break(rest.trim()) {
        return None;
    }

    let mut chars = rest.chars();
    let first = chars.next()?;
    if matches!(first, '-' | '*' | '+') {
        let after = &rest[1..];
        if after.starts_with(' ') || after.is_empty() {
            return Some(Marker {
                indent,
                ordered: false,
                number: 0,
                content_start: leading + 1 + (after.len() - after.trim_start().len()),
            });
        }
        return None;
    }

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let after = &rest[digits..];
    let after = after.strip_prefix('.').or_else(|| after.strip_prefix(')'))?;
    if !after.starts_with(' ') && !after.is_empty() {
        return None;
    }
    Some(Marker {
        indent,
        ordered: true,
        number: rest[..digits].parse().unwrap_or(1),
        content_start: leading + digits + 1 + (after.len() - after.trim_start().len()),
    })
}

struct RawItem {
    text: Vec<String>,
    children: Vec<ListItem>,
}

impl RawItem {
    fn finish(self) -> ListItem {
        ListItem {
            inlines: inline::parse(&join_soft(&self.text)),
            children: self.children,
        }
    }
}

fn parse_list(lines: &[&str], i: &mut usize, first: Marker) -> Block {
    let items = parse_items(lines, i, first);
    Block::List {
        ordered: first.ordered,
        start: first.number,
        items,
    }
}

fn parse_items(lines: &[&str], i: &mut usize, first: Marker) -> Vec<ListItem> {
    let base = first.indent;
    let mut items: Vec<RawItem> = Vec::new();

    while *i < lines.len() {
        let line = lines[*i];

        if line.trim().is_empty() {
            // A blank line keeps the list open only if more items follow.
            let next = lines[*i + 1..].iter().position(|l| !l.trim().is_empty());
            let continues = next
                .map(|offset| lines[*i + 1 + offset])
                .and_then(list_marker)
                .is_some_and(|m| m.indent >= base && (m.indent > base || m.ordered == first.ordered));
            if !continues {
                break;
            }
            *i += 1;
            continue;
        }

        match list_marker(line) {
            Some(m) if m.indent < base => break,
            Some(m) if m.indent >= base + 2 => {
                let children = parse_items(lines, i, m);
                if let Some(parent) = items.last_mut() {
                    parent.children.extend(children);
                }
            }
            Some(m) => {
                if m.ordered != first.ordered {
                    break;
                }
                items.push(RawItem {
                    text: vec![line[m.content_start..].trim().to_string()],
                    children: Vec::new(),
                });
                *i += 1;
            }
            None => {
                let Some(last) = items.last_mut() else {
                    break;
                };
                if indent_width(line) <= base && starts_block(line.trim()) {
                    break;
                }
                last.text.push(line.trim().to_string());
                *i += 1;
            }
        }
    }

    items.into_iter().map(RawItem::finish).collect()
}

fn starts_block(trimmed: &str) -> bool {
    is_fence(trimmed) || trimmed.starts_with('#') || trimmed.starts_with('>')
}

fn parse_paragraph(lines: &[&str], i: &mut usize, blocks: &mut Vec<Block>) {
    let mut parts: Vec<&str> = Vec::new();
    while *i < lines.len() {
        let line = lines[*i];
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if !parts.is_empty()
            && (starts_block(trimmed) || list_marker(line).is_some() || is_table_start(lines, *i))
        {
            break;
        }
        parts.push(line.trim_start());
        *i += 1;
    }

    let images: Option<Vec<Block>> = parts
        .iter()
        .map(|p| {
            SOLE_IMAGE.captures(p.trim()).map(|caps| Block::Image {
                alt: caps[1].to_string(),
                path: caps[2].to_string(),
            })
        })
        .collect();

    match images {
        Some(images) if !images.is_empty() => blocks.extend(images),
        _ => blocks.push(Block::Paragraph {
            inlines: inline::parse(&join_soft(&parts)),
        }),
    }
}

/// Join wrapped source lines. A trailing backslash or two trailing spaces
/// keep a hard break; anything else becomes a space.
fn join_soft<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for (idx, part) in parts.iter().enumerate() {
        let part = part.as_ref();
        let hard = part.ends_with("  ") || part.ends_with('\\');
        let text = part.trim_end().trim_end_matches('\\');
        out.push_str(text);
        if idx + 1 < parts.len() {
            out.push(if hard { '\n' } else { ' ' });
        }
    }
    out
}
