/// Tracks fenced code blocks while walking a document line by line.
#[derive(Debug, Default)]
pub struct Fences {
    open: Option<(char, usize)>,
}

impl Fences {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns true when the line is part of a fenced
    /// block, including the opening and closing fence lines.
    pub fn feed(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        match self.open {
            Some((fence_char, fence_len)) => {
                let closing = trimmed.chars().take_while(|&c| c == fence_char).count();
                if closing >= fence_len && trimmed[closing * fence_char.len_utf8()..].trim().is_empty()
                {
                    self.open = None;
                }
                true
            }
            None => {
                let fence_char = match trimmed.chars().next() {
                    Some(c @ ('`' | '~')) => c,
                    _ => return false,
                };
                let fence_len = trimmed.chars().take_while(|&c| c == fence_char).count();
                if fence_len < 3 {
                    return false;
                }
                self.open = Some((fence_char, fence_len));
                true
            }
        }
    }
}

/// Split a deck body into raw slide strings.
///
/// A slide break is a standalone line of dashes (at least three, spaces
/// allowed). Lines inside fenced code blocks never break. Chunks that are only
/// whitespace are dropped.
pub fn split(body: &str) -> Vec<String> {
    let mut slides = Vec::new();
    let mut current = String::new();
    let mut fences = Fences::default();

    for line in body.lines() {
        let fenced = fences.feed(line);
        if !fenced && is_horizontal_rule(line.trim()) {
            push_chunk(&mut slides, &mut current);
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    push_chunk(&mut slides, &mut current);

    slides
}

/// Split grid slide content into cells on blank lines outside code fences.
pub fn split_cells(content: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut fences = Fences::default();

    for line in content.lines() {
        let fenced = fences.feed(line);
        if !fenced && line.trim().is_empty() {
            push_chunk(&mut cells, &mut current);
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    push_chunk(&mut cells, &mut current);

    cells
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect()
}

fn push_chunk(out: &mut Vec<String>, current: &mut String) {
    if !current.trim().is_empty() {
        out.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// True for a line made only of dashes and spaces with at least three dashes.
pub fn is_horizontal_rule(line: &str) -> bool {
    line.len() >= 3
        && line.chars().all(|c| c == '-' || c == ' ')
        && line.chars().filter(|&c| c == '-').count() >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_separator() {
        let slides = split("Slide one\n---\nSlide two");
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].trim(), "Slide one");
        assert_eq!(slides[1].trim(), "Slide two");
    }

    #[test]
    fn test_spaced_dashes_split() {
        let slides = split("One\n\n- - -\n\nTwo");
        assert_eq!(slides.len(), 2);
    }

    #[test]
    fn test_two_dashes_do_not_split() {
        let slides = split("One\n--\nTwo");
        assert_eq!(slides.len(), 1);
    }

    #[test]
    fn test_table_separator_does_not_split() {
        let slides = split("| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(slides.len(), 1);
    }

    #[test]
    fn test_empty_chunks_dropped() {
        let slides = split("---\n\n---\nOnly\n---\n   \n");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].trim(), "Only");
    }

    #[test]
    fn test_rule_in_code_fence_does_not_split() {
        let body = "```yaml\n---\nkey: value\n```\n";
        let slides = split(body);
        assert_eq!(slides.len(), 1);
        assert!(slides[0].contains("key: value"));
    }

    #[test]
    fn test_tilde_fence_needs_matching_close() {
        let body = "~~~~\n```\n---\n~~~~\n---\nafter";
        let slides = split(body);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].trim(), "after");
    }

    #[test]
    fn test_split_cells() {
        let cells = split_cells("![](a.png)\n\nFirst line\nsecond line\n\n\n```\nx\n\ny\n```");
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1], "First line\nsecond line");
        assert_eq!(cells[2], "```\nx\n\ny\n```");
    }
}
