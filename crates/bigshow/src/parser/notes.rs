use std::sync::LazyLock;

use regex::Regex;

use super::splitter::Fences;

/// One alternation so notes come out in document order regardless of kind:
/// `<notes>` elements, HTML comments, and DeckSet `^` lines.
static NOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is:<notes>(.*?)</notes>)|(?s:<!--(.*?)-->)|(?m:^\^(.*)$)").expect("valid regex")
});

/// Remove speaker notes from slide markdown.
///
/// Returns the trimmed, non-empty note texts in document order and the
/// content with every note fragment removed. Fenced code is left untouched.
pub fn extract(content: &str) -> (Vec<String>, String) {
    let mut notes = Vec::new();
    let mut out = String::with_capacity(content.len());

    for (fenced, run) in runs(content) {
        if fenced {
            out.push_str(&run);
            continue;
        }
        let mut last = 0;
        for caps in NOTE.captures_iter(&run) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&run[last..whole.start()]);
            last = whole.end();

            let text = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str().trim());
            if !text.is_empty() {
                notes.push(text.to_string());
            }
        }
        out.push_str(&run[last..]);
    }

    (notes, out)
}

/// Group lines into alternating runs of fenced and unfenced text.
fn runs(content: &str) -> Vec<(bool, String)> {
    let mut runs: Vec<(bool, String)> = Vec::new();
    let mut fences = Fences::default();

    for line in content.split_inclusive('\n') {
        let fenced = fences.feed(line);
        match runs.last_mut() {
            Some((kind, text)) if *kind == fenced => text.push_str(line),
            _ => runs.push((fenced, line.to_string())),
        }
    }
    runs
}
