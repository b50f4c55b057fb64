pub mod blocks;
pub mod frontmatter;
pub mod grid;
pub mod inline;
pub mod metadata;
pub mod notes;
pub mod splitter;

use std::time::Duration;

pub use grid::GridLayout;

/// A parsed deck: presentation metadata plus the ordered, immutable slide list.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    pub meta: DeckMeta,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckMeta {
    pub title: Option<String>,
    pub theme: Option<String>,
    pub aspect_ratio: Option<String>,
    /// Auto-advance delay applied to slides that declare none.
    pub time_to_next: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct Slide {
    /// Zero-based position in the deck; doubles as the slide's identity.
    pub index: usize,
    pub body: SlideBody,
    /// Speaker notes in document order, trimmed and non-empty.
    pub notes: Vec<String>,
    pub body_class: Option<String>,
    pub body_style: Option<String>,
    pub time_to_next: Option<f32>,
}

#[derive(Debug, Clone)]
pub enum SlideBody {
    Flow(Vec<Block>),
    Grid {
        layout: GridLayout,
        cells: Vec<Vec<Block>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Paragraph {
        inlines: Vec<Inline>,
    },
    List {
        ordered: bool,
        start: usize,
        items: Vec<ListItem>,
    },
    Image {
        alt: String,
        path: String,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    BlockQuote {
        inlines: Vec<Inline>,
    },
    Table {
        headers: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    HorizontalRule,
}

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Link { text: Vec<Inline>, url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub inlines: Vec<Inline>,
    pub children: Vec<ListItem>,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }
}

impl Slide {
    /// Every block of the slide, grid cells flattened in order.
    pub fn blocks(&self) -> Box<dyn Iterator<Item = &Block> + '_> {
        match &self.body {
            SlideBody::Flow(blocks) => Box::new(blocks.iter()),
            SlideBody::Grid { cells, .. } => Box::new(cells.iter().flatten()),
        }
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.body, SlideBody::Grid { .. })
    }

    pub fn auto_advance(&self) -> Option<Duration> {
        self.time_to_next
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f32)
    }

    /// Plain text of the slide, whitespace collapsed. Used as the window title.
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        for block in self.blocks() {
            block_text(block, &mut parts);
        }
        parts
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text of the first heading, falling back to the slide's text.
    pub fn headline(&self) -> String {
        self.blocks()
            .find_map(|b| match b {
                Block::Heading { inlines, .. } => Some(inline::plain_text(inlines)),
                _ => None,
            })
            .unwrap_or_else(|| self.text_content())
    }
}

fn block_text(block: &Block, out: &mut Vec<String>) {
    match block {
        Block::Heading { inlines, .. }
        | Block::Paragraph { inlines }
        | Block::BlockQuote { inlines } => out.push(inline::plain_text(inlines)),
        Block::List { items, .. } => list_text(items, out),
        Block::Image { alt, .. } => out.push(alt.clone()),
        Block::CodeBlock { code, .. } => out.push(code.clone()),
        Block::Table { headers, rows } => {
            for cell in headers.iter().chain(rows.iter().flatten()) {
                out.push(inline::plain_text(cell));
            }
        }
        Block::HorizontalRule => {}
    }
}

fn list_text(items: &[ListItem], out: &mut Vec<String>) {
    for item in items {
        out.push(inline::plain_text(&item.inlines));
        list_text(&item.children, out);
    }
}

/// Build the slide list from a markdown deck.
///
/// Slides whose content is empty once metadata and notes are removed are
/// skipped, so indices stay dense.
pub fn build(content: &str) -> Deck {
    let content = content.replace("\r\n", "\n");
    let (mut meta, body) = frontmatter::extract(&content);

    let mut slides: Vec<Slide> = Vec::new();
    for raw in splitter::split(&body) {
        if let Some(slide) = build_slide(&raw, slides.len(), &meta) {
            slides.push(slide);
        }
    }

    if meta.title.is_none() {
        meta.title = first_heading(&slides);
    }

    log::debug!("built deck with {} slides", slides.len());
    Deck { meta, slides }
}

fn build_slide(raw: &str, index: usize, meta: &DeckMeta) -> Option<Slide> {
    let (slide_meta, content) = metadata::extract(raw);
    let (notes, content) = notes::extract(&content);
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    let body = match slide_meta.layout.as_deref().and_then(GridLayout::parse) {
        Some(layout) => SlideBody::Grid {
            layout,
            cells: splitter::split_cells(content)
                .iter()
                .map(|cell| blocks::parse(cell))
                .collect(),
        },
        None => SlideBody::Flow(blocks::parse(content)),
    };

    let time_to_next = slide_meta
        .time_to_next
        .filter(|secs| *secs > 0.0)
        .or(meta.time_to_next.filter(|secs| *secs > 0.0));

    Some(Slide {
        index,
        body,
        notes,
        body_class: slide_meta.body_class,
        body_style: slide_meta.body_style,
        time_to_next,
    })
}

fn first_heading(slides: &[Slide]) -> Option<String> {
    slides.iter().flat_map(|s| s.blocks()).find_map(|b| match b {
        Block::Heading { level: 1, inlines } => Some(inline::plain_text(inlines)),
        _ => None,
    })
}
