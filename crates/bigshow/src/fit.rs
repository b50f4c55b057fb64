//! Coarse-to-fine font size search.
//!
//! A slide is laid out in a fixed box with uniform padding. The search looks
//! for the largest font size, no larger than the box height, at which the
//! content neither scrolls horizontally, nor overflows vertically, nor lets
//! a nested block (a grid cell, a code block) overflow its own box.

/// Candidate decrements, coarse to fine.
pub const STEPS: [f32; 4] = [100.0, 50.0, 10.0, 2.0];

/// Padding as a fraction of the box width.
pub const PADDING_RATIO: f32 = 0.04;

/// The box a slide is fitted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    /// Fixed content height for grid layouts.
    pub grid_height: Option<f32>,
}

impl Frame {
    pub fn new(width: f32, height: f32, grid: bool) -> Self {
        let padding = (width * PADDING_RATIO).min(width);
        Self {
            width,
            height,
            padding,
            grid_height: grid.then(|| (height - 2.0 * padding).max(0.0)),
        }
    }

    pub fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.padding).max(0.0)
    }

    /// Uniformly scaled copy, used to draw a fitted slide at preview size.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
            padding: self.padding * factor,
            grid_height: self.grid_height.map(|h| h * factor),
        }
    }
}

/// What a measurement reports for one candidate size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Intrinsic width including padding; at least the box width.
    pub scroll_width: f32,
    /// Rendered height including padding.
    pub height: f32,
    /// Whether any nested block overflows its own box.
    pub inner_overflow: bool,
}

impl Extent {
    pub fn fits(&self, frame: &Frame) -> bool {
        self.scroll_width <= frame.width && self.height <= frame.height && !self.inner_overflow
    }
}

/// Lays content out at a candidate font size and reports its extent.
pub trait Measure {
    fn measure(&mut self, font_size: f32, frame: &Frame) -> Extent;
}

impl<F> Measure for F
where
    F: FnMut(f32, &Frame) -> Extent,
{
    fn measure(&mut self, font_size: f32, frame: &Frame) -> Extent {
        self(font_size, frame)
    }
}

/// Result of a fit: the box, the chosen font size and how many
/// measurements it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub frame: Frame,
    pub font_size: f32,
    pub probes: usize,
}

impl Fit {
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            frame: self.frame.scaled(factor),
            font_size: self.font_size * factor,
            probes: self.probes,
        }
    }
}

/// Find the font size for content in a `width` x `height` box.
///
/// For each step the scan walks down from the current candidate until
/// something fits, then backs up one step (never past `height`) for the next,
/// finer step. The applied size is the last one measured, so when nothing
/// fits the result degrades to the smallest size reached.
pub fn fit<M: Measure + ?Sized>(measure: &mut M, width: f32, height: f32, grid: bool) -> Fit {
    let frame = Frame::new(width, height, grid);
    let mut font_size = height;
    let mut applied = 0.0;
    let mut probes = 0;

    for step in STEPS {
        while font_size > 0.0 {
            applied = font_size;
            probes += 1;
            if measure.measure(font_size, &frame).fits(&frame) {
                break;
            }
            font_size -= step;
        }
        font_size = (font_size + step).min(height);
    }

    log::trace!("fit {width}x{height} -> {applied}px after {probes} probes");
    Fit {
        frame,
        font_size: applied,
        probes,
    }
}
