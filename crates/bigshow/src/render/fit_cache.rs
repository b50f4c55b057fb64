use std::collections::HashMap;

use crate::fit::Fit;

/// Fits are pure in (slide, box), so each is searched once.
#[derive(Debug, Default)]
pub struct FitCache {
    entries: HashMap<(usize, u32, u32), Fit>,
}

impl FitCache {
    pub fn get_or_insert_with(
        &mut self,
        slide: usize,
        width: f32,
        height: f32,
        compute: impl FnOnce() -> Fit,
    ) -> Fit {
        *self
            .entries
            .entry((slide, width.to_bits(), height.to_bits()))
            .or_insert_with(compute)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{Extent, Frame, fit};

    fn search(width: f32, height: f32, calls: &mut usize) -> Fit {
        *calls += 1;
        let mut measure = |size: f32, frame: &Frame| Extent {
            scroll_width: frame.width,
            height: size + 2.0 * frame.padding,
            inner_overflow: false,
        };
        fit(&mut measure, width, height, false)
    }

    #[test]
    fn test_fit_is_computed_once_per_box() {
        let mut cache = FitCache::default();
        let mut calls = 0;
        let a = cache.get_or_insert_with(0, 800.0, 500.0, || search(800.0, 500.0, &mut calls));
        let b = cache.get_or_insert_with(0, 800.0, 500.0, || search(800.0, 500.0, &mut calls));
        assert_eq!(a, b);
        assert_eq!(calls, 1);

        cache.get_or_insert_with(0, 512.0, 320.0, || search(512.0, 320.0, &mut calls));
        cache.get_or_insert_with(1, 800.0, 500.0, || search(800.0, 500.0, &mut calls));
        assert_eq!(calls, 3);
        assert_eq!(cache.len(), 3);

        cache.clear();
        assert!(cache.is_empty());
    }
}
