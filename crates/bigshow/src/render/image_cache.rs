use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use eframe::egui::{self, TextureHandle, TextureOptions};

/// Slide images, loaded on first use relative to the deck's directory.
/// Failures are remembered so a missing file is reported once.
pub struct ImageCache {
    base_path: PathBuf,
    textures: RefCell<HashMap<String, Option<TextureHandle>>>,
}

impl ImageCache {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            textures: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_or_load(&self, ctx: &egui::Context, path: &str) -> Option<TextureHandle> {
        if let Some(existing) = self.textures.borrow().get(path) {
            return existing.clone();
        }
        let texture = self.resolve(path).and_then(|full| {
            load_color_image(&full)
                .map(|image| ctx.load_texture(format!("slide://{path}"), image, TextureOptions::LINEAR))
        });
        self.textures.borrow_mut().insert(path.to_string(), texture.clone());
        texture
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        if is_remote(path) {
            log::debug!("not loading remote image {path}");
            return None;
        }
        let candidate = Path::new(path);
        Some(if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_path.join(candidate)
        })
    }

    pub fn clear(&self) {
        self.textures.borrow_mut().clear();
    }
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("data:")
}

fn load_color_image(path: &Path) -> Option<egui::ColorImage> {
    let img = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::warn!("could not load image {}: {e}", path.display());
            return None;
        }
    };
    let size = [
        usize::try_from(img.width()).ok()?,
        usize::try_from(img.height()).ok()?,
    ];
    Some(egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_paths_are_not_resolved() {
        let cache = ImageCache::new(PathBuf::from("/decks"));
        assert_eq!(cache.resolve("https://example.com/a.png"), None);
        assert_eq!(cache.resolve("img/a.png"), Some(PathBuf::from("/decks/img/a.png")));
    }

    #[test]
    fn test_load_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        let loaded = load_color_image(&path).unwrap();
        assert_eq!(loaded.size, [3, 2]);
        assert!(load_color_image(&dir.path().join("missing.png")).is_none());
    }

    #[test]
    fn test_missing_image_is_cached_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(dir.path().to_path_buf());
        let ctx = egui::Context::default();
        assert!(cache.get_or_load(&ctx, "nope.png").is_none());
        assert_eq!(cache.textures.borrow().len(), 1);
    }
}
