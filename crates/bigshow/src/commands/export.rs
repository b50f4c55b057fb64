use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use eframe::egui;

use crate::appearance::Appearance;
use crate::parser::Deck;
use crate::render::SlideRenderer;
use crate::theme::Theme;

struct ExportApp {
    deck: Deck,
    renderer: SlideRenderer,
    baseline: Appearance,
    output_dir: PathBuf,
    current_slide: usize,
    screenshot_requested: bool,
    failures: Rc<RefCell<Vec<String>>>,
    done: bool,
}

impl ExportApp {
    fn new(
        deck: Deck,
        base_path: &Path,
        output_dir: PathBuf,
        failures: Rc<RefCell<Vec<String>>>,
    ) -> Self {
        let theme_name = deck.meta.theme.as_deref().unwrap_or("dark");
        let theme = Theme::from_name(theme_name).unwrap_or_else(Theme::dark);
        Self {
            deck,
            renderer: SlideRenderer::new(base_path.to_path_buf(), theme),
            baseline: Appearance::default(),
            output_dir,
            current_slide: 0,
            screenshot_requested: false,
            failures,
            done: false,
        }
    }

    fn slide_count(&self) -> usize {
        self.deck.len()
    }
}

impl eframe::App for ExportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.done {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        // The screenshot requested last frame arrives as an event.
        let mut screenshot = None;
        ctx.input(|i| {
            for event in &i.events {
                if let egui::Event::Screenshot { image, .. } = event {
                    screenshot = Some(image.clone());
                }
            }
        });

        if let Some(image) = screenshot {
            let filename = format!("slide-{:02}.png", self.current_slide + 1);
            let path = self.output_dir.join(&filename);
            match save_color_image(&image, &path) {
                Ok(()) => eprintln!("  Saved {filename}"),
                Err(e) => {
                    log::error!("{e}");
                    self.failures.borrow_mut().push(filename);
                }
            }
            self.screenshot_requested = false;
            self.current_slide += 1;
            if self.current_slide >= self.slide_count() {
                self.done = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        }

        let Some(slide) = self.deck.slide(self.current_slide) else {
            self.done = true;
            return;
        };
        let appearance = self.baseline.with_overrides(slide);
        let bg = self.renderer.page_theme(&appearance).background;

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.renderer.draw(ui.painter(), slide, &appearance, rect);
            });

        if !self.screenshot_requested {
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
            self.screenshot_requested = true;
        }

        ctx.request_repaint();
    }
}

fn save_color_image(image: &egui::ColorImage, path: &Path) -> anyhow::Result<()> {
    let width = image.width() as u32;
    let height = image.height() as u32;
    let pixels: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|c| [c.r(), c.g(), c.b(), c.a()])
        .collect();

    image::save_buffer(path, &pixels, width, height, image::ColorType::Rgba8)
        .map_err(|e| anyhow::anyhow!("Failed to save {}: {e}", path.display()))
}

pub fn run(file: PathBuf, output_dir: PathBuf, width: u32, height: u32) -> anyhow::Result<()> {
    let deck = super::load_deck(&file)?;
    let base_path = file
        .parent()
        .unwrap_or(std::path::Path::new("."))
        .to_path_buf();

    std::fs::create_dir_all(&output_dir)?;

    eprintln!(
        "Exporting {} slides to {} ({}x{})",
        deck.len(),
        output_dir.display(),
        width,
        height,
    );

    let title = deck
        .meta
        .title
        .clone()
        .unwrap_or_else(|| "bigshow export".to_string());

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([width as f32, height as f32])
        .with_title(&title)
        .with_decorations(false);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let failures = Rc::new(RefCell::new(Vec::new()));
    let report = failures.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ExportApp::new(
                deck,
                &base_path,
                output_dir,
                report,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    let failures = failures.borrow();
    if !failures.is_empty() {
        anyhow::bail!("Failed to export {}", failures.join(", "));
    }
    eprintln!("Export complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_color_image_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide-01.png");
        let red = [255u8, 0, 0, 255].repeat(8);
        let image = egui::ColorImage::from_rgba_unmultiplied([4, 2], &red);
        save_color_image(&image, &path).unwrap();
        let decoded = image::open(&path).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_save_color_image_reports_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("slide-01.png");
        let image = egui::ColorImage::from_rgba_unmultiplied([1, 1], &[0, 0, 0, 255]);
        assert!(save_color_image(&image, &path).is_err());
    }
}
