mod docx;
mod error;
pub mod fonts;
pub mod layout;
pub mod measure;
pub mod model;
mod pdf;
pub mod retrieval;
pub mod sections;

pub use error::Error;

use std::time::Instant;

use fonts::FontSet;
use layout::Layout;
use measure::FontMeasurer;
use model::{Guide, PageGeometry, StyleSheet};

/// Everything an export needs besides the guide: page geometry, the style
/// table and the font pair used for measurement and embedding.
pub struct ExportConfig {
    pub geometry: PageGeometry,
    pub styles: StyleSheet,
    pub fonts: FontSet,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::letter(),
            styles: StyleSheet::default(),
            fonts: FontSet::builtin(),
        }
    }
}

impl ExportConfig {
    fn measurer(&self) -> FontMeasurer<'_> {
        FontMeasurer::new(&self.fonts)
    }
}

/// Run the section renderer and the layout engine for a guide. Pure given
/// the config; both emitters consume the result unchanged.
pub fn layout_guide(guide: &Guide, config: &ExportConfig) -> Layout {
    let blocks = sections::render_sections(guide);
    let measurer = config.measurer();
    layout::paginate(blocks, &config.geometry, &config.styles, &measurer)
}

pub fn export_pdf(guide: &Guide, config: &ExportConfig) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let layout = layout_guide(guide, config);
    let t_layout = t0.elapsed();

    let measurer = config.measurer();
    let bytes = pdf::render(&layout, &config.geometry, &config.styles, &config.fonts, &measurer)?;
    let t_total = t0.elapsed();

    log::info!(
        "PDF export: layout={:.1}ms, render={:.1}ms, {} pages, {} bytes",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        layout.pages.len(),
        bytes.len(),
    );

    Ok(bytes)
}

pub fn export_docx(guide: &Guide, config: &ExportConfig) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let layout = layout_guide(guide, config);
    let t_layout = t0.elapsed();

    let bytes = docx::render(&layout, &config.geometry, &config.styles)?;
    let t_total = t0.elapsed();

    log::info!(
        "DOCX export: layout={:.1}ms, render={:.1}ms, {} pages, {} bytes",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        layout.pages.len(),
        bytes.len(),
    );

    Ok(bytes)
}

/// Download filename for a guide: `guia-<slug>.<ext>`, where the slug is
/// the lowercased title with whitespace runs collapsed to single hyphens.
pub fn suggested_filename(title: &str, extension: &str) -> String {
    let slug = title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("guia-{slug}.{extension}")
}
