#![allow(dead_code)]

use std::io::Cursor;

use guia_export::model::{Guide, Illustration, Norm, Source, Step};

/// Solid-color PNG of the given pixel size, encoded in memory.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([180, 120, 60, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Single-component grayscale JPEG, encoded in memory.
pub fn grayscale_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(width, height, image::Luma([128]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}

pub fn bare_guide(title: &str) -> Guide {
    Guide {
        title: title.to_string(),
        description: String::new(),
        steps: Vec::new(),
        norms: Vec::new(),
        illustration: None,
        sources: Vec::new(),
    }
}

/// A small guide exercising every section type. Fits on one Letter page.
pub fn sample_guide() -> Guide {
    Guide {
        title: "Muro de ladrillo".to_string(),
        description: "Construcción de un muro portante de ladrillo macizo.".to_string(),
        steps: vec![
            Step::new("Cimentación: excavar la zanja hasta suelo firme."),
            Step::new("Colocar la primera hilada a nivel."),
            Step::new("Mortero: juntas de 1 cm, verificar plomada cada tres hiladas."),
        ],
        norms: vec![Norm {
            name: "NSR-10".to_string(),
            description: "Título D, mampostería estructural.".to_string(),
        }],
        illustration: Some(Illustration::new(png_bytes(400, 300))),
        sources: vec![
            Source {
                uri: "https://example.com/mamposteria".to_string(),
                title: Some("Manual de mampostería".to_string()),
            },
            Source {
                uri: "https://example.com/nsr10".to_string(),
                title: None,
            },
        ],
    }
}

/// A guide long enough to spill over several Letter pages.
pub fn long_guide(step_count: usize) -> Guide {
    let mut guide = bare_guide("Losa de concreto");
    guide.description =
        "Vaciado de una losa maciza de concreto reforzado para entrepiso.".to_string();
    guide.steps = (0..step_count)
        .map(|i| {
            Step::new(format!(
                "Paso {}: verificar el encofrado, revisar el acero de refuerzo y \
                 confirmar los recubrimientos indicados en los planos antes de autorizar \
                 el vaciado del concreto en la zona correspondiente.",
                i + 1
            ))
        })
        .collect();
    guide
}
