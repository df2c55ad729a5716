mod common;

use guia_export::layout::{paginate, scaled_image_size};
use guia_export::measure::TextMeasurer;
use guia_export::model::{
    FontSpec, ImageFormat, ImageInfo, PageGeometry, StyleKind, StyleSheet,
};
use guia_export::sections::Block;
use guia_export::{ExportConfig, layout_guide};

/// One point per character, any style. Makes line counts exact.
struct FixedMeasurer;

impl TextMeasurer for FixedMeasurer {
    fn width(&self, text: &str, _spec: &FontSpec) -> f32 {
        text.chars().count() as f32
    }
}

/// 80 pt content width, 100 pt usable height, round line heights.
fn test_geometry() -> PageGeometry {
    PageGeometry {
        page_width: 100.0,
        page_height: 120.0,
        margin: 10.0,
    }
}

fn test_styles() -> StyleSheet {
    StyleSheet {
        title: FontSpec {
            size: 18.0,
            line_height: 14.0,
            bold: true,
        },
        heading: FontSpec {
            size: 14.0,
            line_height: 12.0,
            bold: true,
        },
        body: FontSpec {
            size: 11.0,
            line_height: 10.0,
            bold: false,
        },
        caption: FontSpec {
            size: 9.0,
            line_height: 8.0,
            bold: false,
        },
        heading_space_before: 5.0,
        heading_space_after: 5.0,
        title_space_after: 5.0,
        list_spacing: 2.0,
        link_spacing: 2.0,
        list_indent: 5.0,
        image_max_height: 50.0,
    }
}

fn paragraph_of_lines(n: usize) -> Block {
    // 70-char words: exactly one word per 80 pt line
    let word = "a".repeat(70);
    Block::Paragraph {
        text: vec![word; n].join(" "),
    }
}

fn heading(text: &str) -> Block {
    Block::Heading {
        text: text.to_string(),
        style: StyleKind::Heading,
        centered: false,
    }
}

#[test]
fn every_block_stays_inside_the_usable_area() {
    let layout = layout_guide(&common::long_guide(40), &ExportConfig::default());
    let usable = PageGeometry::letter().usable_height();
    assert!(layout.pages.len() > 1);
    for page in &layout.pages {
        for placed in &page.placed {
            assert!(placed.y >= 0.0);
            assert!(
                placed.y + placed.height <= usable + 1e-3,
                "page {} block exceeds usable height: y={} h={}",
                page.index,
                placed.y,
                placed.height
            );
        }
    }
}

#[test]
fn blocks_keep_reading_order_within_pages() {
    let layout = layout_guide(&common::long_guide(25), &ExportConfig::default());
    for page in &layout.pages {
        let mut prev_y = -1.0f32;
        for placed in &page.placed {
            assert!(placed.y > prev_y);
            prev_y = placed.y;
        }
        assert!(!page.placed.is_empty());
    }
}

#[test]
fn no_page_ends_with_a_section_heading() {
    let layout = layout_guide(&common::long_guide(40), &ExportConfig::default());
    let n = layout.pages.len();
    for page in &layout.pages[..n - 1] {
        let last = page.placed.last().expect("non-empty page");
        assert!(
            !matches!(
                &last.block,
                Block::Heading {
                    style: StyleKind::Heading,
                    ..
                }
            ),
            "page {} ends with a heading",
            page.index
        );
    }
}

#[test]
fn layout_is_deterministic() {
    let guide = common::long_guide(30);
    let config = ExportConfig::default();
    let a = layout_guide(&guide, &config);
    let b = layout_guide(&guide, &config);
    assert_eq!(format!("{a:?}"), format!("{b:?}"));
}

#[test]
fn guide_without_illustration_fits_one_page() {
    let mut guide = common::sample_guide();
    guide.illustration = None;
    let layout = layout_guide(&guide, &ExportConfig::default());
    assert_eq!(layout.pages.len(), 1);
}

#[test]
fn bare_guide_still_yields_one_page() {
    let layout = layout_guide(&common::bare_guide("Murete"), &ExportConfig::default());
    assert_eq!(layout.pages.len(), 1);
    assert_eq!(layout.pages[0].placed.len(), 1);
}

#[test]
fn heading_near_page_bottom_moves_to_next_page() {
    let blocks = vec![paragraph_of_lines(8), heading("Normas"), paragraph_of_lines(1)];
    let layout = paginate(blocks, &test_geometry(), &test_styles(), &FixedMeasurer);

    assert_eq!(layout.pages.len(), 2);
    assert!(matches!(
        layout.pages[0].placed.last().map(|p| &p.block),
        Some(Block::Paragraph { .. })
    ));
    let second = &layout.pages[1].placed;
    assert!(matches!(second[0].block, Block::Heading { .. }));
    assert_eq!(second[0].y, 0.0);
    // heading (12) + space after (5)
    assert_eq!(second[1].y, 17.0);
}

#[test]
fn heading_that_fits_with_one_line_stays_put() {
    let blocks = vec![paragraph_of_lines(5), heading("Normas"), paragraph_of_lines(1)];
    let layout = paginate(blocks, &test_geometry(), &test_styles(), &FixedMeasurer);

    assert_eq!(layout.pages.len(), 1);
    // paragraph (50) + space before (5)
    assert_eq!(layout.pages[0].placed[1].y, 55.0);
}

#[test]
fn deferred_block_carries_its_heading_along() {
    let blocks = vec![paragraph_of_lines(7), heading("Normas"), paragraph_of_lines(3)];
    let layout = paginate(blocks, &test_geometry(), &test_styles(), &FixedMeasurer);

    assert_eq!(layout.pages.len(), 2);
    assert_eq!(layout.pages[0].placed.len(), 1);
    let second = &layout.pages[1].placed;
    assert!(matches!(second[0].block, Block::Heading { .. }));
    assert!(matches!(second[1].block, Block::Paragraph { .. }));
}

#[test]
fn block_taller_than_a_page_splits_without_losing_words() {
    let original = paragraph_of_lines(15);
    let Block::Paragraph { text: source } = original.clone() else {
        unreachable!()
    };
    let layout = paginate(vec![original], &test_geometry(), &test_styles(), &FixedMeasurer);

    assert_eq!(layout.pages.len(), 2);
    assert_eq!(layout.pages[0].placed[0].height, 100.0);
    assert_eq!(layout.pages[1].placed[0].height, 50.0);

    let mut recovered: Vec<String> = Vec::new();
    for placed in layout.placed() {
        if let Block::Paragraph { text } = &placed.block {
            recovered.extend(text.split_whitespace().map(str::to_string));
        }
    }
    let expected: Vec<String> = source.split_whitespace().map(str::to_string).collect();
    assert_eq!(recovered, expected);
}

#[test]
fn overflowing_list_item_keeps_marker_only_on_first_chunk() {
    let word = "a".repeat(70);
    let text = format!("Detalle: {}", vec![word; 14].join(" "));
    let blocks = vec![Block::ListItem {
        text,
        split: Some("Detalle:".len()),
        continuation: false,
    }];
    let layout = paginate(blocks, &test_geometry(), &test_styles(), &FixedMeasurer);

    assert!(layout.pages.len() > 1);
    let items: Vec<&Block> = layout.placed().map(|p| &p.block).collect();
    assert!(matches!(
        items[0],
        Block::ListItem {
            continuation: false,
            split: Some(_),
            ..
        }
    ));
    for item in &items[1..] {
        assert!(matches!(
            item,
            Block::ListItem {
                continuation: true,
                split: None,
                ..
            }
        ));
    }
}

#[test]
fn image_that_does_not_fit_moves_whole_to_next_page() {
    let info = ImageInfo {
        format: ImageFormat::Png,
        pixel_width: 100,
        pixel_height: 100,
    };
    let blocks = vec![
        paragraph_of_lines(6),
        Block::Image {
            data: Vec::new(),
            info,
        },
    ];
    let layout = paginate(blocks, &test_geometry(), &test_styles(), &FixedMeasurer);

    assert_eq!(layout.pages.len(), 2);
    let placed = &layout.pages[1].placed[0];
    assert!(matches!(placed.block, Block::Image { .. }));
    assert_eq!(placed.y, 0.0);
    assert_eq!(placed.height, 50.0);
}

#[test]
fn image_scaling_preserves_aspect_ratio() {
    let tall = ImageInfo {
        format: ImageFormat::Jpeg,
        pixel_width: 600,
        pixel_height: 1200,
    };
    let (w, h) = scaled_image_size(&tall, 468.0, 283.5);
    assert!((h - 283.5).abs() < 1e-3);
    assert!((w / h - 0.5).abs() < 1e-6);

    let wide = ImageInfo {
        format: ImageFormat::Jpeg,
        pixel_width: 3000,
        pixel_height: 500,
    };
    let (w, h) = scaled_image_size(&wide, 468.0, 283.5);
    assert!((w - 468.0).abs() < 1e-3);
    assert!((w / h - 6.0).abs() < 1e-5);
}

#[test]
fn excavation_guide_fits_one_page() {
    let mut guide = common::bare_guide("excavación");
    guide.steps = vec![guia_export::model::Step::new(
        "Preparación del Terreno: Limpieza y nivelación del área de trabajo.",
    )];
    guide.norms = vec![guia_export::model::Norm {
        name: "IBC".to_string(),
        description: "Requisitos generales de excavación.".to_string(),
    }];
    let config = ExportConfig {
        geometry: PageGeometry::from_mm(216.0, 279.0, 25.0),
        ..ExportConfig::default()
    };
    let layout = layout_guide(&guide, &config);

    assert_eq!(layout.pages.len(), 1);
    let headings: Vec<String> = layout
        .placed()
        .filter_map(|p| match &p.block {
            Block::Heading { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(headings, vec!["EXCAVACIÓN", "Procedimiento", "Normas Aplicables"]);
    let items = layout
        .placed()
        .filter(|p| matches!(p.block, Block::ListItem { .. }))
        .count();
    assert_eq!(items, 2);
}

#[test]
fn list_item_count_matches_input_steps() {
    let guide = common::long_guide(25);
    let layout = layout_guide(&guide, &ExportConfig::default());
    let items = layout
        .placed()
        .filter(|p| {
            matches!(
                p.block,
                Block::ListItem {
                    continuation: false,
                    ..
                }
            )
        })
        .count();
    assert_eq!(items, guide.steps.len());
}

#[test]
fn letter_geometry_in_points() {
    let geom = PageGeometry::letter();
    assert!((geom.page_width - 612.0).abs() < 0.1);
    assert!((geom.page_height - 792.0).abs() < 0.1);
    assert!((geom.content_width() - 468.0).abs() < 0.1);
}
