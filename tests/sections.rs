mod common;

use guia_export::model::{Illustration, Norm, Source, StyleKind};
use guia_export::sections::{
    Block, HEADING_DESCRIPTION, HEADING_ILLUSTRATION, HEADING_NORMS, HEADING_PROCEDURE,
    HEADING_SOURCES, render_sections,
};

#[test]
fn title_is_uppercased_and_centered() {
    let blocks = render_sections(&common::bare_guide("Muro de ladrillo"));
    match &blocks[0] {
        Block::Heading {
            text,
            style,
            centered,
        } => {
            assert_eq!(text, "MURO DE LADRILLO");
            assert_eq!(*style, StyleKind::Title);
            assert!(centered);
        }
        other => panic!("expected title heading, got {other:?}"),
    }
}

#[test]
fn bare_guide_renders_only_the_title() {
    let blocks = render_sections(&common::bare_guide("Zapata aislada"));
    assert_eq!(blocks.len(), 1);
}

#[test]
fn empty_sections_emit_no_heading() {
    let mut guide = common::bare_guide("Columna");
    guide.description = "   ".to_string();
    let blocks = render_sections(&guide);
    assert!(!blocks.iter().any(
        |b| matches!(b, Block::Heading { text, .. } if text == HEADING_DESCRIPTION)
    ));
}

#[test]
fn sections_appear_in_fixed_order() {
    let blocks = render_sections(&common::sample_guide());
    let heading_order: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading {
                text,
                style: StyleKind::Heading,
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        heading_order,
        vec![
            HEADING_DESCRIPTION,
            HEADING_PROCEDURE,
            HEADING_NORMS,
            HEADING_ILLUSTRATION,
            HEADING_SOURCES,
        ]
    );
}

#[test]
fn step_with_colon_splits_after_it() {
    let blocks = render_sections(&common::sample_guide());
    let item = blocks
        .iter()
        .find_map(|b| match b {
            Block::ListItem {
                text,
                split: Some(s),
                ..
            } if text.starts_with("Cimentación") => Some((text.clone(), *s)),
            _ => None,
        })
        .expect("step with lead-in");
    let (text, split) = item;
    assert!(text[..split].ends_with(':'));
    assert_eq!(&text[split..], " excavar la zanja hasta suelo firme.");
}

#[test]
fn step_without_colon_has_no_split() {
    let blocks = render_sections(&common::sample_guide());
    assert!(blocks.iter().any(|b| matches!(
        b,
        Block::ListItem { text, split: None, .. } if text.starts_with("Colocar")
    )));
}

#[test]
fn norm_text_joins_name_and_description() {
    let mut guide = common::bare_guide("Viga");
    guide.norms = vec![Norm {
        name: "NSR-10".to_string(),
        description: "Título C.".to_string(),
    }];
    let blocks = render_sections(&guide);
    let (text, split) = blocks
        .iter()
        .find_map(|b| match b {
            Block::ListItem { text, split, .. } => Some((text.clone(), *split)),
            _ => None,
        })
        .expect("norm item");
    assert_eq!(text, "NSR-10: Título C.");
    assert_eq!(split, Some("NSR-10".len() + 1));
}

#[test]
fn errored_illustration_drops_its_section() {
    let mut guide = common::bare_guide("Cubierta");
    guide.illustration = Some(Illustration::new(b"not an image".to_vec()));
    let blocks = render_sections(&guide);
    assert!(!blocks.iter().any(
        |b| matches!(b, Block::Heading { text, .. } if text == HEADING_ILLUSTRATION)
    ));
    assert!(!blocks.iter().any(|b| matches!(b, Block::Image { .. })));
}

#[test]
fn valid_illustration_emits_image_with_dimensions() {
    let mut guide = common::bare_guide("Cubierta");
    guide.illustration = Some(Illustration::new(common::png_bytes(320, 240)));
    let blocks = render_sections(&guide);
    let info = blocks
        .iter()
        .find_map(|b| match b {
            Block::Image { info, .. } => Some(*info),
            _ => None,
        })
        .expect("image block");
    assert_eq!((info.pixel_width, info.pixel_height), (320, 240));
}

#[test]
fn image_blocks_compare_by_data_and_dimensions() {
    let png = common::png_bytes(320, 240);
    let build = || {
        let mut guide = common::bare_guide("Cubierta");
        guide.illustration = Some(Illustration::new(png.clone()));
        render_sections(&guide)
    };
    let a = build();
    let b = build();
    let image_a = a.iter().find(|blk| matches!(blk, Block::Image { .. })).expect("image");
    let image_b = b.iter().find(|blk| matches!(blk, Block::Image { .. })).expect("image");
    assert_eq!(image_a, image_b);
}

#[test]
fn source_display_falls_back_to_uri() {
    let mut guide = common::bare_guide("Anclaje");
    guide.sources = vec![Source {
        uri: "https://example.com/doc".to_string(),
        title: None,
    }];
    let blocks = render_sections(&guide);
    assert!(blocks.iter().any(|b| matches!(
        b,
        Block::Link { text, uri } if text == uri && uri == "https://example.com/doc"
    )));
}
