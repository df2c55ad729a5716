use crate::model::{Guide, ImageInfo, StyleKind};

pub const HEADING_DESCRIPTION: &str = "Descripción";
pub const HEADING_PROCEDURE: &str = "Procedimiento";
pub const HEADING_NORMS: &str = "Normas Aplicables";
pub const HEADING_ILLUSTRATION: &str = "Ilustración de Referencia";
pub const HEADING_SOURCES: &str = "Fuentes";

/// A layout-stage unit. The section renderer emits these in reading order;
/// the layout engine places them without reordering.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Heading {
        text: String,
        style: StyleKind,
        centered: bool,
    },
    Paragraph {
        text: String,
    },
    /// A bulleted item. `split` is the byte boundary between the emphasized
    /// lead-in (colon included) and the plain remainder. Overflow
    /// continuations keep the list indent but carry no marker.
    ListItem {
        text: String,
        split: Option<usize>,
        continuation: bool,
    },
    Image {
        data: Vec<u8>,
        info: ImageInfo,
    },
    Link {
        text: String,
        uri: String,
    },
}

/// A run of text with one weight. List items decompose into an emphasized
/// lead-in and a plain remainder sharing the same line start.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub emphasized: bool,
}

impl Block {
    /// The styled runs an emitter renders for this block. Measurement and
    /// wrapping always operate on the concatenated text, not on the runs.
    pub fn runs(&self) -> Vec<StyledRun> {
        match self {
            Block::Heading { text, .. } => vec![StyledRun {
                text: text.clone(),
                emphasized: true,
            }],
            Block::Paragraph { text } => vec![StyledRun {
                text: text.clone(),
                emphasized: false,
            }],
            Block::ListItem {
                text,
                split: Some(split),
                ..
            } => vec![
                StyledRun {
                    text: text[..*split].to_string(),
                    emphasized: true,
                },
                StyledRun {
                    text: text[*split..].to_string(),
                    emphasized: false,
                },
            ],
            Block::ListItem { text, .. } => vec![StyledRun {
                text: text.clone(),
                emphasized: false,
            }],
            Block::Image { .. } => Vec::new(),
            Block::Link { text, .. } => vec![StyledRun {
                text: text.clone(),
                emphasized: false,
            }],
        }
    }

    fn heading(text: impl Into<String>) -> Self {
        Block::Heading {
            text: text.into(),
            style: StyleKind::Heading,
            centered: false,
        }
    }

    fn item(text: String, split: Option<usize>) -> Self {
        Block::ListItem {
            text,
            split,
            continuation: false,
        }
    }
}

/// Decompose a guide into the ordered block sequence both emitters will
/// see. Sections with no items never emit their heading; an errored
/// illustration drops its whole section.
pub fn render_sections(guide: &Guide) -> Vec<Block> {
    let mut blocks = Vec::new();

    blocks.push(Block::Heading {
        text: guide.title.to_uppercase(),
        style: StyleKind::Title,
        centered: true,
    });

    if !guide.description.trim().is_empty() {
        blocks.push(Block::heading(HEADING_DESCRIPTION));
        blocks.push(Block::Paragraph {
            text: guide.description.clone(),
        });
    }

    if !guide.steps.is_empty() {
        blocks.push(Block::heading(HEADING_PROCEDURE));
        for step in &guide.steps {
            blocks.push(Block::item(step.text.clone(), step.split_index()));
        }
    }

    if !guide.norms.is_empty() {
        blocks.push(Block::heading(HEADING_NORMS));
        for norm in &guide.norms {
            // The name is always the emphasized lead-in; no detection needed
            let text = format!("{}: {}", norm.name, norm.description);
            blocks.push(Block::item(text, Some(norm.name.len() + 1)));
        }
    }

    if let Some(illo) = &guide.illustration
        && let Some(info) = illo.info()
    {
        blocks.push(Block::heading(HEADING_ILLUSTRATION));
        blocks.push(Block::Image {
            data: illo.data().to_vec(),
            info,
        });
    }

    if !guide.sources.is_empty() {
        blocks.push(Block::heading(HEADING_SOURCES));
        for source in &guide.sources {
            blocks.push(Block::Link {
                text: source.display_text().to_string(),
                uri: source.uri.clone(),
            });
        }
    }

    blocks
}
