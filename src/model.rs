use std::sync::OnceLock;

use crate::error::Error;

/// Points per millimetre. Layout runs in PDF points; the public geometry
/// constructors accept millimetres because the reference page profile
/// (US Letter, 25.4 mm margins) is specified that way.
pub const MM: f32 = 72.0 / 25.4;

/// A completed content record for one guide. Constructed once per retrieval,
/// read-only afterward. The title is non-empty by construction: it is the
/// trimmed query that produced the record.
#[derive(Debug)]
pub struct Guide {
    pub title: String,
    pub description: String,
    pub steps: Vec<Step>,
    pub norms: Vec<Norm>,
    pub illustration: Option<Illustration>,
    pub sources: Vec<Source>,
}

/// One procedure step. The first colon, if any, separates an emphasized
/// lead-in from the remainder.
#[derive(Debug)]
pub struct Step {
    pub text: String,
}

impl Step {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Byte index just past the first colon, i.e. the boundary between the
    /// emphasized lead-in (colon included) and the plain remainder.
    pub fn split_index(&self) -> Option<usize> {
        self.text.find(':').map(|i| i + 1)
    }
}

/// An applicable norm or regulation. The name is always emphasized.
#[derive(Debug)]
pub struct Norm {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Raw illustration bytes with lazily resolved intrinsic dimensions.
/// Resolution happens at most once per guide; a failed decode flags the
/// illustration as errored and the export omits its section.
#[derive(Debug)]
pub struct Illustration {
    data: Vec<u8>,
    info: OnceLock<Option<ImageInfo>>,
}

impl Illustration {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            info: OnceLock::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Intrinsic format and pixel dimensions, or `None` once decoding has
    /// failed. The probe result is cached.
    pub fn info(&self) -> Option<ImageInfo> {
        *self.info.get_or_init(|| probe_image(&self.data).ok())
    }

    pub fn is_errored(&self) -> bool {
        self.info().is_none()
    }

    /// Like [`info`](Self::info) but surfacing the decode error to callers
    /// that want to report it.
    pub fn probe(&self) -> Result<ImageInfo, Error> {
        match self.info() {
            Some(info) => Ok(info),
            None => Err(probe_image(&self.data)
                .err()
                .unwrap_or_else(|| Error::ImageDecode("probe previously failed".into()))),
        }
    }
}

fn probe_image(data: &[u8]) -> Result<ImageInfo, Error> {
    let reader = image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::ImageDecode(e.to_string()))?;
    let format = match reader.format() {
        Some(image::ImageFormat::Png) => ImageFormat::Png,
        Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        Some(other) => {
            return Err(Error::ImageDecode(format!("unsupported format {other:?}")));
        }
        None => return Err(Error::ImageDecode("unrecognized image data".into())),
    };
    let (pixel_width, pixel_height) = reader
        .into_dimensions()
        .map_err(|e| Error::ImageDecode(e.to_string()))?;
    if pixel_width == 0 || pixel_height == 0 {
        return Err(Error::ImageDecode("zero-sized image".into()));
    }
    Ok(ImageInfo {
        format,
        pixel_width,
        pixel_height,
    })
}

/// A cited source. The title falls back to the uri for display.
#[derive(Debug)]
pub struct Source {
    pub uri: String,
    pub title: Option<String>,
}

impl Source {
    pub fn display_text(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => &self.uri,
        }
    }
}

/// Page dimensions in points. Content width and usable height are derived
/// from a single symmetric margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub fn from_mm(page_width: f32, page_height: f32, margin: f32) -> Self {
        Self {
            page_width: page_width * MM,
            page_height: page_height * MM,
            margin: margin * MM,
        }
    }

    /// US Letter with one-inch margins, the reference export profile.
    pub fn letter() -> Self {
        Self::from_mm(215.9, 279.4, 25.4)
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Title,
    Heading,
    Body,
    Caption,
}

/// Font size in points, line advance in points, and weight for one style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
    pub size: f32,
    pub line_height: f32,
    pub bold: bool,
}

/// Per-style font table plus the fixed spacing constants of the layout.
#[derive(Clone, Debug)]
pub struct StyleSheet {
    pub title: FontSpec,
    pub heading: FontSpec,
    pub body: FontSpec,
    pub caption: FontSpec,
    pub heading_space_before: f32,
    pub heading_space_after: f32,
    pub title_space_after: f32,
    pub list_spacing: f32,
    pub link_spacing: f32,
    pub list_indent: f32,
    pub image_max_height: f32,
}

impl StyleSheet {
    pub fn spec(&self, kind: StyleKind) -> &FontSpec {
        match kind {
            StyleKind::Title => &self.title,
            StyleKind::Heading => &self.heading,
            StyleKind::Body => &self.body,
            StyleKind::Caption => &self.caption,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            title: FontSpec {
                size: 18.0,
                line_height: 8.0 * MM,
                bold: true,
            },
            heading: FontSpec {
                size: 14.0,
                line_height: 7.0 * MM,
                bold: true,
            },
            body: FontSpec {
                size: 11.0,
                line_height: 5.0 * MM,
                bold: false,
            },
            caption: FontSpec {
                size: 9.0,
                line_height: 4.0 * MM,
                bold: false,
            },
            heading_space_before: 8.0 * MM,
            heading_space_after: 5.0 * MM,
            title_space_after: 10.0 * MM,
            list_spacing: 3.0 * MM,
            link_spacing: 2.0 * MM,
            list_indent: 5.0 * MM,
            image_max_height: 100.0 * MM,
        }
    }
}
