use std::collections::{BTreeSet, HashMap};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{FontSet, PdfFont, register_pdf_font};
use crate::layout::{Layout, scaled_image_size};
use crate::measure::TextMeasurer;
use crate::model::{FontSpec, ImageFormat, PageGeometry, StyleSheet};
use crate::sections::Block;

const LIST_MARKER: &str = "•";
const LINK_COLOR: [u8; 3] = [0, 0, 255];

struct LinkAnnotation {
    rect: Rect,
    url: String,
}

/// Serialize a layout into PDF bytes. Consumes absolute coordinates from
/// the placed blocks; text is re-wrapped with the same measurer the layout
/// pass used, so break points are identical by construction.
pub(crate) fn render(
    layout: &Layout,
    geom: &PageGeometry,
    styles: &StyleSheet,
    fonts: &FontSet,
    measurer: &dyn TextMeasurer,
) -> Result<Vec<u8>, Error> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: fonts. One regular and one bold face cover every style.
    let (regular_chars, bold_chars) = collect_used_chars(layout, styles);
    let regular = register_pdf_font(
        &mut pdf,
        &fonts.regular,
        false,
        "F1".to_string(),
        &mut alloc,
        &regular_chars,
    );
    let bold = register_pdf_font(
        &mut pdf,
        &fonts.bold,
        true,
        "F2".to_string(),
        &mut alloc,
        &bold_chars,
    );

    // Phase 1b: image XObjects, keyed by (page index, slot index)
    let mut image_names: HashMap<(usize, usize), String> = HashMap::new();
    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    for page in &layout.pages {
        for (slot, placed) in page.placed.iter().enumerate() {
            if let Block::Image { data, info } = &placed.block {
                let pdf_name = format!("Im{}", image_xobjects.len() + 1);
                let xobj_ref = embed_image(&mut pdf, data, info.format, &mut alloc)?;
                image_xobjects.push((pdf_name.clone(), xobj_ref));
                image_names.insert((page.index, slot), pdf_name);
            }
        }
    }

    // Phase 2: one content stream per page
    let mut all_contents: Vec<Content> = Vec::new();
    let mut all_page_links: Vec<Vec<LinkAnnotation>> = Vec::new();
    for page in &layout.pages {
        let mut content = Content::new();
        let mut links: Vec<LinkAnnotation> = Vec::new();
        for (slot, placed) in page.placed.iter().enumerate() {
            let block_top = geom.page_height - geom.margin - placed.y;
            match &placed.block {
                Block::Heading { text, style, centered } => {
                    let spec = styles.spec(*style);
                    let lines = measurer.wrap(text, geom.content_width(), spec);
                    draw_heading_lines(
                        &mut content, &lines, spec, *centered, block_top, geom, fonts, &bold,
                        measurer,
                    );
                }
                Block::Paragraph { text } => {
                    let lines = measurer.wrap(text, geom.content_width(), &styles.body);
                    draw_plain_lines(
                        &mut content,
                        &lines,
                        &styles.body,
                        geom.margin,
                        block_top,
                        fonts,
                        &regular,
                    );
                }
                Block::ListItem {
                    text,
                    split,
                    continuation,
                } => {
                    draw_list_item(
                        &mut content,
                        text,
                        *split,
                        *continuation,
                        block_top,
                        geom,
                        styles,
                        fonts,
                        &regular,
                        &bold,
                        measurer,
                    );
                }
                Block::Link { text, uri } => {
                    draw_link(
                        &mut content,
                        &mut links,
                        text,
                        uri,
                        block_top,
                        geom,
                        styles,
                        fonts,
                        &regular,
                        measurer,
                    );
                }
                Block::Image { info, .. } => {
                    if let Some(pdf_name) = image_names.get(&(page.index, slot)) {
                        let (w, h) =
                            scaled_image_size(info, geom.content_width(), styles.image_max_height);
                        let x = (geom.page_width - w) / 2.0;
                        let bottom = block_top - h;
                        content.save_state();
                        content.transform([w, 0.0, 0.0, h, x, bottom]);
                        content.x_object(Name(pdf_name.as_bytes()));
                        content.restore_state();
                    }
                }
            }
        }
        all_contents.push(content);
        all_page_links.push(links);
    }

    // Phase 3: page tree, annotations, resources
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let page_annot_refs: Vec<Vec<Ref>> = all_page_links
        .iter()
        .map(|links| {
            links
                .iter()
                .map(|link| {
                    let annot_ref = alloc();
                    let mut annot = pdf.annotation(annot_ref);
                    annot
                        .subtype(pdf_writer::types::AnnotationType::Link)
                        .rect(link.rect)
                        .border(0.0, 0.0, 0.0, None);
                    annot
                        .action()
                        .action_type(pdf_writer::types::ActionType::Uri)
                        .uri(Str(link.url.as_bytes()));
                    annot_ref
                })
                .collect()
        })
        .collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geom.page_width, geom.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !page_annot_refs[i].is_empty() {
            page.annotations(page_annot_refs[i].iter().copied());
        }
        let mut resources = page.resources();
        {
            let mut font_res = resources.fonts();
            font_res.pair(Name(regular.pdf_name.as_bytes()), regular.font_ref);
            font_res.pair(Name(bold.pdf_name.as_bytes()), bold.font_ref);
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    Ok(pdf.finish())
}

/// Characters each font weight must cover, in sorted order so subsetting
/// is reproducible.
fn collect_used_chars(layout: &Layout, styles: &StyleSheet) -> (BTreeSet<char>, BTreeSet<char>) {
    let mut regular: BTreeSet<char> = BTreeSet::new();
    let mut bold: BTreeSet<char> = BTreeSet::new();
    for placed in layout.placed() {
        let spec_bold = match &placed.block {
            Block::Heading { style, .. } => styles.spec(*style).bold,
            _ => false,
        };
        for run in placed.block.runs() {
            let set = if run.emphasized || spec_bold {
                &mut bold
            } else {
                &mut regular
            };
            set.extend(run.text.chars());
        }
        if matches!(&placed.block, Block::ListItem { continuation: false, .. }) {
            regular.extend(LIST_MARKER.chars());
        }
    }
    regular.insert(' ');
    bold.insert(' ');
    (regular, bold)
}

fn show_text(content: &mut Content, font: &PdfFont, size: f32, x: f32, baseline: f32, text: &str) {
    content
        .begin_text()
        .set_font(Name(font.pdf_name.as_bytes()), size)
        .next_line(x, baseline)
        .show(Str(&font.encode(text)))
        .end_text();
}

fn draw_heading_lines(
    content: &mut Content,
    lines: &[String],
    spec: &FontSpec,
    centered: bool,
    block_top: f32,
    geom: &PageGeometry,
    fonts: &FontSet,
    bold: &PdfFont,
    measurer: &dyn TextMeasurer,
) {
    let ascender = fonts.face(true).ascender_ratio();
    for (i, line) in lines.iter().enumerate() {
        let baseline = block_top - spec.size * ascender - i as f32 * spec.line_height;
        let x = if centered {
            geom.margin + (geom.content_width() - measurer.width(line, spec)) / 2.0
        } else {
            geom.margin
        };
        show_text(content, bold, spec.size, x, baseline, line);
    }
}

fn draw_plain_lines(
    content: &mut Content,
    lines: &[String],
    spec: &FontSpec,
    x: f32,
    block_top: f32,
    fonts: &FontSet,
    font: &PdfFont,
) {
    let ascender = fonts.face(spec.bold).ascender_ratio();
    for (i, line) in lines.iter().enumerate() {
        let baseline = block_top - spec.size * ascender - i as f32 * spec.line_height;
        show_text(content, font, spec.size, x, baseline, line);
    }
}

/// Render a list item: marker in the indent, emphasized lead-in and plain
/// remainder sharing the first line start. Break points come from wrapping
/// the concatenated text, exactly as the layout pass measured it.
#[allow(clippy::too_many_arguments)]
fn draw_list_item(
    content: &mut Content,
    text: &str,
    split: Option<usize>,
    continuation: bool,
    block_top: f32,
    geom: &PageGeometry,
    styles: &StyleSheet,
    fonts: &FontSet,
    regular: &PdfFont,
    bold: &PdfFont,
    measurer: &dyn TextMeasurer,
) {
    let spec = styles.body;
    let bold_spec = FontSpec { bold: true, ..spec };
    let wrap_width = geom.content_width() - styles.list_indent;
    let lines = measurer.wrap(text, wrap_width, &spec);
    let text_x = geom.margin + styles.list_indent;
    let ascender = fonts.face(false).ascender_ratio();

    if !continuation {
        let baseline = block_top - spec.size * ascender;
        show_text(content, regular, spec.size, geom.margin, baseline, LIST_MARKER);
    }

    // Emphasis boundary expressed in whitespace-normalized characters, so
    // it can be walked across the wrapped lines.
    let mut bold_left = split.map(|s| normalized_char_len(&text[..s])).unwrap_or(0);
    for (i, line) in lines.iter().enumerate() {
        let baseline = block_top - spec.size * ascender - i as f32 * spec.line_height;
        let line_chars = line.chars().count();
        let take = bold_left.min(line_chars);
        if take == 0 {
            show_text(content, regular, spec.size, text_x, baseline, line);
        } else {
            let boundary = line
                .char_indices()
                .nth(take)
                .map(|(b, _)| b)
                .unwrap_or(line.len());
            let (lead, rest) = line.split_at(boundary);
            show_text(content, bold, spec.size, text_x, baseline, lead);
            if !rest.is_empty() {
                let lead_w = measurer.width(lead, &bold_spec);
                show_text(content, regular, spec.size, text_x + lead_w, baseline, rest);
            }
        }
        // crossing a line boundary consumes the collapsed space
        bold_left = bold_left.saturating_sub(line_chars + 1);
    }
}

/// Character count of `text` after collapsing whitespace runs to single
/// spaces — the form the wrapper produces.
fn normalized_char_len(text: &str) -> usize {
    let mut len = 0usize;
    let mut first = true;
    for word in text.split_whitespace() {
        if !first {
            len += 1;
        }
        len += word.chars().count();
        first = false;
    }
    len
}

#[allow(clippy::too_many_arguments)]
fn draw_link(
    content: &mut Content,
    links: &mut Vec<LinkAnnotation>,
    text: &str,
    uri: &str,
    block_top: f32,
    geom: &PageGeometry,
    styles: &StyleSheet,
    fonts: &FontSet,
    regular: &PdfFont,
    measurer: &dyn TextMeasurer,
) {
    let spec = styles.caption;
    let lines = measurer.wrap(text, geom.content_width(), &spec);
    let ascender = fonts.face(false).ascender_ratio();
    let [r, g, b] = LINK_COLOR;
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    for (i, line) in lines.iter().enumerate() {
        let baseline = block_top - spec.size * ascender - i as f32 * spec.line_height;
        show_text(content, regular, spec.size, geom.margin, baseline, line);
        let line_w = measurer.width(line, &spec);
        links.push(LinkAnnotation {
            rect: Rect::new(
                geom.margin,
                baseline - spec.size * 0.2,
                geom.margin + line_w,
                baseline + spec.size * 0.8,
            ),
            url: uri.to_string(),
        });
    }
    content.set_fill_gray(0.0);
}

/// Component count from the first start-of-frame segment of a JPEG stream:
/// 1 for grayscale, 3 for YCbCr/RGB, 4 for CMYK/YCCK. `None` when no SOF
/// marker is found.
fn jpeg_component_count(data: &[u8]) -> Option<u8> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut pos = 2usize;
    while pos + 3 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // fill bytes and standalone markers carry no length field
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if (0xD0..=0xD9).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        match marker {
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                // SOF payload: precision (1), height (2), width (2), components (1)
                return data.get(pos + 9).copied();
            }
            0xDA => return None, // start of scan without a preceding SOF
            _ => pos += 2 + len,
        }
    }
    None
}

/// Embed one image as an XObject: JPEG passes through with DctDecode when
/// its components match a device colorspace, PNG is decoded to RGB (plus an
/// SMask when it carries alpha) and deflated.
fn embed_image(
    pdf: &mut Pdf,
    data: &[u8],
    format: ImageFormat,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<Ref, Error> {
    let xobj_ref = alloc();
    match format {
        ImageFormat::Jpeg => {
            let (w, h) = image::ImageReader::new(std::io::Cursor::new(data))
                .with_guessed_format()
                .map_err(|e| Error::Emitter(e.to_string()))?
                .into_dimensions()
                .map_err(|e| Error::Emitter(e.to_string()))?;
            // DCT pass-through is only valid when the declared colorspace
            // matches the stream's component count; CMYK and other exotic
            // variants get transcoded instead.
            match jpeg_component_count(data) {
                Some(1) => {
                    let mut xobj = pdf.image_xobject(xobj_ref, data);
                    xobj.filter(Filter::DctDecode);
                    xobj.width(w as i32);
                    xobj.height(h as i32);
                    xobj.color_space().device_gray();
                    xobj.bits_per_component(8);
                }
                Some(3) => {
                    let mut xobj = pdf.image_xobject(xobj_ref, data);
                    xobj.filter(Filter::DctDecode);
                    xobj.width(w as i32);
                    xobj.height(h as i32);
                    xobj.color_space().device_rgb();
                    xobj.bits_per_component(8);
                }
                _ => {
                    let reader = image::ImageReader::with_format(
                        std::io::BufReader::new(std::io::Cursor::new(data)),
                        image::ImageFormat::Jpeg,
                    );
                    let decoded =
                        reader.decode().map_err(|e| Error::Emitter(e.to_string()))?;
                    let rgb = decoded.to_rgb8();
                    let compressed =
                        miniz_oxide::deflate::compress_to_vec_zlib(rgb.as_raw(), 6);
                    let mut xobj = pdf.image_xobject(xobj_ref, &compressed);
                    xobj.filter(Filter::FlateDecode);
                    xobj.width(w as i32);
                    xobj.height(h as i32);
                    xobj.color_space().device_rgb();
                    xobj.bits_per_component(8);
                }
            }
        }
        ImageFormat::Png => {
            let reader = image::ImageReader::with_format(
                std::io::BufReader::new(std::io::Cursor::new(data)),
                image::ImageFormat::Png,
            );
            let decoded = reader.decode().map_err(|e| Error::Emitter(e.to_string()))?;
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Ok(xobj_ref)
}
