use std::fmt::Write as _;
use std::io::Write as _;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::layout::{Layout, scaled_image_size};
use crate::model::{FontSpec, ImageFormat, PageGeometry, StyleSheet};
use crate::sections::Block;

const EMU_PER_PT: f32 = 12700.0;
const TWIPS_PER_PT: f32 = 20.0;

/// Serialize a layout into DOCX bytes. The document flows: text blocks
/// become paragraphs, and an explicit page break separates each laid-out
/// page so the word processor reproduces the pagination of the PDF.
pub(crate) fn render(
    layout: &Layout,
    geom: &PageGeometry,
    styles: &StyleSheet,
) -> Result<Vec<u8>, Error> {
    let mut images: Vec<(String, ImageFormat, Vec<u8>)> = Vec::new();
    let mut hyperlinks: Vec<(String, String)> = Vec::new();

    let body = render_body(layout, geom, styles, &mut images, &mut hyperlinks);

    let cursor = std::io::Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(cursor);
    // Fixed timestamp keeps the archive byte-identical across runs
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut part = |zip: &mut ZipWriter<std::io::Cursor<Vec<u8>>>,
                    name: &str,
                    data: &[u8]|
     -> Result<(), Error> {
        zip.start_file(name, options)
            .map_err(|e| Error::Emitter(e.to_string()))?;
        zip.write_all(data)?;
        Ok(())
    };

    part(&mut zip, "[Content_Types].xml", content_types(&images).as_bytes())?;
    part(&mut zip, "_rels/.rels", PACKAGE_RELS.as_bytes())?;
    part(
        &mut zip,
        "word/_rels/document.xml.rels",
        document_rels(&images, &hyperlinks).as_bytes(),
    )?;
    part(&mut zip, "word/styles.xml", STYLES_XML.as_bytes())?;
    part(&mut zip, "word/document.xml", body.as_bytes())?;
    for (name, _, data) in &images {
        part(&mut zip, &format!("word/media/{name}"), data)?;
    }

    let cursor = zip.finish().map_err(|e| Error::Emitter(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn render_body(
    layout: &Layout,
    geom: &PageGeometry,
    styles: &StyleSheet,
    images: &mut Vec<(String, ImageFormat, Vec<u8>)>,
    hyperlinks: &mut Vec<(String, String)>,
) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECL);
    xml.push_str(
        "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
         xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" \
         xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
         xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\"><w:body>",
    );

    for (page_idx, page) in layout.pages.iter().enumerate() {
        if page_idx > 0 {
            xml.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>");
        }
        for placed in &page.placed {
            match &placed.block {
                Block::Heading { text, style, centered } => {
                    let spec = styles.spec(*style);
                    write_text_paragraph(
                        &mut xml,
                        &[(text.as_str(), spec.bold)],
                        spec,
                        *centered,
                        0.0,
                        false,
                    );
                }
                Block::Paragraph { text } => {
                    write_text_paragraph(
                        &mut xml,
                        &[(text.as_str(), false)],
                        &styles.body,
                        false,
                        0.0,
                        false,
                    );
                }
                Block::ListItem {
                    text,
                    split,
                    continuation,
                } => {
                    let mut runs: Vec<(&str, bool)> = Vec::new();
                    if !continuation {
                        runs.push(("\u{2022} ", false));
                    }
                    match split {
                        Some(s) => {
                            runs.push((&text[..*s], true));
                            runs.push((&text[*s..], false));
                        }
                        None => runs.push((text.as_str(), false)),
                    }
                    write_text_paragraph(
                        &mut xml,
                        &runs,
                        &styles.body,
                        false,
                        styles.list_indent,
                        *continuation,
                    );
                }
                Block::Link { text, uri } => {
                    let rid = format!("rIdLink{}", hyperlinks.len() + 1);
                    hyperlinks.push((rid.clone(), uri.clone()));
                    write_hyperlink_paragraph(&mut xml, text, &rid, &styles.caption);
                }
                Block::Image { data, info } => {
                    let ext = match info.format {
                        ImageFormat::Jpeg => "jpeg",
                        ImageFormat::Png => "png",
                    };
                    let name = format!("image{}.{ext}", images.len() + 1);
                    let rid = format!("rIdImage{}", images.len() + 1);
                    images.push((name, info.format, data.clone()));
                    let (w, h) =
                        scaled_image_size(info, geom.content_width(), styles.image_max_height);
                    write_image_paragraph(&mut xml, &rid, w, h, images.len());
                }
            }
        }
    }

    let pg_w = (geom.page_width * TWIPS_PER_PT).round() as u32;
    let pg_h = (geom.page_height * TWIPS_PER_PT).round() as u32;
    let margin = (geom.margin * TWIPS_PER_PT).round() as u32;
    let _ = write!(
        xml,
        "<w:sectPr><w:pgSz w:w=\"{pg_w}\" w:h=\"{pg_h}\"/>\
         <w:pgMar w:top=\"{margin}\" w:right=\"{margin}\" w:bottom=\"{margin}\" w:left=\"{margin}\"/>\
         </w:sectPr></w:body></w:document>"
    );
    xml
}

/// One paragraph of styled runs. `indent` is the left indent in points;
/// a hanging indent aligns wrapped lines behind the bullet unless the
/// paragraph is an overflow continuation.
fn write_text_paragraph(
    xml: &mut String,
    runs: &[(&str, bool)],
    spec: &FontSpec,
    centered: bool,
    indent: f32,
    continuation: bool,
) {
    xml.push_str("<w:p><w:pPr>");
    if centered {
        xml.push_str("<w:jc w:val=\"center\"/>");
    }
    if indent > 0.0 {
        let left = (indent * TWIPS_PER_PT).round() as u32;
        if continuation {
            let _ = write!(xml, "<w:ind w:left=\"{left}\"/>");
        } else {
            let _ = write!(xml, "<w:ind w:left=\"{left}\" w:hanging=\"{left}\"/>");
        }
    }
    xml.push_str("</w:pPr>");
    let half_points = (spec.size * 2.0).round() as u32;
    for (text, emphasized) in runs {
        if text.is_empty() {
            continue;
        }
        xml.push_str("<w:r><w:rPr>");
        if *emphasized {
            xml.push_str("<w:b/>");
        }
        let _ = write!(
            xml,
            "<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/></w:rPr>\
             <w:t xml:space=\"preserve\">{}</w:t></w:r>",
            escape_xml(text)
        );
    }
    xml.push_str("</w:p>");
}

fn write_hyperlink_paragraph(xml: &mut String, text: &str, rid: &str, spec: &FontSpec) {
    let half_points = (spec.size * 2.0).round() as u32;
    let _ = write!(
        xml,
        "<w:p><w:hyperlink r:id=\"{rid}\"><w:r><w:rPr>\
         <w:rStyle w:val=\"Hyperlink\"/>\
         <w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/></w:rPr>\
         <w:t xml:space=\"preserve\">{}</w:t></w:r></w:hyperlink></w:p>",
        escape_xml(text)
    );
}

fn write_image_paragraph(xml: &mut String, rid: &str, width_pt: f32, height_pt: f32, id: usize) {
    let cx = (width_pt * EMU_PER_PT).round() as u64;
    let cy = (height_pt * EMU_PER_PT).round() as u64;
    let _ = write!(
        xml,
        "<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:drawing>\
         <wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">\
         <wp:extent cx=\"{cx}\" cy=\"{cy}\"/>\
         <wp:docPr id=\"{id}\" name=\"Imagen {id}\"/>\
         <a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
         <pic:pic>\
         <pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"Imagen {id}\"/><pic:cNvPicPr/></pic:nvPicPr>\
         <pic:blipFill><a:blip r:embed=\"{rid}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>\
         <pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
         </pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
    );
}

fn content_types(images: &[(String, ImageFormat, Vec<u8>)]) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECL);
    xml.push_str(
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    );
    if images.iter().any(|(_, f, _)| *f == ImageFormat::Png) {
        xml.push_str("<Default Extension=\"png\" ContentType=\"image/png\"/>");
    }
    if images.iter().any(|(_, f, _)| *f == ImageFormat::Jpeg) {
        xml.push_str("<Default Extension=\"jpeg\" ContentType=\"image/jpeg\"/>");
    }
    xml.push_str(
        "<Override PartName=\"/word/document.xml\" \
         ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
         <Override PartName=\"/word/styles.xml\" \
         ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
         </Types>",
    );
    xml
}

fn document_rels(
    images: &[(String, ImageFormat, Vec<u8>)],
    hyperlinks: &[(String, String)],
) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECL);
    xml.push_str(
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
         <Relationship Id=\"rIdStyles\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" \
         Target=\"styles.xml\"/>",
    );
    for (i, (name, _, _)) in images.iter().enumerate() {
        let _ = write!(
            xml,
            "<Relationship Id=\"rIdImage{}\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" \
             Target=\"media/{name}\"/>",
            i + 1
        );
    }
    for (rid, uri) in hyperlinks {
        let _ = write!(
            xml,
            "<Relationship Id=\"{rid}\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink\" \
             Target=\"{}\" TargetMode=\"External\"/>",
            escape_xml(uri)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>";

const PACKAGE_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" \
Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
Target=\"word/document.xml\"/>\
</Relationships>";

const STYLES_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:style w:type=\"character\" w:styleId=\"Hyperlink\">\
<w:name w:val=\"Hyperlink\"/>\
<w:rPr><w:color w:val=\"0000FF\"/><w:u w:val=\"single\"/></w:rPr>\
</w:style>\
</w:styles>";
