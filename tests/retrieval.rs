mod common;

use base64::Engine as _;
use guia_export::retrieval::{RetrievalError, RetrievalPayload};
use guia_export::suggested_filename;

fn payload_json(image_field: &str) -> String {
    format!(
        r#"{{
            "title": "  Muro de Contención  ",
            "description": "Muro de contención en concreto ciclópeo.",
            "steps": ["Replanteo: marcar ejes.", "Excavar hasta la cota indicada."],
            "norms": [{{"name": "NSR-10", "description": "Título H, estudios geotécnicos."}}],
            "image_base64": {image_field},
            "sources": [
                {{"uri": "https://example.com/a", "title": "Guía A"}},
                {{"uri": "https://example.com/a", "title": "Duplicada"}},
                {{"uri": "https://example.com/b"}}
            ]
        }}"#
    )
}

#[test]
fn payload_normalizes_into_a_guide() {
    let guide = RetrievalPayload::from_json(&payload_json("null"))
        .expect("parse")
        .into_guide()
        .expect("normalize");

    assert_eq!(guide.title, "Muro de Contención");
    assert_eq!(guide.steps.len(), 2);
    assert_eq!(guide.steps[0].split_index(), Some("Replanteo:".len()));
    assert_eq!(guide.norms[0].name, "NSR-10");
    assert!(guide.illustration.is_none());
}

#[test]
fn duplicate_sources_keep_first_position_and_last_title() {
    let guide = RetrievalPayload::from_json(&payload_json("null"))
        .expect("parse")
        .into_guide()
        .expect("normalize");

    assert_eq!(guide.sources.len(), 2);
    assert_eq!(guide.sources[0].uri, "https://example.com/a");
    assert_eq!(guide.sources[0].title.as_deref(), Some("Duplicada"));
    assert_eq!(guide.sources[1].uri, "https://example.com/b");
}

#[test]
fn empty_title_is_a_malformed_response() {
    let err = RetrievalPayload::from_json(r#"{"title": "   "}"#)
        .expect("parse")
        .into_guide()
        .expect_err("empty title must fail");
    assert!(matches!(err, RetrievalError::MalformedResponse(_)));
}

#[test]
fn invalid_json_is_a_malformed_response() {
    let err = RetrievalPayload::from_json("not json").expect_err("must fail");
    assert!(matches!(err, RetrievalError::MalformedResponse(_)));
}

#[test]
fn bare_base64_image_is_decoded() {
    let png = common::png_bytes(16, 16);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
    let guide = RetrievalPayload::from_json(&payload_json(&format!("\"{encoded}\"")))
        .expect("parse")
        .into_guide()
        .expect("normalize");

    let illo = guide.illustration.expect("illustration");
    assert_eq!(illo.data(), png.as_slice());
    assert!(!illo.is_errored());
}

#[test]
fn data_uri_image_is_decoded() {
    let png = common::png_bytes(16, 16);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
    let field = format!("\"data:image/png;base64,{encoded}\"");
    let guide = RetrievalPayload::from_json(&payload_json(&field))
        .expect("parse")
        .into_guide()
        .expect("normalize");

    assert!(guide.illustration.is_some());
}

#[test]
fn undecodable_image_is_dropped_not_fatal() {
    let guide = RetrievalPayload::from_json(&payload_json("\"%%% not base64 %%%\""))
        .expect("parse")
        .into_guide()
        .expect("normalize");
    assert!(guide.illustration.is_none());
}

#[test]
fn filename_slug_from_title() {
    assert_eq!(
        suggested_filename("Muro de Contención", "pdf"),
        "guia-muro-de-contención.pdf"
    );
    assert_eq!(suggested_filename("  Losa   Maciza ", "docx"), "guia-losa-maciza.docx");
}
