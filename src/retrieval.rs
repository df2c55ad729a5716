use base64::Engine as _;
use serde::Deserialize;

use crate::model::{Guide, Illustration, Norm, Source, Step};

/// Failure modes of a content provider. Malformed payloads and upstream
/// outages are distinguished so a caller can decide whether retrying makes
/// sense.
#[derive(Debug)]
pub enum RetrievalError {
    MalformedResponse(String),
    UpstreamFailure(String),
}

impl std::fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalError::MalformedResponse(msg) => {
                write!(f, "malformed provider response: {msg}")
            }
            RetrievalError::UpstreamFailure(msg) => write!(f, "provider failure: {msg}"),
        }
    }
}

impl std::error::Error for RetrievalError {}

/// A source of guide content. Implementations fetch or generate the
/// structured record for a query; the exporter does not care where it
/// comes from.
pub trait ContentProvider {
    fn fetch(&self, query: &str) -> Result<Guide, RetrievalError>;
}

/// The wire shape a provider hands back. Field names match the JSON
/// contract; [`into_guide`](Self::into_guide) normalizes it into the
/// content model.
#[derive(Debug, Deserialize)]
pub struct RetrievalPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub norms: Vec<NormPayload>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourcePayload>,
}

#[derive(Debug, Deserialize)]
pub struct NormPayload {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SourcePayload {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl RetrievalPayload {
    /// Parse a raw JSON document into a payload.
    pub fn from_json(raw: &str) -> Result<Self, RetrievalError> {
        serde_json::from_str(raw).map_err(|e| RetrievalError::MalformedResponse(e.to_string()))
    }

    /// Normalize into the content model: the title is trimmed and must be
    /// non-empty, sources are deduplicated by uri (first position, last
    /// value), and an undecodable image is dropped rather than failing the
    /// guide.
    pub fn into_guide(self) -> Result<Guide, RetrievalError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(RetrievalError::MalformedResponse("empty title".into()));
        }

        let illustration = self
            .image_base64
            .as_deref()
            .and_then(decode_image_field)
            .map(Illustration::new);

        // Dedup by uri: first occurrence fixes the position, a later
        // duplicate overwrites the stored title.
        let mut order: Vec<String> = Vec::new();
        let mut titles: std::collections::HashMap<String, Option<String>> =
            std::collections::HashMap::new();
        for s in self.sources {
            if s.uri.is_empty() {
                continue;
            }
            if !titles.contains_key(&s.uri) {
                order.push(s.uri.clone());
            }
            titles.insert(s.uri.clone(), s.title);
        }
        let sources = order
            .into_iter()
            .map(|uri| {
                let title = titles.remove(&uri).flatten();
                Source { uri, title }
            })
            .collect();

        Ok(Guide {
            title,
            description: self.description,
            steps: self.steps.into_iter().map(Step::new).collect(),
            norms: self
                .norms
                .into_iter()
                .map(|n| Norm {
                    name: n.name,
                    description: n.description,
                })
                .collect(),
            illustration,
            sources,
        })
    }
}

/// Decode the image field, accepting either bare base64 or a
/// `data:image/...;base64,` URI. Undecodable content yields `None`; the
/// guide is still usable without its illustration.
fn decode_image_field(value: &str) -> Option<Vec<u8>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let b64 = match value.strip_prefix("data:") {
        Some(rest) => rest.split_once("base64,").map(|(_, b)| b)?,
        None => value,
    };
    match base64::engine::general_purpose::STANDARD.decode(b64.trim()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("Discarding undecodable illustration: {e}");
            None
        }
    }
}
