//! Payload decoding - JSON and XML, batch shape first, single record second

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::error::Category;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::{CoreError, Relationship, Result};

/// Default upper bound on payload size (16 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

const JSON_BATCH_KEY: &str = "relationships";
const XML_BATCH_ROOT: &str = "relationships";
const XML_RECORD_ROOT: &str = "relationship";

/// Serialization format of an incoming payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    Json,
    Xml,
}

impl PayloadFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        ext.parse().ok()
    }

    /// Map a media type such as `application/json; charset=utf-8`
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" | "text/json" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadFormat::Json => write!(f, "json"),
            PayloadFormat::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for PayloadFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Self::from_media_type(other)
                .ok_or_else(|| CoreError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Raw request body plus its declared format
#[derive(Debug, Clone, Copy)]
pub struct RawPayload<'a> {
    pub content: &'a str,
    pub format: PayloadFormat,
}

impl<'a> RawPayload<'a> {
    pub fn new(content: &'a str, format: PayloadFormat) -> Self {
        Self { content, format }
    }
}

/// Batch shape in JSON: `{"relationships": [...]}`; `{}` is an empty batch
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonBatch {
    #[serde(default)]
    relationships: Vec<Relationship>,
}

/// Batch shape in XML: `<relationships><relationship/>...</relationships>`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlBatch {
    #[serde(rename = "relationship", default)]
    relationships: Vec<Relationship>,
}

/// Outcome of decoding a payload as one particular shape
#[derive(Debug)]
pub enum DecodeAttempt<T> {
    Decoded(T),
    /// Well-formed input whose structure is not this shape
    ShapeMismatch(String),
    /// Syntax error; no other shape can succeed either
    Malformed(String),
}

/// Stateless decoder for relationship payloads
///
/// Built once at startup and shared; decoding never mutates it.
#[derive(Debug, Clone)]
pub struct PayloadDecoder {
    max_payload_bytes: usize,
}

impl Default for PayloadDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAYLOAD_BYTES)
    }
}

impl PayloadDecoder {
    pub fn new(max_payload_bytes: usize) -> Self {
        Self { max_payload_bytes }
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Decode a payload that holds either a collection or a single record
    pub fn decode(&self, content: &str, format: PayloadFormat) -> Result<Vec<Relationship>> {
        self.check_size(content)?;

        let batch = match format {
            PayloadFormat::Json => match attempt_json::<JsonBatch>(content) {
                // Errors inside a `relationships` collection belong to the batch
                DecodeAttempt::ShapeMismatch(reason) if json_has_key(content, JSON_BATCH_KEY) => {
                    DecodeAttempt::Malformed(reason)
                }
                attempt => attempt,
            }
            .map(|b| b.relationships),
            PayloadFormat::Xml => {
                attempt_xml::<XmlBatch>(content, XML_BATCH_ROOT).map(|b| b.relationships)
            }
        };

        match batch {
            DecodeAttempt::Decoded(records) => {
                debug!("Decoded {} batch of {} relationships", format, records.len());
                Ok(records)
            }
            DecodeAttempt::Malformed(reason) => Err(CoreError::Parse(reason)),
            DecodeAttempt::ShapeMismatch(reason) => {
                debug!("Not a {} batch ({}), trying single relationship", format, reason);
                self.decode_single(content, format).map(|record| vec![record])
            }
        }
    }

    /// Decode a payload that must hold exactly one record
    pub fn decode_one(&self, content: &str, format: PayloadFormat) -> Result<Relationship> {
        self.check_size(content)?;
        self.decode_single(content, format)
    }

    pub fn decode_payload(&self, payload: RawPayload<'_>) -> Result<Vec<Relationship>> {
        self.decode(payload.content, payload.format)
    }

    fn decode_single(&self, content: &str, format: PayloadFormat) -> Result<Relationship> {
        let attempt = match format {
            PayloadFormat::Json => attempt_json::<Relationship>(content),
            PayloadFormat::Xml => attempt_xml::<Relationship>(content, XML_RECORD_ROOT),
        };

        match attempt {
            DecodeAttempt::Decoded(record) => Ok(record),
            DecodeAttempt::ShapeMismatch(reason) | DecodeAttempt::Malformed(reason) => {
                Err(CoreError::Parse(reason))
            }
        }
    }

    fn check_size(&self, content: &str) -> Result<()> {
        if content.len() > self.max_payload_bytes {
            return Err(CoreError::PayloadTooLarge {
                size: content.len(),
                limit: self.max_payload_bytes,
            });
        }
        Ok(())
    }
}

impl<T> DecodeAttempt<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodeAttempt<U> {
        match self {
            DecodeAttempt::Decoded(value) => DecodeAttempt::Decoded(f(value)),
            DecodeAttempt::ShapeMismatch(reason) => DecodeAttempt::ShapeMismatch(reason),
            DecodeAttempt::Malformed(reason) => DecodeAttempt::Malformed(reason),
        }
    }
}

fn attempt_json<T: DeserializeOwned>(content: &str) -> DecodeAttempt<T> {
    match serde_json::from_str::<T>(content) {
        Ok(value) => DecodeAttempt::Decoded(value),
        Err(e) => match e.classify() {
            Category::Data => DecodeAttempt::ShapeMismatch(e.to_string()),
            Category::Syntax | Category::Eof | Category::Io => DecodeAttempt::Malformed(e.to_string()),
        },
    }
}

fn attempt_xml<T: DeserializeOwned>(content: &str, root: &str) -> DecodeAttempt<T> {
    match xml_root_name(content) {
        Ok(Some(name)) if name == root => {}
        Ok(Some(name)) => {
            return DecodeAttempt::ShapeMismatch(format!(
                "expected root element <{}>, found <{}>",
                root, name
            ))
        }
        Ok(None) => return DecodeAttempt::Malformed("document has no root element".into()),
        Err(reason) => return DecodeAttempt::Malformed(reason),
    }

    // The root element already names the shape, so any failure past it is final.
    match quick_xml::de::from_str::<T>(content) {
        Ok(value) => DecodeAttempt::Decoded(value),
        Err(e) => DecodeAttempt::Malformed(e.to_string()),
    }
}

/// True iff `content` is a JSON object with `key` at its root
fn json_has_key(content: &str, key: &str) -> bool {
    serde_json::from_str::<HashMap<String, IgnoredAny>>(content)
        .map(|root| root.contains_key(key))
        .unwrap_or(false)
}

/// Local name of the first element in the document
fn xml_root_name(content: &str) -> std::result::Result<Option<String>, String> {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return Ok(Some(name));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => continue,
            Err(e) => return Err(e.to_string()),
        }
    }
}
