// Identifier conformance: every accepted input shape either maps to one
// canonical form or fails with a validation error. No silent coercion.
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

/// Root tokens that open a valid object-tree path.
pub const PATH_ROOTS: &[&str] = &["control_surfaces", "live_app", "live_set", "this_device"];

/// Collection segments that may be indexed inside a path.
pub const COLLECTION_SEGMENTS: &[&str] = &[
    "tracks",
    "scenes",
    "clip_slots",
    "cue_points",
    "return_tracks",
    "arrangement_clips",
    "grooves",
    "control_surfaces",
    "return_chains",
    "chains",
    "devices",
    "drum_pads",
    "audio_inputs",
    "audio_outputs",
    "midi_inputs",
    "midi_outputs",
    "parameters",
];

const ID_TOKEN: &str = "id";

/// Loosely typed identifier as it arrives from the scripting boundary.
///
/// The host hands scripts numbers, strings, and id lists interchangeably;
/// this variant type is the single entry point all of them funnel through.
#[derive(Clone, Debug, PartialEq)]
pub enum IdInput {
    Nil,
    Number(f64),
    Text(String),
    List(Vec<IdInput>),
    Unsupported(&'static str),
}

impl IdInput {
    /// Accept a JSON value from a binding layer. Unsupported shapes are kept
    /// so that normalization can name them in the error.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => IdInput::Nil,
            Value::Number(n) => IdInput::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => IdInput::Text(s.clone()),
            Value::Array(items) => IdInput::List(items.iter().map(Self::from_json).collect()),
            Value::Bool(_) => IdInput::Unsupported("bool"),
            Value::Object(_) => IdInput::Unsupported("object"),
        }
    }
}

impl std::fmt::Display for IdInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdInput::Nil => write!(f, "nothing"),
            IdInput::Number(n) => write!(f, "{n}"),
            IdInput::Text(s) => write!(f, "\"{s}\""),
            IdInput::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            IdInput::Unsupported(name) => write!(f, "<{name}>"),
        }
    }
}

impl From<f64> for IdInput {
    fn from(value: f64) -> Self {
        IdInput::Number(value)
    }
}

impl From<u64> for IdInput {
    fn from(value: u64) -> Self {
        IdInput::Number(value as f64)
    }
}

impl From<i64> for IdInput {
    fn from(value: i64) -> Self {
        IdInput::Number(value as f64)
    }
}

impl From<&str> for IdInput {
    fn from(value: &str) -> Self {
        IdInput::Text(value.to_string())
    }
}

impl From<String> for IdInput {
    fn from(value: String) -> Self {
        IdInput::Text(value)
    }
}

impl<T: Into<IdInput>> From<Option<T>> for IdInput {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => IdInput::Nil,
        }
    }
}

/// Conform any accepted identifier shape to its numeric ID.
///
/// Accepted: finite non-negative integers, numeric strings, `"id N"` strings,
/// and id lists (`["id", n]` or `[n]`). Everything else is a validation error
/// carrying the offending input.
pub fn normalize_id(input: &IdInput) -> Result<u64, Error> {
    const METHOD: &str = "normalize_id";
    match input {
        IdInput::Nil => Err(missing_identifier(METHOD)),
        IdInput::Number(n) => finite_id(*n, input, METHOD),
        IdInput::Text(s) => {
            let trimmed = s.trim();
            let digits = match trimmed.strip_prefix("id ") {
                Some(rest) => rest.trim(),
                None => trimmed,
            };
            match digits.parse::<f64>() {
                Ok(n) => finite_id(n, input, METHOD),
                Err(_) => Err(Error::new(ErrorKind::Validation)
                    .with_message("could not convert identifier to a number")
                    .with_method(METHOD)
                    .with_expected("numeric string or \"id N\"")
                    .with_received(input)
                    .with_context("attempted", format!("number parse of \"{digits}\""))),
            }
        }
        IdInput::List(items) => {
            let candidate = match items.first() {
                Some(IdInput::Text(token)) if token == ID_TOKEN => items.get(1),
                Some(first) => Some(first),
                None => None,
            };
            match candidate {
                Some(inner) => normalize_id(inner),
                None => Err(missing_identifier(METHOD).with_received(input)),
            }
        }
        IdInput::Unsupported(name) => Err(Error::new(ErrorKind::Validation)
            .with_message("unsupported identifier type")
            .with_method(METHOD)
            .with_expected("number, string, or id list")
            .with_received(format!("<{name}>"))),
    }
}

/// Conform an identifier or path to the one string form the host accepts:
/// `"id N"` for identifiers, the path itself for recognized paths.
///
/// A bare `id` token with no numeric suffix is rejected rather than guessed;
/// such input must go through [`normalize_id`] first.
pub fn canonicalize(input: &IdInput) -> Result<String, Error> {
    const METHOD: &str = "canonicalize";
    match input {
        IdInput::Nil => Err(missing_identifier(METHOD)),
        IdInput::Number(n) => finite_id(*n, input, METHOD).map(prefix_id),
        IdInput::Text(s) => {
            let trimmed = s.trim();
            if let Some(n) = parse_exact_u64(trimmed) {
                return Ok(prefix_id(n));
            }
            let first = match trimmed.split_whitespace().next() {
                Some(token) => token,
                None => return Err(missing_identifier(METHOD)),
            };
            if first == ID_TOKEN {
                let suffix = trimmed[ID_TOKEN.len()..].trim();
                return match parse_exact_u64(suffix) {
                    Some(n) => Ok(prefix_id(n)),
                    None => Err(Error::new(ErrorKind::Validation)
                        .with_message(
                            "malformed id form; conform it with normalize_id before use",
                        )
                        .with_method(METHOD)
                        .with_expected("\"id N\" with a numeric suffix")
                        .with_received(input)),
                };
            }
            if PATH_ROOTS.contains(&first) {
                return Ok(s.clone());
            }
            Err(Error::new(ErrorKind::Validation)
                .with_message("not a recognized identifier or path")
                .with_method(METHOD)
                .with_expected(format!("path rooted at one of: {}", PATH_ROOTS.join(", ")))
                .with_received(input))
        }
        IdInput::List(_) | IdInput::Unsupported(_) => Err(Error::new(ErrorKind::Validation)
            .with_message("not a recognized identifier or path")
            .with_method(METHOD)
            .with_expected("number or string")
            .with_received(input)),
    }
}

/// The `"id N"` form accepted by the host as an alternative to a path.
pub fn prefix_id(id: u64) -> String {
    format!("id {id}")
}

/// Token immediately following a known collection segment in a path.
pub fn index_after_segment<'p>(path: &'p str, segment: &str) -> Result<&'p str, Error> {
    const METHOD: &str = "index_after_segment";
    if !COLLECTION_SEGMENTS.contains(&segment) {
        return Err(Error::new(ErrorKind::Validation)
            .with_message("unknown collection segment")
            .with_method(METHOD)
            .with_expected(format!("one of: {}", COLLECTION_SEGMENTS.join(", ")))
            .with_received(segment));
    }
    let mut tokens = path.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == segment {
            return tokens.next().ok_or_else(|| {
                Error::new(ErrorKind::Validation)
                    .with_message("segment has no following index")
                    .with_method(METHOD)
                    .with_received(path)
                    .with_context("segment", segment)
            });
        }
    }
    Err(Error::new(ErrorKind::Validation)
        .with_message("segment not found in path")
        .with_method(METHOD)
        .with_received(path)
        .with_context("segment", segment))
}

/// First three tokens of a path when it addresses something under a track.
pub fn track_path_from_path(path: &str) -> Result<String, Error> {
    const METHOD: &str = "track_path_from_path";
    let tokens: Vec<&str> = path.split_whitespace().collect();
    if tokens.len() < 3 || tokens[1] != "tracks" {
        return Err(Error::new(ErrorKind::Validation)
            .with_message("path does not address a track")
            .with_method(METHOD)
            .with_expected("\"<root> tracks <index> ...\"")
            .with_received(path));
    }
    Ok(tokens[..3].join(" "))
}

// A numeric string is canonical only when it round-trips exactly; "0042"
// and "+42" parse but are not the ID they resemble, so they are rejected.
fn parse_exact_u64(text: &str) -> Option<u64> {
    let n: u64 = text.parse().ok()?;
    (text == n.to_string()).then_some(n)
}

fn missing_identifier(method: &str) -> Error {
    Error::new(ErrorKind::Validation)
        .with_message("missing identifier")
        .with_method(method)
        .with_expected("number, string, or id list")
        .with_received("nothing")
}

fn finite_id(value: f64, raw: &IdInput, method: &str) -> Result<u64, Error> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        return Ok(value as u64);
    }
    Err(Error::new(ErrorKind::Validation)
        .with_message("identifier is not a finite non-negative integer")
        .with_method(method)
        .with_expected("finite non-negative integer")
        .with_received(raw)
        .with_context("converted", value))
}
