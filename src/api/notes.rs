//! Purpose: Serializable MIDI note model for clip insertion calls.
//! Exports: `Note`, `NoteList`.
//! Role: Shared contract between callers and the host's dict-taking note methods.
//! Invariants: A note payload has exactly one top-level key, `notes`.
//! Invariants: Pitch and velocity stay inside the host's 0..=127 range.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

pub const MAX_PITCH: u8 = 127;
pub const MAX_VELOCITY: f64 = 127.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_deviation: Option<f64>,
}

impl Note {
    pub fn new(pitch: u8, start_time: f64, duration: f64, velocity: f64) -> Self {
        Self {
            pitch,
            start_time,
            duration,
            velocity,
            mute: None,
            probability: None,
            velocity_deviation: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteList {
    pub notes: Vec<Note>,
}

impl NoteList {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// Accept a loosely typed payload from a binding layer. The object must
    /// have exactly one key, `notes`, holding an array of well-formed notes.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        const METHOD: &str = "NoteList::from_json";
        let object = value.as_object().ok_or_else(|| {
            Error::new(ErrorKind::Validation)
                .with_message("notes payload must be an object")
                .with_method(METHOD)
                .with_expected("{\"notes\": [...]}")
                .with_received(type_name(value))
        })?;
        if object.len() != 1 || !object.contains_key("notes") {
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            return Err(Error::new(ErrorKind::Validation)
                .with_message("notes payload must have exactly one key named \"notes\"")
                .with_method(METHOD)
                .with_expected("[\"notes\"]")
                .with_received(format!("[{}]", keys.join(", "))));
        }
        let list: NoteList = serde_json::from_value(value.clone()).map_err(|err| {
            Error::new(ErrorKind::Validation)
                .with_message("notes must carry pitch, start_time, duration, and velocity")
                .with_method(METHOD)
                .with_context("parse_error", &err)
                .with_source(err)
        })?;
        list.validate()?;
        Ok(list)
    }

    /// Range checks beyond what the types enforce.
    pub fn validate(&self) -> Result<(), Error> {
        const METHOD: &str = "NoteList::validate";
        for (index, note) in self.notes.iter().enumerate() {
            if note.pitch > MAX_PITCH {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message("note pitch out of range")
                    .with_method(METHOD)
                    .with_expected("0..=127")
                    .with_received(note.pitch)
                    .with_context("note_index", index));
            }
            if !(0.0..=MAX_VELOCITY).contains(&note.velocity) {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message("note velocity out of range")
                    .with_method(METHOD)
                    .with_expected("0.0..=127.0")
                    .with_received(note.velocity)
                    .with_context("note_index", index));
            }
            if !note.start_time.is_finite() || !note.duration.is_finite() {
                return Err(Error::new(ErrorKind::Validation)
                    .with_message("note timing must be finite")
                    .with_method(METHOD)
                    .with_context("note_index", index));
            }
        }
        Ok(())
    }

    /// Minimal clip length holding these notes, never below one beat.
    /// Measured to the end of the last-starting note.
    pub fn clip_length(&self) -> f64 {
        let last = self
            .notes
            .iter()
            .max_by(|a, b| a.start_time.total_cmp(&b.start_time));
        match last {
            Some(note) => {
                let end = note.start_time + note.duration.max(0.0);
                end.max(1.0)
            }
            None => 1.0,
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
