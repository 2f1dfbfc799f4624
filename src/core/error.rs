use std::error::Error as StdError;
use std::fmt;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    LiveApi,
    MidiOperation,
    TrackOperation,
    DeviceOperation,
    Observer,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code; callers branch on this, not on types.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::LiveApi => "LIVE_API_ERROR",
            ErrorKind::MidiOperation => "MIDI_OPERATION_ERROR",
            ErrorKind::TrackOperation => "TRACK_OPERATION_ERROR",
            ErrorKind::DeviceOperation => "DEVICE_OPERATION_ERROR",
            ErrorKind::Observer => "OBSERVER_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    fn tip(self) -> Option<&'static str> {
        match self {
            ErrorKind::Validation => Some(
                "Check the input shape; identifiers may be numbers, numeric strings, \
                 \"id N\" strings, or id lists.",
            ),
            ErrorKind::LiveApi => {
                Some("Ensure the host application is running and the target object exists.")
            }
            ErrorKind::MidiOperation => {
                Some("Verify the MIDI clip exists and the notes payload is well formed.")
            }
            ErrorKind::TrackOperation => Some("Ensure the track exists and accepts MIDI input."),
            ErrorKind::DeviceOperation => {
                Some("Verify the device exists and exposes the requested parameters.")
            }
            ErrorKind::Observer => Some("Check the observed path and that the observer is attached."),
            ErrorKind::Internal => None,
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    method: Option<String>,
    expected: Option<String>,
    received: Option<String>,
    context: Vec<(String, String)>,
    timestamp: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            method: None,
            expected: None,
            received: None,
            context: Vec::new(),
            timestamp: now_rfc3339(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_received(mut self, received: impl fmt::Display) -> Self {
        self.received = Some(received.to_string());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Human-readable rendering with a per-code recovery tip appended.
    pub fn user_message(&self) -> String {
        let mut out = match &self.message {
            Some(message) => message.clone(),
            None => self.code().to_string(),
        };
        if let Some(tip) = self.kind.tip() {
            out.push_str("\nTip: ");
            out.push_str(tip);
        }
        out
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(method) = &self.method {
            write!(f, " (method: {method})")?;
        }
        match (&self.expected, &self.received) {
            (Some(expected), Some(received)) => {
                write!(f, " (expected: {expected}, received: {received})")?;
            }
            (Some(expected), None) => write!(f, " (expected: {expected})")?,
            (None, Some(received)) => write!(f, " (received: {received})")?,
            (None, None) => {}
        }
        for (key, value) in &self.context {
            write!(f, " ({key}: {value})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

/// Structured error reporting for boundaries with no caller listening
/// (deferred tasks, observer callbacks).
pub fn report(err: &Error, at: &str) {
    tracing::error!(
        code = err.code(),
        method = err.method().unwrap_or(at),
        at,
        error = %err,
        "livescope operation failed"
    );
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"))
}
