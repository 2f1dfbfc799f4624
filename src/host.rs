//! Purpose: Seam traits for the embedding host's opaque-handle object API.
//! Exports: `Atom`, `HostError`, `HostApi`, `HostHandle`, `TaskScheduler`, `defer`, `iterate_ids`.
//! Role: External collaborator boundary; the host is consumed, never reimplemented.
//! Invariants: `HostHandle::release` is mandatory and must not run twice; scoping
//! lives in `core::scope`, not here.
//! Invariants: Deferred tasks report their own failures; no caller is listening.

use std::fmt;

use crate::core::error::{Error, ErrorKind, report};
use crate::core::ident::IdInput;

/// One element of the value lists the host speaks.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Sym(String),
}

impl Atom {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Atom::Int(n) => Some(*n),
            Atom::Float(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Atom::Int(n) => Some(*n as f64),
            Atom::Float(n) => Some(*n),
            Atom::Sym(_) => None,
        }
    }

    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Atom::Sym(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(n) => write!(f, "{n}"),
            Atom::Float(n) => write!(f, "{n}"),
            Atom::Sym(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Atom {
    fn from(value: i64) -> Self {
        Atom::Int(value)
    }
}

impl From<u64> for Atom {
    fn from(value: u64) -> Self {
        Atom::Int(value as i64)
    }
}

impl From<f64> for Atom {
    fn from(value: f64) -> Self {
        Atom::Float(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Sym(value.to_string())
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom::Sym(value)
    }
}

impl From<&Atom> for IdInput {
    fn from(atom: &Atom) -> Self {
        match atom {
            Atom::Int(n) => IdInput::Number(*n as f64),
            Atom::Float(n) => IdInput::Number(*n),
            Atom::Sym(s) => IdInput::Text(s.clone()),
        }
    }
}

/// Identifier view of a host value list, e.g. a `get("clip")` result.
pub fn atoms_to_input(atoms: &[Atom]) -> IdInput {
    IdInput::List(atoms.iter().map(IdInput::from).collect())
}

/// Failure surfaced by the host itself (bad path, dead object, refused call).
#[derive(Debug)]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HostError {}

impl From<HostError> for Error {
    fn from(err: HostError) -> Self {
        // Left unattributed here; `with_handle` attaches the operation name
        // and target identifiers before the error escapes.
        Error::new(ErrorKind::LiveApi)
            .with_message(err.message.clone())
            .with_source(err)
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Callback invoked by the host when an observed value changes.
pub type ObserverCallback = Box<dyn FnMut(&[Atom])>;

/// An acquired host-side object. Opaque, acquisition-counted, must be
/// released exactly once and never touched afterwards.
pub trait HostHandle {
    fn id(&self) -> u64;
    fn path(&self) -> String;
    fn get(&self, property: &str) -> HostResult<Vec<Atom>>;
    fn set(&mut self, property: &str, value: &[Atom]) -> HostResult<()>;
    fn call(&mut self, method: &str, args: &[Atom]) -> HostResult<Vec<Atom>>;
    /// Invoke a method whose argument is a host-side dictionary built from
    /// the given JSON payload.
    fn call_dict(&mut self, method: &str, payload: &serde_json::Value) -> HostResult<Vec<Atom>>;
    fn release(&mut self);
}

/// The host object API: constructs handles from a canonical identifier or path.
pub trait HostApi {
    type Handle: HostHandle;

    fn acquire(&self, target: &str) -> HostResult<Self::Handle>;

    /// Attach an observer handle to a path. The callback fires on changes
    /// until the handle is released.
    fn observe(&self, path: &str, callback: ObserverCallback) -> HostResult<Self::Handle>;
}

/// The host's deferred-task mechanism (lower-priority scheduling).
pub trait TaskScheduler {
    fn schedule(&self, delay_ms: f64, task: Box<dyn FnOnce()>);
}

/// Discharge a closure to the host scheduler. Failures inside the deferred
/// closure are reported, not propagated; by the time it runs, the caller
/// that could have handled them is gone.
pub fn defer<S>(scheduler: &S, delay_ms: f64, task: impl FnOnce() -> Result<(), Error> + 'static)
where
    S: TaskScheduler + ?Sized,
{
    scheduler.schedule(
        delay_ms,
        Box::new(move || {
            if let Err(err) = task() {
                report(&err, "defer.deferred");
            }
        }),
    );
}

/// Map an operation over a host ID list. Accepts both the interleaved
/// `["id", n, "id", n, ...]` layout and a bare numeric list.
pub fn iterate_ids<T, F>(atoms: &[Atom], mut op: F) -> Result<Vec<T>, Error>
where
    F: FnMut(u64) -> Result<T, Error>,
{
    let interleaved = matches!(atoms.first(), Some(Atom::Sym(token)) if token == "id");
    let mut out = Vec::new();
    if interleaved {
        let mut index = 1;
        while index < atoms.len() {
            out.push(op(id_of(&atoms[index])?)?);
            index += 2;
        }
    } else {
        for atom in atoms {
            out.push(op(id_of(atom)?)?);
        }
    }
    Ok(out)
}

fn id_of(atom: &Atom) -> Result<u64, Error> {
    crate::core::ident::normalize_id(&IdInput::from(atom))
}
