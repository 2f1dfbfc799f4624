//! Purpose: Scoped handle helpers and identifier conformance for DAW scripting hosts.
//! Exports: `api` (stable surface), `core` (errors, identifiers, scoping), `host` (seam traits).
//! Role: Library layer between embedded scripts and the host's opaque-handle object API.
//! Invariants: Every acquired handle is released exactly once, on every exit path.
//! Invariants: Identifier conversion is total; malformed input fails, never guesses.
#![allow(clippy::result_large_err)]

pub mod api;
pub mod core;
pub mod host;
