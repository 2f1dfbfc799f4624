//! Purpose: Lifecycle-managed observation of a path in the host object tree.
//! Exports: `PathObserver`.
//! Role: Wraps the host's observer mechanism with pause/resume/detach.
//! Invariants: The observer handle is released exactly once, at detach or drop.
//! Invariants: Callback failures are reported, never propagated into the host.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{Error, ErrorKind, report};
use crate::core::ident::{IdInput, canonicalize};
use crate::host::{Atom, HostApi, HostHandle};

pub struct PathObserver<H: HostHandle> {
    handle: Option<H>,
    path: String,
    active: Rc<Cell<bool>>,
}

impl<H: HostHandle> PathObserver<H> {
    /// Attach an observer to `path`. The callback fires with the changed
    /// value while the observer is active.
    pub fn attach<A, F>(host: &A, path: &str, mut callback: F) -> Result<Self, Error>
    where
        A: HostApi<Handle = H> + ?Sized,
        F: FnMut(&[Atom]) -> Result<(), Error> + 'static,
    {
        const METHOD: &str = "PathObserver::attach";
        let canonical = canonicalize(&IdInput::from(path))?;
        if canonical.starts_with("id ") {
            return Err(Error::new(ErrorKind::Observer)
                .with_message("observers attach to paths, not ids")
                .with_method(METHOD)
                .with_received(path));
        }

        let active = Rc::new(Cell::new(false));
        let gate = Rc::clone(&active);
        let handle = host
            .observe(path, Box::new(move |atoms| {
                if !gate.get() {
                    return;
                }
                if let Err(err) = callback(atoms) {
                    report(&err, "PathObserver.callback");
                }
            }))
            .map_err(|err| {
                Error::new(ErrorKind::Observer)
                    .with_message("failed to attach observer")
                    .with_method(METHOD)
                    .with_context("path", path)
                    .with_source(err)
            })?;
        active.set(true);

        Ok(Self {
            handle: Some(handle),
            path: path.to_string(),
            active,
        })
    }

    /// Current ID of the observed object; `None` after detach.
    pub fn id(&self) -> Option<u64> {
        self.handle.as_ref().map(HostHandle::id)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Stop delivering callbacks without giving up the host connection.
    pub fn pause(&mut self) {
        self.active.set(false);
    }

    pub fn resume(&mut self) {
        if self.handle.is_some() {
            self.active.set(true);
        }
    }

    /// Release the observer handle. Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        self.active.set(false);
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }
}

impl<H: HostHandle> fmt::Debug for PathObserver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathObserver")
            .field("path", &self.path)
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish()
    }
}

impl<H: HostHandle> Drop for PathObserver<H> {
    fn drop(&mut self) {
        self.detach();
    }
}
