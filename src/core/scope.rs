// Scoped acquisition of host handles: canonicalize, acquire, operate,
// release exactly once on every exit path. The only place the
// acquire/operate/release triad is allowed to live.
use crate::core::error::{Error, ErrorKind};
use crate::core::ident::{IdInput, canonicalize};
use crate::host::{HostApi, HostHandle};

/// Owns one acquired handle for the duration of an invocation frame.
/// Release runs from `Drop`, so it also holds across unwinding.
struct ScopedHandle<H: HostHandle> {
    inner: Option<H>,
}

impl<H: HostHandle> ScopedHandle<H> {
    fn new(handle: H) -> Self {
        Self {
            inner: Some(handle),
        }
    }

    fn run<T, F>(&mut self, op: F) -> Result<T, Error>
    where
        F: FnOnce(&mut H) -> Result<T, Error>,
    {
        match self.inner.as_mut() {
            Some(handle) => op(handle),
            // `inner` is only vacated by release, which runs after `run`.
            None => Err(Error::new(ErrorKind::Internal).with_message("handle used after release")),
        }
    }

    fn release(&mut self) {
        if let Some(mut handle) = self.inner.take() {
            handle.release();
        }
    }
}

impl<H: HostHandle> Drop for ScopedHandle<H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// [`with_handle_named`] under the default operation name.
pub fn with_handle<A, T, F>(host: &A, target: impl Into<IdInput>, op: F) -> Result<T, Error>
where
    A: HostApi + ?Sized,
    F: FnOnce(&mut A::Handle) -> Result<T, Error>,
{
    with_handle_named(host, target, "with_handle", op)
}

/// Acquire one handle for `target`, run `op` on it, release exactly once.
///
/// Canonicalization failures abort before anything is acquired. Errors that
/// are already classified library errors pass through unchanged; failures
/// coming from the host seam are tagged with the operation name and both the
/// original and canonical identifiers. On success, `op`'s value is returned
/// unchanged, after release.
pub fn with_handle_named<A, T, F>(
    host: &A,
    target: impl Into<IdInput>,
    method: &str,
    op: F,
) -> Result<T, Error>
where
    A: HostApi + ?Sized,
    F: FnOnce(&mut A::Handle) -> Result<T, Error>,
{
    let original = target.into();
    let canonical = canonicalize(&original)?;

    let handle = host
        .acquire(&canonical)
        .map_err(|err| classify(err.into(), &original, &canonical, method))?;

    let mut scoped = ScopedHandle::new(handle);
    let outcome = scoped.run(op);
    scoped.release();

    outcome.map_err(|err| classify(err, &original, &canonical, method))
}

fn classify(err: Error, original: &IdInput, canonical: &str, method: &str) -> Error {
    // Host-seam failures arrive as LiveApi with no attribution yet; anything
    // else already carries its own classification and context.
    if err.kind() == ErrorKind::LiveApi && err.method().is_none() {
        err.with_method(method)
            .with_context("original_target", original)
            .with_context("canonical_target", canonical)
    } else {
        err
    }
}
