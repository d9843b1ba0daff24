//! Explicit disposal of services owned by a container or scope.

use crate::core::AnyArc;
use crate::registration::Registration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The error type a disposal hook may return. It is logged and discarded.
pub type DisposeError = Box<dyn std::error::Error + Send + Sync>;

/// Services that release resources when their owning container or scope ends.
///
/// Services are shared behind `Arc`, so disposal takes `&self`; implementors use
/// interior mutability to record that they have been released.
pub trait Disposable: Send + Sync {
  fn dispose(&self) -> Result<(), DisposeError>;
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
  fn dispose(&self) -> Result<(), DisposeError> {
    (**self).dispose()
  }
}

/// A produced service paired with the registration that produced it.
///
/// Disposal is attempted only when the concrete type registered a disposal hook,
/// and at most once regardless of how many owners ask for it.
pub(crate) struct CachedInstance {
  registration: Arc<Registration>,
  service: AnyArc,
  disposer: Option<Arc<dyn Disposable>>,
  disposed: AtomicBool,
}

impl CachedInstance {
  pub(crate) fn new(
    registration: Arc<Registration>,
    service: AnyArc,
    disposer: Option<Arc<dyn Disposable>>,
  ) -> Self {
    Self {
      registration,
      service,
      disposer,
      disposed: AtomicBool::new(false),
    }
  }

  pub(crate) fn service(&self) -> &AnyArc {
    &self.service
  }

  pub(crate) fn is_disposable(&self) -> bool {
    self.disposer.is_some()
  }
}

impl Disposable for CachedInstance {
  fn dispose(&self) -> Result<(), DisposeError> {
    let Some(disposer) = &self.disposer else {
      return Ok(());
    };
    if self.disposed.swap(true, Ordering::AcqRel) {
      return Ok(());
    }
    tracing::trace!(service = %self.registration.contract(), "disposing service instance");
    disposer.dispose()
  }
}

/// Disposes `value`, logging instead of propagating a failure.
pub(crate) fn dispose_quietly<D: Disposable + ?Sized>(value: &D, owner: &'static str) {
  if let Err(err) = value.dispose() {
    tracing::warn!(owner, error = %err, "ignoring failure while disposing a service");
  }
}
