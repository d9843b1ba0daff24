//! The `Container` and the `Scope`s it opens.

use crate::core::{AnyArc, ServiceKey};
use crate::descriptor::{DescriptorCache, Injectable};
use crate::engine::ResolutionContext;
use crate::error::{Error, Result};
use crate::lifetime::Lifetime;
use crate::memo::MemoCache;
use crate::registration::{Provision, Registration};
use crate::resolver::{Resolver, ResolverExt};
use crate::settings::ResolutionSettings;
use crate::store::InstanceStore;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State shared by a container and every scope it opens.
struct Shared {
  settings: ResolutionSettings,
  singletons: InstanceStore,
  detected: MemoCache<ServiceKey, Arc<Registration>>,
  descriptors: Arc<DescriptorCache>,
  disposed: AtomicBool,
}

impl Shared {
  fn context<'a>(
    &'a self,
    resolver: &'a dyn Resolver,
    requester: &'static str,
    scoped: Option<&'a InstanceStore>,
  ) -> ResolutionContext<'a> {
    ResolutionContext {
      resolver,
      requester,
      settings: &self.settings,
      singletons: &self.singletons,
      scoped,
      detected: &self.detected,
      descriptors: &self.descriptors,
    }
  }

  fn ensure_live(&self) -> Result<()> {
    if self.disposed.load(Ordering::Acquire) {
      return Err(Error::Disposed("container"));
    }
    Ok(())
  }
}

/// The root of a dependency graph.
///
/// Resolving from the container directly acts as a singleton boundary: scoped
/// services are only reachable through a [`Scope`]. The container owns every
/// singleton it builds and disposes them when it is disposed or dropped.
///
/// Build one with [`ContainerBuilder`](crate::ContainerBuilder).
pub struct Container {
  shared: Arc<Shared>,
}

impl Container {
  pub(crate) fn new(settings: ResolutionSettings, descriptors: Arc<DescriptorCache>) -> Self {
    let shared = Arc::new(Shared {
      settings,
      singletons: InstanceStore::new("container"),
      detected: MemoCache::new("container"),
      descriptors,
      disposed: AtomicBool::new(false),
    });
    let container = Self { shared };
    container.adopt_instances();
    container
  }

  /// Seeds the singleton store with externally created instances so the
  /// container disposes the ones it was given ownership of, resolved or not.
  fn adopt_instances(&self) {
    let shared = &self.shared;
    let context = shared.context(self, "container", None);
    for registration in shared.settings.registrations() {
      if matches!(registration.provision(), Provision::Instance { .. }) {
        if let Err(err) = context.resolve_root(registration.contract(), Lifetime::Singleton) {
          tracing::warn!(service = %registration.contract(), error = %err, "failed to adopt instance");
        }
      }
    }
  }

  // --- Resolution ---

  /// Resolves contract `T` at the singleton boundary.
  pub fn get<T>(&self) -> Result<Arc<T>>
  where
    T: ?Sized + Any + Send + Sync,
  {
    <Self as ResolverExt>::get::<T>(self)
  }

  /// Resolves the contract identified by `key` as a type-erased `Arc<Arc<I>>`.
  pub fn get_by_key(&self, key: ServiceKey) -> Result<AnyArc> {
    self.resolve(key)
  }

  /// Resolves contract `T`, or `None` when nothing provides `T`. Missing
  /// dependencies of a registered `T` are still reported.
  pub fn try_get<T>(&self) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Any + Send + Sync,
  {
    <Self as ResolverExt>::try_get::<T>(self)
  }

  /// Builds an unmanaged `T` whose properties come from this container.
  pub fn create<T: Injectable>(&self) -> Result<T> {
    <Self as ResolverExt>::create::<T>(self)
  }

  /// Opens a new scope. Scopes share this container's singletons and own their
  /// scoped instances.
  pub fn create_scope(&self) -> Result<Scope> {
    self.shared.ensure_live()?;
    tracing::debug!("opening scope");
    Ok(Scope {
      shared: self.shared.clone(),
      store: InstanceStore::new("scope"),
      disposed: AtomicBool::new(false),
    })
  }

  // --- Lifecycle ---

  /// Disposes every singleton (and tracked transient) this container owns.
  /// Later calls do nothing. Scopes still open fail with `Disposed` from now on.
  pub fn dispose(&self) {
    if self.shared.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    tracing::debug!("disposing container");
    self.shared.singletons.dispose();
    self.shared.detected.close();
  }

  pub fn is_disposed(&self) -> bool {
    self.shared.disposed.load(Ordering::Acquire)
  }

  pub fn settings(&self) -> &ResolutionSettings {
    &self.shared.settings
  }

  /// Number of cached singletons.
  pub fn singleton_count(&self) -> usize {
    self.shared.singletons.instances().len()
  }

  /// Number of disposable transients tracked at the singleton boundary.
  pub fn tracked_transient_count(&self) -> usize {
    self.shared.singletons.tracked_transients()
  }
}

impl Resolver for Container {
  fn resolve(&self, key: ServiceKey) -> Result<AnyArc> {
    self.ensure_live()?;
    self
      .shared
      .context(self, "container", None)
      .resolve_root(key, Lifetime::Singleton)
  }

  fn descriptors(&self) -> &DescriptorCache {
    &self.shared.descriptors
  }

  fn ensure_live(&self) -> Result<()> {
    self.shared.ensure_live()
  }
}

impl Drop for Container {
  fn drop(&mut self) {
    self.dispose();
  }
}

/// A unit of work with its own scoped instances.
///
/// Resolving from a scope acts as a scoped boundary: every lifetime is
/// available. Disposing (or dropping) the scope disposes its scoped instances;
/// singletons stay with the container.
pub struct Scope {
  shared: Arc<Shared>,
  store: InstanceStore,
  disposed: AtomicBool,
}

impl std::fmt::Debug for Scope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scope").finish_non_exhaustive()
  }
}

impl Scope {
  /// Resolves contract `T` at the scoped boundary.
  pub fn get<T>(&self) -> Result<Arc<T>>
  where
    T: ?Sized + Any + Send + Sync,
  {
    <Self as ResolverExt>::get::<T>(self)
  }

  pub fn get_by_key(&self, key: ServiceKey) -> Result<AnyArc> {
    self.resolve(key)
  }

  pub fn try_get<T>(&self) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Any + Send + Sync,
  {
    <Self as ResolverExt>::try_get::<T>(self)
  }

  /// Builds an unmanaged `T` whose properties come from this scope.
  pub fn create<T: Injectable>(&self) -> Result<T> {
    <Self as ResolverExt>::create::<T>(self)
  }

  /// Disposes the scoped instances (and tracked transients) this scope owns.
  /// Later calls do nothing.
  pub fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    tracing::debug!(instances = self.store.instances().len(), "disposing scope");
    self.store.dispose();
  }

  pub fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::Acquire)
  }

  /// Number of cached scoped instances.
  pub fn scoped_count(&self) -> usize {
    self.store.instances().len()
  }

  /// Number of disposable transients tracked by this scope.
  pub fn tracked_transient_count(&self) -> usize {
    self.store.tracked_transients()
  }
}

impl Resolver for Scope {
  fn resolve(&self, key: ServiceKey) -> Result<AnyArc> {
    self.ensure_live()?;
    self
      .shared
      .context(self, "scope", Some(&self.store))
      .resolve_root(key, Lifetime::Scoped)
  }

  fn descriptors(&self) -> &DescriptorCache {
    &self.shared.descriptors
  }

  fn ensure_live(&self) -> Result<()> {
    if self.is_disposed() {
      return Err(Error::Disposed("scope"));
    }
    self.shared.ensure_live()
  }
}

impl Drop for Scope {
  fn drop(&mut self) {
    self.dispose();
  }
}
