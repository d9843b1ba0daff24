//! The resolver contract shared by [`Container`](crate::Container) and
//! [`Scope`](crate::Scope).

use crate::core::{AnyArc, ServiceKey};
use crate::descriptor::{DescriptorCache, Injectable};
use crate::error::{Error, Result};
use std::any::Any;
use std::sync::Arc;

/// Object-safe service resolution.
///
/// Factories receive a `&dyn Resolver`; the typed helpers live on
/// [`ResolverExt`], which every resolver gets for free.
pub trait Resolver: Send + Sync {
  /// Resolves the service registered for `key` as a type-erased `Arc<Arc<I>>`.
  fn resolve(&self, key: ServiceKey) -> Result<AnyArc>;

  /// The descriptor cache used when constructing unmanaged objects.
  fn descriptors(&self) -> &DescriptorCache;

  /// Fails with `Disposed` once the resolver can no longer serve requests.
  fn ensure_live(&self) -> Result<()> {
    Ok(())
  }
}

/// Typed helpers over any [`Resolver`].
pub trait ResolverExt: Resolver {
  /// Resolves contract `T`.
  fn get<T>(&self) -> Result<Arc<T>>
  where
    T: ?Sized + Any + Send + Sync,
  {
    downcast_service::<T>(self.resolve(ServiceKey::of::<T>())?)
  }

  /// Resolves contract `T`, or `None` when nothing provides `T`. A registered
  /// `T` with a missing dependency is a wiring error and is still reported.
  fn try_get<T>(&self) -> Result<Option<Arc<T>>>
  where
    T: ?Sized + Any + Send + Sync,
  {
    optional(self.get::<T>(), ServiceKey::of::<T>())
  }

  /// Builds a fresh, unmanaged `T`, resolving its properties through this
  /// resolver. `T` itself is neither registered nor cached.
  fn create<T: Injectable>(&self) -> Result<T> {
    self.ensure_live()?;
    let descriptor = self.descriptors().describe::<T>();
    let dependencies = descriptor
      .properties()
      .iter()
      .map(|property| self.resolve(property.target()))
      .collect::<Result<Vec<_>>>()?;
    let raw = descriptor.instantiate(&dependencies)?;
    raw
      .downcast::<T>()
      .map(|boxed| *boxed)
      .map_err(|_| Error::TypeMismatch {
        service: std::any::type_name::<T>().to_string(),
        expected: std::any::type_name::<T>().to_string(),
      })
  }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

pub(crate) fn downcast_service<T>(service: AnyArc) -> Result<Arc<T>>
where
  T: ?Sized + Any + Send + Sync,
{
  service
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or_else(|| Error::TypeMismatch {
      service: std::any::type_name::<T>().to_string(),
      expected: format!("Arc<{}>", std::any::type_name::<T>()),
    })
}

/// Downgrades "nothing configured for `requested`" to `None`.
pub(crate) fn optional<T>(result: Result<T>, requested: ServiceKey) -> Result<Option<T>> {
  match result {
    Ok(value) => Ok(Some(value)),
    Err(err) if err.is_unconfigured_service(requested.type_name()) => Ok(None),
    Err(err) => Err(err),
  }
}
