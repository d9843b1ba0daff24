//! How a contract type is satisfied.

use crate::core::{AnyArc, ServiceKey};
use crate::descriptor::{Injectable, TypeDescriptor};
use crate::dispose::Disposable;
use crate::error::{Error, Result};
use crate::lifetime::Lifetime;
use crate::resolver::Resolver;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a registration; lifetime stores are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
  fn next() -> Self {
    Self(NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed))
  }
}

/// Turns a freshly wired, type-erased concrete value into the contract value
/// (`Arc<Arc<I>>`) plus the concrete `Arc<C>` used for disposal.
pub(crate) type Seal = Arc<dyn Fn(Box<dyn Any + Send + Sync>) -> Result<(AnyArc, AnyArc)> + Send + Sync>;

pub(crate) type Factory = Arc<dyn Fn(&dyn Resolver) -> Result<AnyArc> + Send + Sync>;

pub(crate) enum Provision {
  /// Construct `concrete` and wire its properties.
  Concrete {
    concrete: ServiceKey,
    describe: fn() -> TypeDescriptor,
    seal: Seal,
  },
  /// Hand out a value created outside the container.
  Instance {
    service: AnyArc,
    disposer: Option<Arc<dyn Disposable>>,
  },
  /// Delegate creation to user code.
  Factory(Factory),
}

/// An immutable description of how one contract type is provided.
pub struct Registration {
  id: RegistrationId,
  contract: ServiceKey,
  lifetime: Lifetime,
  provision: Provision,
}

impl Registration {
  /// Provides contract `I` by constructing `C` and upcasting it with `upcast`
  /// (typically `|c| c`).
  pub fn implementation<I, C>(lifetime: Lifetime, upcast: fn(Arc<C>) -> Arc<I>) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    C: Injectable,
  {
    let seal: Seal = Arc::new(move |raw: Box<dyn Any + Send + Sync>| {
      let concrete: Arc<C> = raw
        .downcast::<C>()
        .map(Arc::from)
        .map_err(|_| Error::TypeMismatch {
          service: std::any::type_name::<I>().to_string(),
          expected: std::any::type_name::<C>().to_string(),
        })?;
      let service: AnyArc = Arc::new(upcast(concrete.clone()));
      Ok((service, concrete as AnyArc))
    });
    Self::new(
      ServiceKey::of::<I>(),
      lifetime,
      Provision::Concrete {
        concrete: ServiceKey::of::<C>(),
        describe: C::describe,
        seal,
      },
    )
  }

  /// Provides `C` as its own contract.
  pub fn concrete<C: Injectable>(lifetime: Lifetime) -> Self {
    Self::implementation::<C, C>(lifetime, |c| c)
  }

  /// Provides contract `I` with a value created outside the container. Instances
  /// are always singletons and are never disposed by the container.
  pub fn instance<I>(value: Arc<I>) -> Self
  where
    I: ?Sized + Any + Send + Sync,
  {
    Self::new(
      ServiceKey::of::<I>(),
      Lifetime::Singleton,
      Provision::Instance {
        service: Arc::new(value),
        disposer: None,
      },
    )
  }

  /// Like [`Registration::instance`], but the container takes over disposal of
  /// `value` when it is disposed.
  pub fn disposable_instance<I, C>(value: Arc<C>, upcast: fn(Arc<C>) -> Arc<I>) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    C: Disposable + 'static,
  {
    let disposer: Arc<dyn Disposable> = value.clone();
    Self::new(
      ServiceKey::of::<I>(),
      Lifetime::Singleton,
      Provision::Instance {
        service: Arc::new(upcast(value)),
        disposer: Some(disposer),
      },
    )
  }

  /// Provides contract `I` by calling `factory` with the nearest resolver: the
  /// scope when resolving inside one, the container otherwise. Values produced by
  /// factories are never disposed by the container.
  pub fn factory<I, F>(lifetime: Lifetime, factory: F) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&dyn Resolver) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    let factory: Factory =
      Arc::new(move |resolver: &dyn Resolver| Ok(Arc::new(factory(resolver)?) as AnyArc));
    Self::new(ServiceKey::of::<I>(), lifetime, Provision::Factory(factory))
  }

  fn new(contract: ServiceKey, lifetime: Lifetime, provision: Provision) -> Self {
    Self {
      id: RegistrationId::next(),
      contract,
      lifetime,
      provision,
    }
  }

  pub fn id(&self) -> RegistrationId {
    self.id
  }

  pub fn contract(&self) -> ServiceKey {
    self.contract
  }

  pub fn lifetime(&self) -> Lifetime {
    self.lifetime
  }

  pub(crate) fn provision(&self) -> &Provision {
    &self.provision
  }
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let provision = match &self.provision {
      Provision::Concrete { concrete, .. } => concrete.type_name(),
      Provision::Instance { .. } => "<instance>",
      Provision::Factory(_) => "<factory>",
    };
    f.debug_struct("Registration")
      .field("id", &self.id)
      .field("contract", &self.contract)
      .field("lifetime", &self.lifetime)
      .field("provision", &provision)
      .finish()
  }
}
