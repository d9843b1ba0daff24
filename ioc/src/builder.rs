//! Assembling a [`Container`].

use crate::catalog::Catalog;
use crate::config::{ContainerOptions, TransientDisposal};
use crate::container::Container;
use crate::core::ServiceKey;
use crate::descriptor::{DescriptorCache, Injectable};
use crate::dispose::Disposable;
use crate::error::{Error, Result};
use crate::lifetime::Lifetime;
use crate::registration::{Provision, Registration};
use crate::resolver::Resolver;
use crate::settings::ResolutionSettings;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Collects registrations and options, then freezes them into a [`Container`].
///
/// ```ignore
/// let container = ContainerBuilder::new()
///   .add_singleton::<Clock>()?
///   .add::<dyn Greeter, EnglishGreeter>(Lifetime::Scoped, |c| c)?
///   .build();
/// ```
pub struct ContainerBuilder {
  registrations: HashMap<ServiceKey, Arc<Registration>>,
  allow_override: bool,
  auto_detect: bool,
  catalogs: Vec<&'static Catalog>,
  transient_disposal: TransientDisposal,
  descriptors: Arc<DescriptorCache>,
}

impl Default for ContainerBuilder {
  fn default() -> Self {
    Self {
      registrations: HashMap::new(),
      allow_override: false,
      auto_detect: false,
      catalogs: Vec::new(),
      transient_disposal: TransientDisposal::default(),
      descriptors: DescriptorCache::shared(),
    }
  }
}

impl fmt::Debug for ContainerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerBuilder")
      .field("registrations", &self.registrations.len())
      .field("allow_override", &self.allow_override)
      .field("auto_detect", &self.auto_detect)
      .field("catalogs", &self.catalogs)
      .field("transient_disposal", &self.transient_disposal)
      .finish_non_exhaustive()
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Options ---

  /// Lets a later registration replace an earlier one for the same contract,
  /// provided both use the same lifetime.
  pub fn allow_override(mut self, allow: bool) -> Self {
    self.allow_override = allow;
    self
  }

  /// Enables auto-detection over `catalogs`. An empty slice scans every catalog
  /// exported into [`CATALOGS`](crate::CATALOGS).
  pub fn auto_detect(mut self, catalogs: &[&'static Catalog]) -> Self {
    self.auto_detect = true;
    self.catalogs = if catalogs.is_empty() {
      Catalog::linked()
    } else {
      catalogs.to_vec()
    };
    self
  }

  pub fn transient_disposal(mut self, disposal: TransientDisposal) -> Self {
    self.transient_disposal = disposal;
    self
  }

  /// Uses `descriptors` instead of the process-wide descriptor cache.
  pub fn descriptor_cache(mut self, descriptors: Arc<DescriptorCache>) -> Self {
    self.descriptors = descriptors;
    self
  }

  /// Applies declarative options. Catalogs are looked up by name among the
  /// linked catalogs.
  pub fn with_options(mut self, options: &ContainerOptions) -> Result<Self> {
    self.allow_override = options.allow_override;
    self.transient_disposal = options.transient_disposal;
    if options.auto_detection.enabled {
      let catalogs = options
        .auto_detection
        .catalogs
        .iter()
        .map(|name| Catalog::find_linked(name))
        .collect::<Result<Vec<_>>>()?;
      self = self.auto_detect(&catalogs);
    } else {
      self.auto_detect = false;
      self.catalogs.clear();
    }
    Ok(self)
  }

  // --- Registration ---

  /// Adds a registration, enforcing uniqueness per contract.
  pub fn register(mut self, registration: Registration) -> Result<Self> {
    if let Provision::Concrete {
      concrete, describe, ..
    } = registration.provision()
    {
      let descriptor = self.descriptors.describe_key(*concrete, *describe);
      if !descriptor.is_constructible() {
        return Err(Error::NotConstructible {
          service: descriptor.key().type_name().to_string(),
          reason: "the type has no default constructor".to_string(),
        });
      }
    }

    let contract = registration.contract();
    if let Some(existing) = self.registrations.get(&contract) {
      if !self.allow_override {
        return Err(Error::DuplicateService {
          service: contract.type_name().to_string(),
        });
      }
      if existing.lifetime() != registration.lifetime() {
        return Err(Error::OverrideLifetimeMismatch {
          service: contract.type_name().to_string(),
          existing: existing.lifetime(),
          requested: registration.lifetime(),
        });
      }
      tracing::debug!(service = %contract, lifetime = %registration.lifetime(), "overriding registration");
    }
    self.registrations.insert(contract, Arc::new(registration));
    Ok(self)
  }

  /// Provides contract `I` with implementation `C`.
  pub fn add<I, C>(self, lifetime: Lifetime, upcast: fn(Arc<C>) -> Arc<I>) -> Result<Self>
  where
    I: ?Sized + Any + Send + Sync,
    C: Injectable,
  {
    self.register(Registration::implementation::<I, C>(lifetime, upcast))
  }

  pub fn add_singleton<C: Injectable>(self) -> Result<Self> {
    self.register(Registration::concrete::<C>(Lifetime::Singleton))
  }

  pub fn add_scoped<C: Injectable>(self) -> Result<Self> {
    self.register(Registration::concrete::<C>(Lifetime::Scoped))
  }

  pub fn add_transient<C: Injectable>(self) -> Result<Self> {
    self.register(Registration::concrete::<C>(Lifetime::Transient))
  }

  /// Provides contract `I` with an existing value the container never disposes.
  pub fn add_instance<I>(self, value: Arc<I>) -> Result<Self>
  where
    I: ?Sized + Any + Send + Sync,
  {
    self.register(Registration::instance(value))
  }

  pub fn add_factory<I, F>(self, lifetime: Lifetime, factory: F) -> Result<Self>
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&dyn Resolver) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    self.register(Registration::factory(lifetime, factory))
  }

  /// Provides contract `I` with `value`; the container disposes it on shutdown.
  pub fn add_disposable_instance<I, C>(self, value: Arc<C>, upcast: fn(Arc<C>) -> Arc<I>) -> Result<Self>
  where
    I: ?Sized + Any + Send + Sync,
    C: Disposable + 'static,
  {
    self.register(Registration::disposable_instance(value, upcast))
  }

  pub fn is_registered<I: ?Sized + Any>(&self) -> bool {
    self.registrations.contains_key(&ServiceKey::of::<I>())
  }

  // --- Build ---

  pub fn build(self) -> Container {
    tracing::debug!(
      registrations = self.registrations.len(),
      auto_detect = self.auto_detect,
      catalogs = self.catalogs.len(),
      "building container"
    );
    let settings = ResolutionSettings::new(
      self.auto_detect,
      self.catalogs,
      self.registrations.into_values(),
      self.transient_disposal,
    );
    Container::new(settings, self.descriptors)
  }
}
