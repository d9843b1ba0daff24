//! The resolution engine shared by containers and scopes.
//!
//! One resolution walks the dependency graph depth-first. At every step it checks
//! the requested lifetime against the boundary of the service that asked for it,
//! refuses to re-enter a contract already on the chain, and then either serves
//! the lifetime store's cached instance or builds a new one.

use crate::catalog;
use crate::config::TransientDisposal;
use crate::core::{AnyArc, ResolutionChain, ServiceKey};
use crate::descriptor::DescriptorCache;
use crate::dispose::CachedInstance;
use crate::error::{Error, Result};
use crate::lifetime::Lifetime;
use crate::memo::MemoCache;
use crate::registration::{Provision, Registration};
use crate::resolver::Resolver;
use crate::settings::ResolutionSettings;
use crate::store::InstanceStore;
use std::sync::Arc;

/// Everything one resolution needs, borrowed from the container or scope that
/// started it.
pub(crate) struct ResolutionContext<'a> {
  /// The nearest resolver, handed to factories.
  pub resolver: &'a dyn Resolver,
  /// Names the root requester in errors ("container" or "scope").
  pub requester: &'static str,
  pub settings: &'a ResolutionSettings,
  pub singletons: &'a InstanceStore,
  pub scoped: Option<&'a InstanceStore>,
  pub detected: &'a MemoCache<ServiceKey, Arc<Registration>>,
  pub descriptors: &'a DescriptorCache,
}

impl<'a> ResolutionContext<'a> {
  /// Resolves `key` as a root request made under `owner`.
  pub fn resolve_root(&self, key: ServiceKey, owner: Lifetime) -> Result<AnyArc> {
    tracing::trace!(service = %key, %owner, requester = self.requester, "resolving service");
    let instance = self.resolve(key, owner, &ResolutionChain::Root)?;
    Ok(instance.service().clone())
  }

  fn resolve(
    &self,
    key: ServiceKey,
    owner: Lifetime,
    chain: &ResolutionChain<'_>,
  ) -> Result<Arc<CachedInstance>> {
    let registration = self.registration_for(key, owner)?;
    let lifetime = registration.lifetime();

    if !owner.permits(lifetime) {
      return Err(Error::LifetimeViolation {
        dependent: chain
          .last()
          .map(|dependent| dependent.type_name().to_string())
          .unwrap_or_else(|| self.requester.to_string()),
        dependency: key.type_name().to_string(),
        lifetime,
        owner,
      });
    }

    if chain.contains(&key) {
      let mut names = chain.names();
      names.push(key.type_name().to_string());
      return Err(Error::DependencyCycle { chain: names });
    }

    match lifetime {
      Lifetime::Singleton => self
        .singletons
        .instances()
        .get_or_load(registration.id(), || {
          self.construct(&registration, Lifetime::Singleton, chain)
        }),
      Lifetime::Scoped => {
        let store = self.scoped.ok_or_else(|| Error::LifetimeViolation {
          dependent: self.requester.to_string(),
          dependency: key.type_name().to_string(),
          lifetime,
          owner,
        })?;
        store
          .instances()
          .get_or_load(registration.id(), || {
            self.construct(&registration, Lifetime::Scoped, chain)
          })
      }
      Lifetime::Transient => {
        let instance = self.construct(&registration, owner, chain)?;
        if self.settings.transient_disposal() == TransientDisposal::Tracked
          && instance.is_disposable()
        {
          self.boundary_store(owner).track(instance.clone())?;
        }
        Ok(instance)
      }
    }
  }

  /// The explicit registration for `key`, or one synthesized by auto-detection.
  fn registration_for(&self, key: ServiceKey, owner: Lifetime) -> Result<Arc<Registration>> {
    if let Some(registration) = self.settings.registration(&key) {
      return Ok(registration.clone());
    }
    if !self.settings.auto_detect() {
      return Err(Error::unconfigured(key.type_name()));
    }
    // Singleton owners can only hold singletons; everything else detects per scope.
    let lifetime = match owner {
      Lifetime::Singleton => Lifetime::Singleton,
      Lifetime::Scoped | Lifetime::Transient => Lifetime::Scoped,
    };
    self.detected.get_or_load(key, || {
      catalog::detect(key, lifetime, self.settings, self.descriptors)
    })
  }

  fn boundary_store(&self, owner: Lifetime) -> &InstanceStore {
    match (owner, self.scoped) {
      (Lifetime::Singleton, _) | (_, None) => self.singletons,
      (_, Some(scoped)) => scoped,
    }
  }

  /// Builds a new instance of `registration`. `owner` is the boundary it is
  /// being created under.
  fn construct(
    &self,
    registration: &Arc<Registration>,
    owner: Lifetime,
    chain: &ResolutionChain<'_>,
  ) -> Result<Arc<CachedInstance>> {
    let contract = registration.contract();
    match registration.provision() {
      Provision::Instance { service, disposer } => Ok(Arc::new(CachedInstance::new(
        registration.clone(),
        service.clone(),
        disposer.clone(),
      ))),
      Provision::Factory(factory) => {
        tracing::trace!(service = %contract, "invoking factory");
        let service = factory(self.resolver)?;
        Ok(Arc::new(CachedInstance::new(registration.clone(), service, None)))
      }
      Provision::Concrete {
        concrete,
        describe,
        seal,
      } => {
        tracing::trace!(service = %contract, implementation = %concrete, "constructing service");
        let descriptor = self.descriptors.describe_key(*concrete, *describe);
        if !descriptor.is_constructible() {
          return Err(Error::NotConstructible {
            service: descriptor.key().type_name().to_string(),
            reason: "the type has no default constructor".to_string(),
          });
        }

        let boundary = registration.lifetime().boundary_within(owner);
        let chain = chain.extend(contract);
        let dependencies = descriptor
          .properties()
          .iter()
          .map(|property| {
            self
              .resolve(property.target(), boundary, &chain)
              .map(|dependency| dependency.service().clone())
          })
          .collect::<Result<Vec<_>>>()?;

        let raw = descriptor.instantiate(&dependencies)?;
        let (service, concrete_value) = seal(raw)?;
        let disposer = descriptor.disposer(concrete_value);
        Ok(Arc::new(CachedInstance::new(
          registration.clone(),
          service,
          disposer,
        )))
      }
    }
  }
}
