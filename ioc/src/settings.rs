//! The immutable snapshot the resolution engine works from.

use crate::catalog::Catalog;
use crate::config::TransientDisposal;
use crate::core::ServiceKey;
use crate::registration::Registration;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the container was configured with, frozen at build time.
#[derive(Debug)]
pub struct ResolutionSettings {
  auto_detect: bool,
  catalogs: Vec<&'static Catalog>,
  registrations: HashMap<ServiceKey, Arc<Registration>>,
  transient_disposal: TransientDisposal,
}

impl ResolutionSettings {
  /// Creates a snapshot. At most one registration per contract is kept; callers
  /// (normally [`ContainerBuilder`](crate::ContainerBuilder)) enforce uniqueness.
  pub fn new(
    auto_detect: bool,
    catalogs: Vec<&'static Catalog>,
    registrations: impl IntoIterator<Item = Arc<Registration>>,
    transient_disposal: TransientDisposal,
  ) -> Self {
    let registrations = registrations
      .into_iter()
      .map(|registration| (registration.contract(), registration))
      .collect();
    Self {
      auto_detect,
      catalogs,
      registrations,
      transient_disposal,
    }
  }

  pub fn auto_detect(&self) -> bool {
    self.auto_detect
  }

  pub fn catalogs(&self) -> &[&'static Catalog] {
    &self.catalogs
  }

  pub fn registration(&self, contract: &ServiceKey) -> Option<&Arc<Registration>> {
    self.registrations.get(contract)
  }

  pub fn registrations(&self) -> impl Iterator<Item = &Arc<Registration>> {
    self.registrations.values()
  }

  pub fn transient_disposal(&self) -> TransientDisposal {
    self.transient_disposal
  }
}
