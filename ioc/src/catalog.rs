//! Auto-detection of unregistered implementations.
//!
//! A [`Catalog`] is a named, statically declared list of candidate implementations,
//! the unit of code the container scans when asked for a contract nobody
//! registered. Catalogs can be handed to the builder explicitly, or exported into
//! the process-wide [`CATALOGS`] slice so that "scan everything" finds them.

use crate::core::ServiceKey;
use crate::descriptor::{DescriptorCache, TypeDescriptor};
use crate::error::{Error, Result};
use crate::lifetime::Lifetime;
use crate::registration::Registration;
use crate::settings::ResolutionSettings;
use linkme::distributed_slice;
use std::fmt;
use std::sync::Arc;

/// Every catalog exported with [`export_catalog!`](crate::export_catalog) by any
/// crate linked into the process.
#[distributed_slice]
pub static CATALOGS: [Catalog];

/// One implementation a catalog offers for one contract.
///
/// Build candidates with the [`candidate!`](crate::candidate) macro.
pub struct Candidate {
  contract: fn() -> ServiceKey,
  concrete: fn() -> ServiceKey,
  describe: fn() -> TypeDescriptor,
  register: fn(Lifetime) -> Registration,
}

impl Candidate {
  #[doc(hidden)]
  pub const fn new(
    contract: fn() -> ServiceKey,
    concrete: fn() -> ServiceKey,
    describe: fn() -> TypeDescriptor,
    register: fn(Lifetime) -> Registration,
  ) -> Self {
    Self {
      contract,
      concrete,
      describe,
      register,
    }
  }

  pub fn contract(&self) -> ServiceKey {
    (self.contract)()
  }

  pub fn concrete(&self) -> ServiceKey {
    (self.concrete)()
  }
}

impl fmt::Debug for Candidate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Candidate")
      .field("contract", &self.contract())
      .field("concrete", &self.concrete())
      .finish()
  }
}

/// A named set of candidates.
pub struct Catalog {
  name: &'static str,
  candidates: &'static [Candidate],
}

impl Catalog {
  pub const fn new(name: &'static str, candidates: &'static [Candidate]) -> Self {
    Self { name, candidates }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn candidates(&self) -> &'static [Candidate] {
    self.candidates
  }

  /// Every catalog exported into [`CATALOGS`], in link order.
  pub fn linked() -> Vec<&'static Catalog> {
    CATALOGS.iter().collect()
  }

  /// Looks up an exported catalog by name.
  pub fn find_linked(name: &str) -> Result<&'static Catalog> {
    CATALOGS
      .iter()
      .find(|catalog| catalog.name == name)
      .ok_or_else(|| Error::UnknownCatalog(name.to_string()))
  }
}

impl fmt::Debug for Catalog {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Catalog")
      .field("name", &self.name)
      .field("candidates", &self.candidates.len())
      .finish()
  }
}

/// Finds the single constructible candidate providing `contract` and synthesizes
/// a registration for it with `lifetime`.
pub(crate) fn detect(
  contract: ServiceKey,
  lifetime: Lifetime,
  settings: &ResolutionSettings,
  descriptors: &DescriptorCache,
) -> Result<Arc<Registration>> {
  if !settings.auto_detect() {
    return Err(Error::UnconfiguredService {
      service: contract.type_name().to_string(),
      detail: Some("auto-detection is disabled".to_string()),
    });
  }

  let mut matches: Vec<(ServiceKey, &Candidate)> = Vec::new();
  for candidate in settings.catalogs().iter().flat_map(|c| c.candidates.iter()) {
    if candidate.contract() != contract {
      continue;
    }
    let concrete = candidate.concrete();
    if matches.iter().any(|(seen, _)| *seen == concrete) {
      continue;
    }
    if descriptors
      .describe_key(concrete, candidate.describe)
      .is_constructible()
    {
      matches.push((concrete, candidate));
    }
  }

  match matches.as_slice() {
    [] => Err(Error::UnconfiguredService {
      service: contract.type_name().to_string(),
      detail: Some("auto-detection found no implementing type".to_string()),
    }),
    [(concrete, candidate)] => {
      tracing::debug!(service = %contract, implementation = %concrete, %lifetime, "auto-detected implementation");
      Ok(Arc::new((candidate.register)(lifetime)))
    }
    _ => Err(Error::AmbiguousAutoDetection {
      service: contract.type_name().to_string(),
      candidates: matches
        .iter()
        .map(|(concrete, _)| concrete.type_name().to_string())
        .collect(),
    }),
  }
}
