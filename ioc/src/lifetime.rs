//! Service lifetimes and the rules for which lifetimes may depend on which.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long an instance produced for a registration is kept and shared.
///
/// Lifetimes are ordered from widest to narrowest: `Singleton < Scoped < Transient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
  /// One instance per container, shared by every scope created from it.
  Singleton,
  /// One instance per scope.
  Scoped,
  /// A fresh instance on every resolution.
  Transient,
}

impl Lifetime {
  /// Returns `true` if a resolution bound to the `self` boundary may consume a
  /// service registered with `dependency`.
  ///
  /// A singleton boundary outlives every scope, so it must never capture a scoped
  /// service. Everything else is permitted.
  pub fn permits(self, dependency: Lifetime) -> bool {
    !matches!((self, dependency), (Lifetime::Singleton, Lifetime::Scoped))
  }

  /// The lifetimes a resolution bound to `self` may consume.
  pub fn permitted(self) -> &'static [Lifetime] {
    match self {
      Lifetime::Singleton => &[Lifetime::Singleton, Lifetime::Transient],
      Lifetime::Scoped | Lifetime::Transient => {
        &[Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient]
      }
    }
  }

  /// The boundary used to validate the dependencies of a service with this
  /// lifetime, given the boundary it is itself being resolved under.
  ///
  /// Transients do not open a boundary of their own: their dependencies stay bound
  /// by the nearest enclosing singleton or scoped owner.
  pub(crate) fn boundary_within(self, owner: Lifetime) -> Lifetime {
    match self {
      Lifetime::Singleton | Lifetime::Scoped => self,
      Lifetime::Transient => owner,
    }
  }
}

impl fmt::Display for Lifetime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Lifetime::Singleton => write!(f, "Singleton"),
      Lifetime::Scoped => write!(f, "Scoped"),
      Lifetime::Transient => write!(f, "Transient"),
    }
  }
}
