//! Core data structures shared by every part of the container.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased, shareable service value.
///
/// A service resolved for contract `I` is always stored as an `Arc<Arc<I>>` erased
/// to `Arc<dyn Any>`, so that unsized contracts (`dyn Trait`) can travel through the
/// same caches as concrete types.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// The identity of a contract or concrete type.
///
/// Equality and hashing only consider the `TypeId`; the type name is carried along
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct ServiceKey {
  type_id: TypeId,
  type_name: &'static str,
}

impl ServiceKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}

impl PartialEq for ServiceKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.type_name)
  }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.type_name)
  }
}

/// The contract keys currently under construction on one call stack.
///
/// Each link lives on the stack frame that is constructing it, so extending the
/// chain never allocates and the chain unwinds together with the recursion.
#[derive(Clone, Copy)]
pub(crate) enum ResolutionChain<'a> {
  Root,
  Link(&'a ResolutionChain<'a>, ServiceKey),
}

impl<'a> ResolutionChain<'a> {
  pub(crate) fn extend(&'a self, key: ServiceKey) -> ResolutionChain<'a> {
    ResolutionChain::Link(self, key)
  }

  pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
    let mut current = self;
    while let ResolutionChain::Link(parent, link_key) = current {
      if link_key == key {
        return true;
      }
      current = parent;
    }
    false
  }

  /// The innermost key, i.e. the service whose dependencies are being resolved.
  pub(crate) fn last(&self) -> Option<ServiceKey> {
    match self {
      ResolutionChain::Root => None,
      ResolutionChain::Link(_, key) => Some(*key),
    }
  }

  /// Type names from the outermost request to the innermost one.
  pub(crate) fn names(&self) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = self;
    while let ResolutionChain::Link(parent, key) = current {
      names.push(key.type_name().to_string());
      current = parent;
    }
    names.reverse();
    names
  }
}
