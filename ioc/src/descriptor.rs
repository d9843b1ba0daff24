//! Per-type injection metadata.
//!
//! Rust has no runtime reflection, so a concrete type describes its own shape once
//! through [`Injectable::describe`]: which `Inject<T>` fields receive dependencies,
//! how to default-construct it, and whether it is [`Disposable`]. The resulting
//! [`TypeDescriptor`] is immutable and memoized by a [`DescriptorCache`].

use crate::core::{AnyArc, ServiceKey};
use crate::dispose::Disposable;
use crate::error::{Error, Result};
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// A write-once dependency slot on a service struct.
///
/// The container fills every declared slot exactly once, before the service is
/// shared. Reading a slot that was never injected (a value built by hand with
/// `Default::default()`) panics; use [`Inject::get`] to check first.
pub struct Inject<T: ?Sized> {
  cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> Inject<T> {
  pub fn empty() -> Self {
    Self {
      cell: OnceCell::new(),
    }
  }

  /// Creates a slot that already holds `value`, for wiring services by hand.
  pub fn with_value(value: Arc<T>) -> Self {
    Self {
      cell: OnceCell::with_value(value),
    }
  }

  pub fn get(&self) -> Option<&Arc<T>> {
    self.cell.get()
  }

  pub fn is_injected(&self) -> bool {
    self.cell.get().is_some()
  }

  fn set(&self, value: Arc<T>) -> std::result::Result<(), Arc<T>> {
    self.cell.set(value)
  }
}

impl<T: ?Sized> Default for Inject<T> {
  fn default() -> Self {
    Self::empty()
  }
}

impl<T: ?Sized> Deref for Inject<T> {
  type Target = Arc<T>;

  fn deref(&self) -> &Arc<T> {
    match self.cell.get() {
      Some(value) => value,
      None => panic!(
        "dependency {} read before it was injected",
        std::any::type_name::<T>()
      ),
    }
  }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Inject")
      .field("type", &std::any::type_name::<T>())
      .field("injected", &self.is_injected())
      .finish()
  }
}

/// A concrete type the container can construct and wire.
pub trait Injectable: Any + Send + Sync + Sized {
  /// Describes the type's injectable shape. Called at most once per
  /// [`DescriptorCache`].
  fn describe() -> TypeDescriptor;
}

type ErasedTarget = dyn Any + Send + Sync;
type Assign = Arc<dyn Fn(&mut ErasedTarget, &AnyArc) -> Result<()> + Send + Sync>;
type Construct = Arc<dyn Fn() -> Box<ErasedTarget> + Send + Sync>;
type DisposerOf = fn(AnyArc) -> Option<Arc<dyn Disposable>>;

/// One injectable property: the contract it needs and how to assign it.
#[derive(Clone)]
pub struct PropertyDescriptor {
  name: &'static str,
  target: ServiceKey,
  assign: Assign,
}

impl PropertyDescriptor {
  pub fn name(&self) -> &'static str {
    self.name
  }

  /// The contract type resolved for this property.
  pub fn target(&self) -> ServiceKey {
    self.target
  }
}

impl fmt::Debug for PropertyDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PropertyDescriptor")
      .field("name", &self.name)
      .field("target", &self.target)
      .finish()
  }
}

/// The injectable shape of one concrete type.
pub struct TypeDescriptor {
  key: ServiceKey,
  properties: Vec<PropertyDescriptor>,
  construct: Option<Construct>,
  disposer: Option<DisposerOf>,
}

impl TypeDescriptor {
  pub fn builder<C: Injectable>() -> DescriptorBuilder<C> {
    DescriptorBuilder {
      base: Vec::new(),
      own: Vec::new(),
      construct: None,
      disposer: None,
      _marker: PhantomData,
    }
  }

  pub fn key(&self) -> ServiceKey {
    self.key
  }

  /// Properties in injection order: embedded base properties first.
  pub fn properties(&self) -> &[PropertyDescriptor] {
    &self.properties
  }

  /// `false` for abstract shapes that only exist to be embedded.
  pub fn is_constructible(&self) -> bool {
    self.construct.is_some()
  }

  pub fn is_disposable(&self) -> bool {
    self.disposer.is_some()
  }

  /// Default-constructs the type and assigns `dependencies` to its properties,
  /// in order.
  pub(crate) fn instantiate(&self, dependencies: &[AnyArc]) -> Result<Box<ErasedTarget>> {
    let construct = self.construct.as_ref().ok_or_else(|| Error::NotConstructible {
      service: self.key.type_name().to_string(),
      reason: "the type has no default constructor".to_string(),
    })?;
    let mut raw = construct();
    for (property, dependency) in self.properties.iter().zip(dependencies) {
      (property.assign)(raw.as_mut(), dependency)?;
    }
    Ok(raw)
  }

  /// The disposal hook for an instance of this type, if it has one.
  pub(crate) fn disposer(&self, instance: AnyArc) -> Option<Arc<dyn Disposable>> {
    self.disposer.and_then(|disposer| disposer(instance))
  }
}

impl fmt::Debug for TypeDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeDescriptor")
      .field("key", &self.key)
      .field("properties", &self.properties)
      .field("constructible", &self.is_constructible())
      .field("disposable", &self.is_disposable())
      .finish()
  }
}

/// Builds a [`TypeDescriptor`] for `C`.
pub struct DescriptorBuilder<C: Injectable> {
  base: Vec<PropertyDescriptor>,
  own: Vec<PropertyDescriptor>,
  construct: Option<Construct>,
  disposer: Option<DisposerOf>,
  _marker: PhantomData<fn() -> C>,
}

impl<C: Injectable> DescriptorBuilder<C> {
  /// Declares an injectable property of type `T`.
  pub fn inject<T>(mut self, name: &'static str, slot: fn(&mut C) -> &mut Inject<T>) -> Self
  where
    T: ?Sized + Any + Send + Sync,
  {
    let assign: Assign = Arc::new(move |target: &mut ErasedTarget, value: &AnyArc| {
      let concrete = target
        .downcast_mut::<C>()
        .ok_or_else(|| mismatch::<C>(std::any::type_name::<C>()))?;
      let service = value
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| mismatch::<T>(name))?;
      slot(concrete).set(service).map_err(|_| Error::AlreadyInjected {
        service: std::any::type_name::<C>().to_string(),
        property: name.to_string(),
      })
    });
    self.own.push(PropertyDescriptor {
      name,
      target: ServiceKey::of::<T>(),
      assign,
    });
    self
  }

  /// Embeds the properties of `B`, reached through `field`, ahead of every
  /// property `C` declares itself.
  pub fn base<B: Injectable>(mut self, field: fn(&mut C) -> &mut B) -> Self {
    for property in B::describe().properties {
      let inner = property.assign.clone();
      let assign: Assign = Arc::new(move |target: &mut ErasedTarget, value: &AnyArc| {
        let concrete = target
          .downcast_mut::<C>()
          .ok_or_else(|| mismatch::<C>(std::any::type_name::<C>()))?;
        inner(field(concrete) as &mut ErasedTarget, value)
      });
      self.base.push(PropertyDescriptor {
        name: property.name,
        target: property.target,
        assign,
      });
    }
    self
  }

  /// Uses `construct` to create fresh, not yet wired instances of `C`.
  pub fn constructor(mut self, construct: fn() -> C) -> Self {
    self.construct = Some(Arc::new(move || Box::new(construct()) as Box<ErasedTarget>));
    self
  }

  /// Marks `C` as default-constructible through its `Default` impl.
  pub fn default_constructible(self) -> Self
  where
    C: Default,
  {
    self.constructor(C::default)
  }

  /// Registers `C`'s [`Disposable`] impl as its disposal hook.
  pub fn disposable(mut self) -> Self
  where
    C: Disposable,
  {
    self.disposer = Some(disposer_of::<C>);
    self
  }

  pub fn build(self) -> TypeDescriptor {
    let mut properties = self.base;
    properties.extend(self.own);
    TypeDescriptor {
      key: ServiceKey::of::<C>(),
      properties,
      construct: self.construct,
      disposer: self.disposer,
    }
  }
}

fn disposer_of<C: Injectable + Disposable>(instance: AnyArc) -> Option<Arc<dyn Disposable>> {
  instance
    .downcast::<C>()
    .ok()
    .map(|concrete| concrete as Arc<dyn Disposable>)
}

fn mismatch<T: ?Sized>(service: &str) -> Error {
  Error::TypeMismatch {
    service: service.to_string(),
    expected: std::any::type_name::<T>().to_string(),
  }
}

/// Memoizes one [`TypeDescriptor`] per concrete type.
///
/// Descriptors are pure functions of a type's declared shape, so a cache can be
/// shared process-wide ([`DescriptorCache::shared`]). Tests that want a clean slate
/// create their own and hand it to the container builder.
#[derive(Default)]
pub struct DescriptorCache {
  descriptors: DashMap<TypeId, Arc<TypeDescriptor>>,
}

static SHARED_DESCRIPTORS: Lazy<Arc<DescriptorCache>> = Lazy::new(Default::default);

impl DescriptorCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide cache used by containers that were not given their own.
  pub fn shared() -> Arc<DescriptorCache> {
    SHARED_DESCRIPTORS.clone()
  }

  pub fn describe<C: Injectable>(&self) -> Arc<TypeDescriptor> {
    self.describe_key(ServiceKey::of::<C>(), C::describe)
  }

  pub(crate) fn describe_key(
    &self,
    key: ServiceKey,
    describe: fn() -> TypeDescriptor,
  ) -> Arc<TypeDescriptor> {
    if let Some(descriptor) = self.descriptors.get(&key.type_id()) {
      return descriptor.clone();
    }
    // Describing never touches this cache, so holding the shard lock is safe.
    self
      .descriptors
      .entry(key.type_id())
      .or_insert_with(|| {
        tracing::trace!(service = %key, "describing type");
        Arc::new(describe())
      })
      .clone()
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }

  pub fn clear(&self) {
    self.descriptors.clear();
  }
}
