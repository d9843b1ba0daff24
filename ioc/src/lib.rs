//! # Tiered IoC
//!
//! A thread-safe Inversion of Control container with three service lifetimes,
//! boundary checks between them, dependency-cycle detection and cascading
//! disposal.
//!
//! ## Core Concepts
//!
//! - **Lifetimes**: a `Singleton` lives as long as the container, a `Scoped`
//!   service as long as one [`Scope`], and a `Transient` is built on every request.
//! - **Boundaries**: a singleton may depend on singletons and transients but never
//!   on scoped services; a transient inherits the boundary of whoever asked for it.
//! - **Property injection**: services declare their dependencies as
//!   [`Inject<T>`] fields and describe themselves with [`injectable!`].
//! - **Auto-detection**: unregistered contracts can be satisfied from
//!   [`Catalog`]s of candidate implementations.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tiered_ioc::{injectable, ContainerBuilder, Inject, Lifetime};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct Punctuation;
//! injectable!(Punctuation);
//!
//! #[derive(Default)]
//! struct EnglishGreeter {
//!     punctuation: Inject<Punctuation>,
//! }
//! injectable!(EnglishGreeter { punctuation });
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello!".to_string()
//!     }
//! }
//!
//! fn main() -> tiered_ioc::Result<()> {
//!     let container = ContainerBuilder::new()
//!         .add_singleton::<Punctuation>()?
//!         .add::<dyn Greeter, EnglishGreeter>(Lifetime::Scoped, |c| c)?
//!         .build();
//!
//!     let scope = container.create_scope()?;
//!     let greeter: Arc<dyn Greeter> = scope.get::<dyn Greeter>()?;
//!     assert_eq!(greeter.greet(), "Hello!");
//!
//!     // Scoped services are out of reach at the singleton boundary.
//!     assert!(container.get::<dyn Greeter>().is_err());
//!     Ok(())
//! }
//! ```

mod builder;
mod catalog;
mod config;
mod container;
mod core;
mod descriptor;
mod dispose;
mod engine;
mod error;
mod lifetime;
mod macros;
mod memo;
mod registration;
mod resolver;
mod settings;
mod store;

pub use builder::ContainerBuilder;
pub use catalog::{Candidate, Catalog, CATALOGS};
pub use config::{AutoDetectionOptions, ContainerOptions, TransientDisposal};
pub use container::{Container, Scope};
pub use crate::core::{AnyArc, ServiceKey};
pub use descriptor::{
  DescriptorBuilder, DescriptorCache, Inject, Injectable, PropertyDescriptor, TypeDescriptor,
};
pub use dispose::{DisposeError, Disposable};
pub use error::{Error, Result};
pub use lifetime::Lifetime;
pub use memo::MemoCache;
pub use registration::{Registration, RegistrationId};
pub use resolver::{Resolver, ResolverExt};
pub use settings::ResolutionSettings;

#[doc(hidden)]
pub use linkme;
