#![allow(dead_code)]

//! Shared test services.
//!
//! Every contract reports the shape of the graph it was wired with, so tests can
//! check what was injected through a `dyn` handle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tiered_ioc::{injectable, Disposable, DisposeError, Inject, Injectable, TypeDescriptor};

pub trait First: Send + Sync {
  fn graph(&self) -> String;

  fn is_disposed(&self) -> bool {
    false
  }
}

pub trait Second: Send + Sync {
  fn graph(&self) -> String;
}

pub trait Third: Send + Sync {
  fn graph(&self) -> String;
}

pub mod first {
  use super::*;

  /// Disposable leaf. Disposing it twice is an error the container must never
  /// trigger.
  #[derive(Default)]
  pub struct RequiresNone {
    disposed: AtomicBool,
  }
  injectable!(RequiresNone, disposable);

  impl RequiresNone {
    pub fn is_disposed(&self) -> bool {
      self.disposed.load(Ordering::SeqCst)
    }
  }

  impl Disposable for RequiresNone {
    fn dispose(&self) -> Result<(), DisposeError> {
      if self.disposed.swap(true, Ordering::SeqCst) {
        return Err("first::RequiresNone disposed twice".into());
      }
      Ok(())
    }
  }

  impl First for RequiresNone {
    fn graph(&self) -> String {
      "first::RequiresNone".to_string()
    }

    fn is_disposed(&self) -> bool {
      RequiresNone::is_disposed(self)
    }
  }

  /// Disposable leaf whose disposal always fails.
  #[derive(Default)]
  pub struct FailsToDispose {
    attempts: AtomicUsize,
  }
  injectable!(FailsToDispose, disposable);

  impl FailsToDispose {
    pub fn attempts(&self) -> usize {
      self.attempts.load(Ordering::SeqCst)
    }
  }

  impl Disposable for FailsToDispose {
    fn dispose(&self) -> Result<(), DisposeError> {
      self.attempts.fetch_add(1, Ordering::SeqCst);
      Err("boom".into())
    }
  }

  impl First for FailsToDispose {
    fn graph(&self) -> String {
      "first::FailsToDispose".to_string()
    }
  }

  #[derive(Default)]
  pub struct RequiresSecond {
    pub second: Inject<dyn Second>,
  }
  injectable!(RequiresSecond { second });

  impl First for RequiresSecond {
    fn graph(&self) -> String {
      format!("first::RequiresSecond({})", self.second.graph())
    }
  }

  #[derive(Default)]
  pub struct RequiresSecondAndThird {
    pub second: Inject<dyn Second>,
    pub third: Inject<dyn Third>,
  }
  injectable!(RequiresSecondAndThird { second, third });

  impl First for RequiresSecondAndThird {
    fn graph(&self) -> String {
      format!(
        "first::RequiresSecondAndThird({}, {})",
        self.second.graph(),
        self.third.graph()
      )
    }
  }

  /// Holds a second it never asks the container for.
  #[derive(Default)]
  pub struct IgnoresSecond {
    pub second: Option<Arc<dyn Second>>,
  }
  injectable!(IgnoresSecond);

  impl First for IgnoresSecond {
    fn graph(&self) -> String {
      format!("first::IgnoresSecond({})", self.second.is_some())
    }
  }

  #[derive(Default)]
  pub struct RequiresFirst {
    pub first: Inject<dyn First>,
  }
  injectable!(RequiresFirst { first });

  impl First for RequiresFirst {
    fn graph(&self) -> String {
      format!("first::RequiresFirst({})", self.first.graph())
    }
  }

  /// A shape that only exists to be embedded; it has no constructor.
  #[derive(Default)]
  pub struct Abstract {
    pub second: Inject<dyn Second>,
  }

  impl Injectable for Abstract {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::builder::<Self>()
        .inject("second", |c: &mut Self| &mut c.second)
        .build()
    }
  }

  impl First for Abstract {
    fn graph(&self) -> String {
      "first::Abstract".to_string()
    }
  }

  /// Embeds `Abstract` and adds a third of its own.
  #[derive(Default)]
  pub struct Extended {
    pub base: Abstract,
    pub third: Inject<dyn Third>,
  }

  impl Injectable for Extended {
    fn describe() -> TypeDescriptor {
      TypeDescriptor::builder::<Self>()
        .default_constructible()
        .base(|c: &mut Self| &mut c.base)
        .inject("third", |c: &mut Self| &mut c.third)
        .build()
    }
  }

  impl First for Extended {
    fn graph(&self) -> String {
      format!(
        "first::Extended({}, {})",
        self.base.second.graph(),
        self.third.graph()
      )
    }
  }
}

pub mod second {
  use super::*;

  #[derive(Default)]
  pub struct RequiresNone;
  injectable!(RequiresNone);

  impl Second for RequiresNone {
    fn graph(&self) -> String {
      "second::RequiresNone".to_string()
    }
  }

  #[derive(Default)]
  pub struct RequiresFirst {
    pub first: Inject<dyn First>,
  }
  injectable!(RequiresFirst { first });

  impl Second for RequiresFirst {
    fn graph(&self) -> String {
      format!("second::RequiresFirst({})", self.first.graph())
    }
  }

  #[derive(Default)]
  pub struct RequiresThird {
    pub third: Inject<dyn Third>,
  }
  injectable!(RequiresThird { third });

  impl Second for RequiresThird {
    fn graph(&self) -> String {
      format!("second::RequiresThird({})", self.third.graph())
    }
  }
}

pub mod third {
  use super::*;

  #[derive(Default)]
  pub struct RequiresNone;
  injectable!(RequiresNone);

  impl Third for RequiresNone {
    fn graph(&self) -> String {
      "third::RequiresNone".to_string()
    }
  }
}

/// Installs a test subscriber once so `RUST_LOG` shows container logs.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

// Debug impls so `Result<Arc<_>, _>::unwrap_err` type-checks in tests.
macro_rules! opaque_debug {
  ($($ty:ty),*) => {
    $(impl std::fmt::Debug for $ty {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(stringify!($ty))
      }
    })*
  };
}
opaque_debug!(dyn First, dyn Second, dyn Third, first::RequiresSecond, first::IgnoresSecond);
