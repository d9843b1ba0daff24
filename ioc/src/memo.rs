//! A thread-safe, single-flight memoizing cache.
//!
//! Every lifetime store in the container (the singleton store, each scope's store
//! and the auto-detection results) is a `MemoCache`. When several threads ask for
//! the same missing key, exactly one of them runs the loader while the others wait
//! on a condition variable and then share the published value. Loaders for
//! distinct keys run in parallel because the loader is always invoked with the
//! lock released.

use crate::dispose::{dispose_quietly, Disposable};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::thread::{self, ThreadId};

struct State<K, V> {
  values: HashMap<K, V>,
  // Keys with a loader in flight, and the thread running it.
  loading: HashMap<K, ThreadId>,
  disposed: bool,
}

pub struct MemoCache<K, V> {
  name: &'static str,
  state: Mutex<State<K, V>>,
  published: Condvar,
  discard: Option<fn(&V, &'static str)>,
}

impl<K, V> MemoCache<K, V>
where
  K: Eq + Hash + Clone + Debug,
  V: Clone,
{
  /// Creates an empty cache. `name` is used in `Disposed` errors and logs.
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      state: Mutex::new(State {
        values: HashMap::new(),
        loading: HashMap::new(),
        disposed: false,
      }),
      published: Condvar::new(),
      discard: None,
    }
  }

  /// Runs `discard` on every value whose loader finishes after the cache was
  /// closed, instead of silently dropping it.
  pub fn on_discard(mut self, discard: fn(&V, &'static str)) -> Self {
    self.discard = Some(discard);
    self
  }

  /// Returns the value for `key`, running `loader` to produce it if needed.
  ///
  /// A failed (or panicking) loader publishes nothing; the waiters it held up wake,
  /// find the key neither cached nor loading, and one of them loads it again.
  pub fn get_or_load<F>(&self, key: K, loader: F) -> Result<V>
  where
    F: FnOnce() -> Result<V>,
  {
    let mut state = self.state.lock();
    loop {
      if state.disposed {
        return Err(Error::Disposed(self.name));
      }
      if let Some(value) = state.values.get(&key) {
        return Ok(value.clone());
      }
      match state.loading.get(&key) {
        None => break,
        Some(owner) if *owner == thread::current().id() => {
          return Err(Error::RecursiveLoad {
            key: format!("{:?}", key),
          });
        }
        Some(_) => self.published.wait(&mut state),
      }
    }

    // --- This thread is now the loader for `key`. ---
    state.loading.insert(key.clone(), thread::current().id());
    drop(state);

    let mut guard = LoadGuard {
      cache: self,
      key: Some(key),
    };
    let outcome = loader();
    let key = guard.disarm();

    let mut state = self.state.lock();
    state.loading.remove(&key);
    let mut discarded = None;
    let result = match outcome {
      Ok(value) if state.disposed => {
        tracing::warn!(cache = self.name, ?key, "discarding a value loaded after disposal");
        discarded = Some(value);
        Err(Error::Disposed(self.name))
      }
      Ok(value) => {
        state.values.insert(key, value.clone());
        Ok(value)
      }
      Err(err) => Err(err),
    };
    drop(state);
    self.published.notify_all();
    if let (Some(value), Some(discard)) = (discarded, self.discard) {
      discard(&value, self.name);
    }
    result
  }

  /// Returns the cached value for `key` without loading it.
  pub fn get(&self, key: &K) -> Option<V> {
    self.state.lock().values.get(key).cloned()
  }

  pub fn len(&self) -> usize {
    self.state.lock().values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn is_disposed(&self) -> bool {
    self.state.lock().disposed
  }

  /// Marks the cache dead and hands back every value it held.
  ///
  /// Threads blocked waiting for an in-flight load are woken and fail with
  /// `Disposed`. Calling `close` again returns nothing.
  pub fn close(&self) -> Vec<V> {
    let mut state = self.state.lock();
    if state.disposed {
      return Vec::new();
    }
    state.disposed = true;
    state.loading.clear();
    let values = std::mem::take(&mut state.values);
    drop(state);
    self.published.notify_all();
    values.into_values().collect()
  }
}

impl<K, V> MemoCache<K, V>
where
  K: Eq + Hash + Clone + Debug,
  V: Clone + Disposable,
{
  /// Closes the cache and disposes every value it held. A failing disposal is
  /// logged and does not stop the remaining values from being disposed.
  pub fn dispose(&self) {
    let values = self.close();
    tracing::debug!(cache = self.name, count = values.len(), "disposing cached values");
    for value in &values {
      dispose_quietly(value, self.name);
    }
  }
}

/// Clears the loading mark for a key if its loader unwinds.
struct LoadGuard<'a, K, V>
where
  K: Eq + Hash + Clone + Debug,
  V: Clone,
{
  cache: &'a MemoCache<K, V>,
  key: Option<K>,
}

impl<K, V> LoadGuard<'_, K, V>
where
  K: Eq + Hash + Clone + Debug,
  V: Clone,
{
  fn disarm(&mut self) -> K {
    self
      .key
      .take()
      .unwrap_or_else(|| unreachable!("load guard disarmed twice"))
  }
}

impl<K, V> Drop for LoadGuard<'_, K, V>
where
  K: Eq + Hash + Clone + Debug,
  V: Clone,
{
  fn drop(&mut self) {
    if let Some(key) = self.key.take() {
      self.cache.state.lock().loading.remove(&key);
      self.cache.published.notify_all();
    }
  }
}
