//! Per-boundary instance ownership.

use crate::dispose::{dispose_quietly, CachedInstance};
use crate::error::{Error, Result};
use crate::memo::MemoCache;
use crate::registration::RegistrationId;
use parking_lot::Mutex;
use std::sync::Arc;

/// The instances one container or scope owns: cached instances keyed by
/// registration, plus any disposable transients it was asked to track.
pub(crate) struct InstanceStore {
  name: &'static str,
  instances: MemoCache<RegistrationId, Arc<CachedInstance>>,
  transients: Mutex<TransientBin>,
}

#[derive(Default)]
struct TransientBin {
  tracked: Vec<Arc<CachedInstance>>,
  closed: bool,
}

impl InstanceStore {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      instances: MemoCache::new(name)
        .on_discard(|instance: &Arc<CachedInstance>, owner| dispose_quietly(instance, owner)),
      transients: Mutex::new(TransientBin::default()),
    }
  }

  pub fn instances(&self) -> &MemoCache<RegistrationId, Arc<CachedInstance>> {
    &self.instances
  }

  /// Takes ownership of a disposable transient. A store that has already been
  /// disposed disposes the instance on the spot and reports `Disposed`.
  pub fn track(&self, instance: Arc<CachedInstance>) -> Result<()> {
    let mut bin = self.transients.lock();
    if bin.closed {
      drop(bin);
      dispose_quietly(instance.as_ref(), self.name);
      return Err(Error::Disposed(self.name));
    }
    bin.tracked.push(instance);
    Ok(())
  }

  pub fn tracked_transients(&self) -> usize {
    self.transients.lock().tracked.len()
  }

  /// Disposes cached instances first, then tracked transients in the order they
  /// were created. Safe to call more than once.
  pub fn dispose(&self) {
    self.instances.dispose();
    let tracked = {
      let mut bin = self.transients.lock();
      bin.closed = true;
      std::mem::take(&mut bin.tracked)
    };
    for instance in &tracked {
      dispose_quietly(instance.as_ref(), self.name);
    }
  }
}
