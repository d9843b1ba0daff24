mod common;

use common::{first, second, First, Second};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tiered_ioc::{injectable, ContainerBuilder, Inject, Lifetime};

const THREADS: usize = 16;

#[test]
fn concurrent_singleton_resolution_builds_once() {
  static BUILT: AtomicUsize = AtomicUsize::new(0);

  struct Slow {
    second: Inject<dyn Second>,
  }
  impl Default for Slow {
    fn default() -> Self {
      BUILT.fetch_add(1, Ordering::SeqCst);
      thread::sleep(Duration::from_millis(20));
      Self {
        second: Inject::empty(),
      }
    }
  }
  injectable!(Slow { second });

  // Arrange
  let container = ContainerBuilder::new()
    .add_singleton::<Slow>()
    .unwrap()
    .add::<dyn Second, second::RequiresNone>(Lifetime::Singleton, |c| c)
    .unwrap()
    .build();
  let barrier = Barrier::new(THREADS);

  // Act
  let resolved: Vec<Arc<Slow>> = thread::scope(|s| {
    let handles: Vec<_> = (0..THREADS)
      .map(|_| {
        s.spawn(|| {
          barrier.wait();
          container.get::<Slow>().unwrap()
        })
      })
      .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  // Assert
  assert_eq!(BUILT.load(Ordering::SeqCst), 1);
  assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
  assert!(resolved[0].second.is_injected());
}

#[test]
fn concurrent_scoped_resolution_builds_once_per_scope() {
  static BUILT: AtomicUsize = AtomicUsize::new(0);

  struct Counted;
  impl Default for Counted {
    fn default() -> Self {
      BUILT.fetch_add(1, Ordering::SeqCst);
      thread::sleep(Duration::from_millis(10));
      Counted
    }
  }
  injectable!(Counted);

  let container = ContainerBuilder::new()
    .add_scoped::<Counted>()
    .unwrap()
    .build();
  let scopes: Vec<_> = (0..4).map(|_| container.create_scope().unwrap()).collect();
  let barrier = Barrier::new(THREADS);

  thread::scope(|s| {
    for i in 0..THREADS {
      let scope = &scopes[i % scopes.len()];
      let barrier = &barrier;
      s.spawn(move || {
        barrier.wait();
        scope.get::<Counted>().unwrap();
      });
    }
  });

  assert_eq!(BUILT.load(Ordering::SeqCst), scopes.len());
  assert!(scopes.iter().all(|scope| scope.scoped_count() == 1));
}

#[test]
fn scopes_can_be_created_and_dropped_from_many_threads() {
  let container = ContainerBuilder::new()
    .add::<dyn First, first::RequiresNone>(Lifetime::Scoped, |c| c)
    .unwrap()
    .build();

  let disposed = thread::scope(|s| {
    let handles: Vec<_> = (0..THREADS)
      .map(|_| {
        s.spawn(|| {
          let scope = container.create_scope().unwrap();
          let service = scope.get::<dyn First>().unwrap();
          drop(scope);
          service.is_disposed()
        })
      })
      .collect();
    handles
      .into_iter()
      .map(|h| h.join().unwrap())
      .filter(|disposed| *disposed)
      .count()
  });

  assert_eq!(disposed, THREADS);
}
