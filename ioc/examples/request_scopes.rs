//! One scope per simulated request: singletons are shared, scoped services are
//! rebuilt per request and disposed when the request ends.

use std::sync::atomic::{AtomicU32, Ordering};
use tiered_ioc::{
  injectable, ContainerBuilder, Disposable, DisposeError, Inject, Lifetime, TransientDisposal,
};

// 1. The abstractions
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

trait Session: Send + Sync {
  fn id(&self) -> u32;
}

// 2. Implementations
#[derive(Default)]
struct ConsoleLogger;
injectable!(ConsoleLogger);

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

static NEXT_SESSION: AtomicU32 = AtomicU32::new(1);

struct DbSession {
  id: u32,
  logger: Inject<dyn Logger>,
}

impl Default for DbSession {
  fn default() -> Self {
    Self {
      id: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
      logger: Inject::empty(),
    }
  }
}
injectable!(DbSession { logger }, disposable);

impl Session for DbSession {
  fn id(&self) -> u32 {
    self.id
  }
}

impl Disposable for DbSession {
  fn dispose(&self) -> Result<(), DisposeError> {
    self.logger.log(&format!("session {} closed", self.id));
    Ok(())
  }
}

// 3. A service that depends on both
#[derive(Default)]
struct ReportService {
  logger: Inject<dyn Logger>,
  session: Inject<dyn Session>,
}
injectable!(ReportService { logger, session });

impl ReportService {
  fn generate_report(&self) {
    self
      .logger
      .log(&format!("generating report on session {}", self.session.id()));
  }
}

fn main() -> tiered_ioc::Result<()> {
  // --- Registration ---
  let container = ContainerBuilder::new()
    .transient_disposal(TransientDisposal::Tracked)
    .add::<dyn Logger, ConsoleLogger>(Lifetime::Singleton, |c| c)?
    .add::<dyn Session, DbSession>(Lifetime::Scoped, |c| c)?
    .add_transient::<ReportService>()?
    .build();

  // --- One scope per request ---
  for request in 1..=3 {
    println!("request {}", request);
    let scope = container.create_scope()?;
    scope.get::<ReportService>()?.generate_report();
    scope.get::<ReportService>()?.generate_report();
  }

  // Scoped services are out of reach of the container itself.
  if let Err(err) = container.get::<ReportService>() {
    println!("expected failure: {}", err);
  }
  Ok(())
}
