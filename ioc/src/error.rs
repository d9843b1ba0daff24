use crate::lifetime::Lifetime;
use thiserror::Error;

/// Errors raised while configuring the container or resolving services.
///
/// Every resolution error is a wiring mistake rather than a transient condition;
/// nothing in the container retries on error.
#[derive(Debug, Error)]
pub enum Error {
  #[error("there is no service configured for {service}{}", detail_suffix(.detail))]
  UnconfiguredService {
    service: String,
    detail: Option<String>,
  },

  #[error("auto-detection for {service} matched multiple types ({}); register one explicitly", .candidates.join(", "))]
  AmbiguousAutoDetection {
    service: String,
    candidates: Vec<String>,
  },

  #[error("{dependency} ({lifetime}) cannot be injected into {dependent}: only {} services are allowed in this context", join_lifetimes(.owner.permitted()))]
  LifetimeViolation {
    dependent: String,
    dependency: String,
    lifetime: Lifetime,
    owner: Lifetime,
  },

  #[error("a dependency loop has been encountered: {}", .chain.join(" => "))]
  DependencyCycle { chain: Vec<String> },

  #[error("{service} cannot be used as an implementation type: {reason}")]
  NotConstructible { service: String, reason: String },

  #[error("the {0} has been disposed")]
  Disposed(&'static str),

  #[error("a service of type {service} has already been registered; enable overrides to replace it")]
  DuplicateService { service: String },

  #[error("cannot override {service} registered as {existing} with a {requested} registration")]
  OverrideLifetimeMismatch {
    service: String,
    existing: Lifetime,
    requested: Lifetime,
  },

  #[error("the value produced for {service} is not a {expected}")]
  TypeMismatch { service: String, expected: String },

  #[error("property '{property}' of {service} has already been injected")]
  AlreadyInjected { service: String, property: String },

  #[error("{key} is already being loaded by this thread")]
  RecursiveLoad { key: String },

  #[error("no catalog named '{0}' is linked into this process")]
  UnknownCatalog(String),

  #[error("invalid container options: {0}")]
  Config(String),

  #[error("factory for {service} failed: {message}")]
  Factory { service: String, message: String },
}

impl Error {
  pub(crate) fn unconfigured(service: impl Into<String>) -> Self {
    Error::UnconfiguredService {
      service: service.into(),
      detail: None,
    }
  }

  /// Convenience for factories that need to report their own failures.
  pub fn factory(service: impl Into<String>, message: impl Into<String>) -> Self {
    Error::Factory {
      service: service.into(),
      message: message.into(),
    }
  }

  pub fn is_unconfigured(&self) -> bool {
    matches!(self, Error::UnconfiguredService { .. })
  }

  /// `true` when nothing is configured for `service` itself, as opposed to one
  /// of its dependencies.
  pub fn is_unconfigured_service(&self, service: &str) -> bool {
    matches!(self, Error::UnconfiguredService { service: missing, .. } if missing == service)
  }

  pub fn is_disposed(&self) -> bool {
    matches!(self, Error::Disposed(_))
  }
}

fn detail_suffix(detail: &Option<String>) -> String {
  match detail {
    Some(detail) => format!(" ({})", detail),
    None => String::new(),
  }
}

fn join_lifetimes(lifetimes: &[Lifetime]) -> String {
  lifetimes
    .iter()
    .map(Lifetime::to_string)
    .collect::<Vec<_>>()
    .join("/")
}

impl From<serde_yaml::Error> for Error {
  fn from(err: serde_yaml::Error) -> Self {
    Error::Config(err.to_string())
  }
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
