//! Declarative container options, loadable from YAML.
//!
//! ```yaml
//! allow_override: false
//! auto_detection:
//!   enabled: true
//!   catalogs: [storage, greeters]   # empty or absent: every linked catalog
//! transient_disposal: tracked       # or caller_owned (default)
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Who disposes disposable transient instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientDisposal {
  /// Transients belong to whoever resolved them; the container forgets them.
  #[default]
  CallerOwned,
  /// Every disposable transient is remembered by its owning boundary (the scope
  /// for scoped resolutions, the container for singleton ones) and disposed with it.
  Tracked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoDetectionOptions {
  pub enabled: bool,
  /// Names of linked catalogs to scan. Empty means all of them.
  pub catalogs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerOptions {
  /// Allow a later registration to replace an earlier one with the same lifetime.
  pub allow_override: bool,
  pub auto_detection: AutoDetectionOptions,
  pub transient_disposal: TransientDisposal,
}

impl ContainerOptions {
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(source)?)
  }

  pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|err| {
      crate::Error::Config(format!("cannot read {}: {}", path.display(), err))
    })?;
    Self::from_yaml_str(&source)
  }
}
