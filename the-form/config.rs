use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
  Result,
  modules::ModuleRegistry,
};

/// Declarative module options, keyed by input type.
///
/// ```toml
/// [modules.digit-code]
/// length = 6
///
/// [modules.radio-group]
/// name = "plan"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct FormConfig {
  pub modules: IndexMap<String, toml::Table>,
}

impl FormConfig {
  pub fn from_toml(source: &str) -> Result<Self> {
    Ok(toml::from_str(source)?)
  }

  /// Sets the configured options on `registry`. Types the registry does not
  /// know are skipped.
  pub fn apply(&self, registry: &mut ModuleRegistry) {
    for (kind, options) in &self.modules {
      if !registry.configure(kind, options.clone()) {
        log::warn!("options for unknown input module {kind:?} ignored");
      }
    }
  }
}
