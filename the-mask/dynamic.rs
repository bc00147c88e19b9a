use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  MaskError,
  Masked,
  Pattern,
  Result,
};

/// One entry of a dynamic mask set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MaskDefinition {
  pub mask:        String,
  #[serde(default)]
  pub starts_with: String,
  #[serde(default)]
  pub country:     String,
  #[serde(default)]
  pub default:     bool,
}

impl MaskDefinition {
  pub fn new(mask: &str, starts_with: &str, country: &str) -> Self {
    Self {
      mask:        mask.to_string(),
      starts_with: starts_with.to_string(),
      country:     country.to_string(),
      default:     false,
    }
  }

  #[must_use]
  pub fn with_default(mut self, default: bool) -> Self {
    self.default = default;
    self
  }
}

#[derive(Debug, Clone)]
pub struct CompiledMask {
  pub masked:      Masked,
  pub starts_with: String,
  pub country:     String,
  pub default:     bool,
}

/// Picks the index of the compiled mask that should take `appended`.
pub type Dispatch = Box<dyn Fn(&str, &DynamicMask) -> usize>;

/// A set of masks of which exactly one is active at a time.
///
/// Before every append the dispatch callback chooses the active mask; when
/// the choice changes the unmasked value typed so far is carried over.
pub struct DynamicMask {
  compiled: Vec<CompiledMask>,
  current:  usize,
  dispatch: Dispatch,
}

impl fmt::Debug for DynamicMask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DynamicMask")
      .field("compiled", &self.compiled)
      .field("current", &self.current)
      .finish_non_exhaustive()
  }
}

impl DynamicMask {
  pub fn new(definitions: &[MaskDefinition], dispatch: Dispatch) -> Result<Self> {
    if definitions.is_empty() {
      return Err(MaskError::NoMasks);
    }

    let compiled = definitions
      .iter()
      .map(|definition| {
        Ok(CompiledMask {
          masked:      Masked::new(Pattern::parse(&definition.mask)?),
          starts_with: definition.starts_with.clone(),
          country:     definition.country.clone(),
          default:     definition.default,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      compiled,
      current: 0,
      dispatch,
    })
  }

  pub fn compiled_masks(&self) -> &[CompiledMask] {
    &self.compiled
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  pub fn current(&self) -> &CompiledMask {
    &self.compiled[self.current]
  }

  /// The formatted value of the active mask.
  pub fn value(&self) -> String {
    self.current().masked.value()
  }

  pub fn unmasked_value(&self) -> String {
    self.current().masked.unmasked_value()
  }

  pub fn is_complete(&self) -> bool {
    self.current().masked.is_complete()
  }

  pub fn reset(&mut self) {
    for mask in &mut self.compiled {
      mask.masked.reset();
    }
    self.current = 0;
  }

  pub fn append(&mut self, text: &str) -> usize {
    let index = (self.dispatch)(text, &*self).min(self.compiled.len() - 1);
    if index != self.current {
      let carried = self.unmasked_value();
      log::debug!(
        "mask switched from {:?} to {:?}",
        self.current().country,
        self.compiled[index].country
      );
      self.current = index;
      let masked = &mut self.compiled[index].masked;
      masked.reset();
      masked.append(&carried);
    }
    self.compiled[self.current].masked.append(text)
  }

  pub fn set_unmasked_value(&mut self, unmasked: &str) {
    self.resolve(unmasked);
  }

  /// Replaces the whole value with `raw`, re-running dispatch.
  pub fn resolve(&mut self, raw: &str) {
    self.reset();
    self.append(raw);
  }
}
