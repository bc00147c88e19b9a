use std::any::Any;

use serde::Deserialize;
use the_form_dom::{
  DomEvent,
  DomRef,
  ElementId,
  EventResult,
};
use the_form_mask::{
  DynamicMask,
  MaskDefinition,
  MaskError,
};

use super::{
  InputBase,
  InputController,
  InputEvent,
  InputKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PhoneOptions {
  /// Country formats, tried in order by prefix. The first one is the
  /// fallback when no prefix matches.
  pub formats: Vec<MaskDefinition>,
}

impl Default for PhoneOptions {
  fn default() -> Self {
    Self {
      formats: vec![
        MaskDefinition::new("+{7} (000) 000-00-00", "7", "Russia").with_default(true),
        MaskDefinition::new("+{375} (00) 000-00-00", "375", "Belarus"),
      ],
    }
  }
}

/// Picks the first mask whose prefix and the typed number agree, in either
/// direction. Falls back to the first mask.
pub fn dispatch_by_prefix(appended: &str, mask: &DynamicMask) -> usize {
  let number: String = mask
    .value()
    .chars()
    .chain(appended.chars())
    .filter(char::is_ascii_digit)
    .collect();

  mask
    .compiled_masks()
    .iter()
    .position(|compiled| {
      number.starts_with(compiled.starts_with.as_str())
        || compiled.starts_with.starts_with(number.as_str())
    })
    .unwrap_or(0)
}

/// Phone number field formatted by a country dependent mask.
pub struct Phone {
  base: InputBase,
  mask: DynamicMask,
}

impl Phone {
  pub fn new(dom: DomRef, element: ElementId, options: PhoneOptions) -> Result<Self, MaskError> {
    let mask = DynamicMask::new(
      &options.formats,
      Box::new(|appended: &str, mask: &DynamicMask| dispatch_by_prefix(appended, mask)),
    )?;
    let mut phone = Self {
      base: InputBase::new(dom, element),
      mask,
    };
    phone.sync();
    Ok(phone)
  }

  pub fn mask(&self) -> &DynamicMask {
    &self.mask
  }

  /// Country of the active format.
  pub fn country(&self) -> &str {
    &self.mask.current().country
  }

  fn write_back(&mut self) {
    let formatted = self.mask.value();
    self.base.dom().set_value(self.base.element(), &formatted);
    self.base.emit(InputEvent::Change { value: formatted });
  }
}

impl InputController for Phone {
  fn kind(&self) -> InputKind {
    InputKind::Phone
  }

  fn base(&self) -> &InputBase {
    &self.base
  }

  fn base_mut(&mut self) -> &mut InputBase {
    &mut self.base
  }

  fn as_any(&self) -> &dyn Any {
    self
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }

  fn value(&self) -> Option<String> {
    Some(self.mask.value())
  }

  fn set_value(&mut self, value: &str) -> bool {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    self.mask.set_unmasked_value(&digits);
    self.write_back();
    true
  }

  fn validate(&self) -> bool {
    self.mask.is_complete()
  }

  fn handle_event(&mut self, event: &DomEvent) -> EventResult {
    let DomEvent::Input { target, data } = event else {
      return EventResult::Ignored;
    };
    if *target != self.base.element() {
      return EventResult::Ignored;
    }

    let raw = self.base.element_value();
    match data {
      Some(data) if raw == format!("{}{data}", self.mask.value()) => {
        self.mask.append(data);
      },
      _ => self.mask.resolve(&raw),
    }
    self.write_back();
    EventResult::Consumed
  }

  fn sync(&mut self) {
    let raw = self.base.element_value();
    self.mask.resolve(&raw);
    if !raw.is_empty() {
      self
        .base
        .dom()
        .set_value(self.base.element(), &self.mask.value());
    }
  }
}
