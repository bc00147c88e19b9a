use std::any::Any;

use the_form_dom::{
  Dom,
  DomEvent,
  DomRef,
  ElementId,
  EventResult,
};

use super::{
  InputBase,
  InputController,
  InputEvent,
  InputKind,
};

fn is_radio(dom: &dyn Dom, element: ElementId) -> bool {
  dom.tag(element) == "input" && dom.control_type(element) == "radio"
}

/// One radio button.
///
/// The bound element is either the radio input itself or a wrapper (a label
/// for instance) holding it.
pub struct Radio {
  base:  InputBase,
  input: ElementId,
}

impl Radio {
  pub fn new(dom: DomRef, element: ElementId) -> Self {
    let input = if is_radio(&*dom, element) {
      element
    } else {
      dom
        .find_all(element, &|el| is_radio(&*dom, el))
        .first()
        .copied()
        .unwrap_or(element)
    };
    Self {
      base: InputBase::new(dom, element),
      input,
    }
  }

  pub fn input(&self) -> ElementId {
    self.input
  }

  pub fn checked(&self) -> bool {
    self.base.dom().checked(self.input)
  }

  /// Returns whether the state actually flipped; only a flip is notified.
  pub fn set_checked(&mut self, checked: bool) -> bool {
    if self.checked() == checked {
      return false;
    }
    self.base.dom().set_checked(self.input, checked);
    self.base.emit(InputEvent::Toggle { checked });
    true
  }
}

impl InputController for Radio {
  fn kind(&self) -> InputKind {
    InputKind::Radio
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
    Some(self.base.dom().value(self.input))
  }

  fn set_value(&mut self, value: &str) -> bool {
    self.base.dom().set_value(self.input, value);
    true
  }

  fn disabled(&self) -> bool {
    self.base.dom().disabled(self.input)
  }

  fn set_disabled(&mut self, disabled: bool) {
    self.base.dom().set_disabled(self.input, disabled);
    self.base.emit(InputEvent::Disabled { disabled });
  }

  fn name(&self) -> String {
    self.base.dom().name(self.input)
  }

  fn validate(&self) -> bool {
    !self.base.dom().required(self.input) || self.checked()
  }

  fn handle_event(&mut self, event: &DomEvent) -> EventResult {
    match event {
      DomEvent::Change { target } if *target == self.input => {
        let checked = self.checked();
        self.base.emit(InputEvent::Toggle { checked });
        EventResult::Consumed
      },
      _ => EventResult::Ignored,
    }
  }

  fn focus(&mut self) -> bool {
    self.base.dom().focus(self.input);
    true
  }
}
