use std::any::Any;

use the_form_dom::{
  DomRef,
  ElementId,
};

use super::{
  InputBase,
  InputController,
  InputKind,
};

/// Plain text control; everything is the shared default behavior.
pub struct Text {
  base: InputBase,
}

impl Text {
  pub fn new(dom: DomRef, element: ElementId) -> Self {
    Self {
      base: InputBase::new(dom, element),
    }
  }
}

impl InputController for Text {
  fn kind(&self) -> InputKind {
    InputKind::Text
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
}
