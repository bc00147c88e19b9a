//! Input controllers.
//!
//! Every control bound to a form is driven through [`InputController`]. The
//! shared behavior (element value, disabled state, required check, animated
//! error message) lives in [`InputBase`], which each variant embeds.

pub mod digit_code;
pub mod phone;
pub mod radio;
pub mod radio_group;
pub mod text;

use std::{
  any::Any,
  cell::Cell,
  rc::Rc,
};

use futures_util::{
  FutureExt,
  future::{
    self,
    LocalBoxFuture,
  },
};
use smallvec::SmallVec;
use the_form_dom::{
  DomEvent,
  DomRef,
  ElementId,
  EventResult,
};

pub use self::{
  digit_code::{
    DigitCode,
    DigitCodeOptions,
  },
  phone::{
    Phone,
    PhoneOptions,
  },
  radio::Radio,
  radio_group::{
    RadioGroup,
    RadioGroupOptions,
  },
  text::Text,
};

pub const ERROR_CLASS: &str = "is-error";
pub const ACTIVE_CLASS: &str = "is-active";
pub const ERROR_MESSAGE_CLASS: &str = "Form__input-error";

/// Completion signal of an error display change.
///
/// Resolves once the message transition finished. The class changes are
/// applied before the future is returned; the message itself is only shown
/// when the future is polled.
pub type ErrorTransition = LocalBoxFuture<'static, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
  Text,
  DigitCode,
  Phone,
  Radio,
  RadioGroup,
  Other,
}

/// Notifications queued by a controller until its owner drains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
  /// The logical value changed.
  Change { value: String },
  /// A single radio flipped.
  Toggle { checked: bool },
  /// A radio of a group became checked.
  Check { value: String },
  /// The disabled state was set.
  Disabled { disabled: bool },
}

pub trait InputController {
  fn kind(&self) -> InputKind;
  fn base(&self) -> &InputBase;
  fn base_mut(&mut self) -> &mut InputBase;
  fn as_any(&self) -> &dyn Any;
  fn as_any_mut(&mut self) -> &mut dyn Any;

  /// The logical value, `None` when the control has nothing selected.
  fn value(&self) -> Option<String> {
    Some(self.base().element_value())
  }

  /// Returns false when `value` cannot be represented by the control.
  fn set_value(&mut self, value: &str) -> bool {
    self.base_mut().set_element_value(value);
    true
  }

  fn disabled(&self) -> bool {
    self.base().element_disabled()
  }

  fn set_disabled(&mut self, disabled: bool) {
    self.base_mut().set_element_disabled(disabled);
  }

  fn validate(&self) -> bool {
    self.base().validate_required()
  }

  fn name(&self) -> String {
    self.base().element_name()
  }

  fn set_error(&self, text: &str) -> ErrorTransition {
    self.base().set_error(text)
  }

  fn reset_error(&self) -> ErrorTransition {
    self.base().reset_error()
  }

  /// Whether DOM events targeting `element` belong to this controller.
  fn contains(&self, element: ElementId) -> bool {
    let base = self.base();
    base.dom().contains(base.element(), element)
  }

  fn handle_event(&mut self, event: &DomEvent) -> EventResult {
    let base = self.base_mut();
    match event {
      DomEvent::Input { target, .. } | DomEvent::Change { target } if *target == base.element() => {
        let value = base.element_value();
        base.emit(InputEvent::Change { value });
        EventResult::Consumed
      },
      _ => EventResult::Ignored,
    }
  }

  /// Re-reads internal state from the DOM, after a form reset.
  fn sync(&mut self) {}

  fn focus(&mut self) -> bool {
    let base = self.base();
    base.dom().focus(base.element());
    true
  }

  fn take_events(&mut self) -> SmallVec<[InputEvent; 2]> {
    self.base_mut().take_events()
  }
}

/// State and behavior shared by every controller.
pub struct InputBase {
  dom:     DomRef,
  element: ElementId,
  // created lazily next to the element, shared with pending transitions
  error:   Rc<Cell<Option<ElementId>>>,
  events:  SmallVec<[InputEvent; 2]>,
}

impl InputBase {
  pub fn new(dom: DomRef, element: ElementId) -> Self {
    Self {
      dom,
      element,
      error: Rc::new(Cell::new(None)),
      events: SmallVec::new(),
    }
  }

  pub fn dom(&self) -> &DomRef {
    &self.dom
  }

  pub fn element(&self) -> ElementId {
    self.element
  }

  /// The message element, once an error was shown.
  pub fn error_element(&self) -> Option<ElementId> {
    self.error.get()
  }

  pub fn emit(&mut self, event: InputEvent) {
    log::trace!("input {:?} queued {event:?}", self.element);
    self.events.push(event);
  }

  pub fn take_events(&mut self) -> SmallVec<[InputEvent; 2]> {
    std::mem::take(&mut self.events)
  }

  pub fn element_value(&self) -> String {
    self.dom.value(self.element)
  }

  pub fn set_element_value(&mut self, value: &str) {
    self.dom.set_value(self.element, value);
    self.emit(InputEvent::Change {
      value: value.to_string(),
    });
  }

  pub fn element_disabled(&self) -> bool {
    self.dom.disabled(self.element)
  }

  pub fn set_element_disabled(&mut self, disabled: bool) {
    self.dom.set_disabled(self.element, disabled);
    self.emit(InputEvent::Disabled { disabled });
  }

  pub fn element_name(&self) -> String {
    self.dom.name(self.element)
  }

  /// Fails only for a required control holding blank text.
  pub fn validate_required(&self) -> bool {
    !(self.dom.required(self.element) && self.element_value().trim().is_empty())
  }

  /// Marks the element as erroneous and swaps in the new message.
  ///
  /// An empty `text` toggles the error class but leaves the message hidden.
  pub fn set_error(&self, text: &str) -> ErrorTransition {
    self.dom.add_class(self.element, ERROR_CLASS);
    let hidden = self.hide_message();
    let shown = show_message(
      Rc::clone(&self.dom),
      self.element,
      Rc::clone(&self.error),
      text.to_string(),
    );
    async move {
      hidden.await;
      shown.await;
    }
    .boxed_local()
  }

  pub fn reset_error(&self) -> ErrorTransition {
    self.dom.remove_class(self.element, ERROR_CLASS);
    self.hide_message()
  }

  fn hide_message(&self) -> ErrorTransition {
    let Some(message) = self.error.get() else {
      return future::ready(()).boxed_local();
    };
    self.dom.remove_class(message, ACTIVE_CLASS);
    self.dom.transition_end(message)
  }
}

async fn show_message(
  dom: DomRef,
  element: ElementId,
  slot: Rc<Cell<Option<ElementId>>>,
  text: String,
) {
  let message = match slot.get() {
    Some(message) => message,
    None => {
      let message = dom.create_element("span");
      dom.add_class(message, ERROR_MESSAGE_CLASS);
      dom.insert_after(element, message);
      slot.set(Some(message));
      message
    },
  };

  if text.is_empty() {
    return;
  }

  dom.set_text_content(message, &text);
  if dom.has_class(message, ACTIVE_CLASS) {
    return;
  }

  // let the element render once so the activation is animated
  dom.next_frame().await;
  dom.add_class(message, ACTIVE_CLASS);
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use futures_executor::block_on;
  use futures_util::FutureExt;
  use the_form_dom::{
    Dom,
    MemoryDom,
  };

  use super::*;

  fn text_input() -> (Rc<MemoryDom>, Text) {
    let dom = Rc::new(MemoryDom::new());
    let form = dom.build("form").id();
    let input = dom
      .build("input")
      .attr("name", "email")
      .attr("required", "")
      .child_of(form);
    let text = Text::new(dom.clone(), input);
    (dom, text)
  }

  #[test]
  fn required_blank_value_fails() {
    let (_, mut text) = text_input();
    assert!(!text.validate());
    text.set_value("   ");
    assert!(!text.validate());
    text.set_value("a@b.c");
    assert!(text.validate());
  }

  #[test]
  fn set_value_queues_change() {
    let (_, mut text) = text_input();
    text.set_value("x");
    assert_eq!(text.take_events().as_slice(), &[InputEvent::Change {
      value: "x".into(),
    }]);
    assert!(text.take_events().is_empty());
  }

  #[test]
  fn set_disabled_queues_state_change() {
    let (dom, mut text) = text_input();
    text.set_disabled(true);
    assert!(dom.disabled(text.base().element()));
    assert!(text.disabled());
    assert_eq!(text.take_events().as_slice(), &[InputEvent::Disabled {
      disabled: true,
    }]);
  }

  #[test]
  fn error_message_is_created_after_element() {
    let (dom, text) = text_input();
    block_on(text.set_error("invalid"));

    let element = text.base().element();
    let message = text.base().error_element().unwrap();
    assert!(dom.has_class(element, ERROR_CLASS));
    assert_eq!(dom.text_content(message), "invalid");
    assert!(dom.has_class(message, ACTIVE_CLASS));
    assert!(dom.has_class(message, ERROR_MESSAGE_CLASS));
    let siblings = dom.children(dom.parent(element).unwrap());
    assert_eq!(siblings, vec![element, message]);

    block_on(text.reset_error());
    assert!(!dom.has_class(element, ERROR_CLASS));
    assert!(!dom.has_class(message, ACTIVE_CLASS));
  }

  #[test]
  fn empty_message_keeps_visual_unset() {
    let (dom, text) = text_input();
    block_on(text.set_error(""));

    let message = text.base().error_element().unwrap();
    assert!(dom.has_class(text.base().element(), ERROR_CLASS));
    assert!(!dom.has_class(message, ACTIVE_CLASS));
    assert_eq!(dom.text_content(message), "");
  }

  #[test]
  fn new_message_waits_for_previous_to_fade_out() {
    let (dom, text) = text_input();
    block_on(text.set_error("first"));
    let message = text.base().error_element().unwrap();
    dom.set_transition_duration(message, Duration::from_millis(150));

    let mut pending = text.set_error("second");
    assert!((&mut pending).now_or_never().is_none());
    assert!(!dom.has_class(message, ACTIVE_CLASS));
    assert_eq!(dom.text_content(message), "first");

    dom.finish_transitions();
    block_on(pending);
    assert_eq!(dom.text_content(message), "second");
    assert!(dom.has_class(message, ACTIVE_CLASS));
  }
}
