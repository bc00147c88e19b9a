//! Segmented one-time-code field.
//!
//! The controller builds its own markup inside the tagged container:
//!
//! ```text
//! div.Input-digit-code
//!   input[type=hidden][name]          aggregate value, submitted with the form
//!   div.Input-digit-code__digits
//!     div.Input-digit-code__digit > input.js-digitCodeInput   (x length)
//! ```
//!
//! Each cell accepts one digit. Focus moves between cells the way a user
//! expects from a single text field: typing advances, backspace on an empty
//! cell and the arrow keys at the edges move back and forth, and a paste
//! anywhere fills the cells from the first one.

use std::any::Any;

use serde::Deserialize;
use the_form_dom::{
  DomEvent,
  DomRef,
  ElementId,
  EventResult,
  Key,
};
use the_form_mask::{
  Masked,
  Pattern,
  Token,
};

use super::{
  ERROR_CLASS,
  ErrorTransition,
  InputBase,
  InputController,
  InputEvent,
  InputKind,
};

pub const DEFAULT_LENGTH: usize = 4;
pub const DEFAULT_NAME: &str = "code";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct DigitCodeOptions {
  /// Number of cells, `0` falls back to the default.
  pub length: usize,
  /// Name of the aggregate field, empty falls back to the default.
  pub name:   String,
}

impl Default for DigitCodeOptions {
  fn default() -> Self {
    Self {
      length: DEFAULT_LENGTH,
      name:   DEFAULT_NAME.to_string(),
    }
  }
}

struct DigitCell {
  element: ElementId,
  mask:    Masked,
}

pub struct DigitCode {
  base:      InputBase,
  container: ElementId,
  hidden:    ElementId,
  cells:     Vec<DigitCell>,
}

impl DigitCode {
  pub fn new(dom: DomRef, container: ElementId, options: DigitCodeOptions) -> Self {
    let length = if options.length == 0 {
      DEFAULT_LENGTH
    } else {
      options.length
    };
    let name = if options.name.is_empty() {
      DEFAULT_NAME
    } else {
      options.name.as_str()
    };

    let wrapper = dom.create_element("div");
    dom.add_class(wrapper, "Input-digit-code");

    let hidden = dom.create_element("input");
    dom.set_attribute(hidden, "type", "hidden");
    dom.set_attribute(hidden, "name", name);
    dom.append_child(wrapper, hidden);

    let digits = dom.create_element("div");
    dom.add_class(digits, "Input-digit-code__digits");
    dom.append_child(wrapper, digits);

    let cell_pattern = Pattern::from_tokens(vec![Token::Digit]);
    let cells = (0..length)
      .map(|_| {
        let holder = dom.create_element("div");
        dom.add_class(holder, "Input-digit-code__digit");
        dom.append_child(digits, holder);

        let element = dom.create_element("input");
        dom.add_class(element, "js-digitCodeInput");
        dom.set_attribute(element, "type", "tel");
        dom.set_attribute(element, "maxlength", "1");
        dom.set_attribute(element, "autocomplete", "no");
        dom.append_child(holder, element);

        DigitCell {
          element,
          mask: Masked::new(cell_pattern.clone()),
        }
      })
      .collect();

    dom.append_child(container, wrapper);
    log::debug!("digit code {name:?} built with {length} cells");

    Self {
      base: InputBase::new(dom, wrapper),
      container,
      hidden,
      cells,
    }
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn container(&self) -> ElementId {
    self.container
  }

  /// The hidden input holding the aggregate value.
  pub fn hidden_input(&self) -> ElementId {
    self.hidden
  }

  pub fn cells(&self) -> impl Iterator<Item = ElementId> + '_ {
    self.cells.iter().map(|cell| cell.element)
  }

  fn cell_index(&self, element: ElementId) -> Option<usize> {
    self.cells.iter().position(|cell| cell.element == element)
  }

  fn cell_value(&self, index: usize) -> String {
    self.base.dom().value(self.cells[index].element)
  }

  fn focus_cell(&self, index: usize) {
    let element = self.cells[index].element;
    let dom = self.base.dom();
    dom.focus(element);
    dom.select_all(element);
  }

  fn write_cell(&mut self, index: usize, raw: &str) {
    let cell = &mut self.cells[index];
    cell.mask.resolve(raw);
    self.base.dom().set_value(cell.element, &cell.mask.value());
  }

  fn emit_change(&mut self) {
    let value: String = (0..self.cells.len())
      .map(|index| self.cell_value(index))
      .collect();
    self.base.dom().set_value(self.hidden, &value);
    self.base.emit(InputEvent::Change { value });
  }

  fn on_key_down(&self, index: usize, key: Key) -> EventResult {
    let dom = self.base.dom();
    let element = self.cells[index].element;
    let len = self.cell_value(index).chars().count();
    let has_prev = index > 0;
    let has_next = index + 1 < self.cells.len();

    let target = match key {
      Key::Backspace if len == 0 && has_prev => index - 1,
      Key::ArrowLeft if dom.selection(element).start == 0 && has_prev => index - 1,
      Key::ArrowRight if dom.selection(element).start == len && has_next => index + 1,
      _ => return EventResult::Ignored,
    };
    self.focus_cell(target);
    EventResult::Consumed
  }

  fn on_input(&mut self, index: usize, data: Option<&str>) -> EventResult {
    let raw = self.cell_value(index);
    self.write_cell(index, &raw);

    let single_digit = data.is_some_and(|data| {
      let mut chars = data.chars();
      matches!((chars.next(), chars.next()), (Some(ch), None) if ch.is_ascii_digit())
    });
    if single_digit && index + 1 < self.cells.len() {
      self.focus_cell(index + 1);
    }

    self.emit_change();
    EventResult::Consumed
  }
}

impl InputController for DigitCode {
  fn kind(&self) -> InputKind {
    InputKind::DigitCode
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
    Some(
      (0..self.cells.len())
        .map(|index| self.cell_value(index))
        .collect(),
    )
  }

  fn set_value(&mut self, value: &str) -> bool {
    let mut parts = value.chars().take(self.cells.len());
    for index in 0..self.cells.len() {
      let part = parts.next().map(String::from).unwrap_or_default();
      self.write_cell(index, &part);
    }
    self.emit_change();
    true
  }

  fn validate(&self) -> bool {
    self
      .value()
      .is_some_and(|value| value.chars().count() == self.cells.len())
  }

  fn disabled(&self) -> bool {
    self.base.dom().disabled(self.hidden)
  }

  fn set_disabled(&mut self, disabled: bool) {
    let dom = self.base.dom();
    dom.set_disabled(self.hidden, disabled);
    for cell in &self.cells {
      dom.set_disabled(cell.element, disabled);
    }
    self.base.emit(InputEvent::Disabled { disabled });
  }

  fn name(&self) -> String {
    self.base.dom().name(self.hidden)
  }

  fn set_error(&self, text: &str) -> ErrorTransition {
    let done = self.base.set_error(text);
    for cell in &self.cells {
      self.base.dom().add_class(cell.element, ERROR_CLASS);
    }
    done
  }

  fn reset_error(&self) -> ErrorTransition {
    let done = self.base.reset_error();
    for cell in &self.cells {
      self.base.dom().remove_class(cell.element, ERROR_CLASS);
    }
    done
  }

  fn handle_event(&mut self, event: &DomEvent) -> EventResult {
    let Some(index) = self.cell_index(event.target()) else {
      return EventResult::Ignored;
    };

    match event {
      DomEvent::KeyDown { key, .. } => self.on_key_down(index, key.key),
      DomEvent::Input { data, .. } => self.on_input(index, data.as_deref()),
      DomEvent::FocusIn { .. } => {
        self.base.dom().select_all(self.cells[index].element);
        EventResult::Consumed
      },
      // the clipboard text bypasses the cell, it is spread from the first cell
      DomEvent::Paste { text, .. } => {
        self.set_value(text);
        EventResult::Consumed
      },
      _ => EventResult::Ignored,
    }
  }

  fn sync(&mut self) {
    for index in 0..self.cells.len() {
      let raw = self.cell_value(index);
      self.write_cell(index, &raw);
    }
    let value = self.value().unwrap_or_default();
    self.base.dom().set_value(self.hidden, &value);
  }

  /// Focuses the first cell still waiting for a digit, or the first cell
  /// when all are filled. Returns whether an empty cell was found.
  fn focus(&mut self) -> bool {
    if self.cells.is_empty() {
      return false;
    }
    match (0..self.cells.len()).find(|index| self.cell_value(*index).is_empty()) {
      Some(index) => {
        self.focus_cell(index);
        true
      },
      None => {
        self.focus_cell(0);
        false
      },
    }
  }
}
