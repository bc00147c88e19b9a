//! Validation rules.
//!
//! Rules are plain predicates over a read-only view of the form's inputs.
//! The form is valid when every rule passes; rules run in the order they were
//! added and are removed through the handle `add` returned.

use std::rc::Rc;

use slotmap::SlotMap;
use the_form_dom::ElementId;

use crate::inputs::InputController;

slotmap::new_key_type! {
  pub struct RuleId;
}

pub type Rule = Rc<dyn Fn(&Inputs<'_>) -> bool>;

/// An input discovered in the form markup.
pub struct InputRegistration {
  pub kind:       String,
  pub element:    ElementId,
  /// `None` when no module is registered for `kind`.
  pub controller: Option<Box<dyn InputController>>,
}

impl InputRegistration {
  pub fn controller(&self) -> Option<&dyn InputController> {
    self.controller.as_deref()
  }
}

/// Read-only view of the bound inputs handed to rules.
#[derive(Clone, Copy)]
pub struct Inputs<'a> {
  registrations: &'a [InputRegistration],
}

impl<'a> Inputs<'a> {
  pub fn new(registrations: &'a [InputRegistration]) -> Self {
    Self { registrations }
  }

  /// Every controller, in discovery order.
  pub fn iter(&self) -> impl Iterator<Item = &'a dyn InputController> + 'a {
    self
      .registrations
      .iter()
      .filter_map(InputRegistration::controller)
  }

  /// First controller answering to `name`.
  pub fn get(&self, name: &str) -> Option<&'a dyn InputController> {
    self.iter().find(|input| input.name() == name)
  }

  /// Every controller answering to `name`, for list fields.
  pub fn all(&self, name: &str) -> Vec<&'a dyn InputController> {
    self.iter().filter(|input| input.name() == name).collect()
  }

  pub fn value(&self, name: &str) -> Option<String> {
    self.get(name).and_then(|input| input.value())
  }
}

/// Enabled controllers validate individually.
pub fn every_input_valid(inputs: &Inputs<'_>) -> bool {
  inputs
    .iter()
    .all(|input| input.disabled() || input.validate())
}

#[derive(Default)]
pub struct Rules {
  rules: SlotMap<RuleId, Rule>,
  order: Vec<RuleId>,
}

impl Rules {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, rule: Rule) -> RuleId {
    let id = self.rules.insert(rule);
    self.order.push(id);
    id
  }

  /// Returns false when the rule was already removed.
  pub fn remove(&mut self, id: RuleId) -> bool {
    if self.rules.remove(id).is_none() {
      return false;
    }
    self.order.retain(|rule| *rule != id);
    true
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn check(&self, inputs: &Inputs<'_>) -> bool {
    self.order.iter().all(|id| (self.rules[*id])(inputs))
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::*;

  fn counting(calls: &Rc<Cell<usize>>, result: bool) -> Rule {
    let calls = calls.clone();
    Rc::new(move |_: &Inputs<'_>| {
      calls.set(calls.get() + 1);
      result
    })
  }

  #[test]
  fn removal_is_by_handle_not_position() {
    let calls = Rc::new(Cell::new(0));
    let mut rules = Rules::new();
    let first = rules.add(counting(&calls, true));
    let failing = rules.add(counting(&calls, false));
    let last = rules.add(counting(&calls, true));

    let none: Vec<InputRegistration> = Vec::new();
    let inputs = Inputs::new(&none);
    assert!(!rules.check(&inputs));

    assert!(rules.remove(failing));
    assert!(!rules.remove(failing));
    assert!(rules.check(&inputs));
    assert_eq!(rules.len(), 2);

    // removing out of order leaves the remaining handles valid
    assert!(rules.remove(last));
    assert!(rules.remove(first));
    assert!(rules.is_empty());
  }

  #[test]
  fn check_stops_at_first_failure() {
    let calls = Rc::new(Cell::new(0));
    let mut rules = Rules::new();
    rules.add(counting(&calls, false));
    rules.add(counting(&calls, true));
    let none: Vec<InputRegistration> = Vec::new();
    assert!(!rules.check(&Inputs::new(&none)));
    assert_eq!(calls.get(), 1);
  }

  #[test]
  fn empty_view_is_valid() {
    let none: Vec<InputRegistration> = Vec::new();
    assert!(every_input_valid(&Inputs::new(&none)));
  }
}
