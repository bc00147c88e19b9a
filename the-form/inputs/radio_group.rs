use std::any::Any;

use serde::Deserialize;
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
  Radio,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct RadioGroupOptions {
  /// Logical field name, `data-name` of the group element when unset.
  pub name: Option<String>,
}

/// Several radios acting as one field.
pub struct RadioGroup {
  base:   InputBase,
  radios: Vec<Radio>,
  name:   String,
}

impl RadioGroup {
  pub fn new(dom: DomRef, element: ElementId, options: RadioGroupOptions) -> Self {
    let radios: Vec<Radio> = dom
      .find_all(element, &|el| {
        dom.tag(el) == "input" && dom.control_type(el) == "radio"
      })
      .into_iter()
      .map(|el| Radio::new(dom.clone(), el))
      .collect();

    let name = options
      .name
      .or_else(|| dom.attribute(element, "data-name"))
      .or_else(|| radios.first().map(|radio| radio.name()))
      .unwrap_or_default();
    log::debug!("radio group {name:?} bound {} radios", radios.len());

    Self {
      base: InputBase::new(dom, element),
      radios,
      name,
    }
  }

  pub fn radios(&self) -> &[Radio] {
    &self.radios
  }

  pub fn checked(&self) -> Option<&Radio> {
    self.radios.iter().find(|radio| radio.checked())
  }

  // turns child flips to checked into group notifications
  fn collect_child_events(&mut self) {
    for radio in &mut self.radios {
      for event in radio.take_events() {
        if event == (InputEvent::Toggle { checked: true }) {
          let value = radio.value().unwrap_or_default();
          self.base.emit(InputEvent::Check { value });
        }
      }
    }
  }
}

impl InputController for RadioGroup {
  fn kind(&self) -> InputKind {
    InputKind::RadioGroup
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
    self.checked().and_then(|radio| radio.value())
  }

  fn set_value(&mut self, value: &str) -> bool {
    let Some(radio) = self
      .radios
      .iter_mut()
      .find(|radio| radio.value().as_deref() == Some(value))
    else {
      return false;
    };
    radio.set_checked(true);
    self.collect_child_events();
    true
  }

  fn disabled(&self) -> bool {
    !self.radios.is_empty() && self.radios.iter().all(|radio| radio.disabled())
  }

  fn set_disabled(&mut self, disabled: bool) {
    for radio in &mut self.radios {
      radio.set_disabled(disabled);
      radio.take_events();
    }
    self.base.emit(InputEvent::Disabled { disabled });
  }

  fn name(&self) -> String {
    self.name.clone()
  }

  fn validate(&self) -> bool {
    let dom = self.base.dom();
    let required = dom.required(self.base.element())
      || self
        .radios
        .iter()
        .any(|radio| dom.required(radio.input()));
    !required || self.value().is_some()
  }

  fn handle_event(&mut self, event: &DomEvent) -> EventResult {
    let result = self
      .radios
      .iter_mut()
      .map(|radio| radio.handle_event(event))
      .fold(EventResult::Ignored, EventResult::or);
    self.collect_child_events();
    result
  }

  fn focus(&mut self) -> bool {
    let index = self
      .radios
      .iter()
      .position(|radio| radio.checked())
      .unwrap_or(0);
    match self.radios.get_mut(index) {
      Some(radio) => radio.focus(),
      None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use the_form_dom::MemoryDom;

  use super::*;

  fn group(checked: &str) -> (Rc<MemoryDom>, RadioGroup) {
    let dom = Rc::new(MemoryDom::new());
    let form = dom.build("form").id();
    let wrapper = dom
      .build("div")
      .attr("data-form-input", "radio-group")
      .attr("data-name", "plan")
      .child_of(form);
    for value in ["basic", "pro", "team"] {
      let radio = dom
        .build("input")
        .attr("type", "radio")
        .attr("name", "plan")
        .attr("value", value);
      let radio = if value == checked {
        radio.attr("checked", "")
      } else {
        radio
      };
      radio.child_of(wrapper);
    }
    let group = RadioGroup::new(dom.clone(), wrapper, RadioGroupOptions::default());
    (dom, group)
  }

  #[test]
  fn missing_option_leaves_state_unchanged() {
    let (_, mut group) = group("basic");
    assert!(!group.set_value("enterprise"));
    assert_eq!(group.value().as_deref(), Some("basic"));
    assert!(group.take_events().is_empty());
  }

  #[test]
  fn existing_option_is_checked_once() {
    let (dom, mut group) = group("basic");
    assert!(group.set_value("pro"));
    assert_eq!(group.value().as_deref(), Some("pro"));
    assert!(!dom.checked(group.radios()[0].input()));
    assert_eq!(group.take_events().as_slice(), &[InputEvent::Check {
      value: "pro".into(),
    }]);

    assert!(group.set_value("pro"));
    assert!(group.take_events().is_empty());
  }

  #[test]
  fn name_comes_from_data_attribute_or_options() {
    let (dom, group) = group("");
    assert_eq!(group.name(), "plan");
    assert_eq!(group.value(), None);

    let renamed = RadioGroup::new(dom, group.base().element(), RadioGroupOptions {
      name: Some("tier".into()),
    });
    assert_eq!(renamed.name(), "tier");
  }

  #[test]
  fn required_group_needs_a_choice() {
    let (dom, mut group) = group("");
    dom.set_attribute(group.base().element(), "required", "");
    assert!(!group.validate());
    group.set_value("team");
    assert!(group.validate());
  }

  #[test]
  fn user_click_is_reported_as_check() {
    let (dom, mut group) = group("basic");
    let team = group.radios()[2].input();
    dom.set_checked(team, true);
    let result = group.handle_event(&DomEvent::Change { target: team });
    assert!(result.is_consumed());
    assert_eq!(group.take_events().as_slice(), &[InputEvent::Check {
      value: "team".into(),
    }]);
  }

  #[test]
  fn disabling_reaches_every_radio() {
    let (dom, mut group) = group("basic");
    group.set_disabled(true);
    assert!(group.disabled());
    assert!(group.radios().iter().all(|radio| dom.disabled(radio.input())));
    assert_eq!(group.take_events().as_slice(), &[InputEvent::Disabled {
      disabled: true,
    }]);
  }
}
