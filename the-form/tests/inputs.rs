use std::{
  cell::RefCell,
  rc::Rc,
};

use futures_executor::block_on;
use the_form::{
  Form,
  FormConfig,
  FormError,
  FormEvent,
  FormOptions,
  ServerReply,
  inputs::{
    DigitCode,
    ERROR_CLASS,
    InputEvent,
    InputKind,
  },
  modules,
  snapshot::SnapshotValue,
};
use the_form_dom::{
  Dom,
  DomEvent,
  ElementId,
  EventResult,
  MemoryDom,
};

struct Signup {
  dom:     Rc<MemoryDom>,
  element: ElementId,
  code:    ElementId,
  submit:  ElementId,
}

fn signup() -> Signup {
  let dom = Rc::new(MemoryDom::new());
  let element = dom.build("form").attr("action", "/signup").id();
  let code = dom
    .build("div")
    .attr("data-form-input", "digit-code")
    .child_of(element);
  dom
    .build("input")
    .attr("data-form-input", "phone")
    .attr("type", "tel")
    .attr("name", "phone")
    .child_of(element);
  let plan = dom
    .build("div")
    .attr("data-form-input", "radio-group")
    .attr("data-name", "plan")
    .child_of(element);
  for value in ["basic", "pro"] {
    dom
      .build("input")
      .attr("type", "radio")
      .attr("name", "plan")
      .attr("value", value)
      .child_of(plan);
  }
  dom
    .build("input")
    .attr("type", "email")
    .attr("name", "email")
    .child_of(element);
  let submit = dom.build("button").child_of(element);
  Signup {
    dom,
    element,
    code,
    submit,
  }
}

fn bind(page: &Signup, options: FormOptions) -> Form {
  Form::new(
    page.dom.clone(),
    page.element,
    options.with_modules(&modules::builtin()),
  )
  .unwrap()
}

fn cells(page: &Signup) -> Vec<ElementId> {
  page
    .dom
    .find_all(page.code, &|element| {
      page.dom.has_class(element, "js-digitCodeInput")
    })
}

#[test]
fn every_tagged_input_gets_its_controller() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  let kinds: Vec<_> = form.with_registrations(|inputs| {
    inputs
      .iter()
      .filter_map(|input| input.controller())
      .map(|controller| (controller.kind(), controller.name()))
      .collect()
  });
  assert_eq!(kinds, vec![
    (InputKind::DigitCode, "code".to_string()),
    (InputKind::Phone, "phone".to_string()),
    (InputKind::RadioGroup, "plan".to_string()),
    (InputKind::Text, "email".to_string()),
  ]);
  // the generated cells are not picked up as text inputs
  assert_eq!(cells(&page).len(), 4);
}

#[test]
fn typing_the_code_walks_the_cells_and_validates() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  form.with_input("phone", |input| input.set_value("79991234567"));
  assert!(page.dom.disabled(page.submit));

  let cells = cells(&page);
  for (index, digit) in ["4", "2", "0", "7"].into_iter().enumerate() {
    let event = page.dom.type_text(cells[index], digit);
    assert!(!form.handle_event(&event).is_ignored());
  }
  assert_eq!(page.dom.active_element(), Some(cells[3]));
  assert_eq!(form.value("code").as_deref(), Some("4207"));
  assert!(form.validate());
  assert!(!page.dom.disabled(page.submit));
}

#[test]
fn paste_through_the_form_fills_every_cell() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  let cells = cells(&page);

  let paste = DomEvent::Paste {
    target: cells[1],
    text:   "8531".into(),
  };
  assert!(!form.handle_event(&paste).is_ignored());
  assert_eq!(form.value("code").as_deref(), Some("8531"));
  assert_eq!(form.data().get("code"), Some("8531"));
}

#[test]
fn payload_carries_every_controller() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  form.with_input("code", |input| input.set_value("1234"));
  form.with_input("phone", |input| input.set_value("375291234567"));
  form.with_input("plan", |input| input.set_value("pro"));
  form.with_input("email", |input| input.set_value("neo@matrix.io"));

  let data: Vec<_> = form.data().iter().map(|(name, value)| format!("{name}={value}")).collect();
  assert_eq!(data, vec![
    "code=1234",
    "phone=+375 (29) 123-45-67",
    "plan=pro",
    "email=neo@matrix.io",
  ]);
}

#[test]
fn radio_group_reports_one_check() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  let seen = Rc::new(RefCell::new(Vec::new()));
  let sink = seen.clone();
  form.on(move |_, event| {
    if let FormEvent::Input { name, event } = event {
      sink.borrow_mut().push((name.to_string(), (*event).clone()));
    }
    EventResult::Ignored
  });

  assert_eq!(form.with_input("plan", |input| input.set_value("team")), Some(false));
  assert!(seen.borrow().is_empty());

  assert_eq!(form.with_input("plan", |input| input.set_value("basic")), Some(true));
  assert_eq!(form.with_input("plan", |input| input.set_value("pro")), Some(true));
  assert_eq!(*seen.borrow(), vec![
    ("plan".to_string(), InputEvent::Check {
      value: "basic".into(),
    }),
    ("plan".to_string(), InputEvent::Check { value: "pro".into() }),
  ]);
  assert_eq!(form.value("plan").as_deref(), Some("pro"));
}

#[test]
fn reset_restores_defaults_and_resyncs() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  form.with_input("code", |input| input.set_value("1234"));
  form.with_input("phone", |input| input.set_value("79991234567"));
  assert!(form.changed());

  form.reset();
  assert_eq!(form.value("code").as_deref(), Some(""));
  assert_eq!(form.value("phone").as_deref(), Some(""));
  assert_eq!(form.data().get("code"), Some(""));
  assert!(page.dom.disabled(page.submit));
}

#[test]
fn digit_code_errors_mark_every_cell() {
  let page = signup();
  let form = bind(&page, FormOptions::default());
  block_on(form.show_field_errors(&ServerReply::fail([("code", "expired")])));

  assert!(cells(&page).into_iter().all(|cell| page.dom.has_class(cell, ERROR_CLASS)));
  block_on(form.reset_errors());
  assert!(cells(&page).into_iter().all(|cell| !page.dom.has_class(cell, ERROR_CLASS)));
}

#[test]
fn config_shapes_the_controllers() {
  let page = signup();
  let config = FormConfig::from_toml(
    r#"
      [modules.digit-code]
      length = 6
      name = "otp"
    "#,
  )
  .unwrap();
  let form = bind(&page, FormOptions::default().with_config(config));

  let length = form.with_input("otp", |input| {
    input
      .as_any()
      .downcast_ref::<DigitCode>()
      .map(DigitCode::len)
  });
  assert_eq!(length, Some(Some(6)));
  assert_eq!(cells(&page).len(), 6);
}

#[test]
fn bad_module_options_fail_construction() {
  let page = signup();
  let config = FormConfig::from_toml("[modules.radio-group]\ncolumns = 2").unwrap();
  let err = Form::new(
    page.dom.clone(),
    page.element,
    FormOptions::default()
      .with_modules(&modules::builtin())
      .with_config(config),
  )
  .err()
  .unwrap();
  assert!(matches!(err, FormError::Options { ref module, .. } if module == "radio-group"));
}

#[test]
fn list_fields_reach_every_input() {
  let dom = Rc::new(MemoryDom::new());
  let element = dom.build("form").id();
  let tags: Vec<ElementId> = ["rust", "forms"]
    .into_iter()
    .map(|tag| {
      dom
        .build("input")
        .attr("name", "tags[]")
        .attr("value", tag)
        .child_of(element)
    })
    .collect();
  let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();

  assert_eq!(form.with_inputs("tags[]", |_| {}), 2);
  assert_eq!(
    form.snapshot().get("tags[]"),
    Some(&SnapshotValue::List(vec!["rust".into(), "forms".into()]))
  );

  block_on(form.show_field_errors(&ServerReply::fail([("tags[]", "unknown tag")])));
  assert!(tags.iter().all(|tag| dom.has_class(*tag, ERROR_CLASS)));
}

#[test]
fn unbound_types_stay_out_of_validation() {
  let dom = Rc::new(MemoryDom::new());
  let element = dom.build("form").id();
  dom
    .build("div")
    .attr("data-form-input", "calendar")
    .attr("required", "")
    .child_of(element);
  let form = Form::new(dom, element, FormOptions::default()).unwrap();

  assert!(form.validate());
  assert!(!form.has_module("calendar"));
  assert_eq!(form.with_registrations(|inputs| inputs.len()), 1);
}
