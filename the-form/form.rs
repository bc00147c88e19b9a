//! The form engine.
//!
//! A [`Form`] binds the inputs found in a form element to controllers,
//! validates them through its rules, tracks whether the content changed since
//! the last baseline and drives submissions through a [`Transport`].
//!
//! `Form` is a cheap handle; clones share the same state. No state borrow is
//! ever held across an await point, so DOM events keep flowing into a form
//! whose submission is in flight. Controllers run outside the state borrow
//! too: a closure handed to [`Form::with_input`] may call back into the form,
//! it only cannot reach the controller it is running on.

use std::{
  cell::RefCell,
  rc::Rc,
};

use futures_util::{
  FutureExt,
  future::{
    self,
    LocalBoxFuture,
  },
};
use slotmap::SlotMap;
use the_form_dom::{
  Dom,
  DomEvent,
  DomRef,
  ElementId,
  EventResult,
  Key,
};

use crate::{
  FormConfig,
  Result,
  SubmitError,
  inputs::{
    InputController,
    InputEvent,
  },
  modules::{
    self,
    ModuleRegistry,
  },
  rules::{
    InputRegistration,
    Inputs,
    Rule,
    RuleId,
    Rules,
    every_input_valid,
  },
  snapshot::{
    Baseline,
    FormData,
    Snapshot,
    is_list_name,
  },
  transport::{
    NoTransport,
    REQUESTED_WITH,
    ServerReply,
    SubmitRequest,
    Transport,
  },
};

/// Attribute naming the input type of an element.
pub const INPUT_ATTRIBUTE: &str = "data-form-input";

const TEXT_LIKE_TYPES: &[&str] = &["text", "tel", "password", "email"];

slotmap::new_key_type! {
  pub struct ListenerId;
}

/// Notifications a form hands to its listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormEvent<'a> {
  /// A submission passed validation; consuming it cancels the submission.
  BeforeSubmit,
  /// The server accepted the submission; consuming it keeps the reply from
  /// the caller.
  Submit(&'a ServerReply),
  /// The server rejected the submission; consuming it skips field errors.
  Error(&'a ServerReply),
  /// A controller reported a change.
  Input {
    name:  &'a str,
    event: &'a InputEvent,
  },
}

pub type Listener = Rc<dyn Fn(&Form, &FormEvent<'_>) -> EventResult>;

#[derive(Default)]
struct Listeners {
  entries: SlotMap<ListenerId, Listener>,
  order:   Vec<ListenerId>,
}

impl Listeners {
  fn snapshot(&self) -> Vec<Listener> {
    self
      .order
      .iter()
      .filter_map(|id| self.entries.get(*id).cloned())
      .collect()
  }
}

#[derive(Debug)]
pub enum SubmitOutcome {
  /// The server accepted the submission and nobody consumed the reply.
  Accepted(ServerReply),
  /// A listener consumed the server reply.
  Handled,
  /// A `before_submit` listener cancelled the submission.
  Cancelled,
}

pub type SubmitResult = std::result::Result<SubmitOutcome, SubmitError>;
pub type Submission = LocalBoxFuture<'static, SubmitResult>;

/// What the host should do after forwarding a DOM event.
pub enum FormResponse {
  Ignored,
  Handled,
  /// The event asked for a submission; the host drives the future.
  Submit(Submission),
}

impl FormResponse {
  pub fn is_ignored(&self) -> bool {
    matches!(self, Self::Ignored)
  }
}

pub struct FormOptions {
  /// Modules overriding the process-wide ones for this form.
  pub modules:   ModuleRegistry,
  pub config:    Option<FormConfig>,
  /// Rules run after the built-in one.
  pub rules:     Vec<Rule>,
  pub transport: Rc<dyn Transport>,
}

impl Default for FormOptions {
  fn default() -> Self {
    Self {
      modules:   ModuleRegistry::new(),
      config:    None,
      rules:     Vec::new(),
      transport: Rc::new(NoTransport),
    }
  }
}

impl FormOptions {
  #[must_use]
  pub fn with_modules(mut self, modules: &ModuleRegistry) -> Self {
    self.modules.merge(modules);
    self
  }

  #[must_use]
  pub fn with_config(mut self, config: FormConfig) -> Self {
    self.config = Some(config);
    self
  }

  #[must_use]
  pub fn with_rule(mut self, rule: impl Fn(&Inputs<'_>) -> bool + 'static) -> Self {
    self.rules.push(Rc::new(rule));
    self
  }

  #[must_use]
  pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
    self.transport = Rc::new(transport);
    self
  }
}

struct FormState {
  modules:     ModuleRegistry,
  inputs:      Vec<InputRegistration>,
  rules:       Rules,
  baseline:    Baseline,
  // latched once the content left the baseline
  dirty:       bool,
  // `Some` while locked, holding what the lock disabled
  locked:      Option<Vec<ElementId>>,
  last_active: Option<ElementId>,
}

struct FormInner {
  dom:       DomRef,
  element:   ElementId,
  transport: Rc<dyn Transport>,
  state:     RefCell<FormState>,
  listeners: RefCell<Listeners>,
}

#[derive(Clone)]
pub struct Form {
  inner: Rc<FormInner>,
}

/// Events drained from controllers, tagged with the field name.
type Drained = Vec<(String, InputEvent)>;

fn drain(controller: &mut dyn InputController, out: &mut Drained) {
  let events = controller.take_events();
  if events.is_empty() {
    return;
  }
  let name = controller.name();
  out.extend(events.into_iter().map(|event| (name.clone(), event)));
}

fn is_text_like(dom: &dyn Dom, element: ElementId) -> bool {
  match dom.tag(element).as_str() {
    "textarea" => true,
    "input" => TEXT_LIKE_TYPES.contains(&dom.control_type(element).as_str()),
    _ => false,
  }
}

/// Inputs of `form` in registration order: tagged elements first, then
/// untagged text-like controls outside any tagged element.
fn discover(dom: &dyn Dom, form: ElementId) -> Vec<(String, ElementId)> {
  let mut found: Vec<(String, ElementId)> = dom
    .find_all(form, &|element| dom.has_attribute(element, INPUT_ATTRIBUTE))
    .into_iter()
    .map(|element| {
      let kind = dom.attribute(element, INPUT_ATTRIBUTE).unwrap_or_default();
      (kind, element)
    })
    .collect();

  found.extend(
    dom
      .find_all(form, &|element| {
        is_text_like(dom, element)
          && dom
            .closest_with_attribute(element, INPUT_ATTRIBUTE)
            .is_none()
      })
      .into_iter()
      .map(|element| (modules::TEXT.to_string(), element)),
  );
  found
}

impl Form {
  /// Binds the form `element`, using the process-wide modules merged with
  /// `options.modules`.
  pub fn new(dom: DomRef, element: ElementId, options: FormOptions) -> Result<Self> {
    Self::with_registry(dom, element, modules::global(), options)
  }

  /// Binds the form `element` with `registry` in place of the process-wide
  /// modules.
  pub fn with_registry(
    dom: DomRef,
    element: ElementId,
    mut registry: ModuleRegistry,
    options: FormOptions,
  ) -> Result<Self> {
    registry.merge(&options.modules);
    if let Some(config) = &options.config {
      config.apply(&mut registry);
    }

    let mut inputs = Vec::new();
    for (kind, input) in discover(&*dom, element) {
      let controller = match registry.create(&kind, &dom, input) {
        Some(controller) => Some(controller?),
        None => {
          log::debug!("no module for input type {kind:?}, left unbound");
          None
        },
      };
      inputs.push(InputRegistration {
        kind,
        element: input,
        controller,
      });
    }
    // construction noise is not a change
    for registration in &mut inputs {
      if let Some(controller) = registration.controller.as_deref_mut() {
        controller.take_events();
      }
    }
    log::debug!(
      "form {element:?} bound {} inputs ({} with a controller)",
      inputs.len(),
      inputs
        .iter()
        .filter(|input| input.controller.is_some())
        .count()
    );

    let mut rules = Rules::new();
    rules.add(Rc::new(every_input_valid));
    for rule in options.rules {
      rules.add(rule);
    }

    let form = Self {
      inner: Rc::new(FormInner {
        dom,
        element,
        transport: options.transport,
        state: RefCell::new(FormState {
          modules: registry,
          inputs,
          rules,
          baseline: Baseline::Forced,
          dirty: false,
          locked: None,
          last_active: None,
        }),
        listeners: RefCell::new(Listeners::default()),
      }),
    };
    form.set_changed(false);
    form.validate();
    Ok(form)
  }

  /// Adds `modules` to the process-wide registry used by forms built later.
  pub fn use_modules(modules: &ModuleRegistry) {
    modules::use_global(modules);
  }

  pub fn element(&self) -> ElementId {
    self.inner.element
  }

  pub fn dom(&self) -> &DomRef {
    &self.inner.dom
  }

  pub fn transport_name(&self) -> &'static str {
    self.inner.transport.name()
  }

  /// Whether a module for `kind` was available when the form was built.
  pub fn has_module(&self, kind: &str) -> bool {
    self.inner.state.borrow().modules.contains(kind)
  }

  pub fn with_registrations<R>(&self, f: impl FnOnce(&[InputRegistration]) -> R) -> R {
    f(&self.inner.state.borrow().inputs)
  }

  pub fn on(&self, listener: impl Fn(&Form, &FormEvent<'_>) -> EventResult + 'static) -> ListenerId {
    let mut listeners = self.inner.listeners.borrow_mut();
    let id = listeners.entries.insert(Rc::new(listener));
    listeners.order.push(id);
    id
  }

  pub fn off(&self, id: ListenerId) -> bool {
    let mut listeners = self.inner.listeners.borrow_mut();
    if listeners.entries.remove(id).is_none() {
      return false;
    }
    listeners.order.retain(|listener| *listener != id);
    true
  }

  /// Runs every listener; the event counts as consumed when any of them
  /// consumed it.
  fn emit(&self, event: &FormEvent<'_>) -> EventResult {
    let listeners = self.inner.listeners.borrow().snapshot();
    listeners
      .iter()
      .fold(EventResult::Ignored, |result, listener| {
        result.or(listener(self, event))
      })
  }

  fn flush(&self, drained: Drained) {
    if drained.is_empty() {
      return;
    }
    let edited = drained
      .iter()
      .any(|(_, event)| !matches!(event, InputEvent::Disabled { .. }));
    if edited {
      self.track_changes();
    }
    for (name, event) in &drained {
      self.emit(&FormEvent::Input { name, event });
    }
    self.validate();
  }

  // latches the changed state after an edit, so reverting it does not clear
  // it; a locked form has its controls disabled and is never compared
  fn track_changes(&self) {
    {
      let state = self.inner.state.borrow();
      if state.dirty || state.locked.is_some() {
        return;
      }
    }
    if self.differs_from_baseline() {
      self.inner.state.borrow_mut().dirty = true;
    }
  }

  fn differs_from_baseline(&self) -> bool {
    let serialized = self.serialize();
    self.inner.state.borrow().baseline.differs_from(&serialized)
  }

  /// Registration indices of the controllers matching `predicate`, in
  /// discovery order.
  fn find_controllers(&self, predicate: impl Fn(&dyn InputController) -> bool) -> Vec<usize> {
    let state = self.inner.state.borrow();
    state
      .inputs
      .iter()
      .enumerate()
      .filter(|(_, input)| input.controller().is_some_and(&predicate))
      .map(|(index, _)| index)
      .collect()
  }

  /// Runs `f` on the controller of registration `index` with the controller
  /// taken out of the state, so `f` may use the form. `None` when there is no
  /// controller or it is already in use further up the stack.
  fn run_controller<R>(
    &self,
    index: usize,
    drained: &mut Drained,
    f: impl FnOnce(&mut dyn InputController) -> R,
  ) -> Option<R> {
    let mut controller = self
      .inner
      .state
      .borrow_mut()
      .inputs
      .get_mut(index)?
      .controller
      .take()?;
    let result = f(&mut *controller);
    drain(&mut *controller, drained);
    if let Some(input) = self.inner.state.borrow_mut().inputs.get_mut(index) {
      input.controller = Some(controller);
    }
    Some(result)
  }

  /// Runs `f` on the first controller answering to `name`.
  ///
  /// `f` may call back into the form; the controller it runs on is out of
  /// the form meanwhile, so lookups of `name` from inside `f` see nothing.
  pub fn with_input<R>(
    &self,
    name: &str,
    f: impl FnOnce(&mut dyn InputController) -> R,
  ) -> Option<R> {
    let index = *self
      .find_controllers(|controller| controller.name() == name)
      .first()?;
    let mut drained = Drained::new();
    let result = self.run_controller(index, &mut drained, f);
    self.flush(drained);
    result
  }

  /// Runs `f` on every controller answering to `name`, returning how many
  /// there were.
  pub fn with_inputs(&self, name: &str, mut f: impl FnMut(&mut dyn InputController)) -> usize {
    let mut drained = Drained::new();
    let count = self
      .find_controllers(|controller| controller.name() == name)
      .into_iter()
      .filter_map(|index| self.run_controller(index, &mut drained, &mut f))
      .count();
    self.flush(drained);
    count
  }

  pub fn value(&self, name: &str) -> Option<String> {
    let state = self.inner.state.borrow();
    Inputs::new(&state.inputs).value(name)
  }

  /// Adds a rule after the existing ones, validating right away when
  /// `run_now` is set.
  pub fn add_rule(&self, rule: impl Fn(&Inputs<'_>) -> bool + 'static, run_now: bool) -> RuleId {
    let id = self.inner.state.borrow_mut().rules.add(Rc::new(rule));
    if run_now {
      self.validate();
    }
    id
  }

  pub fn remove_rule(&self, id: RuleId) -> bool {
    let removed = self.inner.state.borrow_mut().rules.remove(id);
    if removed {
      self.validate();
    }
    removed
  }

  /// Runs every rule and enables the submit triggers only when all pass.
  pub fn validate(&self) -> bool {
    let valid = {
      let state = self.inner.state.borrow();
      state.rules.check(&Inputs::new(&state.inputs))
    };
    let dom = &self.inner.dom;
    for button in self.submit_buttons() {
      dom.set_disabled(button, !valid);
    }
    valid
  }

  pub fn submit_buttons(&self) -> Vec<ElementId> {
    let dom = &self.inner.dom;
    dom
      .form_elements(self.inner.element)
      .into_iter()
      .filter(|element| dom.control_type(*element) == "submit")
      .collect()
  }

  /// The submit payload.
  pub fn data(&self) -> FormData {
    FormData::collect(&*self.inner.dom, self.inner.element)
  }

  pub fn snapshot(&self) -> Snapshot {
    Snapshot::from_data(&self.data())
  }

  pub fn serialize(&self) -> String {
    self.snapshot().to_json()
  }

  /// Whether the content left the last baseline at any point since it was
  /// taken. Editing a field back to its old value does not clear it; only
  /// edits latch, asking never does.
  pub fn changed(&self) -> bool {
    {
      let state = self.inner.state.borrow();
      if state.dirty {
        return true;
      }
      if state.locked.is_some() {
        return false;
      }
    }
    self.differs_from_baseline()
  }

  /// `false` takes the current content as the new baseline, `true` makes the
  /// form read as changed until the next baseline.
  pub fn set_changed(&self, changed: bool) {
    let baseline = if changed {
      Baseline::Forced
    } else {
      Baseline::Serialized(self.serialize())
    };
    let mut state = self.inner.state.borrow_mut();
    state.baseline = baseline;
    state.dirty = changed;
  }

  pub fn locked(&self) -> bool {
    self.inner.state.borrow().locked.is_some()
  }

  /// Disables every control except the submit triggers. Returns false when
  /// already locked.
  pub fn lock(&self) -> bool {
    let mut state = self.inner.state.borrow_mut();
    if state.locked.is_some() {
      return false;
    }

    let dom = &self.inner.dom;
    let form = self.inner.element;
    dom.set_disabled(form, true);
    let disabled: Vec<ElementId> = dom
      .form_elements(form)
      .into_iter()
      .filter(|element| !dom.disabled(*element) && dom.control_type(*element) != "submit")
      .collect();
    for element in &disabled {
      dom.set_disabled(*element, true);
    }
    log::debug!("form {form:?} locked, {} controls disabled", disabled.len());
    state.locked = Some(disabled);
    true
  }

  /// Locks the form until the guard is dropped, `None` when already locked.
  pub fn lock_guard(&self) -> Option<LockGuard> {
    self.lock().then(|| LockGuard { form: self.clone() })
  }

  /// Re-enables what `lock` disabled and returns focus to the last focused
  /// element. Returns false when not locked.
  pub fn unlock(&self) -> bool {
    let (disabled, last_active) = {
      let mut state = self.inner.state.borrow_mut();
      let Some(disabled) = state.locked.take() else {
        return false;
      };
      (disabled, state.last_active)
    };

    let dom = &self.inner.dom;
    for element in disabled {
      dom.set_disabled(element, false);
    }
    dom.set_disabled(self.inner.element, false);
    if let Some(element) = last_active {
      dom.focus(element);
    }
    log::debug!("form {:?} unlocked", self.inner.element);
    true
  }

  /// Clears the error display of every controller.
  pub fn reset_errors(&self) -> LocalBoxFuture<'static, ()> {
    let transitions: Vec<_> = {
      let state = self.inner.state.borrow();
      Inputs::new(&state.inputs)
        .iter()
        .map(|input| input.reset_error())
        .collect()
    };
    future::join_all(transitions).map(|_| ()).boxed_local()
  }

  /// Shows the messages of `reply.fields` on the matching controllers. A list
  /// name reaches every controller carrying it, other names only the first.
  pub fn show_field_errors(&self, reply: &ServerReply) -> LocalBoxFuture<'static, ()> {
    let transitions: Vec<_> = {
      let state = self.inner.state.borrow();
      let inputs = Inputs::new(&state.inputs);
      let mut transitions = Vec::new();
      for (name, message) in reply.field_errors() {
        let targets = if is_list_name(name) {
          inputs.all(name)
        } else {
          inputs.get(name).into_iter().collect()
        };
        if targets.is_empty() {
          log::warn!("server error for unknown field {name:?} skipped");
          continue;
        }
        transitions.extend(targets.into_iter().map(|input| input.set_error(&message)));
      }
      transitions
    };
    future::join_all(transitions).map(|_| ()).boxed_local()
  }

  fn request(&self) -> SubmitRequest {
    let dom = &self.inner.dom;
    let form = self.inner.element;
    let method = dom
      .attribute(form, "method")
      .map(|method| method.trim().to_ascii_uppercase())
      .filter(|method| !method.is_empty())
      .unwrap_or_else(|| "GET".to_string());
    SubmitRequest {
      action: dom.attribute(form, "action").unwrap_or_default(),
      method,
      headers: vec![(REQUESTED_WITH.0.to_string(), REQUESTED_WITH.1.to_string())],
      data: self.data(),
    }
  }

  /// Starts a submission.
  ///
  /// The guards, the `before_submit` notification and the lock run right
  /// away; the returned future covers the network round trip. The form is
  /// unlocked when that future completes or is dropped.
  pub fn submit(&self) -> Submission {
    if self.locked() {
      return future::ready(Err(SubmitError::AlreadySubmitting)).boxed_local();
    }
    if !self.validate() {
      return future::ready(Err(SubmitError::ValidationFailed)).boxed_local();
    }
    if self.emit(&FormEvent::BeforeSubmit).is_consumed() {
      log::debug!("submission of {:?} cancelled", self.inner.element);
      return future::ready(Ok(SubmitOutcome::Cancelled)).boxed_local();
    }

    let resets = self.reset_errors();
    self.set_changed(false);
    let request = self.request();
    let Some(guard) = self.lock_guard() else {
      return future::ready(Err(SubmitError::AlreadySubmitting)).boxed_local();
    };

    let form = self.clone();
    let sent = self.inner.transport.send(request);
    async move {
      let (reply, ()) = future::join(sent, resets).await;
      let reply = match reply {
        Ok(reply) => reply,
        Err(err) => {
          log::warn!("form submission failed: {err}");
          return Err(SubmitError::Transport(err));
        },
      };

      if reply.is_ok() {
        if form.emit(&FormEvent::Submit(&reply)).is_consumed() {
          return Ok(SubmitOutcome::Handled);
        }
        return Ok(SubmitOutcome::Accepted(reply));
      }

      if form.emit(&FormEvent::Error(&reply)).is_consumed() {
        return Ok(SubmitOutcome::Handled);
      }
      let shown = form.show_field_errors(&reply);
      drop(guard);
      shown.await;
      Err(SubmitError::Rejected(reply))
    }
    .boxed_local()
  }

  /// Re-reads every controller from the DOM, after the form was reset.
  fn resync(&self) {
    let mut drained = Drained::new();
    {
      let mut state = self.inner.state.borrow_mut();
      for controller in state
        .inputs
        .iter_mut()
        .filter_map(|input| input.controller.as_deref_mut())
      {
        controller.sync();
        drain(controller, &mut drained);
      }
    }
    self.flush(drained);
    self.validate();
  }

  /// Restores the default values of every control.
  pub fn reset(&self) {
    self.inner.dom.reset(self.inner.element);
    self.resync();
  }

  /// Forwards a DOM event raised inside the form.
  pub fn handle_event(&self, event: &DomEvent) -> FormResponse {
    let dom = &self.inner.dom;
    let form = self.inner.element;
    let target = event.target();
    if !dom.contains(form, target) {
      return FormResponse::Ignored;
    }

    match event {
      DomEvent::Submit { .. } if target == form => return FormResponse::Submit(self.submit()),
      DomEvent::KeyDown { key, .. } if key.key == Key::Enter && key.modifiers.ctrl() => {
        return FormResponse::Submit(self.submit());
      },
      DomEvent::Reset { .. } if target == form => {
        self.resync();
        return FormResponse::Handled;
      },
      DomEvent::FocusIn { .. } => {
        self.inner.state.borrow_mut().last_active = Some(target);
      },
      _ => {},
    }

    let mut drained = Drained::new();
    let result = self
      .find_controllers(|controller| controller.contains(target))
      .first()
      .and_then(|index| {
        self.run_controller(*index, &mut drained, |controller| {
          controller.handle_event(event)
        })
      })
      .unwrap_or(EventResult::Ignored);

    let edits = matches!(event, DomEvent::Input { .. } | DomEvent::Change { .. });
    if drained.is_empty() && edits {
      self.track_changes();
      self.validate();
    }
    self.flush(drained);

    if result.is_consumed() || edits {
      FormResponse::Handled
    } else {
      FormResponse::Ignored
    }
  }
}

/// Unlocks the form when dropped.
pub struct LockGuard {
  form: Form,
}

impl Drop for LockGuard {
  fn drop(&mut self) {
    self.form.unlock();
  }
}

#[cfg(test)]
mod tests {
  use the_form_dom::MemoryDom;

  use super::*;

  fn login() -> (Rc<MemoryDom>, ElementId) {
    let dom = Rc::new(MemoryDom::new());
    let form = dom
      .build("form")
      .attr("action", "/login")
      .attr("method", "post")
      .id();
    dom
      .build("input")
      .attr("type", "email")
      .attr("name", "email")
      .attr("required", "")
      .child_of(form);
    dom
      .build("input")
      .attr("type", "hidden")
      .attr("name", "token")
      .attr("value", "t0k")
      .child_of(form);
    dom.build("button").attr("type", "submit").child_of(form);
    (dom, form)
  }

  #[test]
  fn discovery_binds_tagged_then_text_like() {
    let dom = Rc::new(MemoryDom::new());
    let form = dom.build("form").id();
    let plain = dom.build("input").attr("name", "name").child_of(form);
    let tagged = dom
      .build("div")
      .attr("data-form-input", "calendar")
      .child_of(form);
    dom
      .build("input")
      .attr("type", "text")
      .attr("name", "inner")
      .child_of(tagged);
    let notes = dom.build("textarea").attr("name", "notes").child_of(form);
    dom
      .build("input")
      .attr("type", "checkbox")
      .attr("name", "agree")
      .child_of(form);

    let form = Form::with_registry(dom, form, modules::builtin(), FormOptions::default()).unwrap();
    let bound: Vec<_> = form.with_registrations(|inputs| {
      inputs
        .iter()
        .map(|input| (input.kind.clone(), input.element, input.controller.is_some()))
        .collect()
    });
    assert_eq!(bound, vec![
      ("calendar".to_string(), tagged, false),
      ("text".to_string(), plain, true),
      ("text".to_string(), notes, true),
    ]);
  }

  #[test]
  fn lock_twice_is_a_no_op() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    assert!(form.lock());
    assert!(!form.lock());
    assert!(form.locked());
    assert!(form.unlock());
    assert!(!form.unlock());
  }

  #[test]
  fn guard_unlocks_on_drop() {
    let (dom, element) = login();
    let form = Form::new(dom, element, FormOptions::default()).unwrap();
    {
      let _guard = form.lock_guard().unwrap();
      assert!(form.locked());
      assert!(form.lock_guard().is_none());
    }
    assert!(!form.locked());
  }

  #[test]
  fn lock_restores_exactly_what_it_disabled() {
    let (dom, element) = login();
    let already = dom
      .build("input")
      .attr("name", "readonly")
      .attr("disabled", "")
      .child_of(element);
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    form.with_input("email", |input| input.set_value("a@b.c"));
    let button = form.submit_buttons()[0];
    assert!(!dom.disabled(button));

    form.lock();
    let email = dom.form_elements(element)[0];
    assert!(dom.disabled(email));
    assert!(dom.disabled(element));
    assert!(!dom.disabled(button));

    form.unlock();
    assert!(!dom.disabled(email));
    assert!(dom.disabled(already));
    assert!(!dom.disabled(element));
  }

  #[test]
  fn unlock_refocuses_last_active_element() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    let email = dom.form_elements(element)[0];
    form.handle_event(&DomEvent::FocusIn { target: email });

    form.lock();
    dom.focus(element);
    form.unlock();
    assert_eq!(dom.active_element(), Some(email));
  }

  #[test]
  fn submit_buttons_follow_validity() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    let button = form.submit_buttons()[0];
    assert!(dom.disabled(button));

    form.with_input("email", |input| input.set_value("a@b.c"));
    assert!(!dom.disabled(button));
  }

  #[test]
  fn rules_are_anded_and_removable() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    form.with_input("email", |input| input.set_value("a@b.c"));
    assert!(form.validate());

    let id = form.add_rule(|inputs| inputs.value("email").is_some_and(|v| v.ends_with(".org")), true);
    assert!(!form.validate());
    assert!(dom.disabled(form.submit_buttons()[0]));

    assert!(form.remove_rule(id));
    assert!(!form.remove_rule(id));
    assert!(form.validate());
  }

  #[test]
  fn disabling_through_accessor_revalidates() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    let button = form.submit_buttons()[0];
    assert!(dom.disabled(button));

    form.with_input("email", |input| input.set_disabled(true));
    assert!(!dom.disabled(button));
  }

  #[test]
  fn disabling_a_control_is_not_an_edit() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    form.with_input("email", |input| input.set_value("x@y.z"));
    form.set_changed(false);

    form.with_input("email", |input| input.set_disabled(true));
    assert!(!form.changed());
    form.with_input("email", |input| input.set_disabled(false));
    assert!(!form.changed());
  }

  #[test]
  fn input_closures_may_use_the_form() {
    let dom = Rc::new(MemoryDom::new());
    let element = dom.build("form").id();
    dom
      .build("input")
      .attr("name", "a")
      .attr("value", "x")
      .child_of(element);
    dom.build("input").attr("name", "b").child_of(element);
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();

    let copied = form.with_input("b", |input| {
      let value = form.value("a").unwrap_or_default();
      assert!(form.with_input("b", |_| ()).is_none());
      input.set_value(&value)
    });
    assert_eq!(copied, Some(true));
    assert_eq!(form.value("b").as_deref(), Some("x"));
    assert!(form.changed());

    let visited = form.with_inputs("a", |input| {
      form.with_input("b", |other| other.set_value("y"));
      input.set_value("z");
    });
    assert_eq!(visited, 1);
    assert_eq!(form.value("a").as_deref(), Some("z"));
    assert_eq!(form.value("b").as_deref(), Some("y"));
  }

  #[test]
  fn changed_state_is_sticky() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    assert!(!form.changed());

    form.with_input("email", |input| input.set_value("x@y.z"));
    assert!(form.changed());
    form.set_changed(false);
    assert!(!form.changed());

    // edited and reverted without anyone asking in between
    form.with_input("email", |input| input.set_value("other@y.z"));
    form.with_input("email", |input| input.set_value("x@y.z"));
    assert!(form.changed());

    form.set_changed(false);
    assert!(!form.changed());
    form.set_changed(true);
    assert!(form.changed());
  }

  #[test]
  fn input_events_reach_listeners() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    form.on(move |_, event| {
      if let FormEvent::Input { name, event } = event {
        sink.borrow_mut().push((name.to_string(), (*event).clone()));
      }
      EventResult::Ignored
    });

    let email = dom.form_elements(element)[0];
    let event = dom.type_text(email, "a");
    assert!(!form.handle_event(&event).is_ignored());
    assert_eq!(*seen.borrow(), vec![("email".to_string(), InputEvent::Change {
      value: "a".into(),
    })]);
  }

  #[test]
  fn events_outside_the_form_are_ignored() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    let stray = dom.build("input").id();
    assert!(form.handle_event(&DomEvent::Change { target: stray }).is_ignored());
  }

  #[test]
  fn request_carries_action_method_and_header() {
    let (dom, element) = login();
    let form = Form::new(dom.clone(), element, FormOptions::default()).unwrap();
    let request = form.request();
    assert_eq!(request.action, "/login");
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("X-Requested-With"), Some("XMLHttpRequest"));
    assert_eq!(request.data.get("token"), Some("t0k"));

    dom.remove_attribute(element, "method");
    assert_eq!(form.request().method, "GET");
  }
}
