//! In-memory element tree.
//!
//! Implements the subset of DOM behavior the form engine relies on: dirty
//! values over default attributes, radio group exclusivity, form reset, focus
//! and selection tracking, and transitions that stay pending until the host
//! calls [`MemoryDom::finish_transitions`].

use std::{
  cell::{
    Cell,
    RefCell,
  },
  fmt,
  time::Duration,
};

use futures_channel::oneshot;
use futures_util::{
  FutureExt,
  future::{
    self,
    LocalBoxFuture,
  },
};
use indexmap::IndexMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::{
  Dom,
  DomEvent,
  ElementId,
  Key,
  KeyEvent,
  Selection,
};

#[derive(Debug, Default)]
struct Node {
  tag:        String,
  attributes: IndexMap<String, String>,
  classes:    SmallVec<[String; 4]>,
  // dirty value/checkedness, `None` until a script or the user touched it
  value:      Option<String>,
  checked:    Option<bool>,
  text:       String,
  selection:  Selection,
  transition: Duration,
  parent:     Option<ElementId>,
  children:   Vec<ElementId>,
}

impl Node {
  fn default_value(&self) -> String {
    if self.tag == "textarea" {
      return self.text.clone();
    }
    self.attributes.get("value").cloned().unwrap_or_default()
  }

  fn value(&self) -> String {
    self.value.clone().unwrap_or_else(|| self.default_value())
  }

  fn checked(&self) -> bool {
    self
      .checked
      .unwrap_or_else(|| self.attributes.contains_key("checked"))
  }

  fn is_radio(&self) -> bool {
    self.tag == "input"
      && self
        .attributes
        .get("type")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("radio"))
  }
}

#[derive(Default)]
pub struct MemoryDom {
  nodes:       RefCell<SlotMap<ElementId, Node>>,
  active:      Cell<Option<ElementId>>,
  transitions: RefCell<Vec<(ElementId, oneshot::Sender<()>)>>,
}

impl fmt::Debug for MemoryDom {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemoryDom")
      .field("elements", &self.nodes.borrow().len())
      .field("active", &self.active.get())
      .field("pending_transitions", &self.transitions.borrow().len())
      .finish()
  }
}

impl MemoryDom {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a detached element and returns a builder for it.
  pub fn build(&self, tag: &str) -> ElementBuilder<'_> {
    ElementBuilder {
      dom: self,
      id:  self.create_element(tag),
    }
  }

  pub fn set_transition_duration(&self, element: ElementId, duration: Duration) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      node.transition = duration;
    }
  }

  pub fn transition_duration(&self, element: ElementId) -> Duration {
    self
      .nodes
      .borrow()
      .get(element)
      .map(|node| node.transition)
      .unwrap_or_default()
  }

  pub fn pending_transitions(&self) -> usize {
    self.transitions.borrow().len()
  }

  /// Completes every pending transition, returning how many were waiting.
  pub fn finish_transitions(&self) -> usize {
    let pending = std::mem::take(&mut *self.transitions.borrow_mut());
    let count = pending.len();
    for (_, done) in pending {
      let _ = done.send(());
    }
    count
  }

  /// Simulates typing: replaces the selection of `element` with `text`.
  pub fn type_text(&self, element: ElementId, text: &str) -> DomEvent {
    {
      let mut nodes = self.nodes.borrow_mut();
      if let Some(node) = nodes.get_mut(element) {
        let current: Vec<char> = node.value().chars().collect();
        let start = node.selection.start.min(current.len());
        let end = node.selection.end.clamp(start, current.len());
        let mut next: String = current[..start].iter().collect();
        next.push_str(text);
        next.extend(&current[end..]);
        let caret = start + text.chars().count();
        node.value = Some(next);
        node.selection = Selection::caret(caret);
      }
    }
    DomEvent::Input {
      target: element,
      data:   Some(text.to_string()),
    }
  }

  /// Key-down event for `element`; key presses have no native effect here.
  pub fn press(&self, element: ElementId, key: Key) -> DomEvent {
    DomEvent::KeyDown {
      target: element,
      key:    KeyEvent::new(key),
    }
  }

  fn form_owner(nodes: &SlotMap<ElementId, Node>, element: ElementId) -> Option<ElementId> {
    let mut current = nodes.get(element).and_then(|node| node.parent);
    let mut root = element;
    while let Some(id) = current {
      let node = &nodes[id];
      if node.tag == "form" {
        return Some(id);
      }
      root = id;
      current = node.parent;
    }
    Some(root)
  }

  fn collect_descendants(nodes: &SlotMap<ElementId, Node>, root: ElementId, out: &mut Vec<ElementId>) {
    if let Some(node) = nodes.get(root) {
      for child in &node.children {
        out.push(*child);
        Self::collect_descendants(nodes, *child, out);
      }
    }
  }

  fn detach(nodes: &mut SlotMap<ElementId, Node>, element: ElementId) {
    if let Some(parent) = nodes.get(element).and_then(|node| node.parent) {
      if let Some(parent) = nodes.get_mut(parent) {
        parent.children.retain(|child| *child != element);
      }
    }
  }
}

impl Dom for MemoryDom {
  fn create_element(&self, tag: &str) -> ElementId {
    self.nodes.borrow_mut().insert(Node {
      tag: tag.to_ascii_lowercase(),
      ..Node::default()
    })
  }

  fn append_child(&self, parent: ElementId, child: ElementId) {
    let mut nodes = self.nodes.borrow_mut();
    if !nodes.contains_key(parent) || !nodes.contains_key(child) {
      return;
    }
    Self::detach(&mut nodes, child);
    nodes[child].parent = Some(parent);
    nodes[parent].children.push(child);
  }

  fn insert_after(&self, anchor: ElementId, node: ElementId) {
    let mut nodes = self.nodes.borrow_mut();
    let Some(parent) = nodes.get(anchor).and_then(|anchor| anchor.parent) else {
      return;
    };
    if !nodes.contains_key(node) {
      return;
    }
    Self::detach(&mut nodes, node);
    let siblings = &mut nodes[parent].children;
    let index = siblings
      .iter()
      .position(|child| *child == anchor)
      .map_or(siblings.len(), |index| index + 1);
    siblings.insert(index, node);
    nodes[node].parent = Some(parent);
  }

  fn parent(&self, element: ElementId) -> Option<ElementId> {
    self.nodes.borrow().get(element).and_then(|node| node.parent)
  }

  fn children(&self, element: ElementId) -> Vec<ElementId> {
    self
      .nodes
      .borrow()
      .get(element)
      .map(|node| node.children.clone())
      .unwrap_or_default()
  }

  fn tag(&self, element: ElementId) -> String {
    self
      .nodes
      .borrow()
      .get(element)
      .map(|node| node.tag.clone())
      .unwrap_or_default()
  }

  fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
    self
      .nodes
      .borrow()
      .get(element)
      .and_then(|node| node.attributes.get(name).cloned())
  }

  fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      node.attributes.insert(name.to_string(), value.to_string());
    }
  }

  fn remove_attribute(&self, element: ElementId, name: &str) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      node.attributes.shift_remove(name);
    }
  }

  fn value(&self, element: ElementId) -> String {
    self
      .nodes
      .borrow()
      .get(element)
      .map(Node::value)
      .unwrap_or_default()
  }

  fn set_value(&self, element: ElementId, value: &str) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      node.value = Some(value.to_string());
      node.selection = Selection::caret(value.chars().count());
    }
  }

  fn checked(&self, element: ElementId) -> bool {
    self
      .nodes
      .borrow()
      .get(element)
      .is_some_and(Node::checked)
  }

  fn set_checked(&self, element: ElementId, checked: bool) {
    let mut nodes = self.nodes.borrow_mut();
    let Some(node) = nodes.get_mut(element) else {
      return;
    };
    node.checked = Some(checked);
    if !checked || !node.is_radio() {
      return;
    }

    let name = node.attributes.get("name").cloned().unwrap_or_default();
    if name.is_empty() {
      return;
    }
    let mut group = Vec::new();
    if let Some(owner) = Self::form_owner(&nodes, element) {
      Self::collect_descendants(&nodes, owner, &mut group);
    }
    for other in group {
      if other == element {
        continue;
      }
      let node = &mut nodes[other];
      if node.is_radio() && node.attributes.get("name") == Some(&name) {
        node.checked = Some(false);
      }
    }
  }

  fn text_content(&self, element: ElementId) -> String {
    self
      .nodes
      .borrow()
      .get(element)
      .map(|node| node.text.clone())
      .unwrap_or_default()
  }

  fn set_text_content(&self, element: ElementId, text: &str) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      node.text = text.to_string();
    }
  }

  fn has_class(&self, element: ElementId, class: &str) -> bool {
    self
      .nodes
      .borrow()
      .get(element)
      .is_some_and(|node| node.classes.iter().any(|c| c == class))
  }

  fn add_class(&self, element: ElementId, class: &str) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      if !node.classes.iter().any(|c| c == class) {
        node.classes.push(class.to_string());
      }
    }
  }

  fn remove_class(&self, element: ElementId, class: &str) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      node.classes.retain(|c| c != class);
    }
  }

  fn focus(&self, element: ElementId) {
    // disabled controls are not focusable
    if self.disabled(element) {
      return;
    }
    self.active.set(Some(element));
  }

  fn active_element(&self) -> Option<ElementId> {
    self.active.get()
  }

  fn selection(&self, element: ElementId) -> Selection {
    self
      .nodes
      .borrow()
      .get(element)
      .map(|node| node.selection)
      .unwrap_or_default()
  }

  fn set_selection(&self, element: ElementId, selection: Selection) {
    if let Some(node) = self.nodes.borrow_mut().get_mut(element) {
      let len = node.value().chars().count();
      node.selection = Selection {
        start: selection.start.min(len),
        end:   selection.end.min(len),
      };
    }
  }

  fn reset(&self, form: ElementId) {
    let mut nodes = self.nodes.borrow_mut();
    let mut elements = Vec::new();
    Self::collect_descendants(&nodes, form, &mut elements);
    for element in elements {
      let node = &mut nodes[element];
      node.value = None;
      node.checked = None;
      node.selection = Selection::default();
    }
  }

  fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
    future::ready(()).boxed_local()
  }

  fn transition_end(&self, element: ElementId) -> LocalBoxFuture<'static, ()> {
    if self.transition_duration(element).is_zero() {
      return future::ready(()).boxed_local();
    }

    let (done, finished) = oneshot::channel();
    self.transitions.borrow_mut().push((element, done));
    log::trace!("transition pending on {element:?}");
    async move {
      // a dropped sender means the tree went away, nothing left to wait for
      let _ = finished.await;
    }
    .boxed_local()
  }
}

/// Fluent construction of [`MemoryDom`] elements.
pub struct ElementBuilder<'a> {
  dom: &'a MemoryDom,
  id:  ElementId,
}

impl ElementBuilder<'_> {
  #[must_use]
  pub fn attr(self, name: &str, value: &str) -> Self {
    self.dom.set_attribute(self.id, name, value);
    self
  }

  #[must_use]
  pub fn class(self, class: &str) -> Self {
    self.dom.add_class(self.id, class);
    self
  }

  #[must_use]
  pub fn text(self, text: &str) -> Self {
    self.dom.set_text_content(self.id, text);
    self
  }

  pub fn child_of(self, parent: ElementId) -> ElementId {
    self.dom.append_child(parent, self.id);
    self.id
  }

  pub fn id(self) -> ElementId {
    self.id
  }
}
