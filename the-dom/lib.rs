//! Rendering collaborator contract for `the-form`.
//!
//! The form engine and its controllers only talk to elements through the
//! [`Dom`] trait. Hosts bind it to a real document; [`MemoryDom`] is a
//! complete in-memory element tree for headless hosts and tests.

pub mod event;
pub mod input;
pub mod memory;

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;

pub use crate::{
  event::{
    DomEvent,
    EventResult,
  },
  input::{
    Key,
    KeyEvent,
    Modifiers,
  },
  memory::MemoryDom,
};

slotmap::new_key_type! {
  pub struct ElementId;
}

pub type DomRef = Rc<dyn Dom>;

/// Caret/selection range of a text control, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
  pub start: usize,
  pub end:   usize,
}

impl Selection {
  pub const fn caret(at: usize) -> Self {
    Self { start: at, end: at }
  }
}

/// Tags that take part in a form's `elements` collection.
const LISTED_TAGS: &[&str] = &["button", "fieldset", "input", "select", "textarea"];

/// Element tree access needed by the form engine.
///
/// All methods take `&self`: implementations use interior mutability so a
/// controller can hold a [`DomRef`] next to the form that owns it.
pub trait Dom {
  fn create_element(&self, tag: &str) -> ElementId;
  fn append_child(&self, parent: ElementId, child: ElementId);
  /// Places `node` right after `anchor` under the anchor's parent.
  fn insert_after(&self, anchor: ElementId, node: ElementId);
  fn parent(&self, element: ElementId) -> Option<ElementId>;
  fn children(&self, element: ElementId) -> Vec<ElementId>;
  /// Lowercase tag name.
  fn tag(&self, element: ElementId) -> String;

  fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
  fn set_attribute(&self, element: ElementId, name: &str, value: &str);
  fn remove_attribute(&self, element: ElementId, name: &str);

  fn value(&self, element: ElementId) -> String;
  fn set_value(&self, element: ElementId, value: &str);
  fn checked(&self, element: ElementId) -> bool;
  /// Checking a radio unchecks the other radios of its group.
  fn set_checked(&self, element: ElementId, checked: bool);
  fn text_content(&self, element: ElementId) -> String;
  fn set_text_content(&self, element: ElementId, text: &str);

  fn has_class(&self, element: ElementId, class: &str) -> bool;
  fn add_class(&self, element: ElementId, class: &str);
  fn remove_class(&self, element: ElementId, class: &str);

  fn focus(&self, element: ElementId);
  fn active_element(&self) -> Option<ElementId>;
  fn selection(&self, element: ElementId) -> Selection;
  fn set_selection(&self, element: ElementId, selection: Selection);

  /// Restores the default value and checkedness of every control in `form`.
  fn reset(&self, form: ElementId);

  /// Resolves on the next animation frame.
  fn next_frame(&self) -> LocalBoxFuture<'static, ()>;
  /// Resolves once the running visual transition of `element` finished.
  fn transition_end(&self, element: ElementId) -> LocalBoxFuture<'static, ()>;

  fn has_attribute(&self, element: ElementId, name: &str) -> bool {
    self.attribute(element, name).is_some()
  }

  fn disabled(&self, element: ElementId) -> bool {
    self.has_attribute(element, "disabled")
  }

  fn set_disabled(&self, element: ElementId, disabled: bool) {
    if disabled {
      self.set_attribute(element, "disabled", "disabled");
    } else {
      self.remove_attribute(element, "disabled");
    }
  }

  fn required(&self, element: ElementId) -> bool {
    self.has_attribute(element, "required")
  }

  fn name(&self, element: ElementId) -> String {
    self.attribute(element, "name").unwrap_or_default()
  }

  /// The `type` property: attribute value with the HTML defaults applied.
  fn control_type(&self, element: ElementId) -> String {
    let declared = self
      .attribute(element, "type")
      .map(|kind| kind.to_ascii_lowercase());
    match self.tag(element).as_str() {
      "button" => declared.unwrap_or_else(|| "submit".to_string()),
      "input" => declared.unwrap_or_else(|| "text".to_string()),
      "textarea" => "textarea".to_string(),
      "select" => "select-one".to_string(),
      other => declared.unwrap_or_else(|| other.to_string()),
    }
  }

  fn select_all(&self, element: ElementId) {
    let len = self.value(element).chars().count();
    self.set_selection(element, Selection { start: 0, end: len });
  }

  /// Every descendant of `root` in document order, `root` excluded.
  fn descendants(&self, root: ElementId) -> Vec<ElementId> {
    let mut out = Vec::new();
    let mut stack: Vec<ElementId> = self.children(root).into_iter().rev().collect();
    while let Some(element) = stack.pop() {
      out.push(element);
      stack.extend(self.children(element).into_iter().rev());
    }
    out
  }

  fn find_all(&self, root: ElementId, predicate: &dyn Fn(ElementId) -> bool) -> Vec<ElementId> {
    self
      .descendants(root)
      .into_iter()
      .filter(|element| predicate(*element))
      .collect()
  }

  /// Whether `element` is `root` or one of its descendants.
  fn contains(&self, root: ElementId, element: ElementId) -> bool {
    let mut current = Some(element);
    while let Some(node) = current {
      if node == root {
        return true;
      }
      current = self.parent(node);
    }
    false
  }

  /// Nearest ancestor-or-self carrying `attribute`.
  fn closest_with_attribute(&self, element: ElementId, attribute: &str) -> Option<ElementId> {
    let mut current = Some(element);
    while let Some(node) = current {
      if self.has_attribute(node, attribute) {
        return Some(node);
      }
      current = self.parent(node);
    }
    None
  }

  /// The listed controls of `form` in document order.
  fn form_elements(&self, form: ElementId) -> Vec<ElementId> {
    self.find_all(form, &|element| {
      LISTED_TAGS.contains(&self.tag(element).as_str())
    })
  }
}
