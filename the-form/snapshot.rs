//! Form content capture: the submit payload and the dirty-state snapshot.

use indexmap::IndexMap;
use serde::Serialize;
use the_form_dom::{
  Dom,
  ElementId,
};

/// Suffix marking a field that may repeat and is grouped into a list.
pub const LIST_SUFFIX: &str = "[]";

pub fn is_list_name(name: &str) -> bool {
  name.ends_with(LIST_SUFFIX)
}

const SKIPPED_TYPES: &[&str] = &["submit", "button", "reset", "image", "file"];

/// Ordered `(name, value)` pairs of the successful controls of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
  entries: Vec<(String, String)>,
}

impl FormData {
  pub fn new() -> Self {
    Self::default()
  }

  /// Collects the controls that would be submitted with `form`: named,
  /// enabled, not buttons, and checked when checkable.
  pub fn collect(dom: &dyn Dom, form: ElementId) -> Self {
    let mut data = Self::new();
    for element in dom.form_elements(form) {
      let name = dom.name(element);
      if name.is_empty() || dom.tag(element) == "fieldset" || is_disabled(dom, form, element) {
        continue;
      }

      let kind = dom.control_type(element);
      if SKIPPED_TYPES.contains(&kind.as_str()) {
        continue;
      }
      let value = match kind.as_str() {
        "checkbox" | "radio" => {
          if !dom.checked(element) {
            continue;
          }
          dom
            .attribute(element, "value")
            .unwrap_or_else(|| "on".to_string())
        },
        _ => dom.value(element),
      };
      data.append(name, value);
    }
    data
  }

  pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
    self.entries.push((name.into(), value.into()));
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    self
      .entries
      .iter()
      .filter(move |(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(name, value)| (name.as_str(), value.as_str()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn into_entries(self) -> Vec<(String, String)> {
    self.entries
  }
}

// the element itself or an enclosing fieldset inside the form is disabled
fn is_disabled(dom: &dyn Dom, form: ElementId, element: ElementId) -> bool {
  if dom.disabled(element) {
    return true;
  }
  let mut current = dom.parent(element);
  while let Some(node) = current {
    if node == form {
      break;
    }
    if dom.tag(node) == "fieldset" && dom.disabled(node) {
      return true;
    }
    current = dom.parent(node);
  }
  false
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SnapshotValue {
  Scalar(String),
  List(Vec<String>),
}

/// Serialized form content.
///
/// Later scalar entries overwrite earlier ones under the same name; names
/// ending in `[]` collect every value in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
  fields: IndexMap<String, SnapshotValue>,
}

impl Snapshot {
  pub fn from_data(data: &FormData) -> Self {
    let mut fields = IndexMap::new();
    for (name, value) in data.iter() {
      if is_list_name(name) {
        let entry = fields
          .entry(name.to_string())
          .or_insert_with(|| SnapshotValue::List(Vec::new()));
        if let SnapshotValue::List(values) = entry {
          values.push(value.to_string());
        }
      } else {
        fields.insert(name.to_string(), SnapshotValue::Scalar(value.to_string()));
      }
    }
    Self { fields }
  }

  pub fn get(&self, name: &str) -> Option<&SnapshotValue> {
    self.fields.get(name)
  }

  pub fn to_json(&self) -> String {
    // string keys and values only, encoding cannot fail
    serde_json::to_string(self).unwrap_or_default()
  }
}

/// What the current content is compared against for the changed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
  Serialized(String),
  /// Nothing serializes to this, the form reads as changed until the next
  /// baseline is taken.
  Forced,
}

impl Baseline {
  pub fn differs_from(&self, serialized: &str) -> bool {
    match self {
      Self::Serialized(old) => old != serialized,
      Self::Forced => true,
    }
  }
}
