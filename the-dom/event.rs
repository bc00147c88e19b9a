use crate::{
  ElementId,
  input::KeyEvent,
};

/// DOM events a host forwards into the form.
///
/// Events are delivered after the host applied the native effect, so an
/// `Input` event sees the element value that already contains `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
  Input {
    target: ElementId,
    /// Text inserted by the edit, `None` for deletions.
    data:   Option<String>,
  },
  Change {
    target: ElementId,
  },
  KeyDown {
    target: ElementId,
    key:    KeyEvent,
  },
  Paste {
    target: ElementId,
    text:   String,
  },
  FocusIn {
    target: ElementId,
  },
  Submit {
    target: ElementId,
  },
  Reset {
    target: ElementId,
  },
}

impl DomEvent {
  pub fn target(&self) -> ElementId {
    match self {
      Self::Input { target, .. }
      | Self::Change { target }
      | Self::KeyDown { target, .. }
      | Self::Paste { target, .. }
      | Self::FocusIn { target }
      | Self::Submit { target }
      | Self::Reset { target } => *target,
    }
  }
}

/// Whether a handler took care of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResult {
  #[default]
  Ignored,
  Consumed,
}

impl EventResult {
  pub fn is_consumed(self) -> bool {
    matches!(self, Self::Consumed)
  }

  /// `Consumed` if either side consumed the event.
  #[must_use]
  pub fn or(self, other: Self) -> Self {
    if self.is_consumed() { self } else { other }
  }
}
