//! Keyboard types carried by DOM key events.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
  bits: u8,
}

impl Modifiers {
  pub const CTRL: u8 = 0b0000_0001;
  pub const ALT: u8 = 0b0000_0010;
  pub const SHIFT: u8 = 0b0000_0100;
  pub const META: u8 = 0b0000_1000;

  #[must_use]
  pub const fn empty() -> Self {
    Self { bits: 0 }
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.bits == 0
  }

  #[must_use]
  pub const fn ctrl(self) -> bool {
    (self.bits & Self::CTRL) != 0
  }

  #[must_use]
  pub const fn alt(self) -> bool {
    (self.bits & Self::ALT) != 0
  }

  #[must_use]
  pub const fn shift(self) -> bool {
    (self.bits & Self::SHIFT) != 0
  }

  #[must_use]
  pub const fn meta(self) -> bool {
    (self.bits & Self::META) != 0
  }

  pub fn insert(&mut self, bits: u8) {
    self.bits |= bits;
  }
}

/// Keys named after their DOM `KeyboardEvent.key` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  Delete,
  Home,
  End,
  ArrowLeft,
  ArrowRight,
  ArrowUp,
  ArrowDown,
  Other,
}

impl Key {
  /// Maps a DOM `KeyboardEvent.key` string.
  pub fn from_dom(key: &str) -> Self {
    let mut chars = key.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
      return Self::Char(ch);
    }

    match key {
      "Enter" => Self::Enter,
      "Escape" => Self::Escape,
      "Backspace" => Self::Backspace,
      "Tab" => Self::Tab,
      "Delete" => Self::Delete,
      "Home" => Self::Home,
      "End" => Self::End,
      "ArrowLeft" => Self::ArrowLeft,
      "ArrowRight" => Self::ArrowRight,
      "ArrowUp" => Self::ArrowUp,
      "ArrowDown" => Self::ArrowDown,
      _ => Self::Other,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  pub const fn new(key: Key) -> Self {
    Self {
      key,
      modifiers: Modifiers::empty(),
    }
  }

  pub fn with_ctrl(key: Key) -> Self {
    let mut modifiers = Modifiers::empty();
    modifiers.insert(Modifiers::CTRL);
    Self { key, modifiers }
  }
}

impl From<Key> for KeyEvent {
  fn from(key: Key) -> Self {
    Self::new(key)
  }
}
