use std::{
  fmt,
  str::FromStr,
};

use crate::{
  MaskError,
  Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
  Digit,
  Letter,
  Any,
  /// Part of the unmasked value, inserted automatically.
  Fixed(char),
  /// Formatting only, inserted automatically.
  Literal(char),
}

impl Token {
  fn accepts(self, ch: char) -> bool {
    match self {
      Self::Digit => ch.is_ascii_digit(),
      Self::Letter => ch.is_alphabetic(),
      Self::Any => true,
      Self::Fixed(_) | Self::Literal(_) => false,
    }
  }

  fn is_placeholder(self) -> bool {
    matches!(self, Self::Digit | Self::Letter | Self::Any)
  }

  fn is_unmasked(self) -> bool {
    !matches!(self, Self::Literal(_))
  }

  fn write_source(self, out: &mut String) {
    match self {
      Self::Digit => out.push('0'),
      Self::Letter => out.push('a'),
      Self::Any => out.push('*'),
      Self::Fixed(ch) => {
        out.push('{');
        out.push(ch);
        out.push('}');
      },
      Self::Literal(ch) => {
        if matches!(ch, '0' | 'a' | '*' | '{' | '\\') {
          out.push('\\');
        }
        out.push(ch);
      },
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
  source: String,
  tokens: Vec<Token>,
}

impl Pattern {
  pub fn parse(source: &str) -> Result<Self> {
    let mut tokens = Vec::new();
    let mut chars = source.chars();
    let mut fixed = false;

    while let Some(ch) = chars.next() {
      if fixed {
        match ch {
          '}' => fixed = false,
          ch => tokens.push(Token::Fixed(ch)),
        }
        continue;
      }

      let token = match ch {
        '0' => Token::Digit,
        'a' => Token::Letter,
        '*' => Token::Any,
        '{' => {
          fixed = true;
          continue;
        },
        '\\' => {
          let escaped = chars
            .next()
            .ok_or_else(|| MaskError::DanglingEscape(source.to_string()))?;
          Token::Literal(escaped)
        },
        ch => Token::Literal(ch),
      };
      tokens.push(token);
    }

    if fixed {
      return Err(MaskError::UnclosedFixed(source.to_string()));
    }
    if tokens.is_empty() {
      return Err(MaskError::Empty);
    }

    Ok(Self {
      source: source.to_string(),
      tokens,
    })
  }

  /// Builds a pattern from already parsed tokens.
  pub fn from_tokens(tokens: Vec<Token>) -> Self {
    let mut source = String::new();
    for token in &tokens {
      token.write_source(&mut source);
    }
    Self { source, tokens }
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn tokens(&self) -> &[Token] {
    &self.tokens
  }
}

impl FromStr for Pattern {
  type Err = MaskError;

  fn from_str(source: &str) -> Result<Self> {
    Self::parse(source)
  }
}

impl fmt::Display for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}

/// A value being typed through a [`Pattern`].
///
/// Literal and fixed characters are only committed together with the next
/// accepted character, so a rejected keystroke never leaves dangling
/// formatting behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Masked {
  pattern: Pattern,
  // one character per consumed token, in token order
  filled:  Vec<char>,
}

impl Masked {
  pub fn new(pattern: Pattern) -> Self {
    Self {
      pattern,
      filled: Vec::new(),
    }
  }

  pub fn pattern(&self) -> &Pattern {
    &self.pattern
  }

  /// The formatted value.
  pub fn value(&self) -> String {
    self.filled.iter().collect()
  }

  pub fn unmasked_value(&self) -> String {
    self
      .filled
      .iter()
      .zip(self.pattern.tokens())
      .filter(|(_, token)| token.is_unmasked())
      .map(|(ch, _)| *ch)
      .collect()
  }

  /// Every placeholder of the pattern holds a character.
  pub fn is_complete(&self) -> bool {
    self
      .pattern
      .tokens()
      .iter()
      .rposition(|token| token.is_placeholder())
      .is_none_or(|last| last < self.filled.len())
  }

  pub fn is_empty(&self) -> bool {
    self.filled.is_empty()
  }

  pub fn reset(&mut self) {
    self.filled.clear();
  }

  /// Feeds `text` through the pattern, returning how many characters were
  /// accepted.
  pub fn append(&mut self, text: &str) -> usize {
    text.chars().filter(|ch| self.push(*ch)).count()
  }

  /// Replaces the whole value with `raw`, formatted or not.
  pub fn resolve(&mut self, raw: &str) {
    self.reset();
    self.append(raw);
  }

  pub fn set_unmasked_value(&mut self, unmasked: &str) {
    self.resolve(unmasked);
  }

  fn push(&mut self, ch: char) -> bool {
    let checkpoint = self.filled.len();
    let tokens = self.pattern.tokens();

    while let Some(token) = tokens.get(self.filled.len()).copied() {
      match token {
        Token::Fixed(expected) | Token::Literal(expected) => {
          self.filled.push(expected);
          if ch == expected {
            return true;
          }
        },
        placeholder if placeholder.accepts(ch) => {
          self.filled.push(ch);
          return true;
        },
        _ => break,
      }
    }

    self.filled.truncate(checkpoint);
    false
  }
}
