//! Input masks for `the-form`.
//!
//! A [`Pattern`] describes the shape of a value, a [`Masked`] value feeds
//! keystrokes through it, and a [`DynamicMask`] switches between several
//! compiled masks through a dispatch callback.
//!
//! Pattern syntax:
//! - `0` any digit, `a` any letter, `*` any character
//! - `{...}` fixed characters that are part of the unmasked value
//! - `\x` the literal `x`
//! - everything else is a literal that only shows up in the formatted value

pub mod dynamic;
pub mod pattern;

use thiserror::Error;

pub use crate::{
  dynamic::{
    CompiledMask,
    Dispatch,
    DynamicMask,
    MaskDefinition,
  },
  pattern::{
    Masked,
    Pattern,
    Token,
  },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
  #[error("mask pattern is empty")]
  Empty,
  #[error("unclosed fixed section in mask pattern {0:?}")]
  UnclosedFixed(String),
  #[error("dangling escape at the end of mask pattern {0:?}")]
  DanglingEscape(String),
  #[error("dynamic mask needs at least one mask")]
  NoMasks,
}

pub type Result<T> = std::result::Result<T, MaskError>;
