use the_form_mask::MaskError;
use thiserror::Error;

use crate::transport::{
  ServerReply,
  TransportError,
};

/// Failures while building a form.
#[derive(Debug, Error)]
pub enum FormError {
  #[error("invalid options for input module {module:?}: {source}")]
  Options {
    module: String,
    source: toml::de::Error,
  },
  #[error(transparent)]
  Mask(#[from] MaskError),
  #[error("malformed form config: {0}")]
  Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FormError>;

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("already submitting")]
  AlreadySubmitting,
  #[error("validation failed")]
  ValidationFailed,
  #[error("submission rejected with status {:?}", .0.status)]
  Rejected(ServerReply),
  #[error(transparent)]
  Transport(#[from] TransportError),
}

impl SubmitError {
  /// The server reply behind a rejection.
  pub fn reply(&self) -> Option<&ServerReply> {
    match self {
      Self::Rejected(reply) => Some(reply),
      _ => None,
    }
  }
}
