//! Network collaborator contract.
//!
//! A form sends exactly one [`SubmitRequest`] per submission and expects a
//! JSON [`ServerReply`] back. Hosts plug in a [`Transport`]; `the-form-http`
//! provides one over HTTP.

use std::error::Error as StdError;

use futures_util::{
  FutureExt,
  future::{
    self,
    LocalBoxFuture,
  },
};
use indexmap::IndexMap;
use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::snapshot::FormData;

pub const STATUS_OK: &str = "ok";
pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
  /// The form's `action` attribute, possibly relative.
  pub action:  String,
  /// Uppercase HTTP method, `GET` when the form declares none.
  pub method:  String,
  pub headers: Vec<(String, String)>,
  pub data:    FormData,
}

impl SubmitRequest {
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(key, _)| key.eq_ignore_ascii_case(name))
      .map(|(_, value)| value.as_str())
  }
}

/// Reply of the server to a submission.
///
/// Members other than `status` and `fields` are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerReply {
  #[serde(default)]
  pub status: String,
  /// Error message per field name. Messages are usually strings; anything
  /// else is shown through [`message_text`].
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fields: Option<IndexMap<String, serde_json::Value>>,
  #[serde(flatten)]
  pub extra:  serde_json::Map<String, serde_json::Value>,
}

impl ServerReply {
  pub fn ok() -> Self {
    Self {
      status: STATUS_OK.to_string(),
      ..Self::default()
    }
  }

  pub fn fail<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    Self {
      status: "fail".to_string(),
      fields: Some(
        fields
          .into_iter()
          .map(|(name, message)| (name.to_string(), message.into()))
          .collect(),
      ),
      ..Self::default()
    }
  }

  pub fn is_ok(&self) -> bool {
    self.status == STATUS_OK
  }

  pub fn from_json(body: &[u8]) -> Result<Self, TransportError> {
    Ok(serde_json::from_slice(body)?)
  }

  /// The field errors with their messages as display text.
  pub fn field_errors(&self) -> impl Iterator<Item = (&str, String)> {
    self
      .fields
      .iter()
      .flatten()
      .map(|(name, message)| (name.as_str(), message_text(message)))
  }
}

/// Display text of a field error message: strings as they are, lists joined
/// with commas, `null` as nothing, anything else as JSON.
pub fn message_text(message: &serde_json::Value) -> String {
  match message {
    serde_json::Value::Null => String::new(),
    serde_json::Value::String(text) => text.clone(),
    serde_json::Value::Array(items) => items
      .iter()
      .map(message_text)
      .collect::<Vec<_>>()
      .join(","),
    other => other.to_string(),
  }
}

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("no transport configured")]
  Unavailable,
  #[error("invalid request target {0:?}")]
  InvalidAction(String),
  #[error("request failed: {0}")]
  Request(#[source] Box<dyn StdError + Send + Sync>),
  #[error("malformed reply: {0}")]
  Decode(#[from] serde_json::Error),
}

pub type TransportFuture = LocalBoxFuture<'static, Result<ServerReply, TransportError>>;

pub trait Transport {
  fn name(&self) -> &'static str;
  fn send(&self, request: SubmitRequest) -> TransportFuture;
}

/// Transport of a form nobody wired to a network.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransport;

impl Transport for NoTransport {
  fn name(&self) -> &'static str {
    "none"
  }

  fn send(&self, request: SubmitRequest) -> TransportFuture {
    log::warn!("form submission to {:?} dropped: no transport", request.action);
    future::ready(Err(TransportError::Unavailable)).boxed_local()
  }
}
