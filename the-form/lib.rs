//! Client-side form orchestration.
//!
//! A [`Form`] discovers the inputs of a form element, binds each one to an
//! [`InputController`](inputs::InputController) built by the module
//! registered for its type, validates them through composable rules, tracks
//! whether the content changed, and runs the submission lifecycle: lock,
//! round trip through a [`Transport`], field error mapping, unlock.
//!
//! Element access goes through the [`Dom`](the_form_dom::Dom) collaborator
//! and masking through `the-form-mask`, so the engine runs the same against
//! a browser binding or the in-memory tree used by the tests.

pub mod config;
pub mod error;
pub mod form;
pub mod inputs;
pub mod modules;
pub mod rules;
pub mod snapshot;
pub mod transport;

pub use crate::{
  config::FormConfig,
  error::{
    FormError,
    Result,
    SubmitError,
  },
  form::{
    Form,
    FormEvent,
    FormOptions,
    FormResponse,
    ListenerId,
    LockGuard,
    Submission,
    SubmitOutcome,
    SubmitResult,
  },
  modules::{
    Module,
    ModuleContext,
    ModuleRegistry,
  },
  rules::{
    InputRegistration,
    Inputs,
    RuleId,
  },
  snapshot::{
    FormData,
    Snapshot,
  },
  transport::{
    NoTransport,
    ServerReply,
    SubmitRequest,
    Transport,
    TransportError,
    TransportFuture,
  },
};
