//! Input module registry.
//!
//! A module maps an input type (the `data-form-input` value) to a controller
//! factory plus the options handed to it. Forms merge the process-wide
//! registry with their own modules once, at construction; later changes to
//! the process-wide registry only affect forms built afterwards.

use std::{
  collections::HashMap,
  sync::Arc,
};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use the_form_dom::{
  DomRef,
  ElementId,
};

use crate::{
  FormError,
  Result,
  inputs::{
    DigitCode,
    InputController,
    Phone,
    Radio,
    RadioGroup,
    Text,
  },
};

pub const TEXT: &str = "text";
pub const PHONE: &str = "phone";
pub const DIGIT_CODE: &str = "digit-code";
pub const RADIO: &str = "radio";
pub const RADIO_GROUP: &str = "radio-group";

pub type Factory =
  Arc<dyn Fn(&ModuleContext<'_>) -> Result<Box<dyn InputController>> + Send + Sync>;

pub fn factory<F>(f: F) -> Factory
where
  F: Fn(&ModuleContext<'_>) -> Result<Box<dyn InputController>> + Send + Sync + 'static,
{
  Arc::new(f)
}

/// What a factory gets to build one controller.
pub struct ModuleContext<'a> {
  pub kind:    &'a str,
  pub dom:     &'a DomRef,
  pub element: ElementId,
  pub options: &'a toml::Table,
}

impl ModuleContext<'_> {
  /// Typed view of the module options.
  pub fn options<T: DeserializeOwned>(&self) -> Result<T> {
    toml::Value::Table(self.options.clone())
      .try_into()
      .map_err(|source| FormError::Options {
        module: self.kind.to_string(),
        source,
      })
  }
}

#[derive(Clone)]
pub struct Module {
  pub factory: Factory,
  pub options: toml::Table,
}

impl Module {
  pub fn new(factory: Factory) -> Self {
    Self {
      factory,
      options: toml::Table::new(),
    }
  }

  #[must_use]
  pub fn with_options(mut self, options: toml::Table) -> Self {
    self.options = options;
    self
  }
}

#[derive(Clone, Default)]
pub struct ModuleRegistry {
  modules: HashMap<String, Module>,
}

impl ModuleRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `module` under `kind`, replacing any previous one.
  pub fn set(&mut self, kind: &str, module: Module) {
    log::debug!("input module {kind:?} registered");
    self.modules.insert(kind.to_string(), module);
  }

  pub fn get(&self, kind: &str) -> Option<&Module> {
    self.modules.get(kind)
  }

  pub fn contains(&self, kind: &str) -> bool {
    self.modules.contains_key(kind)
  }

  /// Replaces the options of a registered module. Returns false for an
  /// unknown type.
  pub fn configure(&mut self, kind: &str, options: toml::Table) -> bool {
    match self.modules.get_mut(kind) {
      Some(module) => {
        module.options = options;
        true
      },
      None => false,
    }
  }

  /// Copies every module of `other` in, `other` wins on conflicts.
  pub fn merge(&mut self, other: &ModuleRegistry) {
    for (kind, module) in &other.modules {
      self.modules.insert(kind.clone(), module.clone());
    }
  }

  pub fn kinds(&self) -> impl Iterator<Item = &str> {
    self.modules.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  /// Builds the controller for an element of type `kind`, `None` when the
  /// type is not registered.
  pub fn create(
    &self,
    kind: &str,
    dom: &DomRef,
    element: ElementId,
  ) -> Option<Result<Box<dyn InputController>>> {
    let module = self.modules.get(kind)?;
    let context = ModuleContext {
      kind,
      dom,
      element,
      options: &module.options,
    };
    Some((module.factory)(&context))
  }
}

fn text_module() -> Module {
  Module::new(factory(|ctx| {
    Ok(Box::new(Text::new(ctx.dom.clone(), ctx.element)))
  }))
}

/// Every controller shipped with the crate.
pub fn builtin() -> ModuleRegistry {
  let mut registry = ModuleRegistry::new();
  registry.set(TEXT, text_module());
  registry.set(
    PHONE,
    Module::new(factory(|ctx| {
      let phone = Phone::new(ctx.dom.clone(), ctx.element, ctx.options()?)?;
      Ok(Box::new(phone))
    })),
  );
  registry.set(
    DIGIT_CODE,
    Module::new(factory(|ctx| {
      Ok(Box::new(DigitCode::new(
        ctx.dom.clone(),
        ctx.element,
        ctx.options()?,
      )))
    })),
  );
  registry.set(
    RADIO,
    Module::new(factory(|ctx| {
      Ok(Box::new(Radio::new(ctx.dom.clone(), ctx.element)))
    })),
  );
  registry.set(
    RADIO_GROUP,
    Module::new(factory(|ctx| {
      Ok(Box::new(RadioGroup::new(
        ctx.dom.clone(),
        ctx.element,
        ctx.options()?,
      )))
    })),
  );
  registry
}

static GLOBAL: Lazy<RwLock<ModuleRegistry>> = Lazy::new(|| {
  let mut registry = ModuleRegistry::new();
  registry.set(TEXT, text_module());
  RwLock::new(registry)
});

/// Snapshot of the process-wide registry.
pub fn global() -> ModuleRegistry {
  GLOBAL.read().clone()
}

/// Adds `modules` to the process-wide registry; existing types are
/// overridden, nothing is ever removed.
pub fn use_global(modules: &ModuleRegistry) {
  GLOBAL.write().merge(modules);
}
