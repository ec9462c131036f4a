use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::evaluate::Evaluator;

type Resolver<'p, T> = Box<dyn Fn(&str) -> Option<Evaluator<T>> + 'p>;

/// A scope of named variables that expressions are bound against.
///
/// Lookup of a name checks, in order: the variables registered in this scope,
/// this scope's resolver (if any), then the parent scope, recursively. A child
/// scope may therefore shadow a parent's variable without touching the parent.
///
/// ```rust
/// use thunk_expr::*;
///
/// let mut root = Context::new();
/// root.register_variable("a", || 1.0f32).unwrap();
/// root.register_variable("b", || 2.0).unwrap();
///
/// let mut child = Context::child(&root);
/// child.register_variable("b", || 3.0).unwrap();
///
/// let sum = F32_COMPILER.compile("a + b", Some(&child), false).unwrap();
/// assert_eq!(sum.evaluate(), 4.0);
/// ```
pub struct Context<'p, T> {
    variables: HashMap<String, Evaluator<T>>,
    parent: Option<&'p Context<'p, T>>,
    resolver: Option<Resolver<'p, T>>,
}

impl<'p, T> Default for Context<'p, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p, T> Context<'p, T> {
    /// An empty root scope.
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            parent: None,
            resolver: None,
        }
    }

    /// An empty scope that falls back to `parent` for unknown names.
    pub fn child(parent: &'p Context<'p, T>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new()
        }
    }

    /// Installs a hook consulted for names not registered in this scope,
    /// before falling back to the parent.
    pub fn with_resolver(
        mut self,
        resolver: impl Fn(&str) -> Option<Evaluator<T>> + 'p,
    ) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Registers a variable whose value is produced by calling `value` each
    /// time a bound expression is evaluated.
    pub fn register_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Fn() -> T + 'static,
    ) -> Result<()> {
        self.register_evaluator(name, Evaluator::new(value))
    }

    pub fn register_evaluator(
        &mut self,
        name: impl Into<String>,
        evaluator: Evaluator<T>,
    ) -> Result<()> {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return Err(Error::DuplicateVariable(name));
        }
        self.variables.insert(name, evaluator);
        Ok(())
    }

    /// Whether `name` is registered in this scope, ignoring the resolver and
    /// parents.
    pub fn contains_local(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn parent(&self) -> Option<&'p Context<'p, T>> {
        self.parent
    }

    /// Finds the evaluator for `name` in this scope or its ancestors.
    pub fn resolve(&self, name: &str) -> Option<Evaluator<T>> {
        if let Some(evaluator) = self.variables.get(name) {
            return Some(evaluator.clone());
        }
        if let Some(evaluator) = self.resolver.as_ref().and_then(|resolve| resolve(name)) {
            return Some(evaluator);
        }
        self.parent.and_then(|parent| parent.resolve(name))
    }

    /// Like [`Context::resolve`], failing with [`Error::VariableNotDefined`].
    pub fn get_variable(&self, name: &str) -> Result<Evaluator<T>> {
        self.resolve(name)
            .ok_or_else(|| Error::VariableNotDefined(name.to_string()))
    }
}

impl<'p, T> fmt::Debug for Context<'p, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.variables.keys().collect();
        names.sort();
        f.debug_struct("Context")
            .field("variables", &names)
            .field("parent", &self.parent)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}
