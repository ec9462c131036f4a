use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::evaluate::Evaluator;
use crate::expression::Expression;
use crate::functions::FunctionTable;
use crate::number::Number;
use crate::parse;

/// Turns formula text into [`Evaluator`]s.
///
/// Parsing produces an [`Expression`] that is independent of any variables;
/// binding it to a [`Context`] produces the evaluator. With caching enabled,
/// parsed expressions are kept per exact input string (no whitespace
/// normalization) for the lifetime of the compiler, so later compilations of
/// the same text only pay for binding.
pub struct Compiler<T> {
    functions: FunctionTable,
    cache: Mutex<HashMap<String, Arc<Expression<T>>>>,
}

impl<T: Number> Default for Compiler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Number> Compiler<T> {
    /// A compiler with the standard function table.
    pub fn new() -> Self {
        Self::with_functions(FunctionTable::default())
    }

    pub fn with_functions(functions: FunctionTable) -> Self {
        Self {
            functions,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Parses `input` without binding it. Never consults the cache.
    pub fn parse(&self, input: &str) -> Result<Expression<T>> {
        parse::parse(input, &self.functions)
    }

    /// Parses `input` (or fetches it from the cache when `use_cache` is set)
    /// and binds it against `context`, or an empty context if none is given.
    ///
    /// All errors are raised here, never during evaluation.
    pub fn compile(
        &self,
        input: &str,
        context: Option<&Context<'_, T>>,
        use_cache: bool,
    ) -> Result<Evaluator<T>> {
        let result = if use_cache {
            self.parse_cached(input)
                .and_then(|expression| bind(&expression, context))
        } else {
            self.parse(input)
                .and_then(|expression| bind(&expression, context))
        };
        if let Err(err) = &result {
            debug!(input, %err, "failed to compile expression");
        }
        result
    }

    pub fn compile_cached(
        &self,
        input: &str,
        context: Option<&Context<'_, T>>,
    ) -> Result<Evaluator<T>> {
        self.compile(input, context, true)
    }

    /// Like [`Compiler::compile`], but the evaluator yields the truthiness of
    /// the result.
    pub fn compile_predicate(
        &self,
        input: &str,
        context: Option<&Context<'_, T>>,
        use_cache: bool,
    ) -> Result<Evaluator<bool>> {
        Ok(self.compile(input, context, use_cache)?.into_predicate())
    }

    /// All distinct variable names referenced by `input`.
    pub fn parse_variable_names(&self, input: &str) -> Result<HashSet<String>> {
        let expression = self.parse(input)?;
        let mut names = HashSet::new();
        expression.for_each_variable(&mut |name| {
            names.insert(name.to_string());
        });
        Ok(names)
    }

    /// Number of distinct inputs whose parsed expression is cached.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn parse_cached(&self, input: &str) -> Result<Arc<Expression<T>>> {
        if let Some(expression) = self.cache.lock().get(input) {
            debug!(input, "expression cache hit");
            return Ok(Arc::clone(expression));
        }
        // Parse without holding the lock. A racing caller may parse the same
        // input; the first insertion wins.
        debug!(input, "expression cache miss");
        let parsed = Arc::new(self.parse(input)?);
        let mut cache = self.cache.lock();
        Ok(Arc::clone(cache.entry(input.to_string()).or_insert(parsed)))
    }
}

fn bind<T: Number>(
    expression: &Expression<T>,
    context: Option<&Context<'_, T>>,
) -> Result<Evaluator<T>> {
    match context {
        Some(context) => expression.bind(context),
        None => expression.bind(&Context::new()),
    }
}
