//! Formula parser that compiles to reusable evaluator closures.
//!
//! # Why?
//!
//! Performance. A host that re-evaluates the same formula many times (every
//! frame, every tick) should not pay for parsing or variable lookups each
//! time. A formula is parsed once into an [`Expression`], bound once against a
//! [`Context`] of variables, and the resulting [`Evaluator`] is a tree of
//! closures that calls straight into the variables' own value providers.
//!
//! # Example
//!
//! ```rust
//! use thunk_expr::*;
//!
//! let mut context = Context::new();
//! context.register_variable("a", || 1.0).unwrap();
//! context.register_variable("b", || 2.0).unwrap();
//! context.register_variable("c", || 3.0).unwrap();
//!
//! let input = "a >= b AND NOT(b) OR (a + b) >= c";
//! let compiled = F32_COMPILER.compile(input, Some(&context), true).unwrap();
//! assert_eq!(compiled.evaluate(), 1.0);
//! ```
//!
//! # Semantics
//!
//! - `^` is right associative and binds tighter than `* / %`, which bind
//!   tighter than `+ -`. Unary minus applies to a single factor, so `-2^2` is
//!   `(-2)^2`.
//! - `< <= > >=` and `= !=` cannot be chained: `a < b < c` is a syntax error.
//! - `AND` and `OR` return one of their operands: `4 AND 5` is `5`,
//!   `0 OR 5` is `5`. The right operand is only evaluated when needed.
//! - `TRUE` and `FALSE` are the backend's true and false values.
//! - Functions: `NOT`, `ROUND`, `FLOOR`, `CEILING`, `LOG` (1 or 2 arguments),
//!   `MIN`, `MAX` and `IF(cond, result, ..., default)`.

mod compiler;
mod context;
mod error;
mod evaluate;
mod expression;
mod functions;
mod number;
mod parse;

/// Uses the [`pest`] parsing expression grammar language.
///
/// ```text
#[doc = include_str!("grammar.pest")]
/// ```
pub mod grammar_doc {}

pub use compiler::*;
pub use context::*;
pub use error::*;
pub use evaluate::*;
pub use expression::*;
pub use functions::*;
pub use number::*;
pub use parse::{ParseError, Rule};

use once_cell::sync::Lazy;

/// Process-wide compiler for `f32` formulas, created on first use.
pub static F32_COMPILER: Lazy<Compiler<f32>> = Lazy::new(Compiler::new);
