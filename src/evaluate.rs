use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::context::Context;
use crate::error::{Error, FunctionNotDefinedReason, Result};
use crate::expression::{BinaryOp, Expression, UnaryOp};
use crate::functions::Function;
use crate::number::Number;

/// A bound expression: a zero-argument computation that can be invoked any
/// number of times.
///
/// Cloning is cheap and shares the underlying closure. Evaluators are
/// reference counted with [`Rc`], so they are neither `Send` nor `Sync`: bind
/// the expression on the thread that evaluates it. The parsed [`Expression`]
/// and the [`Compiler`](crate::Compiler) that caches it can be shared freely.
///
/// ```compile_fail
/// use thunk_expr::Evaluator;
///
/// fn assert_send<T: Send>(_: T) {}
/// assert_send(Evaluator::constant(1.0f32));
/// ```
pub struct Evaluator<T>(Rc<dyn Fn() -> T>);

impl<T> Clone for Evaluator<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Evaluator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Evaluator")
            .field(&Rc::as_ptr(&self.0))
            .finish()
    }
}

impl<T> Evaluator<T> {
    pub fn new(f: impl Fn() -> T + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn evaluate(&self) -> T {
        (self.0)()
    }

    /// Whether both evaluators share the same closure.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }
}

impl<T: Copy + 'static> Evaluator<T> {
    pub fn constant(value: T) -> Self {
        Self::new(move || value)
    }
}

impl<T: Number> Evaluator<T> {
    /// Wraps this evaluator with the backend's truthiness test.
    pub fn into_predicate(self) -> Evaluator<bool> {
        Evaluator::new(move || self.evaluate().is_true())
    }
}

impl<T: Number> Expression<T> {
    /// Resolves every variable in this expression against `context`.
    ///
    /// Variables are looked up exactly once, here. The returned evaluator
    /// calls the variables' own evaluators directly, so changes in the values
    /// they produce are visible on the next evaluation, but registering new
    /// variables in `context` afterwards has no effect.
    pub fn bind(&self, context: &Context<'_, T>) -> Result<Evaluator<T>> {
        match self {
            Self::Literal(value) => Ok(Evaluator::constant(*value)),
            Self::Variable(name) => {
                let variable = context.get_variable(name)?;
                trace!(name = name.as_str(), "bound variable");
                Ok(variable)
            }
            Self::Group(inner) => inner.bind(context),
            Self::Unary(op, only) => {
                let only = only.bind(context)?;
                Ok(match op {
                    UnaryOp::Neg => Evaluator::new(move || only.evaluate().neg()),
                })
            }
            Self::Binary(op, lhs, rhs) => {
                let lhs = lhs.bind(context)?;
                let rhs = rhs.bind(context)?;
                Ok(bind_binary(*op, lhs, rhs))
            }
            Self::Call(function, args) => {
                if !function.accepts(args.len()) {
                    return Err(Error::FunctionNotDefined {
                        name: function.to_string(),
                        reason: FunctionNotDefinedReason::WrongParameterCount,
                    });
                }
                let args = args
                    .iter()
                    .map(|arg| arg.bind(context))
                    .collect::<Result<Vec<_>>>()?;
                Ok(bind_call(*function, args))
            }
        }
    }
}

fn bind_binary<T: Number>(op: BinaryOp, lhs: Evaluator<T>, rhs: Evaluator<T>) -> Evaluator<T> {
    match op {
        BinaryOp::Add => arithmetic(T::add, lhs, rhs),
        BinaryOp::Sub => arithmetic(T::sub, lhs, rhs),
        BinaryOp::Mul => arithmetic(T::mul, lhs, rhs),
        BinaryOp::Div => arithmetic(T::div, lhs, rhs),
        BinaryOp::Rem => arithmetic(T::rem, lhs, rhs),
        BinaryOp::Pow => arithmetic(T::pow, lhs, rhs),
        BinaryOp::Equal => comparison(T::approx_eq, lhs, rhs),
        BinaryOp::NotEqual => comparison(|l, r| !T::approx_eq(l, r), lhs, rhs),
        BinaryOp::Less => comparison(T::less_than, lhs, rhs),
        BinaryOp::LessEqual => comparison(T::less_or_equal, lhs, rhs),
        BinaryOp::Greater => comparison(T::greater_than, lhs, rhs),
        BinaryOp::GreaterEqual => comparison(T::greater_or_equal, lhs, rhs),
        // Both return an operand unchanged and skip `rhs` when `lhs` decides.
        BinaryOp::And => Evaluator::new(move || {
            let value = lhs.evaluate();
            if value.is_true() {
                rhs.evaluate()
            } else {
                value
            }
        }),
        BinaryOp::Or => Evaluator::new(move || {
            let value = lhs.evaluate();
            if value.is_true() {
                value
            } else {
                rhs.evaluate()
            }
        }),
    }
}

fn arithmetic<T: Number>(op: fn(T, T) -> T, lhs: Evaluator<T>, rhs: Evaluator<T>) -> Evaluator<T> {
    Evaluator::new(move || op(lhs.evaluate(), rhs.evaluate()))
}

fn comparison<T: Number>(
    op: fn(T, T) -> bool,
    lhs: Evaluator<T>,
    rhs: Evaluator<T>,
) -> Evaluator<T> {
    Evaluator::new(move || T::from_bool(op(lhs.evaluate(), rhs.evaluate())))
}

fn unary<T: Number>(op: fn(T) -> T, only: Evaluator<T>) -> Evaluator<T> {
    Evaluator::new(move || op(only.evaluate()))
}

/// `args` has already been checked with [`Function::accepts`].
fn bind_call<T: Number>(function: Function, mut args: Vec<Evaluator<T>>) -> Evaluator<T> {
    match function {
        Function::Not => unary(|v: T| T::from_bool(!v.is_true()), args.remove(0)),
        Function::Round(mode) => {
            let only = args.remove(0);
            Evaluator::new(move || only.evaluate().round(mode))
        }
        Function::Floor => unary(T::floor, args.remove(0)),
        Function::Ceiling => unary(T::ceiling, args.remove(0)),
        Function::Log => {
            let value = args.remove(0);
            match args.pop() {
                Some(base) => Evaluator::new(move || value.evaluate().log(base.evaluate())),
                None => unary(T::log10, value),
            }
        }
        Function::Min => fold(args, |acc, next| if next.less_than(acc) { next } else { acc }),
        Function::Max => fold(args, |acc, next| {
            if next.greater_than(acc) {
                next
            } else {
                acc
            }
        }),
        Function::If => {
            let default = args.pop().expect("IF takes an odd number of arguments");
            let branches: Vec<(Evaluator<T>, Evaluator<T>)> = args
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            Evaluator::new(move || {
                for (condition, result) in &branches {
                    if condition.evaluate().is_true() {
                        return result.evaluate();
                    }
                }
                default.evaluate()
            })
        }
    }
}

fn fold<T: Number>(args: Vec<Evaluator<T>>, pick: fn(T, T) -> T) -> Evaluator<T> {
    Evaluator::new(move || {
        let mut values = args.iter().map(Evaluator::evaluate);
        let first = values.next().expect("MIN and MAX take at least one argument");
        values.fold(first, pick)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::RoundingMode;

    use std::cell::Cell;

    fn literal(value: f32) -> Expression<f32> {
        Expression::Literal(value)
    }

    fn variable(name: &str) -> Expression<f32> {
        Expression::Variable(name.into())
    }

    #[test]
    fn bound_variable_is_not_wrapped() {
        let mut context = Context::new();
        let a = Evaluator::new(|| 3.0f32);
        context.register_evaluator("a", a.clone()).unwrap();

        let bound = variable("a").bind(&context).unwrap();
        assert!(Evaluator::ptr_eq(&bound, &a));
        let grouped = Expression::group(variable("a")).bind(&context).unwrap();
        assert!(Evaluator::ptr_eq(&grouped, &a));
    }

    #[test]
    fn unknown_variable_fails_at_bind_time() {
        let context = Context::new();
        let expr = Expression::binary(BinaryOp::Add, literal(1.0), variable("nope"));
        assert_eq!(
            expr.bind(&context).unwrap_err(),
            Error::VariableNotDefined("nope".into())
        );
    }

    #[test]
    fn logic_short_circuits() {
        thread_local! {
            static RHS_CALLS: Cell<u32> = const { Cell::new(0) };
        }
        let mut context = Context::new();
        context
            .register_variable("rhs", || {
                RHS_CALLS.with(|calls| calls.set(calls.get() + 1));
                7.0f32
            })
            .unwrap();

        let and = Expression::binary(BinaryOp::And, literal(0.0), variable("rhs"));
        assert_eq!(and.bind(&context).unwrap().evaluate(), 0.0);
        let or = Expression::binary(BinaryOp::Or, literal(2.0), variable("rhs"));
        assert_eq!(or.bind(&context).unwrap().evaluate(), 2.0);
        assert_eq!(RHS_CALLS.with(Cell::get), 0);

        let and = Expression::binary(BinaryOp::And, literal(2.0), variable("rhs"));
        assert_eq!(and.bind(&context).unwrap().evaluate(), 7.0);
        assert_eq!(RHS_CALLS.with(Cell::get), 1);
    }

    #[test]
    fn if_skips_conditions_after_first_match() {
        thread_local! {
            static LATE_CONDITION_CALLS: Cell<u32> = const { Cell::new(0) };
        }
        let mut context = Context::new();
        context
            .register_variable("late", || {
                LATE_CONDITION_CALLS.with(|calls| calls.set(calls.get() + 1));
                1.0f32
            })
            .unwrap();

        let expr = Expression::Call(
            Function::If,
            vec![literal(1.0), literal(10.0), variable("late"), literal(20.0), literal(30.0)],
        );
        let bound = expr.bind(&context).unwrap();
        assert_eq!(bound.evaluate(), 10.0);
        assert_eq!(bound.evaluate(), 10.0);
        assert_eq!(LATE_CONDITION_CALLS.with(Cell::get), 0);
    }

    #[test]
    fn hand_built_call_with_wrong_arity() {
        let context = Context::new();
        let expr = Expression::<f32>::Call(Function::Min, vec![]);
        assert_eq!(
            expr.bind(&context).unwrap_err(),
            Error::FunctionNotDefined {
                name: "MIN".into(),
                reason: FunctionNotDefinedReason::WrongParameterCount,
            }
        );
    }

    #[test]
    #[should_panic(expected = "MIN and MAX take at least one argument")]
    fn fold_without_arguments_is_a_broken_invariant() {
        fold::<f32>(vec![], |acc, _| acc).evaluate();
    }

    #[test]
    #[should_panic(expected = "IF takes an odd number of arguments")]
    fn if_without_arguments_is_a_broken_invariant() {
        bind_call::<f32>(Function::If, vec![]);
    }

    #[test]
    fn rounding_mode_follows_function() {
        let context = Context::new();
        let round = |mode| {
            Expression::Call(Function::Round(mode), vec![literal(2.5)])
                .bind(&context)
                .unwrap()
                .evaluate()
        };
        assert_eq!(round(RoundingMode::HalfToEven), 2.0);
        assert_eq!(round(RoundingMode::HalfAwayFromZero), 3.0);
    }

    #[test]
    fn predicate_uses_truthiness() {
        assert!(Evaluator::constant(5.0f32).into_predicate().evaluate());
        assert!(!Evaluator::constant(0.0f32).into_predicate().evaluate());
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        let context = Context::new();
        let expr = Expression::binary(BinaryOp::Div, literal(1.0), literal(0.0));
        assert_eq!(expr.bind(&context).unwrap().evaluate(), f32::INFINITY);
    }
}
