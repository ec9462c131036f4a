use crate::functions::Function;

/// An unbound expression tree produced by parsing.
///
/// Expressions hold no references to variable values. They are turned into an
/// [`Evaluator`](crate::Evaluator) by [`Expression::bind`], which can be done
/// any number of times against different [`Context`](crate::Context)s.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression<T> {
    // Constant.
    Literal(T),

    // Input variable, resolved at bind time.
    Variable(String),

    Unary(UnaryOp, Box<Expression<T>>),
    Binary(BinaryOp, Box<Expression<T>>, Box<Expression<T>>),

    // Arity was checked against the function table when the call was parsed.
    Call(Function, Vec<Expression<T>>),

    // Parenthesized subexpression.
    Group(Box<Expression<T>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic.
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,

    // Comparisons. These yield the backend's true/false values.
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logic. These yield one of their operands unchanged.
    And,
    Or,
}

impl<T> Expression<T> {
    pub fn unary(op: UnaryOp, only: Self) -> Self {
        Self::Unary(op, Box::new(only))
    }

    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn group(inner: Self) -> Self {
        Self::Group(Box::new(inner))
    }

    /// Visits every variable reference in evaluation order, including
    /// duplicates.
    pub fn for_each_variable<'a>(&'a self, visit: &mut impl FnMut(&'a str)) {
        match self {
            Self::Literal(_) => {}
            Self::Variable(name) => visit(name),
            Self::Unary(_, only) | Self::Group(only) => only.for_each_variable(visit),
            Self::Binary(_, lhs, rhs) => {
                lhs.for_each_variable(visit);
                rhs.for_each_variable(visit);
            }
            Self::Call(_, args) => {
                for arg in args {
                    arg.for_each_variable(visit);
                }
            }
        }
    }
}
