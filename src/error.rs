use std::fmt;

use thiserror::Error;

use crate::parse::ParseError;

/// Everything that can make compiling a formula fail.
///
/// Evaluating an already compiled formula never fails; numeric edge cases
/// such as division by zero produce whatever the backend defines.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("failed to parse expression: {0}")]
    Parse(Box<ParseError>),
    #[error("Function '{name}' not defined: {reason}")]
    FunctionNotDefined {
        name: String,
        reason: FunctionNotDefinedReason,
    },
    #[error("Variable '{0}' not defined")]
    VariableNotDefined(String),
    #[error("Variable '{0}' already registered")]
    DuplicateVariable(String),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(Box::new(err))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionNotDefinedReason {
    UnknownName,
    WrongParameterCount,
}

impl fmt::Display for FunctionNotDefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownName => f.write_str("Unknown name"),
            Self::WrongParameterCount => f.write_str("Wrong parameters count"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
