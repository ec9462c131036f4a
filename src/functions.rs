use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, FunctionNotDefinedReason};
use crate::number::RoundingMode;

/// The fixed set of callable functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    /// `NOT(v)`: backend false if `v` is truthy, else backend true.
    Not,
    Round(RoundingMode),
    Floor,
    Ceiling,
    /// `LOG(v)` is base 10, `LOG(v, base)` is `log(v) / log(base)`.
    Log,
    Min,
    Max,
    /// `IF(cond1, result1, ..., condN, resultN, default)`.
    If,
}

impl Function {
    /// Whether a call with `count` arguments is well formed.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Self::Not | Self::Round(_) | Self::Floor | Self::Ceiling => count == 1,
            Self::Log => count == 1 || count == 2,
            Self::Min | Self::Max => count >= 1,
            Self::If => count >= 3 && count % 2 == 1,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Not => "NOT",
            Self::Round(_) => "ROUND",
            Self::Floor => "FLOOR",
            Self::Ceiling => "CEILING",
            Self::Log => "LOG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::If => "IF",
        };
        f.write_str(name)
    }
}

/// Maps call names to [`Function`]s. Fixed once handed to a
/// [`Compiler`](crate::Compiler).
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionTable {
    functions: HashMap<String, Function>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::standard(RoundingMode::default())
    }
}

impl FunctionTable {
    /// A table with no functions at all.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// `NOT`, `ROUND`, `FLOOR`, `CEILING`, `LOG`, `MIN`, `MAX` and `IF` under
    /// their usual names, with `ROUND` using `rounding`.
    pub fn standard(rounding: RoundingMode) -> Self {
        [
            Function::Not,
            Function::Round(rounding),
            Function::Floor,
            Function::Ceiling,
            Function::Log,
            Function::Min,
            Function::Max,
            Function::If,
        ]
        .into_iter()
        .fold(Self::new(), |table, function| {
            table.with(function.to_string(), function)
        })
    }

    /// Registers `function` under `name`, replacing any previous entry.
    pub fn with(mut self, name: impl Into<String>, function: Function) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<Function> {
        self.functions.get(name).copied()
    }

    /// Looks up `name` and validates the argument count of the call.
    pub fn resolve(&self, name: &str, arg_count: usize) -> Result<Function, Error> {
        let function = self.get(name).ok_or_else(|| Error::FunctionNotDefined {
            name: name.to_string(),
            reason: FunctionNotDefinedReason::UnknownName,
        })?;
        if !function.accepts(arg_count) {
            return Err(Error::FunctionNotDefined {
                name: name.to_string(),
                reason: FunctionNotDefinedReason::WrongParameterCount,
            });
        }
        Ok(function)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
