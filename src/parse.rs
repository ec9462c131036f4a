use crate::error::Result;
use crate::expression::{BinaryOp, Expression, UnaryOp};
use crate::functions::FunctionTable;
use crate::number::Number;

use pest::error::ErrorVariant;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"] // relative to project `src`
struct ExpressionParser;

/// Syntax error with the offending input, its position and what was expected
/// there.
pub type ParseError = pest::error::Error<Rule>;

/// Parses `input` into an unbound [`Expression`], resolving function calls
/// against `functions` as they are encountered.
pub(crate) fn parse<T: Number>(input: &str, functions: &FunctionTable) -> Result<Expression<T>> {
    let formula = ExpressionParser::parse(Rule::formula, input)
        .map_err(|err| err.renamed_rules(describe_rule))?
        .next()
        .unwrap();
    // `expression` followed by `EOI`.
    build(formula.into_inner().next().unwrap(), functions)
}

fn build<T: Number>(pair: Pair<Rule>, functions: &FunctionTable) -> Result<Expression<T>> {
    let pair = skip_single_levels(pair);
    match pair.as_rule() {
        Rule::disjunction
        | Rule::conjunction
        | Rule::equality
        | Rule::relation
        | Rule::sum
        | Rule::product => {
            // Left associative. The grammar allows only one operator for
            // `equality` and `relation`, so those fold at most once.
            let mut inner = pair.into_inner();
            let mut lhs = build(inner.next().unwrap(), functions)?;
            while let Some(op) = inner.next() {
                let rhs = build(inner.next().unwrap(), functions)?;
                lhs = Expression::binary(binary_op(&op), lhs, rhs);
            }
            Ok(lhs)
        }
        Rule::power => {
            // Right associative: a ^ b ^ c = a ^ (b ^ c).
            let mut operands = pair
                .into_inner()
                .filter(|p| p.as_rule() != Rule::pow)
                .map(|p| build(p, functions))
                .collect::<Result<Vec<_>>>()?;
            let mut rhs = operands.pop().unwrap();
            while let Some(lhs) = operands.pop() {
                rhs = Expression::binary(BinaryOp::Pow, lhs, rhs);
            }
            Ok(rhs)
        }
        Rule::operand => {
            let mut inner = pair.into_inner();
            let first = inner.next().unwrap();
            match first.as_rule() {
                Rule::neg => Ok(Expression::unary(
                    UnaryOp::Neg,
                    build(inner.next().unwrap(), functions)?,
                )),
                _ => build(first, functions),
            }
        }
        Rule::group => Ok(Expression::group(build(
            pair.into_inner().next().unwrap(),
            functions,
        )?)),
        Rule::number => {
            let literal_str = pair.as_str();
            match T::parse(literal_str) {
                Some(value) => Ok(Expression::Literal(value)),
                None => Err(ParseError::new_from_span(
                    ErrorVariant::CustomError {
                        message: format!("Unexpected literal: {literal_str}"),
                    },
                    pair.as_span(),
                )
                .into()),
            }
        }
        Rule::boolean => Ok(Expression::Literal(T::from_bool(pair.as_str() == "TRUE"))),
        Rule::variable => Ok(Expression::Variable(pair.as_str().to_string())),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner.next().unwrap();
            let args: Vec<_> = inner.collect();
            let function = functions.resolve(name.as_str(), args.len())?;
            let args = args
                .into_iter()
                .map(|arg| build(arg, functions))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::Call(function, args))
        }
        x => unreachable!("Unexpected primary rule {x:?}"),
    }
}

/// Descends through precedence levels that hold a single child, so a
/// parenthesized operand costs one `build` frame per `group` instead of one per
/// level.
fn skip_single_levels(mut pair: Pair<Rule>) -> Pair<Rule> {
    loop {
        match pair.as_rule() {
            Rule::expression
            | Rule::disjunction
            | Rule::conjunction
            | Rule::equality
            | Rule::relation
            | Rule::sum
            | Rule::product
            | Rule::power
            | Rule::operand => {
                let mut inner = pair.clone().into_inner();
                match (inner.next(), inner.next()) {
                    (Some(only), None) => pair = only,
                    _ => return pair,
                }
            }
            _ => return pair,
        }
    }
}

fn binary_op(op: &Pair<Rule>) -> BinaryOp {
    match op.as_rule() {
        Rule::or => BinaryOp::Or,
        Rule::and => BinaryOp::And,
        Rule::eq => BinaryOp::Equal,
        Rule::neq => BinaryOp::NotEqual,
        Rule::lt => BinaryOp::Less,
        Rule::le => BinaryOp::LessEqual,
        Rule::gt => BinaryOp::Greater,
        Rule::ge => BinaryOp::GreaterEqual,
        Rule::add => BinaryOp::Add,
        Rule::subtract => BinaryOp::Sub,
        Rule::multiply => BinaryOp::Mul,
        Rule::divide => BinaryOp::Div,
        Rule::modulo => BinaryOp::Rem,
        Rule::pow => BinaryOp::Pow,
        x => unreachable!("Unexpected operator {x:?}"),
    }
}

/// Names used for rules in the "expected ..." part of syntax errors.
fn describe_rule(rule: &Rule) -> String {
    let name = match rule {
        Rule::EOI => "end of input",
        Rule::expression
        | Rule::disjunction
        | Rule::conjunction
        | Rule::equality
        | Rule::relation
        | Rule::sum
        | Rule::product
        | Rule::power
        | Rule::operand => "expression",
        Rule::group => "parenthesized expression",
        Rule::call => "function call",
        Rule::function_name => "function name",
        Rule::boolean => "TRUE or FALSE",
        Rule::variable => "variable",
        Rule::number => "number",
        Rule::and => "AND",
        Rule::or => "OR",
        Rule::eq => "=",
        Rule::neq => "!=",
        Rule::lt => "<",
        Rule::le => "<=",
        Rule::gt => ">",
        Rule::ge => ">=",
        Rule::add => "+",
        Rule::subtract | Rule::neg => "-",
        Rule::multiply => "*",
        Rule::divide => "/",
        Rule::modulo => "%",
        Rule::pow => "^",
        other => return format!("{other:?}"),
    };
    name.to_string()
}
