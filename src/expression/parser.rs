//! Parser for expression placeholders.
//!
//! Converts the expression source (the leaf text after the expression
//! leader) into an AST using a PEST grammar with conventional arithmetic
//! precedence.

use super::ast::{Expression, Operator, UnaryOperator, Value};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

/// Parser for expression placeholders.
#[derive(Parser)]
#[grammar = "expression/expression.pest"]
pub struct ExpressionParser;

impl ExpressionParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses the input into an expression AST. The error string is wrapped
    /// into a resolution error, together with the source text, by the caller.
    pub fn parse_expression(&self, input: &str) -> Result<Expression, String> {
        let pairs = Self::parse(Rule::complete_expr, input)
            .map_err(|e| format!("parse error: {}", e))?;

        let expr_pair = pairs
            .into_iter()
            .next()
            .ok_or_else(|| "parse error: empty input".to_string())?;

        self.build_ast(expr_pair)
    }

    /// Builds an AST from a parse tree node.
    fn build_ast(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        match pair.as_rule() {
            Rule::complete_expr | Rule::expr => {
                let inner = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| "empty expression".to_string())?;
                self.build_ast(inner)
            }
            Rule::logic_expr => self.parse_binary_tier(pair, parse_logic_op),
            Rule::comp_expr => self.parse_binary_tier(pair, parse_comp_op),
            Rule::add_expr => self.parse_binary_tier(pair, parse_add_op),
            Rule::mul_expr => self.parse_binary_tier(pair, parse_mul_op),
            Rule::pow_expr => self.parse_binary_tier(pair, parse_pow_op),
            Rule::unary_expr => self.parse_unary_expr(pair),
            Rule::atom => self.parse_atom(pair),
            other => Err(format!("unexpected rule: {:?}", other)),
        }
    }

    /// Parses one precedence tier: a left-associative chain of operands
    /// joined by that tier's operators.
    fn parse_binary_tier(
        &self,
        pair: Pair<Rule>,
        parse_op: fn(&str) -> Result<Operator, String>,
    ) -> Result<Expression, String> {
        let mut pairs = pair.into_inner();

        let first = pairs.next().ok_or_else(|| "empty expression".to_string())?;
        let mut expr = self.build_ast(first)?;

        while let Some(op_pair) = pairs.next() {
            let operator = parse_op(op_pair.as_str())?;
            let right_pair = pairs
                .next()
                .ok_or_else(|| format!("missing operand after {:?}", op_pair.as_str()))?;
            let right = self.build_ast(right_pair)?;

            expr = Expression::BinaryOp {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Parses a chain of unary operators applied to an atom.
    fn parse_unary_expr(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        let mut pairs = pair.into_inner();

        let mut unary_ops = Vec::new();
        while let Some(op_pair) = pairs.peek() {
            if op_pair.as_rule() == Rule::unary_op {
                let op = match op_pair.as_str() {
                    "-" => UnaryOperator::Negate,
                    "!" => UnaryOperator::Not,
                    other => return Err(format!("unknown unary operator: {}", other)),
                };
                unary_ops.push(op);
                pairs.next();
            } else {
                break;
            }
        }

        let atom_pair = pairs.next().ok_or_else(|| "empty expression".to_string())?;
        let mut expr = self.build_ast(atom_pair)?;

        // Apply right to left.
        for op in unary_ops.into_iter().rev() {
            expr = Expression::UnaryOp {
                operator: op,
                expr: Box::new(expr),
            };
        }

        Ok(expr)
    }

    /// Parses an atom: literal, function call, field access, identifier or
    /// parenthesized expression.
    fn parse_atom(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| "empty atom".to_string())?;

        match inner.as_rule() {
            Rule::number => {
                let n = inner
                    .as_str()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid number: {}", e))?;
                Ok(Expression::Literal(Value::Number(n)))
            }
            Rule::string => {
                let s = inner.as_str();
                let s = &s[1..s.len() - 1];
                Ok(Expression::Literal(Value::String(s.to_string())))
            }
            Rule::boolean => Ok(Expression::Literal(Value::Boolean(inner.as_str() == "true"))),
            Rule::null => Ok(Expression::Literal(Value::Null)),
            Rule::function_call => self.parse_function_call(inner),
            Rule::field_access => self.parse_field_access(inner),
            Rule::identifier => Ok(Expression::Variable(inner.as_str().to_string())),
            Rule::expr => self.build_ast(inner),
            other => Err(format!("unexpected rule in atom: {:?}", other)),
        }
    }

    /// Parses a field access chain (`rec.count`, `rec.baz.0.bar`).
    fn parse_field_access(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        let mut pairs = pair.into_inner();

        let obj_ident = pairs.next().ok_or_else(|| "empty field access".to_string())?;
        let mut expr = Expression::Variable(obj_ident.as_str().to_string());

        for field_pair in pairs {
            expr = Expression::FieldAccess {
                object: Box::new(expr),
                field: field_pair.as_str().to_string(),
            };
        }

        Ok(expr)
    }

    /// Parses a function call with a dotted callee (`ctx.foo(1, 2)`).
    fn parse_function_call(&self, pair: Pair<Rule>) -> Result<Expression, String> {
        let mut path = Vec::new();
        let mut args = Vec::new();

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::identifier => path.push(inner.as_str().to_string()),
                _ => args.push(self.build_ast(inner)?),
            }
        }

        Ok(Expression::FunctionCall { path, args })
    }
}

fn parse_logic_op(op: &str) -> Result<Operator, String> {
    match op {
        "&&" => Ok(Operator::And),
        "||" => Ok(Operator::Or),
        other => Err(format!("unknown logic operator: {}", other)),
    }
}

fn parse_comp_op(op: &str) -> Result<Operator, String> {
    match op {
        "==" => Ok(Operator::Equal),
        "!=" => Ok(Operator::NotEqual),
        "<" => Ok(Operator::LessThan),
        "<=" => Ok(Operator::LessThanOrEqual),
        ">" => Ok(Operator::GreaterThan),
        ">=" => Ok(Operator::GreaterThanOrEqual),
        other => Err(format!("unknown comparison operator: {}", other)),
    }
}

fn parse_add_op(op: &str) -> Result<Operator, String> {
    match op {
        "+" => Ok(Operator::Add),
        "-" => Ok(Operator::Subtract),
        other => Err(format!("unknown addition operator: {}", other)),
    }
}

fn parse_mul_op(op: &str) -> Result<Operator, String> {
    match op {
        "*" => Ok(Operator::Multiply),
        "/" => Ok(Operator::Divide),
        other => Err(format!("unknown multiplication operator: {}", other)),
    }
}

fn parse_pow_op(op: &str) -> Result<Operator, String> {
    match op {
        "^" => Ok(Operator::Power),
        other => Err(format!("unknown power operator: {}", other)),
    }
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}
