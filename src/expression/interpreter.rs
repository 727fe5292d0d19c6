//! Interpreter for expression placeholders.
//!
//! Expressions evaluate against three named bindings: `rec` (the current
//! record, with earlier fields already concrete), `ctx` (the per-run shared
//! context) and `data` (the whole dataset). Functions are Rust closures
//! registered by the caller and invoked as `ctx.<name>(...)`; a small set of
//! built-ins (`min`, `max`, `concat`, `to_string`, `to_number`) is callable
//! by plain name. Function state persists across records for the run.

use super::ast::{Expression, Operator, UnaryOperator, Value};
use std::collections::HashMap;

/// Type for functions callable from expressions. `FnMut` so caller-supplied
/// context functions can carry mutable state, such as counters, across
/// records.
pub type ContextFunction = Box<dyn FnMut(Vec<Value>) -> Result<Value, String>>;

/// Evaluates expression ASTs against a set of named bindings.
pub struct Interpreter<'a> {
    /// Variables in scope (`rec`, `ctx`, `data`).
    variables: HashMap<String, Value>,

    /// Registered functions, shared across the run.
    functions: &'a mut HashMap<String, ContextFunction>,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter over the given bindings and function set.
    pub fn new(
        variables: HashMap<String, Value>,
        functions: &'a mut HashMap<String, ContextFunction>,
    ) -> Self {
        Self {
            variables,
            functions,
        }
    }

    /// Evaluates an expression.
    pub fn evaluate(&mut self, expr: &Expression) -> Result<Value, String> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(name) => self.evaluate_variable(name),
            Expression::FieldAccess { object, field } => self.evaluate_field_access(object, field),
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => self.evaluate_binary_op(left, operator, right),
            Expression::UnaryOp { operator, expr } => self.evaluate_unary_op(operator, expr),
            Expression::FunctionCall { path, args } => self.evaluate_function_call(path, args),
        }
    }

    fn evaluate_variable(&self, name: &str) -> Result<Value, String> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| format!("variable not found: {}", name))
    }

    fn evaluate_field_access(&mut self, object: &Expression, field: &str) -> Result<Value, String> {
        let obj = self.evaluate(object)?;
        match obj {
            Value::Object(map) => map
                .get(field)
                .map(|v| Value::from(v.clone()))
                .ok_or_else(|| format!("field not found: {}", field)),
            Value::Array(items) => {
                let index = field
                    .parse::<usize>()
                    .map_err(|_| format!("array index expected, got: {}", field))?;
                items
                    .get(index)
                    .map(|v| Value::from(v.clone()))
                    .ok_or_else(|| format!("array index out of bounds: {}", index))
            }
            other => Err(format!("cannot access field {} on {}", field, other)),
        }
    }

    fn evaluate_function_call(
        &mut self,
        path: &[String],
        args: &[Expression],
    ) -> Result<Value, String> {
        let name = match path {
            [name] => name,
            [prefix, name] if prefix == "ctx" => name,
            _ => return Err(format!("not a callable path: {}", path.join("."))),
        };

        let mut evaluated_args = Vec::with_capacity(args.len());
        for arg in args {
            evaluated_args.push(self.evaluate(arg)?);
        }

        let func = self
            .functions
            .get_mut(name)
            .ok_or_else(|| format!("function not found: {}", name))?;
        func(evaluated_args)
    }

    fn evaluate_binary_op(
        &mut self,
        left: &Expression,
        operator: &Operator,
        right: &Expression,
    ) -> Result<Value, String> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator {
            Operator::Add => add(&left_val, &right_val),
            Operator::Subtract => numeric_op(&left_val, &right_val, "subtract", |a, b| a - b),
            Operator::Multiply => numeric_op(&left_val, &right_val, "multiply", |a, b| a * b),
            Operator::Divide => divide(&left_val, &right_val),
            Operator::Power => numeric_op(&left_val, &right_val, "raise", f64::powf),
            Operator::Equal => Ok(Value::Boolean(values_equal(&left_val, &right_val))),
            Operator::NotEqual => Ok(Value::Boolean(!values_equal(&left_val, &right_val))),
            Operator::LessThan => compare(&left_val, &right_val, |o| o == std::cmp::Ordering::Less),
            Operator::LessThanOrEqual => {
                compare(&left_val, &right_val, |o| o != std::cmp::Ordering::Greater)
            }
            Operator::GreaterThan => {
                compare(&left_val, &right_val, |o| o == std::cmp::Ordering::Greater)
            }
            Operator::GreaterThanOrEqual => {
                compare(&left_val, &right_val, |o| o != std::cmp::Ordering::Less)
            }
            Operator::And => logic(&left_val, &right_val, |a, b| a && b),
            Operator::Or => logic(&left_val, &right_val, |a, b| a || b),
        }
    }

    fn evaluate_unary_op(
        &mut self,
        operator: &UnaryOperator,
        expr: &Expression,
    ) -> Result<Value, String> {
        let val = self.evaluate(expr)?;

        match operator {
            UnaryOperator::Negate => match val {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(format!("cannot negate {}", other)),
            },
            UnaryOperator::Not => match val {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(format!("cannot apply ! to {}", other)),
            },
        }
    }
}

/// Addition: numbers add, strings concatenate, and numeric strings coerce.
fn add(left: &Value, right: &Value) -> Result<Value, String> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => {
            if let (Ok(num_a), Ok(num_b)) = (a.parse::<f64>(), b.parse::<f64>()) {
                Ok(Value::Number(num_a + num_b))
            } else {
                Ok(Value::String(format!("{}{}", a, b)))
            }
        }
        (Value::Number(a), Value::String(b)) => b
            .parse::<f64>()
            .map(|num_b| Value::Number(a + num_b))
            .map_err(|_| format!("cannot add {} and {}", left, right)),
        (Value::String(a), Value::Number(b)) => a
            .parse::<f64>()
            .map(|num_a| Value::Number(num_a + b))
            .map_err(|_| format!("cannot add {} and {}", left, right)),
        _ => Err(format!("cannot add {} and {}", left, right)),
    }
}

fn numeric_op(
    left: &Value,
    right: &Value,
    verb: &str,
    op: fn(f64, f64) -> f64,
) -> Result<Value, String> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op(*a, *b))),
        _ => Err(format!("cannot {} {} and {}", verb, left, right)),
    }
}

fn divide(left: &Value, right: &Value) -> Result<Value, String> {
    match (left, right) {
        (Value::Number(_), Value::Number(b)) if *b == 0.0 => Err("division by zero".to_string()),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        _ => Err(format!("cannot divide {} by {}", left, right)),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

fn compare(
    left: &Value,
    right: &Value,
    accept: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, String> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };

    ordering
        .map(|o| Value::Boolean(accept(o)))
        .ok_or_else(|| format!("cannot compare {} and {}", left, right))
}

fn logic(left: &Value, right: &Value, op: fn(bool, bool) -> bool) -> Result<Value, String> {
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(op(*a, *b))),
        _ => Err(format!("cannot apply logic to {} and {}", left, right)),
    }
}

/// Returns the default set of built-in functions.
pub fn builtin_functions() -> HashMap<String, ContextFunction> {
    let mut functions: HashMap<String, ContextFunction> = HashMap::new();

    functions.insert(
        "min".to_string(),
        Box::new(|args| {
            numeric_pair(&args, "min").map(|(a, b)| Value::Number(a.min(b)))
        }),
    );

    functions.insert(
        "max".to_string(),
        Box::new(|args| {
            numeric_pair(&args, "max").map(|(a, b)| Value::Number(a.max(b)))
        }),
    );

    functions.insert(
        "concat".to_string(),
        Box::new(|args| {
            let mut result = String::new();
            for arg in args {
                match arg {
                    Value::String(s) => result.push_str(&s),
                    _ => return Err("concat() requires string arguments".to_string()),
                }
            }
            Ok(Value::String(result))
        }),
    );

    functions.insert(
        "to_string".to_string(),
        Box::new(|args| {
            if args.len() != 1 {
                return Err("to_string() requires exactly 1 argument".to_string());
            }
            let result = match &args[0] {
                Value::Number(n) => n.to_string(),
                Value::Boolean(b) => b.to_string(),
                Value::String(s) => s.clone(),
                Value::Null => "null".to_string(),
                Value::Object(_) => "<object>".to_string(),
                Value::Array(_) => "<array>".to_string(),
            };
            Ok(Value::String(result))
        }),
    );

    functions.insert(
        "to_number".to_string(),
        Box::new(|args| {
            if args.len() != 1 {
                return Err("to_number() requires exactly 1 argument".to_string());
            }
            let result = match &args[0] {
                Value::Number(n) => *n,
                Value::Boolean(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
                _ => 0.0,
            };
            Ok(Value::Number(result))
        }),
    );

    functions
}

fn numeric_pair(args: &[Value], name: &str) -> Result<(f64, f64), String> {
    match args {
        [Value::Number(a), Value::Number(b)] => Ok((*a, *b)),
        _ => Err(format!("{}() requires exactly 2 numeric arguments", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::{builtin_functions, ContextFunction, Interpreter};
    use crate::expression::ast::Value;
    use crate::expression::parser::ExpressionParser;
    use serde_json::json;
    use std::collections::HashMap;

    fn eval(input: &str, variables: HashMap<String, Value>) -> Result<Value, String> {
        let parser = ExpressionParser::new();
        let ast = parser.parse_expression(input)?;
        let mut functions = builtin_functions();
        Interpreter::new(variables, &mut functions).evaluate(&ast)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("2 + 3 * 4", HashMap::new()), Ok(Value::Number(14.0)));
        assert_eq!(eval("(2 + 3) * 4", HashMap::new()), Ok(Value::Number(20.0)));
        assert_eq!(eval("2 ^ 3", HashMap::new()), Ok(Value::Number(8.0)));
        assert!(eval("1 / 0", HashMap::new()).is_err());
    }

    #[test]
    fn test_record_field_access() {
        let mut variables = HashMap::new();
        variables.insert(
            "rec".to_string(),
            Value::from(json!({ "count": 3, "baz": [{ "bar": "a2" }] })),
        );

        assert_eq!(eval("rec.count + .1", variables.clone()), Ok(Value::Number(3.1)));
        assert_eq!(
            eval("rec.baz.0.bar", variables.clone()),
            Ok(Value::String("a2".to_string()))
        );
        assert!(eval("rec.missing", variables).is_err());
    }

    #[test]
    fn test_comparison_and_logic() {
        let mut variables = HashMap::new();
        variables.insert("rec".to_string(), Value::from(json!({ "count": 7 })));

        assert_eq!(
            eval("rec.count > 5 && rec.count < 10", variables),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn test_builtins() {
        assert_eq!(eval("min(2, 5)", HashMap::new()), Ok(Value::Number(2.0)));
        assert_eq!(
            eval("concat(\"a\", \"b\")", HashMap::new()),
            Ok(Value::String("ab".to_string()))
        );
        assert_eq!(
            eval("to_number(\"4\") + 1", HashMap::new()),
            Ok(Value::Number(5.0))
        );
    }

    #[test]
    fn test_context_function_keeps_state() {
        let parser = ExpressionParser::new();
        let ast = parser.parse_expression("ctx.foo()").unwrap();

        let mut count = 0.0;
        let mut functions: HashMap<String, ContextFunction> = HashMap::new();
        functions.insert(
            "foo".to_string(),
            Box::new(move |_args| {
                let value = count;
                count += 1.0;
                Ok(Value::Number(value))
            }),
        );

        for expected in [0.0, 1.0, 2.0] {
            let mut interpreter = Interpreter::new(HashMap::new(), &mut functions);
            assert_eq!(interpreter.evaluate(&ast), Ok(Value::Number(expected)));
        }
    }

    #[test]
    fn test_unknown_variable_and_function() {
        assert!(eval("nope", HashMap::new()).is_err());
        assert!(eval("ctx.nope()", HashMap::new()).is_err());
        assert!(eval("rec.foo(1)", HashMap::new()).is_err());
    }
}
