//! Abstract syntax tree for expression placeholders.

use serde_json::Value as JsonValue;
use std::fmt;

/// A runtime value in the expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A numeric value (floating point).
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A string value.
    String(String),
    /// A null value.
    Null,
    /// A JSON object value.
    Object(serde_json::Map<String, JsonValue>),
    /// A JSON array value.
    Array(Vec<JsonValue>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Null => write!(f, "null"),
            Value::Object(_) => write!(f, "<object>"),
            Value::Array(_) => write!(f, "<array>"),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Boolean(b) => JsonValue::Bool(b),
            Value::String(s) => JsonValue::String(s),
            Value::Null => JsonValue::Null,
            Value::Object(map) => JsonValue::Object(map),
            Value::Array(items) => JsonValue::Array(items),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Null => Value::Null,
            JsonValue::Object(map) => Value::Object(map),
            JsonValue::Array(items) => Value::Array(items),
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Subtract,
    /// Multiplication (`*`).
    Multiply,
    /// Division (`/`).
    Divide,
    /// Power (`^`).
    Power,
    /// Equality (`==`).
    Equal,
    /// Inequality (`!=`).
    NotEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal (`<=`).
    LessThanOrEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal (`>=`).
    GreaterThanOrEqual,
    /// Logical AND (`&&`).
    And,
    /// Logical OR (`||`).
    Or,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Negation (`-`).
    Negate,
    /// Logical NOT (`!`).
    Not,
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value.
    Literal(Value),

    /// A variable reference (`rec`, `ctx`, `data`).
    Variable(String),

    /// A field access expression (`rec.count`).
    FieldAccess {
        /// The object being accessed.
        object: Box<Expression>,
        /// The field name; numeric names index arrays.
        field: String,
    },

    /// A binary operation (`a + b`).
    BinaryOp {
        /// Left operand.
        left: Box<Expression>,
        /// The operator.
        operator: Operator,
        /// Right operand.
        right: Box<Expression>,
    },

    /// A unary operation (`-a`, `!b`).
    UnaryOp {
        /// The operator.
        operator: UnaryOperator,
        /// The operand.
        expr: Box<Expression>,
    },

    /// A function call (`ctx.hash_password(rec.name)`).
    FunctionCall {
        /// Dotted callee path.
        path: Vec<String>,
        /// Argument expressions.
        args: Vec<Expression>,
    },
}
