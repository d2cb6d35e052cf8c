//! Runtime value types for Mustache templates.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Capability adapter for struct-like context values.
///
/// Lookups on a frame try `call` first, then `field`. A value that provides a
/// method and a field of the same name therefore resolves to the method.
pub trait Resolve: Send + Sync {
    /// Zero-argument accessor named `name`, if the value has one.
    fn call(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Field named `name`, if the value has one.
    fn field(&self, name: &str) -> Option<Value>;

    /// Text used when the value itself is interpolated (`{{.}}`).
    fn display(&self) -> String {
        String::new()
    }
}

/// A shared handle to a [`Resolve`] implementation.
#[derive(Clone)]
pub struct Object(Arc<dyn Resolve>);

impl Object {
    pub fn new(inner: impl Resolve + 'static) -> Self {
        Self(Arc::new(inner))
    }

    pub fn call(&self, name: &str) -> Option<Value> {
        self.0.call(name)
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.field(name)
    }

    pub fn display(&self) -> String {
        self.0.display()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Object(..)")
    }
}

/// Objects compare by identity.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Callback handed to a lambda: renders text against the current context
/// stack, using the delimiters of the section the lambda was invoked from.
pub type RenderFn<'a> = dyn FnMut(&str) -> Result<String> + 'a;

type LambdaFn = dyn Fn(&str, &mut RenderFn<'_>) -> Result<String> + Send + Sync;

/// A callable context value.
///
/// In a section, the lambda receives the raw section body and its output is
/// parsed with the section's delimiters and rendered. In a variable tag it
/// receives empty text and its output is parsed as a template, rendered, then
/// escaped like any other variable.
#[derive(Clone)]
pub struct Lambda(Arc<LambdaFn>);

impl Lambda {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &mut RenderFn<'_>) -> Result<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A lambda that ignores its input and returns `f()`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::new(move |_, _| Ok(f()))
    }

    pub fn invoke(&self, text: &str, render: &mut RenderFn<'_>) -> Result<String> {
        (self.0)(text, render)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lambda(..)")
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Runtime value type for Mustache templates
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
    Struct(Object),
    Lambda(Lambda),
}

impl Value {
    /// Convert a JSON value. Numbers become `Integer` when they fit an `i64`.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(arr) => Value::Array(arr.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert anything serde can serialize, by way of its JSON form
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Value::from_json(serde_json::to_value(value)?))
    }

    /// Wrap a [`Resolve`] implementation as a struct-like value
    pub fn object(inner: impl Resolve + 'static) -> Self {
        Value::Struct(Object::new(inner))
    }

    /// Whether a section over this value renders nothing.
    ///
    /// Empty values: null, false, an empty array, and a string that contains
    /// only whitespace. Zero, `"0"` and empty maps are not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Array(arr) => arr.is_empty(),
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text written for an interpolation tag, before escaping
    pub fn stringify(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Map(_) => self.to_json().to_string(),
            Value::Struct(obj) => obj.display(),
            Value::Lambda(_) => String::new(),
        }
    }

    /// JSON form of the value. Structs become their display text and
    /// lambdas become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null | Value::Lambda(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(n) => JsonValue::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(arr) => JsonValue::Array(arr.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Struct(obj) => JsonValue::String(obj.display()),
        }
    }

    /// Zero-argument accessor lookup; only struct-like values have any
    pub(crate) fn call(&self, name: &str) -> Option<Value> {
        match self {
            Value::Struct(obj) => obj.call(name),
            _ => None,
        }
    }

    /// Keyed lookup on map-like and struct-like values
    pub(crate) fn field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::Struct(obj) => obj.field(name),
            _ => None,
        }
    }

    /// Whether the value answers keyed lookups at all
    pub(crate) fn is_keyed(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Struct(_))
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from_json(json)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Integer(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Integer)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Integer)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(map: HashMap<String, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Struct(obj)
    }
}

impl From<Lambda> for Value {
    fn from(lambda: Lambda) -> Self {
        Value::Lambda(lambda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Point {
        x: i64,
    }

    impl Resolve for Point {
        fn call(&self, name: &str) -> Option<Value> {
            (name == "describe").then(|| Value::from(format!("x={}", self.x)))
        }

        fn field(&self, name: &str) -> Option<Value> {
            (name == "x").then(|| Value::Integer(self.x))
        }

        fn display(&self) -> String {
            format!("({})", self.x)
        }
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"a": 1, "b": [true, null], "c": 1.5}));
        let Value::Map(map) = value else {
            panic!("Expected Map");
        };
        assert_eq!(map["a"], Value::Integer(1));
        assert_eq!(
            map["b"],
            Value::Array(vec![Value::Bool(true), Value::Null])
        );
        assert_eq!(map["c"], Value::Float(1.5));
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct User {
            name: String,
        }

        let value = Value::from_serialize(&User {
            name: "Mike".to_string(),
        })
        .unwrap();
        assert_eq!(value.field("name"), Some(Value::from("Mike")));
    }

    #[test]
    fn test_is_empty() {
        assert!(Value::Null.is_empty());
        assert!(Value::Bool(false).is_empty());
        assert!(Value::Array(vec![]).is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::from("  \n").is_empty());

        assert!(!Value::Integer(0).is_empty());
        assert!(!Value::from("0").is_empty());
        assert!(!Value::Map(HashMap::new()).is_empty());
        assert!(!Value::object(Point { x: 0 }).is_empty());
        assert!(!Value::from(Lambda::from_fn(String::new)).is_empty());
    }

    #[test]
    fn test_stringify_numbers() {
        assert_eq!(Value::Float(1.21).stringify(), "1.21");
        assert_eq!(Value::Float(5.0).stringify(), "5");
        assert_eq!(Value::Integer(85).stringify(), "85");
        assert_eq!(Value::Integer(-3).stringify(), "-3");
    }

    #[test]
    fn test_stringify_other() {
        assert_eq!(Value::Null.stringify(), "");
        assert_eq!(Value::Bool(true).stringify(), "true");
        assert_eq!(Value::from(vec![1, 2]).stringify(), "[1,2]");
        assert_eq!(Value::from(json!({"b": 1, "a": "x"})).stringify(), r#"{"a":"x","b":1}"#);
        assert_eq!(Value::object(Point { x: 4 }).stringify(), "(4)");
    }

    #[test]
    fn test_struct_lookup() {
        let point = Value::object(Point { x: 7 });
        assert_eq!(point.call("describe"), Some(Value::from("x=7")));
        assert_eq!(point.field("x"), Some(Value::Integer(7)));
        assert_eq!(point.field("y"), None);
        assert!(point.is_keyed());
        assert!(!Value::Integer(1).is_keyed());
    }

    #[test]
    fn test_object_identity() {
        let a = Object::new(Point { x: 1 });
        let b = Object::new(Point { x: 1 });
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_option_and_large_numbers() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
        assert_eq!(Value::from(u64::MAX), Value::Float(u64::MAX as f64));
        assert_eq!(Value::from(3usize), Value::Integer(3));
    }
}
