//! Script data values.
//!
//! The evaluator owns the real value representation; this is the subset the
//! sandbox needs to see when data crosses a frame boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Ordered string-keyed mapping
    Map(BTreeMap<String, Value>),
    /// Integer-indexed mapping
    IntMap(BTreeMap<i64, Value>),
}

impl Value {
    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_) | Value::IntMap(_))
    }

    /// Iterates the direct children of a container, `None` for scalars.
    pub fn children(&self) -> Option<Box<dyn Iterator<Item = &Value> + '_>> {
        match self {
            Value::List(items) => Some(Box::new(items.iter())),
            Value::Map(map) => Some(Box::new(map.values())),
            Value::IntMap(map) => Some(Box::new(map.values())),
            _ => None,
        }
    }

    /// Folds `key, value, key, value, ...` into a mapping.
    ///
    /// All string keys produce a [`Value::Map`], all integer keys an
    /// [`Value::IntMap`].
    pub fn dict_from_pairs(items: Vec<Value>) -> Result<Value, ExecError> {
        if items.len() % 2 != 0 {
            return Err(ExecError::InvalidArgument(
                "invalid dict call: odd number of arguments".to_string(),
            ));
        }

        let mut iter = items.into_iter();
        let mut strings = BTreeMap::new();
        let mut ints = BTreeMap::new();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            match key {
                Value::Str(k) => {
                    strings.insert(k, value);
                }
                Value::Int(k) => {
                    ints.insert(k, value);
                }
                other => {
                    return Err(ExecError::InvalidArgument(format!(
                        "invalid dict key: {other:?}"
                    )));
                }
            }
        }

        match (strings.is_empty(), ints.is_empty()) {
            (_, true) => Ok(Value::Map(strings)),
            (true, false) => Ok(Value::IntMap(ints)),
            (false, false) => Err(ExecError::InvalidArgument(
                "invalid dict call: mixed string and integer keys".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
