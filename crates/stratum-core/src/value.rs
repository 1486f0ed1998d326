//! Dynamic values flowing from application state into templates.
//!
//! [`Value`] is what a render pass reads: the state handed to
//! [`Renderer::render`](crate::Renderer::render), the props of a component and
//! the items of a `for-each` loop. Arrays and objects are shared handles:
//! cloning a container clones the handle, and [`Value::set_field`] or
//! [`Value::push`] mutate it in place for every holder.
//!
//! `==` compares structurally. Loop identity uses [`Value::same`] instead:
//! containers are the same item only if they are the same handle, scalars
//! compare by value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

pub type Fields = IndexMap<String, Value>;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Fields>>),
}

impl Value {
    /// Builds an object from `(field, value)` pairs, keeping their order.
    pub fn object<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::from(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect::<Fields>(),
        )
    }

    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::Array(Rc::new(RefCell::new(
            items.into_iter().map(Into::into).collect(),
        )))
    }

    /// Identity as loop items see it: the same container handle, or equal
    /// scalars. `NaN` is never the same as itself.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            _ => self == other,
        }
    }

    /// Field lookup on objects; `None` for anything else or a missing field.
    pub fn get(&self, field: &str) -> Option<Value> {
        match self {
            Value::Object(fields) => fields.borrow().get(field).cloned(),
            _ => None,
        }
    }

    /// Like [`Value::get`] but never fails, so paths like
    /// `item.author.name` can be chained.
    pub fn field(&self, field: &str) -> Value {
        self.get(field).unwrap_or_default()
    }

    pub fn index(&self, index: usize) -> Value {
        match self {
            Value::Array(items) => items.borrow().get(index).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    /// Writes a field of an object in place. Returns `false` (and does
    /// nothing) for non-objects.
    pub fn set_field(&self, field: impl Into<String>, value: impl Into<Value>) -> bool {
        match self {
            Value::Object(fields) => {
                fields.borrow_mut().insert(field.into(), value.into());
                true
            }
            _ => false,
        }
    }

    /// Appends to an array in place. Returns `false` for non-arrays.
    pub fn push(&self, item: impl Into<Value>) -> bool {
        match self {
            Value::Array(items) => {
                items.borrow_mut().push(item.into());
                true
            }
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => *number != 0.0 && !number.is_nan(),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// `(key, item)` pairs a loop iterates over: indices for arrays, field
    /// names for objects, nothing for scalars.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match self {
            Value::Array(items) => items
                .borrow()
                .iter()
                .enumerate()
                .map(|(index, item)| (Value::from(index), item.clone()))
                .collect(),
            Value::Object(fields) => fields
                .borrow()
                .iter()
                .map(|(key, item)| (Value::from(key.as_str()), item.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.borrow().len(),
            Value::Object(fields) => fields.borrow().len(),
            Value::String(text) => text.chars().count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Number(number) => write_number(f, *number),
            Value::String(text) => f.write_str(text),
            Value::Array(items) => {
                for (index, item) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, number: f64) -> fmt::Result {
    if number.is_nan() {
        f.write_str("NaN")
    } else if number.is_infinite() {
        f.write_str(if number > 0.0 { "Infinity" } else { "-Infinity" })
    } else if number == 0.0 {
        // covers -0
        f.write_str("0")
    } else {
        write!(f, "{number}")
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::array(items)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Value::Object(Rc::new(RefCell::new(fields)))
    }
}
