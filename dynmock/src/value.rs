// vim: tw=80
//! Type-erased argument and return values.
//!
//! Mocked calls move their arguments and results around as [`Value`]s, so
//! that one expectation table can serve methods of any signature.  A `Value`
//! remembers the [`TypeInfo`] of what it holds, can be cloned, compared with
//! another `Value`, and printed with the inner value's `Debug` impl.

use downcast::{downcast, Any};
use std::{
    any::{self, TypeId},
    fmt,
};

use crate::error::MockError;

/// Object-safe view of anything that can be stored in a [`Value`].
#[doc(hidden)]
pub trait ArgValue: Any + fmt::Debug {
    fn clone_value(&self) -> Box<dyn ArgValue>;
    fn eq_value(&self, other: &dyn ArgValue) -> bool;
}
downcast!(dyn ArgValue);

impl<T> ArgValue for T
    where T: Clone + PartialEq + fmt::Debug + 'static
{
    fn clone_value(&self) -> Box<dyn ArgValue> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn ArgValue) -> bool {
        match other.downcast_ref::<T>() {
            Ok(o) => self == o,
            Err(_) => false
        }
    }
}

/// Identifies a concrete Rust type, along with a printable name for it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeInfo { id: TypeId::of::<T>(), name: any::type_name::<T>() }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified name, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name with every module path stripped, e.g. `Option<String>`
    /// rather than `core::option::Option<alloc::string::String>`.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.short_name())
    }
}

/// Strip module paths from every path segment in a type name
pub(crate) fn short_type_name(full: &str) -> String {
    fn last_segment(path: &str) -> &str {
        path.rsplit("::").next().unwrap_or(path)
    }

    let mut out = String::with_capacity(full.len());
    let mut path = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
        } else {
            out.push_str(last_segment(&path));
            path.clear();
            out.push(c);
        }
    }
    out.push_str(last_segment(&path));
    out
}

/// Render a list of types like `<String>, <i32>`.  An empty list renders as
/// `()`.
pub(crate) fn type_list<I>(types: I) -> String
    where I: IntoIterator<Item = TypeInfo>
{
    let rendered = types.into_iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>();
    if rendered.is_empty() {
        String::from("()")
    } else {
        rendered.join(", ")
    }
}

/// Render a list of values like `"x" <String>, 5 <i32>`.
pub(crate) fn value_list(values: &[Value]) -> String {
    let rendered = values.iter()
        .map(|v| format!("{v:?} {}", v.type_info()))
        .collect::<Vec<_>>();
    if rendered.is_empty() {
        String::from("()")
    } else {
        rendered.join(", ")
    }
}

/// A single, type-erased argument or return value.
///
/// # Examples
/// ```
/// # use dynmock::Value;
/// let v = Value::new(5i32);
/// assert!(v.is::<i32>());
/// assert_eq!(Some(&5), v.downcast_ref::<i32>());
/// assert_eq!(v, Value::new(5i32));
/// assert_ne!(v, Value::new(5i64));
/// ```
pub struct Value {
    ty: TypeInfo,
    inner: Box<dyn ArgValue>,
}

impl Value {
    pub fn new<T>(value: T) -> Self
        where T: Clone + PartialEq + fmt::Debug + 'static
    {
        Value { ty: TypeInfo::of::<T>(), inner: Box::new(value) }
    }

    pub fn type_info(&self) -> TypeInfo {
        self.ty
    }

    /// Does this value hold a `T`?
    pub fn is<T: 'static>(&self) -> bool {
        self.ty.id() == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>().ok()
    }

    /// Take the inner value out, or get the `Value` back if it holds some
    /// other type.
    pub fn downcast<T: 'static>(self) -> Result<T, Value> {
        let ty = self.ty;
        match self.inner.downcast::<T>() {
            Ok(b) => Ok(*b),
            Err(e) => Err(Value { ty, inner: e.into_object() })
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Value { ty: self.ty, inner: (*self.inner).clone_value() }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.ty == other.ty && (*self.inner).eq_value(&*other.inner)
    }
}

/// Build a `Vec<Value>` from a list of expressions.
///
/// # Examples
/// ```
/// # use dynmock::{values, Value};
/// let args = values!["x".to_string(), 5i32];
/// assert_eq!(2, args.len());
/// assert_eq!(Value::new(5i32), args[1]);
/// ```
#[macro_export]
macro_rules! values {
    () => (::std::vec::Vec::<$crate::Value>::new());
    ($($v:expr),+ $(,)?) => (::std::vec![$($crate::Value::new($v)),+]);
}

/// Reads the positional arguments of a call back into their concrete types.
///
/// Used by the code that `#[mockable]` generates.
#[doc(hidden)]
pub struct ArgReader {
    method: String,
    args: std::vec::IntoIter<Value>,
    position: usize,
}

impl ArgReader {
    pub fn new(type_name: &str, method: &str, args: Vec<Value>) -> Self {
        ArgReader {
            method: format!("<{type_name}>.{method}"),
            args: args.into_iter(),
            position: 0
        }
    }

    pub fn next<T: 'static>(&mut self) -> Result<T, MockError> {
        let position = self.position;
        self.position += 1;
        let expected = TypeInfo::of::<T>().to_string();
        match self.args.next() {
            Some(v) => v.downcast::<T>().map_err(|v| {
                MockError::ArgumentMismatch {
                    method: self.method.clone(),
                    position,
                    expected,
                    received: v.type_info().to_string()
                }
            }),
            None => Err(MockError::ArgumentMismatch {
                method: self.method.clone(),
                position,
                expected,
                received: String::from("nothing")
            })
        }
    }

    /// Check that every argument was consumed
    pub fn finish(mut self) -> Result<(), MockError> {
        match self.args.next() {
            None => Ok(()),
            Some(v) => Err(MockError::ArgumentMismatch {
                method: self.method,
                position: self.position,
                expected: String::from("nothing"),
                received: v.type_info().to_string()
            })
        }
    }
}

/// Conversions between a method's Rust return value and a list of values.
///
/// A method returning `()` produces an empty list; any other method produces
/// exactly one value.
#[doc(hidden)]
pub mod returns {
    use super::*;

    pub fn pack<T>(ret: T) -> Vec<Value>
        where T: Clone + PartialEq + fmt::Debug + 'static
    {
        vec![Value::new(ret)]
    }

    pub fn unit(type_name: &str, method: &str, returns: Vec<Value>)
        -> Result<(), MockError>
    {
        if returns.is_empty() {
            Ok(())
        } else {
            Err(MockError::ReturnMismatch {
                method: format!("<{type_name}>.{method}"),
                expected: String::from("()"),
                received: type_list(returns.iter().map(Value::type_info))
            })
        }
    }

    pub fn single<T: 'static>(type_name: &str, method: &str,
                              returns: Vec<Value>) -> Result<T, MockError>
    {
        let received = type_list(returns.iter().map(Value::type_info));
        let mismatch = || MockError::ReturnMismatch {
            method: format!("<{type_name}>.{method}"),
            expected: TypeInfo::of::<T>().to_string(),
            received: received.clone()
        };
        let mut it = returns.into_iter();
        match (it.next(), it.next()) {
            (Some(v), None) => v.downcast::<T>().map_err(|_| mismatch()),
            _ => Err(mismatch())
        }
    }
}
