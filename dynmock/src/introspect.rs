// vim: tw=80
//! Discovering, describing and invoking methods by name.

use std::fmt;

use crate::{
    error::MockError,
    value::{type_list, TypeInfo, Value},
};

/// How a method borrows its receiver
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Receiver {
    /// `&self`
    Ref,
    /// `&mut self`
    RefMut,
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Ref => f.write_str("&self"),
            Receiver::RefMut => f.write_str("&mut self"),
        }
    }
}

/// The declared shape of one method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodSignature {
    name: &'static str,
    receiver: Receiver,
    params: Vec<TypeInfo>,
    /// `None` for methods returning `()`
    output: Option<TypeInfo>,
}

impl MethodSignature {
    pub fn new(name: &'static str, receiver: Receiver, params: Vec<TypeInfo>,
               output: Option<TypeInfo>) -> Self
    {
        MethodSignature { name, receiver, params, output }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn params(&self) -> &[TypeInfo] {
        &self.params
    }

    pub fn output(&self) -> Option<TypeInfo> {
        self.output
    }

    /// Do `args` have exactly the parameter types of this method?
    pub fn accepts_args(&self, args: &[Value]) -> bool {
        args.len() == self.params.len() &&
            self.params.iter()
                .zip(args.iter())
                .all(|(p, a)| p.id() == a.type_info().id())
    }

    /// Are `returns` what this method would produce?  Methods returning `()`
    /// produce nothing; all others produce exactly one value.
    pub fn accepts_returns(&self, returns: &[Value]) -> bool {
        match self.output {
            None => returns.is_empty(),
            Some(o) => returns.len() == 1 &&
                returns[0].type_info().id() == o.id()
        }
    }

    /// Parameter types, rendered like `<String>, <i32>`
    pub fn params_string(&self) -> String {
        type_list(self.params.iter().copied())
    }

    /// Return type, rendered like `<i32>` or `()`
    pub fn output_string(&self) -> String {
        type_list(self.output)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}({}", self.name, self.receiver)?;
        for p in self.params.iter() {
            write!(f, ", {}", p.short_name())?;
        }
        f.write_str(")")?;
        if let Some(o) = &self.output {
            write!(f, " -> {}", o.short_name())?;
        }
        Ok(())
    }
}

/// Runtime introspection of a mockable type.
///
/// This is the table that lets a mock check method names and argument types
/// during setup, and call the real implementation by name when an
/// expectation delegates to it.  It is normally generated by
/// [`#[mockable]`](crate::mockable), but it can be written by hand for types
/// that can't use the attribute.
///
/// # Examples
/// ```
/// # use dynmock::*;
/// #[derive(Default)]
/// struct Counter { n: u32 }
///
/// impl Introspectable for Counter {
///     fn type_name(&self) -> &'static str {
///         "Counter"
///     }
///
///     fn method_signature(&self, method: &str) -> Option<MethodSignature> {
///         match method {
///             "bump" => Some(MethodSignature::new("bump", Receiver::RefMut,
///                 vec![TypeInfo::of::<u32>()], Some(TypeInfo::of::<u32>()))),
///             _ => None
///         }
///     }
///
///     fn invoke(&mut self, method: &str, args: Vec<Value>)
///         -> Result<Vec<Value>, MockError>
///     {
///         match method {
///             "bump" => {
///                 let mut reader = ArgReader::new("Counter", method, args);
///                 let by = reader.next::<u32>()?;
///                 reader.finish()?;
///                 self.n += by;
///                 Ok(values![self.n])
///             },
///             _ => Err(MockError::UnknownMethod {
///                 type_name: "Counter".to_string(),
///                 method: method.to_string()
///             })
///         }
///     }
/// }
///
/// let mut c = Counter::default();
/// assert!(c.has_method("bump"));
/// assert_eq!(values![3u32], c.invoke("bump", values![3u32]).unwrap());
/// ```
pub trait Introspectable: 'static {
    /// Human-readable name of the implementing type
    fn type_name(&self) -> &'static str;

    /// Describe the named method, if this type exposes it.
    fn method_signature(&self, method: &str) -> Option<MethodSignature>;

    fn has_method(&self, method: &str) -> bool {
        self.method_signature(method).is_some()
    }

    /// Call the real implementation of `method`.
    fn invoke(&mut self, method: &str, args: Vec<Value>)
        -> Result<Vec<Value>, MockError>;
}
