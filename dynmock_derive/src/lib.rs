// vim: tw=80
//! Proc macros for use with dynmock
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the [`dynmock`](../dynmock/index.html) crate.

extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt,
    parse_quote,
    spanned::Spanned,
    Attribute,
    FnArg,
    GenericArgument,
    Ident,
    ImplItem,
    ImplItemFn,
    Item,
    ItemImpl,
    PathArguments,
    ReturnType,
    Type,
    Visibility,
};
#[cfg(test)]
use quote::ToTokens;
#[cfg(test)]
use syn::parse2;

mod mockable;
use crate::mockable::do_mockable;

/// Make the methods of an inherent impl block available to dynmock.
///
/// The attribute implements `dynmock::Introspectable` for the type, so that
/// mocks can check method names and argument types when expectations are
/// declared, and call the real implementation by name.  With the `partial`
/// feature, it also rewrites each method so that, while a mock scope has
/// intercepted it, calls are routed through the mock registered for the
/// receiver.
///
/// Only methods taking `&self` or `&mut self`, without generics, and whose
/// argument and return types own their data, are made mockable.  Those types
/// must be `Clone + PartialEq + Debug + 'static`.  Other methods are left as
/// they are.  A method can be excluded explicitly with `#[mockable(skip)]`.
///
/// A type may have at most one `#[mockable]` impl block.
///
/// # Examples
/// ```ignore
/// # use dynmock::*;
/// #[derive(Default)]
/// struct Calculator {
///     total: i64,
/// }
///
/// #[mockable]
/// impl Calculator {
///     pub fn add(&mut self, n: i64) -> i64 {
///         self.total += n;
///         self.total
///     }
///
///     #[mockable(skip)]
///     pub fn name(&self) -> &str {
///         "calculator"
///     }
/// }
///
/// let calc = Calculator::default();
/// assert!(calc.has_method("add"));
/// assert!(!calc.has_method("name"));
/// ```
#[proc_macro_attribute]
pub fn mockable(attrs: proc_macro::TokenStream,
                input: proc_macro::TokenStream) -> proc_macro::TokenStream
{
    do_mockable(attrs.into(), input.into()).into()
}
