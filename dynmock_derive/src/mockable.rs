// vim: tw=80
use super::*;

cfg_if! {
    if #[cfg(feature = "partial")] {
        /// Generate interception hooks
        const PARTIAL: bool = true;
    } else {
        const PARTIAL: bool = false;
    }
}

/// Does `attr` say `#[mockable(skip)]`?
fn is_skip(attr: &Attribute) -> syn::Result<bool> {
    if !attr.path().is_ident("mockable") {
        return Ok(false);
    }
    let arg: Ident = attr.parse_args()?;
    if arg == "skip" {
        Ok(true)
    } else {
        Err(syn::Error::new(arg.span(),
            "unknown #[mockable] option; expected `skip`"))
    }
}

/// Can a value of this type be captured into a `dynmock::Value`?  That rules
/// out borrowed data, opaque types and trait objects.
fn is_plain(ty: &Type) -> bool {
    match ty {
        Type::Array(a) => is_plain(&a.elem),
        Type::Group(g) => is_plain(&g.elem),
        Type::Paren(p) => is_plain(&p.elem),
        Type::Path(p) => {
            p.qself.as_ref().map_or(true, |q| is_plain(&q.ty)) &&
            p.path.segments.iter().all(|seg| match &seg.arguments {
                PathArguments::None => true,
                PathArguments::AngleBracketed(abga) => {
                    abga.args.iter().all(|arg| match arg {
                        GenericArgument::Type(t) => is_plain(t),
                        GenericArgument::Lifetime(lt) => lt.ident == "static",
                        GenericArgument::AssocType(at) => is_plain(&at.ty),
                        GenericArgument::Const(_) => true,
                        _ => false
                    })
                },
                PathArguments::Parenthesized(_) => false
            })
        },
        Type::Ptr(p) => is_plain(&p.elem),
        Type::Reference(r) => {
            r.lifetime.as_ref().is_some_and(|lt| lt.ident == "static") &&
                is_plain(&r.elem)
        },
        Type::Slice(s) => is_plain(&s.elem),
        Type::Tuple(t) => t.elems.iter().all(is_plain),
        _ => false
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(t) if t.elems.is_empty())
}

/// A method that `#[mockable]` can introspect
struct MockableMethod {
    ident: Ident,
    /// Name as seen by `to_receive`, without any `r#`
    name: String,
    mutable: bool,
    params: Vec<Type>,
    /// `None` for methods returning `()`
    output: Option<Type>,
    /// `#[cfg]` attributes, which must also guard the generated match arms
    cfgs: Vec<Attribute>,
}

impl MockableMethod {
    /// Returns `None` for methods that must be left alone.
    fn new(f: &ImplItemFn) -> Option<Self> {
        let sig = &f.sig;
        let receiver = sig.receiver()?;
        let (_, lifetime) = receiver.reference.as_ref()?;
        if lifetime.is_some() || receiver.colon_token.is_some() ||
            !sig.generics.params.is_empty() ||
            sig.generics.where_clause.is_some() ||
            sig.asyncness.is_some() ||
            sig.constness.is_some() ||
            sig.unsafety.is_some() ||
            sig.abi.is_some() ||
            sig.variadic.is_some()
        {
            return None;
        }
        let mut params = Vec::new();
        for input in sig.inputs.iter() {
            if let FnArg::Typed(pt) = input {
                if !is_plain(&pt.ty) {
                    return None;
                }
                params.push((*pt.ty).clone());
            }
        }
        let output = match &sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) if is_unit(ty) => None,
            ReturnType::Type(_, ty) if is_plain(ty) => Some((**ty).clone()),
            ReturnType::Type(..) => return None
        };
        let cfgs = f.attrs.iter()
            .filter(|a| a.path().is_ident("cfg"))
            .cloned()
            .collect();
        Some(MockableMethod {
            ident: sig.ident.clone(),
            name: sig.ident.unraw().to_string(),
            mutable: receiver.mutability.is_some(),
            params,
            output,
            cfgs,
        })
    }

    /// Name of the function holding the original body
    fn inner_ident(&self) -> Ident {
        format_ident!("__dynmock_{}", self.ident)
    }

    fn arg_idents(&self) -> Vec<Ident> {
        (0..self.params.len())
            .map(|i| format_ident!("__dynmock_arg{}", i))
            .collect()
    }

    /// An expression building this method's `MethodSignature`
    fn signature(&self) -> TokenStream {
        let name = &self.name;
        let receiver = if self.mutable {
            quote!(::dynmock::Receiver::RefMut)
        } else {
            quote!(::dynmock::Receiver::Ref)
        };
        let params = &self.params;
        let output = match &self.output {
            Some(ty) => quote!(::std::option::Option::Some(
                ::dynmock::TypeInfo::of::<#ty>())),
            None => quote!(::std::option::Option::None)
        };
        quote!(::dynmock::MethodSignature::new(#name, #receiver,
            ::std::vec![#(::dynmock::TypeInfo::of::<#params>()),*],
            #output))
    }

    /// Statements that unpack `__dynmock_args` into `__dynmock_arg*`, call
    /// `callee` and pack up its result.
    fn unpack_and_call(&self, type_name: &str, callee: &Ident) -> TokenStream {
        let name = &self.name;
        let args = self.arg_idents();
        let params = &self.params;
        let call = quote!(Self::#callee(self, #(#args),*));
        let packed = if self.output.is_some() {
            quote!(::dynmock::returns::pack(#call))
        } else {
            quote!({ #call; ::std::vec::Vec::new() })
        };
        quote!(
            #[allow(unused_mut)]
            let mut __dynmock_reader = ::dynmock::ArgReader::new(#type_name,
                #name, __dynmock_args);
            #(let #args = __dynmock_reader.next::<#params>()?;)*
            __dynmock_reader.finish()?;
            ::std::result::Result::Ok(#packed)
        )
    }

    /// The arm of `Introspectable::invoke` for this method
    fn invoke_arm(&self, type_name: &str, callee: &Ident) -> TokenStream {
        let cfgs = &self.cfgs;
        let name = &self.name;
        let body = self.unpack_and_call(type_name, callee);
        quote!(#(#cfgs)* #name => { #body })
    }

    /// Split `f` into a hidden function with the original body, and a
    /// wrapper that offers each call to the active mock scope first.
    fn hook(&self, type_name: &str, f: ImplItemFn) -> [ImplItemFn; 2] {
        let name = &self.name;
        let inner_ident = self.inner_ident();
        let args = self.arg_idents();

        let mut inner = f.clone();
        inner.sig.ident = inner_ident.clone();
        inner.vis = Visibility::Inherited;
        inner.attrs.retain(|a| !a.path().is_ident("doc"));
        inner.attrs.push(parse_quote!(#[doc(hidden)]));

        let mut outer = f;
        let mut typed = 0;
        for input in outer.sig.inputs.iter_mut() {
            if let FnArg::Typed(pt) = input {
                let ident = &args[typed];
                *pt.pat = parse_quote!(#ident);
                typed += 1;
            }
        }
        let unpack = if let Some(ty) = &self.output {
            quote!(::dynmock::returns::single::<#ty>(#type_name, #name,
                __dynmock_ret))
        } else {
            quote!(::dynmock::returns::unit(#type_name, #name, __dynmock_ret))
        };
        let original = self.unpack_and_call(type_name, &inner_ident);
        outer.block = parse_quote!({
            if ::dynmock::interception::is_intercepted::<Self>(#name) {
                let __dynmock_receiver = &*self as *const Self as *const ();
                let __dynmock_args = ::std::vec![
                    #(::dynmock::Value::new(#args)),*
                ];
                return ::dynmock::interception::dispatch::<Self, _>(
                    __dynmock_receiver, #name, __dynmock_args,
                    move |__dynmock_args| { #original }
                ).and_then(|__dynmock_ret| #unpack)
                .unwrap_or_else(|e| ::dynmock::fatal(e));
            }
            Self::#inner_ident(self, #(#args),*)
        });
        [inner, outer]
    }
}

/// A human-readable name for the impl's self type
fn type_name(self_ty: &Type) -> syn::Result<String> {
    match self_ty {
        Type::Path(tp) if tp.qself.is_none() => {
            let last = tp.path.segments.last()
                .ok_or_else(|| syn::Error::new(tp.span(), "empty type path"))?;
            Ok(last.ident.unraw().to_string())
        },
        _ => Err(syn::Error::new(self_ty.span(),
            "#[mockable] can only be used on impl blocks of named types"))
    }
}

fn gen_mockable(attrs: TokenStream, input: TokenStream, partial: bool)
    -> syn::Result<TokenStream>
{
    if !attrs.is_empty() {
        return Err(syn::Error::new(attrs.span(),
            "#[mockable] takes no arguments on an impl block"));
    }
    let mut item: ItemImpl = match syn::parse2::<Item>(input)? {
        Item::Impl(item) => item,
        other => return Err(syn::Error::new(other.span(),
            "#[mockable] can only be used on inherent impl blocks"))
    };
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new(path.span(),
            "#[mockable] can't be used on trait impls; use it on an inherent \
             impl block of the type instead"));
    }
    if !item.generics.params.is_empty() || item.generics.where_clause.is_some()
    {
        return Err(syn::Error::new(item.generics.span(),
            "#[mockable] does not support generic impl blocks"));
    }
    let type_name = type_name(&item.self_ty)?;

    let mut items = Vec::with_capacity(item.items.len());
    let mut arms = Vec::new();
    let mut signatures = Vec::new();
    for impl_item in std::mem::take(&mut item.items) {
        let ImplItem::Fn(mut f) = impl_item else {
            items.push(impl_item);
            continue;
        };
        let mut skip = false;
        let mut kept = Vec::with_capacity(f.attrs.len());
        for attr in f.attrs.drain(..) {
            if is_skip(&attr)? {
                skip = true;
            } else {
                kept.push(attr);
            }
        }
        f.attrs = kept;
        let method = match MockableMethod::new(&f) {
            Some(m) if !skip => m,
            _ => {
                items.push(ImplItem::Fn(f));
                continue;
            }
        };
        let cfgs = &method.cfgs;
        let name = &method.name;
        let sig = method.signature();
        signatures.push(quote!(#(#cfgs)* #name => ::std::option::Option::Some(
            #sig)));
        if partial {
            arms.push(method.invoke_arm(&type_name, &method.inner_ident()));
            items.extend(method.hook(&type_name, f).map(ImplItem::Fn));
        } else {
            arms.push(method.invoke_arm(&type_name, &method.ident));
            items.push(ImplItem::Fn(f));
        }
    }
    item.items = items;

    let self_ty = &item.self_ty;
    Ok(quote!(
        #item

        impl ::dynmock::Introspectable for #self_ty {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn method_signature(&self, method: &str)
                -> ::std::option::Option<::dynmock::MethodSignature>
            {
                match method {
                    #(#signatures,)*
                    _ => ::std::option::Option::None
                }
            }

            #[allow(unused_variables)]
            fn invoke(&mut self, method: &str,
                      __dynmock_args: ::std::vec::Vec<::dynmock::Value>)
                -> ::std::result::Result<::std::vec::Vec<::dynmock::Value>,
                                         ::dynmock::MockError>
            {
                match method {
                    #(#arms,)*
                    _ => ::std::result::Result::Err(
                        ::dynmock::MockError::UnknownMethod {
                            type_name: ::std::string::String::from(#type_name),
                            method: ::std::string::ToString::to_string(method)
                        })
                }
            }
        }
    ))
}

pub(crate) fn do_mockable(attrs: TokenStream, input: TokenStream)
    -> TokenStream
{
    gen_mockable(attrs, input, PARTIAL)
        .unwrap_or_else(syn::Error::into_compile_error)
}
