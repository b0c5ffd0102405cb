//! Derive macro for graph-injector
//!
//! `#[derive(Autowire)]` builds the field table that the container's fill
//! routine walks. Mark each injectable field with an injection tag:
//!
//! - `#[di = "type"]` - resolve by the field's declared type
//! - `#[di = "name"]` - resolve by the field's declared type, under the
//!   field's own identifier as the binding name
//!
//! Tagged fields must be `Inject<T>` slots. Untagged fields are left alone.
//! The tag string is checked when the struct is filled, so an unknown or
//! empty tag surfaces as `DiError::InvalidTag` at that point.
//!
//! The derive also declares the struct as a by-value type, which lets
//! `Container::resolve` tell a caller who passed the struct itself that
//! `Arc` of it is what is bound.
//!
//! # Example
//!
//! ```rust,ignore
//! use graph_injector::{Autowire, Container, Inject};
//! use std::sync::Arc;
//!
//! #[derive(Autowire)]
//! struct Database;
//!
//! #[derive(Autowire, Default)]
//! struct UserService {
//!     #[di = "type"]
//!     db: Inject<Database>,
//!     #[di = "name"]
//!     replica: Inject<Database>,
//!     // Not injected
//!     request_count: u64,
//! }
//!
//! let container = Container::new();
//! container.singleton(|| Arc::new(Database));
//! container.named_singleton("replica", || Arc::new(Database));
//!
//! let service = UserService::default();
//! container.fill(&service);
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Lit, Meta, parse_macro_input, parse_quote};

/// Derive `Autowire` (and `Declared`) for a struct with named fields.
///
/// # Attributes
///
/// - `#[di = "type"]` - inject by declared type under the default name
/// - `#[di = "name"]` - inject by declared type under the field's name
///
/// # Generated Code
///
/// ```rust,ignore
/// impl Autowire for UserService {
///     fn target(&self) -> Target<'_> {
///         Target::structure(
///             type_name::<Self>(),
///             vec![Field::new("db", "type", &self.db), /* ... */],
///         )
///     }
/// }
///
/// impl Declared for UserService {
///     fn declared() -> TypeInfo {
///         TypeInfo::structure::<Self>()
///     }
/// }
/// ```
#[proc_macro_derive(Autowire, attributes(di))]
pub fn derive_autowire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    // Only support structs with named fields (unit structs have no fields to wire)
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return syn::Error::new_spanned(
                    &input,
                    "Autowire can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(&input, "Autowire can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut entries: Vec<proc_macro2::TokenStream> = Vec::new();
    for field in fields {
        let tag = match find_di_attr(&field.attrs) {
            Ok(Some(tag)) => tag,
            Ok(None) => continue,
            Err(err) => return err.to_compile_error().into(),
        };

        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();

        entries.push(quote! {
            ::graph_injector::Field::new(#field_name, #tag, &self.#ident)
        });
    }

    // Declared requires 'static, so every type parameter must be 'static too
    let mut declared_generics = input.generics.clone();
    let type_params: Vec<_> = declared_generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    let where_clause = declared_generics.make_where_clause();
    for param in type_params {
        where_clause.predicates.push(parse_quote!(#param: 'static));
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let (declared_impl_generics, _, declared_where_clause) = declared_generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::graph_injector::Autowire for #name #ty_generics #where_clause {
            fn target(&self) -> ::graph_injector::Target<'_> {
                ::graph_injector::Target::structure(
                    ::std::any::type_name::<Self>(),
                    ::std::vec![#(#entries),*],
                )
            }
        }

        impl #declared_impl_generics ::graph_injector::Declared for #name #ty_generics #declared_where_clause {
            fn declared() -> ::graph_injector::TypeInfo {
                ::graph_injector::TypeInfo::structure::<Self>()
            }
        }
    };

    TokenStream::from(expanded)
}

/// Find and parse the `#[di = "..."]` attribute
fn find_di_attr(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut found: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("di") {
            continue;
        }

        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a field can carry only one #[di] attribute",
            ));
        }

        let Meta::NameValue(meta) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                attr,
                "expected #[di = \"type\"] or #[di = \"name\"]",
            ));
        };

        match &meta.value {
            Expr::Lit(expr) => match &expr.lit {
                Lit::Str(tag) => found = Some(tag.value()),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "the injection tag must be a string literal",
                    ));
                }
            },
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "the injection tag must be a string literal",
                ));
            }
        }
    }

    Ok(found)
}
