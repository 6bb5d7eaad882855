//! Implementation of the `#[derive(Properties)]` macro.
//!
//! This macro generates an implementation of the `Properties` trait, which
//! registers one accessor per field, and property name constants.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Result,
    Type,
};

use super::attrs::parse_prop_attrs;

/// Main implementation of the Properties derive macro.
pub fn properties_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Properties can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Properties can only be derived for structs",
            ))
        }
    };

    let mut registrations: Vec<TokenStream> = Vec::new();
    let mut nested_types: Vec<TokenStream> = Vec::new();
    let mut name_constants: Vec<TokenStream> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_prop_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let property = attrs.rename.unwrap_or_else(|| field_name.to_string());
        let const_name = format_ident!("{}", to_screaming_snake_case(&property));
        name_constants.push(quote! {
            /// Property name constant.
            pub const #const_name: &'static str = #property;
        });

        let ty = &field.ty;

        if attrs.nested {
            let (inner, read, get_mut) = match option_inner(ty) {
                Some(inner) => (
                    inner,
                    quote! { |row| ::rowsieve::Value::object(row.#field_name.as_ref()) },
                    quote! {
                        |row| row.#field_name
                            .as_mut()
                            .map(|inner| inner as &mut dyn ::core::any::Any)
                    },
                ),
                None => (
                    ty,
                    quote! { |row| ::rowsieve::Value::Object(&row.#field_name) },
                    quote! {
                        |row| ::core::option::Option::Some(
                            &mut row.#field_name as &mut dyn ::core::any::Any
                        )
                    },
                ),
            };
            registrations.push(quote! { .nested(#property, #read, #get_mut) });
            nested_types.push(quote! { resolver.register_type::<#inner>(); });
            continue;
        }

        let declared = quote! { <#ty as ::rowsieve::ToValue>::TYPE };
        let writer = quote! {
            |row, value| {
                row.#field_name = ::rowsieve::FromDatum::from_datum(value)?;
                ::core::result::Result::Ok(())
            }
        };

        if attrs.flag {
            let flag_name = format!("is_{}", property);
            registrations.push(quote! { .flag(#flag_name, |row| row.#field_name) });
        } else {
            registrations.push(quote! {
                .reader(#property, #declared, |row| ::rowsieve::ToValue::to_value(&row.#field_name))
            });
        }

        if !attrs.readonly {
            registrations.push(quote! { .writer(#property, #declared, #writer) });
        }

        if attrs.version {
            registrations.push(quote! { .version(#property) });
        }
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#name_constants)*
        }

        impl #impl_generics ::rowsieve::Properties for #struct_name #ty_generics #where_clause {
            fn register_properties(resolver: &mut ::rowsieve::PropertyResolver) {
                resolver
                    .register::<Self>()
                    #(#registrations)*;
                #(#nested_types)*
            }
        }
    };

    Ok(expanded)
}

/// Returns `T` when `ty` is written as `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("name"), "NAME");
        assert_eq!(to_screaming_snake_case("created_at"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("createdAt"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("my-field"), "MY_FIELD");
    }

    #[test]
    fn test_option_inner() {
        let ty: Type = syn::parse_str("Option<Office>").unwrap();
        let inner = option_inner(&ty).unwrap();
        assert_eq!(quote!(#inner).to_string(), "Office");

        let ty: Type = syn::parse_str("std::option::Option<u8>").unwrap();
        assert!(option_inner(&ty).is_some());

        let ty: Type = syn::parse_str("Vec<Office>").unwrap();
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_rejects_tuple_structs() {
        let input: DeriveInput = syn::parse_str("struct Pair(u8, u8);").unwrap();
        let err = properties_derive_impl(input).unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }

    #[test]
    fn test_generated_registration() {
        let input: DeriveInput = syn::parse_str(
            r#"
            struct Wizard {
                name: String,
                #[prop(flag)]
                active: bool,
                #[prop(version)]
                revision: u64,
                #[prop(nested)]
                office: Option<Office>,
                #[prop(skip)]
                scratch: Vec<u8>,
            }
            "#,
        )
        .unwrap();
        let out = properties_derive_impl(input).unwrap().to_string();
        assert!(out.contains("\"is_active\""));
        assert!(out.contains("version"));
        assert!(out.contains("register_type"));
        assert!(out.contains("pub const OFFICE"));
        assert!(!out.contains("scratch"));
    }
}
