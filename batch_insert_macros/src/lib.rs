//! Procedural macros for batch_insert
//!
//! This crate provides the `Entity` derive macro, which lets a struct be
//! inserted as a schema-bound row.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr};

/// Derive `batch_insert::models::Entity` for a struct with named fields
///
/// Every field becomes an attribute whose value is `Value::from(field.clone())`.
///
/// - `#[entity(name = "...")]` on the struct sets the registry key
///   (defaults to the struct name).
/// - `#[entity(rename = "...")]` on a field sets the attribute name.
/// - `#[entity(skip)]` on a field leaves it out entirely.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_entity(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Options parsed from one `#[entity(...)]` attribute list
#[derive(Default)]
struct EntityArgs {
    name: Option<String>,
    rename: Option<String>,
    skip: bool,
}

fn parse_entity_args(attrs: &[Attribute]) -> syn::Result<EntityArgs> {
    let mut args = EntityArgs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                args.name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                args.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                args.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported entity attribute"))
            }
        })?;
    }

    Ok(args)
}

fn expand_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Entity can only be derived for structs",
            ))
        }
    };

    let struct_args = parse_entity_args(&input.attrs)?;
    if struct_args.rename.is_some() || struct_args.skip {
        return Err(syn::Error::new_spanned(
            name,
            "`rename` and `skip` apply to fields, use `name` on the struct",
        ));
    }
    let entity_name = struct_args.name.unwrap_or_else(|| name.to_string());

    let mut attributes = Vec::new();
    for field in fields {
        let args = parse_entity_args(&field.attrs)?;
        if args.skip {
            continue;
        }

        // Named fields always carry an ident
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attribute_name = args.rename.unwrap_or_else(|| ident.to_string());
        attributes.push(quote! {
            (
                ::std::string::String::from(#attribute_name),
                ::batch_insert::value::Value::from(::std::clone::Clone::clone(&self.#ident)),
            )
        });
    }

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::batch_insert::models::Entity for #name #ty_generics #where_clause {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn attributes(&self) -> ::std::vec::Vec<(::std::string::String, ::batch_insert::value::Value)> {
                ::std::vec![#(#attributes),*]
            }
        }
    })
}
