//! Procedural macros for auto-relay
//!
//! This crate provides the `#[derive(RelayEntity)]` macro, which implements
//! `auto_relay::RelayEntity` from a struct definition so entity metadata has
//! a single source of truth.
//!
//! # Usage
//!
//! ```ignore
//! #[derive(RelayEntity)]
//! struct Film {
//!     id: String,          // primary key by name, exposed as ID
//!     title: String,
//!     year: Option<i32>,   // Option<T> becomes a nullable field
//!     #[relay(skip)]
//!     internal: Vec<u8>,   // not exposed
//! }
//! ```
//!
//! Recognized attributes:
//!
//! - `#[relay(name = "...")]` on the struct or a field overrides the exposed
//!   name (the struct name is converted to PascalCase by default).
//! - `#[relay(primary_key)]` marks the tie-break key when it is not `id`.
//! - `#[relay(skip)]` leaves a field out of the metadata.

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(RelayEntity, attributes(relay))]
pub fn derive_relay_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldMeta {
    name: String,
    kind: proc_macro2::TokenStream,
    nullable: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "RelayEntity can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ident,
            "RelayEntity requires named fields",
        ));
    };

    let mut type_name = ident.to_string().to_case(Case::Pascal);
    for attr in &input.attrs {
        if attr.path().is_ident("relay") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    type_name = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else {
                    Err(meta.error("unsupported relay attribute on struct"))
                }
            })?;
        }
    }

    let mut primary_key: Option<String> = None;
    let mut metas: Vec<FieldMeta> = Vec::new();

    for field in &fields.named {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let mut name = field_ident.to_string();
        let mut skip = false;
        let mut is_primary_key = false;

        for attr in &field.attrs {
            if attr.path().is_ident("relay") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("skip") {
                        skip = true;
                        Ok(())
                    } else if meta.path.is_ident("primary_key") {
                        is_primary_key = true;
                        Ok(())
                    } else if meta.path.is_ident("name") {
                        name = meta.value()?.parse::<LitStr>()?.value();
                        Ok(())
                    } else {
                        Err(meta.error("unsupported relay attribute on field"))
                    }
                })?;
            }
        }

        if skip {
            if is_primary_key {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "the primary key cannot be skipped",
                ));
            }
            continue;
        }

        let (kind, nullable) = infer_kind(&field.ty)?;
        if is_primary_key {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "only one field can be the primary key",
                ));
            }
            primary_key = Some(name.clone());
        }
        metas.push(FieldMeta {
            name,
            kind,
            nullable,
        });
    }

    let primary_key = primary_key
        .or_else(|| {
            metas
                .iter()
                .find(|meta| meta.name == "id")
                .map(|meta| meta.name.clone())
        })
        .ok_or_else(|| {
            syn::Error::new_spanned(
                ident,
                "RelayEntity requires an `id` field or #[relay(primary_key)]",
            )
        })?;

    let field_defs = metas.iter().map(|meta| {
        let name = &meta.name;
        let nullable = meta.nullable;
        // The primary key is exposed as ID regardless of its Rust type.
        let kind = if *name == primary_key {
            quote!(Id)
        } else {
            meta.kind.clone()
        };
        quote! {
            ::auto_relay::FieldDef {
                name: #name,
                kind: ::auto_relay::FieldKind::#kind,
                nullable: #nullable,
            }
        }
    });

    Ok(quote! {
        impl ::auto_relay::RelayEntity for #ident {
            const TYPE_NAME: &'static str = #type_name;
            const PRIMARY_KEY: &'static str = #primary_key;

            fn fields() -> &'static [::auto_relay::FieldDef] {
                const FIELDS: &[::auto_relay::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }
        }
    })
}

/// Map a Rust field type to its schema kind; `Option<T>` marks nullability.
fn infer_kind(ty: &syn::Type) -> syn::Result<(proc_macro2::TokenStream, bool)> {
    let syn::Type::Path(path) = ty else {
        return Err(syn::Error::new_spanned(ty, "unsupported field type"));
    };
    let Some(segment) = path.path.segments.last() else {
        return Err(syn::Error::new_spanned(ty, "unsupported field type"));
    };

    if segment.ident == "Option" {
        let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
            return Err(syn::Error::new_spanned(ty, "unsupported Option form"));
        };
        let Some(syn::GenericArgument::Type(inner)) = args.args.first() else {
            return Err(syn::Error::new_spanned(ty, "unsupported Option form"));
        };
        let (kind, _) = infer_kind(inner)?;
        return Ok((kind, true));
    }

    let kind = match segment.ident.to_string().as_str() {
        "String" => quote!(String),
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "isize" | "usize" => {
            quote!(Int)
        }
        "f32" | "f64" => quote!(Float),
        "bool" => quote!(Boolean),
        other => {
            return Err(syn::Error::new_spanned(
                ty,
                format!("unsupported field type `{other}` (use #[relay(skip)] to hide it)"),
            ));
        }
    };
    Ok((kind, false))
}
