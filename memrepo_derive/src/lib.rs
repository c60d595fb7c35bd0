use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Entity, attributes(entity, id, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeRole {
    Id,
    Column,
}

struct StoredField {
    ident: Ident,
    name: String,
    role: AttributeRole,
}

fn expand_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Entity does not support generic structs",
        ));
    }

    let entity_name = parse_entity_options(&input.attrs)?.unwrap_or_else(|| struct_name.to_string());

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity requires named fields",
            ));
        }
    };

    let mut stored = Vec::<StoredField>::new();
    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Entity requires named fields"))?;
        if let Some((role, rename)) = parse_field_role(&field.attrs)? {
            let name = rename.unwrap_or_else(|| ident.to_string());
            stored.push(StoredField { ident, name, role });
        }
    }

    let ids = stored
        .iter()
        .filter(|field| field.role == AttributeRole::Id)
        .collect::<Vec<_>>();
    if ids.len() > 1 {
        return Err(syn::Error::new(
            ids[1].ident.span(),
            "Entity allows a single #[id] field",
        ));
    }

    let attributes = stored.iter().map(|field| {
        let ident = &field.ident;
        let name = &field.name;
        let constructor = match field.role {
            AttributeRole::Id => quote!(id),
            AttributeRole::Column => quote!(column),
        };
        quote! {
            ::memrepo::Attribute::#constructor(#name, |entity: &Self| {
                ::memrepo::Value::from(::std::clone::Clone::clone(&entity.#ident))
            })
        }
    });

    Ok(quote! {
        impl ::memrepo::Entity for #struct_name {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn attributes() -> ::std::vec::Vec<::memrepo::Attribute<Self>> {
                ::std::vec![#(#attributes),*]
            }
        }
    })
}

fn parse_entity_options(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                name = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("Unsupported entity attribute. Supported: name = \"...\""))
        })?;
    }

    Ok(name)
}

/// `#[id]`, `#[column]`, optionally with `(name = "...")`.
fn parse_field_role(attrs: &[syn::Attribute]) -> syn::Result<Option<(AttributeRole, Option<String>)>> {
    let mut found: Option<(AttributeRole, Option<String>)> = None;

    for attr in attrs {
        let role = if attr.path().is_ident("id") {
            AttributeRole::Id
        } else if attr.path().is_ident("column") {
            AttributeRole::Column
        } else {
            continue;
        };

        if found.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "A field takes at most one of #[id] or #[column]",
            ));
        }

        let mut rename = None;
        match &attr.meta {
            syn::Meta::Path(_) => {}
            syn::Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value = meta.value()?;
                        let lit: LitStr = value.parse()?;
                        rename = Some(lit.value());
                        return Ok(());
                    }

                    Err(meta.error("Unsupported option. Supported: name = \"...\""))
                })?;
            }
            syn::Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "Unsupported syntax. Use #[id], #[column] or #[column(name = \"...\")]",
                ));
            }
        }

        found = Some((role, rename));
    }

    Ok(found)
}
