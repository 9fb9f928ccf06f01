//! Derive macro for sqlsynth entities.
//!
//! This crate provides the `#[derive(Entity)]` macro, which maps a struct
//! with named fields onto a table and implements
//! `sqlsynth_core::entity::Entity` for it.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta};

/// Derives the `Entity` trait for a struct.
///
/// Every named field maps to a column unless it is skipped.
///
/// # Attributes
///
/// - `#[entity(table = "table_name")]` - Specifies the SQL table name
///   (optional, defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as part of the primary key
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(skip)]` - Leaves the field unmapped
/// - `#[column(flatten)]` - Embeds the columns of another entity at this
///   position; fields declared on this struct shadow embedded fields of the
///   same name
///
/// Field types must implement `Clone` and `sqlsynth_core::value::ToSqlValue`.
#[proc_macro_derive(Entity, attributes(entity, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut mapped: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        if attrs.flatten && (attrs.primary_key || attrs.name.is_some()) {
            return Err(syn::Error::new_spanned(
                field,
                "flattened fields take their columns from the embedded entity",
            ));
        }

        let field_name = ident.unraw().to_string();
        mapped.push(FieldInfo {
            column_name: attrs.name.unwrap_or_else(|| field_name.clone()),
            field_name,
            ident,
            ty: field.ty.clone(),
            primary_key: attrs.primary_key,
            flatten: attrs.flatten,
        });
    }

    // Descriptor builder chain, in declaration order
    let declarations: Vec<TokenStream2> = mapped
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            let ty = &info.ty;
            if info.flatten {
                quote! {
                    .embed(<#ty as ::sqlsynth_core::entity::Entity>::descriptor())
                }
            } else if info.primary_key {
                quote! { .primary_key(#field_name, #column_name) }
            } else {
                quote! { .column(#field_name, #column_name) }
            }
        })
        .collect();

    let own_arms: Vec<TokenStream2> = mapped
        .iter()
        .filter(|info| !info.flatten)
        .map(|info| {
            let field_name = &info.field_name;
            let ident = &info.ident;
            quote! {
                #field_name => ::core::option::Option::Some(
                    ::sqlsynth_core::value::ToSqlValue::to_sql_value(
                        ::core::clone::Clone::clone(&self.#ident),
                    ),
                ),
            }
        })
        .collect();

    let embedded_lookups: Vec<TokenStream2> = mapped
        .iter()
        .filter(|info| info.flatten)
        .map(|info| {
            let ident = &info.ident;
            quote! {
                .or_else(|| ::sqlsynth_core::entity::Entity::field_value(&self.#ident, field))
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::sqlsynth_core::entity::Entity for #struct_name #ty_generics
            #where_clause
        {
            fn descriptor() -> ::sqlsynth_core::entity::EntityDescriptor {
                ::sqlsynth_core::entity::EntityDescriptor::new(#table_name)
                    #(#declarations)*
            }

            fn field_value(
                &self,
                field: &str,
            ) -> ::core::option::Option<::sqlsynth_core::value::SqlValue> {
                match field {
                    #(#own_arms)*
                    _ => ::core::option::Option::None #(#embedded_lookups)*,
                }
            }
        }
    };

    Ok(expanded)
}

struct FieldInfo {
    ident: Ident,
    ty: syn::Type,
    field_name: String,
    column_name: String,
    primary_key: bool,
    flatten: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    skip: bool,
    flatten: bool,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("entity") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table_name = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported entity attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.unraw().to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("flatten") {
                    result.flatten = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(parse_str_value(&meta)?);
                } else {
                    return Err(meta.error("unsupported column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
