//! Code generation for entity metadata
//!
//! Produces the `Entity` implementation, the `SoftDeletable` marker when a
//! soft-delete column is declared, and a typed column enum whose variants are
//! known-good column names.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Visibility};

use crate::parsing::{to_pascal_case, to_snake_case, FieldInfo, TableInfo};

pub fn generate_entity_impl(name: &Ident, table_info: &TableInfo, field_info: &FieldInfo) -> TokenStream {
    let table_name = &table_info.name;
    let entity_name = table_info
        .entity
        .clone()
        .unwrap_or_else(|| to_snake_case(&name.to_string()));

    let primary_key_ident = &field_info.primary_key;
    let primary_key_name = primary_key_ident.to_string();
    let primary_key_name = primary_key_name.strip_prefix("r#").unwrap_or(&primary_key_name);

    let column_names: Vec<&str> = field_info.columns.iter().map(|c| c.name.as_str()).collect();
    let unique_names = &field_info.unique_fields;

    let soft_delete = match &field_info.soft_delete_field {
        Some(column) => quote! { ::core::option::Option::Some(#column) },
        None => quote! { ::core::option::Option::None },
    };

    let relation_arms = table_info.relations.iter().map(|relation| {
        let rel_name = &relation.name;
        let rel_table = &relation.table;
        let local_key = &relation.local_key;
        let foreign_key = &relation.foreign_key;
        quote! {
            #rel_name => ::core::option::Option::Some(entity_query::Relation {
                name: #rel_name,
                table: #rel_table,
                local_key: #local_key,
                foreign_key: #foreign_key,
            }),
        }
    });

    let soft_deletable_impl = field_info.soft_delete_field.as_ref().map(|column| {
        quote! {
            impl entity_query::SoftDeletable for #name {
                const SOFT_DELETE_COLUMN: &'static str = #column;
            }
        }
    });

    quote! {
        impl entity_query::Entity for #name {
            const TABLE: &'static str = #table_name;
            const NAME: &'static str = #entity_name;
            const PRIMARY_KEY: &'static str = #primary_key_name;
            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];
            const UNIQUE_COLUMNS: &'static [&'static str] = &[#(#unique_names),*];
            const SOFT_DELETE: ::core::option::Option<&'static str> = #soft_delete;

            fn primary_key_value(&self) -> entity_query::SqlValue {
                entity_query::SqlValue::from(::core::clone::Clone::clone(&self.#primary_key_ident))
            }

            fn relation(name: &str) -> ::core::option::Option<entity_query::Relation> {
                match name {
                    #(#relation_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        #soft_deletable_impl
    }
}

/// `Product` gets `ProductColumn { Id, Name, ... }`
pub fn generate_column_enum(name: &Ident, vis: &Visibility, field_info: &FieldInfo) -> TokenStream {
    let enum_name = format_ident!("{}Column", name);
    let variants: Vec<Ident> = field_info
        .columns
        .iter()
        .map(|c| format_ident!("{}", to_pascal_case(&c.name)))
        .collect();
    let column_names: Vec<&str> = field_info.columns.iter().map(|c| c.name.as_str()).collect();
    let doc = format!("Columns of [`{}`]", name);

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #enum_name {
            #(#variants),*
        }

        impl #enum_name {
            pub const ALL: &'static [#enum_name] = &[#(#enum_name::#variants),*];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    #(#enum_name::#variants => #column_names),*
                }
            }
        }

        impl ::core::fmt::Display for #enum_name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl entity_query::IntoColumn for #enum_name {
            fn into_column(self) -> ::core::result::Result<entity_query::ColumnRef, entity_query::QueryError> {
                ::core::result::Result::Ok(entity_query::ColumnRef::trusted(self.as_str()))
            }
        }
    }
}
