//! Procedural macros for entity metadata
//!
//! This crate provides the `Entity` derive and the `#[model]` attribute, which
//! generate table metadata, soft-delete capability and a typed column enum
//! for struct types.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod entity_generation;
mod model_macro;
mod parsing;

use entity_generation::{generate_column_enum, generate_entity_impl};
use model_macro::model_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};

/// Derive macro for the `Entity` trait
///
/// Note: It's recommended to use the `#[model]` attribute macro instead,
/// which automatically includes this derive along with the serde and sqlx derives.
///
/// Manual usage:
/// ```rust,ignore
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow, Entity)]
/// #[table(name = "products")]
/// #[relation(name = "category", table = "categories", local_key = "category_id")]
/// pub struct Product {
///     #[primary_key]
///     pub id: i64,
///     #[unique]
///     pub sku: String,
///     pub category_id: Option<i64>,
///     #[soft_delete]
///     pub deleted_at: Option<DateTime<Utc>>,
/// }
/// ```
///
/// Besides `impl Entity for Product` this generates `ProductColumn` with one
/// variant per field (`ProductColumn::CategoryId`), usable wherever a column
/// is accepted.
#[proc_macro_derive(Entity, attributes(table, relation, primary_key, soft_delete, unique))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input.data) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let entity_impl = generate_entity_impl(name, &table_info, &field_info);
    let column_enum = generate_column_enum(name, &input.vis, &field_info);

    let expanded = quote::quote! {
        #entity_impl
        #column_enum
    };

    TokenStream::from(expanded)
}

/// Convenience attribute macro that adds all necessary derives for an entity
///
/// Usage:
/// ```rust,ignore
/// use repohaus::prelude::*;
///
/// #[model]
/// #[table(name = "customers")]
/// pub struct Customer {
///     #[primary_key]
///     pub id: i64,
///     pub email: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
